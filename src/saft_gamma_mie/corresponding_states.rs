//! Pseudo Mie beads from critical properties.
//!
//! The correlations of [Mejia et al. (2014)](https://doi.org/10.1021/ie404247e)
//! map the acentric factor, the critical temperature and a liquid density of a
//! fluid onto a single spherical Mie bead with $\lambda_a=6$. Mixtures are
//! treated as a pseudo pure fluid with Stewart-Burkhardt-Voo critical
//! properties and a Plöcker-Knapp liquid density.
use super::{SaftGammaMie, SaftGammaMieParameters, SaftGammaMieRecord};
use despasito_core::parameter::{BeadRecord, ComponentRecord, GroupContributionParameter};
use despasito_core::units::{NAV, RGAS};
use despasito_core::{
    saturation_pressure, DensityScanOptions, EosError, EosResult, SolverOptions,
};
use indexmap::IndexMap;
use ndarray::{arr1, Array1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const A: [f64; 6] = [14.8359, 22.2019, 7220.9599, 23193.4750, -6207.4663, 1732.9600];
const B: [f64; 6] = [0.0, -6.9630, 468.7358, -983.6038, 914.3608, -1383.4441];
const C: [f64; 6] = [0.1284, 1.6772, 0.0, 0.0, 0.0, 0.0];
const D: [f64; 6] = [0.0, 0.4049, -0.1592, 0.0, 0.0, 0.0];
const J: [f64; 6] = [1.8966, -6.9808, 10.6330, -9.2041, 4.2503, 0.0];
const K: [f64; 6] = [0.0, -1.6205, -0.8019, 1.7086, -0.5333, 1.0536];

/// Range of acentric factors the correlations were fitted to.
const OMEGA_RANGE: (f64, f64) = (-0.0847, 0.2387);

/// Critical properties of a component.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CriticalProperties {
    /// Critical temperature in K
    #[serde(rename = "Tc")]
    pub tc: f64,
    /// Critical pressure in Pa
    #[serde(rename = "Pc")]
    pub pc: f64,
    /// Acentric factor
    pub omega: f64,
    /// Liquid density at $T=0.7T_c$ in mol/m³
    pub rho_07: f64,
    /// Critical compressibility factor
    #[serde(rename = "Zc")]
    pub zc: f64,
    /// Critical volume in m³/kg
    #[serde(rename = "Vc")]
    pub vc: f64,
    /// Molar weight in kg/mol
    pub molarweight: f64,
}

/// Pseudo pure fluid of a mixture.
#[derive(Clone, Debug)]
pub struct PseudoBead {
    /// Critical temperature in K
    pub tc: f64,
    /// Critical pressure in Pa
    pub pc: f64,
    /// Mean molar weight in kg/mol
    pub molarweight: f64,
    pub record: SaftGammaMieRecord,
}

fn rational(p: &[f64; 6], q: &[f64; 6], x: f64) -> f64 {
    let poly = |c: &[f64; 6]| c.iter().rev().fold(0.0, |acc, &c| acc * x + c);
    poly(p) / (1.0 + poly(q))
}

/// Mie bead that reproduces the given critical temperature, liquid density
/// and acentric factor.
fn mie_bead(tc: f64, rho_07: f64, omega: f64) -> SaftGammaMieRecord {
    let lr = rational(&A, &B, omega);
    let c = lr / (lr - 6.0) * (lr / 6.0).powf(6.0 / (lr - 6.0));
    let alpha = c * (1.0 / 3.0 - 1.0 / (lr - 3.0));
    let tc_star = rational(&C, &D, alpha);
    let rho_star = rational(&J, &K, alpha);
    let sigma = (rho_star / (rho_07 * NAV)).cbrt();
    SaftGammaMieRecord::new(tc / tc_star, sigma, lr, 6.0, 1.0, 1.0)
}

impl PseudoBead {
    /// Pseudo pure fluid of a mixture with the composition `molefracs`.
    ///
    /// Above the critical temperature of any component the critical
    /// pressure is estimated from the Prausnitz-Gunn rule.
    pub fn new(
        critical: &[CriticalProperties],
        molefracs: &Array1<f64>,
        temperature: f64,
    ) -> EosResult<Self> {
        if critical.len() != molefracs.len() {
            return Err(EosError::IncompatibleComponents(
                critical.len(),
                molefracs.len(),
            ));
        }
        let x = molefracs / molefracs.sum();
        let sum = |f: fn(&CriticalProperties) -> f64| -> f64 {
            critical.iter().zip(&x).map(|(c, &x)| x * f(c)).sum()
        };

        let omega = sum(|c| c.omega);
        if omega < OMEGA_RANGE.0 || omega > OMEGA_RANGE.1 {
            warn!(
                "acentric factor {omega} is outside of the range of the corresponding states correlations"
            );
        }

        // Stewart-Burkhardt-Voo
        let k = sum(|c| c.tc / c.pc.sqrt());
        let j = sum(|c| c.tc / c.pc) / 3.0 + 2.0 / 3.0 * sum(|c| (c.tc / c.pc).sqrt()).powi(2);
        let tc = k * k / j;
        let mut pc = (k / j).powi(2);
        let molarweight = sum(|c| c.molarweight);

        // Prausnitz-Gunn
        if critical.iter().any(|c| temperature > c.tc) {
            pc = RGAS * tc * sum(|c| c.zc) / sum(|c| c.molarweight * c.vc);
        }

        // Plöcker-Knapp
        let mut v = 0.0;
        for (ci, &xi) in critical.iter().zip(&x) {
            for (cj, &xj) in critical.iter().zip(&x) {
                let vi = (ci.rho_07 * ci.molarweight).recip().cbrt();
                let vj = (cj.rho_07 * cj.molarweight).recip().cbrt();
                v += xi * xj * (0.5 * (vi + vj)).powi(3);
            }
        }
        let rho_07 = (v * molarweight).recip();

        let record = mie_bead(tc, rho_07, omega);
        debug!("pseudo bead for x = {x}: Tc = {tc} K, Pc = {pc} Pa, {record}");
        Ok(Self {
            tc,
            pc,
            molarweight,
            record,
        })
    }

    /// Single component SAFT-γ Mie model of the pseudo bead.
    pub fn equation_of_state(&self) -> EosResult<SaftGammaMie> {
        let bead = BeadRecord::new("bead".to_string(), self.molarweight, self.record.clone());
        let component = ComponentRecord::new(
            "bead".to_string(),
            IndexMap::from([("bead".to_string(), 1.0)]),
        );
        let parameters = SaftGammaMieParameters::from_records(vec![component], vec![bead], vec![])?;
        Ok(SaftGammaMie::new(Arc::new(parameters)))
    }
}

/// Pressure guess in Pa for phase equilibria of a mixture from the saturation
/// pressure of its corresponding states pseudo bead.
pub fn corresponding_states_pressure_guess(
    critical: &[CriticalProperties],
    molefracs: &Array1<f64>,
    temperature: f64,
    density: &DensityScanOptions,
) -> EosResult<f64> {
    let pseudo = PseudoBead::new(critical, molefracs, temperature)?;
    if temperature >= pseudo.tc {
        return Err(EosError::SuperCritical);
    }
    let eos = Arc::new(pseudo.equation_of_state()?);
    let sat = saturation_pressure(&eos, temperature, &arr1(&[1.0]), density, SolverOptions::default())?;
    Ok(sat.pressure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn methane() -> CriticalProperties {
        CriticalProperties {
            tc: 190.56,
            pc: 4.599e6,
            omega: 0.011,
            rho_07: 22260.0,
            zc: 0.286,
            vc: 6.15e-3,
            molarweight: 0.01604,
        }
    }

    fn ethane() -> CriticalProperties {
        CriticalProperties {
            tc: 305.32,
            pc: 4.872e6,
            omega: 0.099,
            rho_07: 16500.0,
            zc: 0.279,
            vc: 4.83e-3,
            molarweight: 0.03007,
        }
    }

    #[test]
    fn pure_methane() -> EosResult<()> {
        let pseudo = PseudoBead::new(&[methane()], &arr1(&[1.0]), 150.0)?;
        assert_relative_eq!(pseudo.tc, 190.56, max_relative = 1e-12);
        assert_relative_eq!(pseudo.pc, 4.599e6, max_relative = 1e-12);
        let r = &pseudo.record;
        assert_relative_eq!(r.lr, 16.330383520258515, max_relative = 1e-8);
        assert_relative_eq!(r.epsilon, 170.46870246666472, max_relative = 1e-8);
        assert_relative_eq!(r.sigma, 3.8577150830196463e-10, max_relative = 1e-8);
        assert_eq!(r.la, 6.0);
        Ok(())
    }

    #[test]
    fn mixture_critical_point() -> EosResult<()> {
        let x = arr1(&[0.5, 0.5]);
        let pseudo = PseudoBead::new(&[methane(), ethane()], &x, 200.0)?;
        assert!(pseudo.tc > 190.56 && pseudo.tc < 305.32);
        assert_relative_eq!(pseudo.molarweight, 0.5 * (0.01604 + 0.03007));
        // methane is supercritical at 200 K
        let expected = RGAS * pseudo.tc * (0.5 * 0.286 + 0.5 * 0.279)
            / (0.5 * 0.01604 * 6.15e-3 + 0.5 * 0.03007 * 4.83e-3);
        assert_relative_eq!(pseudo.pc, expected, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn pressure_guess() -> EosResult<()> {
        let p = corresponding_states_pressure_guess(
            &[methane()],
            &arr1(&[1.0]),
            150.0,
            &Default::default(),
        )?;
        // experimental value 1.04 MPa
        assert!(p > 0.5e6 && p < 2e6);
        Ok(())
    }

    #[test]
    fn supercritical_guess() {
        let p = corresponding_states_pressure_guess(
            &[methane()],
            &arr1(&[1.0]),
            250.0,
            &Default::default(),
        );
        assert!(matches!(p, Err(EosError::SuperCritical)));
    }
}
