use super::parameters::SaftGammaMieParameters;
use crate::association::Association;
use crate::hard_sphere::HardSphere;
use despasito_core::parameter::GroupContributionParameter;
use despasito_core::{Components, EosResult, MolarWeight, Residual, StateHD};
use ndarray::{Array1, ScalarOperand};
use num_dual::DualNum;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_6;
use std::fmt;
use std::sync::Arc;

mod association;
mod chain;
mod monomer;
use association::association_kernel;
use chain::a_chain;
use monomer::{a_disp, Properties};

/// Customization options for the SAFT-γ Mie equation of state.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SaftGammaMieOptions {
    pub max_eta: f64,
    pub max_iter_cross_assoc: usize,
    pub tol_cross_assoc: f64,
}

impl Default for SaftGammaMieOptions {
    fn default() -> Self {
        Self {
            max_eta: 0.5,
            max_iter_cross_assoc: 50,
            tol_cross_assoc: 1e-10,
        }
    }
}

/// SAFT-γ Mie equation of state ([Papaioannou et al., 2014](https://doi.org/10.1063/1.4851455)).
///
/// The residual Helmholtz energy consists of a hard-sphere, a dispersion,
/// a chain and an association contribution. Chain and association are only
/// evaluated if any component has more than one segment or association sites.
pub struct SaftGammaMie {
    parameters: Arc<SaftGammaMieParameters>,
    options: SaftGammaMieOptions,
    hard_sphere: HardSphere<SaftGammaMieParameters>,
    chain: bool,
    association: Option<Association>,
}

impl SaftGammaMie {
    pub fn new(parameters: Arc<SaftGammaMieParameters>) -> Self {
        Self::with_options(parameters, SaftGammaMieOptions::default())
    }

    pub fn with_options(
        parameters: Arc<SaftGammaMieParameters>,
        options: SaftGammaMieOptions,
    ) -> Self {
        let association = (!parameters.association.is_empty()).then(|| {
            Association::new(
                &parameters.association,
                options.max_iter_cross_assoc,
                options.tol_cross_assoc,
            )
        });
        Self {
            parameters: parameters.clone(),
            options,
            hard_sphere: HardSphere::new(&parameters),
            chain: parameters
                .segments
                .chain_length(&parameters.m)
                .iter()
                .any(|&m| m != 1.0),
            association,
        }
    }

    pub fn parameters(&self) -> &Arc<SaftGammaMieParameters> {
        &self.parameters
    }

    /// Fraction of non-bonded association sites at the given state.
    pub fn site_fractions(&self, state: &StateHD<f64>) -> EosResult<Array1<f64>> {
        match &self.association {
            Some(association) => {
                let properties = Properties::new(&self.parameters, state);
                let kernel = association_kernel(&self.parameters, &properties, state.temperature);
                association.site_fractions(state, &kernel)
            }
            None => Ok(Array1::zeros(0)),
        }
    }
}

impl Components for SaftGammaMie {
    fn components(&self) -> usize {
        self.parameters.components.len()
    }

    fn subset(&self, component_list: &[usize]) -> EosResult<Self> {
        Ok(Self::with_options(
            Arc::new(self.parameters.subset(component_list)?),
            self.options,
        ))
    }
}

impl Residual for SaftGammaMie {
    fn compute_max_density(&self, moles: &Array1<f64>) -> f64 {
        let p = &self.parameters;
        let segment_volume: f64 = p
            .segments
            .component_index
            .iter()
            .zip(&p.segments.bead_index)
            .zip(&p.m)
            .map(|((&i, &k), &m)| moles[i] * m * p.sigma[k].powi(3))
            .sum();
        self.options.max_eta * moles.sum() / (FRAC_PI_6 * segment_volume)
    }

    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        state: &StateHD<D>,
    ) -> Vec<(String, D)> {
        let mut a = Vec::with_capacity(4);
        a.push((
            self.hard_sphere.to_string().to_lowercase(),
            self.hard_sphere.helmholtz_energy(state),
        ));

        let properties = Properties::new(&self.parameters, state);
        a.push((
            "dispersion".to_string(),
            a_disp(&self.parameters, &properties, state),
        ));
        if self.chain {
            a.push((
                "chain".to_string(),
                a_chain(&self.parameters, &properties, state),
            ));
        }
        if let Some(association) = self.association.as_ref() {
            let kernel = association_kernel(&self.parameters, &properties, state.temperature);
            a.push((
                association.to_string().to_lowercase(),
                association.helmholtz_energy(state, &kernel),
            ));
        }
        a
    }
}

impl MolarWeight for SaftGammaMie {
    fn molar_weight(&self) -> Array1<f64> {
        self.parameters.molar_weight()
    }
}

impl fmt::Display for SaftGammaMie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SAFT-γ Mie")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saft_gamma_mie::parameters::utils::{co2_h2o, ethane, water};
    use approx::assert_relative_eq;
    use despasito_core::density::{liquid_density, PhaseFlag};
    use despasito_core::{Contributions, State};
    use ndarray::arr1;

    #[test]
    fn contributions() {
        let eos = SaftGammaMie::new(Arc::new(co2_h2o()));
        let state = StateHD::new(300.0, 2000.0, arr1(&[10.0, 20.0]));
        let names: Vec<String> = eos
            .residual_helmholtz_energy_contributions(&state)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["hard sphere", "dispersion", "chain", "association"]);

        let eos = SaftGammaMie::new(Arc::new(water()));
        let state = StateHD::new(300.0, 2000.0, arr1(&[20.0]));
        let contributions = eos.residual_helmholtz_energy_contributions(&state);
        assert_eq!(contributions.len(), 3);
        assert!(contributions[0].1 > 0.0);
        assert!(contributions[1].1 < 0.0);
        assert!(contributions[2].1 < 0.0);
    }

    #[test]
    fn ideal_gas_limit() -> EosResult<()> {
        let eos = Arc::new(SaftGammaMie::new(Arc::new(co2_h2o())));
        let state = State::new_density(&eos, 400.0, 1e-6, &arr1(&[0.3, 0.7]))?;
        assert_relative_eq!(state.compressibility(Contributions::Total), 1.0, epsilon = 1e-7);
        Ok(())
    }

    #[test]
    fn pressure_is_consistent() -> EosResult<()> {
        // p = -(dA/dV) compared against a finite difference of the Helmholtz energy
        let eos = Arc::new(SaftGammaMie::new(Arc::new(co2_h2o())));
        let x = arr1(&[0.4, 0.6]);
        let (t, rho, h) = (320.0, 15000.0, 1e-2);
        let s = State::new_density(&eos, t, rho, &x)?;
        let sp = State::new_density(&eos, t, rho + h, &x)?;
        let sm = State::new_density(&eos, t, rho - h, &x)?;
        // at constant moles a/ρ = A/n, p = ρ² d(A/n)/dρ
        let a = |s: &State<SaftGammaMie>| s.residual_molar_helmholtz_energy();
        let p_fd = rho * rho * (a(&sp) - a(&sm)) / (2.0 * h);
        assert_relative_eq!(s.pressure(Contributions::Residual), p_fd, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn water_liquid_density() -> EosResult<()> {
        let eos = Arc::new(SaftGammaMie::new(Arc::new(water())));
        let x = arr1(&[1.0]);
        let (rho, flag) = liquid_density(&eos, 101325.0, 300.0, &x, &Default::default())?;
        assert_eq!(flag, PhaseFlag::Liquid);
        // about 55 kmol/m³
        assert!(rho > 45000.0 && rho < 65000.0);
        Ok(())
    }

    #[test]
    fn site_fractions() -> EosResult<()> {
        let eos = SaftGammaMie::new(Arc::new(water()));
        let state = StateHD::new(300.0, 30.0 * 18.0, arr1(&[18.0]));
        let x = eos.site_fractions(&state)?;
        assert_eq!(x.len(), 2);
        // equal numbers of donor and acceptor sites
        assert_relative_eq!(x[0], x[1], max_relative = 1e-8);
        assert!(x[0] > 0.0 && x[0] < 0.5);
        Ok(())
    }

    #[test]
    fn maximum_density() {
        let eos = SaftGammaMie::new(Arc::new(ethane()));
        let rho_max = eos.compute_max_density(&arr1(&[1.0]));
        assert_relative_eq!(
            rho_max,
            0.5 / (FRAC_PI_6 * 1.4373 * 3.7257f64.powi(3)),
            max_relative = 1e-12
        );
    }
}
