use super::bubble_dew::Equilibrium;
use super::BubbleDewOptions;
use crate::density::PhaseFlag;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use ndarray::{arr1, Array1};
use serde::Serialize;
use std::sync::Arc;

const MAX_ITER_FLASH: usize = 200;
const TOL_FLASH: f64 = 1e-9;

/// Coexisting phases of a binary mixture at given temperature and pressure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlashResult {
    /// Liquid composition
    pub liquid_molefracs: Array1<f64>,
    /// Type of the liquid phase
    pub flag_liquid: PhaseFlag,
    /// Vapor composition
    pub vapor_molefracs: Array1<f64>,
    /// Type of the vapor phase
    pub flag_vapor: PhaseFlag,
    /// Change of the equilibrium ratios in the last step
    pub error: f64,
}

/// Equilibrium ratios from Raoult's law, shifted so that one
/// component is enriched in each phase.
fn initial_k_values(psat: &Array1<f64>, pressure: f64) -> EosResult<Array1<f64>> {
    let mut k = psat / pressure;
    let index = if k.iter().all(|&ki| ki > 1.0) {
        k.iter()
            .enumerate()
            .filter(|(_, &ki)| ki < 2.0)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .ok_or_else(|| {
                EosError::Error(format!(
                    "Both components are far above their saturation pressure (K = {k}), no phase split."
                ))
            })?
    } else if k.iter().all(|&ki| ki < 1.0) {
        if k[0] <= k[1] {
            0
        } else {
            1
        }
    } else {
        return Ok(k);
    };
    k[1 - index] = 2.0 - k[index];
    Ok(k)
}

/// Liquid and vapor composition of a binary mixture at given equilibrium ratios.
fn compositions(k: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
    let x0 = (1.0 - k[1]) / (k[0] - k[1]);
    let x = arr1(&[x0, 1.0 - x0]);
    let y = k * &x;
    (x, y)
}

/// Isothermal–isobaric flash of a binary mixture.
///
/// For two components and two phases the compositions are fixed by
/// temperature and pressure, so no feed is required. The equilibrium
/// ratios are initialized from the saturation pressures and updated
/// by successive substitution.
pub fn tp_flash<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    pressure: f64,
    options: &BubbleDewOptions,
) -> EosResult<FlashResult> {
    let (max_iter, tol, verbosity) = options.outer.unwrap_or(MAX_ITER_FLASH, TOL_FLASH);
    if eos.components() != 2 {
        return Err(EosError::IncompatibleComponents(eos.components(), 2));
    }
    let equilibrium = Equilibrium {
        eos,
        temperature,
        density: &options.density,
    };
    let psat = equilibrium.pure_pressures(options.component_beads.as_deref())?;
    let mut k = initial_k_values(&psat, pressure)?;
    log_iter!(verbosity, "Flash at T = {temperature} K, P = {pressure} Pa, K = {k}");

    let mut error = f64::INFINITY;
    let mut phases = None;
    for iter in 1..=max_iter {
        let (x, y) = compositions(&k);
        if x.iter().chain(y.iter()).any(|&z| !(0.0..=1.0).contains(&z)) {
            log_result!(
                verbosity,
                "Flash: compositions x = {x}, y = {y} outside the physical range"
            );
            return Err(EosError::NoPhaseSplit);
        }
        let liquid = equilibrium.liquid(pressure, &x)?;
        let vapor = equilibrium.vapor(pressure, &y)?;
        let k_new = &liquid.phi / &vapor.phi;
        if k_new.iter().any(|ki| !ki.is_finite()) {
            return Err(EosError::IterationFailed(String::from("tp_flash")));
        }

        error = (&k_new - &k).sum().abs();
        let i = if k[0] <= k[1] { 0 } else { 1 };
        let relative = ((k_new[i] - k[i]) / k[i]).abs();
        log_iter!(
            verbosity,
            " {iter:4} | K = {k_new} | error = {error:.3e} | {} / {}",
            liquid.flag,
            vapor.flag
        );
        k = k_new;
        phases = Some((x, liquid.flag, y, vapor.flag));
        if error < tol && relative < tol {
            log_result!(verbosity, "Flash: converged in {iter} steps");
            break;
        }
    }
    if error >= tol {
        log_result!(
            verbosity,
            "Flash: not converged within {max_iter} steps, error = {error:e}"
        );
    }

    let (liquid_molefracs, flag_liquid, vapor_molefracs, flag_vapor) =
        phases.ok_or_else(|| EosError::NotConverged(String::from("tp_flash")))?;
    Ok(FlashResult {
        liquid_molefracs,
        flag_liquid,
        vapor_molefracs,
        flag_vapor,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::DensityScanOptions;
    use crate::phase_equilibria::bubble_pressure;
    use crate::tests::VanDerWaals;
    use approx::assert_relative_eq;

    fn options() -> BubbleDewOptions {
        BubbleDewOptions {
            density: DensityScanOptions {
                points: 300,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn k_values_are_split() -> EosResult<()> {
        let k = initial_k_values(&arr1(&[3e5, 1.5e5]), 1e5)?;
        assert_relative_eq!(k[1], 1.5);
        assert_relative_eq!(k[0], 0.5);
        let k = initial_k_values(&arr1(&[2e4, 5e4]), 1e5)?;
        assert_relative_eq!(k[0], 0.2);
        assert_relative_eq!(k[1], 1.8);
        assert!(initial_k_values(&arr1(&[3e5, 4e5]), 1e5).is_err());
        Ok(())
    }

    #[test]
    fn flash_is_consistent_with_bubble_point() -> EosResult<()> {
        let eos = Arc::new(VanDerWaals::mixture(&[50000.0, 30000.0], &[50.0, 45.0]));
        let t = 160.0;
        let options = options();
        let x = arr1(&[0.6, 0.4]);
        let bubble = bubble_pressure(&eos, t, &x, &options)?;
        let flash = tp_flash(&eos, t, bubble.pressure, &options)?;
        assert_eq!(flash.flag_liquid, PhaseFlag::Liquid);
        assert_relative_eq!(flash.liquid_molefracs[0], x[0], max_relative = 1e-3);
        assert_relative_eq!(
            flash.vapor_molefracs[0],
            bubble.molefracs[0],
            max_relative = 1e-3
        );
        Ok(())
    }

    #[test]
    fn flash_requires_binary() {
        let eos = Arc::new(VanDerWaals::pure(50000.0, 50.0));
        assert!(tp_flash(&eos, 200.0, 1e5, &options()).is_err());
    }
}
