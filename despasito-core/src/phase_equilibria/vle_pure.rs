use super::SolverOptions;
use crate::density::{DensityScanOptions, Isotherm};
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::solver::brent;
use crate::state::State;
use crate::units::RGAS;
use ndarray::Array1;
use serde::Serialize;
use std::sync::Arc;

const MAX_ITER_PSAT: usize = 100;
const TOL_PSAT: f64 = 1e-10;
/// Lowest pressure in Pa considered for a saturation pressure,
/// unless the vapor spinodal itself lies below it.
const MIN_PRESSURE: f64 = 10.0;

/// Saturation pressure and coexisting densities of a pure component.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SaturationProperties {
    /// Saturation pressure in Pa
    pub pressure: f64,
    /// Liquid density in mol/m³
    pub liquid_density: f64,
    /// Vapor density in mol/m³
    pub vapor_density: f64,
}

/// Coexisting liquid and vapor molar volumes at the given pressure.
fn coexisting_volumes<E: Residual>(isotherm: &Isotherm<E>, pressure: f64) -> Option<(f64, f64)> {
    let roots = isotherm.roots(pressure);
    match roots.len() {
        3.. => Some((roots[0], roots[roots.len() - 1])),
        2 => isotherm
            .vapor_root_beyond_grid(pressure)
            .map(|v| (roots[0], v)),
        _ => None,
    }
}

/// Pressure just inside the loop next to a spinodal, taken from the grid.
fn grid_pressure_near<E>(isotherm: &Isotherm<E>, volume: f64, maximum: bool) -> f64 {
    let p = &isotherm.pressure;
    let n = p.len();
    let mut k = isotherm
        .volume
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - volume).abs().total_cmp(&(*b - volume).abs()))
        .map_or(0, |(i, _)| i);
    for i in k.saturating_sub(1)..(k + 2).min(n) {
        if (maximum && p[i] > p[k]) || (!maximum && p[i] < p[k]) {
            k = i;
        }
    }
    let left = p[k.saturating_sub(1)];
    let right = p[(k + 1).min(n - 1)];
    if maximum {
        p[k] - 0.5 * (p[k] - left.max(right))
    } else {
        p[k] + 0.5 * (left.min(right) - p[k])
    }
}

/// Equal area residual $\int_{v^L}^{v^V}(p(v)-p)\,dv$ in J/mol.
///
/// Positive if the pressure is below the saturation pressure.
fn equal_area<E: Residual>(
    eos: &Arc<E>,
    isotherm: &Isotherm<E>,
    pressure: f64,
) -> EosResult<(f64, f64, f64)> {
    let (v_l, v_v) = coexisting_volumes(isotherm, pressure)
        .ok_or_else(|| EosError::IterationFailed(String::from("saturation_pressure")))?;
    let t = isotherm.temperature;
    let x = &isotherm.molefracs;
    let liquid = State::new_density(eos, t, 1.0 / v_l, x)?;
    let vapor = State::new_density(eos, t, 1.0 / v_v, x)?;
    // the ideal gas contribution reduces to the logarithm of the density ratio
    let delta_a = liquid.residual_molar_helmholtz_energy() - vapor.residual_molar_helmholtz_energy()
        + RGAS * t * (v_v / v_l).ln();
    Ok((delta_a - pressure * (v_v - v_l), v_l, v_v))
}

/// Saturation pressure of a pure component from Maxwell's equal area rule.
///
/// The composition must contain exactly one nonzero entry. Returns
/// [EosError::SuperCritical] if the isotherm has no van der Waals loop.
pub fn saturation_pressure<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    molefracs: &Array1<f64>,
    density_options: &DensityScanOptions,
    options: SolverOptions,
) -> EosResult<SaturationProperties> {
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_PSAT, TOL_PSAT);
    eos.validate_moles(Some(molefracs))?;
    let nonzero = molefracs.iter().filter(|&&x| x > 0.0).count();
    if nonzero != 1 {
        return Err(EosError::Error(format!(
            "Saturation pressure requires a single component, got {nonzero} nonzero mole fractions."
        )));
    }

    let isotherm = Isotherm::new(eos, temperature, molefracs, density_options)?;
    if isotherm.has_invalid_pressure() {
        return Err(EosError::IterationFailed(String::from("saturation_pressure")));
    }
    let extrema = isotherm.extrema();
    if extrema.len() < 2 {
        log_result!(
            verbosity,
            "Saturation pressure: no van der Waals loop at T = {temperature} K"
        );
        return Err(EosError::SuperCritical);
    }

    // bracket on grid pressures so that every root is visible on the grid
    let p_max = grid_pressure_near(&isotherm, extrema[1].volume, true);
    let mut p_min = if extrema[0].pressure > 0.0 {
        grid_pressure_near(&isotherm, extrema[0].volume, false)
    } else {
        MIN_PRESSURE
    };
    if p_min >= p_max {
        p_min = p_max * 1e-3;
    }
    log_iter!(
        verbosity,
        "Saturation pressure at T = {temperature} K bracketed in [{p_min}, {p_max}] Pa"
    );

    // lower the bracket until the vapor side dominates the loop
    let mut f_min = equal_area(eos, &isotherm, p_min)?.0;
    while f_min < 0.0 {
        p_min *= 0.1;
        if p_min < 1e-12 * p_max {
            return Err(EosError::NotConverged(String::from("saturation_pressure")));
        }
        f_min = equal_area(eos, &isotherm, p_min)?.0;
    }

    let mut iterations = 0;
    let pressure = brent(
        |p| {
            iterations += 1;
            let f = equal_area(eos, &isotherm, p)?.0;
            log_iter!(verbosity, " {iterations:4} | {p:14.8e} Pa | {f:14.8e} J/mol");
            Ok(f)
        },
        p_min,
        p_max,
        tol,
        max_iter,
    )?;
    let (_, v_l, v_v) = equal_area(eos, &isotherm, pressure)?;
    log_result!(
        verbosity,
        "Saturation pressure: converged in {iterations} steps, P = {pressure} Pa"
    );

    Ok(SaturationProperties {
        pressure,
        liquid_density: 1.0 / v_l,
        vapor_density: 1.0 / v_v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Contributions;
    use crate::tests::VanDerWaals;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn van_der_waals_coexistence() -> EosResult<()> {
        let eos = Arc::new(VanDerWaals::pure(50000.0, 50.0));
        let t = 260.0;
        let vle = saturation_pressure(
            &eos,
            t,
            &arr1(&[1.0]),
            &Default::default(),
            Default::default(),
        )?;
        assert!(vle.liquid_density > vle.vapor_density);

        let x = arr1(&[1.0]);
        let liquid = State::new_density(&eos, t, vle.liquid_density, &x)?;
        let vapor = State::new_density(&eos, t, vle.vapor_density, &x)?;
        assert_relative_eq!(
            liquid.pressure(Contributions::Total),
            vle.pressure,
            max_relative = 1e-6
        );
        assert_relative_eq!(
            vapor.pressure(Contributions::Total),
            vle.pressure,
            max_relative = 1e-6
        );
        assert_relative_eq!(liquid.ln_phi()[0], vapor.ln_phi()[0], epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn supercritical() {
        let eos = Arc::new(VanDerWaals::pure(50000.0, 50.0));
        let vle = saturation_pressure(
            &eos,
            400.0,
            &arr1(&[1.0]),
            &Default::default(),
            Default::default(),
        );
        assert!(matches!(vle, Err(EosError::SuperCritical)));
    }

    #[test]
    fn requires_pure_component() {
        let eos = Arc::new(VanDerWaals::mixture(&[50000.0, 40000.0], &[50.0, 45.0]));
        let vle = saturation_pressure(
            &eos,
            250.0,
            &arr1(&[0.5, 0.5]),
            &Default::default(),
            Default::default(),
        );
        assert!(vle.is_err());
    }
}
