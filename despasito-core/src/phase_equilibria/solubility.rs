use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::State;
use ndarray::Array1;
use std::sync::Arc;

/// Hildebrand solubility parameter $\delta=\sqrt{-u^\text{res}\rho^L}$ in Pa^½
/// of a liquid with the given density in mol/m³.
pub fn hildebrand_solubility<E: Residual>(
    eos: &Arc<E>,
    liquid_density: f64,
    temperature: f64,
    molefracs: &Array1<f64>,
) -> EosResult<f64> {
    let state = State::new_density(eos, temperature, liquid_density, molefracs)?;
    let u_res = state.residual_molar_internal_energy();
    if u_res > 0.0 {
        return Err(EosError::Error(format!(
            "Positive residual internal energy {u_res} J/mol, no solubility parameter."
        )));
    }
    Ok((-u_res * liquid_density).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::{liquid_density, PhaseFlag};
    use crate::tests::VanDerWaals;
    use crate::units::{KB, NAV};
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn van_der_waals_solubility() -> EosResult<()> {
        // u_res = -a ρ for a van der Waals fluid
        let eos = Arc::new(VanDerWaals::pure(50000.0, 50.0));
        let x = arr1(&[1.0]);
        let (rho, flag) = liquid_density(&eos, 1e5, 200.0, &x, &Default::default())?;
        assert_eq!(flag, PhaseFlag::Liquid);
        let delta = hildebrand_solubility(&eos, rho, 200.0, &x)?;
        let u_res = -50000.0 * KB * NAV * rho * NAV * 1e-30;
        assert_relative_eq!(delta, (-u_res * rho).sqrt(), max_relative = 1e-8);
        Ok(())
    }

    #[test]
    fn invalid_density() {
        let eos = Arc::new(VanDerWaals::pure(50000.0, 50.0));
        assert!(hildebrand_solubility(&eos, f64::NAN, 200.0, &arr1(&[1.0])).is_err());
    }
}
