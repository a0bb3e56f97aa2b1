use super::Components;
use crate::units::{density_from_reduced, moles_to_reduced, NAV};
use crate::{EosError, EosResult, StateHD};
use ndarray::prelude::*;
use ndarray::ScalarOperand;
use num_dual::*;
use num_traits::Zero;

/// A residual Helmholtz energy model.
pub trait Residual: Components + Send + Sync {
    /// Return the maximum density in Angstrom^-3.
    ///
    /// This value is used as the upper limit of density scans and
    /// as an estimate for a liquid phase. It is not explicitly meant to
    /// be a mathematical limit for the density (if those exist in the
    /// equation of state anyways).
    fn compute_max_density(&self, moles: &Array1<f64>) -> f64;

    /// Evaluate the reduced Helmholtz energy of each individual contribution
    /// and return them together with a string representation of the contribution.
    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        state: &StateHD<D>,
    ) -> Vec<(String, D)>;

    /// Evaluate the residual reduced Helmholtz energy $\beta A^\mathrm{res}$.
    fn residual_helmholtz_energy<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        state: &StateHD<D>,
    ) -> D {
        self.residual_helmholtz_energy_contributions(state)
            .into_iter()
            .fold(D::zero(), |acc, (_, a)| acc + a)
    }

    /// Check if the provided optional mole number is consistent with the
    /// equation of state.
    ///
    /// For a pure component no moles need to be provided. In that case,
    /// one mole is used.
    fn validate_moles(&self, moles: Option<&Array1<f64>>) -> EosResult<Array1<f64>> {
        let l = moles.map_or(1, |m| m.len());
        if self.components() == l {
            match moles {
                Some(m) => Ok(m.to_owned()),
                None => Ok(Array::ones(1)),
            }
        } else {
            Err(EosError::IncompatibleComponents(self.components(), l))
        }
    }

    /// Calculate the maximum density in mol/m³.
    fn max_density(&self, moles: Option<&Array1<f64>>) -> EosResult<f64> {
        let mr = self.validate_moles(moles)?.mapv(moles_to_reduced);
        Ok(density_from_reduced(self.compute_max_density(&mr)))
    }

    /// Calculate the second virial coefficient $B(T)$ in m³/mol.
    fn second_virial_coefficient(
        &self,
        temperature: f64,
        moles: Option<&Array1<f64>>,
    ) -> EosResult<f64> {
        let m = self.validate_moles(moles)?;
        let x = &m / m.sum();
        let mut rho = HyperDual64::zero();
        rho.eps1 = 1.0;
        rho.eps2 = 1.0;
        let t = HyperDual64::from(temperature);
        let s = StateHD::new_virial(t, rho, x);
        Ok(self.residual_helmholtz_energy(&s).eps1eps2 * 0.5 * NAV * 1e-30)
    }
}
