use ndarray::{Array1, ScalarOperand};
use num_dual::DualNum;
use std::fmt::Display;
use std::sync::Arc;

mod ideal_gas;
mod residual;
use crate::{EosError, EosResult, StateHD};

pub use ideal_gas::{DeBroglie, IdealGas};
pub use residual::Residual;

/// Number of components and subsets of an equation of state.
pub trait Components {
    /// Return the number of components of the model.
    fn components(&self) -> usize;

    /// Return a model consisting of the components
    /// contained in component_list.
    fn subset(&self, component_list: &[usize]) -> EosResult<Self>
    where
        Self: Sized;
}

/// Check that every index of `component_list` refers to one of `components` components.
pub(crate) fn validate_subset(component_list: &[usize], components: usize) -> EosResult<()> {
    match component_list.iter().find(|&&i| i >= components) {
        Some(&i) => Err(EosError::Error(format!(
            "component index {i} is out of range for a model with {components} components"
        ))),
        None => Ok(()),
    }
}

/// Molar weight of all components in kg/mol.
///
/// The trait is required to be able to calculate (mass)
/// specific properties and the de Broglie wavelength.
pub trait MolarWeight {
    fn molar_weight(&self) -> Array1<f64>;
}

/// An equation of state consisting of an ideal gas model
/// and a residual Helmholtz energy model.
#[derive(Clone)]
pub struct EquationOfState<I, R> {
    pub ideal_gas: Arc<I>,
    pub residual: Arc<R>,
}

impl<I, R> EquationOfState<I, R> {
    pub fn new(ideal_gas: Arc<I>, residual: Arc<R>) -> Self {
        Self {
            ideal_gas,
            residual,
        }
    }
}

impl<R: Residual + MolarWeight> EquationOfState<DeBroglie, R> {
    /// Combine a residual model with the de Broglie ideal gas
    /// built from its molar weights.
    pub fn with_de_broglie(residual: Arc<R>) -> Self {
        let ideal_gas = Arc::new(DeBroglie::new(residual.molar_weight()));
        Self::new(ideal_gas, residual)
    }
}

impl<I: Display, R: Display> Display for EquationOfState<I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {}", self.ideal_gas, self.residual)
    }
}

impl<I: Components, R: Components> Components for EquationOfState<I, R> {
    fn components(&self) -> usize {
        self.residual.components()
    }

    fn subset(&self, component_list: &[usize]) -> EosResult<Self> {
        Ok(Self::new(
            Arc::new(self.ideal_gas.subset(component_list)?),
            Arc::new(self.residual.subset(component_list)?),
        ))
    }
}

impl<I: IdealGas, R: Components + Send + Sync> IdealGas for EquationOfState<I, R> {
    fn ln_lambda3<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        self.ideal_gas.ln_lambda3(temperature)
    }

    fn ideal_gas_model(&self) -> String {
        self.ideal_gas.ideal_gas_model()
    }
}

impl<I: Components + Send + Sync, R: Residual> Residual for EquationOfState<I, R> {
    fn compute_max_density(&self, moles: &Array1<f64>) -> f64 {
        self.residual.compute_max_density(moles)
    }

    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        state: &StateHD<D>,
    ) -> Vec<(String, D)> {
        self.residual.residual_helmholtz_energy_contributions(state)
    }
}

impl<I, R: MolarWeight> MolarWeight for EquationOfState<I, R> {
    fn molar_weight(&self) -> Array1<f64> {
        self.residual.molar_weight()
    }
}
