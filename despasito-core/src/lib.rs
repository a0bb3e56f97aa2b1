#![warn(clippy::all)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]
//! Core traits, thermodynamic states and phase equilibrium solvers for
//! group-contribution SAFT equations of state.
//!
//! All public functions take and return SI units (K, Pa, m³, mol).
//! Equations of state are evaluated in reduced units internally
//! (temperature in K, length in Å, energies divided by the Boltzmann constant).

#[doc(hidden)]
pub use tracing as __tracing;

/// Emit messages with level `Verbosity::Iter` or higher as debug events.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Iter {
            $crate::__tracing::debug!($($arg)*);
        }
    }
}

/// Emit messages with level `Verbosity::Result` or higher as info events.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Result {
            $crate::__tracing::info!($($arg)*);
        }
    }
}

pub mod density;
mod equation_of_state;
mod errors;
pub mod parameter;
mod phase_equilibria;
pub mod solver;
mod state;
pub mod units;
pub use density::{DensityScanOptions, Isotherm, PhaseFlag};
pub use equation_of_state::{
    Components, DeBroglie, EquationOfState, IdealGas, MolarWeight, Residual,
};
pub use errors::{EosError, EosResult};
pub use phase_equilibria::{
    bubble_pressure, dew_pressure, hildebrand_solubility, saturation_pressure,
    supercritical_pressure_guess, tp_flash, BubbleDewOptions, BubbleDewResult, FlashResult,
    SaturationProperties, SolverOptions, Verbosity,
};
pub use state::{Contributions, Derivative, State, StateHD};

#[cfg(test)]
mod tests {
    use crate::equation_of_state::{Components, DeBroglie, EquationOfState, IdealGas, Residual};
    use crate::state::{Contributions, State, StateHD};
    use crate::units::{NAV, RGAS};
    use crate::EosResult;
    use approx::assert_relative_eq;
    use ndarray::{arr1, Array1, ScalarOperand};
    use num_dual::DualNum;
    use std::sync::Arc;

    /// Van der Waals fluid in reduced units with one-fluid mixing rules,
    /// used to check the derivative machinery and the phase equilibrium
    /// solvers against analytic expressions.
    pub(crate) struct VanDerWaals {
        /// attraction parameters in K Å³
        pub a: Array1<f64>,
        /// co-volumes in Å³
        pub b: Array1<f64>,
    }

    impl VanDerWaals {
        pub fn pure(a: f64, b: f64) -> Self {
            Self {
                a: arr1(&[a]),
                b: arr1(&[b]),
            }
        }

        pub fn mixture(a: &[f64], b: &[f64]) -> Self {
            Self {
                a: arr1(a),
                b: arr1(b),
            }
        }
    }

    impl Components for VanDerWaals {
        fn components(&self) -> usize {
            self.a.len()
        }

        fn subset(&self, component_list: &[usize]) -> EosResult<Self> {
            Ok(Self {
                a: component_list.iter().map(|&i| self.a[i]).collect(),
                b: component_list.iter().map(|&i| self.b[i]).collect(),
            })
        }
    }

    impl Residual for VanDerWaals {
        fn compute_max_density(&self, moles: &Array1<f64>) -> f64 {
            let x = moles / moles.sum();
            0.9 / (&x * &self.b).sum()
        }

        fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy + ScalarOperand>(
            &self,
            state: &StateHD<D>,
        ) -> Vec<(String, D)> {
            let n = state.moles.sum();
            let rho = n / state.volume;
            let x = &state.moles / n;
            let mut a = D::zero();
            let mut b = D::zero();
            for i in 0..self.a.len() {
                b += x[i] * self.b[i];
                for j in 0..self.a.len() {
                    a += x[i] * x[j] * (self.a[i] * self.a[j]).sqrt();
                }
            }
            let repulsion = -n * (-rho * b).ln_1p();
            let attraction = -n * rho * a / state.temperature;
            vec![
                ("repulsion".to_string(), repulsion),
                ("attraction".to_string(), attraction),
            ]
        }
    }

    #[test]
    fn van_der_waals_pressure() -> EosResult<()> {
        let eos = Arc::new(VanDerWaals::pure(5000.0, 50.0));
        let t = 300.0;
        let rho = 5000.0;
        let state = State::new_density(&eos, t, rho, &arr1(&[1.0]))?;

        // reduced density in 1/Å³
        let rho_r = rho * NAV * 1e-30;
        let p_res = RGAS * t * rho * (rho_r * 50.0 / (1.0 - rho_r * 50.0))
            - RGAS * rho * rho_r * 5000.0;
        assert_relative_eq!(
            state.pressure(Contributions::Residual),
            p_res,
            max_relative = 1e-10
        );
        assert_relative_eq!(
            state.pressure(Contributions::Total),
            p_res + rho * RGAS * t,
            max_relative = 1e-10
        );
        Ok(())
    }

    #[test]
    fn pressure_derivative_matches_finite_difference() -> EosResult<()> {
        let eos = Arc::new(VanDerWaals::pure(5000.0, 50.0));
        let t = 300.0;
        let rho = 3000.0;
        let h = 1e-3;
        let s = State::new_density(&eos, t, rho, &arr1(&[1.0]))?;
        let sp = State::new_density(&eos, t, rho + h, &arr1(&[1.0]))?;
        let sm = State::new_density(&eos, t, rho - h, &arr1(&[1.0]))?;
        let fd = (sp.pressure(Contributions::Total) - sm.pressure(Contributions::Total)) / (2.0 * h);
        assert_relative_eq!(s.dp_drho(Contributions::Total), fd, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn equation_of_state_combines_contributions() {
        let residual = Arc::new(VanDerWaals::pure(5000.0, 50.0));
        let ideal_gas = Arc::new(DeBroglie::new(arr1(&[0.04])));
        let eos = EquationOfState::new(ideal_gas.clone(), residual.clone());
        assert_eq!(eos.components(), 1);
        assert_eq!(eos.ideal_gas_model(), ideal_gas.ideal_gas_model());
        assert_relative_eq!(eos.ln_lambda3(300.0)[0], ideal_gas.ln_lambda3(300.0)[0]);

        let state = StateHD::new(300.0, 1e5, arr1(&[10.0]));
        assert_relative_eq!(
            eos.residual_helmholtz_energy(&state),
            residual.residual_helmholtz_energy(&state),
            max_relative = 1e-14
        );
    }
}
