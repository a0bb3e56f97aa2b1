//! Vapor–liquid equilibria of pure components and mixtures at fixed temperature.
use crate::density::DensityScanOptions;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::warn;

mod bubble_dew;
mod solubility;
mod tp_flash;
mod vle_pure;
pub use bubble_dew::{bubble_pressure, dew_pressure, BubbleDewResult};
pub use solubility::hildebrand_solubility;
pub use tp_flash::{tp_flash, FlashResult};
pub use vle_pure::{saturation_pressure, SaturationProperties};

/// Level of detail in the iteration output.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Do not print output.
    #[default]
    None,
    /// Print information about the success of failure of the iteration.
    Result,
    /// Print a detailed output for every iteration.
    Iter,
}

/// Options for the various phase equilibria solvers.
///
/// If the values are [None], solver specific default
/// values are used.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Maximum number of iterations.
    pub max_iter: Option<usize>,
    /// Tolerance.
    pub tol: Option<f64>,
    /// Iteration output indicated by the [Verbosity] enum.
    pub verbosity: Verbosity,
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn unwrap_or(self, max_iter: usize, tol: f64) -> (usize, f64, Verbosity) {
        (
            self.max_iter.unwrap_or(max_iter),
            self.tol.unwrap_or(tol),
            self.verbosity,
        )
    }
}

/// Options shared by bubble point, dew point and flash calculations.
#[derive(Clone, Debug, Default)]
pub struct BubbleDewOptions {
    /// Options of the pressure iteration.
    pub outer: SolverOptions,
    /// Options of the successive substitution of the incipient phase composition.
    pub inner: SolverOptions,
    /// Options of the density scans used to find the phase densities.
    pub density: DensityScanOptions,
    /// Initial pressure in Pa. Estimated from Raoult's law otherwise.
    pub pressure_guess: Option<f64>,
    /// Bead names of every component. Used to guess a pressure for components
    /// without a saturation pressure at the given temperature.
    pub component_beads: Option<Vec<Vec<String>>>,
}

/// Default pressure in Pa used in place of a saturation pressure for
/// a supercritical component.
const DEFAULT_SUPERCRITICAL_PRESSURE: f64 = 7.377e6;

/// Rough guess in Pa standing in for the saturation pressure of a
/// component above its critical temperature.
///
/// The guess is chosen according to the beads the component is built
/// from. If several beads are recognized, the last one wins.
pub fn supercritical_pressure_guess<S: AsRef<str>>(beads: &[S]) -> f64 {
    let mut guess = None;
    for bead in beads {
        let bead = bead.as_ref();
        if bead == "CO2" {
            guess = Some(10.377e6);
        } else if bead == "N2" {
            guess = Some(7.377e6);
        } else if bead.contains("CH4") {
            guess = Some(6.377e6);
        } else if bead.contains("CH3CH3") {
            guess = Some(7.377e6);
        }
    }
    guess.unwrap_or_else(|| {
        warn!(
            "no saturation pressure guess for supercritical component with beads [{}], using {} Pa",
            beads.iter().map(|b| b.as_ref()).collect::<Vec<_>>().join(", "),
            DEFAULT_SUPERCRITICAL_PRESSURE
        );
        DEFAULT_SUPERCRITICAL_PRESSURE
    })
}

/// Normalize a composition, returning NaN entries if it sums to zero.
fn normalize(x: &Array1<f64>) -> Array1<f64> {
    x / x.sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_guess_from_beads() {
        assert_eq!(supercritical_pressure_guess(&["CO2"]), 10.377e6);
        assert_eq!(supercritical_pressure_guess(&["CH4"]), 6.377e6);
        assert_eq!(supercritical_pressure_guess(&["CH3", "CO2"]), 10.377e6);
        assert_eq!(supercritical_pressure_guess(&["CO2", "N2"]), 7.377e6);
        assert_eq!(supercritical_pressure_guess(&["H2O"]), 7.377e6);
    }

    #[test]
    fn solver_options_defaults() {
        let options = SolverOptions::new().tol(1e-4);
        assert_eq!(options.unwrap_or(10, 1e-8), (10, 1e-4, Verbosity::None));
    }
}
