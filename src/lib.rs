//! DESPASITO: Determining Equilibrium State and Parametrization: Application
//! for SAFT, Intended for Thermodynamic Output.
//!
//! Group-contribution SAFT-γ equations of state with the Mie and the
//! square-well potential, and batch calculations of phase equilibria and
//! liquid properties driven by JSON input files.
//!
//! The equations of state implement the traits of [despasito_core], so every
//! state property and solver of the core crate is available for them:
//!
//! ```no_run
//! # use despasito::eos::{EosType, ResidualModel};
//! # use despasito_core::{saturation_pressure, DensityScanOptions, EosResult, SolverOptions};
//! # use ndarray::{arr1, arr2};
//! # use std::sync::Arc;
//! # fn main() -> EosResult<()> {
//! let library = serde_json::from_str(r#"{
//!     "CO2": {"epsilon": 207.89, "l_a": 5.055, "l_r": 26.408, "sigma": 3.05e-10,
//!             "Sk": 0.8468, "Vks": 2, "mass": 0.04401}
//! }"#).unwrap();
//! let eos = Arc::new(ResidualModel::new(
//!     EosType::SaftGammaMie,
//!     &["CO2".to_string()],
//!     &arr2(&[[1.0]]),
//!     library,
//!     None,
//!     &["H".to_string(), "e1".to_string()],
//! )?);
//! let sat = saturation_pressure(
//!     &eos,
//!     273.15,
//!     &arr1(&[1.0]),
//!     &DensityScanOptions::default(),
//!     SolverOptions::default(),
//! )?;
//! println!("{} Pa", sat.pressure);
//! # Ok(())
//! # }
//! ```
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod association;
pub mod eos;
pub mod group_contribution;
pub mod hard_sphere;
pub mod input;
pub mod saft_gamma_mie;
pub mod saft_gamma_sw;
pub mod thermo;

pub use eos::{EosType, ResidualModel};
pub use input::InputFile;
pub use thermo::{thermo, Calculation, CalculationOptions, ThermoOutput};

#[cfg(feature = "rayon")]
pub use thermo::par_thermo;
