//! SAFT-γ Mie group-contribution equation of state
//!
//! [Papaioannou et al. (2014)](https://doi.org/10.1063/1.4851455)
pub mod corresponding_states;
mod eos;
pub(crate) mod parameters;

pub use corresponding_states::{corresponding_states_pressure_guess, CriticalProperties, PseudoBead};
pub use eos::{SaftGammaMie, SaftGammaMieOptions};
pub use parameters::{SaftGammaMieBinaryRecord, SaftGammaMieParameters, SaftGammaMieRecord};
