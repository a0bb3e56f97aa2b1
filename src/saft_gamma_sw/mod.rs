//! SAFT-γ SW group-contribution equation of state
//!
//! [Lymperiadis et al. (2008)](https://doi.org/10.1016/j.fluid.2008.09.003)
mod eos;
pub(crate) mod parameters;

pub use eos::{SaftGammaSw, SaftGammaSwOptions};
pub use parameters::{SaftGammaSwBinaryRecord, SaftGammaSwParameters, SaftGammaSwRecord};
