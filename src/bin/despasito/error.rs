use despasito_core::parameter::ParameterError;
use despasito_core::EosError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input file: {0}")]
    Input(#[from] ParameterError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] EosError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
