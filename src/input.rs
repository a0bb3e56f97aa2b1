//! Input files of the `despasito` command line program.
//!
//! An input file is a JSON object that defines the equation of state, the
//! components and one calculation:
//!
//! ```json
//! {
//!     "eos": "saft.gamma_mie",
//!     "beads": ["CO2", "H2O"],
//!     "nui": [[1, 0], [0, 1]],
//!     "beadparams": "SAFTgroup.json",
//!     "crossparams": "SAFTcross.json",
//!     "sitenames": ["H", "e1", "a1"],
//!     "calculation_type": "phase_xiT",
//!     "Tlist": [323.2],
//!     "xilist": [[0.96176473, 0.03823527]]
//! }
//! ```
//!
//! Parameter libraries are either given inline or as paths relative to the
//! input file.
use crate::eos::{EosType, ResidualModel};
use crate::thermo::{thermo, Calculation, CalculationOptions, ThermoOutput};
use despasito_core::parameter::{ParameterError, DEFAULT_SITENAMES};
use despasito_core::EosResult;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

fn default_sitenames() -> Vec<String> {
    DEFAULT_SITENAMES.iter().map(|s| s.to_string()).collect()
}

fn default_output_file() -> PathBuf {
    PathBuf::from("thermo_output.json")
}

/// A parameter library given inline or as path to a JSON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSource {
    Path(PathBuf),
    Inline(Value),
}

impl ParameterSource {
    /// Parsed library. Relative paths are resolved against `base`.
    pub fn load(&self, base: &Path) -> Result<Value, ParameterError> {
        match self {
            Self::Inline(value) => Ok(value.clone()),
            Self::Path(path) => {
                let path = base.join(path);
                debug!("reading parameters from {}", path.display());
                Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
            }
        }
    }
}

/// Contents of an input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputFile {
    pub eos: EosType,
    pub beads: Vec<String>,
    /// Number of each bead in every component, one row per component.
    pub nui: Vec<Vec<f64>>,
    pub beadparams: ParameterSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossparams: Option<ParameterSource>,
    #[serde(default = "default_sitenames")]
    pub sitenames: Vec<String>,
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    #[serde(flatten)]
    pub calculation: Calculation,
    #[serde(flatten)]
    pub options: CalculationOptions,
    /// Directory that relative paths refer to.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl InputFile {
    /// Read an input file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Self, ParameterError> {
        let file = file.as_ref();
        let mut input: Self = serde_json::from_reader(BufReader::new(File::open(file)?))?;
        input.base_dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(input)
    }

    /// The bead count matrix.
    pub fn nui(&self) -> Result<Array2<f64>, ParameterError> {
        let rows = self.nui.len();
        let cols = self.beads.len();
        if self.nui.iter().any(|row| row.len() != cols) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "every row of nui needs one entry for each of the {cols} beads"
            )));
        }
        Array2::from_shape_vec((rows, cols), self.nui.concat())
            .map_err(|e| ParameterError::IncompatibleParameters(e.to_string()))
    }

    /// The equation of state defined by the input file.
    pub fn equation_of_state(&self) -> EosResult<ResidualModel> {
        let bead_library = self.beadparams.load(&self.base_dir)?;
        let cross_library = self
            .crossparams
            .as_ref()
            .map(|c| c.load(&self.base_dir))
            .transpose()?;
        ResidualModel::new(
            self.eos,
            &self.beads,
            &self.nui()?,
            bead_library,
            cross_library,
            &self.sitenames,
        )
    }

    /// Path of the output file, relative paths are resolved against the input file.
    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.output_file)
    }

    /// Build the equation of state and evaluate the calculation.
    pub fn run(&self) -> EosResult<ThermoOutput> {
        let eos = Arc::new(self.equation_of_state()?);
        thermo(&eos, &self.calculation, &self.options)
    }
}

/// Write the results of a calculation as JSON.
pub fn write_output<P: AsRef<Path>>(output: &ThermoOutput, file: P) -> Result<(), ParameterError> {
    let writer = BufWriter::new(File::create(file)?);
    serde_json::to_writer_pretty(writer, output)?;
    Ok(())
}
