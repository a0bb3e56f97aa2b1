//! Structures and traits that can be used to build group-contribution
//! model parameters from bead libraries.

use indexmap::{IndexMap, IndexSet};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

mod bead;

pub use bead::{
    AssociationSiteRecord, BeadLibrary, BeadRecord, BinaryBeadRecord, BondRecord, CrossLibrary,
};

/// Site names used if an input does not provide any.
pub const DEFAULT_SITENAMES: [&str; 3] = ["H", "e1", "e2"];

/// A component made up of beads.
///
/// The counts are the number of each bead type in the molecule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub name: String,
    pub beads: IndexMap<String, f64>,
}

impl ComponentRecord {
    /// Creates a new `ComponentRecord`.
    pub fn new(name: String, beads: IndexMap<String, f64>) -> Self {
        Self { name, beads }
    }

    /// Build the components from the rows of a bead count matrix.
    ///
    /// Beads with a count of zero are not part of the component. The name of a
    /// component is the concatenation of its bead names, each repeated by its count.
    pub fn from_nui(beads: &[String], nui: &Array2<f64>) -> Result<Vec<Self>, ParameterError> {
        if nui.ncols() != beads.len() {
            return Err(ParameterError::IncompatibleParameters(format!(
                "nui has {} columns but {} beads are given",
                nui.ncols(),
                beads.len()
            )));
        }
        nui.rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let counts: IndexMap<String, f64> = beads
                    .iter()
                    .zip(row.iter())
                    .filter(|(_, &n)| n != 0.0)
                    .map(|(b, &n)| (b.clone(), n))
                    .collect();
                if counts.is_empty() {
                    return Err(ParameterError::IncompatibleParameters(format!(
                        "component {i} does not contain any beads"
                    )));
                }
                if let Some((b, n)) = counts.iter().find(|(_, &n)| n < 0.0 || !n.is_finite()) {
                    return Err(ParameterError::IncompatibleParameters(format!(
                        "invalid count {n} of bead {b} in component {i}"
                    )));
                }
                let name = counts
                    .iter()
                    .map(|(b, &n)| b.repeat((n.round() as usize).max(1)))
                    .collect();
                Ok(Self::new(name, counts))
            })
            .collect()
    }
}

impl fmt::Display for ComponentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentRecord(name={}, beads={:?})", self.name, self.beads)
    }
}

/// Constructor methods for group-contribution parameters.
///
/// By implementing `GroupContributionParameter` for a type, you define how
/// parameters of an equation of state are constructed from the bead counts
/// of each component, the bead records and the cross interaction records.
pub trait GroupContributionParameter: Sized {
    type Bead: Clone + DeserializeOwned;
    type Binary: Clone + DeserializeOwned;

    /// Creates parameters from the component definitions and bead information.
    fn from_records(
        components: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<Self::Bead>>,
        binary_records: Vec<BinaryBeadRecord<Self::Binary>>,
    ) -> Result<Self, ParameterError>;

    /// Return the original records that were used to construct the parameters.
    #[allow(clippy::type_complexity)]
    fn records(
        &self,
    ) -> (
        &[ComponentRecord],
        &[BeadRecord<Self::Bead>],
        &[BinaryBeadRecord<Self::Binary>],
    );

    /// Creates parameters from a bead count matrix and bead libraries.
    fn from_libraries(
        beads: &[String],
        nui: &Array2<f64>,
        bead_library: &BeadLibrary<Self::Bead>,
        cross_library: Option<&CrossLibrary<Self::Binary>>,
    ) -> Result<Self, ParameterError> {
        let components = ComponentRecord::from_nui(beads, nui)?;
        let used: IndexSet<&String> = components.iter().flat_map(|c| c.beads.keys()).collect();

        let missing: Vec<&String> = used
            .iter()
            .filter(|b| !bead_library.records.contains_key(**b))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ParameterError::ComponentsNotFound(format!("{:?}", missing)));
        }

        let bead_records = used
            .iter()
            .filter_map(|b| bead_library.records.get(*b).cloned())
            .collect();
        let binary_records = cross_library
            .map(|c| {
                c.records
                    .iter()
                    .filter(|r| used.contains(&r.id1) && used.contains(&r.id2))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Self::from_records(components, bead_records, binary_records)
    }

    /// Creates parameters from bead information stored in json files.
    fn from_json<P: AsRef<Path>>(
        beads: &[String],
        nui: &Array2<f64>,
        file_beads: P,
        file_cross: Option<P>,
        sitenames: &[String],
    ) -> Result<Self, ParameterError> {
        let bead_library = BeadLibrary::from_json(file_beads, sitenames)?;
        let cross_library = file_cross
            .map(|f| CrossLibrary::from_json(f, sitenames))
            .transpose()?;
        Self::from_libraries(beads, nui, &bead_library, cross_library.as_ref())
    }

    /// Return the parameters of the components contained in component_list.
    fn subset(&self, component_list: &[usize]) -> Result<Self, ParameterError> {
        let (components, bead_records, binary_records) = self.records();
        let components = component_list
            .iter()
            .map(|&i| {
                components.get(i).cloned().ok_or_else(|| {
                    ParameterError::IncompatibleParameters(format!(
                        "component index {i} is out of range for {} components",
                        components.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let used: IndexSet<&String> = components.iter().flat_map(|c| c.beads.keys()).collect();
        let bead_records = bead_records
            .iter()
            .filter(|r| used.contains(&r.identifier))
            .cloned()
            .collect();
        let binary_records = binary_records
            .iter()
            .filter(|r| used.contains(&r.id1) && used.contains(&r.id2))
            .cloned()
            .collect();
        Self::from_records(components, bead_records, binary_records)
    }
}

/// Error type for incomplete parameter information and IO problems.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("The following bead(s) were not found: {0}")]
    ComponentsNotFound(String),
    #[error("Information missing: {0}")]
    InsufficientInformation(String),
    #[error("Incompatible parameters: {0}")]
    IncompatibleParameters(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn components_from_nui() -> Result<(), ParameterError> {
        let beads = vec!["CH3".to_string(), "CO2".to_string()];
        let nui = arr2(&[[2.0, 0.0], [0.0, 1.0]]);
        let components = ComponentRecord::from_nui(&beads, &nui)?;
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name, "CH3CH3");
        assert_eq!(components[0].beads["CH3"], 2.0);
        assert!(!components[0].beads.contains_key("CO2"));
        assert_eq!(components[1].name, "CO2");
        Ok(())
    }

    #[test]
    fn nui_shape_mismatch() {
        let beads = vec!["CO2".to_string()];
        let nui = arr2(&[[1.0, 1.0]]);
        assert!(matches!(
            ComponentRecord::from_nui(&beads, &nui),
            Err(ParameterError::IncompatibleParameters(_))
        ));
    }

    #[test]
    fn empty_component() {
        let beads = vec!["CO2".to_string()];
        let nui = arr2(&[[0.0]]);
        assert!(ComponentRecord::from_nui(&beads, &nui).is_err());
    }
}
