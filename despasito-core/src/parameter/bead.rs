use super::ParameterError;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Raw key-value representation of a bead library entry.
type RawRecord = IndexMap<String, f64>;

/// Number of association sites of one type on a bead.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssociationSiteRecord {
    pub name: String,
    pub n: f64,
}

/// Association between site `site1` and site `site2`.
///
/// `epsilon` is the association energy in K, `kappa` the bonding volume in m³.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BondRecord {
    pub site1: String,
    pub site2: String,
    pub epsilon: f64,
    pub kappa: f64,
}

/// Parameters describing an individual bead (group).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BeadRecord<M> {
    pub identifier: String,
    pub molarweight: f64,
    pub model_record: M,
    pub sites: Vec<AssociationSiteRecord>,
    pub bonds: Vec<BondRecord>,
}

impl<M> BeadRecord<M> {
    /// Creates a new `BeadRecord` without association sites.
    pub fn new(identifier: String, molarweight: f64, model_record: M) -> Self {
        Self {
            identifier,
            molarweight,
            model_record,
            sites: Vec::new(),
            bonds: Vec::new(),
        }
    }

    /// Number of sites of the given type on this bead.
    pub fn site_count(&self, site: &str) -> f64 {
        self.sites
            .iter()
            .find(|s| s.name == site)
            .map_or(0.0, |s| s.n)
    }
}

impl<M> PartialEq for BeadRecord<M> {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

/// Cross interactions between two beads.
///
/// Bonds connect `site1` on bead `id1` with `site2` on bead `id2`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BinaryBeadRecord<B> {
    pub id1: String,
    pub id2: String,
    pub model_record: Option<B>,
    pub bonds: Vec<BondRecord>,
}

impl<B> BinaryBeadRecord<B> {
    /// Creates a new `BinaryBeadRecord` without cross association.
    pub fn new(id1: String, id2: String, model_record: Option<B>) -> Self {
        Self {
            id1,
            id2,
            model_record,
            bonds: Vec::new(),
        }
    }

    /// Return true if the record connects the two beads (in any order).
    pub fn connects(&self, bead1: &str, bead2: &str) -> bool {
        (self.id1 == bead1 && self.id2 == bead2) || (self.id1 == bead2 && self.id2 == bead1)
    }
}

/// Keys of a raw record that describe association.
enum AssociationKey {
    Sites(String),
    Energy(String, String),
    Volume(String, String),
}

fn split_site_pair(rest: &str, sitenames: &[String]) -> Option<(String, String)> {
    sitenames.iter().find_map(|a| {
        rest.strip_prefix(a.as_str())
            .and_then(|b| sitenames.iter().find(|s| s.as_str() == b))
            .map(|b| (a.clone(), b.clone()))
    })
}

fn parse_association_key(key: &str, sitenames: &[String]) -> Option<AssociationKey> {
    if let Some(site) = key.strip_prefix("Nk") {
        return sitenames
            .iter()
            .find(|s| s.as_str() == site)
            .map(|s| AssociationKey::Sites(s.clone()));
    }
    if let Some(rest) = key.strip_prefix("epsilon") {
        return split_site_pair(rest, sitenames).map(|(a, b)| AssociationKey::Energy(a, b));
    }
    if let Some(rest) = key.strip_prefix('K') {
        return split_site_pair(rest, sitenames).map(|(a, b)| AssociationKey::Volume(a, b));
    }
    None
}

/// Split a raw record into model keys, association sites and bonds.
fn split_record(
    context: &str,
    raw: &RawRecord,
    sitenames: &[String],
) -> Result<(Map<String, Value>, Vec<AssociationSiteRecord>, Vec<BondRecord>), ParameterError> {
    let mut model = Map::new();
    let mut sites = Vec::new();
    let mut energies: IndexMap<(String, String), f64> = IndexMap::new();
    let mut volumes: IndexMap<(String, String), f64> = IndexMap::new();

    for (key, &value) in raw {
        match parse_association_key(key, sitenames) {
            Some(AssociationKey::Sites(name)) => sites.push(AssociationSiteRecord { name, n: value }),
            Some(AssociationKey::Energy(a, b)) => {
                energies.insert((a, b), value);
            }
            Some(AssociationKey::Volume(a, b)) => {
                volumes.insert((a, b), value);
            }
            None => {
                model.insert(key.clone(), Value::from(value));
            }
        }
    }

    let mut bonds = Vec::with_capacity(energies.len());
    for ((a, b), epsilon) in energies {
        let kappa = volumes.swap_remove(&(a.clone(), b.clone())).ok_or_else(|| {
            ParameterError::InsufficientInformation(format!(
                "{context}: association energy epsilon{a}{b} without bonding volume K{a}{b}"
            ))
        })?;
        bonds.push(BondRecord {
            site1: a,
            site2: b,
            epsilon,
            kappa,
        });
    }
    if let Some((a, b)) = volumes.keys().next() {
        return Err(ParameterError::InsufficientInformation(format!(
            "{context}: bonding volume K{a}{b} without association energy epsilon{a}{b}"
        )));
    }
    Ok((model, sites, bonds))
}

/// Collection of bead records read from a bead library.
///
/// The library is a JSON object mapping bead names to objects of
/// parameter names and values, e.g.
/// `{"CO2": {"mass": 0.04401, "epsilon": 207.89, "sigma": 3.05e-10, ...}}`.
#[derive(Debug, Clone)]
pub struct BeadLibrary<M> {
    pub records: IndexMap<String, BeadRecord<M>>,
}

impl<M: DeserializeOwned> BeadLibrary<M> {
    /// Parse a bead library from a JSON value.
    pub fn from_json_value(value: Value, sitenames: &[String]) -> Result<Self, ParameterError> {
        let raw: IndexMap<String, RawRecord> = serde_json::from_value(value)?;
        let records = raw
            .into_iter()
            .map(|(identifier, raw)| -> Result<_, ParameterError> {
                let molarweight = *raw.get("mass").ok_or_else(|| {
                    ParameterError::InsufficientInformation(format!(
                        "bead {identifier} has no mass"
                    ))
                })?;
                let (mut model, sites, bonds) = split_record(&identifier, &raw, sitenames)?;
                model.remove("mass");
                let model_record = serde_json::from_value(Value::Object(model))?;
                let record = BeadRecord {
                    identifier: identifier.clone(),
                    molarweight,
                    model_record,
                    sites,
                    bonds,
                };
                Ok((identifier, record))
            })
            .collect::<Result<_, ParameterError>>()?;
        Ok(Self { records })
    }

    /// Read a bead library from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P, sitenames: &[String]) -> Result<Self, ParameterError> {
        let value = serde_json::from_reader(BufReader::new(File::open(file)?))?;
        Self::from_json_value(value, sitenames)
    }
}

/// Collection of cross interaction records.
///
/// The library is a JSON object of the form `{bead1: {bead2: {key: value}}}`.
#[derive(Debug, Clone)]
pub struct CrossLibrary<B> {
    pub records: Vec<BinaryBeadRecord<B>>,
}

impl<B> Default for CrossLibrary<B> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<B: DeserializeOwned> CrossLibrary<B> {
    /// Parse a cross library from a JSON value.
    pub fn from_json_value(value: Value, sitenames: &[String]) -> Result<Self, ParameterError> {
        let raw: IndexMap<String, IndexMap<String, RawRecord>> = serde_json::from_value(value)?;
        let mut records = Vec::new();
        for (id1, partners) in raw {
            for (id2, raw) in partners {
                let context = format!("{id1}-{id2}");
                let (model, _, bonds) = split_record(&context, &raw, sitenames)?;
                let model_record = if model.is_empty() {
                    None
                } else {
                    Some(serde_json::from_value(Value::Object(model))?)
                };
                records.push(BinaryBeadRecord {
                    id1: id1.clone(),
                    id2,
                    model_record,
                    bonds,
                });
            }
        }
        Ok(Self { records })
    }

    /// Read a cross library from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P, sitenames: &[String]) -> Result<Self, ParameterError> {
        let value = serde_json::from_reader(BufReader::new(File::open(file)?))?;
        Self::from_json_value(value, sitenames)
    }
}

impl<B> CrossLibrary<B> {
    /// Return the record connecting two beads, if any.
    pub fn get(&self, bead1: &str, bead2: &str) -> Option<&BinaryBeadRecord<B>> {
        self.records.iter().find(|r| r.connects(bead1, bead2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, Debug, Clone)]
    struct Record {
        epsilon: f64,
        sigma: f64,
    }

    #[derive(Deserialize, Debug, Clone)]
    struct Binary {
        epsilon: Option<f64>,
    }

    fn sitenames() -> Vec<String> {
        vec!["H".to_string(), "e1".to_string(), "a1".to_string()]
    }

    #[test]
    fn bead_with_association() -> Result<(), ParameterError> {
        let value = json!({
            "H2O": {
                "epsilon": 266.68, "sigma": 3.0063e-10, "mass": 0.018015,
                "NkH": 2, "Nke1": 2, "epsilonHe1": 1985.4, "KHe1": 1.0169e-28
            },
            "CO2": {"epsilon": 207.89, "sigma": 3.05e-10, "mass": 0.04401}
        });
        let lib: BeadLibrary<Record> = BeadLibrary::from_json_value(value, &sitenames())?;
        let water = &lib.records["H2O"];
        assert_eq!(water.molarweight, 0.018015);
        assert_eq!(water.model_record.epsilon, 266.68);
        assert_eq!(water.site_count("H"), 2.0);
        assert_eq!(water.site_count("a1"), 0.0);
        assert_eq!(water.bonds.len(), 1);
        assert_eq!(water.bonds[0].site1, "H");
        assert_eq!(water.bonds[0].site2, "e1");
        assert_eq!(lib.records["CO2"].model_record.sigma, 3.05e-10);
        assert!(lib.records["CO2"].sites.is_empty());
        Ok(())
    }

    #[test]
    fn missing_mass() {
        let value = json!({"CO2": {"epsilon": 207.89, "sigma": 3.05e-10}});
        let lib: Result<BeadLibrary<Record>, _> = BeadLibrary::from_json_value(value, &sitenames());
        assert!(matches!(lib, Err(ParameterError::InsufficientInformation(_))));
    }

    #[test]
    fn missing_model_key() {
        let value = json!({"CO2": {"epsilon": 207.89, "mass": 0.044}});
        let lib: Result<BeadLibrary<Record>, _> = BeadLibrary::from_json_value(value, &sitenames());
        assert!(matches!(lib, Err(ParameterError::Serde(_))));
    }

    #[test]
    fn unpaired_bond() {
        let value = json!({"H2O": {"epsilon": 1.0, "sigma": 1.0, "mass": 0.018, "KHe1": 1e-28}});
        let lib: Result<BeadLibrary<Record>, _> = BeadLibrary::from_json_value(value, &sitenames());
        assert!(lib.is_err());
    }

    #[test]
    fn cross_library() -> Result<(), ParameterError> {
        let value = json!({
            "CO2": {"H2O": {"epsilon": 226.38, "epsilona1H": 2200.0, "Ka1H": 9.1e-29}}
        });
        let lib: CrossLibrary<Binary> = CrossLibrary::from_json_value(value, &sitenames())?;
        let record = lib.get("H2O", "CO2").unwrap();
        assert_eq!(record.model_record.as_ref().unwrap().epsilon, Some(226.38));
        assert_eq!(record.bonds[0].site1, "a1");
        assert_eq!(record.bonds[0].site2, "H");
        Ok(())
    }
}
