use despasito_core::{DensityScanOptions, EosError, EosResult, SolverOptions};
use serde::{Deserialize, Deserializer, Serialize};

/// A single value or a list of values.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(x) => vec![x],
        OneOrMany::Many(x) => x,
    })
}

fn one_or_many_opt<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    one_or_many(deserializer).map(Some)
}

/// Solver settings shared by all calculation types.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationOptions {
    /// Options of the pressure–density scans.
    pub density_opts: DensityScanOptions,
    /// Options of the successive substitution of phase compositions.
    pub mole_fraction_options: SolverOptions,
    /// Options of the outer pressure iteration.
    pub pressure_options: SolverOptions,
}

/// Temperatures, pressures and compositions of a calculation.
///
/// Every list holds either one entry or as many entries as the longest list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conditions {
    /// Temperatures in K
    #[serde(rename = "Tlist", deserialize_with = "one_or_many")]
    pub temperature: Vec<f64>,
    /// Pressures in Pa
    #[serde(
        rename = "Plist",
        default,
        deserialize_with = "one_or_many_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub pressure: Option<Vec<f64>>,
    /// Liquid mole fractions
    #[serde(
        rename = "xilist",
        default,
        deserialize_with = "one_or_many_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub liquid_molefracs: Option<Vec<Vec<f64>>>,
    /// Vapor mole fractions
    #[serde(
        rename = "yilist",
        default,
        deserialize_with = "one_or_many_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub vapor_molefracs: Option<Vec<Vec<f64>>>,
    /// Initial pressures in Pa of phase equilibrium calculations
    #[serde(
        rename = "Pguess",
        default,
        deserialize_with = "one_or_many_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub pressure_guess: Option<Vec<f64>>,
}

/// Number of points after broadcasting lists of lengths `lengths`.
pub(crate) fn broadcast_len(lengths: &[(&str, usize)]) -> EosResult<usize> {
    let n = lengths.iter().map(|&(_, l)| l).max().unwrap_or(0);
    if n == 0 {
        return Err(EosError::Error("no conditions given".into()));
    }
    for &(name, l) in lengths {
        if l != 1 && l != n {
            return Err(EosError::Error(format!(
                "{name} has {l} entries, expected 1 or {n}"
            )));
        }
    }
    Ok(n)
}

/// Entry `i` of a list that has either one or `n > i` entries.
pub(crate) fn broadcast<T>(list: &[T], i: usize) -> &T {
    if list.len() == 1 {
        &list[0]
    } else {
        &list[i]
    }
}

/// The entries of a list that the calculation cannot do without.
pub(crate) fn required<'a, T>(list: &'a Option<Vec<T>>, name: &str) -> EosResult<&'a [T]> {
    match list {
        Some(l) if !l.is_empty() => Ok(l),
        _ => Err(EosError::Error(format!("calculation requires {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_or_list() {
        let c: Conditions = serde_json::from_value(json!({
            "Tlist": 300.0,
            "Plist": [1e5, 2e5],
            "xilist": [[0.5, 0.5]]
        }))
        .unwrap();
        assert_eq!(c.temperature, vec![300.0]);
        assert_eq!(c.pressure.as_ref().unwrap().len(), 2);
        assert_eq!(c.liquid_molefracs.as_ref().unwrap().len(), 1);
        assert!(c.vapor_molefracs.is_none());
    }

    #[test]
    fn broadcasting() {
        assert_eq!(broadcast_len(&[("Tlist", 1), ("Plist", 3)]).unwrap(), 3);
        assert!(broadcast_len(&[("Tlist", 2), ("Plist", 3)]).is_err());
        assert!(broadcast_len(&[("Tlist", 0)]).is_err());
        let list = [1.0];
        assert_eq!(*broadcast(&list, 2), 1.0);
    }
}
