use crate::association::AssociationParameters;
use crate::group_contribution::BeadSegments;
use crate::hard_sphere::HardSphereProperties;
use despasito_core::parameter::{
    BeadRecord, BinaryBeadRecord, ComponentRecord, GroupContributionParameter, ParameterError,
};
use despasito_core::MolarWeight;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

fn one() -> f64 {
    1.0
}

/// SAFT-γ SW bead parameters.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaftGammaSwRecord {
    /// Well depth in units of Kelvin
    pub epsilon: f64,
    /// Segment diameter in units of meter
    pub sigma: f64,
    /// Range of the square well relative to sigma
    pub lambda: f64,
    /// Shape factor
    #[serde(rename = "Sk", default = "one")]
    pub sk: f64,
    /// Number of identical segments
    #[serde(rename = "Vks", default = "one")]
    pub vks: f64,
}

impl SaftGammaSwRecord {
    pub fn new(epsilon: f64, sigma: f64, lambda: f64, sk: f64, vks: f64) -> Self {
        Self {
            epsilon,
            sigma,
            lambda,
            sk,
            vks,
        }
    }
}

impl fmt::Display for SaftGammaSwRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SaftGammaSwRecord(epsilon={}, sigma={}, lambda={}, Sk={}, Vks={})",
            self.epsilon, self.sigma, self.lambda, self.sk, self.vks
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SaftGammaSwBinaryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda: Option<f64>,
}

/// Parameter set required for the SAFT-γ SW equation of state.
#[derive(Clone)]
pub struct SaftGammaSwParameters {
    pub segments: BeadSegments,
    pub m: Array1<f64>,
    /// Segment diameter of every bead type in units of Å
    pub sigma: Array1<f64>,
    pub epsilon: Array1<f64>,
    pub lambda: Array1<f64>,
    pub sk: Array1<f64>,
    pub vks: Array1<f64>,
    pub sigma_kl: Array2<f64>,
    pub epsilon_kl: Array2<f64>,
    pub lambda_kl: Array2<f64>,
    /// Segment diameters, indexed like the segments
    pub segment_sigma: Array1<f64>,
    pub association: AssociationParameters,
    pub components: Vec<ComponentRecord>,
    pub bead_records: Vec<BeadRecord<SaftGammaSwRecord>>,
    pub binary_records: Vec<BinaryBeadRecord<SaftGammaSwBinaryRecord>>,
}

impl GroupContributionParameter for SaftGammaSwParameters {
    type Bead = SaftGammaSwRecord;
    type Binary = SaftGammaSwBinaryRecord;

    fn from_records(
        components: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<Self::Bead>>,
        binary_records: Vec<BinaryBeadRecord<Self::Binary>>,
    ) -> Result<Self, ParameterError> {
        let segments = BeadSegments::new(&components, &bead_records)?;
        let n = bead_records.len();

        for r in bead_records.iter() {
            if r.model_record.lambda <= 1.0 {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "bead {}: square well range lambda={} has to exceed one",
                    r.identifier, r.model_record.lambda
                )));
            }
        }
        let field = |f: fn(&SaftGammaSwRecord) -> f64| -> Array1<f64> {
            bead_records.iter().map(|r| f(&r.model_record)).collect()
        };
        let sigma = field(|r| r.sigma * 1e10);
        let epsilon = field(|r| r.epsilon);
        let lambda = field(|r| r.lambda);
        let sk = field(|r| r.sk);
        let vks = field(|r| r.vks);

        let sigma_kl = Array2::from_shape_fn((n, n), |(k, l)| 0.5 * (sigma[k] + sigma[l]));
        let mut epsilon_kl =
            Array2::from_shape_fn((n, n), |(k, l)| (epsilon[k] * epsilon[l]).sqrt());
        let mut lambda_kl = Array2::from_shape_fn((n, n), |(k, l)| {
            (lambda[k] * sigma[k] + lambda[l] * sigma[l]) / (sigma[k] + sigma[l])
        });
        for record in binary_records.iter() {
            let Some(model) = record.model_record.as_ref() else {
                continue;
            };
            let position = |id: &String| bead_records.iter().position(|r| &r.identifier == id);
            let (Some(k), Some(l)) = (position(&record.id1), position(&record.id2)) else {
                warn!(
                    "cross interaction {}-{} refers to unused beads",
                    record.id1, record.id2
                );
                continue;
            };
            if let Some(e) = model.epsilon {
                epsilon_kl[[k, l]] = e;
                epsilon_kl[[l, k]] = e;
            }
            if let Some(x) = model.lambda {
                lambda_kl[[k, l]] = x;
                lambda_kl[[l, k]] = x;
            }
        }

        let m = segments.geometry_coefficients(&vks, &sk);
        let segment_sigma = segments.bead_index.mapv(|k| sigma[k]);
        let association = AssociationParameters::new(
            &segments.component_index,
            &segments.bead_index,
            &segments.count,
            &bead_records,
            &binary_records,
        );

        Ok(Self {
            segments,
            m,
            sigma,
            epsilon,
            lambda,
            sk,
            vks,
            sigma_kl,
            epsilon_kl,
            lambda_kl,
            segment_sigma,
            association,
            components,
            bead_records,
            binary_records,
        })
    }

    #[allow(clippy::type_complexity)]
    fn records(
        &self,
    ) -> (
        &[ComponentRecord],
        &[BeadRecord<SaftGammaSwRecord>],
        &[BinaryBeadRecord<SaftGammaSwBinaryRecord>],
    ) {
        (&self.components, &self.bead_records, &self.binary_records)
    }
}

impl HardSphereProperties for SaftGammaSwParameters {
    fn component_index(&self) -> &Array1<usize> {
        &self.segments.component_index
    }

    fn geometry_coefficients(&self) -> &Array1<f64> {
        &self.m
    }

    /// The square-well core is hard, so the diameter equals sigma.
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, _: D) -> Array1<D> {
        self.segment_sigma.mapv(D::from)
    }
}

impl MolarWeight for SaftGammaSwParameters {
    fn molar_weight(&self) -> Array1<f64> {
        self.segments.molarweight.clone()
    }
}

impl fmt::Display for SaftGammaSwParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaftGammaSwParameters(")?;
        write!(
            f,
            "\n\tcomponents=[{}]",
            self.components
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        write!(f, "\n\tm={}", self.m)?;
        write!(f, "\n\tsigma={}", self.sigma)?;
        write!(f, "\n\tepsilon={}", self.epsilon)?;
        write!(f, "\n\tlambda={}", self.lambda)?;
        if !self.association.is_empty() {
            write!(f, "\n\tassociation={}", self.association)?;
        }
        write!(f, "\n)")
    }
}

#[cfg(test)]
pub mod utils {
    use super::*;
    use despasito_core::parameter::BeadLibrary;
    use ndarray::arr2;
    use serde_json::json;

    /// Methyl and methylene groups of Lymperiadis et al. (2008) and a water bead.
    pub fn library() -> BeadLibrary<SaftGammaSwRecord> {
        let value = json!({
            "CH3": {"epsilon": 256.77, "sigma": 3.737e-10, "lambda": 1.4, "Sk": 0.667, "mass": 0.015035},
            "CH2": {"epsilon": 473.39, "sigma": 4.065e-10, "lambda": 1.4, "Sk": 0.333, "mass": 0.014027},
            "H2O": {
                "epsilon": 250.0, "sigma": 3.036e-10, "lambda": 1.8, "mass": 0.018015,
                "NkH": 2, "Nke1": 2, "epsilonHe1": 1400.0, "KHe1": 1.06e-30
            }
        });
        let sitenames = vec!["H".to_string(), "e1".to_string()];
        BeadLibrary::from_json_value(value, &sitenames).unwrap()
    }

    pub fn butane() -> SaftGammaSwParameters {
        let beads = vec!["CH3".to_string(), "CH2".to_string()];
        SaftGammaSwParameters::from_libraries(&beads, &arr2(&[[2.0, 2.0]]), &library(), None)
            .unwrap()
    }

    pub fn butane_water() -> SaftGammaSwParameters {
        let beads = vec!["CH3".to_string(), "CH2".to_string(), "H2O".to_string()];
        let nui = arr2(&[[2.0, 2.0, 0.0], [0.0, 0.0, 1.0]]);
        SaftGammaSwParameters::from_libraries(&beads, &nui, &library(), None).unwrap()
    }
}
