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

const X_K21: [f64; 21] = [
    -0.995657163025808080735527280689003,
    -0.973906528517171720077964012084452,
    -0.930157491355708226001207180059508,
    -0.865063366688984510732096688423493,
    -0.780817726586416897063717578345042,
    -0.679409568299024406234327365114874,
    -0.562757134668604683339000099272694,
    -0.433395394129247190799265943165784,
    -0.294392862701460198131126603103866,
    -0.148874338981631210884826001129720,
    0.000000000000000000000000000000000,
    0.148874338981631210884826001129720,
    0.294392862701460198131126603103866,
    0.433395394129247190799265943165784,
    0.562757134668604683339000099272694,
    0.679409568299024406234327365114874,
    0.780817726586416897063717578345042,
    0.865063366688984510732096688423493,
    0.930157491355708226001207180059508,
    0.973906528517171720077964012084452,
    0.995657163025808080735527280689003,
];

const W_K21: [f64; 21] = [
    0.011694638867371874278064396062192,
    0.032558162307964727478818972459390,
    0.054755896574351996031381300244580,
    0.075039674810919952767043140916190,
    0.093125454583697605535065465083366,
    0.109387158802297641899210590325805,
    0.123491976262065851077958109831074,
    0.134709217311473325928054001771707,
    0.142775938577060080797094273138717,
    0.147739104901338491374841515972068,
    0.149445554002916905664936468389821,
    0.147739104901338491374841515972068,
    0.142775938577060080797094273138717,
    0.134709217311473325928054001771707,
    0.123491976262065851077958109831074,
    0.109387158802297641899210590325805,
    0.093125454583697605535065465083366,
    0.075039674810919952767043140916190,
    0.054755896574351996031381300244580,
    0.032558162307964727478818972459390,
    0.011694638867371874278064396062192,
];

fn default_la() -> f64 {
    6.0
}

fn one() -> f64 {
    1.0
}

/// SAFT-γ Mie bead parameters.
///
/// Field names follow the keys of the bead library.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaftGammaMieRecord {
    /// Dispersion energy in units of Kelvin
    pub epsilon: f64,
    /// Segment diameter in units of meter
    pub sigma: f64,
    /// Repulsive Mie exponent
    #[serde(rename = "l_r")]
    pub lr: f64,
    /// Attractive Mie exponent
    #[serde(rename = "l_a", default = "default_la")]
    pub la: f64,
    /// Shape factor
    #[serde(rename = "Sk", default = "one")]
    pub sk: f64,
    /// Number of identical segments
    #[serde(rename = "Vks", default = "one")]
    pub vks: f64,
}

impl SaftGammaMieRecord {
    pub fn new(epsilon: f64, sigma: f64, lr: f64, la: f64, sk: f64, vks: f64) -> Self {
        Self {
            epsilon,
            sigma,
            lr,
            la,
            sk,
            vks,
        }
    }
}

impl fmt::Display for SaftGammaMieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaftGammaMieRecord(epsilon={}", self.epsilon)?;
        write!(f, ", sigma={}", self.sigma)?;
        write!(f, ", l_r={}", self.lr)?;
        write!(f, ", l_a={}", self.la)?;
        write!(f, ", Sk={}", self.sk)?;
        write!(f, ", Vks={})", self.vks)
    }
}

/// Unlike bead interactions that replace the combining rules.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SaftGammaMieBinaryRecord {
    /// Cross dispersion energy in units of Kelvin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    /// Cross repulsive exponent
    #[serde(rename = "l_r", skip_serializing_if = "Option::is_none")]
    pub lr: Option<f64>,
    /// Cross attractive exponent
    #[serde(rename = "l_a", skip_serializing_if = "Option::is_none")]
    pub la: Option<f64>,
}

/// Parameter set required for the SAFT-γ Mie equation of state.
///
/// Bead properties are stored per bead type, lengths in Å.
#[derive(Clone)]
pub struct SaftGammaMieParameters {
    pub segments: BeadSegments,
    /// Geometry coefficients $\nu_{ik}v_kS_k$ of every segment
    pub m: Array1<f64>,
    pub sigma: Array1<f64>,
    pub epsilon: Array1<f64>,
    pub lr: Array1<f64>,
    pub la: Array1<f64>,
    pub sk: Array1<f64>,
    pub vks: Array1<f64>,
    pub sigma_kl: Array2<f64>,
    pub epsilon_kl: Array2<f64>,
    pub lr_kl: Array2<f64>,
    pub la_kl: Array2<f64>,
    pub c_kl: Array2<f64>,
    pub association: AssociationParameters,
    pub components: Vec<ComponentRecord>,
    pub bead_records: Vec<BeadRecord<SaftGammaMieRecord>>,
    pub binary_records: Vec<BinaryBeadRecord<SaftGammaMieBinaryRecord>>,
}

/// Prefactor of the Mie potential.
pub(crate) fn mie_prefactor(lr: f64, la: f64) -> f64 {
    lr / (lr - la) * (lr / la).powf(la / (lr - la))
}

impl GroupContributionParameter for SaftGammaMieParameters {
    type Bead = SaftGammaMieRecord;
    type Binary = SaftGammaMieBinaryRecord;

    fn from_records(
        components: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<Self::Bead>>,
        binary_records: Vec<BinaryBeadRecord<Self::Binary>>,
    ) -> Result<Self, ParameterError> {
        let segments = BeadSegments::new(&components, &bead_records)?;
        let n = bead_records.len();

        let mut sigma = Array1::zeros(n);
        let mut epsilon = Array1::zeros(n);
        let mut lr = Array1::zeros(n);
        let mut la = Array1::zeros(n);
        let mut sk = Array1::zeros(n);
        let mut vks = Array1::zeros(n);
        for (k, record) in bead_records.iter().enumerate() {
            let r = &record.model_record;
            if r.lr <= 3.0 || r.la <= 3.0 || r.lr <= r.la {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "bead {}: Mie exponents l_r={} and l_a={} are invalid",
                    record.identifier, r.lr, r.la
                )));
            }
            sigma[k] = r.sigma * 1e10;
            epsilon[k] = r.epsilon;
            lr[k] = r.lr;
            la[k] = r.la;
            sk[k] = r.sk;
            vks[k] = r.vks;
        }

        let mut sigma_kl = Array2::zeros((n, n));
        let mut epsilon_kl = Array2::zeros((n, n));
        let mut lr_kl = Array2::zeros((n, n));
        let mut la_kl = Array2::zeros((n, n));
        let mut c_kl = Array2::zeros((n, n));
        for k in 0..n {
            for l in 0..n {
                sigma_kl[[k, l]] = 0.5 * (sigma[k] + sigma[l]);
                epsilon_kl[[k, l]] = (sigma[k].powi(3) * sigma[l].powi(3)).sqrt()
                    / sigma_kl[[k, l]].powi(3)
                    * (epsilon[k] * epsilon[l]).sqrt();
                lr_kl[[k, l]] = ((lr[k] - 3.0) * (lr[l] - 3.0)).sqrt() + 3.0;
                la_kl[[k, l]] = ((la[k] - 3.0) * (la[l] - 3.0)).sqrt() + 3.0;
            }
        }

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
            if let Some(x) = model.lr {
                lr_kl[[k, l]] = x;
                lr_kl[[l, k]] = x;
            }
            if let Some(x) = model.la {
                la_kl[[k, l]] = x;
                la_kl[[l, k]] = x;
            }
        }
        for k in 0..n {
            for l in 0..n {
                c_kl[[k, l]] = mie_prefactor(lr_kl[[k, l]], la_kl[[k, l]]);
            }
        }

        let m = segments.geometry_coefficients(&vks, &sk);
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
            lr,
            la,
            sk,
            vks,
            sigma_kl,
            epsilon_kl,
            lr_kl,
            la_kl,
            c_kl,
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
        &[BeadRecord<SaftGammaMieRecord>],
        &[BinaryBeadRecord<SaftGammaMieBinaryRecord>],
    ) {
        (&self.components, &self.bead_records, &self.binary_records)
    }
}

impl SaftGammaMieParameters {
    /// Energy of the Mie potential and its first derivative.
    pub fn mie_potential_kl<D: DualNum<f64> + Copy>(&self, k: usize, l: usize, r: D) -> [D; 2] {
        let lr = self.lr_kl[[k, l]];
        let la = self.la_kl[[k, l]];
        let s = self.sigma_kl[[k, l]];
        let c_eps = self.c_kl[[k, l]] * self.epsilon_kl[[k, l]];

        let u = (r.powf(lr).recip() * s.powf(lr) - r.powf(la).recip() * s.powf(la)) * c_eps;
        let u_r = (-r.powf(lr + 1.0).recip() * lr * s.powf(lr)
            + r.powf(la + 1.0).recip() * la * s.powf(la))
            * c_eps;
        [u, u_r]
    }

    /// Find the lower limit for integration of HS diameter
    pub fn zero_integrand<D: DualNum<f64> + Copy>(
        &self,
        k: usize,
        l: usize,
        inverse_temperature: D,
    ) -> D {
        let mut r = D::one() * self.sigma_kl[[k, l]] * 0.7;
        let mut f = D::zero();
        for _ in 1..20 {
            let [u, u_r] = self.mie_potential_kl(k, l, r);
            f = inverse_temperature * u + f64::EPSILON.ln();
            if f.re().abs() < 1.0e-12 {
                break;
            }
            let dfdr = inverse_temperature * u_r;
            let mut dr = -(f / dfdr);
            if dr.re().abs() > 0.5 {
                dr *= 0.5 / dr.re().abs();
            }
            r += dr;
        }
        if f.re().abs() > 1.0e-12 {
            warn!(
                "lower integration limit of the diameter of bead {} not converged: {}",
                self.bead_records[k].identifier,
                f.re().abs()
            );
        }
        r
    }

    /// Barker-Henderson diameter from 21-point Gauss-Kronrod quadrature.
    #[inline]
    pub fn hs_diameter_kl<D: DualNum<f64> + Copy>(
        &self,
        k: usize,
        l: usize,
        inverse_temperature: D,
    ) -> D {
        let r0 = self.zero_integrand(k, l, inverse_temperature);
        let sigma = self.sigma_kl[[k, l]];
        let mut d_hs = r0;
        let width = (-r0 + sigma) * 0.5;
        for (x, w) in X_K21.iter().zip(W_K21.iter()) {
            let r = width * *x + width + r0;
            let [u, _] = self.mie_potential_kl(k, l, r);
            let f_u = -(-u * inverse_temperature).exp() + 1.0;
            d_hs += width * f_u * *w;
        }
        d_hs
    }

    /// Temperature dependent diameter of every bead type.
    pub fn bead_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        Array1::from_shape_fn(self.sigma.len(), |k| {
            self.hs_diameter_kl(k, k, temperature.recip())
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("|bead|molarweight|$\\sigma$|$\\varepsilon$|$\\lambda_r$|$\\lambda_a$|$S_k$|$v_k^*$|\n");
        output.push_str("|-|-|-|-|-|-|-|-|\n");
        for (k, r) in self.bead_records.iter().enumerate() {
            output.push_str(&format!(
                "|{}|{}|{}|{}|{}|{}|{}|{}|\n",
                r.identifier,
                r.molarweight,
                self.sigma[k],
                self.epsilon[k],
                self.lr[k],
                self.la[k],
                self.sk[k],
                self.vks[k]
            ));
        }
        output
    }
}

impl HardSphereProperties for SaftGammaMieParameters {
    fn component_index(&self) -> &Array1<usize> {
        &self.segments.component_index
    }

    fn geometry_coefficients(&self) -> &Array1<f64> {
        &self.m
    }

    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        let d = self.bead_diameter(temperature);
        self.segments.bead_index.mapv(|k| d[k])
    }
}

impl MolarWeight for SaftGammaMieParameters {
    fn molar_weight(&self) -> Array1<f64> {
        self.segments.molarweight.clone()
    }
}

impl fmt::Display for SaftGammaMieParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaftGammaMieParameters(")?;
        write!(f, "\n\tcomponents=[")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c.name)?;
        }
        write!(f, "]\n\tcomponent_index={}", self.segments.component_index)?;
        write!(f, "\n\tbead_index={}", self.segments.bead_index)?;
        write!(f, "\n\tm={}", self.m)?;
        write!(f, "\n\tsigma={}", self.sigma)?;
        write!(f, "\n\tepsilon={}", self.epsilon)?;
        write!(f, "\n\tlr={}", self.lr)?;
        write!(f, "\n\tla={}", self.la)?;
        if !self.association.is_empty() {
            write!(f, "\n\tassociation={}", self.association)?;
        }
        write!(f, "\n)")
    }
}

#[cfg(test)]
pub mod utils {
    use super::*;
    use despasito_core::parameter::{BeadLibrary, CrossLibrary};
    use ndarray::arr2;
    use serde_json::json;

    pub fn sitenames() -> Vec<String> {
        vec!["H".to_string(), "e1".to_string(), "a1".to_string()]
    }

    pub fn co2_h2o_beads() -> BeadLibrary<SaftGammaMieRecord> {
        let value = json!({
            "CO2": {
                "epsilon": 207.89, "l_a": 5.055, "l_r": 26.408, "sigma": 3.05e-10,
                "Sk": 0.8468, "Vks": 2, "mass": 0.04401, "NkH": 1, "Nka1": 1
            },
            "H2O": {
                "epsilon": 266.68, "l_a": 6.0, "l_r": 17.02, "sigma": 3.0063e-10,
                "Sk": 1.0, "Vks": 1, "mass": 0.018015, "NkH": 2, "Nke1": 2,
                "epsilonHe1": 1985.4, "KHe1": 1.0169e-28
            }
        });
        BeadLibrary::from_json_value(value, &sitenames()).unwrap()
    }

    pub fn co2_h2o_cross() -> CrossLibrary<SaftGammaMieBinaryRecord> {
        let value = json!({
            "CO2": {"H2O": {"epsilon": 226.38, "epsilonHe1": 2200.0, "KHe1": 9.1419e-29}}
        });
        CrossLibrary::from_json_value(value, &sitenames()).unwrap()
    }

    pub fn co2_h2o() -> SaftGammaMieParameters {
        let beads = vec!["CO2".to_string(), "H2O".to_string()];
        let nui = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
        SaftGammaMieParameters::from_libraries(
            &beads,
            &nui,
            &co2_h2o_beads(),
            Some(&co2_h2o_cross()),
        )
        .unwrap()
    }

    pub fn water() -> SaftGammaMieParameters {
        co2_h2o().subset(&[1]).unwrap()
    }

    /// Single ethane bead with the parameters of Lafitte et al. (2013).
    pub fn ethane() -> SaftGammaMieParameters {
        let record = BeadRecord::new(
            "C2H6".to_string(),
            0.03007,
            SaftGammaMieRecord::new(206.12, 3.7257e-10, 12.4, 6.0, 1.4373, 1.0),
        );
        let component = ComponentRecord::new(
            "C2H6".to_string(),
            [("C2H6".to_string(), 1.0)].into_iter().collect(),
        );
        SaftGammaMieParameters::from_records(vec![component], vec![record], vec![]).unwrap()
    }
}
