use crate::saft_gamma_mie::{SaftGammaMie, SaftGammaMieParameters};
use crate::saft_gamma_sw::{SaftGammaSw, SaftGammaSwParameters};
use despasito_core::parameter::{
    BeadLibrary, ComponentRecord, CrossLibrary, GroupContributionParameter, ParameterError,
};
use despasito_core::EosResult;
use despasito_derive::{Components, Residual};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Available group-contribution equations of state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EosType {
    #[serde(rename = "saft.gamma_mie")]
    SaftGammaMie,
    #[serde(rename = "saft.gamma_sw")]
    SaftGammaSw,
}

impl FromStr for EosType {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saft.gamma_mie" => Ok(Self::SaftGammaMie),
            "saft.gamma_sw" => Ok(Self::SaftGammaSw),
            _ => Err(ParameterError::IncompatibleParameters(format!(
                "unknown equation of state '{s}', expected 'saft.gamma_mie' or 'saft.gamma_sw'"
            ))),
        }
    }
}

impl fmt::Display for EosType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaftGammaMie => write!(f, "saft.gamma_mie"),
            Self::SaftGammaSw => write!(f, "saft.gamma_sw"),
        }
    }
}

/// Collection of the implemented residual Helmholtz energy models.
///
/// Used by the calculation dispatcher, which is generic over the model
/// only through this enum.
#[derive(Components, Residual)]
pub enum ResidualModel {
    SaftGammaMie(SaftGammaMie),
    SaftGammaSw(SaftGammaSw),
}

fn parameters<P: GroupContributionParameter>(
    beads: &[String],
    nui: &Array2<f64>,
    bead_library: Value,
    cross_library: Option<Value>,
    sitenames: &[String],
) -> Result<P, ParameterError> {
    let bead_library = BeadLibrary::from_json_value(bead_library, sitenames)?;
    let cross_library = cross_library
        .map(|c| CrossLibrary::from_json_value(c, sitenames))
        .transpose()?;
    P::from_libraries(beads, nui, &bead_library, cross_library.as_ref())
}

impl ResidualModel {
    /// Model of the given type for the components defined by the rows of `nui`.
    pub fn new(
        eos_type: EosType,
        beads: &[String],
        nui: &Array2<f64>,
        bead_library: Value,
        cross_library: Option<Value>,
        sitenames: &[String],
    ) -> EosResult<Self> {
        Ok(match eos_type {
            EosType::SaftGammaMie => {
                let p: SaftGammaMieParameters =
                    parameters(beads, nui, bead_library, cross_library, sitenames)?;
                Self::SaftGammaMie(SaftGammaMie::new(Arc::new(p)))
            }
            EosType::SaftGammaSw => {
                let p: SaftGammaSwParameters =
                    parameters(beads, nui, bead_library, cross_library, sitenames)?;
                Self::SaftGammaSw(SaftGammaSw::new(Arc::new(p)))
            }
        })
    }

    pub fn eos_type(&self) -> EosType {
        match self {
            Self::SaftGammaMie(_) => EosType::SaftGammaMie,
            Self::SaftGammaSw(_) => EosType::SaftGammaSw,
        }
    }

    /// Definitions of the components of the model.
    pub fn component_records(&self) -> &[ComponentRecord] {
        match self {
            Self::SaftGammaMie(eos) => &eos.parameters().components,
            Self::SaftGammaSw(eos) => &eos.parameters().components,
        }
    }
}

impl fmt::Display for ResidualModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaftGammaMie(eos) => write!(f, "{eos}"),
            Self::SaftGammaSw(eos) => write!(f, "{eos}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use despasito_core::{Components, Contributions, MolarWeight, State};
    use ndarray::arr2;
    use serde_json::json;

    fn sitenames() -> Vec<String> {
        vec!["H".to_string(), "e1".to_string()]
    }

    #[test]
    fn parse_eos_type() {
        assert_eq!("saft.gamma_mie".parse::<EosType>().unwrap(), EosType::SaftGammaMie);
        assert_eq!("saft.gamma_sw".parse::<EosType>().unwrap(), EosType::SaftGammaSw);
        assert!("saft.gamma_vr".parse::<EosType>().is_err());
        let t: EosType = serde_json::from_str("\"saft.gamma_sw\"").unwrap();
        assert_eq!(t.to_string(), "saft.gamma_sw");
    }

    #[test]
    fn square_well_model() -> EosResult<()> {
        let library = json!({
            "CH3": {"epsilon": 256.77, "sigma": 3.737e-10, "lambda": 1.4, "Sk": 0.667, "mass": 0.015035}
        });
        let beads = vec!["CH3".to_string()];
        let eos = ResidualModel::new(
            EosType::SaftGammaSw,
            &beads,
            &arr2(&[[2.0]]),
            library,
            None,
            &sitenames(),
        )?;
        assert_eq!(eos.eos_type(), EosType::SaftGammaSw);
        assert_eq!(eos.components(), 1);
        assert_relative_eq!(eos.molar_weight()[0], 0.03007, max_relative = 1e-12);
        assert_eq!(eos.to_string(), "SAFT-γ SW");
        assert_eq!(eos.subset(&[0])?.components(), 1);
        assert!(eos.subset(&[1]).is_err());

        let eos = Arc::new(eos);
        let state = State::new_density(&eos, 300.0, 1e-6, &ndarray::arr1(&[1.0]))?;
        assert_relative_eq!(state.compressibility(Contributions::Total), 1.0, epsilon = 1e-7);
        Ok(())
    }

    #[test]
    fn missing_bead() {
        let library = json!({
            "CH3": {"epsilon": 256.77, "sigma": 3.737e-10, "lambda": 1.4, "mass": 0.015035}
        });
        let beads = vec!["CH3".to_string(), "CH2".to_string()];
        let eos = ResidualModel::new(
            EosType::SaftGammaSw,
            &beads,
            &arr2(&[[2.0, 1.0]]),
            library,
            None,
            &sitenames(),
        );
        assert!(eos.is_err());
    }
}
