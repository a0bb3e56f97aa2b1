use despasito_core::{BubbleDewResult, FlashResult, PhaseFlag, SaturationProperties};
use ndarray::Array1;
use serde::Serialize;

fn nan_vec(n: usize) -> Vec<f64> {
    vec![f64::NAN; n]
}

fn to_vec(x: &Array1<f64>) -> Vec<f64> {
    x.to_vec()
}

/// Results of a calculation, serialized with the keys of the output file.
///
/// Failed points hold NaN values and `null` phase flags.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ThermoOutput {
    PhaseEquilibrium(PhaseEquilibriumOutput),
    Saturation(SaturationOutput),
    Liquid(LiquidOutput),
    Vapor(VaporOutput),
    Solubility(SolubilityOutput),
    Flash(FlashOutput),
}

/// Bubble or dew point pressures with the composition of the incipient phase.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseEquilibriumOutput {
    /// Pressure in Pa
    #[serde(rename = "P")]
    pub pressure: Vec<f64>,
    /// Vapor mole fractions of bubble points
    #[serde(rename = "yi", skip_serializing_if = "Option::is_none")]
    pub vapor_molefracs: Option<Vec<Vec<f64>>>,
    /// Liquid mole fractions of dew points
    #[serde(rename = "xi", skip_serializing_if = "Option::is_none")]
    pub liquid_molefracs: Option<Vec<Vec<f64>>>,
    #[serde(rename = "flagl")]
    pub flag_liquid: Vec<Option<PhaseFlag>>,
    #[serde(rename = "flagv")]
    pub flag_vapor: Vec<Option<PhaseFlag>>,
    /// Residual of the equilibrium condition
    #[serde(rename = "obj")]
    pub objective: Vec<f64>,
}

impl PhaseEquilibriumOutput {
    pub(super) fn new(
        points: Vec<Option<BubbleDewResult>>,
        components: usize,
        bubble: bool,
    ) -> Self {
        let mut pressure = Vec::with_capacity(points.len());
        let mut molefracs = Vec::with_capacity(points.len());
        let mut flag_liquid = Vec::with_capacity(points.len());
        let mut flag_vapor = Vec::with_capacity(points.len());
        let mut objective = Vec::with_capacity(points.len());
        for point in points {
            match point {
                Some(r) => {
                    pressure.push(r.pressure);
                    molefracs.push(to_vec(&r.molefracs));
                    flag_liquid.push(Some(r.flag_liquid));
                    flag_vapor.push(Some(r.flag_vapor));
                    objective.push(r.objective);
                }
                None => {
                    pressure.push(f64::NAN);
                    molefracs.push(nan_vec(components));
                    flag_liquid.push(None);
                    flag_vapor.push(None);
                    objective.push(f64::NAN);
                }
            }
        }
        let (vapor_molefracs, liquid_molefracs) = if bubble {
            (Some(molefracs), None)
        } else {
            (None, Some(molefracs))
        };
        Self {
            pressure,
            vapor_molefracs,
            liquid_molefracs,
            flag_liquid,
            flag_vapor,
            objective,
        }
    }
}

/// Saturation pressures and coexisting densities of pure components.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SaturationOutput {
    /// Saturation pressure in Pa
    #[serde(rename = "Psat")]
    pub pressure: Vec<f64>,
    /// Liquid density in mol/m³
    #[serde(rename = "rhol")]
    pub liquid_density: Vec<f64>,
    /// Vapor density in mol/m³
    #[serde(rename = "rhov")]
    pub vapor_density: Vec<f64>,
}

impl SaturationOutput {
    pub(super) fn new(points: Vec<Option<SaturationProperties>>) -> Self {
        let get = |f: fn(&SaturationProperties) -> f64| -> Vec<f64> {
            points
                .iter()
                .map(|p| p.as_ref().map_or(f64::NAN, f))
                .collect()
        };
        Self {
            pressure: get(|p| p.pressure),
            liquid_density: get(|p| p.liquid_density),
            vapor_density: get(|p| p.vapor_density),
        }
    }
}

type PhaseProperties = (Array1<f64>, f64, PhaseFlag);

fn split_phase(
    points: Vec<Option<PhaseProperties>>,
    components: usize,
) -> (Vec<f64>, Vec<Vec<f64>>, Vec<Option<PhaseFlag>>) {
    let mut density = Vec::with_capacity(points.len());
    let mut phi = Vec::with_capacity(points.len());
    let mut flag = Vec::with_capacity(points.len());
    for point in points {
        match point {
            Some((p, rho, f)) => {
                density.push(rho);
                phi.push(to_vec(&p));
                flag.push(Some(f));
            }
            None => {
                density.push(f64::NAN);
                phi.push(nan_vec(components));
                flag.push(None);
            }
        }
    }
    (density, phi, flag)
}

/// Liquid densities and fugacity coefficients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LiquidOutput {
    /// Density in mol/m³
    #[serde(rename = "rhol")]
    pub density: Vec<f64>,
    #[serde(rename = "phil")]
    pub fugacity_coefficients: Vec<Vec<f64>>,
    #[serde(rename = "flagl")]
    pub flag: Vec<Option<PhaseFlag>>,
}

impl LiquidOutput {
    pub(super) fn new(points: Vec<Option<PhaseProperties>>, components: usize) -> Self {
        let (density, fugacity_coefficients, flag) = split_phase(points, components);
        Self {
            density,
            fugacity_coefficients,
            flag,
        }
    }
}

/// Vapor densities and fugacity coefficients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VaporOutput {
    /// Density in mol/m³
    #[serde(rename = "rhov")]
    pub density: Vec<f64>,
    #[serde(rename = "phiv")]
    pub fugacity_coefficients: Vec<Vec<f64>>,
    #[serde(rename = "flagv")]
    pub flag: Vec<Option<PhaseFlag>>,
}

impl VaporOutput {
    pub(super) fn new(points: Vec<Option<PhaseProperties>>, components: usize) -> Self {
        let (density, fugacity_coefficients, flag) = split_phase(points, components);
        Self {
            density,
            fugacity_coefficients,
            flag,
        }
    }
}

/// Hildebrand solubility parameters of liquids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolubilityOutput {
    /// Liquid density in mol/m³
    #[serde(rename = "rhol")]
    pub density: Vec<f64>,
    /// Solubility parameter in Pa^½
    #[serde(rename = "delta")]
    pub solubility_parameter: Vec<f64>,
}

impl SolubilityOutput {
    pub(super) fn new(points: Vec<Option<(f64, f64)>>) -> Self {
        let (density, solubility_parameter) = points
            .into_iter()
            .map(|p| p.unwrap_or((f64::NAN, f64::NAN)))
            .unzip();
        Self {
            density,
            solubility_parameter,
        }
    }
}

/// Coexisting phases of binary flash calculations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlashOutput {
    #[serde(rename = "xi")]
    pub liquid_molefracs: Vec<Vec<f64>>,
    #[serde(rename = "flagl")]
    pub flag_liquid: Vec<Option<PhaseFlag>>,
    #[serde(rename = "yi")]
    pub vapor_molefracs: Vec<Vec<f64>>,
    #[serde(rename = "flagv")]
    pub flag_vapor: Vec<Option<PhaseFlag>>,
    /// Remaining change of the equilibrium ratios
    #[serde(rename = "obj")]
    pub error: Vec<f64>,
}

impl FlashOutput {
    pub(super) fn new(points: Vec<Option<FlashResult>>, components: usize) -> Self {
        let mut out = Self {
            liquid_molefracs: Vec::with_capacity(points.len()),
            flag_liquid: Vec::with_capacity(points.len()),
            vapor_molefracs: Vec::with_capacity(points.len()),
            flag_vapor: Vec::with_capacity(points.len()),
            error: Vec::with_capacity(points.len()),
        };
        for point in points {
            match point {
                Some(r) => {
                    out.liquid_molefracs.push(to_vec(&r.liquid_molefracs));
                    out.flag_liquid.push(Some(r.flag_liquid));
                    out.vapor_molefracs.push(to_vec(&r.vapor_molefracs));
                    out.flag_vapor.push(Some(r.flag_vapor));
                    out.error.push(r.error);
                }
                None => {
                    out.liquid_molefracs.push(nan_vec(components));
                    out.flag_liquid.push(None);
                    out.vapor_molefracs.push(nan_vec(components));
                    out.flag_vapor.push(None);
                    out.error.push(f64::NAN);
                }
            }
        }
        out
    }
}
