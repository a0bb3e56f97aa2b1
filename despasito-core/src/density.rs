//! Pressure–density isotherms, density roots and phase identification.
//!
//! An isotherm is sampled on a geometric density grid between a small
//! fraction of the maximum density and the maximum density. Roots of
//! $p(v)-p^\mathrm{set}$ and extrema of $p(v)$ are located on the grid and
//! refined with Brent's method on the exact pressure of the equation of state.
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::solver::brent;
use crate::state::{Contributions, State};
use crate::units::RGAS;
use ndarray::{Array1, Zip};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const ROOT_TOLERANCE: f64 = 1e-10;
const ROOT_MAX_ITER: usize = 200;
/// Largest density searched beyond the grid, relative to the maximum density.
const DENSE_LIQUID_LIMIT: f64 = 1.5;
/// Number of volume doublings used to find a vapor root beyond the grid.
const VAPOR_EXPANSIONS: usize = 60;

/// Options of the pressure–density scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityScanOptions {
    /// Smallest density of the grid relative to the maximum density.
    #[serde(alias = "minrhofrac")]
    pub min_rho_frac: f64,
    /// Number of grid points.
    pub points: usize,
    /// Maximum density in mol/m³. Defaults to the packing limit of the model.
    #[serde(alias = "maxrho")]
    pub max_rho: Option<f64>,
}

impl Default for DensityScanOptions {
    fn default() -> Self {
        Self {
            min_rho_frac: 1.0 / 500000.0,
            points: 600,
            max_rho: None,
        }
    }
}

/// Type of fluid found at a given pressure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseFlag {
    Vapor = 0,
    Liquid = 1,
    Supercritical = 2,
    Unstable = 3,
    IdealGas = 4,
}

impl PhaseFlag {
    /// Vapor, liquid or supercritical fluid.
    pub fn is_fluid(&self) -> bool {
        matches!(self, Self::Vapor | Self::Liquid | Self::Supercritical)
    }
}

impl fmt::Display for PhaseFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vapor => "vapor",
            Self::Liquid => "liquid",
            Self::Supercritical => "supercritical",
            Self::Unstable => "unstable",
            Self::IdealGas => "ideal gas",
        };
        write!(f, "{s}")
    }
}

impl TryFrom<u8> for PhaseFlag {
    type Error = EosError;

    fn try_from(value: u8) -> EosResult<Self> {
        match value {
            0 => Ok(Self::Vapor),
            1 => Ok(Self::Liquid),
            2 => Ok(Self::Supercritical),
            3 => Ok(Self::Unstable),
            4 => Ok(Self::IdealGas),
            _ => Err(EosError::Error(format!("unknown phase flag {value}"))),
        }
    }
}

impl Serialize for PhaseFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for PhaseFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Local extremum of an isotherm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremum {
    /// Molar volume in m³/mol
    pub volume: f64,
    /// Pressure in Pa
    pub pressure: f64,
}

/// Pressure isotherm sampled at fixed composition.
///
/// Volumes are stored in ascending order.
pub struct Isotherm<E> {
    eos: Arc<E>,
    /// Temperature in K
    pub temperature: f64,
    /// Composition
    pub molefracs: Array1<f64>,
    /// Molar volumes in m³/mol
    pub volume: Array1<f64>,
    /// Pressures in Pa
    pub pressure: Array1<f64>,
    max_density: f64,
}

/// Pressure of a state at given molar density.
pub fn pressure_at_density<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    density: f64,
    molefracs: &Array1<f64>,
) -> EosResult<f64> {
    Ok(State::new_density(eos, temperature, density, molefracs)?.pressure(Contributions::Total))
}

impl<E: Residual> Isotherm<E> {
    /// Sample the pressure isotherm of the given mixture.
    pub fn new(
        eos: &Arc<E>,
        temperature: f64,
        molefracs: &Array1<f64>,
        options: &DensityScanOptions,
    ) -> EosResult<Self> {
        let molefracs = molefracs / molefracs.sum();
        let max_density = match options.max_rho {
            Some(rho) => rho,
            None => eos.max_density(Some(&molefracs))?,
        };
        let min_density = max_density * options.min_rho_frac;
        if !(max_density > min_density && min_density > 0.0) || options.points < 4 {
            return Err(EosError::Error(format!(
                "Density range ({min_density}, {max_density}) with {} points is empty. Check the maximum density of the model.",
                options.points
            )));
        }

        // geometric grid in volume, ascending
        let volume = Array1::geomspace(1.0 / max_density, 1.0 / min_density, options.points)
            .ok_or_else(|| EosError::Error(String::from("invalid density grid")))?;
        let pressure = volume
            .iter()
            .map(|&v| pressure_at_density(eos, temperature, 1.0 / v, &molefracs))
            .collect::<EosResult<Array1<f64>>>()?;

        Ok(Self {
            eos: eos.clone(),
            temperature,
            molefracs,
            volume,
            pressure,
            max_density,
        })
    }

    fn pressure_at_volume(&self, volume: f64) -> EosResult<f64> {
        pressure_at_density(&self.eos, self.temperature, 1.0 / volume, &self.molefracs)
    }

    fn dp_dv_at_volume(&self, volume: f64) -> EosResult<f64> {
        let state = State::new_density(&self.eos, self.temperature, 1.0 / volume, &self.molefracs)?;
        // molar quantity: the state contains one mole
        Ok(state.dp_dv(Contributions::Total))
    }

    /// Maximum density of the scan in mol/m³.
    pub fn max_density(&self) -> f64 {
        self.max_density
    }

    /// True if the equation of state returned an invalid pressure anywhere on the grid.
    pub fn has_invalid_pressure(&self) -> bool {
        self.pressure.iter().any(|p| !p.is_finite())
    }

    /// Local extrema (at most two) of the isotherm in order of ascending volume.
    ///
    /// For a subcritical isotherm the first one is the liquid spinodal (a
    /// minimum) and the second one the vapor spinodal (a maximum).
    pub fn extrema(&self) -> Vec<Extremum> {
        let slope: Vec<f64> = self
            .pressure
            .windows(2)
            .into_iter()
            .map(|w| w[1] - w[0])
            .collect();
        let mut extrema = Vec::with_capacity(2);
        for i in 1..slope.len() {
            let (s0, s1) = (slope[i - 1], slope[i]);
            if !(s0.is_finite() && s1.is_finite()) || s0 == 0.0 || s0.signum() == s1.signum() {
                continue;
            }
            let (a, b) = (self.volume[i - 1], self.volume[i + 1]);
            let volume = brent(|v| self.dp_dv_at_volume(v), a, b, ROOT_TOLERANCE, ROOT_MAX_ITER)
                .unwrap_or(self.volume[i]);
            let pressure = self.pressure_at_volume(volume).unwrap_or(self.pressure[i]);
            extrema.push(Extremum { volume, pressure });
            if extrema.len() == 2 {
                break;
            }
        }
        extrema
    }

    /// Molar volumes at which the isotherm crosses the given pressure,
    /// in order of ascending volume.
    pub fn roots(&self, pressure: f64) -> Vec<f64> {
        let mut roots = Vec::new();
        for i in 1..self.volume.len() {
            let (f0, f1) = (self.pressure[i - 1] - pressure, self.pressure[i] - pressure);
            if !(f0.is_finite() && f1.is_finite()) {
                continue;
            }
            if f0 == 0.0 {
                roots.push(self.volume[i - 1]);
                continue;
            }
            if f0.signum() == f1.signum() || f1 == 0.0 {
                continue;
            }
            let (v0, v1) = (self.volume[i - 1], self.volume[i]);
            let interpolated = v0 - f0 * (v1 - v0) / (f1 - f0);
            let root = brent(
                |v| Ok(self.pressure_at_volume(v)? - pressure),
                v0,
                v1,
                ROOT_TOLERANCE,
                ROOT_MAX_ITER,
            )
            .unwrap_or(interpolated);
            roots.push(root);
        }
        if let Some(&last) = self.pressure.iter().last() {
            if last == pressure {
                roots.push(self.volume[self.volume.len() - 1]);
            }
        }
        roots
    }

    /// Vapor root at a volume larger than the largest volume of the grid.
    pub(crate) fn vapor_root_beyond_grid(&self, pressure: f64) -> Option<f64> {
        let mut v0 = self.volume[self.volume.len() - 1];
        let mut f0 = self.pressure[self.pressure.len() - 1] - pressure;
        if f0 <= 0.0 || !f0.is_finite() {
            return None;
        }
        for _ in 0..VAPOR_EXPANSIONS {
            let v1 = 2.0 * v0;
            let f1 = self.pressure_at_volume(v1).ok()? - pressure;
            if !f1.is_finite() {
                return None;
            }
            if f1 <= 0.0 {
                return brent(
                    |v| Ok(self.pressure_at_volume(v)? - pressure),
                    v0,
                    v1,
                    ROOT_TOLERANCE,
                    ROOT_MAX_ITER,
                )
                .ok();
            }
            v0 = v1;
            f0 = f1;
        }
        debug!("no vapor root found beyond the grid, last residual {f0:e} Pa");
        None
    }

    /// Liquid root at a density larger than the maximum density of the grid.
    fn liquid_root_beyond_grid(&self, pressure: f64) -> Option<f64> {
        let mut rho0 = self.max_density;
        let f = |rho: f64| -> EosResult<f64> {
            Ok(pressure_at_density(&self.eos, self.temperature, rho, &self.molefracs)? - pressure)
        };
        let mut f0 = f(rho0).ok()?;
        if f0 >= 0.0 || !f0.is_finite() {
            return None;
        }
        while rho0 < DENSE_LIQUID_LIMIT * self.max_density {
            let rho1 = rho0 * 1.02;
            let f1 = f(rho1).ok()?;
            if !f1.is_finite() {
                return None;
            }
            if f1 >= 0.0 {
                return brent(f, rho0, rho1, ROOT_TOLERANCE, ROOT_MAX_ITER).ok();
            }
            rho0 = rho1;
            f0 = f1;
        }
        debug!("no liquid root found beyond the grid, last residual {f0:e} Pa");
        None
    }

    fn ideal_gas_density(&self, pressure: f64) -> f64 {
        pressure / (RGAS * self.temperature)
    }

    /// Density in mol/m³ and type of the vapor phase at the given pressure.
    pub fn vapor_density(&self, pressure: f64) -> (f64, PhaseFlag) {
        let (t, x) = (self.temperature, &self.molefracs);
        if self.has_invalid_pressure() {
            warn!("T = {t} K, x = {x}: no fluid at P = {pressure} Pa (invalid pressures on the isotherm)");
            return (f64::NAN, PhaseFlag::Unstable);
        }
        let roots = self.roots(pressure);
        debug!("vapor density: P = {pressure} Pa, volume roots {roots:?} m³/mol");

        let (density, flag) = match roots.len() {
            0 => self.no_root(pressure),
            1 => self.single_root(pressure, roots[0]),
            2 if pressure < 0.0 => {
                debug!("T = {t} K, x = {x}: liquid under tension at P = {pressure} Pa");
                (1.0 / roots[0], PhaseFlag::Liquid)
            }
            2 => match self.vapor_root_beyond_grid(pressure) {
                Some(v) => (1.0 / v, PhaseFlag::Vapor),
                None => (self.ideal_gas_density(pressure), PhaseFlag::IdealGas),
            },
            n => (1.0 / roots[n - 1], PhaseFlag::Vapor),
        };
        debug!("vapor density: {density} mol/m³, flag {flag}");
        (density, flag)
    }

    /// Density in mol/m³ and type of the liquid phase at the given pressure.
    pub fn liquid_density(&self, pressure: f64) -> (f64, PhaseFlag) {
        let (t, x) = (self.temperature, &self.molefracs);
        if self.has_invalid_pressure() {
            warn!("T = {t} K, x = {x}: no fluid at P = {pressure} Pa (invalid pressures on the isotherm)");
            return (f64::NAN, PhaseFlag::Unstable);
        }
        let roots = self.roots(pressure);
        debug!("liquid density: P = {pressure} Pa, volume roots {roots:?} m³/mol");

        let (density, flag) = match roots.len() {
            0 => self.no_root(pressure),
            1 => self.single_root(pressure, roots[0]),
            _ => (1.0 / roots[0], PhaseFlag::Liquid),
        };
        debug!("liquid density: {density} mol/m³, flag {flag}");
        (density, flag)
    }

    fn single_root(&self, pressure: f64, root: f64) -> (f64, PhaseFlag) {
        let extrema = self.extrema();
        if extrema.len() == 1 {
            warn!(
                "single extremum at {} mol/m³, check the model parameters",
                1.0 / extrema[0].volume
            );
        }
        let flag = match extrema.last() {
            None => PhaseFlag::Supercritical,
            Some(e) if pressure > e.pressure => PhaseFlag::Liquid,
            Some(_) => PhaseFlag::Vapor,
        };
        (1.0 / root, flag)
    }

    fn no_root(&self, pressure: f64) -> (f64, PhaseFlag) {
        let below = self.pressure.iter().all(|&p| p > pressure);
        let above = self.pressure.iter().all(|&p| p < pressure);
        if below {
            // the pressure is lower than anywhere on the grid
            match self.vapor_root_beyond_grid(pressure) {
                Some(v) => (1.0 / v, PhaseFlag::Vapor),
                None => (self.ideal_gas_density(pressure), PhaseFlag::IdealGas),
            }
        } else if above {
            let flag = if self.extrema().is_empty() {
                PhaseFlag::Supercritical
            } else {
                PhaseFlag::Liquid
            };
            match self.liquid_root_beyond_grid(pressure) {
                Some(rho) => (rho, flag),
                None => {
                    warn!(
                        "T = {} K, x = {}: no fluid at P = {pressure} Pa",
                        self.temperature, self.molefracs
                    );
                    (f64::NAN, PhaseFlag::Unstable)
                }
            }
        } else {
            (f64::NAN, PhaseFlag::Unstable)
        }
    }
}

/// Density in mol/m³ and phase flag of the vapor phase.
pub fn vapor_density<E: Residual>(
    eos: &Arc<E>,
    pressure: f64,
    temperature: f64,
    molefracs: &Array1<f64>,
    options: &DensityScanOptions,
) -> EosResult<(f64, PhaseFlag)> {
    Ok(Isotherm::new(eos, temperature, molefracs, options)?.vapor_density(pressure))
}

/// Density in mol/m³ and phase flag of the liquid phase.
pub fn liquid_density<E: Residual>(
    eos: &Arc<E>,
    pressure: f64,
    temperature: f64,
    molefracs: &Array1<f64>,
    options: &DensityScanOptions,
) -> EosResult<(f64, PhaseFlag)> {
    Ok(Isotherm::new(eos, temperature, molefracs, options)?.liquid_density(pressure))
}

fn fugacity_coefficients<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    molefracs: &Array1<f64>,
    density: f64,
    flag: PhaseFlag,
) -> EosResult<(Array1<f64>, f64, PhaseFlag)> {
    let n = molefracs.len();
    match flag {
        PhaseFlag::IdealGas => Ok((Array1::ones(n), 0.0, flag)),
        PhaseFlag::Unstable => Ok((Array1::from_elem(n, f64::NAN), density, flag)),
        _ => {
            let state = State::new_density(eos, temperature, density, molefracs)?;
            let mut phi = state.fugacity_coefficients();
            // components that are not present keep a finite coefficient
            Zip::from(&mut phi).and(molefracs).for_each(|p, &x| {
                if x == 0.0 && !p.is_finite() {
                    *p = 1.0;
                }
            });
            Ok((phi, density, flag))
        }
    }
}

/// Fugacity coefficients, density in mol/m³ and phase flag of the vapor phase.
///
/// An unstable phase has NaN fugacity coefficients, an ideal gas has
/// fugacity coefficients of one and a density of zero.
pub fn fugacity_coefficient_vapor<E: Residual>(
    eos: &Arc<E>,
    pressure: f64,
    temperature: f64,
    molefracs: &Array1<f64>,
    options: &DensityScanOptions,
) -> EosResult<(Array1<f64>, f64, PhaseFlag)> {
    let (density, flag) = vapor_density(eos, pressure, temperature, molefracs, options)?;
    fugacity_coefficients(eos, temperature, molefracs, density, flag)
}

/// Fugacity coefficients, density in mol/m³ and phase flag of the liquid phase.
///
/// The same conventions as for [fugacity_coefficient_vapor] apply.
pub fn fugacity_coefficient_liquid<E: Residual>(
    eos: &Arc<E>,
    pressure: f64,
    temperature: f64,
    molefracs: &Array1<f64>,
    options: &DensityScanOptions,
) -> EosResult<(Array1<f64>, f64, PhaseFlag)> {
    let (density, flag) = liquid_density(eos, pressure, temperature, molefracs, options)?;
    fugacity_coefficients(eos, temperature, molefracs, density, flag)
}
