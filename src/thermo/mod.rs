//! Batch thermodynamic calculations.
//!
//! A [Calculation] names one of the supported calculation types together with
//! lists of temperatures, pressures and compositions. Every entry of the lists
//! is an independent point. A point that fails is logged and reported with
//! NaN values, the remaining points are unaffected.
use crate::eos::ResidualModel;
use despasito_core::density::{
    fugacity_coefficient_liquid, fugacity_coefficient_vapor, liquid_density,
};
use despasito_core::{
    bubble_pressure, dew_pressure, hildebrand_solubility, saturation_pressure, tp_flash,
    BubbleDewOptions, Components, EosError, EosResult, PhaseFlag,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

mod input;
mod output;
pub use input::{CalculationOptions, Conditions};
use input::{broadcast, broadcast_len, required};
pub use output::{
    FlashOutput, LiquidOutput, PhaseEquilibriumOutput, SaturationOutput, SolubilityOutput,
    ThermoOutput, VaporOutput,
};

#[cfg(feature = "rayon")]
use rayon::{prelude::*, ThreadPool};

/// Pressure in Pa at which solubility parameters are evaluated by default.
const DEFAULT_PRESSURE: f64 = 101325.0;

/// Supported calculation types.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "calculation_type")]
pub enum Calculation {
    /// Bubble point pressure and vapor composition from `Tlist` and `xilist`.
    #[serde(rename = "phase_xiT")]
    PhaseXiT(Conditions),
    /// Dew point pressure and liquid composition from `Tlist` and `yilist`.
    #[serde(rename = "phase_yiT")]
    PhaseYiT(Conditions),
    /// Saturation pressure and densities of pure components.
    #[serde(rename = "sat_props")]
    SatProps(Conditions),
    /// Liquid density and fugacity coefficients from `Tlist`, `Plist` and `xilist`.
    #[serde(rename = "liquid_properties")]
    LiquidProperties(Conditions),
    /// Vapor density and fugacity coefficients from `Tlist`, `Plist` and `yilist`.
    #[serde(rename = "vapor_properties")]
    VaporProperties(Conditions),
    /// Hildebrand solubility parameter of liquids.
    #[serde(rename = "solubility_parameter")]
    SolubilityParameter(Conditions),
    /// Phase compositions of a binary mixture at `Tlist` and `Plist`.
    #[serde(rename = "flash")]
    Flash(Conditions),
}

impl Calculation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhaseXiT(_) => "phase_xiT",
            Self::PhaseYiT(_) => "phase_yiT",
            Self::SatProps(_) => "sat_props",
            Self::LiquidProperties(_) => "liquid_properties",
            Self::VaporProperties(_) => "vapor_properties",
            Self::SolubilityParameter(_) => "solubility_parameter",
            Self::Flash(_) => "flash",
        }
    }

    pub fn conditions(&self) -> &Conditions {
        match self {
            Self::PhaseXiT(c)
            | Self::PhaseYiT(c)
            | Self::SatProps(c)
            | Self::LiquidProperties(c)
            | Self::VaporProperties(c)
            | Self::SolubilityParameter(c)
            | Self::Flash(c) => c,
        }
    }
}

/// Evaluates the points of a calculation one after another or on a thread pool.
struct Dispatcher<'a> {
    eos: &'a Arc<ResidualModel>,
    options: &'a CalculationOptions,
    #[cfg(feature = "rayon")]
    thread_pool: Option<&'a ThreadPool>,
}

impl<'a> Dispatcher<'a> {
    fn map<T, F>(&self, n: usize, f: F) -> Vec<Option<T>>
    where
        T: Send,
        F: Fn(usize) -> EosResult<T> + Sync,
    {
        let point = |i: usize| {
            f(i).map_err(|e| warn!("point {i} failed: {e}")).ok()
        };
        #[cfg(feature = "rayon")]
        if let Some(thread_pool) = self.thread_pool {
            return thread_pool.install(|| (0..n).into_par_iter().map(point).collect());
        }
        (0..n).map(point).collect()
    }

    fn bubble_dew_options(&self, pressure_guess: Option<f64>) -> BubbleDewOptions {
        BubbleDewOptions {
            outer: self.options.pressure_options,
            inner: self.options.mole_fraction_options,
            density: self.options.density_opts,
            pressure_guess,
            component_beads: Some(
                self.eos
                    .component_records()
                    .iter()
                    .map(|c| c.beads.keys().cloned().collect())
                    .collect(),
            ),
        }
    }

    fn run(&self, calculation: &Calculation) -> EosResult<ThermoOutput> {
        let c = calculation.conditions();
        let eos = self.eos;
        let density = &self.options.density_opts;
        let t = &c.temperature;
        let components = eos.components();
        Ok(match calculation {
            Calculation::PhaseXiT(_) | Calculation::PhaseYiT(_) => {
                let bubble = matches!(calculation, Calculation::PhaseXiT(_));
                let (z, name) = if bubble {
                    (required(&c.liquid_molefracs, "xilist")?, "xilist")
                } else {
                    (required(&c.vapor_molefracs, "yilist")?, "yilist")
                };
                let guess = c.pressure_guess.as_deref().unwrap_or(&[]);
                let n = self.len(calculation, &[("Tlist", t.len()), (name, z.len())], guess)?;
                let points = self.map(n, |i| {
                    let options = self.bubble_dew_options(
                        (!guess.is_empty()).then(|| *broadcast(guess, i)),
                    );
                    let z = Array1::from_vec(broadcast(z, i).clone());
                    let t = *broadcast(t, i);
                    if bubble {
                        bubble_pressure(eos, t, &z, &options)
                    } else {
                        dew_pressure(eos, t, &z, &options)
                    }
                });
                ThermoOutput::PhaseEquilibrium(PhaseEquilibriumOutput::new(
                    points, components, bubble,
                ))
            }
            Calculation::SatProps(_) => {
                let pure = [vec![1.0]];
                let x: &[Vec<f64>] = match &c.liquid_molefracs {
                    Some(x) => x.as_slice(),
                    None if components == 1 => &pure,
                    None => return Err(EosError::Error("calculation requires xilist".into())),
                };
                let n = self.len(calculation, &[("Tlist", t.len()), ("xilist", x.len())], &[])?;
                let points = self.map(n, |i| {
                    let x = Array1::from_vec(broadcast(x, i).clone());
                    saturation_pressure(
                        eos,
                        *broadcast(t, i),
                        &x,
                        density,
                        self.options.pressure_options,
                    )
                });
                ThermoOutput::Saturation(SaturationOutput::new(points))
            }
            Calculation::LiquidProperties(_) | Calculation::VaporProperties(_) => {
                let liquid = matches!(calculation, Calculation::LiquidProperties(_));
                let p = required(&c.pressure, "Plist")?;
                let (z, name) = if liquid {
                    (required(&c.liquid_molefracs, "xilist")?, "xilist")
                } else {
                    (required(&c.vapor_molefracs, "yilist")?, "yilist")
                };
                let n = self.len(
                    calculation,
                    &[("Tlist", t.len()), ("Plist", p.len()), (name, z.len())],
                    &[],
                )?;
                let points = self.map(n, |i| {
                    let z = Array1::from_vec(broadcast(z, i).clone());
                    let (p, t) = (*broadcast(p, i), *broadcast(t, i));
                    if liquid {
                        fugacity_coefficient_liquid(eos, p, t, &z, density)
                    } else {
                        fugacity_coefficient_vapor(eos, p, t, &z, density)
                    }
                });
                if liquid {
                    ThermoOutput::Liquid(LiquidOutput::new(points, components))
                } else {
                    ThermoOutput::Vapor(VaporOutput::new(points, components))
                }
            }
            Calculation::SolubilityParameter(_) => {
                let x = required(&c.liquid_molefracs, "xilist")?;
                let default = [DEFAULT_PRESSURE];
                let p = c.pressure.as_deref().unwrap_or(&default);
                let n = self.len(
                    calculation,
                    &[("Tlist", t.len()), ("Plist", p.len()), ("xilist", x.len())],
                    &[],
                )?;
                let points = self.map(n, |i| {
                    let x = Array1::from_vec(broadcast(x, i).clone());
                    let (p, t) = (*broadcast(p, i), *broadcast(t, i));
                    let (rho, flag) =
                        liquid_density(eos, p, t, &x, density)?;
                    if flag == PhaseFlag::Unstable || !rho.is_finite() {
                        return Err(EosError::InvalidState(
                            "solubility_parameter".into(),
                            "liquid density".into(),
                            rho,
                        ));
                    }
                    Ok((rho, hildebrand_solubility(eos, rho, t, &x)?))
                });
                ThermoOutput::Solubility(SolubilityOutput::new(points))
            }
            Calculation::Flash(_) => {
                let p = required(&c.pressure, "Plist")?;
                let n = self.len(calculation, &[("Tlist", t.len()), ("Plist", p.len())], &[])?;
                let points = self.map(n, |i| {
                    let options = self.bubble_dew_options(None);
                    tp_flash(eos, *broadcast(t, i), *broadcast(p, i), &options)
                });
                ThermoOutput::Flash(FlashOutput::new(points, components))
            }
        })
    }

    /// Number of points of the calculation, including the optional pressure guesses.
    fn len(
        &self,
        calculation: &Calculation,
        lengths: &[(&str, usize)],
        guess: &[f64],
    ) -> EosResult<usize> {
        let mut lengths = lengths.to_vec();
        if !guess.is_empty() {
            lengths.push(("Pguess", guess.len()));
        }
        let n = broadcast_len(&lengths)?;
        info!(
            "{} with {} for {} point(s)",
            calculation.name(),
            self.eos,
            n
        );
        Ok(n)
    }
}

/// Evaluate all points of a calculation.
pub fn thermo(
    eos: &Arc<ResidualModel>,
    calculation: &Calculation,
    options: &CalculationOptions,
) -> EosResult<ThermoOutput> {
    Dispatcher {
        eos,
        options,
        #[cfg(feature = "rayon")]
        thread_pool: None,
    }
    .run(calculation)
}

/// Evaluate all points of a calculation in parallel on the given thread pool.
#[cfg(feature = "rayon")]
pub fn par_thermo(
    eos: &Arc<ResidualModel>,
    calculation: &Calculation,
    options: &CalculationOptions,
    thread_pool: &ThreadPool,
) -> EosResult<ThermoOutput> {
    Dispatcher {
        eos,
        options,
        thread_pool: Some(thread_pool),
    }
    .run(calculation)
}
