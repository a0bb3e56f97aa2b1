//! Description of a thermodynamic state.
//!
//! A thermodynamic state in SAFT is defined by
//! * a temperature
//! * an array of mole numbers
//! * the volume
//!
//! Internally, all properties are computed using such states as input.
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::units::{moles_to_reduced, volume_to_reduced};
use cache::Cache;
use ndarray::prelude::*;
use num_dual::*;
use std::fmt;
use std::sync::{Arc, Mutex};

mod cache;
mod properties;

/// Possible contributions that can be computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contributions {
    /// Only compute the ideal gas contribution
    IdealGas,
    /// Only compute the difference between the total and the ideal gas contribution
    Residual,
    /// Compute ideal gas and residual contributions
    Total,
}

/// Thermodynamic state of the system in reduced variables
/// including their derivatives.
///
/// Properties are stored as generalized (hyper) dual numbers which allows
/// for automatic differentiation.
#[derive(Clone, Debug)]
pub struct StateHD<D: DualNum<f64>> {
    /// temperature in Kelvin
    pub temperature: D,
    /// volume in Angstrom^3
    pub volume: D,
    /// number of particles
    pub moles: Array1<D>,
    /// mole fractions
    pub molefracs: Array1<D>,
    /// partial number densities in Angstrom^-3
    pub partial_density: Array1<D>,
}

impl<D: DualNum<f64> + Copy> StateHD<D> {
    /// Create a new `StateHD` for given temperature volume and moles.
    pub fn new(temperature: D, volume: D, moles: Array1<D>) -> Self {
        let total_moles = moles.sum();
        let partial_density = moles.mapv(|n| n / volume);
        let molefracs = moles.mapv(|n| n / total_moles);

        Self {
            temperature,
            volume,
            moles,
            molefracs,
            partial_density,
        }
    }

    // Since the molefracs can not be reproduced from moles if the density is zero,
    // this constructor exists specifically for these cases.
    pub(crate) fn new_virial(temperature: D, density: D, molefracs: Array1<f64>) -> Self {
        let volume = D::one();
        let partial_density = molefracs.mapv(|x| density * x);
        let moles = partial_density.mapv(|pd| pd * volume);
        let molefracs = molefracs.mapv(D::from);
        Self {
            temperature,
            volume,
            moles,
            molefracs,
            partial_density,
        }
    }
}

/// Thermodynamic state of the system.
///
/// The state is specified by the variables of the Helmholtz energy: volume $V$,
/// temperature $T$ and mole numbers $N_i$, all in SI units. The reduced
/// counterparts (Å³, number of molecules) are stored alongside and used to
/// evaluate the equation of state.
///
/// Calculated partial derivatives are cached in the state. Therefore, the second
/// evaluation of a property like the pressure does not require a recalculation
/// of the equation of state.
#[derive(Debug)]
pub struct State<E> {
    /// Equation of state
    pub eos: Arc<E>,
    /// Temperature in K
    pub temperature: f64,
    /// Volume in m³
    pub volume: f64,
    /// Mole numbers in mol
    pub moles: Array1<f64>,
    /// Total number of moles in mol
    pub total_moles: f64,
    /// Partial densities in mol/m³
    pub partial_density: Array1<f64>,
    /// Total density in mol/m³
    pub density: f64,
    /// Mole fractions
    pub molefracs: Array1<f64>,
    /// Reduced temperature
    reduced_temperature: f64,
    /// Reduced volume
    reduced_volume: f64,
    /// Reduced moles
    reduced_moles: Array1<f64>,
    /// Cache
    cache: Mutex<Cache>,
}

impl<E> Clone for State<E> {
    fn clone(&self) -> Self {
        Self {
            eos: self.eos.clone(),
            total_moles: self.total_moles,
            temperature: self.temperature,
            volume: self.volume,
            moles: self.moles.clone(),
            partial_density: self.partial_density.clone(),
            density: self.density,
            molefracs: self.molefracs.clone(),
            reduced_temperature: self.reduced_temperature,
            reduced_volume: self.reduced_volume,
            reduced_moles: self.reduced_moles.clone(),
            cache: Mutex::new(self.cache.lock().unwrap().clone()),
        }
    }
}

impl<E: Residual> fmt::Display for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.eos.components() == 1 {
            write!(f, "T = {:.5} K, ρ = {:.5} mol/m³", self.temperature, self.density)
        } else {
            write!(
                f,
                "T = {:.5} K, ρ = {:.5} mol/m³, x = {:.5}",
                self.temperature, self.density, self.molefracs
            )
        }
    }
}

/// Derivatives of the helmholtz energy.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Debug, PartialOrd, Ord)]
pub enum Derivative {
    /// Derivative with respect to system volume.
    DV,
    /// Derivative with respect to temperature.
    DT,
    /// Derivative with respect to component `i`.
    DN(usize),
}

#[derive(Clone, Copy, Eq, Hash, PartialEq, Debug)]
pub(crate) enum PartialDerivative {
    Zeroth,
    First(Derivative),
    Second(Derivative),
    SecondMixed(Derivative, Derivative),
}

impl<E: Residual> State<E> {
    /// Return a new `State` given a temperature in K, a volume in m³ and
    /// an array of mole numbers in mol.
    ///
    /// This function will perform a validation of the given properties, i.e. test for signs
    /// and if values are finite. It will **not** validate physics, i.e. if the resulting
    /// densities are below the maximum packing fraction.
    pub fn new_nvt(
        eos: &Arc<E>,
        temperature: f64,
        volume: f64,
        moles: &Array1<f64>,
    ) -> EosResult<Self> {
        eos.validate_moles(Some(moles))?;
        validate(temperature, volume, moles)?;
        Ok(Self::new_nvt_unchecked(eos, temperature, volume, moles))
    }

    pub(crate) fn new_nvt_unchecked(
        eos: &Arc<E>,
        temperature: f64,
        volume: f64,
        moles: &Array1<f64>,
    ) -> Self {
        let total_moles = moles.sum();
        let partial_density = moles / volume;
        let density = total_moles / volume;
        let molefracs = moles / total_moles;

        State {
            eos: eos.clone(),
            total_moles,
            temperature,
            volume,
            moles: moles.to_owned(),
            partial_density,
            density,
            molefracs,
            reduced_temperature: temperature,
            reduced_volume: volume_to_reduced(volume),
            reduced_moles: moles.mapv(moles_to_reduced),
            cache: Mutex::new(Cache::with_capacity(eos.components())),
        }
    }

    /// Return a new `State` containing one mole in total for a
    /// given temperature in K, molar density in mol/m³ and composition.
    pub fn new_density(
        eos: &Arc<E>,
        temperature: f64,
        density: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        if !density.is_finite() || density <= 0.0 {
            return Err(EosError::InvalidState(
                String::from("State::new_density"),
                String::from("density"),
                density,
            ));
        }
        let moles = molefracs / molefracs.sum();
        Self::new_nvt(eos, temperature, 1.0 / density, &moles)
    }

    /// Creates a [StateHD] cloning temperature, volume and moles.
    pub fn derive0(&self) -> StateHD<f64> {
        StateHD::new(
            self.reduced_temperature,
            self.reduced_volume,
            self.reduced_moles.clone(),
        )
    }

    /// Creates a [StateHD] taking the first derivative.
    pub fn derive1(&self, derivative: Derivative) -> StateHD<Dual64> {
        let mut t = Dual64::from(self.reduced_temperature);
        let mut v = Dual64::from(self.reduced_volume);
        let mut n = self.reduced_moles.mapv(Dual64::from);
        match derivative {
            Derivative::DT => t = t.derivative(),
            Derivative::DV => v = v.derivative(),
            Derivative::DN(i) => n[i] = n[i].derivative(),
        }
        StateHD::new(t, v, n)
    }

    /// Creates a [StateHD] taking the first and second (partial) derivatives.
    pub fn derive2(&self, derivative: Derivative) -> StateHD<Dual2_64> {
        let mut t = Dual2_64::from(self.reduced_temperature);
        let mut v = Dual2_64::from(self.reduced_volume);
        let mut n = self.reduced_moles.mapv(Dual2_64::from);
        match derivative {
            Derivative::DT => t = t.derivative(),
            Derivative::DV => v = v.derivative(),
            Derivative::DN(i) => n[i] = n[i].derivative(),
        }
        StateHD::new(t, v, n)
    }

    /// Creates a [StateHD] taking the first and second mixed partial derivatives.
    pub fn derive2_mixed(
        &self,
        derivative1: Derivative,
        derivative2: Derivative,
    ) -> StateHD<HyperDual64> {
        let mut t = HyperDual64::from(self.reduced_temperature);
        let mut v = HyperDual64::from(self.reduced_volume);
        let mut n = self.reduced_moles.mapv(HyperDual64::from);
        match derivative1 {
            Derivative::DT => t = t.derivative1(),
            Derivative::DV => v = v.derivative1(),
            Derivative::DN(i) => n[i] = n[i].derivative1(),
        }
        match derivative2 {
            Derivative::DT => t = t.derivative2(),
            Derivative::DV => v = v.derivative2(),
            Derivative::DN(i) => n[i] = n[i].derivative2(),
        }
        StateHD::new(t, v, n)
    }
}

fn validate(temperature: f64, volume: f64, moles: &Array1<f64>) -> EosResult<()> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(EosError::InvalidState(
            String::from("validate"),
            String::from("temperature"),
            temperature,
        ));
    }
    if !volume.is_finite() || volume <= 0.0 {
        return Err(EosError::InvalidState(
            String::from("validate"),
            String::from("volume"),
            volume,
        ));
    }
    for &n in moles.iter() {
        if !n.is_finite() || n.is_sign_negative() {
            return Err(EosError::InvalidState(
                String::from("validate"),
                String::from("moles"),
                n,
            ));
        }
    }
    Ok(())
}
