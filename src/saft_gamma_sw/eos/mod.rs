use super::parameters::SaftGammaSwParameters;
use crate::association::Association;
use crate::hard_sphere::{HardSphere, HardSphereProperties};
use despasito_core::parameter::GroupContributionParameter;
use despasito_core::{Components, EosResult, MolarWeight, Residual, StateHD};
use ndarray::{Array1, Array2, ScalarOperand};
use num_dual::DualNum;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_6;
use std::fmt;
use std::sync::Arc;

mod chain;
mod monomer;
use chain::a_chain;
use monomer::{a_disp, Properties};

/// Customization options for the SAFT-γ SW equation of state.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SaftGammaSwOptions {
    pub max_eta: f64,
    pub max_iter_cross_assoc: usize,
    pub tol_cross_assoc: f64,
}

impl Default for SaftGammaSwOptions {
    fn default() -> Self {
        Self {
            max_eta: 0.5,
            max_iter_cross_assoc: 50,
            tol_cross_assoc: 1e-10,
        }
    }
}

/// SAFT-γ SW equation of state ([Lymperiadis et al., 2008](https://doi.org/10.1016/j.fluid.2008.09.003)).
pub struct SaftGammaSw {
    parameters: Arc<SaftGammaSwParameters>,
    options: SaftGammaSwOptions,
    hard_sphere: HardSphere<SaftGammaSwParameters>,
    chain: bool,
    association: Option<Association>,
}

impl SaftGammaSw {
    pub fn new(parameters: Arc<SaftGammaSwParameters>) -> Self {
        Self::with_options(parameters, SaftGammaSwOptions::default())
    }

    pub fn with_options(
        parameters: Arc<SaftGammaSwParameters>,
        options: SaftGammaSwOptions,
    ) -> Self {
        let association = (!parameters.association.is_empty()).then(|| {
            Association::new(
                &parameters.association,
                options.max_iter_cross_assoc,
                options.tol_cross_assoc,
            )
        });
        Self {
            parameters: parameters.clone(),
            options,
            hard_sphere: HardSphere::new(&parameters),
            chain: parameters
                .segments
                .chain_length(&parameters.m)
                .iter()
                .any(|&m| m != 1.0),
            association,
        }
    }

    pub fn parameters(&self) -> &Arc<SaftGammaSwParameters> {
        &self.parameters
    }

    /// Fraction of non-bonded association sites at the given state.
    pub fn site_fractions(&self, state: &StateHD<f64>) -> EosResult<Array1<f64>> {
        match &self.association {
            Some(association) => {
                let properties = Properties::new(&self.parameters, state);
                let kernel = association_kernel(&self.parameters, &properties);
                association.site_fractions(state, &kernel)
            }
            None => Ok(Array1::zeros(0)),
        }
    }
}

/// Hard-sphere contact values $g^\mathrm{HS}(\sigma_{kl})$ for all pairs of bead types.
fn association_kernel<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaSwParameters,
    properties: &Properties<D>,
) -> Array2<D> {
    let sigma = &parameters.sigma;
    let n = sigma.len();
    Array2::from_shape_fn((n, n), |(k, l)| {
        parameters.g_hs(
            D::from(sigma[k]),
            D::from(sigma[l]),
            properties.zeta2,
            properties.zeta3,
        )
    })
}

impl Components for SaftGammaSw {
    fn components(&self) -> usize {
        self.parameters.components.len()
    }

    fn subset(&self, component_list: &[usize]) -> EosResult<Self> {
        Ok(Self::with_options(
            Arc::new(self.parameters.subset(component_list)?),
            self.options,
        ))
    }
}

impl Residual for SaftGammaSw {
    fn compute_max_density(&self, moles: &Array1<f64>) -> f64 {
        let p = &self.parameters;
        let segment_volume: f64 = p
            .segments
            .component_index
            .iter()
            .zip(&p.segment_sigma)
            .zip(&p.m)
            .map(|((&i, &s), &m)| moles[i] * m * s.powi(3))
            .sum();
        self.options.max_eta * moles.sum() / (FRAC_PI_6 * segment_volume)
    }

    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        state: &StateHD<D>,
    ) -> Vec<(String, D)> {
        let mut a = vec![(
            self.hard_sphere.to_string().to_lowercase(),
            self.hard_sphere.helmholtz_energy(state),
        )];
        let properties = Properties::new(&self.parameters, state);
        a.push((
            "dispersion".to_string(),
            a_disp(&self.parameters, &properties, state),
        ));
        if self.chain {
            a.push((
                "chain".to_string(),
                a_chain(&self.parameters, &properties, state),
            ));
        }
        if let Some(association) = self.association.as_ref() {
            let kernel = association_kernel(&self.parameters, &properties);
            a.push((
                association.to_string().to_lowercase(),
                association.helmholtz_energy(state, &kernel),
            ));
        }
        a
    }
}

impl MolarWeight for SaftGammaSw {
    fn molar_weight(&self) -> Array1<f64> {
        self.parameters.molar_weight()
    }
}

impl fmt::Display for SaftGammaSw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SAFT-γ SW")
    }
}
