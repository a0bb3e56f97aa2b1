use super::Components;
use crate::units::{KB, NAV, PLANCK};
use crate::{EosResult, StateHD};
use ndarray::Array1;
use num_dual::DualNum;
use std::f64::consts::PI;
use std::fmt;

/// Ideal gas Helmholtz energy contribution that can
/// be evaluated using generalized (hyper) dual numbers.
pub trait IdealGas: Components + Sync + Send {
    /// Logarithm of the cubed thermal de Broglie wavelength
    /// $\ln\Lambda_i^3$ with $\Lambda$ in Angstrom.
    fn ln_lambda3<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D>;

    /// Short description of the ideal gas model.
    fn ideal_gas_model(&self) -> String;

    /// Evaluate the ideal gas contribution
    /// $\beta A^\mathrm{ig}=\sum_iN_i\left(\ln\left(\rho_i\Lambda_i^3\right)-1\right)$.
    fn ideal_gas_helmholtz_energy<D: DualNum<f64> + Copy>(&self, state: &StateHD<D>) -> D {
        let ln_lambda3 = self.ln_lambda3(state.temperature);
        let mut a = D::zero();
        for ((&l, &rho), &n) in ln_lambda3
            .iter()
            .zip(state.partial_density.iter())
            .zip(state.moles.iter())
        {
            if rho.re() > 0.0 {
                a += n * (rho.ln() + l - 1.0);
            }
        }
        a
    }
}

/// Ideal gas of point particles with translational degrees of freedom only.
#[derive(Clone, Debug)]
pub struct DeBroglie {
    molarweight: Array1<f64>,
}

impl DeBroglie {
    /// Create the ideal gas model from molar weights in kg/mol.
    pub fn new(molarweight: Array1<f64>) -> Self {
        Self { molarweight }
    }
}

impl Components for DeBroglie {
    fn components(&self) -> usize {
        self.molarweight.len()
    }

    fn subset(&self, component_list: &[usize]) -> EosResult<Self> {
        super::validate_subset(component_list, self.components())?;
        Ok(Self::new(
            component_list.iter().map(|&i| self.molarweight[i]).collect(),
        ))
    }
}

impl IdealGas for DeBroglie {
    fn ln_lambda3<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        self.molarweight.mapv(|mw| {
            // Λ = h / sqrt(2π m k T), converted to Angstrom
            let m = mw / NAV;
            let c = PLANCK / (2.0 * PI * m * KB).sqrt() * 1e10;
            (temperature.sqrt().recip() * c).ln() * 3.0
        })
    }

    fn ideal_gas_model(&self) -> String {
        "de Broglie ideal gas".to_string()
    }
}

impl fmt::Display for DeBroglie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ideal_gas_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn argon_wavelength() {
        // thermal wavelength of argon at 298.15 K is about 0.16 Å
        let ig = DeBroglie::new(arr1(&[0.039948]));
        let ln_l3 = ig.ln_lambda3(298.15);
        let lambda = (ln_l3[0] / 3.0).exp();
        assert_relative_eq!(lambda, 0.16, max_relative = 0.02);
    }

    #[test]
    fn subset_keeps_molar_weights() {
        let ig = DeBroglie::new(arr1(&[0.044, 0.018]));
        let s = ig.subset(&[1]).unwrap();
        assert_eq!(s.components(), 1);
        assert_relative_eq!(s.molarweight[0], 0.018);
        assert!(ig.subset(&[2]).is_err());
    }
}
