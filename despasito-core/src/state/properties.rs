use super::{Contributions, Derivative, Derivative::*, PartialDerivative, State};
use crate::equation_of_state::{IdealGas, Residual};
use crate::units::{ANGSTROM3, KB, NAV, RGAS};
use ndarray::Array1;

impl Derivative {
    /// Factor converting a derivative with respect to the reduced
    /// variable into a derivative with respect to the SI variable.
    fn reference(&self) -> f64 {
        match self {
            DV => ANGSTROM3,
            DT => 1.0,
            DN(_) => NAV,
        }
    }
}

/// # State properties
impl<E: Residual> State<E> {
    pub(super) fn get_or_compute_derivative_residual(&self, derivative: PartialDerivative) -> f64 {
        let mut cache = self.cache.lock().unwrap();

        match derivative {
            PartialDerivative::Zeroth => {
                let new_state = self.derive0();
                let computation =
                    || self.eos.residual_helmholtz_energy(&new_state) * new_state.temperature;
                cache.get_or_insert_with_f64(computation) * KB
            }
            PartialDerivative::First(v) => {
                let new_state = self.derive1(v);
                let computation =
                    || self.eos.residual_helmholtz_energy(&new_state) * new_state.temperature;
                cache.get_or_insert_with_d64(v, computation) * KB * v.reference()
            }
            PartialDerivative::Second(v) => {
                let new_state = self.derive2(v);
                let computation =
                    || self.eos.residual_helmholtz_energy(&new_state) * new_state.temperature;
                cache.get_or_insert_with_d2_64(v, computation) * KB * v.reference() * v.reference()
            }
            PartialDerivative::SecondMixed(v1, v2) => {
                let new_state = self.derive2_mixed(v1, v2);
                let computation =
                    || self.eos.residual_helmholtz_energy(&new_state) * new_state.temperature;
                cache.get_or_insert_with_hd64(v1, v2, computation)
                    * KB
                    * v1.reference()
                    * v2.reference()
            }
        }
    }

    fn contributions(ideal_gas: f64, residual: f64, contributions: Contributions) -> f64 {
        match contributions {
            Contributions::IdealGas => ideal_gas,
            Contributions::Total => ideal_gas + residual,
            Contributions::Residual => residual,
        }
    }

    /// Residual Helmholtz energy $A^\text{res}$ in J
    pub fn residual_helmholtz_energy(&self) -> f64 {
        self.get_or_compute_derivative_residual(PartialDerivative::Zeroth)
    }

    /// Residual molar Helmholtz energy $a^\text{res}$ in J/mol
    pub fn residual_molar_helmholtz_energy(&self) -> f64 {
        self.residual_helmholtz_energy() / self.total_moles
    }

    /// Residual entropy $S^\text{res}=-\left(\frac{\partial A^\text{res}}{\partial T}\right)_{V,N_i}$ in J/K
    pub fn residual_entropy(&self) -> f64 {
        -self.get_or_compute_derivative_residual(PartialDerivative::First(DT))
    }

    /// Residual molar internal energy $u^\text{res}=\frac{A^\text{res}+TS^\text{res}}{N}$ in J/mol
    pub fn residual_molar_internal_energy(&self) -> f64 {
        (self.residual_helmholtz_energy() + self.temperature * self.residual_entropy())
            / self.total_moles
    }

    /// Pressure: $p=-\left(\frac{\partial A}{\partial V}\right)_{T,N_i}$ in Pa
    pub fn pressure(&self, contributions: Contributions) -> f64 {
        let ideal_gas = self.density * RGAS * self.temperature;
        let residual = -self.get_or_compute_derivative_residual(PartialDerivative::First(DV));
        Self::contributions(ideal_gas, residual, contributions)
    }

    /// Residual chemical potential: $\mu_i^\text{res}=\left(\frac{\partial A^\text{res}}{\partial N_i}\right)_{T,V,N_j}$ in J/mol
    pub fn residual_chemical_potential(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.eos.components(), |i| {
            self.get_or_compute_derivative_residual(PartialDerivative::First(DN(i)))
        })
    }

    /// Compressibility factor: $Z=\frac{pV}{NRT}$
    pub fn compressibility(&self, contributions: Contributions) -> f64 {
        self.pressure(contributions) / (self.density * self.temperature * RGAS)
    }

    /// Partial derivative of pressure w.r.t. volume: $\left(\frac{\partial p}{\partial V}\right)_{T,N_i}$ in Pa/m³
    pub fn dp_dv(&self, contributions: Contributions) -> f64 {
        let ideal_gas = -self.density * RGAS * self.temperature / self.volume;
        let residual = -self.get_or_compute_derivative_residual(PartialDerivative::Second(DV));
        Self::contributions(ideal_gas, residual, contributions)
    }

    /// Partial derivative of pressure w.r.t. density: $\left(\frac{\partial p}{\partial \rho}\right)_{T,N_i}$ in Pa m³/mol
    pub fn dp_drho(&self, contributions: Contributions) -> f64 {
        -self.volume / self.density * self.dp_dv(contributions)
    }

    /// Partial derivative of pressure w.r.t. temperature: $\left(\frac{\partial p}{\partial T}\right)_{V,N_i}$ in Pa/K
    pub fn dp_dt(&self, contributions: Contributions) -> f64 {
        let ideal_gas = self.density * RGAS;
        let residual =
            -self.get_or_compute_derivative_residual(PartialDerivative::SecondMixed(DV, DT));
        Self::contributions(ideal_gas, residual, contributions)
    }

    /// Logarithm of the fugacity coefficient: $\ln\varphi_i=\beta\mu_i^\mathrm{res}\left(T,p,\lbrace N_i\rbrace\right)$
    pub fn ln_phi(&self) -> Array1<f64> {
        self.residual_chemical_potential() / (RGAS * self.temperature)
            - self.compressibility(Contributions::Total).ln()
    }

    /// Fugacity coefficients $\varphi_i$
    pub fn fugacity_coefficients(&self) -> Array1<f64> {
        self.ln_phi().mapv(f64::exp)
    }

    /// Residual molar Helmholtz energy of every contribution of the model in J/mol.
    pub fn residual_helmholtz_energy_contributions(&self) -> Vec<(String, f64)> {
        let new_state = self.derive0();
        let n = self.reduced_moles.sum();
        self.eos
            .residual_helmholtz_energy_contributions(&new_state)
            .into_iter()
            .map(|(name, a)| (name, a * self.temperature * RGAS / n))
            .collect()
    }
}

/// # Properties including the ideal gas
impl<E: Residual + IdealGas> State<E> {
    /// Helmholtz energy $A$ in J
    pub fn helmholtz_energy(&self, contributions: Contributions) -> f64 {
        let new_state = self.derive0();
        let ideal_gas = self.eos.ideal_gas_helmholtz_energy(&new_state) * self.temperature * KB;
        Self::contributions(ideal_gas, self.residual_helmholtz_energy(), contributions)
    }

    /// Molar Helmholtz energy $a$ in J/mol
    pub fn molar_helmholtz_energy(&self, contributions: Contributions) -> f64 {
        self.helmholtz_energy(contributions) / self.total_moles
    }

    /// Temperature derivative of the molar Helmholtz energy at constant
    /// volume and composition $\left(\frac{\partial a}{\partial T}\right)_{V,N_i}$ in J/(mol K)
    pub fn helmholtz_energy_temperature_derivative(&self, contributions: Contributions) -> f64 {
        let new_state = self.derive1(DT);
        let ideal_gas = (self.eos.ideal_gas_helmholtz_energy(&new_state) * new_state.temperature)
            .eps
            * KB;
        let residual = self.get_or_compute_derivative_residual(PartialDerivative::First(DT));
        Self::contributions(ideal_gas, residual, contributions) / self.total_moles
    }
}

#[cfg(test)]
mod tests {
    use crate::equation_of_state::{Components, DeBroglie, EquationOfState, IdealGas, Residual};
    use crate::state::{Contributions, State, StateHD};
    use crate::units::RGAS;
    use crate::EosResult;
    use approx::assert_relative_eq;
    use ndarray::{arr1, Array1, ScalarOperand};
    use num_dual::DualNum;
    use std::sync::Arc;

    struct NoResidual(usize);

    impl Components for NoResidual {
        fn components(&self) -> usize {
            self.0
        }

        fn subset(&self, component_list: &[usize]) -> EosResult<Self> {
            Ok(Self(component_list.len()))
        }
    }

    impl Residual for NoResidual {
        fn compute_max_density(&self, moles: &Array1<f64>) -> f64 {
            moles.sum()
        }

        fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy + ScalarOperand>(
            &self,
            _: &StateHD<D>,
        ) -> Vec<(String, D)> {
            vec![("nothing".to_string(), D::zero())]
        }
    }

    #[test]
    fn ideal_gas_mixture() -> EosResult<()> {
        let eos = Arc::new(EquationOfState::new(
            Arc::new(DeBroglie::new(arr1(&[0.016, 0.044]))),
            Arc::new(NoResidual(2)),
        ));
        let s = State::new_density(&eos, 350.0, 40.0, &arr1(&[0.3, 0.7]))?;
        assert_relative_eq!(s.pressure(Contributions::Total), 40.0 * RGAS * 350.0);
        assert_relative_eq!(s.compressibility(Contributions::Total), 1.0);
        assert_relative_eq!(s.ln_phi()[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.residual_molar_internal_energy(), 0.0);

        // (∂a/∂T)_V = -s for the ideal gas, -s = a/T - 3/2 R
        let a = s.molar_helmholtz_energy(Contributions::IdealGas);
        assert_relative_eq!(
            s.helmholtz_energy_temperature_derivative(Contributions::Total),
            a / 350.0 - 1.5 * RGAS,
            max_relative = 1e-10
        );
        Ok(())
    }

    #[test]
    fn ideal_gas_helmholtz_energy_is_extensive() -> EosResult<()> {
        let ig = DeBroglie::new(arr1(&[0.018]));
        let s1 = StateHD::new(300.0, 1e27, arr1(&[1e23]));
        let s2 = StateHD::new(300.0, 2e27, arr1(&[2e23]));
        assert_relative_eq!(
            2.0 * ig.ideal_gas_helmholtz_energy(&s1),
            ig.ideal_gas_helmholtz_energy(&s2),
            max_relative = 1e-12
        );
        Ok(())
    }

    #[test]
    fn invalid_density() {
        let eos = Arc::new(NoResidual(1));
        assert!(State::new_density(&eos, 300.0, -1.0, &arr1(&[1.0])).is_err());
        assert!(State::new_density(&eos, f64::NAN, 1.0, &arr1(&[1.0])).is_err());
    }
}
