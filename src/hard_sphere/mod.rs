//! Generic implementation of the hard-sphere contribution
//! that can be used across group-contribution models.
use despasito_core::StateHD;
use ndarray::*;
use num_dual::DualNum;
use std::f64::consts::{FRAC_PI_6, PI};
use std::fmt;
use std::sync::Arc;

/// Properties of heterosegmented hard-sphere systems.
///
/// Every segment is one bead type on one component. Its geometry
/// coefficient is the number of beads of that type on the component
/// times the number of identical segments $v_k$ and the shape factor
/// $S_k$ of the bead.
pub trait HardSphereProperties {
    /// For every segment, the index of the component that it is on.
    fn component_index(&self) -> &Array1<usize>;

    /// The geometry coefficients $\nu_{ik}v_kS_k$ for every segment.
    fn geometry_coefficients(&self) -> &Array1<f64>;

    /// The temperature dependent hard-sphere diameters of every segment.
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D>;

    /// The packing fractions $\zeta_k$.
    fn zeta<D: DualNum<f64> + Copy, const N: usize>(
        &self,
        temperature: D,
        partial_density: &Array1<D>,
        k: [i32; N],
    ) -> [D; N] {
        let component_index = self.component_index();
        let geometry_coefficients = self.geometry_coefficients();
        let diameter = self.hs_diameter(temperature);
        let mut zeta = [D::zero(); N];
        for i in 0..diameter.len() {
            for (z, &k) in zeta.iter_mut().zip(k.iter()) {
                *z += partial_density[component_index[i]]
                    * diameter[i].powi(k)
                    * (geometry_coefficients[i] * FRAC_PI_6);
            }
        }
        zeta
    }

    /// The fraction $\frac{\zeta_2}{\zeta_3}$ evaluated in a way to avoid a division by 0 when the density is 0.
    fn zeta_23<D: DualNum<f64> + Copy>(&self, temperature: D, molefracs: &Array1<D>) -> D {
        let component_index = self.component_index();
        let geometry_coefficients = self.geometry_coefficients();
        let diameter = self.hs_diameter(temperature);
        let mut zeta: [D; 2] = [D::zero(); 2];
        for i in 0..diameter.len() {
            for (k, z) in zeta.iter_mut().enumerate() {
                *z += molefracs[component_index[i]]
                    * diameter[i].powi((k + 2) as i32)
                    * (geometry_coefficients[i] * FRAC_PI_6);
            }
        }
        zeta[0] / zeta[1]
    }

    /// Contact value of the hard-sphere pair distribution function between
    /// segments with diameters `d_k` and `d_l`.
    fn g_hs<D: DualNum<f64> + Copy>(&self, d_k: D, d_l: D, zeta2: D, zeta3: D) -> D {
        let frac_1mz3 = -(zeta3 - 1.0).recip();
        let d_kl = d_k * d_l / (d_k + d_l);
        frac_1mz3 + d_kl * zeta2 * frac_1mz3.powi(2) * 3.0
            + (d_kl * zeta2).powi(2) * frac_1mz3.powi(3) * 2.0
    }
}

/// Implementation of the BMCSL equation of state for hard-sphere mixtures.
///
/// This structure provides an implementation of the Boublík-Mansoori-Carnahan-Starling-Leland (BMCSL) equation of state ([Boublík, 1970](https://doi.org/10.1063/1.1673824), [Mansoori et al., 1971](https://doi.org/10.1063/1.1675048)) that is used as reference contribution of the SAFT-γ monomer term.
///
/// The reduced Helmholtz energy is calculated according to
/// $$\frac{\beta A}{V}=\frac{6}{\pi}\left(\frac{3\zeta_1\zeta_2}{1-\zeta_3}+\frac{\zeta_2^3}{\zeta_3\left(1-\zeta_3\right)^2}+\left(\frac{\zeta_2^3}{\zeta_3^2}-\zeta_0\right)\ln\left(1-\zeta_3\right)\right)$$
/// with the packing fractions
/// $$\zeta_k=\frac{\pi}{6}\sum_i\rho_i\sum_k \nu_{ik}v_kS_kd_k^l,~~~~~~~~l=0\ldots 3.$$
///
/// Since the prefactor contains the segment density, the result equals
/// $N\bar m a^\mathrm{HS}$ of the SAFT-γ monomer term.
pub struct HardSphere<P> {
    parameters: Arc<P>,
}

impl<P> HardSphere<P> {
    pub fn new(parameters: &Arc<P>) -> Self {
        Self {
            parameters: parameters.clone(),
        }
    }
}

impl<P: HardSphereProperties> HardSphere<P> {
    #[inline]
    pub fn helmholtz_energy<D: DualNum<f64> + Copy>(&self, state: &StateHD<D>) -> D {
        let p = &self.parameters;
        let zeta = p.zeta(state.temperature, &state.partial_density, [0, 1, 2, 3]);
        let frac_1mz3 = -(zeta[3] - 1.0).recip();
        let zeta_23 = p.zeta_23(state.temperature, &state.molefracs);
        state.volume * 6.0 / PI
            * (zeta[1] * zeta[2] * frac_1mz3 * 3.0
                + zeta[2].powi(2) * frac_1mz3.powi(2) * zeta_23
                + (zeta[2] * zeta_23.powi(2) - zeta[0]) * (zeta[3] * (-1.0)).ln_1p())
    }
}

impl<P> fmt::Display for HardSphere<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hard Sphere")
    }
}
