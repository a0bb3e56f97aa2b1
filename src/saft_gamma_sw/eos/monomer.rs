use super::SaftGammaSwParameters;
use crate::hard_sphere::HardSphereProperties;
use despasito_core::StateHD;
use itertools::Itertools;
use ndarray::Array1;
use num_dual::{Dual, DualNum};
use std::f64::consts::{FRAC_PI_6, PI};

/// Coefficients of the effective packing fraction of the square-well potential
/// (Gil-Villegas et al., 1997).
const M: [[f64; 3]; 3] = [
    [2.25855, -1.50349, 0.249434],
    [-0.669270, 1.40049, -0.827739],
    [10.1576, -15.0427, 5.30827],
];

/// State dependent quantities shared by the dispersion, chain and
/// association terms.
pub(super) struct Properties<D> {
    pub m_mean: D,
    pub xs: Array1<D>,
    /// Segment density $\rho_s$ in units of Å⁻³
    pub segment_density: D,
    /// Packing fraction $\zeta_x$ of the mixture
    pub zeta_x: D,
    pub zeta2: D,
    pub zeta3: D,
}

impl<D: DualNum<f64> + Copy> Properties<D> {
    pub fn new(parameters: &SaftGammaSwParameters, state: &StateHD<D>) -> Self {
        let p = parameters;
        let n = p.sigma.len();
        let (m_mean, xs) = p.segments.segment_fractions(&p.m, &state.molefracs);
        let segment_density = state.partial_density.sum() * m_mean;
        let zeta_x = (0..n)
            .cartesian_product(0..n)
            .fold(D::zero(), |z, (k, l)| {
                z + xs[k] * xs[l] * p.sigma_kl[[k, l]].powi(3)
            })
            * segment_density
            * FRAC_PI_6;
        let [zeta2, zeta3] = p.zeta(state.temperature, &state.partial_density, [2, 3]);
        Self {
            m_mean,
            xs,
            segment_density,
            zeta_x,
            zeta2,
            zeta3,
        }
    }
}

fn coefficients(lambda: f64) -> [f64; 3] {
    M.map(|m| m[0] + m[1] * lambda + m[2] * lambda * lambda)
}

/// Effective packing fraction $\zeta^\mathrm{eff}(\zeta_x,\lambda)$
pub(super) fn zeta_eff<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let c = coefficients(lambda);
    zeta_x * c[0] + zeta_x.powi(2) * c[1] + zeta_x.powi(3) * c[2]
}

/// Derivative of the effective packing fraction with respect to $\lambda$
pub(super) fn zeta_eff_dlambda<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let c = M.map(|m| m[1] + 2.0 * m[2] * lambda);
    zeta_x * c[0] + zeta_x.powi(2) * c[1] + zeta_x.powi(3) * c[2]
}

/// Carnahan-Starling contact value of the hard-sphere pair distribution function
pub(super) fn g_cs<D: DualNum<f64> + Copy>(eta: D) -> D {
    (-eta * 0.5 + 1.0) / (-eta + 1.0).powi(3)
}

/// Integrated mean-field attraction $\alpha_{kl}=\frac{2\pi}{3}\varepsilon_{kl}\sigma_{kl}^3(\lambda_{kl}^3-1)$
pub(super) fn van_der_waals_alpha(sigma: f64, epsilon: f64, lambda: f64) -> f64 {
    2.0 * PI / 3.0 * epsilon * sigma.powi(3) * (lambda.powi(3) - 1.0)
}

/// Percus-Yevick isothermal compressibility of the hard-sphere reference
pub(super) fn k_hs<D: DualNum<f64> + Copy>(zeta_x: D) -> D {
    (-zeta_x + 1.0).powi(4) / (zeta_x * 4.0 + zeta_x.powi(2) * 4.0 + 1.0)
}

/// Perturbation terms $a_1/T$ and $a_2/T^2$ per segment.
///
/// $a_{1,kl}=-\rho_s\alpha_{kl}g^\mathrm{HS}(\zeta^\mathrm{eff})$ and
/// $a_{2,kl}=\frac{1}{2}K^\mathrm{HS}\varepsilon_{kl}\rho_s\frac{\partial a_{1,kl}}{\partial\rho_s}$.
pub(super) fn dispersion_perturbations<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaSwParameters,
    properties: &Properties<D>,
    temperature: D,
) -> [D; 2] {
    let p = parameters;
    let n = p.sigma.len();
    let rho_s = properties.segment_density;
    let zeta_x = properties.zeta_x;
    let zeta_dual = Dual::from_re(zeta_x).derivative();

    let mut a1 = D::zero();
    let mut a2 = D::zero();
    for k in 0..n {
        for l in k..n {
            let xx = properties.xs[k] * properties.xs[l] * if k == l { 1.0 } else { 2.0 };
            let (eps, lambda) = (p.epsilon_kl[[k, l]], p.lambda_kl[[k, l]]);
            let alpha = van_der_waals_alpha(p.sigma_kl[[k, l]], eps, lambda);
            // a1 divided by the segment density
            let a1_rho = -g_cs(zeta_eff(zeta_dual, lambda)) * alpha;
            a1 += xx * rho_s * a1_rho.re;
            a2 += xx * rho_s * (a1_rho.re + zeta_x * a1_rho.eps) * eps;
        }
    }
    [
        a1 / temperature,
        a2 * k_hs(zeta_x) * 0.5 / temperature.powi(2),
    ]
}

/// Dispersion contribution $\beta A^\mathrm{disp}=N\bar m\left(\frac{a_1}{kT}+\frac{a_2}{(kT)^2}\right)$
pub(super) fn a_disp<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaSwParameters,
    properties: &Properties<D>,
    state: &StateHD<D>,
) -> D {
    let [a1, a2] = dispersion_perturbations(parameters, properties, state.temperature);
    state.moles.sum() * properties.m_mean * (a1 + a2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saft_gamma_sw::parameters::utils::butane;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn mean_field_limit() {
        let p = butane();
        let state = StateHD::new(300.0, 1e12, arr1(&[1.0]));
        let properties = Properties::new(&p, &state);
        let [a1, _] = dispersion_perturbations(&p, &properties, 300.0);
        let xs = &properties.xs;
        let alpha = |k: usize, l: usize| {
            van_der_waals_alpha(p.sigma_kl[[k, l]], p.epsilon_kl[[k, l]], p.lambda_kl[[k, l]])
        };
        let alpha = xs[0] * xs[0] * alpha(0, 0)
            + 2.0 * xs[0] * xs[1] * alpha(0, 1)
            + xs[1] * xs[1] * alpha(1, 1);
        assert_relative_eq!(
            a1 / properties.segment_density,
            -alpha / 300.0,
            max_relative = 1e-8
        );
    }

    #[test]
    fn effective_packing_fraction() {
        assert_eq!(zeta_eff(0.0, 1.5), 0.0);
        let c = coefficients(1.5);
        let z: f64 = 0.3;
        let h = 1e-6;
        let fd = (zeta_eff(z, 1.5 + h) - zeta_eff(z, 1.5 - h)) / (2.0 * h);
        assert_relative_eq!(zeta_eff_dlambda(z, 1.5), fd, max_relative = 1e-6);
        assert_relative_eq!(
            zeta_eff(z, 1.5),
            c[0] * z + c[1] * z * z + c[2] * z.powi(3),
            max_relative = 1e-14
        );
    }

    #[test]
    fn second_order_is_attractive() {
        let p = butane();
        let state = StateHD::new(300.0, 400.0, arr1(&[1.0]));
        let properties = Properties::new(&p, &state);
        let [a1, a2] = dispersion_perturbations(&p, &properties, 300.0);
        assert!(a1 < 0.0);
        assert!(a2 < 0.0);
        assert_relative_eq!(k_hs(0.0), 1.0);
    }
}
