use super::monomer::{g_cs, zeta_eff, zeta_eff_dlambda, Properties};
use super::SaftGammaSwParameters;
use crate::hard_sphere::HardSphereProperties;
use despasito_core::StateHD;
use num_dual::{Dual, DualNum};

/// First order term of the square-well contact value
/// $g_1=g^\mathrm{HS}(\zeta^\mathrm{eff})+(\lambda^3-1)\frac{\partial g^\mathrm{HS}}{\partial\zeta^\mathrm{eff}}\left(\frac{\lambda}{3}\frac{\partial\zeta^\mathrm{eff}}{\partial\lambda}-\zeta_x\frac{\partial\zeta^\mathrm{eff}}{\partial\zeta_x}\right)$
fn g1<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let z = zeta_eff(Dual::from_re(zeta_x).derivative(), lambda);
    let g = g_cs(Dual::from_re(z.re).derivative());
    g.re + g.eps
        * (lambda.powi(3) - 1.0)
        * (zeta_eff_dlambda(zeta_x, lambda) * lambda / 3.0 - zeta_x * z.eps)
}

/// Chain contribution
/// $\beta A^\mathrm{chain}=-\sum_iN_i\left(m_i-1\right)\ln g^\mathrm{SW}_{ii}(\bar\sigma_{ii})$
/// with $g^\mathrm{SW}=g^\mathrm{HS}+\beta\bar\varepsilon g_1$.
pub(super) fn a_chain<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaSwParameters,
    properties: &Properties<D>,
    state: &StateHD<D>,
) -> D {
    let p = parameters;
    let m = p.segments.chain_length(&p.m);
    let sigma3 = p.segments.molecular_average(&p.m, &p.sigma_kl.mapv(|s| s.powi(3)));
    let epsilon = p.segments.molecular_average(&p.m, &p.epsilon_kl);
    let lambda = p.segments.molecular_average(&p.m, &p.lambda_kl);

    let mut a = D::zero();
    for i in 0..m.len() {
        if m[i] == 1.0 {
            continue;
        }
        let sigma = D::from(sigma3[i].cbrt());
        let g_hs = p.g_hs(sigma, sigma, properties.zeta2, properties.zeta3);
        let g_sw = g_hs + state.temperature.recip() * epsilon[i] * g1(properties.zeta_x, lambda[i]);
        a -= state.moles[i] * (m[i] - 1.0) * g_sw.ln();
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saft_gamma_sw::parameters::utils::{butane, butane_water};
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn contact_value_at_zero_density() {
        assert_relative_eq!(g1(0.0, 1.5), 1.0, max_relative = 1e-14);
    }

    #[test]
    fn zero_density_limit() {
        // the square-well contact value approaches 1 + ε/T instead of 1
        let p = butane();
        let state = StateHD::new(300.0, 1e12, arr1(&[1.0]));
        let properties = Properties::new(&p, &state);
        let epsilon = p.segments.molecular_average(&p.m, &p.epsilon_kl)[0];
        assert_relative_eq!(
            a_chain(&p, &properties, &state),
            -(1.0 + epsilon / 300.0).ln(),
            max_relative = 1e-8
        );
    }

    #[test]
    fn attractive_chain() {
        let p = butane();
        let state = StateHD::new(250.0, 200.0, arr1(&[1.0]));
        let properties = Properties::new(&p, &state);
        assert!(a_chain(&p, &properties, &state) < 0.0);
    }

    #[test]
    fn spherical_components() {
        let p = butane_water();
        let state = StateHD::new(300.0, 1000.0, arr1(&[0.0, 5.0]));
        let properties = Properties::new(&p, &state);
        assert_eq!(a_chain(&p, &properties, &state), 0.0);
    }
}
