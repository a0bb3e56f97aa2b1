use super::monomer::{a1s_b_kl, k_hs, Properties};
use super::SaftGammaMieParameters;
use crate::saft_gamma_mie::parameters::mie_prefactor;
use despasito_core::StateHD;
use num_dual::{Dual, DualNum};

const PHI_GAMMA: [f64; 5] = [10.0, 10.0, 0.57, -6.7, -8.0];

/// Contact value of the hard-sphere radial distribution function
/// as function of $x_0=\sigma/d$.
fn g_dhs<D: DualNum<f64> + Copy>(zeta_x: D, x0: D) -> D {
    let z = zeta_x;
    let z2 = z * z;
    let z3 = z2 * z;
    let z4 = z2 * z2;
    let frac = (-z + 1.0).recip();
    let frac3 = frac.powi(3);
    let k0 = -(-z).ln_1p() + (z * 42.0 - z2 * 39.0 + z3 * 9.0 - z4 * 2.0) * frac3 / 6.0;
    let k1 = (z4 + z2 * 6.0 - z * 12.0) * frac3 * 0.5;
    let k2 = -z2 * 3.0 * frac.powi(2) / 8.0;
    let k3 = (-z4 + z2 * 3.0 + z * 3.0) * frac3 / 6.0;
    (k0 + k1 * x0 + k2 * x0.powi(2) + k3 * x0.powi(3)).exp()
}

/// Chain contribution
/// $\beta A^\mathrm{chain}=-\sum_iN_i\left(m_i-1\right)\ln g^\mathrm{Mie}_{ii}(\bar\sigma_{ii})$
/// evaluated with molecular averaged bead parameters.
pub(super) fn a_chain<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaMieParameters,
    properties: &Properties<D>,
    state: &StateHD<D>,
) -> D {
    let p = parameters;
    let m = p.segments.chain_length(&p.m);
    let sigma3 = p.segments.molecular_average(&p.m, &p.sigma_kl.mapv(|s| s.powi(3)));
    let epsilon = p.segments.molecular_average(&p.m, &p.epsilon_kl);
    let lr = p.segments.molecular_average(&p.m, &p.lr_kl);
    let la = p.segments.molecular_average(&p.m, &p.la_kl);
    let d3 = p.segments.molecular_average(&p.m, &properties.d3_kl);

    let t = state.temperature;
    let zeta_x = properties.zeta_x;
    let zeta_x_bar = properties.zeta_x_bar;
    // derivatives with respect to the packing fraction
    let zeta_dual = Dual::from_re(zeta_x).derivative();
    let k = k_hs(zeta_dual);

    let mut a = D::zero();
    for i in 0..m.len() {
        if m[i] == 1.0 {
            continue;
        }
        let (lr, la, eps) = (lr[i], la[i], epsilon[i]);
        let c = mie_prefactor(lr, la);
        let x0 = d3[i].cbrt().recip() * sigma3[i].cbrt();
        let x0_dual = Dual::from_re(x0);
        let b = |lambda: f64| a1s_b_kl(zeta_dual, x0_dual, lambda);
        let (b_la, b_lr) = (b(la), b(lr));
        let (b_2la, b_lalr, b_2lr) = (b(2.0 * la), b(la + lr), b(2.0 * lr));

        let g_hs = g_dhs(zeta_x, x0);

        let a_hat = b_la - b_lr;
        let g1 = (a_hat.re + zeta_x * a_hat.eps) * 3.0 * c - b_la.re * c * la + b_lr.re * c * lr;

        let kh = k * (b_2la - b_lalr * 2.0 + b_2lr);
        let c2 = c * c;
        let g2_mca = (kh.re + zeta_x * kh.eps) * 1.5 * c2 - k.re * b_2lr.re * c2 * lr
            + k.re * b_lalr.re * c2 * (la + lr)
            - k.re * b_2la.re * c2 * la;

        let alpha = c * (1.0 / (la - 3.0) - 1.0 / (lr - 3.0));
        let theta = (t.recip() * eps).exp_m1();
        let gamma_c = zeta_x_bar
            * theta
            * PHI_GAMMA[0]
            * (1.0 - (PHI_GAMMA[1] * (PHI_GAMMA[2] - alpha)).tanh())
            * (zeta_x_bar * PHI_GAMMA[3] + zeta_x_bar.powi(2) * PHI_GAMMA[4]).exp();
        let g2 = (gamma_c + 1.0) * g2_mca;

        let tau = t.recip() * eps;
        let g_mie = g_hs * (tau * g1 / g_hs + tau.powi(2) * g2 / g_hs).exp();
        a -= state.moles[i] * (m[i] - 1.0) * g_mie.ln();
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saft_gamma_mie::parameters::utils::{co2_h2o, ethane};
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn contact_value_at_zero_density() {
        assert_relative_eq!(g_dhs(0.0, 1.0), 1.0, max_relative = 1e-14);
        // close to the Carnahan-Starling contact value for x0 = 1
        let z: f64 = 0.3;
        let cs = (1.0 - 0.5 * z) / (1.0 - z).powi(3);
        assert_relative_eq!(g_dhs(z, 1.0), cs, max_relative = 5e-2);
    }

    #[test]
    fn ideal_gas_limit() {
        let p = ethane();
        let state = StateHD::new(300.0, 1e12, arr1(&[1.0]));
        let properties = Properties::new(&p, &state);
        assert_relative_eq!(a_chain(&p, &properties, &state), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn attractive_chain() {
        // the contact value exceeds one in a dense liquid and the chain term is negative
        let p = ethane();
        let state = StateHD::new(200.0, 100.0, arr1(&[1.0]));
        let properties = Properties::new(&p, &state);
        assert!(a_chain(&p, &properties, &state) < 0.0);
    }

    #[test]
    fn spherical_components() {
        // water consists of a single spherical segment and has no chain term
        let p = co2_h2o();
        let state = StateHD::new(300.0, 1000.0, arr1(&[0.0, 5.0]));
        let properties = Properties::new(&p, &state);
        assert_eq!(a_chain(&p, &properties, &state), 0.0);
    }
}
