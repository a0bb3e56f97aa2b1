use super::SaftGammaMieParameters;
use despasito_core::StateHD;
use itertools::Itertools;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use std::f64::consts::{FRAC_PI_6, PI};

const C: [[f64; 4]; 4] = [
    [0.81096, 1.7888, -37.578, 92.284],
    [1.0205, -19.341, 151.26, -463.50],
    [-1.9057, 22.845, -228.14, 973.92],
    [1.0885, -6.1962, 106.98, -677.64],
];

const PHI: [[f64; 7]; 6] = [
    [
        7.5365557, -37.60463, 71.745953, -46.83552, -2.467982, -0.50272, 8.0956883,
    ],
    [-359.44, 1825.6, -3168.0, 1884.2, -0.82376, -3.1935, 3.709],
    [1550.9, -5070.1, 6534.6, -3288.7, -2.7171, 2.0883, 0.0],
    [
        -1.19932, 9.063632, -17.9482, 11.34027, 20.52142, -56.6377, 40.53683,
    ],
    [
        -1911.28, 21390.175, -51320.7, 37064.54, 1103.742, -3264.61, 2556.181,
    ],
    [
        9236.9, -129430.0, 357230.0, -315530.0, 1390.2, -4518.2, 4241.6,
    ],
];

/// State dependent quantities shared by the dispersion, chain and
/// association terms.
///
/// Pair properties are stored for bead types, not segments.
pub(super) struct Properties<D> {
    /// Mean number of segments $\bar m$
    pub m_mean: D,
    /// Segment fractions $x_{s,k}$ of every bead type
    pub xs: Array1<D>,
    /// Segment density $\rho_s$ in units of Å⁻³
    pub segment_density: D,
    pub d3_kl: Array2<D>,
    pub x0_kl: Array2<D>,
    /// Packing fraction $\zeta_x$ of the mixture
    pub zeta_x: D,
    /// Packing fraction $\bar\zeta_x$ evaluated with $\sigma_{kl}$
    pub zeta_x_bar: D,
}

impl<D: DualNum<f64> + Copy> Properties<D> {
    pub fn new(parameters: &SaftGammaMieParameters, state: &StateHD<D>) -> Self {
        let p = parameters;
        let n = p.sigma.len();
        let (m_mean, xs) = p.segments.segment_fractions(&p.m, &state.molefracs);
        let segment_density = state.partial_density.sum() * m_mean;

        let d = p.bead_diameter(state.temperature);
        let d_kl = Array2::from_shape_fn((n, n), |(k, l)| (d[k] + d[l]) * 0.5);
        let d3_kl = d_kl.mapv(|d| d.powi(3));
        let x0_kl = Array2::from_shape_fn((n, n), |(k, l)| {
            d_kl[[k, l]].recip() * p.sigma_kl[[k, l]]
        });

        let (zeta_x, zeta_x_bar) = (0..n).cartesian_product(0..n).fold(
            (D::zero(), D::zero()),
            |(z, zb), (k, l)| {
                let xx = xs[k] * xs[l];
                (z + xx * d3_kl[[k, l]], zb + xx * p.sigma_kl[[k, l]].powi(3))
            },
        );
        Self {
            m_mean,
            xs,
            segment_density,
            d3_kl,
            x0_kl,
            zeta_x: zeta_x * segment_density * FRAC_PI_6,
            zeta_x_bar: zeta_x_bar * segment_density * FRAC_PI_6,
        }
    }
}

/// Effective packing fraction of the Sutherland potential.
fn zeta_eff<D: DualNum<f64> + Copy>(zeta: D, lambda: f64) -> D {
    let li = 1. / lambda;
    let li2 = li * li;
    let li3 = li * li2;
    let c = C.map(|c| li * c[1] + li2 * c[2] + li3 * c[3] + c[0]);
    zeta * c[0] + zeta.powi(2) * c[1] + zeta.powi(3) * c[2] + zeta.powi(4) * c[3]
}

fn f(k: usize, c: f64, lr: f64, la: f64) -> f64 {
    let alpha = c * (1.0 / (la - 3.0) - 1.0 / (lr - 3.0));
    let alpha2 = alpha * alpha;
    let alpha3 = alpha * alpha2;
    let phi = PHI[k];
    (alpha * phi[1] + alpha2 * phi[2] + alpha3 * phi[3] + phi[0])
        / (alpha * phi[4] + alpha2 * phi[5] + alpha3 * phi[6] + 1.0)
}

/// Sutherland term divided by $2\pi\rho_sd_{kl}^3\varepsilon_{kl}$
fn a1s_kl<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let zeta_eff = zeta_eff(zeta_x, lambda);
    -(-zeta_eff * 0.5 + 1.0) / ((-zeta_eff + 1.0).powi(3) * (lambda - 3.0))
}

/// B term divided by $2\pi\rho_sd_{kl}^3\varepsilon_{kl}$
fn b_kl<D: DualNum<f64> + Copy>(zeta_x: D, x0: D, lambda: f64) -> D {
    let i = -(x0.powf(3.0 - lambda) - 1.0) / (lambda - 3.0);
    let j =
        -(x0.powf(4.0 - lambda) * (lambda - 3.0) - x0.powf(3.0 - lambda) * (lambda - 4.0) - 1.0)
            / ((lambda - 3.0) * (lambda - 4.0));
    ((-zeta_x * 0.5 + 1.0) * i - zeta_x * (zeta_x + 1.0) * 4.5 * j) / (-zeta_x + 1.0).powi(3)
}

/// $x_0^\lambda\left(a_1^S+B\right)$ without the prefactor $2\pi\rho_sd^3\varepsilon$
pub(super) fn a1s_b_kl<D: DualNum<f64> + Copy>(zeta_x: D, x0: D, lambda: f64) -> D {
    x0.powf(lambda) * (a1s_kl(zeta_x, lambda) + b_kl(zeta_x, x0, lambda))
}

/// Isothermal compressibility of the hard-sphere reference
pub(super) fn k_hs<D: DualNum<f64> + Copy>(zeta_x: D) -> D {
    (zeta_x - 1.0).powi(4)
        / ((zeta_x + zeta_x.powi(2) - zeta_x.powi(3)) * 4.0 + zeta_x.powi(4) + 1.0)
}

fn a1_kl<D: DualNum<f64> + Copy>(
    rho_s: D,
    zeta_x: D,
    x0: D,
    d3: D,
    c: f64,
    lr: f64,
    la: f64,
    epsilon_k: f64,
) -> D {
    (rho_s * 2.0 * PI * d3 * epsilon_k * c) * (a1s_b_kl(zeta_x, x0, la) - a1s_b_kl(zeta_x, x0, lr))
}

fn a2_kl<D: DualNum<f64> + Copy>(
    rho_s: D,
    zeta_x: D,
    zeta_x_bar: D,
    x0: D,
    d3: D,
    c: f64,
    lr: f64,
    la: f64,
    epsilon_k: f64,
) -> D {
    let chi = zeta_x_bar * f(0, c, lr, la)
        + zeta_x_bar.powi(5) * f(1, c, lr, la)
        + zeta_x_bar.powi(8) * f(2, c, lr, la);
    ((chi + 1.0) * rho_s * PI * 2.0 * d3 * epsilon_k.powi(2) * c.powi(2))
        * (a1s_b_kl(zeta_x, x0, 2.0 * la) - a1s_b_kl(zeta_x, x0, lr + la) * 2.0
            + a1s_b_kl(zeta_x, x0, 2.0 * lr))
}

fn a3_kl<D: DualNum<f64> + Copy>(zeta_x_bar: D, c: f64, lr: f64, la: f64, epsilon_k: f64) -> D {
    -zeta_x_bar
        * f(3, c, lr, la)
        * (zeta_x_bar * f(4, c, lr, la) + zeta_x_bar.powi(2) * f(5, c, lr, la)).exp()
        * epsilon_k.powi(3)
}

/// Perturbation terms $a_1/T$, $a_2/T^2$ and $a_3/T^3$ per segment.
pub(super) fn dispersion_perturbations<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaMieParameters,
    properties: &Properties<D>,
    temperature: D,
) -> [D; 3] {
    let p = parameters;
    let n = p.sigma.len();
    let Properties {
        xs,
        segment_density: rho_s,
        d3_kl,
        x0_kl,
        zeta_x,
        zeta_x_bar,
        ..
    } = properties;

    let mut a1 = D::zero();
    let mut a2 = D::zero();
    let mut a3 = D::zero();
    for k in 0..n {
        for l in k..n {
            let xx = xs[k] * xs[l] * if k == l { 1.0 } else { 2.0 };
            let (c, lr, la, eps) = (
                p.c_kl[[k, l]],
                p.lr_kl[[k, l]],
                p.la_kl[[k, l]],
                p.epsilon_kl[[k, l]],
            );
            let (x0, d3) = (x0_kl[[k, l]], d3_kl[[k, l]]);
            a1 += xx * a1_kl(*rho_s, *zeta_x, x0, d3, c, lr, la, eps);
            a2 += xx * a2_kl(*rho_s, *zeta_x, *zeta_x_bar, x0, d3, c, lr, la, eps);
            a3 += xx * a3_kl(*zeta_x_bar, c, lr, la, eps);
        }
    }
    [
        a1 / temperature,
        a2 * k_hs(*zeta_x) * 0.5 / temperature.powi(2),
        a3 / temperature.powi(3),
    ]
}

/// Dispersion contribution $\beta A^\mathrm{disp}=N\bar m\left(\frac{a_1}{kT}+\frac{a_2}{(kT)^2}+\frac{a_3}{(kT)^3}\right)$
pub(super) fn a_disp<D: DualNum<f64> + Copy>(
    parameters: &SaftGammaMieParameters,
    properties: &Properties<D>,
    state: &StateHD<D>,
) -> D {
    let [a1, a2, a3] = dispersion_perturbations(parameters, properties, state.temperature);
    state.moles.sum() * properties.m_mean * (a1 + a2 + a3)
}
