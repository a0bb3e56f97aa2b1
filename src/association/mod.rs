//! Generic implementation of the SAFT association contribution
//! that can be used across group-contribution models.
use despasito_core::parameter::{BeadRecord, BinaryBeadRecord, BondRecord};
use despasito_core::{EosError, EosResult, StateHD};
use ndarray::*;
use num_dual::linalg::{norm, LU};
use num_dual::*;
use std::fmt;
use std::sync::Arc;

/// Å³ per m³
const ANGSTROM3: f64 = 1e30;

/// One type of association site on one segment.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationSite {
    /// Index of the component the site is on.
    pub component: usize,
    /// Index of the bead type the site is on.
    pub bead: usize,
    /// Name of the site type.
    pub name: String,
    /// Number of sites per molecule, $\nu_{ik}n_{k,a}$.
    pub n: f64,
}

/// Parameter set required for the SAFT association Helmholtz energy
/// contribution.
#[derive(Clone, Debug)]
pub struct AssociationParameters {
    pub sites: Vec<AssociationSite>,
    /// Bonding volumes between sites in units of Å³.
    pub kappa: Array2<f64>,
    /// Association energies between sites in units of Kelvin.
    pub epsilon_hb: Array2<f64>,
}

fn find_bond<'a>(bonds: &'a [BondRecord], a: &str, b: &str) -> Option<&'a BondRecord> {
    bonds
        .iter()
        .find(|r| (r.site1 == a && r.site2 == b) || (r.site1 == b && r.site2 == a))
}

/// Association energy and bonding volume between site `a` on bead `k`
/// and site `b` on bead `l`.
///
/// Explicit cross parameters take precedence. Otherwise unlike beads
/// that both carry the bond are combined with the geometric mean of
/// the energies and the cubic mean of the bonding volumes.
fn bond_parameters<M, B>(
    beads: &[BeadRecord<M>],
    binary_records: &[BinaryBeadRecord<B>],
    (k, a): (usize, &str),
    (l, b): (usize, &str),
) -> Option<(f64, f64)> {
    if k == l {
        return find_bond(&beads[k].bonds, a, b).map(|r| (r.epsilon, r.kappa));
    }
    let (id_k, id_l) = (&beads[k].identifier, &beads[l].identifier);
    let explicit = binary_records.iter().find_map(|r| {
        if &r.id1 == id_k && &r.id2 == id_l {
            r.bonds.iter().find(|r| r.site1 == a && r.site2 == b)
        } else if &r.id1 == id_l && &r.id2 == id_k {
            r.bonds.iter().find(|r| r.site1 == b && r.site2 == a)
        } else {
            None
        }
    });
    if let Some(r) = explicit {
        return Some((r.epsilon, r.kappa));
    }
    let bond_k = find_bond(&beads[k].bonds, a, b)?;
    let bond_l = find_bond(&beads[l].bonds, a, b)?;
    Some((
        (bond_k.epsilon * bond_l.epsilon).sqrt(),
        ((bond_k.kappa.cbrt() + bond_l.kappa.cbrt()) * 0.5).powi(3),
    ))
}

impl AssociationParameters {
    /// Collect the association sites of all segments.
    ///
    /// Segments are given by the component and bead index of every
    /// segment together with the number of beads on the component.
    /// Sites that cannot bond to any other site are dropped.
    pub fn new<M, B>(
        component_index: &Array1<usize>,
        bead_index: &Array1<usize>,
        bead_count: &Array1<f64>,
        bead_records: &[BeadRecord<M>],
        binary_records: &[BinaryBeadRecord<B>],
    ) -> Self {
        let mut sites = Vec::new();
        for ((&i, &k), &nu) in component_index.iter().zip(bead_index).zip(bead_count) {
            for site in bead_records[k].sites.iter().filter(|s| s.n > 0.0) {
                sites.push(AssociationSite {
                    component: i,
                    bead: k,
                    name: site.name.clone(),
                    n: nu * site.n,
                });
            }
        }

        let bond = |s: &AssociationSite, t: &AssociationSite| {
            bond_parameters(
                bead_records,
                binary_records,
                (s.bead, s.name.as_str()),
                (t.bead, t.name.as_str()),
            )
        };
        let active: Vec<_> = sites
            .iter()
            .filter(|&s| sites.iter().any(|t| bond(s, t).is_some()))
            .cloned()
            .collect();

        let n = active.len();
        let mut kappa = Array2::zeros([n; 2]);
        let mut epsilon_hb = Array2::zeros([n; 2]);
        for (s, site_s) in active.iter().enumerate() {
            for (t, site_t) in active.iter().enumerate() {
                if let Some((epsilon, k)) = bond(site_s, site_t) {
                    epsilon_hb[[s, t]] = epsilon;
                    kappa[[s, t]] = k * ANGSTROM3;
                }
            }
        }

        Self {
            sites: active,
            kappa,
            epsilon_hb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl fmt::Display for AssociationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationParameters(sites=[")?;
        for (i, s) in self.sites.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}:{}={}", s.component, s.bead, s.name, s.n)?;
        }
        write!(f, "], epsilon_hb={}, kappa={})", self.epsilon_hb, self.kappa)
    }
}

/// Implementation of the SAFT association Helmholtz energy contribution.
///
/// The association strength between two sites is
/// $\Delta_{st}=\left(e^{\varepsilon_{st}/T}-1\right)K_{st}I_{kl}$
/// where the kernel $I_{kl}$ depends on the bead types of the sites
/// and is provided by the model.
pub struct Association {
    association_parameters: Arc<AssociationParameters>,
    max_iter: usize,
    tol: f64,
}

impl Association {
    pub fn new(association_parameters: &AssociationParameters, max_iter: usize, tol: f64) -> Self {
        Self {
            association_parameters: Arc::new(association_parameters.clone()),
            max_iter,
            tol,
        }
    }

    fn association_strength<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        kernel: &Array2<D>,
    ) -> Array2<D> {
        let p = &self.association_parameters;
        let n = p.sites.len();
        Array2::from_shape_fn([n; 2], |(s, t)| {
            if p.kappa[(s, t)] == 0.0 {
                return D::zero();
            }
            kernel[(p.sites[s].bead, p.sites[t].bead)]
                * p.kappa[(s, t)]
                * (temperature.recip() * p.epsilon_hb[(s, t)]).exp_m1()
        })
    }

    /// Site densities $\rho_in_s$ in units of Å⁻³.
    fn site_densities<D: DualNum<f64> + Copy>(&self, state: &StateHD<D>) -> Array1<D> {
        self.association_parameters
            .sites
            .iter()
            .map(|s| state.partial_density[s.component] * s.n)
            .collect()
    }

    /// Helmholtz energy for the kernel $I_{kl}$ of all pairs of bead types.
    #[inline]
    pub fn helmholtz_energy<D: DualNum<f64> + Copy>(
        &self,
        state: &StateHD<D>,
        kernel: &Array2<D>,
    ) -> D {
        if self.association_parameters.is_empty() {
            return D::zero();
        }
        let delta = self.association_strength(state.temperature, kernel);
        let rho = self.site_densities(state);
        Self::helmholtz_energy_density(&rho, &delta, self.max_iter, self.tol, None)
            .unwrap_or_else(|_| D::from(f64::NAN))
            * state.volume
    }

    /// Fraction of non-bonded sites of every site type.
    pub fn site_fractions(
        &self,
        state: &StateHD<f64>,
        kernel: &Array2<f64>,
    ) -> EosResult<Array1<f64>> {
        let n = self.association_parameters.sites.len();
        let mut x = Array::from_elem(n, 0.2);
        if n > 0 {
            let delta = self.association_strength(state.temperature, kernel);
            let rho = self.site_densities(state);
            Self::helmholtz_energy_density(&rho, &delta, self.max_iter, self.tol, Some(&mut x))?;
        }
        Ok(x)
    }

    fn helmholtz_energy_density<D: DualNum<f64> + Copy, S: Data<Elem = D>>(
        rho: &ArrayBase<S, Ix1>,
        delta: &Array2<D>,
        max_iter: usize,
        tol: f64,
        x0: Option<&mut Array1<f64>>,
    ) -> EosResult<D> {
        // check if density is close to 0
        if rho.sum().re() < f64::EPSILON {
            if let Some(x0) = x0 {
                x0.fill(1.0);
            }
            return Ok(D::zero());
        }

        // initialize monomer fraction
        let mut x = match &x0 {
            Some(x0) => (*x0).clone(),
            None => Array::from_elem(rho.len(), 0.2),
        };

        let delta_re = delta.map(D::re);
        let rho_re = rho.map(D::re);
        for k in 0..max_iter {
            if Self::newton_step(&mut x, &delta_re, &rho_re, tol)? {
                break;
            }
            if k == max_iter - 1 {
                return Err(EosError::NotConverged("Association".into()));
            }
        }

        // calculate derivatives
        let mut x_dual = x.mapv(D::from);
        for _ in 0..D::NDERIV {
            Self::newton_step(&mut x_dual, delta, rho, tol)?;
        }

        // save monomer fraction
        if let Some(x0) = x0 {
            *x0 = x;
        }

        // Helmholtz energy density
        let f = |x: D| x.ln() - x * 0.5 + 0.5;
        Ok((rho * x_dual.mapv(f)).sum())
    }

    fn newton_step<D: DualNum<f64> + Copy, S: Data<Elem = D>>(
        x: &mut Array1<D>,
        delta: &Array2<D>,
        rho: &ArrayBase<S, Ix1>,
        tol: f64,
    ) -> EosResult<bool> {
        let nassoc = x.len();
        // gradient
        let mut g = x.map(D::recip);
        // Hessian
        let mut h: Array2<D> = Array::zeros([nassoc; 2]);

        for i in 0..nassoc {
            let d = delta.index_axis(Axis(0), i);
            let dnx = (&*x * rho * &d).sum() + 1.0;
            g[i] -= dnx;

            // approximate hessian
            h[(i, i)] = -dnx / x[i];
            for j in 0..nassoc {
                h[(i, j)] -= d[j] * rho[j];
            }
        }

        // Newton step
        // avoid stepping to negative values for x (see Michelsen 2006)
        let delta_x = LU::new(h)?.solve(&g);
        Zip::from(x).and(&delta_x).for_each(|x, &delta_x| {
            if delta_x.re() < x.re() * 0.8 {
                *x -= delta_x
            } else {
                *x *= 0.2
            }
        });

        // check convergence
        Ok(norm(&g.map(D::re)) < tol)
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Association")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use despasito_core::parameter::AssociationSiteRecord;
    use num_dual::Dual64;

    fn site(name: &str, n: f64) -> AssociationSiteRecord {
        AssociationSiteRecord {
            name: name.into(),
            n,
        }
    }

    fn bond(site1: &str, site2: &str, epsilon: f64, kappa: f64) -> BondRecord {
        BondRecord {
            site1: site1.into(),
            site2: site2.into(),
            epsilon,
            kappa,
        }
    }

    fn water() -> BeadRecord<()> {
        let mut record = BeadRecord::new("H2O".into(), 0.018015, ());
        record.sites = vec![site("H", 2.0), site("e1", 2.0)];
        record.bonds = vec![bond("H", "e1", 1985.4, 1.0169e-28)];
        record
    }

    fn carbon_dioxide() -> BeadRecord<()> {
        let mut record = BeadRecord::new("CO2".into(), 0.04401, ());
        record.sites = vec![site("H", 1.0), site("a1", 1.0)];
        record
    }

    fn water_only() -> AssociationParameters {
        AssociationParameters::new::<(), ()>(
            &arr1(&[0]),
            &arr1(&[0]),
            &arr1(&[1.0]),
            &[water()],
            &[],
        )
    }

    #[test]
    fn sites_and_bonds() {
        let beads = vec![carbon_dioxide(), water()];
        let mut cross = BinaryBeadRecord::<()>::new("CO2".into(), "H2O".into(), None);
        cross.bonds = vec![bond("H", "e1", 2200.0, 9.1419e-29)];
        let p = AssociationParameters::new(
            &arr1(&[0, 1]),
            &arr1(&[0, 1]),
            &arr1(&[1.0, 1.0]),
            &beads,
            &[cross],
        );
        // the a1 site of CO2 has no partner
        let names: Vec<_> = p.sites.iter().map(|s| (s.bead, s.name.as_str())).collect();
        assert_eq!(names, vec![(0, "H"), (1, "H"), (1, "e1")]);
        assert_relative_eq!(p.epsilon_hb[[0, 2]], 2200.0);
        assert_relative_eq!(p.epsilon_hb[[2, 0]], 2200.0);
        assert_relative_eq!(p.kappa[[0, 2]], 91.419, max_relative = 1e-12);
        assert_relative_eq!(p.epsilon_hb[[1, 2]], 1985.4);
        assert_eq!(p.epsilon_hb[[0, 1]], 0.0);
        assert_eq!(p.epsilon_hb[[1, 1]], 0.0);
    }

    #[test]
    fn combining_rules() {
        let mut other = water();
        other.identifier = "OH".into();
        other.bonds = vec![bond("e1", "H", 2500.0, 8e-29)];
        let beads = vec![water(), other];
        let p = AssociationParameters::new::<(), ()>(
            &arr1(&[0, 1]),
            &arr1(&[0, 1]),
            &arr1(&[1.0, 1.0]),
            &beads,
            &[],
        );
        assert_eq!(p.sites.len(), 4);
        assert_relative_eq!(p.epsilon_hb[[0, 3]], (1985.4f64 * 2500.0).sqrt());
        let kappa = ((101.69f64.cbrt() + 80f64.cbrt()) * 0.5).powi(3);
        assert_relative_eq!(p.kappa[[0, 3]], kappa, max_relative = 1e-10);
    }

    #[test]
    fn mass_action_two_sites() -> EosResult<()> {
        // symmetric two-site molecule: X = (sqrt(1 + 4 rho n delta) - 1) / (2 rho n delta)
        let assoc = Association::new(&water_only(), 50, 1e-10);
        let (t, v, n) = (350.0, 1000.0, 20.0);
        let state = StateHD::new(t, v, arr1(&[n]));
        let kernel = Array2::from_elem([1, 1], 1.3);
        let x = assoc.site_fractions(&state, &kernel)?;
        let delta = (1985.4f64 / t).exp_m1() * 101.69 * 1.3;
        let rd = n / v * 2.0 * delta;
        let x_analytic = ((1.0 + 4.0 * rd).sqrt() - 1.0) / (2.0 * rd);
        assert_relative_eq!(x[0], x_analytic, max_relative = 1e-8);
        assert_relative_eq!(x[1], x_analytic, max_relative = 1e-8);

        let f = 4.0 * (x_analytic.ln() - 0.5 * x_analytic + 0.5);
        assert_relative_eq!(
            assoc.helmholtz_energy(&state, &kernel),
            n * f,
            max_relative = 1e-8
        );
        Ok(())
    }

    #[test]
    fn pressure_from_dual_numbers() {
        let assoc = Association::new(&water_only(), 50, 1e-10);
        let (t, v, n) = (350.0, 1000.0, 20.0);
        let state = StateHD::new(
            Dual64::from(t),
            Dual64::from(v).derivative(),
            arr1(&[Dual64::from(n)]),
        );
        let a = assoc.helmholtz_energy(&state, &Array2::from_elem([1, 1], Dual64::from(1.3)));
        let kernel = Array2::from_elem([1, 1], 1.3);
        let h = 1e-4;
        let ap = assoc.helmholtz_energy(&StateHD::new(t, v + h, arr1(&[n])), &kernel);
        let am = assoc.helmholtz_energy(&StateHD::new(t, v - h, arr1(&[n])), &kernel);
        assert_relative_eq!(a.eps, (ap - am) / (2.0 * h), max_relative = 1e-5);
    }

    #[test]
    fn no_sites() {
        let p = AssociationParameters::new::<(), ()>(
            &arr1(&[0]),
            &arr1(&[0]),
            &arr1(&[1.0]),
            &[carbon_dioxide()],
            &[],
        );
        assert!(p.is_empty());
        let assoc = Association::new(&p, 50, 1e-10);
        let state = StateHD::new(300.0, 1000.0, arr1(&[20.0]));
        assert_eq!(assoc.helmholtz_energy(&state, &Array2::ones([1, 1])), 0.0);
    }
}
