//! Segment bookkeeping shared by the group-contribution models.
use despasito_core::parameter::{BeadRecord, ComponentRecord, ParameterError};
use ndarray::{Array1, Array2};
use num_dual::DualNum;

/// The beads that make up every component.
///
/// One segment is one bead type on one component, together with
/// the number of beads of that type on the component.
#[derive(Clone, Debug)]
pub struct BeadSegments {
    /// For every segment, the index of the component that it is on.
    pub component_index: Array1<usize>,
    /// For every segment, the index of its bead type.
    pub bead_index: Array1<usize>,
    /// For every segment, the number of beads $\nu_{ik}$.
    pub count: Array1<f64>,
    /// Molar weight of every component in kg/mol.
    pub molarweight: Array1<f64>,
    /// Number of bead types.
    pub beads: usize,
}

impl BeadSegments {
    pub fn new<M>(
        components: &[ComponentRecord],
        bead_records: &[BeadRecord<M>],
    ) -> Result<Self, ParameterError> {
        let mut component_index = Vec::new();
        let mut bead_index = Vec::new();
        let mut count = Vec::new();
        let mut molarweight = Array1::zeros(components.len());
        for (i, component) in components.iter().enumerate() {
            for (bead, &n) in component.beads.iter() {
                let k = bead_records
                    .iter()
                    .position(|r| &r.identifier == bead)
                    .ok_or_else(|| ParameterError::ComponentsNotFound(bead.clone()))?;
                component_index.push(i);
                bead_index.push(k);
                count.push(n);
                molarweight[i] += n * bead_records[k].molarweight;
            }
        }
        Ok(Self {
            component_index: Array1::from_vec(component_index),
            bead_index: Array1::from_vec(bead_index),
            count: Array1::from_vec(count),
            molarweight,
            beads: bead_records.len(),
        })
    }

    /// The geometry coefficients $\nu_{ik}v_kS_k$ of every segment.
    pub fn geometry_coefficients(&self, vks: &Array1<f64>, sk: &Array1<f64>) -> Array1<f64> {
        Array1::from_shape_fn(self.count.len(), |s| {
            let k = self.bead_index[s];
            self.count[s] * vks[k] * sk[k]
        })
    }

    /// The number of segments $m_i=\sum_k\nu_{ik}v_kS_k$ of every component.
    pub fn chain_length(&self, geometry: &Array1<f64>) -> Array1<f64> {
        let mut m = Array1::zeros(self.molarweight.len());
        for (&i, &g) in self.component_index.iter().zip(geometry) {
            m[i] += g;
        }
        m
    }

    /// Mean number of segments $\bar m$ and the fraction of segments $x_{s,k}$
    /// that belong to every bead type.
    pub fn segment_fractions<D: DualNum<f64> + Copy>(
        &self,
        geometry: &Array1<f64>,
        molefracs: &Array1<D>,
    ) -> (D, Array1<D>) {
        let mut xs = Array1::from_elem(self.beads, D::zero());
        for ((&i, &k), &g) in self
            .component_index
            .iter()
            .zip(&self.bead_index)
            .zip(geometry)
        {
            xs[k] += molefracs[i] * g;
        }
        let m_mean = xs.sum();
        (m_mean, xs.mapv(|x| x / m_mean))
    }

    /// Molecular averages $\sum_k\sum_lz_{ki}z_{li}q_{kl}$ of a bead pair
    /// property for every component, with $z_{ki}$ the fraction of segments
    /// of the component that belong to bead type $k$.
    pub fn molecular_average<D: DualNum<f64> + Copy>(
        &self,
        geometry: &Array1<f64>,
        q_kl: &Array2<D>,
    ) -> Array1<D> {
        let m = self.chain_length(geometry);
        let mut q = Array1::from_elem(m.len(), D::zero());
        let segments = self.component_index.len();
        for s in 0..segments {
            let i = self.component_index[s];
            for t in (0..segments).filter(|&t| self.component_index[t] == i) {
                let z = geometry[s] * geometry[t] / (m[i] * m[i]);
                q[i] += q_kl[(self.bead_index[s], self.bead_index[t])] * z;
            }
        }
        q
    }
}
