//! Per-site scalar profiles.

use crate::{Lattice, LatticeError, Result, Site};
use std::sync::Arc;

/// Scalar value attached to every site of a lattice, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeValue {
    lattice: Arc<Lattice>,
    values: Vec<f64>,
}

impl LatticeValue {
    pub fn new(lattice: Arc<Lattice>, values: Vec<f64>) -> Result<Self> {
        if values.len() != lattice.len() {
            return Err(LatticeError::LengthMismatch {
                expected: lattice.len(),
                found: values.len(),
            });
        }
        Ok(Self { lattice, values })
    }

    /// Evaluate `f` on every site.
    pub fn from_fn(lattice: Arc<Lattice>, f: impl Fn(&Site) -> f64) -> Self {
        let values = lattice.sites().iter().map(f).collect();
        Self { lattice, values }
    }

    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `site`, or `None` when the site is not part of the lattice.
    pub fn get(&self, site: &Site) -> Option<f64> {
        self.lattice.site_index(site).map(|i| self.values[i])
    }
}
