//! Tight-binding Hamiltonian with up to third-neighbor hoppings.
//!
//!   H = Σ_k t_k Σ_{⟨i,j⟩_k} (e^{-2πi∫A·dl} c†_i T c_j + h.c.)
//!
//! where `⟨i,j⟩_k` runs over the k-th neighbor shell and `T` is the
//! internal hopping matrix.

use crate::{CMatrix, Operator, OperatorBasis, OperatorBuilder, OperatorError, Result};
use log::debug;
use num_complex::Complex64;
use qlat_bonds::{SiteDistance, Translation};
use qlat_field::Field;
use qlat_lattice::{BoundaryConditions, Lattice};
use std::sync::Arc;

/// Parameters for [`tight_binding_hamiltonian`].
#[derive(Debug, Clone)]
pub struct TightBindingParams {
    /// Nearest-neighbor amplitude.
    pub t1: f64,
    /// Next-nearest-neighbor amplitude.
    pub t2: f64,
    /// Third-neighbor amplitude.
    pub t3: f64,
    /// Internal hopping matrix; its size fixes the internal dimension.
    pub internal: CMatrix,
    pub boundaries: BoundaryConditions,
}

impl Default for TightBindingParams {
    fn default() -> Self {
        Self {
            t1: 1.0,
            t2: 0.0,
            t3: 0.0,
            internal: CMatrix::identity(1, 1),
            boundaries: BoundaryConditions::open(),
        }
    }
}

/// Build the tight-binding Hamiltonian of `lattice` in `field`.
///
/// Lattices with primitive vectors hop along the neighbor offsets of each
/// shell, so periodic and twisted boundaries wrap. Lattices without them
/// fall back to distance shells between existing sites.
pub fn tight_binding_hamiltonian(
    lattice: Arc<Lattice>,
    params: &TightBindingParams,
    field: impl Field + 'static,
) -> Result<Operator> {
    let (d, d2) = params.internal.shape();
    if d != d2 || d == 0 {
        return Err(OperatorError::UnsupportedTerm(format!(
            "internal hopping matrix must be square and non-empty, got {d}×{d2}"
        )));
    }

    let mut builder = OperatorBuilder::new(OperatorBasis::new(lattice.clone(), d))
        .with_field(field)
        .with_boundaries(params.boundaries.clone());

    for (k, t) in [params.t1, params.t2, params.t3].into_iter().enumerate() {
        if t == 0.0 {
            continue;
        }
        let shell = k + 1;
        let op = &params.internal * Complex64::new(t, 0.0);
        if lattice.primitive().is_empty() {
            debug!("shell {shell}: hopping over distance pairs");
            builder.add_hoppings(&op, &SiteDistance::nearest(lattice.clone(), shell), None)?;
        } else {
            let offsets = lattice.neighbor_offsets(shell);
            debug!("shell {shell}: {} neighbor offsets", offsets.len());
            for r in offsets {
                builder.add_offset_hoppings(&op, &Translation::unbound(r), None)?;
            }
        }
    }

    Ok(builder.build())
}
