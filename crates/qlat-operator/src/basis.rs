use crate::{CMatrix, CsrOperator};
use qlat_lattice::Lattice;
use std::sync::Arc;

/// Row/column basis of an operator: lattice sites times an internal space.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorBasis {
    pub lattice: Arc<Lattice>,
    pub internal_dim: usize,
}

impl OperatorBasis {
    pub fn new(lattice: Arc<Lattice>, internal_dim: usize) -> Self {
        assert!(internal_dim > 0, "Internal dimension must be positive");
        Self { lattice, internal_dim }
    }

    /// Basis with one state per site.
    pub fn scalar(lattice: Arc<Lattice>) -> Self {
        Self::new(lattice, 1)
    }

    /// Total dimension `N·d`.
    pub fn size(&self) -> usize {
        self.lattice.len() * self.internal_dim
    }

    /// Index of basis state `(site, internal)`.
    #[inline]
    pub fn index(&self, site: usize, internal: usize) -> usize {
        site * self.internal_dim + internal
    }
}

/// An assembled operator together with its basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub basis: OperatorBasis,
    pub matrix: CsrOperator,
}

impl Operator {
    pub fn size(&self) -> usize {
        self.basis.size()
    }

    pub fn is_hermitian(&self, tol: f64) -> bool {
        self.matrix.is_hermitian(tol)
    }

    pub fn to_dense(&self) -> CMatrix {
        self.matrix.to_dense()
    }

    /// The `d×d` block coupling site `i` (rows) to site `j` (columns).
    pub fn site_block(&self, i: usize, j: usize) -> CMatrix {
        let d = self.basis.internal_dim;
        CMatrix::from_fn(d, d, |a, b| {
            self.matrix.get(self.basis.index(i, a), self.basis.index(j, b))
        })
    }
}
