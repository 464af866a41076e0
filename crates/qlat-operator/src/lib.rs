//! Sparse operator assembly on lattices.
//!
//! Operators act on the basis `lattice ⊗ internal`, where the internal
//! space (spin, orbital, ...) has dimension `d`. Basis state
//! `(site i, internal a)` has index `i·d + a`.
//!
//! Assembly goes through [`OperatorBuilder`]: terms are turned into
//! `(row, col, value)` increments in a [`SparseBuilder`] and materialized
//! once into a [`CsrOperator`]. Hopping terms pick up a Peierls phase
//! `exp(-2πi ∫ A·dl)` from a [`Field`](qlat_field::Field) and a boundary
//! phase from [`BoundaryConditions`](qlat_lattice::BoundaryConditions), and
//! are inserted together with their Hermitian conjugate.
//!
//! ```
//! use std::sync::Arc;
//! use qlat_lattice::Lattice;
//! use qlat_field::NoField;
//! use qlat_operator::{tight_binding_hamiltonian, TightBindingParams};
//!
//! let lattice = Arc::new(Lattice::chain(2));
//! let h = tight_binding_hamiltonian(lattice, &TightBindingParams::default(), NoField).unwrap();
//! assert_eq!(h.matrix.get(0, 1).re, 1.0);
//! assert!(h.is_hermitian(1e-12));
//! ```

pub mod basis;
pub mod builder;
pub mod sparse;
pub mod term;
pub mod tight_binding;

pub use basis::{Operator, OperatorBasis};
pub use builder::{build_operator, OperatorBuilder};
pub use sparse::{CsrOperator, SparseBuilder};
pub use term::{Hopping, HoppingBonds, Term};
pub use tight_binding::{tight_binding_hamiltonian, TightBindingParams};

use qlat_bonds::BondsError;
use qlat_lattice::LatticeError;

/// Complex internal-space matrix.
pub type CMatrix = nalgebra::DMatrix<num_complex::Complex64>;

/// Errors raised while assembling operators.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum OperatorError {
    #[error(transparent)]
    Lattice(#[from] LatticeError),
    #[error(transparent)]
    Bonds(#[from] BondsError),
    #[error("non-finite hopping phase {phase} between sites {from} and {to}")]
    NonFinitePhase { from: usize, to: usize, phase: String },
    #[error("unsupported term: {0}")]
    UnsupportedTerm(String),
    #[error("term is defined on a different lattice than the operator basis")]
    LatticeMismatch,
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, OperatorError>;
