//! Bonds and adjacency relations on lattices.
//!
//! Every relation implements [`Bonds`]: it knows its lattice (or is unbound
//! until one is supplied), answers adjacency queries, and enumerates its
//! adjacent pairs through [`BondPairs`], each unordered pair exactly once in
//! ascending index order.
//!
//! # Modules
//!
//! - [`bonds`]: The `Bonds` trait, pair iteration, `NoBonds`, `SiteDistance`
//! - [`adjacency`]: Explicit symmetric relation backed by sparse rows
//! - [`directed`]: Directed relations (`DirectedBonds`, `DirectedFn`)
//! - [`translation`]: Constant-displacement translations
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use qlat_bonds::{AdjacencyMatrix, BondsExt, Translation};
//! use qlat_lattice::Lattice;
//! use nalgebra::DVector;
//!
//! let lat = Arc::new(Lattice::square(3, 3));
//! let tx = Translation::new(lat.clone(), DVector::from_column_slice(&[1.0, 0.0])).unwrap();
//! let ty = Translation::new(lat.clone(), DVector::from_column_slice(&[0.0, 1.0])).unwrap();
//!
//! let adj = AdjacencyMatrix::from_bonds(&[&tx, &ty]).unwrap();
//! assert_eq!(adj.pairs().unwrap().count(), 12);
//! ```

pub mod adjacency;
pub mod bonds;
pub mod directed;
pub mod translation;

pub use adjacency::AdjacencyMatrix;
pub use bonds::{AdaptBonds, BondPairs, Bonds, BondsExt, NoBonds, SiteDistance};
pub use directed::{DirectedBonds, DirectedFn};
pub use translation::Translation;

use qlat_lattice::{Lattice, LatticeError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BondsError {
    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error("bonds are defined on different lattices")]
    LatticeMismatch,

    #[error("bonds are not bound to a lattice")]
    UnboundLattice,

    #[error("adjacency matrix is {rows}×{cols}, lattice has {expected} sites")]
    SizeMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("displacement has {found} components, lattice sites have {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{site} has {count} destinations, expected at most one")]
    AmbiguousDestination { site: String, count: usize },

    #[error("site {index} has no destination")]
    MissingDestination { index: usize },
}

pub type Result<T> = std::result::Result<T, BondsError>;

/// Whether two lattice handles describe the same lattice.
pub fn same_lattice(a: &Arc<Lattice>, b: &Arc<Lattice>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}
