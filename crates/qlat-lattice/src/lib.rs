//! Lattice sites, site-indexed values and boundary conditions.
//!
//! This crate is the geometric contract the rest of `qlat` builds on: an
//! ordered, indexable collection of sites with coordinate lookup, plus the
//! policy objects that map out-of-cell sites back into the lattice.
//!
//! # Modules
//!
//! - [`site`]: Free and lattice-resolved sites
//! - [`lattice`]: Ordered site collections, Bravais metadata, neighbor shells
//! - [`value`]: Per-site scalar profiles
//! - [`boundary`]: Open, periodic and twisted boundary conditions
//!
//! # Example
//!
//! ```
//! use qlat_lattice::{Boundary, BoundaryConditions, Lattice, Site};
//!
//! let chain = Lattice::chain(4);
//! let bc = BoundaryConditions::new(vec![Boundary::Periodic]);
//!
//! // x = 4 lies one period to the right and wraps onto site 0.
//! let (phase, index) = bc.shift_site(&chain, &Site::from_slice(&[4.0]));
//! assert_eq!(index, Some(0));
//! assert!((phase.re - 1.0).abs() < 1e-12);
//! ```

pub mod boundary;
pub mod lattice;
pub mod site;
pub mod value;

pub use boundary::{Boundary, BoundaryConditions};
pub use lattice::Lattice;
pub use site::{ResolvedSite, Site};
pub use value::LatticeValue;

use thiserror::Error;

/// Dynamic coordinate vector.
pub type DVec = nalgebra::DVector<f64>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    #[error("coordinate dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("length mismatch: lattice has {expected} sites, got {found} values")]
    LengthMismatch { expected: usize, found: usize },

    #[error("lattice has no sites")]
    Empty,

    #[error("site {index} duplicates an earlier site")]
    DuplicateSite { index: usize },
}

pub type Result<T> = std::result::Result<T, LatticeError>;
