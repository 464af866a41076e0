//! qlat: tight-binding models on lattices.
//!
//! This is the umbrella crate: it re-exports the lattice, field, bonds and
//! operator crates so that a model can be set up from one import.
//!
//! ```
//! use std::sync::Arc;
//! use qlat::{tight_binding_hamiltonian, BoundaryConditions, Lattice, SymmetricGauge};
//! use qlat::TightBindingParams;
//!
//! let params = TightBindingParams {
//!     boundaries: BoundaryConditions::periodic(2),
//!     ..Default::default()
//! };
//! let lattice = Arc::new(Lattice::square(4, 4));
//! let h = tight_binding_hamiltonian(lattice, &params, SymmetricGauge { b: 0.0 }).unwrap();
//! assert_eq!(h.size(), 16);
//! assert!(h.is_hermitian(1e-12));
//! ```

pub use qlat_bonds::{
    self, AdaptBonds, AdjacencyMatrix, BondPairs, Bonds, BondsError, BondsExt, DirectedBonds,
    DirectedFn, NoBonds, SiteDistance, Translation,
};
pub use qlat_field::{
    self, Field, FieldSum, LandauGauge, NoField, PointFlux, PotentialField, SymmetricGauge,
};
pub use qlat_lattice::{
    self, Boundary, BoundaryConditions, DVec, Lattice, LatticeError, LatticeValue, ResolvedSite,
    Site,
};
pub use qlat_operator::{
    self, build_operator, tight_binding_hamiltonian, CMatrix, CsrOperator, Hopping, HoppingBonds,
    Operator, OperatorBasis, OperatorBuilder, OperatorError, SparseBuilder, Term,
    TightBindingParams,
};

pub use num_complex::Complex64;
