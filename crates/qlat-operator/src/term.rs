//! Term specifications and their normalization.
//!
//! A [`Term`] names what to add to an operator without knowing the basis.
//! Before assembly each term is checked against the [`OperatorBasis`] and
//! reduced to one of four increment kinds: a diagonal profile, hoppings
//! along explicit pairs, hoppings along a site offset, or a ready-made
//! sparse matrix.

use crate::{CMatrix, CsrOperator, OperatorBasis, OperatorError, Result};
use log::trace;
use num_complex::Complex64;
use qlat_bonds::{same_lattice, Bonds, Translation};
use qlat_lattice::{DVec, LatticeValue};
use std::fmt;

/// Bonds a hopping term runs along.
pub enum HoppingBonds {
    /// Every site hops to `site + displacement`, subject to boundaries.
    Offset(Translation),
    /// Every adjacent pair of the relation.
    Pairs(Box<dyn Bonds>),
}

impl fmt::Debug for HoppingBonds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoppingBonds::Offset(t) => f.debug_tuple("Offset").field(t.displacement()).finish(),
            HoppingBonds::Pairs(b) => f
                .debug_struct("Pairs")
                .field("bound", &b.lattice().is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// Hopping term `amplitude · op` along `bonds`, plus its Hermitian conjugate.
pub struct Hopping {
    pub op: CMatrix,
    pub amplitude: Complex64,
    pub bonds: HoppingBonds,
    /// Only pairs this relation accepts are kept.
    pub selector: Option<Box<dyn Bonds>>,
}

impl Hopping {
    pub fn offset(op: CMatrix, displacement: DVec) -> Self {
        Self {
            op,
            amplitude: Complex64::new(1.0, 0.0),
            bonds: HoppingBonds::Offset(Translation::unbound(displacement)),
            selector: None,
        }
    }

    pub fn pairs(op: CMatrix, bonds: impl Bonds + 'static) -> Self {
        Self {
            op,
            amplitude: Complex64::new(1.0, 0.0),
            bonds: HoppingBonds::Pairs(Box::new(bonds)),
            selector: None,
        }
    }

    pub fn with_amplitude(mut self, amplitude: impl Into<Complex64>) -> Self {
        self.amplitude = amplitude.into();
        self
    }

    pub fn with_selector(mut self, selector: impl Bonds + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }
}

impl fmt::Debug for Hopping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hopping")
            .field("op", &self.op)
            .field("amplitude", &self.amplitude)
            .field("bonds", &self.bonds)
            .field("selector", &self.selector.is_some())
            .finish()
    }
}

/// A term to add to an operator.
#[derive(Debug)]
pub enum Term {
    /// Internal operator on every site.
    OnSite(CMatrix),
    /// Internal operator weighted by a per-site profile.
    Potential(CMatrix, LatticeValue),
    Hopping(Hopping),
    /// Operator on the full basis, or on the lattice alone (then tensored
    /// with the internal identity).
    Matrix(CsrOperator),
}

impl From<Hopping> for Term {
    fn from(h: Hopping) -> Self {
        Term::Hopping(h)
    }
}

/// Canonical increment a [`Term`] reduces to.
pub(crate) enum Increment<'t> {
    Diagonal {
        op: CMatrix,
        values: Vec<f64>,
    },
    Pairs {
        op: CMatrix,
        bonds: &'t dyn Bonds,
        selector: Option<&'t dyn Bonds>,
    },
    Offset {
        op: CMatrix,
        translation: &'t Translation,
        selector: Option<&'t dyn Bonds>,
    },
    Matrix(CsrOperator),
}

/// Match an internal operator to the basis. A 1×1 operator is a scalar and
/// stands for that multiple of the identity.
pub(crate) fn internal_operator(op: &CMatrix, basis: &OperatorBasis) -> Result<CMatrix> {
    let d = basis.internal_dim;
    match op.shape() {
        (r, c) if r == d && c == d => Ok(op.clone()),
        (1, 1) => Ok(CMatrix::identity(d, d) * op[(0, 0)]),
        (r, c) => Err(OperatorError::UnsupportedTerm(format!(
            "internal operator is {r}×{c}, basis has internal dimension {d}"
        ))),
    }
}

/// Bound bonds must live on the basis lattice; unbound ones take it.
pub(crate) fn check_bound(bonds: &dyn Bonds, basis: &OperatorBasis) -> Result<()> {
    match bonds.lattice() {
        Some(own) if !same_lattice(own, &basis.lattice) => Err(OperatorError::LatticeMismatch),
        _ => Ok(()),
    }
}

pub(crate) fn normalize<'t>(term: &'t Term, basis: &OperatorBasis) -> Result<Increment<'t>> {
    let inc = match term {
        Term::OnSite(op) => Increment::Diagonal {
            op: internal_operator(op, basis)?,
            values: vec![1.0; basis.lattice.len()],
        },
        Term::Potential(op, profile) => {
            if !same_lattice(profile.lattice(), &basis.lattice) {
                return Err(OperatorError::LatticeMismatch);
            }
            Increment::Diagonal {
                op: internal_operator(op, basis)?,
                values: profile.values().to_vec(),
            }
        }
        Term::Hopping(h) => {
            let op = internal_operator(&h.op, basis)? * h.amplitude;
            let selector = h.selector.as_deref();
            if let Some(s) = selector {
                check_bound(s, basis)?;
            }
            match &h.bonds {
                HoppingBonds::Offset(translation) => {
                    check_bound(translation, basis)?;
                    Increment::Offset {
                        op,
                        translation,
                        selector,
                    }
                }
                HoppingBonds::Pairs(bonds) => {
                    check_bound(&**bonds, basis)?;
                    Increment::Pairs {
                        op,
                        bonds: &**bonds,
                        selector,
                    }
                }
            }
        }
        Term::Matrix(m) => {
            let n = basis.size();
            let n_sites = basis.lattice.len();
            match m.shape() {
                (r, c) if r == n && c == n => Increment::Matrix(m.clone()),
                (r, c) if r == n_sites && c == n_sites => {
                    let d = basis.internal_dim;
                    Increment::Matrix(m.kron(&CMatrix::identity(d, d)))
                }
                (r, c) => {
                    return Err(OperatorError::UnsupportedTerm(format!(
                        "{r}×{c} matrix matches neither {n_sites} sites \
                         nor the {n}-dimensional basis"
                    )))
                }
            }
        }
    };
    trace!("normalized term into {} increment", inc.kind());
    Ok(inc)
}

impl Increment<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Increment::Diagonal { .. } => "diagonal",
            Increment::Pairs { .. } => "pair hopping",
            Increment::Offset { .. } => "offset hopping",
            Increment::Matrix(_) => "matrix",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlat_bonds::SiteDistance;
    use qlat_lattice::Lattice;
    use std::sync::Arc;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    fn basis(n: usize, d: usize) -> OperatorBasis {
        OperatorBasis::new(Arc::new(Lattice::chain(n)), d)
    }

    #[test]
    fn test_scalar_operator_expands_to_identity() {
        let b = basis(3, 2);
        let op = internal_operator(&CMatrix::from_element(1, 1, c(2.0)), &b).unwrap();
        assert_eq!(op, CMatrix::identity(2, 2) * c(2.0));
    }

    #[test]
    fn test_wrong_internal_shape_rejected() {
        let b = basis(3, 2);
        let err = internal_operator(&CMatrix::identity(3, 3), &b).unwrap_err();
        assert!(matches!(err, OperatorError::UnsupportedTerm(_)));
    }

    #[test]
    fn test_matrix_term_on_lattice_is_tensored() {
        let b = basis(2, 2);
        let dense = CMatrix::from_row_slice(2, 2, &[c(0.0), c(1.0), c(1.0), c(0.0)]);
        let lattice_op = CsrOperator::from_dense(&dense);
        let term = Term::Matrix(lattice_op);
        match normalize(&term, &b).unwrap() {
            Increment::Matrix(m) => {
                assert_eq!(m.shape(), (4, 4));
                assert_eq!(m.get(0, 2), c(1.0));
                assert_eq!(m.get(1, 3), c(1.0));
                assert_eq!(m.get(0, 3), c(0.0));
            }
            _ => panic!("expected a matrix increment"),
        }
    }

    #[test]
    fn test_matrix_term_of_wrong_size_rejected() {
        let term = Term::Matrix(CsrOperator::zeros(5, 5));
        assert!(matches!(
            normalize(&term, &basis(2, 2)),
            Err(OperatorError::UnsupportedTerm(_))
        ));
    }

    #[test]
    fn test_foreign_lattice_rejected() {
        let b = basis(3, 1);
        let other = Arc::new(Lattice::chain(4));
        let hop = Hopping::pairs(CMatrix::identity(1, 1), SiteDistance::nearest(other.clone(), 1));
        assert!(matches!(
            normalize(&Term::Hopping(hop), &b),
            Err(OperatorError::LatticeMismatch)
        ));
        let profile = LatticeValue::from_fn(other, |s| s.coords[0]);
        assert!(matches!(
            normalize(&Term::Potential(CMatrix::identity(1, 1), profile), &b),
            Err(OperatorError::LatticeMismatch)
        ));
    }

    #[test]
    fn test_amplitude_folded_into_operator() {
        let b = basis(3, 1);
        let hop = Hopping::offset(CMatrix::identity(1, 1), DVec::from_vec(vec![1.0]))
            .with_amplitude(c(-0.5));
        let term = Term::from(hop);
        match normalize(&term, &b).unwrap() {
            Increment::Offset { op, selector, .. } => {
                assert_eq!(op[(0, 0)], c(-0.5));
                assert!(selector.is_none());
            }
            _ => panic!("expected an offset increment"),
        }
    }
}
