//! Operator assembly.
//!
//! For a hopping from site `i` at `r₁` to a partner at `r₂`:
//!
//! 1. the partner is wrapped back into the lattice by the boundary
//!    conditions, which also yield a boundary phase (open boundaries drop
//!    partners outside the lattice);
//! 2. an optional selector may reject the pair;
//! 3. the total factor is `exp(-2πi ∫_{r₁}^{r₂} A·dl) · boundary phase`,
//!    integrated along the unwrapped bond;
//! 4. block `(i, j)` receives `op · factor` and block `(j, i)` receives
//!    `op† · conj(factor)`.
//!
//! A non-finite factor aborts the build.

use crate::term::{check_bound, internal_operator, normalize, Increment};
use crate::{
    CMatrix, CsrOperator, Operator, OperatorBasis, OperatorError, Result, SparseBuilder, Term,
};
use log::debug;
use num_complex::Complex64;
use qlat_bonds::{Bonds, BondsError, BondsExt, Translation};
use qlat_field::{Field, NoField};
use qlat_lattice::{BoundaryConditions, Site};
use std::f64::consts::PI;

/// Single-use accumulator for one operator. Consumed by [`build`](Self::build).
pub struct OperatorBuilder {
    basis: OperatorBasis,
    field: Box<dyn Field>,
    boundaries: BoundaryConditions,
    coo: SparseBuilder,
}

impl OperatorBuilder {
    /// Empty builder with no field and open boundaries.
    pub fn new(basis: OperatorBasis) -> Self {
        let n = basis.size();
        Self {
            basis,
            field: Box::new(NoField),
            boundaries: BoundaryConditions::open(),
            coo: SparseBuilder::new(n, n),
        }
    }

    pub fn with_field(mut self, field: impl Field + 'static) -> Self {
        self.field = Box::new(field);
        self
    }

    pub fn with_boundaries(mut self, boundaries: BoundaryConditions) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn basis(&self) -> &OperatorBasis {
        &self.basis
    }

    /// Increments collected so far.
    pub fn n_increments(&self) -> usize {
        self.coo.len()
    }

    fn check_internal(&self, op: &CMatrix) -> Result<()> {
        let d = self.basis.internal_dim;
        if op.shape() != (d, d) {
            return Err(OperatorError::UnsupportedTerm(format!(
                "internal operator is {}×{}, basis has internal dimension {d}",
                op.nrows(),
                op.ncols()
            )));
        }
        Ok(())
    }

    /// Add `op · values[i]` to the diagonal block of every site `i`.
    pub fn add_diagonal(&mut self, op: &CMatrix, values: &[f64]) -> Result<()> {
        self.check_internal(op)?;
        let n = self.basis.lattice.len();
        if values.len() != n {
            return Err(OperatorError::ShapeMismatch {
                expected: (n, 1),
                found: (values.len(), 1),
            });
        }
        for (i, &v) in values.iter().enumerate() {
            if v != 0.0 {
                self.coo.increment_block(i, i, op, Complex64::new(v, 0.0));
            }
        }
        debug!("diagonal term on {n} sites");
        Ok(())
    }

    /// Insert one hopping `i → j` and its conjugate.
    fn hop(
        &mut self,
        op: &CMatrix,
        i: usize,
        from: &Site,
        j: usize,
        to: &Site,
        boundary_phase: Complex64,
    ) -> Result<()> {
        let flux = self.field.line_integral(&from.coords, &to.coords);
        let factor = Complex64::from_polar(1.0, -2.0 * PI * flux) * boundary_phase;
        if !factor.is_finite() {
            return Err(OperatorError::NonFinitePhase {
                from: i,
                to: j,
                phase: factor.to_string(),
            });
        }
        self.coo.increment_block(i, j, op, factor);
        self.coo.increment_block(j, i, &op.adjoint(), factor.conj());
        Ok(())
    }

    fn check_selector(&self, selector: Option<&dyn Bonds>) -> Result<()> {
        match selector {
            Some(sel) => check_bound(sel, &self.basis),
            None => Ok(()),
        }
    }

    /// Hoppings `op` along every adjacent pair of `bonds`, lower index to
    /// higher, each with its Hermitian conjugate.
    ///
    /// Bound `bonds` and `selector` must live on the basis lattice.
    pub fn add_hoppings(
        &mut self,
        op: &CMatrix,
        bonds: &dyn Bonds,
        selector: Option<&dyn Bonds>,
    ) -> Result<()> {
        self.check_internal(op)?;
        check_bound(bonds, &self.basis)?;
        self.check_selector(selector)?;
        let lattice = self.basis.lattice.clone();
        let (mut added, mut skipped) = (0usize, 0usize);
        for (s1, s2) in bonds.pairs_in(&lattice) {
            let (phase, wrapped) = self.boundaries.shift_site(&lattice, s2.site);
            let Some(j) = wrapped else {
                skipped += 1;
                continue;
            };
            if selector.is_some_and(|sel| !sel.is_adjacent(s1.site, &lattice.sites()[j])) {
                skipped += 1;
                continue;
            }
            self.hop(op, s1.index, s1.site, j, s2.site, phase)?;
            added += 1;
        }
        debug!("pair hoppings: {added} bonds added, {skipped} skipped");
        Ok(())
    }

    /// Hoppings `op` from every site to `site + displacement`, wrapped by the
    /// boundary conditions. Partners that do not resolve are skipped.
    pub fn add_offset_hoppings(
        &mut self,
        op: &CMatrix,
        translation: &Translation,
        selector: Option<&dyn Bonds>,
    ) -> Result<()> {
        self.check_internal(op)?;
        check_bound(translation, &self.basis)?;
        self.check_selector(selector)?;
        let lattice = self.basis.lattice.clone();
        let r = translation.displacement();
        if r.len() != lattice.dims() {
            return Err(BondsError::DimensionMismatch {
                expected: lattice.dims(),
                found: r.len(),
            }
            .into());
        }
        let (mut added, mut skipped) = (0usize, 0usize);
        for s1 in lattice.iter() {
            let partner = s1.site.translated(r);
            let (phase, wrapped) = self.boundaries.shift_site(&lattice, &partner);
            let Some(j) = wrapped else {
                skipped += 1;
                continue;
            };
            if selector.is_some_and(|sel| !sel.is_adjacent(s1.site, &lattice.sites()[j])) {
                skipped += 1;
                continue;
            }
            self.hop(op, s1.index, s1.site, j, &partner, phase)?;
            added += 1;
        }
        debug!("offset hoppings along {:?}: {added} bonds added, {skipped} skipped", r.as_slice());
        Ok(())
    }

    /// Add a ready-made operator on the full basis.
    pub fn add_matrix(&mut self, m: &CsrOperator) -> Result<()> {
        let n = self.basis.size();
        if m.shape() != (n, n) {
            return Err(OperatorError::ShapeMismatch {
                expected: (n, n),
                found: m.shape(),
            });
        }
        for (i, j, v) in m.iter() {
            self.coo.increment(i, j, v);
        }
        Ok(())
    }

    /// Normalize `term` against the basis and add it.
    pub fn add_term(&mut self, term: &Term) -> Result<()> {
        match normalize(term, &self.basis)? {
            Increment::Diagonal { op, values } => self.add_diagonal(&op, &values),
            Increment::Pairs { op, bonds, selector } => self.add_hoppings(&op, bonds, selector),
            Increment::Offset {
                op,
                translation,
                selector,
            } => self.add_offset_hoppings(&op, translation, selector),
            Increment::Matrix(m) => self.add_matrix(&m),
        }
    }

    /// Scalar hopping along `bonds`; `amplitude` may be a bare number.
    pub fn add_scalar_hoppings(
        &mut self,
        amplitude: impl Into<Complex64>,
        bonds: &dyn Bonds,
    ) -> Result<()> {
        let op = internal_operator(&CMatrix::from_element(1, 1, amplitude.into()), &self.basis)?;
        self.add_hoppings(&op, bonds, None)
    }

    /// Materialize the operator.
    pub fn build(self) -> Operator {
        let n_increments = self.coo.len();
        let matrix = self.coo.finalize();
        debug!(
            "built operator: {} sites × {} internal, {} increments, nnz = {}",
            self.basis.lattice.len(),
            self.basis.internal_dim,
            n_increments,
            matrix.nnz()
        );
        Operator {
            basis: self.basis,
            matrix,
        }
    }
}

/// Assemble `terms` on `basis` in one call.
pub fn build_operator(
    basis: OperatorBasis,
    terms: &[Term],
    field: impl Field + 'static,
    boundaries: BoundaryConditions,
) -> Result<Operator> {
    let mut builder = OperatorBuilder::new(basis)
        .with_field(field)
        .with_boundaries(boundaries);
    for term in terms {
        builder.add_term(term)?;
    }
    Ok(builder.build())
}
