//! Coordinate accumulation and CSR (Compressed Sparse Row) storage.
//!
//! Operators are assembled as a list of `(row, col, value)` increments.
//! Repeated coordinates are allowed and are summed when the list is
//! finalized into a [`CsrOperator`].

use crate::{OperatorError, Result};
use log::debug;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Coordinate-list accumulator. Consumed by [`SparseBuilder::finalize`].
#[derive(Debug, Clone)]
pub struct SparseBuilder {
    nrows: usize,
    ncols: usize,
    triples: Vec<(usize, usize, Complex64)>,
}

impl SparseBuilder {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            triples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Add `value` to entry `(row, col)`.
    pub fn increment(&mut self, row: usize, col: usize, value: Complex64) {
        assert!(
            row < self.nrows && col < self.ncols,
            "Entry ({row}, {col}) outside {}×{} operator",
            self.nrows,
            self.ncols
        );
        self.triples.push((row, col, value));
    }

    /// Add `block · factor` to the `d×d` block at block position `(i, j)`,
    /// where `d` is the block size. Zero entries are skipped.
    pub fn increment_block(
        &mut self,
        i: usize,
        j: usize,
        block: &DMatrix<Complex64>,
        factor: Complex64,
    ) {
        let d = block.nrows();
        for a in 0..d {
            for b in 0..block.ncols() {
                let v = block[(a, b)] * factor;
                if v != Complex64::new(0.0, 0.0) {
                    self.increment(i * d + a, j * block.ncols() + b, v);
                }
            }
        }
    }

    /// Sort by row then column, merge duplicates, build CSR.
    pub fn finalize(self) -> CsrOperator {
        let n_triples = self.triples.len();
        let mut rows: Vec<Vec<(usize, Complex64)>> = vec![Vec::new(); self.nrows];
        for (r, c, v) in self.triples {
            rows[r].push((c, v));
        }

        let mut row_ptr = Vec::with_capacity(self.nrows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for row in &mut rows {
            // Stable sort keeps the summation order deterministic.
            row.sort_by_key(|&(col, _)| col);

            let mut merged: Vec<(usize, Complex64)> = Vec::new();
            for &(col, val) in row.iter() {
                if let Some(last) = merged.last_mut() {
                    if last.0 == col {
                        last.1 += val;
                        continue;
                    }
                }
                merged.push((col, val));
            }

            for (col, val) in merged {
                col_indices.push(col);
                values.push(val);
            }
            row_ptr.push(col_indices.len());
        }

        debug!(
            "finalized {}×{} operator: {} increments -> {} stored entries",
            self.nrows,
            self.ncols,
            n_triples,
            values.len()
        );

        CsrOperator {
            nrows: self.nrows,
            ncols: self.ncols,
            row_ptr,
            col_indices,
            values,
        }
    }
}

/// Complex sparse matrix in Compressed Sparse Row format.
///
/// Only [`SparseBuilder::finalize`] creates one, so column indices are in
/// range and sorted within each row.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrOperator {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<Complex64>,
}

impl CsrOperator {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        SparseBuilder::new(nrows, ncols).finalize()
    }

    /// Sparse copy of a dense matrix, dropping exact zeros.
    pub fn from_dense(m: &DMatrix<Complex64>) -> Self {
        let mut b = SparseBuilder::new(m.nrows(), m.ncols());
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                if m[(i, j)] != Complex64::new(0.0, 0.0) {
                    b.increment(i, j, m[(i, j)]);
                }
            }
        }
        b.finalize()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Row offsets into [`col_indices`](Self::col_indices), `nrows + 1` long.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    /// Stored entries as `(row, col, value)`, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Complex64)> + '_ {
        (0..self.nrows).flat_map(move |i| {
            (self.row_ptr[i]..self.row_ptr[i + 1])
                .map(move |k| (i, self.col_indices[k], self.values[k]))
        })
    }

    /// Entry `(i, j)`; zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        if i >= self.nrows {
            return Complex64::new(0.0, 0.0);
        }
        let cols = &self.col_indices[self.row_ptr[i]..self.row_ptr[i + 1]];
        match cols.binary_search(&j) {
            Ok(k) => self.values[self.row_ptr[i] + k],
            Err(_) => Complex64::new(0.0, 0.0),
        }
    }

    /// y = A · x.
    pub fn matvec(&self, x: &[Complex64]) -> Vec<Complex64> {
        assert_eq!(x.len(), self.ncols, "Vector length must match column count");
        let mut y = vec![Complex64::new(0.0, 0.0); self.nrows];
        for i in 0..self.nrows {
            let mut sum = Complex64::new(0.0, 0.0);
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = sum;
        }
        y
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> CsrOperator {
        let mut b = SparseBuilder::new(self.ncols, self.nrows);
        for (i, j, v) in self.iter() {
            b.increment(j, i, v.conj());
        }
        b.finalize()
    }

    /// Whether `A = A†` entrywise within `tol`.
    pub fn is_hermitian(&self, tol: f64) -> bool {
        self.nrows == self.ncols
            && self
                .iter()
                .all(|(i, j, v)| (v - self.get(j, i).conj()).norm() <= tol)
    }

    /// Entrywise sum of two operators of the same shape.
    pub fn add(&self, other: &CsrOperator) -> Result<CsrOperator> {
        if self.shape() != other.shape() {
            return Err(OperatorError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        let mut b = SparseBuilder::new(self.nrows, self.ncols);
        for (i, j, v) in self.iter().chain(other.iter()) {
            b.increment(i, j, v);
        }
        Ok(b.finalize())
    }

    /// A ⊗ B for a dense `B`, e.g. a lattice operator times an internal one.
    pub fn kron(&self, block: &DMatrix<Complex64>) -> CsrOperator {
        let mut b = SparseBuilder::new(self.nrows * block.nrows(), self.ncols * block.ncols());
        for (i, j, v) in self.iter() {
            b.increment_block(i, j, block, v);
        }
        b.finalize()
    }

    pub fn to_dense(&self) -> DMatrix<Complex64> {
        let mut m = DMatrix::zeros(self.nrows, self.ncols);
        for (i, j, v) in self.iter() {
            m[(i, j)] += v;
        }
        m
    }
}
