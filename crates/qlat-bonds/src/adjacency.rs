//! Explicit adjacency relation.
//!
//! [`AdjacencyMatrix`] stores a symmetric boolean matrix as one sorted set of
//! neighbor indices per row. Every write goes through [`AdjacencyMatrix::set_index`],
//! which updates `(i, j)` and `(j, i)` together and ignores the diagonal, so
//! the relation is symmetric and loop-free at all times.

use crate::bonds::scan_targets;
use crate::{same_lattice, AdaptBonds, Bonds, BondsError, BondsExt, Result};
use log::debug;
use nalgebra::DMatrix;
use qlat_lattice::{Lattice, ResolvedSite, Site};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    lattice: Arc<Lattice>,
    rows: Vec<BTreeSet<usize>>,
}

impl AdjacencyMatrix {
    /// Empty relation on `lattice`.
    pub fn new(lattice: Arc<Lattice>) -> Self {
        let rows = vec![BTreeSet::new(); lattice.len()];
        Self { lattice, rows }
    }

    /// Relation from an explicit boolean matrix.
    ///
    /// The result is `(M | Mᵀ) & ¬I`: the input is symmetrized and its
    /// diagonal discarded.
    pub fn from_matrix(lattice: Arc<Lattice>, m: &DMatrix<bool>) -> Result<Self> {
        let n = lattice.len();
        if m.nrows() != n || m.ncols() != n {
            return Err(BondsError::SizeMismatch {
                expected: n,
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }
        let mut adj = Self::new(lattice);
        for i in 0..n {
            for j in 0..n {
                if m[(i, j)] {
                    adj.set_index(i, j, true);
                }
            }
        }
        Ok(adj)
    }

    /// Union of the pairs of several bonds.
    ///
    /// All bound bonds must share one lattice; unbound ones are iterated on
    /// that lattice. Fails if none of them is bound.
    pub fn from_bonds(bonds: &[&dyn Bonds]) -> Result<Self> {
        let mut lattice: Option<&Arc<Lattice>> = None;
        for b in bonds {
            match (lattice, b.lattice()) {
                (None, Some(l)) => lattice = Some(l),
                (Some(known), Some(l)) if !same_lattice(known, l) => {
                    return Err(BondsError::LatticeMismatch);
                }
                _ => {}
            }
        }
        let lattice = lattice.ok_or(BondsError::UnboundLattice)?.clone();

        let mut adj = Self::new(lattice.clone());
        for b in bonds {
            for (s, t) in b.pairs_in(&lattice) {
                adj.set_index(s.index, t.index, true);
            }
        }
        debug!("adjacency from {} bonds: {} pairs", bonds.len(), adj.n_pairs());
        Ok(adj)
    }

    /// Relation given by a predicate over all pairs `i < j`. O(N²) calls.
    pub fn from_fn(lattice: Arc<Lattice>, f: impl Fn(&Site, &Site) -> bool) -> Self {
        let mut adj = Self::new(lattice.clone());
        let sites = lattice.sites();
        for i in 0..sites.len() {
            for j in (i + 1)..sites.len() {
                if f(&sites[i], &sites[j]) {
                    adj.set_index(i, j, true);
                }
            }
        }
        adj
    }

    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    /// Entry `(i, j)`; `false` outside the matrix.
    pub fn get_index(&self, i: usize, j: usize) -> bool {
        self.rows.get(i).is_some_and(|row| row.contains(&j))
    }

    /// Set entries `(i, j)` and `(j, i)`. Diagonal and out-of-range writes
    /// are ignored.
    pub fn set_index(&mut self, i: usize, j: usize, value: bool) {
        let n = self.rows.len();
        if i == j || i >= n || j >= n {
            return;
        }
        if value {
            self.rows[i].insert(j);
            self.rows[j].insert(i);
        } else {
            self.rows[i].remove(&j);
            self.rows[j].remove(&i);
        }
    }

    /// Entry for two sites; `false` if either is not on the lattice.
    pub fn get(&self, a: &Site, b: &Site) -> bool {
        match (self.lattice.site_index(a), self.lattice.site_index(b)) {
            (Some(i), Some(j)) => self.get_index(i, j),
            _ => false,
        }
    }

    /// Set the entry for two sites. No-op if either is not on the lattice.
    pub fn set(&mut self, a: &Site, b: &Site, value: bool) {
        if let (Some(i), Some(j)) = (self.lattice.site_index(a), self.lattice.site_index(b)) {
            self.set_index(i, j, value);
        }
    }

    /// Neighbor indices of site `i`, ascending.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows.get(i).into_iter().flat_map(|row| row.iter().copied())
    }

    /// Neighbors of `site`; empty if the site is not on the lattice.
    pub fn adjacent_sites(&self, site: &Site) -> Vec<ResolvedSite<'_>> {
        let Some(i) = self.lattice.site_index(site) else {
            return Vec::new();
        };
        let sites = self.lattice.sites();
        self.neighbors(i)
            .map(|j| ResolvedSite {
                index: j,
                site: &sites[j],
            })
            .collect()
    }

    /// OR-combination with another relation on the same lattice.
    pub fn union(&self, other: &AdjacencyMatrix) -> Result<Self> {
        let mut out = self.clone();
        out.union_with(other)?;
        Ok(out)
    }

    pub fn union_with(&mut self, other: &AdjacencyMatrix) -> Result<()> {
        if !same_lattice(&self.lattice, &other.lattice) {
            return Err(BondsError::LatticeMismatch);
        }
        for (row, other_row) in self.rows.iter_mut().zip(other.rows.iter()) {
            row.extend(other_row.iter().copied());
        }
        Ok(())
    }

    /// Number of true entries (twice the number of pairs).
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeSet::len).sum()
    }

    /// Number of unordered adjacent pairs.
    pub fn n_pairs(&self) -> usize {
        self.nnz() / 2
    }

    fn row_above(&self, index: usize) -> Vec<usize> {
        match self.rows.get(index) {
            Some(row) => row.range(index + 1..).copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn to_dense(&self) -> DMatrix<bool> {
        let n = self.rows.len();
        let mut m = DMatrix::from_element(n, n, false);
        for (i, row) in self.rows.iter().enumerate() {
            for &j in row {
                m[(i, j)] = true;
            }
        }
        m
    }
}

impl Bonds for AdjacencyMatrix {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        Some(&self.lattice)
    }

    fn is_adjacent(&self, a: &Site, b: &Site) -> bool {
        self.get(a, b)
    }

    /// Coordinate scan on a foreign lattice. Pair iteration on the own
    /// lattice goes through [`own_targets_above`](Bonds::own_targets_above).
    fn targets_above(&self, lattice: &Lattice, index: usize) -> Vec<usize> {
        if std::ptr::eq(lattice, &*self.lattice) {
            self.row_above(index)
        } else {
            scan_targets(self, lattice, index)
        }
    }

    /// O(degree).
    fn own_targets_above(&self, index: usize) -> Option<Vec<usize>> {
        Some(self.row_above(index))
    }
}

impl AdaptBonds for AdjacencyMatrix {
    /// Carry every pair whose two sites both exist in `lattice` over to it.
    /// Pairs touching sites absent from `lattice` are dropped.
    fn adapt_bonds(&self, lattice: &Arc<Lattice>) -> Result<Self> {
        if same_lattice(&self.lattice, lattice) {
            return Ok(self.clone());
        }
        let mut adapted = Self::new(lattice.clone());
        for (s, t) in self.pairs_in(&self.lattice) {
            if let (Some(i), Some(j)) = (lattice.site_index(s.site), lattice.site_index(t.site)) {
                adapted.set_index(i, j, true);
            }
        }
        debug!(
            "adapted adjacency: {} of {} pairs kept",
            adapted.n_pairs(),
            self.n_pairs()
        );
        Ok(adapted)
    }
}
