//! Ordered site collections.
//!
//! A [`Lattice`] is a finite list of sites with a stable index order and a
//! hashed coordinate lookup. Lattices built from a Bravais grid also remember
//! their primitive vectors (used to enumerate neighbor shells) and their
//! supercell vectors (used by boundary conditions to wrap sites back into
//! the fundamental domain).

use crate::{DVec, LatticeError, ResolvedSite, Result, Site};
use log::debug;
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Resolution of the coordinate hash used by [`Lattice::site_index`].
pub const COORD_RESOLUTION: f64 = 1e-6;

/// Relative tolerance when grouping distances into shells.
const SHELL_TOL: f64 = 1e-9;

/// Slack added before flooring fractional supercell coordinates, so a site
/// sitting exactly on a cell face is assigned to the cell it starts.
const WINDING_SLACK: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Lattice {
    sites: Vec<Site>,
    dims: usize,
    /// Bravais translations. Empty for lattices without a grid structure.
    primitive: Vec<DVec>,
    /// Periods of the finite sample, one per boundary axis.
    supercell: Vec<DVec>,
    /// Corner of the fundamental domain.
    origin: DVec,
    index: HashMap<Vec<i64>, usize>,
}

fn coord_key(coords: &DVec) -> Vec<i64> {
    coords
        .iter()
        .map(|x| (x / COORD_RESOLUTION).round() as i64)
        .collect()
}

impl Lattice {
    /// Build a lattice from an explicit list of sites, in index order.
    pub fn from_sites(sites: Vec<Site>) -> Result<Self> {
        let dims = sites.first().ok_or(LatticeError::Empty)?.dims();
        let mut index = HashMap::with_capacity(sites.len());
        for (i, site) in sites.iter().enumerate() {
            if site.dims() != dims {
                return Err(LatticeError::DimensionMismatch {
                    expected: dims,
                    found: site.dims(),
                });
            }
            if index.insert(coord_key(&site.coords), i).is_some() {
                return Err(LatticeError::DuplicateSite { index: i });
            }
        }
        debug!("lattice with {} sites in {}D", sites.len(), dims);
        Ok(Self {
            sites,
            dims,
            primitive: Vec::new(),
            supercell: Vec::new(),
            origin: DVec::zeros(dims),
            index,
        })
    }

    /// Attach Bravais metadata to a lattice.
    pub fn with_geometry(
        mut self,
        primitive: Vec<DVec>,
        supercell: Vec<DVec>,
        origin: DVec,
    ) -> Result<Self> {
        for v in primitive.iter().chain(supercell.iter()).chain(std::iter::once(&origin)) {
            if v.len() != self.dims {
                return Err(LatticeError::DimensionMismatch {
                    expected: self.dims,
                    found: v.len(),
                });
            }
        }
        self.primitive = primitive;
        self.supercell = supercell;
        self.origin = origin;
        Ok(self)
    }

    /// Unit-spacing grid with `extent[d]` sites along axis `d`.
    ///
    /// Sites are ordered row-major: the first axis varies slowest. Coordinates
    /// start at the origin, and the supercell vectors are `extent[d] · e_d`.
    pub fn hypercubic(extent: &[usize]) -> Self {
        assert!(!extent.is_empty(), "Lattice needs at least one axis");
        assert!(extent.iter().all(|&n| n > 0), "Axis extents must be positive");

        let dims = extent.len();
        let n_sites: usize = extent.iter().product();
        let mut sites = Vec::with_capacity(n_sites);
        let mut index = HashMap::with_capacity(n_sites);

        for v in 0..n_sites {
            let mut coords = DVec::zeros(dims);
            let mut rem = v;
            for d in (0..dims).rev() {
                coords[d] = (rem % extent[d]) as f64;
                rem /= extent[d];
            }
            index.insert(coord_key(&coords), v);
            sites.push(Site::new(coords));
        }

        let unit = |d: usize| {
            let mut e = DVec::zeros(dims);
            e[d] = 1.0;
            e
        };
        let primitive = (0..dims).map(unit).collect();
        let supercell = (0..dims).map(|d| unit(d) * extent[d] as f64).collect();

        Self {
            sites,
            dims,
            primitive,
            supercell,
            origin: DVec::zeros(dims),
            index,
        }
    }

    /// Open chain of `n` sites at x = 0, 1, …, n-1.
    pub fn chain(n: usize) -> Self {
        Self::hypercubic(&[n])
    }

    /// `nx × ny` square lattice, x slowest.
    pub fn square(nx: usize, ny: usize) -> Self {
        Self::hypercubic(&[nx, ny])
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Coordinate dimension of every site.
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, index: usize) -> Option<&Site> {
        self.sites.get(index)
    }

    pub fn primitive(&self) -> &[DVec] {
        &self.primitive
    }

    pub fn supercell(&self) -> &[DVec] {
        &self.supercell
    }

    pub fn origin(&self) -> &DVec {
        &self.origin
    }

    /// Sites with their indices, in index order.
    pub fn iter(&self) -> impl Iterator<Item = ResolvedSite<'_>> + '_ {
        self.sites
            .iter()
            .enumerate()
            .map(|(index, site)| ResolvedSite { index, site })
    }

    /// Index of the site at `site`'s coordinates, if it belongs to the lattice.
    pub fn site_index(&self, site: &Site) -> Option<usize> {
        if site.dims() != self.dims {
            return None;
        }
        self.index.get(&coord_key(&site.coords)).copied()
    }

    pub fn resolve(&self, site: &Site) -> Option<ResolvedSite<'_>> {
        self.site_index(site).map(|index| ResolvedSite {
            index,
            site: &self.sites[index],
        })
    }

    /// The lattice with every site displaced by `r`, in the same order.
    pub fn translated(&self, r: &DVec) -> Result<Lattice> {
        if r.len() != self.dims {
            return Err(LatticeError::DimensionMismatch {
                expected: self.dims,
                found: r.len(),
            });
        }
        let sites = self.sites.iter().map(|s| s.translated(r)).collect();
        Lattice::from_sites(sites)?.with_geometry(
            self.primitive.clone(),
            self.supercell.clone(),
            &self.origin + r,
        )
    }

    /// Integer supercell coordinates of the cell containing `site`.
    ///
    /// Returns `None` when the lattice has no supercell or the site cannot
    /// be expressed in it.
    pub fn supercell_windings(&self, site: &Site) -> Option<Vec<i64>> {
        if self.supercell.is_empty() || site.dims() != self.dims {
            return None;
        }
        let m = DMatrix::from_columns(&self.supercell);
        let rel = &site.coords - &self.origin;
        let gram_inv = (m.transpose() * &m).try_inverse()?;
        let frac = gram_inv * m.transpose() * rel;
        Some(frac.iter().map(|f| (f + WINDING_SLACK).floor() as i64).collect())
    }

    /// Canonical half of the `shell`-th shell of Bravais offsets.
    ///
    /// Shell 1 holds the shortest nonzero lattice vectors, shell 2 the next
    /// length, and so on. Of each ±R pair only the vector whose first nonzero
    /// coefficient is positive is kept. Empty without primitive vectors.
    pub fn neighbor_offsets(&self, shell: usize) -> Vec<DVec> {
        if shell == 0 || self.primitive.is_empty() {
            return Vec::new();
        }

        let range = shell as i64 + 1;
        let d = self.primitive.len();
        let mut candidates: Vec<(f64, DVec)> = Vec::new();
        let mut coeffs = vec![-range; d];

        loop {
            let first_nonzero = coeffs.iter().find(|&&c| c != 0);
            if matches!(first_nonzero, Some(&c) if c > 0) {
                let r = self
                    .primitive
                    .iter()
                    .zip(coeffs.iter())
                    .fold(DVec::zeros(self.dims), |acc, (a, &c)| acc + a * c as f64);
                candidates.push((r.norm(), r));
            }

            // Odometer step over [-range, range]^d.
            let mut axis = 0;
            while axis < d {
                coeffs[axis] += 1;
                if coeffs[axis] <= range {
                    break;
                }
                coeffs[axis] = -range;
                axis += 1;
            }
            if axis == d {
                break;
            }
        }

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        let radii = shell_radii(candidates.iter().map(|c| c.0));
        let Some(&radius) = radii.get(shell - 1) else {
            return Vec::new();
        };
        candidates
            .into_iter()
            .filter(|(norm, _)| same_shell(*norm, radius))
            .map(|(_, r)| r)
            .collect()
    }

    /// Sorted distinct nonzero distances between pairs of sites.
    pub fn distance_shells(&self) -> Vec<f64> {
        let mut dists = Vec::new();
        for i in 0..self.sites.len() {
            for j in (i + 1)..self.sites.len() {
                dists.push(self.sites[i].distance(&self.sites[j]));
            }
        }
        dists.sort_by(f64::total_cmp);
        shell_radii(dists.into_iter())
    }
}

fn same_shell(a: f64, b: f64) -> bool {
    (a - b).abs() <= SHELL_TOL * a.abs().max(b.abs()).max(1.0)
}

/// Distinct values of a sorted sequence, grouped with [`SHELL_TOL`].
fn shell_radii(sorted: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut radii: Vec<f64> = Vec::new();
    for r in sorted {
        if r <= SHELL_TOL {
            continue;
        }
        match radii.last() {
            Some(&last) if same_shell(last, r) => {}
            _ => radii.push(r),
        }
    }
    radii
}

impl PartialEq for Lattice {
    fn eq(&self, other: &Self) -> bool {
        self.sites == other.sites
    }
}

impl<'a> IntoIterator for &'a Lattice {
    type Item = ResolvedSite<'a>;
    type IntoIter = Box<dyn Iterator<Item = ResolvedSite<'a>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
