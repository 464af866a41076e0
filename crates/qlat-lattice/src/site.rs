//! Lattice sites.
//!
//! A [`Site`] is a point in space with no lattice attached. A
//! [`ResolvedSite`] additionally carries the stable index the site has inside
//! one specific lattice, and borrows the site from that lattice.

use crate::DVec;
use std::fmt;

/// Point of a lattice, identified by its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub coords: DVec,
}

impl Site {
    pub fn new(coords: DVec) -> Self {
        Self { coords }
    }

    pub fn from_slice(coords: &[f64]) -> Self {
        Self {
            coords: DVec::from_column_slice(coords),
        }
    }

    /// Number of spatial coordinates.
    pub fn dims(&self) -> usize {
        self.coords.len()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Site) -> f64 {
        (&self.coords - &other.coords).norm()
    }

    /// Coordinate-wise comparison with absolute tolerance `tol`.
    pub fn approx_eq(&self, other: &Site, tol: f64) -> bool {
        self.dims() == other.dims()
            && self
                .coords
                .iter()
                .zip(other.coords.iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// The site displaced by `r`.
    pub fn translated(&self, r: &DVec) -> Site {
        Site::new(&self.coords + r)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Site(")?;
        for (k, x) in self.coords.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, ")")
    }
}

/// Site bound to its index in a particular lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSite<'a> {
    pub index: usize,
    pub site: &'a Site,
}

impl<'a> ResolvedSite<'a> {
    pub fn coords(&self) -> &'a DVec {
        &self.site.coords
    }
}
