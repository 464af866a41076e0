//! Translations by a constant displacement.
//!
//! `Translation` maps a site at `x` to the lattice site at `x + R`. It can be
//! created before its lattice is known (unbound); anything that needs the
//! lattice then fails with [`BondsError::UnboundLattice`] unless the lattice
//! is passed in explicitly, which is what the operator builder does.

use crate::directed::directed_adjacent;
use crate::{same_lattice, AdaptBonds, Bonds, BondsError, DirectedBonds, Result};
use qlat_lattice::{DVec, Lattice, ResolvedSite, Site};
use std::ops::{Add, Sub};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    lattice: Option<Arc<Lattice>>,
    displacement: DVec,
}

/// Coordinate tolerance when matching `x + R` against lattice sites.
fn match_tol() -> f64 {
    f64::EPSILON.sqrt()
}

fn check_dims(lattice: &Lattice, r: &DVec) -> Result<()> {
    if r.len() != lattice.dims() {
        return Err(BondsError::DimensionMismatch {
            expected: lattice.dims(),
            found: r.len(),
        });
    }
    Ok(())
}

impl Translation {
    pub fn new(lattice: Arc<Lattice>, displacement: DVec) -> Result<Self> {
        check_dims(&lattice, &displacement)?;
        Ok(Self {
            lattice: Some(lattice),
            displacement,
        })
    }

    /// Translation whose lattice is supplied later.
    pub fn unbound(displacement: DVec) -> Self {
        Self {
            lattice: None,
            displacement,
        }
    }

    /// The same displacement on `lattice`.
    pub fn bind(&self, lattice: Arc<Lattice>) -> Result<Self> {
        Self::new(lattice, self.displacement.clone())
    }

    pub fn displacement(&self) -> &DVec {
        &self.displacement
    }

    /// Translation by `-R` on the same lattice.
    pub fn inv(&self) -> Self {
        Self {
            lattice: self.lattice.clone(),
            displacement: -&self.displacement,
        }
    }

    /// Translation by `R₁ + R₂`. Bound operands must share a lattice.
    pub fn compose(&self, other: &Translation) -> Result<Self> {
        if self.displacement.len() != other.displacement.len() {
            return Err(BondsError::DimensionMismatch {
                expected: self.displacement.len(),
                found: other.displacement.len(),
            });
        }
        let lattice = match (&self.lattice, &other.lattice) {
            (Some(a), Some(b)) if !same_lattice(a, b) => return Err(BondsError::LatticeMismatch),
            (Some(a), _) | (None, Some(a)) => Some(a.clone()),
            (None, None) => None,
        };
        Ok(Self {
            lattice,
            displacement: &self.displacement + &other.displacement,
        })
    }

    fn bound_lattice(&self) -> Result<&Arc<Lattice>> {
        self.lattice.as_ref().ok_or(BondsError::UnboundLattice)
    }

    /// Destination of `site`, or `None` if `x + R` is not a lattice site.
    pub fn apply(&self, site: &Site) -> Result<Option<Site>> {
        Ok(self.destination(site)?.map(|r| r.site.clone()))
    }

    /// Destination of `site` under the inverse translation.
    pub fn apply_inverse(&self, site: &Site) -> Result<Option<Site>> {
        self.inv().apply(site)
    }

    /// Forward and inverse destinations of `site`, those that exist.
    pub fn adjacent_sites(&self, site: &Site) -> Result<Vec<ResolvedSite<'_>>> {
        let lattice = self.bound_lattice()?;
        let mut out = Vec::with_capacity(2);
        for dest in [self.destination_in(lattice, site)?, self.inv().destination_in(lattice, site)?]
            .into_iter()
            .flatten()
        {
            out.push(ResolvedSite {
                index: dest,
                site: &lattice.sites()[dest],
            });
        }
        Ok(out)
    }

    /// `lattice` with every site shifted by `R`, in the same order.
    ///
    /// Unlike [`DirectedBonds::map_lattice`], shifted sites need not belong
    /// to `lattice`; this is how periodic copies are laid out.
    pub fn translate_lattice(&self, lattice: &Lattice) -> Result<Lattice> {
        check_dims(lattice, &self.displacement)?;
        Ok(lattice.translated(&self.displacement)?)
    }
}

impl Bonds for Translation {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        self.lattice.as_ref()
    }

    fn is_adjacent(&self, a: &Site, b: &Site) -> bool {
        if a.dims() != self.displacement.len() || b.dims() != a.dims() {
            return false;
        }
        match &self.lattice {
            Some(l) => directed_adjacent(self, l, a, b),
            None => {
                b.approx_eq(&a.translated(&self.displacement), match_tol())
                    || a.approx_eq(&b.translated(&self.displacement), match_tol())
            }
        }
    }

    /// Forward and backward destinations above `index`. Uses the same
    /// `sqrt(ε)` match as [`DirectedBonds::destinations`], so iteration and
    /// adjacency queries agree. O(N) per site.
    fn targets_above(&self, lattice: &Lattice, index: usize) -> Vec<usize> {
        let Some(site) = lattice.site(index) else {
            return Vec::new();
        };
        let mut targets: Vec<usize> = self
            .destinations(lattice, site)
            .into_iter()
            .chain(self.inv().destinations(lattice, site))
            .filter(|&j| j > index)
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }
}

impl DirectedBonds for Translation {
    /// Linear scan for sites within `sqrt(ε)` of `x + R`.
    fn destinations(&self, lattice: &Lattice, site: &Site) -> Vec<usize> {
        if site.dims() != self.displacement.len() {
            return Vec::new();
        }
        let target = site.translated(&self.displacement);
        lattice
            .iter()
            .filter(|c| c.site.approx_eq(&target, match_tol()))
            .map(|c| c.index)
            .collect()
    }
}

impl AdaptBonds for Translation {
    /// A displacement is meaningful on any lattice of the same dimension.
    fn adapt_bonds(&self, lattice: &Arc<Lattice>) -> Result<Self> {
        self.bind(lattice.clone())
    }
}

impl Add<&Translation> for &Site {
    type Output = Result<Option<Site>>;

    fn add(self, t: &Translation) -> Self::Output {
        t.apply(self)
    }
}

impl Sub<&Translation> for &Site {
    type Output = Result<Option<Site>>;

    fn sub(self, t: &Translation) -> Self::Output {
        t.apply_inverse(self)
    }
}

impl Add<&Translation> for &Lattice {
    type Output = Result<Lattice>;

    fn add(self, t: &Translation) -> Self::Output {
        t.translate_lattice(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdjacencyMatrix, BondsExt};

    fn v(xs: &[f64]) -> DVec {
        DVec::from_column_slice(xs)
    }

    /// Four sites at (1,1), (1,2), (2,1), (2,2).
    fn plaquette() -> Arc<Lattice> {
        let sites = [[1.0, 1.0], [1.0, 2.0], [2.0, 1.0], [2.0, 2.0]]
            .iter()
            .map(|c| Site::from_slice(c))
            .collect();
        Arc::new(Lattice::from_sites(sites).unwrap())
    }

    #[test]
    fn test_shift_leaves_lattice() {
        let lat = plaquette();
        let t = Translation::new(lat.clone(), v(&[1.0, 0.0])).unwrap();
        let start = Site::from_slice(&[1.0, 1.0]);
        let once = (&start + &t).unwrap().unwrap();
        assert_eq!(once, Site::from_slice(&[2.0, 1.0]));
        assert_eq!((&once + &t).unwrap(), None);
        assert_eq!((&once - &t).unwrap(), Some(start));
    }

    #[test]
    fn test_dimension_checked() {
        let lat = plaquette();
        assert_eq!(
            Translation::new(lat, v(&[1.0])),
            Err(BondsError::DimensionMismatch { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_unbound_usage_fails() {
        let t = Translation::unbound(v(&[1.0]));
        let s = Site::from_slice(&[0.0]);
        assert_eq!(&s + &t, Err(BondsError::UnboundLattice));
        assert_eq!(t.adjacent_sites(&s).err(), Some(BondsError::UnboundLattice));
        // Still usable with an explicit lattice.
        let lat = Lattice::chain(3);
        assert_eq!(t.destination_in(&lat, &s), Ok(Some(1)));
        assert_eq!(t.pairs_in(&lat).count(), 2);
        assert!(t.is_adjacent(&s, &Site::from_slice(&[1.0])));
    }

    #[test]
    fn test_adjacent_sites_forward_and_back() {
        let lat = Arc::new(Lattice::chain(3));
        let t = Translation::new(lat.clone(), v(&[1.0])).unwrap();
        let mid: Vec<usize> = t
            .adjacent_sites(lat.site(1).unwrap())
            .unwrap()
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(mid, vec![2, 0]);
        let edge = t.adjacent_sites(lat.site(0).unwrap()).unwrap();
        assert_eq!(edge.len(), 1);
    }

    #[test]
    fn test_translate_lattice() {
        let lat = plaquette();
        let t = Translation::new(lat.clone(), v(&[2.0, 0.0])).unwrap();
        let copy = (&*lat + &t).unwrap();
        assert_eq!(copy.len(), 4);
        assert_eq!(copy.site(0).unwrap(), &Site::from_slice(&[3.0, 1.0]));
        assert_eq!(copy.site(3).unwrap(), &Site::from_slice(&[4.0, 2.0]));
    }

    #[test]
    fn test_compose() {
        let lat = Arc::new(Lattice::square(3, 3));
        let tx = Translation::new(lat.clone(), v(&[1.0, 0.0])).unwrap();
        let ty = Translation::unbound(v(&[0.0, 1.0]));
        let diag = tx.compose(&ty).unwrap();
        assert_eq!(diag.displacement(), &v(&[1.0, 1.0]));
        assert!(diag.lattice().is_some());
        let other = Translation::new(Arc::new(Lattice::square(2, 2)), v(&[0.0, 1.0])).unwrap();
        assert_eq!(tx.compose(&other), Err(BondsError::LatticeMismatch));
    }

    #[test]
    fn test_translation_pairs_into_adjacency() {
        let lat = Arc::new(Lattice::square(2, 3));
        let tx = Translation::new(lat.clone(), v(&[1.0, 0.0])).unwrap();
        let ty = Translation::new(lat.clone(), v(&[0.0, 1.0])).unwrap();
        let adj = AdjacencyMatrix::from_bonds(&[&tx, &ty]).unwrap();
        // 3 bonds along x, 2·2 along y.
        assert_eq!(adj.n_pairs(), 7);
        let either = |a: &Site, b: &Site| tx.is_adjacent(a, b) || ty.is_adjacent(a, b);
        let scanned = AdjacencyMatrix::from_fn(lat.clone(), either);
        assert_eq!(adj, scanned);
    }

    #[test]
    fn test_pairs_match_adjacency_near_tolerance() {
        // The second site sits 1e-7 past x + R: closer than the lattice's
        // coordinate resolution, farther than the translation tolerance.
        let sites = vec![Site::from_slice(&[0.0]), Site::from_slice(&[1.0000001])];
        let lat = Arc::new(Lattice::from_sites(sites).unwrap());
        let t = Translation::new(lat.clone(), v(&[1.0])).unwrap();
        let (a, b) = (lat.site(0).unwrap(), lat.site(1).unwrap());
        assert!(!t.is_adjacent(a, b));
        assert_eq!(t.destination(a).unwrap(), None);
        assert_eq!(t.pairs().unwrap().count(), 0);

        let sites = vec![Site::from_slice(&[0.0]), Site::from_slice(&[1.0])];
        let exact = Arc::new(Lattice::from_sites(sites).unwrap());
        let t = Translation::new(exact.clone(), v(&[1.0])).unwrap();
        let pairs: Vec<_> = t.pairs().unwrap().map(|(s, u)| (s.index, u.index)).collect();
        assert_eq!(pairs, vec![(0, 1)]);
        assert!(t.is_adjacent(exact.site(0).unwrap(), exact.site(1).unwrap()));
    }

    #[test]
    fn test_adapt_rebinds() {
        let t = Translation::new(Arc::new(Lattice::chain(2)), v(&[1.0])).unwrap();
        let bigger = Arc::new(Lattice::chain(5));
        let adapted = t.adapt_bonds(&bigger).unwrap();
        assert_eq!(adapted.pairs().unwrap().count(), 4);
    }
}
