//! The `Bonds` abstraction and its pair-iteration protocol.
//!
//! A bonds object only has to answer "are these two sites adjacent?". Pair
//! enumeration is built on top of that: for every site `i`, in index order,
//! [`Bonds::targets_above`] lists the adjacent sites `j > i` in ascending
//! order, and [`BondPairs`] walks those lists lazily. The default
//! `targets_above` scans every higher-indexed site, which is O(N²) per
//! lattice; relations with an explicit structure override it.

use crate::{same_lattice, BondsError, Result};
use qlat_lattice::{Lattice, ResolvedSite, Site};
use std::fmt;
use std::sync::Arc;

/// Symmetric adjacency relation over the sites of a lattice.
pub trait Bonds {
    /// Lattice the relation lives on, or `None` while unbound.
    fn lattice(&self) -> Option<&Arc<Lattice>>;

    /// Whether `a` and `b` are connected. Symmetric in its arguments.
    fn is_adjacent(&self, a: &Site, b: &Site) -> bool;

    /// Sites `j > index` of `lattice` adjacent to site `index`, ascending.
    fn targets_above(&self, lattice: &Lattice, index: usize) -> Vec<usize> {
        scan_targets(self, lattice, index)
    }

    /// Targets above `index` on the relation's own lattice, for relations
    /// that store them. [`BondPairs`] checks lattice identity once per
    /// iteration and then prefers this over `targets_above`.
    fn own_targets_above(&self, _index: usize) -> Option<Vec<usize>> {
        None
    }
}

/// Reference `targets_above`: test every higher-indexed site.
pub fn scan_targets<B: Bonds + ?Sized>(bonds: &B, lattice: &Lattice, index: usize) -> Vec<usize> {
    let Some(site) = lattice.site(index) else {
        return Vec::new();
    };
    lattice
        .iter()
        .skip(index + 1)
        .filter(|t| bonds.is_adjacent(site, t.site))
        .map(|t| t.index)
        .collect()
}

impl<B: Bonds + ?Sized> Bonds for &B {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        (**self).lattice()
    }

    fn is_adjacent(&self, a: &Site, b: &Site) -> bool {
        (**self).is_adjacent(a, b)
    }

    fn targets_above(&self, lattice: &Lattice, index: usize) -> Vec<usize> {
        (**self).targets_above(lattice, index)
    }

    fn own_targets_above(&self, index: usize) -> Option<Vec<usize>> {
        (**self).own_targets_above(index)
    }
}

impl<B: Bonds + ?Sized> Bonds for Box<B> {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        (**self).lattice()
    }

    fn is_adjacent(&self, a: &Site, b: &Site) -> bool {
        (**self).is_adjacent(a, b)
    }

    fn targets_above(&self, lattice: &Lattice, index: usize) -> Vec<usize> {
        (**self).targets_above(lattice, index)
    }

    fn own_targets_above(&self, index: usize) -> Option<Vec<usize>> {
        (**self).own_targets_above(index)
    }
}

/// Pair enumeration, available on every `Bonds` including trait objects.
pub trait BondsExt: Bonds {
    /// Adjacent pairs on the bound lattice. Fails for unbound bonds.
    fn pairs(&self) -> Result<BondPairs<'_, Self>> {
        let lattice = self.lattice().ok_or(BondsError::UnboundLattice)?;
        Ok(BondPairs::new(self, lattice))
    }

    /// Adjacent pairs on an explicitly supplied lattice.
    fn pairs_in<'a>(&'a self, lattice: &'a Lattice) -> BondPairs<'a, Self> {
        BondPairs::new(self, lattice)
    }
}

impl<B: Bonds + ?Sized> BondsExt for B {}

/// Re-projection of bonds onto another lattice.
pub trait AdaptBonds: Bonds + Sized {
    /// The same relation expressed on `lattice`.
    ///
    /// The default accepts only the lattice the bonds already live on.
    fn adapt_bonds(&self, lattice: &Arc<Lattice>) -> Result<Self>
    where
        Self: Clone,
    {
        match self.lattice() {
            Some(own) if same_lattice(own, lattice) => Ok(self.clone()),
            _ => Err(BondsError::LatticeMismatch),
        }
    }
}

/// Lazy iterator over adjacent pairs `(i, j)` with `i < j`.
///
/// State is the site whose targets are being emitted plus the targets not
/// yet yielded; the next site's targets are computed only once the current
/// list is exhausted.
pub struct BondPairs<'a, B: ?Sized> {
    bonds: &'a B,
    lattice: &'a Lattice,
    /// `lattice` is the one the bonds are bound to.
    own: bool,
    current: usize,
    next_site: usize,
    targets: std::vec::IntoIter<usize>,
}

impl<'a, B: Bonds + ?Sized> BondPairs<'a, B> {
    pub fn new(bonds: &'a B, lattice: &'a Lattice) -> Self {
        let own = bonds
            .lattice()
            .is_some_and(|l| std::ptr::eq(&**l, lattice) || **l == *lattice);
        Self {
            bonds,
            lattice,
            own,
            current: 0,
            next_site: 0,
            targets: Vec::new().into_iter(),
        }
    }
}

fn resolved(lattice: &Lattice, index: usize) -> ResolvedSite<'_> {
    ResolvedSite {
        index,
        site: &lattice.sites()[index],
    }
}

impl<'a, B: Bonds + ?Sized> Iterator for BondPairs<'a, B> {
    type Item = (ResolvedSite<'a>, ResolvedSite<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(j) = self.targets.next() {
                debug_assert!(j > self.current, "targets must lie above the source site");
                let lattice: &'a Lattice = self.lattice;
                return Some((resolved(lattice, self.current), resolved(lattice, j)));
            }
            if self.next_site >= self.lattice.len() {
                return None;
            }
            self.current = self.next_site;
            self.next_site += 1;
            let stored = if self.own {
                self.bonds.own_targets_above(self.current)
            } else {
                None
            };
            self.targets = stored
                .unwrap_or_else(|| self.bonds.targets_above(self.lattice, self.current))
                .into_iter();
        }
    }
}

/// The empty relation. Unbound, so it can accompany any lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoBonds;

impl Bonds for NoBonds {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        None
    }

    fn is_adjacent(&self, _a: &Site, _b: &Site) -> bool {
        false
    }

    fn targets_above(&self, _lattice: &Lattice, _index: usize) -> Vec<usize> {
        Vec::new()
    }
}

impl AdaptBonds for NoBonds {
    fn adapt_bonds(&self, _lattice: &Arc<Lattice>) -> Result<Self> {
        Ok(NoBonds)
    }
}

/// Relative tolerance for matching a distance shell.
const SHELL_MATCH_TOL: f64 = 1e-8;

/// Bonds given by a predicate on the distance between two sites.
#[derive(Clone)]
pub struct SiteDistance {
    lattice: Arc<Lattice>,
    predicate: Arc<dyn Fn(f64) -> bool + Send + Sync>,
}

impl SiteDistance {
    pub fn new(
        lattice: Arc<Lattice>,
        predicate: impl Fn(f64) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            lattice,
            predicate: Arc::new(predicate),
        }
    }

    /// Sites closer than `r` (and distinct).
    pub fn within(lattice: Arc<Lattice>, r: f64) -> Self {
        Self::new(lattice, move |d| d > 0.0 && d < r)
    }

    /// Sites separated by the `k`-th smallest inter-site distance.
    ///
    /// Shells are taken from the lattice itself; if it has fewer than `k`
    /// distinct distances the relation is empty.
    pub fn nearest(lattice: Arc<Lattice>, k: usize) -> Self {
        let radius = k
            .checked_sub(1)
            .and_then(|i| lattice.distance_shells().get(i).copied());
        match radius {
            Some(r) => Self::new(lattice, move |d| (d - r).abs() <= SHELL_MATCH_TOL * r.max(1.0)),
            None => Self::new(lattice, |_| false),
        }
    }
}

impl fmt::Debug for SiteDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteDistance")
            .field("n_sites", &self.lattice.len())
            .finish_non_exhaustive()
    }
}

impl Bonds for SiteDistance {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        Some(&self.lattice)
    }

    fn is_adjacent(&self, a: &Site, b: &Site) -> bool {
        a.dims() == b.dims() && (self.predicate)(a.distance(b))
    }
}

impl AdaptBonds for SiteDistance {
    /// Distance predicates do not depend on the lattice: rebind unchanged.
    fn adapt_bonds(&self, lattice: &Arc<Lattice>) -> Result<Self> {
        Ok(Self {
            lattice: lattice.clone(),
            predicate: self.predicate.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Arc<Lattice> {
        Arc::new(Lattice::chain(n))
    }

    fn indices<B: Bonds + ?Sized>(b: &B, lat: &Lattice) -> Vec<(usize, usize)> {
        b.pairs_in(lat).map(|(s, t)| (s.index, t.index)).collect()
    }

    #[test]
    fn test_nearest_on_chain() {
        let lat = chain(4);
        let nn = SiteDistance::nearest(lat.clone(), 1);
        assert_eq!(indices(&nn, &lat), vec![(0, 1), (1, 2), (2, 3)]);
        let nnn = SiteDistance::nearest(lat.clone(), 2);
        assert_eq!(indices(&nnn, &lat), vec![(0, 2), (1, 3)]);
        assert!(indices(&SiteDistance::nearest(lat.clone(), 9), &lat).is_empty());
        assert!(indices(&SiteDistance::nearest(lat.clone(), 0), &lat).is_empty());
    }

    #[test]
    fn test_pairs_ordered_and_unique() {
        let lat = Arc::new(Lattice::square(3, 3));
        let b = SiteDistance::within(lat.clone(), 1.5);
        let pairs = indices(&b, &lat);
        // 12 nearest + 8 diagonal bonds.
        assert_eq!(pairs.len(), 20);
        let mut sorted = pairs.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, pairs);
        assert!(pairs.iter().all(|(i, j)| i < j));
    }

    #[test]
    fn test_is_adjacent_symmetric() {
        let lat = chain(3);
        let b = SiteDistance::nearest(lat.clone(), 1);
        let s0 = lat.site(0).unwrap();
        let s1 = lat.site(1).unwrap();
        assert!(b.is_adjacent(s0, s1));
        assert!(b.is_adjacent(s1, s0));
        assert!(!b.is_adjacent(s0, s0));
    }

    #[test]
    fn test_no_bonds() {
        let lat = chain(3);
        assert!(NoBonds.lattice().is_none());
        assert!(indices(&NoBonds, &lat).is_empty());
        assert_eq!(NoBonds.pairs().err(), Some(BondsError::UnboundLattice));
    }

    #[test]
    fn test_pairs_through_trait_object() {
        let lat = chain(3);
        let boxed: Box<dyn Bonds> = Box::new(SiteDistance::nearest(lat.clone(), 1));
        assert_eq!(boxed.pairs().unwrap().count(), 2);
    }

    #[test]
    fn test_iteration_restartable() {
        let lat = chain(5);
        let b = SiteDistance::nearest(lat.clone(), 1);
        assert_eq!(indices(&b, &lat), indices(&b, &lat));
    }

    #[test]
    fn test_site_distance_adapts_to_any_lattice() {
        let b = SiteDistance::nearest(chain(3), 1);
        let bigger = chain(5);
        let adapted = b.adapt_bonds(&bigger).unwrap();
        assert_eq!(indices(&adapted, &bigger).len(), 4);
    }
}
