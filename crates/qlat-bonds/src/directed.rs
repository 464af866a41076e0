//! Directed bonds.
//!
//! A directed relation maps each site to the sites it points at. Its
//! undirected adjacency is derived: `a ~ b` iff `b` is a destination of `a`
//! or `a` is a destination of `b`.

use crate::{AdaptBonds, Bonds, BondsError, Result};
use qlat_lattice::{Lattice, ResolvedSite, Site};
use std::fmt;
use std::sync::Arc;

pub trait DirectedBonds: Bonds {
    /// Indices in `lattice` that `site` points to.
    fn destinations(&self, lattice: &Lattice, site: &Site) -> Vec<usize>;

    /// The single destination of `site` in `lattice`.
    ///
    /// `Ok(None)` when there is none; an error when several distinct sites
    /// match, since the mapping is then not single-valued.
    fn destination_in(&self, lattice: &Lattice, site: &Site) -> Result<Option<usize>> {
        let mut dests = self.destinations(lattice, site);
        dests.sort_unstable();
        dests.dedup();
        match dests.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(BondsError::AmbiguousDestination {
                site: site.to_string(),
                count: dests.len(),
            }),
        }
    }

    /// [`destination_in`](Self::destination_in) on the bound lattice.
    fn destination(&self, site: &Site) -> Result<Option<ResolvedSite<'_>>> {
        let lattice = self.lattice().ok_or(BondsError::UnboundLattice)?;
        Ok(self.destination_in(lattice, site)?.map(|index| ResolvedSite {
            index,
            site: &lattice.sites()[index],
        }))
    }

    /// `lattice` with every site replaced by its destination, same order.
    fn map_lattice(&self, lattice: &Lattice) -> Result<Lattice> {
        let mut sites = Vec::with_capacity(lattice.len());
        for rs in lattice.iter() {
            let j = self
                .destination_in(lattice, rs.site)?
                .ok_or(BondsError::MissingDestination { index: rs.index })?;
            sites.push(lattice.sites()[j].clone());
        }
        Ok(Lattice::from_sites(sites)?)
    }
}

/// Derived adjacency of a directed relation on `lattice`.
pub fn directed_adjacent<B: DirectedBonds + ?Sized>(
    bonds: &B,
    lattice: &Lattice,
    a: &Site,
    b: &Site,
) -> bool {
    let (Some(i), Some(j)) = (lattice.site_index(a), lattice.site_index(b)) else {
        return false;
    };
    bonds.destinations(lattice, a).contains(&j) || bonds.destinations(lattice, b).contains(&i)
}

/// Sites above `index` connected to it in either direction. O(N) per site.
pub fn directed_targets_above<B: DirectedBonds + ?Sized>(
    bonds: &B,
    lattice: &Lattice,
    index: usize,
) -> Vec<usize> {
    let Some(site) = lattice.site(index) else {
        return Vec::new();
    };
    let mut targets: Vec<usize> = bonds
        .destinations(lattice, site)
        .into_iter()
        .filter(|&j| j > index)
        .collect();
    for t in lattice.iter().skip(index + 1) {
        if bonds.destinations(lattice, t.site).contains(&index) {
            targets.push(t.index);
        }
    }
    targets.sort_unstable();
    targets.dedup();
    targets
}

type DestinationFn = dyn Fn(&Site) -> Vec<Site> + Send + Sync;

/// Directed relation given by a closure from a site to its destination
/// sites. Destinations that are not lattice sites are ignored.
#[derive(Clone)]
pub struct DirectedFn {
    lattice: Option<Arc<Lattice>>,
    f: Arc<DestinationFn>,
}

impl DirectedFn {
    pub fn new(
        lattice: Arc<Lattice>,
        f: impl Fn(&Site) -> Vec<Site> + Send + Sync + 'static,
    ) -> Self {
        Self {
            lattice: Some(lattice),
            f: Arc::new(f),
        }
    }

    /// Relation without a lattice; one must be supplied when it is used.
    pub fn unbound(f: impl Fn(&Site) -> Vec<Site> + Send + Sync + 'static) -> Self {
        Self {
            lattice: None,
            f: Arc::new(f),
        }
    }
}

impl fmt::Debug for DirectedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectedFn")
            .field("bound", &self.lattice.is_some())
            .finish_non_exhaustive()
    }
}

impl Bonds for DirectedFn {
    fn lattice(&self) -> Option<&Arc<Lattice>> {
        self.lattice.as_ref()
    }

    fn is_adjacent(&self, a: &Site, b: &Site) -> bool {
        match &self.lattice {
            Some(l) => directed_adjacent(self, l, a, b),
            None => {
                (self.f)(a).iter().any(|d| d.approx_eq(b, f64::EPSILON.sqrt()))
                    || (self.f)(b).iter().any(|d| d.approx_eq(a, f64::EPSILON.sqrt()))
            }
        }
    }

    fn targets_above(&self, lattice: &Lattice, index: usize) -> Vec<usize> {
        directed_targets_above(self, lattice, index)
    }
}

impl DirectedBonds for DirectedFn {
    fn destinations(&self, lattice: &Lattice, site: &Site) -> Vec<usize> {
        (self.f)(site)
            .iter()
            .filter_map(|d| lattice.site_index(d))
            .collect()
    }
}

impl AdaptBonds for DirectedFn {}
