//! Boundary conditions.
//!
//! A finite sample of a Bravais lattice has one boundary per supercell
//! vector. Sites that fall outside the sample are either dropped (open),
//! wrapped back (periodic), or wrapped back with a phase e^{iθ} per winding
//! (twisted).

use crate::{Lattice, Site};
use log::trace;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Boundary {
    #[default]
    Open,
    Periodic,
    /// Periodic with phase e^{iθ} acquired per crossing.
    Twisted(f64),
}

impl Boundary {
    /// Phase picked up by crossing the boundary `winding` times, or `None`
    /// if the boundary cannot be crossed.
    fn crossing_phase(self, winding: i64) -> Option<Complex64> {
        match self {
            Boundary::Open => None,
            Boundary::Periodic => Some(Complex64::new(1.0, 0.0)),
            Boundary::Twisted(theta) => Some(Complex64::from_polar(1.0, theta * winding as f64)),
        }
    }
}

/// One [`Boundary`] per supercell axis. Axes without an entry are open.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryConditions {
    pub axes: Vec<Boundary>,
}

impl BoundaryConditions {
    pub fn new(axes: Vec<Boundary>) -> Self {
        Self { axes }
    }

    /// Open along every axis.
    pub fn open() -> Self {
        Self::default()
    }

    /// Periodic along the first `n` axes.
    pub fn periodic(n: usize) -> Self {
        Self {
            axes: vec![Boundary::Periodic; n],
        }
    }

    pub fn axis(&self, k: usize) -> Boundary {
        self.axes.get(k).copied().unwrap_or_default()
    }

    /// Map `site` into the fundamental domain of `lattice`.
    ///
    /// Returns the boundary phase and the index of the wrapped site. The index
    /// is `None` when the site lies outside across an open boundary, or when
    /// the wrapped position is not a lattice site.
    pub fn shift_site(&self, lattice: &Lattice, site: &Site) -> (Complex64, Option<usize>) {
        let one = Complex64::new(1.0, 0.0);
        if let Some(i) = lattice.site_index(site) {
            return (one, Some(i));
        }
        let Some(windings) = lattice.supercell_windings(site) else {
            return (one, None);
        };

        let mut phase = one;
        let mut coords = site.coords.clone();
        for (k, (&n, period)) in windings.iter().zip(lattice.supercell()).enumerate() {
            if n == 0 {
                continue;
            }
            let Some(p) = self.axis(k).crossing_phase(n) else {
                return (one, None);
            };
            phase *= p;
            coords -= period * n as f64;
        }

        let wrapped = lattice.site_index(&Site::new(coords));
        trace!("wrapped {site} with windings {windings:?} -> {wrapped:?}");
        (phase, wrapped)
    }
}
