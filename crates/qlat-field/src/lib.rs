//! Magnetic gauge fields for lattice models.
//!
//! The operator builder only needs one capability from a field: the line
//! integral of its vector potential along the straight segment between two
//! points. Hopping amplitudes then pick up the Peierls factor
//! exp(-2πi ∫A·dl), with fluxes measured in units of the flux quantum.
//!
//! Closed-form gauges work in the xy-plane; one-dimensional coordinates are
//! taken to lie on the x-axis and higher components are ignored.

pub mod gauge;

pub use gauge::{FieldSum, LandauGauge, NoField, PointFlux, PotentialField, SymmetricGauge};

use nalgebra::DVector;

/// Vector-potential line integral between two points.
pub trait Field {
    /// ∫ A·dl along the straight segment from `a` to `b`.
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64;
}

impl<F: Field + ?Sized> Field for &F {
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        (**self).line_integral(a, b)
    }
}

impl<F: Field + ?Sized> Field for Box<F> {
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        (**self).line_integral(a, b)
    }
}

/// (x, y) of a point, padding missing components with zero.
pub(crate) fn xy(p: &DVector<f64>) -> (f64, f64) {
    let x = p.get(0).copied().unwrap_or(0.0);
    let y = p.get(1).copied().unwrap_or(0.0);
    (x, y)
}
