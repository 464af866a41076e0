//! Concrete gauges.
//!
//! | gauge             | vector potential        | ∫ A·dl from 1 to 2          |
//! |-------------------|-------------------------|-----------------------------|
//! | [`LandauGauge`]   | (-B·y, 0)               | -B·(x₂-x₁)·(y₁+y₂)/2        |
//! | [`SymmetricGauge`]| B/2·(-y, x)             | B/2·(x₁y₂ - x₂y₁)           |
//! | [`PointFlux`]     | Φ/2π · φ̂/r              | Φ/2π · Δφ                   |
//!
//! Landau and symmetric gauges describe the same uniform field B, so their
//! integrals around any closed loop agree.

use crate::{xy, Field};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Zero vector potential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoField;

impl Field for NoField {
    fn line_integral(&self, _a: &DVector<f64>, _b: &DVector<f64>) -> f64 {
        0.0
    }
}

/// Uniform field B along z in the Landau gauge A = (-B·y, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandauGauge {
    pub b: f64,
}

impl Field for LandauGauge {
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        let (x1, y1) = xy(a);
        let (x2, y2) = xy(b);
        -self.b * (x2 - x1) * (y1 + y2) / 2.0
    }
}

/// Uniform field B along z in the symmetric gauge A = B/2·(-y, x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetricGauge {
    pub b: f64,
}

impl Field for SymmetricGauge {
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        let (x1, y1) = xy(a);
        let (x2, y2) = xy(b);
        self.b / 2.0 * (x1 * y2 - x2 * y1)
    }
}

/// Infinitely thin flux tube through `center`.
///
/// The integral is undefined for segments starting or ending on the tube and
/// evaluates to NaN there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointFlux {
    pub flux: f64,
    pub center: [f64; 2],
}

impl PointFlux {
    pub fn new(flux: f64, center: [f64; 2]) -> Self {
        Self { flux, center }
    }
}

impl Field for PointFlux {
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        let (x1, y1) = xy(a);
        let (x2, y2) = xy(b);
        let (dx1, dy1) = (x1 - self.center[0], y1 - self.center[1]);
        let (dx2, dy2) = (x2 - self.center[0], y2 - self.center[1]);
        if dx1.hypot(dy1) < f64::EPSILON || dx2.hypot(dy2) < f64::EPSILON {
            return f64::NAN;
        }
        let mut dphi = dy2.atan2(dx2) - dy1.atan2(dx1);
        if dphi > PI {
            dphi -= 2.0 * PI;
        } else if dphi <= -PI {
            dphi += 2.0 * PI;
        }
        self.flux / (2.0 * PI) * dphi
    }
}

/// Arbitrary vector potential, integrated with the midpoint rule.
pub struct PotentialField<F> {
    potential: F,
    steps: usize,
}

impl<F> PotentialField<F>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    pub fn new(potential: F) -> Self {
        Self {
            potential,
            steps: 16,
        }
    }

    /// Number of midpoint-rule segments per line integral.
    pub fn with_steps(mut self, steps: usize) -> Self {
        assert!(steps > 0, "Need at least one integration step");
        self.steps = steps;
        self
    }
}

impl<F> Field for PotentialField<F>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        let dl = b - a;
        let n = self.steps as f64;
        let mut sum = 0.0;
        for k in 0..self.steps {
            let t = (k as f64 + 0.5) / n;
            let p = a + &dl * t;
            sum += (self.potential)(&p).dot(&dl);
        }
        sum / n
    }
}

/// Superposition of several fields.
#[derive(Default)]
pub struct FieldSum {
    fields: Vec<Box<dyn Field>>,
}

impl FieldSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Field + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Field for FieldSum {
    fn line_integral(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        self.fields.iter().map(|f| f.line_integral(a, b)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> DVector<f64> {
        DVector::from_column_slice(&[x, y])
    }

    /// ∮ A·dl around the unit square with lower-left corner (x, y).
    fn plaquette(field: &dyn Field, x: f64, y: f64) -> f64 {
        let corners = [p(x, y), p(x + 1.0, y), p(x + 1.0, y + 1.0), p(x, y + 1.0)];
        (0..4)
            .map(|k| field.line_integral(&corners[k], &corners[(k + 1) % 4]))
            .sum()
    }

    #[test]
    fn test_no_field() {
        assert_eq!(NoField.line_integral(&p(0.0, 0.0), &p(3.0, 1.0)), 0.0);
    }

    #[test]
    fn test_uniform_gauges_enclose_flux() {
        let (landau, symmetric) = (LandauGauge { b: 0.3 }, SymmetricGauge { b: 0.3 });
        for field in [&landau as &dyn Field, &symmetric as &dyn Field] {
            assert_relative_eq!(plaquette(field, 0.0, 0.0), 0.3, epsilon = 1e-12);
            assert_relative_eq!(plaquette(field, 4.0, -2.0), 0.3, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_line_integral_antisymmetric() {
        let f = LandauGauge { b: 1.7 };
        let (a, b) = (p(0.5, 2.0), p(-1.0, 3.0));
        assert_relative_eq!(f.line_integral(&a, &b), -f.line_integral(&b, &a), epsilon = 1e-12);
    }

    #[test]
    fn test_point_flux_winding() {
        let f = PointFlux::new(0.25, [0.5, 0.5]);
        assert_relative_eq!(plaquette(&f, 0.0, 0.0), 0.25, epsilon = 1e-12);
        // Loop not enclosing the tube picks up nothing.
        assert_relative_eq!(plaquette(&f, 3.0, 3.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_flux_on_tube_is_nan() {
        let f = PointFlux::new(1.0, [0.0, 0.0]);
        assert!(f.line_integral(&p(0.0, 0.0), &p(1.0, 0.0)).is_nan());
    }

    #[test]
    fn test_potential_field_matches_landau() {
        let b = 0.7;
        let numeric = PotentialField::new(move |r: &DVector<f64>| p(-b * r[1], 0.0)).with_steps(8);
        let exact = LandauGauge { b };
        let (a, c) = (p(0.0, 1.0), p(2.0, 3.0));
        // Linear potential: the midpoint rule is exact.
        assert_relative_eq!(
            numeric.line_integral(&a, &c),
            exact.line_integral(&a, &c),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_field_sum() {
        let sum = FieldSum::new()
            .with(LandauGauge { b: 0.1 })
            .with(SymmetricGauge { b: 0.2 });
        assert_eq!(sum.len(), 2);
        assert_relative_eq!(plaquette(&sum, 1.0, 1.0), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_one_dimensional_points() {
        let f = SymmetricGauge { b: 1.0 };
        let a = DVector::from_column_slice(&[0.0]);
        let b = DVector::from_column_slice(&[1.0]);
        assert_eq!(f.line_integral(&a, &b), 0.0);
    }
}
