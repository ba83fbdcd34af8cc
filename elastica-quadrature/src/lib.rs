//! Quadrature rules for finite element reference domains.
//!
//! The rules are returned as plain arrays so that this crate stays free of any linear algebra
//! dependency. The reference interval is `[-1, 1]` and the reference quadrilateral is
//! `[-1, 1]^2`.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A one-dimensional point.
pub type Point1 = Point<1>;

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// The largest number of points per dimension we hand out.
///
/// Gauss-Legendre rules can be computed for any number of points, but beyond this limit the
/// request is almost certainly a configuration mistake.
pub const MAX_POINTS_PER_DIM: usize = 64;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize, F>(rule: &Rule<D>, f: F) -> f64
where
    F: Fn(&Point<D>) -> f64,
{
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, p)| w * f(p))
        .sum()
}

/// The number of Gauss points per dimension needed to integrate polynomials of the given
/// degree (along each dimension) exactly.
pub fn gauss_points_for_strength(strength: usize) -> usize {
    // An n-point rule is exact up to degree 2n - 1
    (strength + 2) / 2
}
