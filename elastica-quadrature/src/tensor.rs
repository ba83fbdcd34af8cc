//! 2D quadrature rules formed by tensor product formulations.

use crate::univariate::{gauss, try_gauss};
use crate::{Error, Rule};

/// A Gauss quadrature rule for the reference quadrilateral.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension. Points are ordered with the first coordinate varying slowest.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    tensor_product(&gauss(num_points_per_dim))
}

/// Fallible variant of [`quadrilateral_gauss`].
pub fn try_quadrilateral_gauss(num_points_per_dim: usize) -> Result<Rule<2>, Error> {
    try_gauss(num_points_per_dim).map(|rule1d| tensor_product(&rule1d))
}

fn tensor_product(rule1d: &Rule<1>) -> Rule<2> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d_iter = || weights1d.iter().zip(points1d);

    for (&wx, &[x]) in rule1d_iter() {
        for (&wy, &[y]) in rule1d_iter() {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}
