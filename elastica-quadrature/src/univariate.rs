//! Gauss-Legendre rules on the reference interval `[-1, 1]`.

use crate::{Error, Rule, MAX_POINTS_PER_DIM};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// The Legendre polynomial `P_n` and its derivative, evaluated at `x`.
///
/// Uses the recurrences `m P_m = (2m - 1) x P_{m-1} - (m - 1) P_{m-2}` and
/// `P'_m = P'_{m-2} + (2m - 1) P_{m-1}`, both of which remain valid at `x = ±1`.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    // At the start of step m: (P_{m-2}, P_{m-1}) and (P'_{m-2}, P'_{m-1})
    let (mut p_prev, mut p) = (0.0, 1.0);
    let (mut dp_prev, mut dp) = (0.0, 0.0);
    for m in 1..=n {
        let m = m as f64;
        let p_next = ((2.0 * m - 1.0) * x * p - (m - 1.0) * p_prev) / m;
        let dp_next = dp_prev + (2.0 * m - 1.0) * p;
        p_prev = p;
        p = p_next;
        dp_prev = dp;
        dp = dp_next;
    }
    (p, dp)
}

/// Tricomi's approximation of the `k`-th largest root of `P_n`, with `k` starting at zero.
fn initial_root_guess(n: usize, k: usize) -> f64 {
    let n_f = n as f64;
    let theta = PI * (4.0 * k as f64 + 3.0) / (4.0 * n_f + 2.0);
    (1.0 - 1.0 / (8.0 * n_f * n_f) + 1.0 / (8.0 * n_f * n_f * n_f)) * theta.cos()
}

/// The Gauss-Legendre rule with the given number of points, sorted by ascending coordinate.
///
/// An `n`-point rule integrates polynomials of degree up to `2n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested. See [`try_gauss`] for a fallible alternative.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut points = vec![[0.0]; n];
    let mut weights = vec![0.0; n];

    // Roots come in pairs ±x, so only the non-negative ones are computed
    for k in 0..(n + 1) / 2 {
        let mut x = initial_root_guess(n, k);
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp) = legendre(n, x);
            let step = p / dp;
            x -= step;
            if step.abs() <= 4.0 * f64::EPSILON {
                break;
            }
        }

        let (_, dp) = legendre(n, x);
        let weight = 2.0 / ((1.0 - x * x) * dp * dp);
        points[n - 1 - k] = [x];
        weights[n - 1 - k] = weight;
        points[k] = [-x];
        weights[k] = weight;
    }

    (weights, points)
}

/// Fallible variant of [`gauss`].
///
/// Returns [`Error::NoRuleAvailable`] if `num_points` is zero or exceeds
/// [`MAX_POINTS_PER_DIM`].
pub fn try_gauss(num_points: usize) -> Result<Rule<1>, Error> {
    if num_points == 0 || num_points > MAX_POINTS_PER_DIM {
        Err(Error::NoRuleAvailable)
    } else {
        Ok(gauss(num_points))
    }
}
