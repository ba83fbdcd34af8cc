//! Quadrature rules converted to `nalgebra` points and generic scalars.
use crate::nalgebra::{convert, OPoint, Point1, Point2, U1, U2};
use crate::Real;
use elastica_quadrature::{tensor, univariate};

/// Errors returned by quadrature methods.
pub use elastica_quadrature::Error as QuadratureError;

pub type QuadraturePair<T, D> = (Vec<T>, Vec<OPoint<T, D>>);
pub type QuadraturePair1d<T> = QuadraturePair<T, U1>;
pub type QuadraturePair2d<T> = QuadraturePair<T, U2>;

/// The default number of points per dimension for Quad9 volume and side integrals.
///
/// Integrates the biquadratic stiffness exactly on parallelogram elements.
pub const DEFAULT_POINTS_PER_DIM: usize = 3;

pub fn convert_quadrature_rule_from_1d_f64<T: Real>(rule: elastica_quadrature::Rule1d) -> QuadraturePair1d<T> {
    let (weights, points) = rule;
    let weights = weights.into_iter().map(|w| convert(w)).collect();
    let points = points
        .into_iter()
        .map(|[x]| Point1::new(convert(x)))
        .collect();
    (weights, points)
}

pub fn convert_quadrature_rule_from_2d_f64<T: Real>(rule: elastica_quadrature::Rule2d) -> QuadraturePair2d<T> {
    let (weights, points) = rule;
    let weights = weights.into_iter().map(|w| convert(w)).collect();
    let points = points
        .into_iter()
        .map(|[x, y]| Point2::new(convert(x), convert(y)))
        .collect();
    (weights, points)
}

/// Gauss-Legendre rule with `num_points` points on `[-1, 1]`.
pub fn gauss<T: Real>(num_points: usize) -> Result<QuadraturePair1d<T>, QuadratureError> {
    univariate::try_gauss(num_points).map(convert_quadrature_rule_from_1d_f64)
}

/// Tensor-product Gauss rule on the reference quadrilateral `[-1, 1]^2`.
pub fn quadrilateral_gauss<T: Real>(num_points_per_dim: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
    tensor::try_quadrilateral_gauss(num_points_per_dim).map(convert_quadrature_rule_from_2d_f64)
}

/// Approximates the integral of `f` over the reference domain of the rule.
pub fn integrate<T, D, F>(rule: &QuadraturePair<T, D>, f: F) -> T
where
    T: Real,
    D: nalgebra::DimName,
    nalgebra::DefaultAllocator: nalgebra::allocator::Allocator<T, D>,
    F: Fn(&OPoint<T, D>) -> T,
{
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .fold(T::zero(), |acc, (w, p)| acc + *w * f(p))
}
