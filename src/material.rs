//! Isotropic linear elastic material law.
use crate::nalgebra::{Matrix2, Vector2};
use crate::Real;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YoungPoisson<T> {
    pub young: T,
    pub poisson: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LameParameters<T> {
    pub mu: T,
    pub lambda: T,
}

impl<T> From<YoungPoisson<T>> for LameParameters<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn from(params: YoungPoisson<T>) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young / (1.0 + poisson);
        let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        Self { mu, lambda }
    }
}

/// The isotropic elasticity tensor in two dimensions,
/// $$
/// C_{ijkl} = \lambda_1 \delta_{ij} \delta_{kl} + \lambda_2 (\delta_{ik} \delta_{jl} + \delta_{il} \delta_{jk}).
/// $$
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticityTensor<T> {
    pub lambda1: T,
    pub lambda2: T,
}

impl<T: Real> ElasticityTensor<T> {
    /// The elasticity tensor for unit Young's modulus and the given Poisson ratio.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn from_poisson_ratio(nu: T) -> Self {
        Self::from(YoungPoisson { young: 1.0, poisson: nu })
    }

    /// Evaluates $C_{ijkl}$ for indices in `{0, 1}`.
    pub fn evaluate(&self, i: usize, j: usize, k: usize, l: usize) -> T {
        let delta = |a: usize, b: usize| if a == b { T::one() } else { T::zero() };
        self.lambda1 * delta(i, j) * delta(k, l) + self.lambda2 * (delta(i, k) * delta(j, l) + delta(i, l) * delta(j, k))
    }

    /// Computes the matrix `A` with entries $A_{ik} = \sum_{j, l} C_{ijkl} a_j b_l$.
    ///
    /// With `a` and `b` the gradients of a test and a trial basis function, `A_{ik}` is the
    /// contribution of the pair to the stiffness block coupling component `i` of the test
    /// function with component `k` of the trial function.
    pub fn contract(&self, a: &Vector2<T>, b: &Vector2<T>) -> Matrix2<T> {
        Matrix2::from_fn(|i, k| {
            let mut sum = T::zero();
            for j in 0..2 {
                for l in 0..2 {
                    sum += self.evaluate(i, j, k, l) * a[j] * b[l];
                }
            }
            sum
        })
    }
}

impl<T: Real> Default for ElasticityTensor<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self::from_poisson_ratio(0.3)
    }
}

impl<T: Real> From<LameParameters<T>> for ElasticityTensor<T> {
    fn from(params: LameParameters<T>) -> Self {
        Self {
            lambda1: params.lambda,
            lambda2: params.mu,
        }
    }
}

impl<T: Real> From<YoungPoisson<T>> for ElasticityTensor<T> {
    fn from(params: YoungPoisson<T>) -> Self {
        Self::from(LameParameters::from(params))
    }
}
