use elastica::material::{ElasticityTensor, LameParameters, YoungPoisson};
use elastica::nalgebra::Vector2;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use proptest::prelude::*;

fn poisson_ratio() -> impl Strategy<Value = f64> {
    0.0..0.49
}

fn vector2() -> impl Strategy<Value = Vector2<f64>> {
    [-10.0..10.0, -10.0..10.0].prop_map(|[x, y]| Vector2::new(x, y))
}

proptest! {
    #[test]
    fn elasticity_tensor_has_major_and_minor_symmetries(nu in poisson_ratio()) {
        let c = ElasticityTensor::from_poisson_ratio(nu);
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    for l in 0..2 {
                        let c_ijkl = c.evaluate(i, j, k, l);
                        prop_assert_eq!(c_ijkl, c.evaluate(k, l, i, j));
                        prop_assert_eq!(c_ijkl, c.evaluate(j, i, k, l));
                        prop_assert_eq!(c_ijkl, c.evaluate(i, j, l, k));
                    }
                }
            }
        }
    }

    #[test]
    fn contraction_is_transposed_by_swapping_arguments(
        nu in poisson_ratio(),
        a in vector2(),
        b in vector2()
    ) {
        let c = ElasticityTensor::from_poisson_ratio(nu);
        let ab = c.contract(&a, &b);
        let ba = c.contract(&b, &a);
        assert_matrix_eq!(ab, ba.transpose(), comp = abs, tol = 1e-12);
    }

    #[test]
    fn contraction_with_itself_is_positive_definite(nu in poisson_ratio(), a in vector2()) {
        prop_assume!(a.norm() > 1e-6);
        let c = ElasticityTensor::from_poisson_ratio(nu);
        let aa = c.contract(&a, &a);
        let eigenvalues = aa.symmetric_eigenvalues();
        prop_assert!(eigenvalues.min() > 0.0);
    }
}

#[test]
fn lame_parameters_from_young_and_poisson() {
    let lame = LameParameters::from(YoungPoisson {
        young: 200.0,
        poisson: 0.25,
    });
    assert_scalar_eq!(lame.mu, 80.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(lame.lambda, 80.0, comp = abs, tol = 1e-12);

    let c = ElasticityTensor::from(lame);
    assert_eq!(c.lambda1, lame.lambda);
    assert_eq!(c.lambda2, lame.mu);
}

#[test]
fn default_tensor_uses_poisson_ratio_of_three_tenths() {
    assert_eq!(ElasticityTensor::<f64>::default(), ElasticityTensor::from_poisson_ratio(0.3));
}
