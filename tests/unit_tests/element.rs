use elastica::element::{quad_side_reference_coords, FiniteElement, FixedNodesReferenceFiniteElement, Quad9d2Element};
use elastica::nalgebra::{OMatrix, Point2, Vector2, U1, U9};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use proptest::prelude::*;

fn point_in_quad_ref_domain() -> impl Strategy<Value = Point2<f64>> {
    let r = -1.0..=1.0;
    [r.clone(), r].prop_map(|[x, y]| Point2::new(x, y))
}

fn distorted_quad9() -> Quad9d2Element<f64> {
    // Straight-sided, but neither a rectangle nor a parallelogram
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.5),
        Point2::new(2.5, 2.0),
        Point2::new(-0.5, 1.5),
    ];
    let mid = |a: usize, b: usize| Point2::from((corners[a].coords + corners[b].coords) / 2.0);
    let center = Point2::from(corners.iter().map(|p| p.coords).sum::<Vector2<f64>>() / 4.0);
    Quad9d2Element::from_vertices([
        corners[0],
        corners[1],
        corners[2],
        corners[3],
        mid(0, 1),
        mid(1, 2),
        mid(2, 3),
        mid(3, 0),
        center,
    ])
}

#[test]
fn quad9_lagrange_property() {
    // N_i(x_j) = delta_ij for the reference vertices x_j
    let element = Quad9d2Element::<f64>::reference();

    for (i, xi) in element.vertices().iter().enumerate() {
        let phi = element.evaluate_basis(xi);

        let mut expected = OMatrix::<f64, U1, U9>::zeros();
        expected[i] = 1.0;

        assert_matrix_eq!(phi, expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn quad9_maps_reference_vertices_to_physical_vertices() {
    let element = distorted_quad9();
    let reference = Quad9d2Element::<f64>::reference();
    for (xi, x) in reference.vertices().iter().zip(element.vertices()) {
        let mapped = element.map_reference_coords(xi);
        assert_matrix_eq!(mapped.coords, x.coords, comp = abs, tol = 1e-12);
    }
}

#[test]
fn quad9_side_endpoints_match_side_nodes() {
    let reference = Quad9d2Element::<f64>::reference();
    let sides = elastica::connectivity::QUAD9_SIDE_NODES;
    for (side, [start, mid, end]) in sides.iter().copied().enumerate() {
        for (s, node) in [(-1.0, start), (0.0, mid), (1.0, end)] {
            let (xi, _) = quad_side_reference_coords(side, s).unwrap();
            assert_matrix_eq!(xi.coords, reference.vertices()[node].coords, comp = abs, tol = 1e-14);
        }
    }
    assert!(quad_side_reference_coords::<f64>(4, 0.0).is_none());
}

proptest! {
    #[test]
    fn quad9_partition_of_unity(xi in point_in_quad_ref_domain()) {
        let phi = Quad9d2Element::reference().evaluate_basis(&xi);
        prop_assert!((phi.sum() - 1.0).abs() <= 1e-12);
    }

    #[test]
    fn quad9_partition_of_unity_gradient(xi in point_in_quad_ref_domain()) {
        // Since the sum of basis functions is 1, the sum of the gradients must be 0
        let gradients = Quad9d2Element::reference().gradients(&xi);
        let gradient_sum = gradients.column_sum();
        prop_assert!(gradient_sum.norm() <= 1e-12);
    }

    #[test]
    fn quad9_gradients_match_finite_differences(xi in point_in_quad_ref_domain()) {
        let element = Quad9d2Element::reference();
        let h = 1e-6;
        let gradients = element.gradients(&xi);
        for d in 0..2 {
            let mut xi_plus = xi;
            let mut xi_minus = xi;
            xi_plus[d] += h;
            xi_minus[d] -= h;
            let fd = (element.evaluate_basis(&xi_plus) - element.evaluate_basis(&xi_minus)) / (2.0 * h);
            for i in 0..9 {
                prop_assert!((fd[i] - gradients[(d, i)]).abs() <= 1e-6);
            }
        }
    }

    #[test]
    fn quad9_jacobian_determinant_is_positive(xi in point_in_quad_ref_domain()) {
        let element = distorted_quad9();
        prop_assert!(element.reference_jacobian(&xi).determinant() > 0.0);
    }
}

#[test]
fn quad9_diameter_is_longest_diagonal() {
    let element = distorted_quad9();
    let diagonal_1 = (element.vertices()[2] - element.vertices()[0]).norm();
    let diagonal_2 = (element.vertices()[3] - element.vertices()[1]).norm();
    assert_scalar_eq!(element.diameter(), diagonal_1.max(diagonal_2), comp = abs, tol = 1e-12);
}
