use elastica::connectivity::Quad9d2Connectivity;
use elastica::error::AssemblyError;
use elastica::mesh::procedural::{create_rectangular_quad9_mesh, BOTTOM, LEFT, RIGHT, TOP};
use elastica::mesh::Mesh;
use elastica::nalgebra::Point2;
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn rectangular_mesh_has_expected_vertices_and_elements() {
    let mesh = create_rectangular_quad9_mesh::<f64>(3, 2, [0.0, 3.0], [0.0, 1.0]);
    assert_eq!(mesh.num_elements(), 6);
    assert_eq!(mesh.num_vertices(), 7 * 5);

    // Element 4 is the middle element of the second row
    let connectivity = mesh.connectivity()[4];
    assert_eq!(connectivity, Quad9d2Connectivity([16, 18, 32, 30, 17, 25, 31, 23, 24]));
    assert_eq!(mesh.vertices()[16], Point2::new(1.0, 0.5));
    assert_eq!(mesh.vertices()[24], Point2::new(1.5, 0.75));
}

#[test]
fn rectangular_mesh_boundary_tags() {
    let mesh = create_rectangular_quad9_mesh::<f64>(3, 2, [0.0, 3.0], [0.0, 1.0]);
    let ids: BTreeSet<_> = [BOTTOM, RIGHT, TOP, LEFT].into_iter().collect();
    assert_eq!(mesh.boundary_id_set(), ids);

    let exterior: Vec<_> = mesh.exterior_sides().collect();
    assert_eq!(exterior.len(), 2 * 3 + 2 * 2);
    for (element, side) in exterior {
        assert!(mesh.boundary_id(element, side).is_some());
        assert_eq!(mesh.neighbor(element, side), None);
    }

    assert_eq!(mesh.boundary_id(0, 0), Some(BOTTOM));
    assert_eq!(mesh.boundary_id(0, 3), Some(LEFT));
    assert_eq!(mesh.boundary_id(5, 1), Some(RIGHT));
    assert_eq!(mesh.boundary_id(5, 2), Some(TOP));
    assert_eq!(mesh.boundary_id(0, 1), None);
    assert_eq!(mesh.neighbor(0, 1), Some(1));
    assert_eq!(mesh.neighbor(0, 2), Some(3));
}

#[test]
fn vertices_on_right_side_are_sorted_and_unique() {
    let mesh = create_rectangular_quad9_mesh::<f64>(3, 2, [0.0, 3.0], [0.0, 1.0]);
    let right: BTreeSet<_> = [RIGHT].into_iter().collect();
    let vertices = mesh.vertices_with_boundary_ids(&right);
    assert_eq!(vertices, vec![6, 13, 20, 27, 34]);
    for v in vertices {
        assert_eq!(mesh.vertices()[v].x, 3.0);
    }
}

#[test]
fn single_element_mesh_has_no_boundary_ids_until_tagged() {
    let vertices = create_rectangular_quad9_mesh::<f64>(1, 1, [0.0, 1.0], [0.0, 1.0])
        .vertices()
        .to_vec();
    let connectivity = vec![Quad9d2Connectivity([0, 2, 8, 6, 1, 5, 7, 3, 4])];
    let mut mesh = Mesh::from_vertices_and_connectivity(vertices, connectivity).unwrap();
    assert!(mesh.boundary_id_set().is_empty());
    assert_eq!(mesh.exterior_sides().count(), 4);

    mesh.tag_exterior_sides(|a, b| (a.y == 0.0 && b.y == 0.0).then(|| 7));
    assert_eq!(mesh.boundary_id(0, 0), Some(7));
    assert_eq!(mesh.boundary_id(0, 1), None);

    mesh.set_boundary_id(0, 1, 8);
    assert_eq!(mesh.boundary_id(0, 1), Some(8));
}

#[test]
fn connectivity_referring_to_missing_vertex_is_rejected() {
    let vertices = vec![Point2::new(0.0, 0.0); 8];
    let connectivity = vec![Quad9d2Connectivity([0, 1, 2, 3, 4, 5, 6, 7, 8])];
    let result = Mesh::from_vertices_and_connectivity(vertices, connectivity);
    assert_eq!(
        result.err(),
        Some(AssemblyError::VertexOutOfBounds { element: 0, vertex: 8 })
    );
}

#[test]
fn local_elements_restrict_active_elements() {
    let mut mesh = create_rectangular_quad9_mesh::<f64>(2, 2, [0.0, 1.0], [0.0, 1.0]);
    assert_eq!(mesh.active_local_elements().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    mesh.set_local_elements(Some(vec![1, 3]));
    assert_eq!(mesh.active_local_elements().collect::<Vec<_>>(), vec![1, 3]);
    mesh.set_local_elements(None);
    assert_eq!(mesh.active_local_elements().count(), 4);
}

proptest! {
    #[test]
    fn rectangular_mesh_sides_are_interior_or_tagged(nx in 1usize..6, ny in 1usize..6) {
        let mesh = create_rectangular_quad9_mesh::<f64>(nx, ny, [0.0, 1.0], [0.0, 1.0]);
        prop_assert_eq!(mesh.num_vertices(), (2 * nx + 1) * (2 * ny + 1));
        for element in 0..mesh.num_elements() {
            for side in 0..4 {
                let exterior = mesh.is_exterior_side(element, side);
                prop_assert_eq!(exterior, mesh.boundary_id(element, side).is_some());
                prop_assert_eq!(exterior, mesh.neighbor(element, side).is_none());
                prop_assert!(mesh.element(element).is_some());
            }
        }
    }
}
