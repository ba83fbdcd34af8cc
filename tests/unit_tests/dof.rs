use elastica::connectivity::Quad9d2Connectivity;
use elastica::dof::{DofMap, FeType, Variable};
use elastica::error::AssemblyError;
use elastica::mesh::procedural::create_rectangular_quad9_mesh;
use itertools::Itertools;

fn elasticity_dof_map(num_nodes: usize) -> DofMap {
    DofMap::new(
        num_nodes,
        vec![
            Variable::new("u", FeType::Lagrange { order: 2 }),
            Variable::new("v", FeType::Lagrange { order: 2 }),
            Variable::new("lambda", FeType::Scalar),
        ],
    )
}

#[test]
fn elasticity_dof_count_is_two_per_node_plus_multiplier() {
    let mesh = create_rectangular_quad9_mesh::<f64>(3, 2, [0.0, 1.0], [0.0, 1.0]);
    let dof_map = elasticity_dof_map(mesh.num_vertices());
    assert_eq!(mesh.num_vertices(), 7 * 5);
    assert_eq!(dof_map.n_dofs(), 2 * mesh.num_vertices() + 1);
}

#[test]
fn multiplier_has_same_global_index_on_every_element() {
    let mesh = create_rectangular_quad9_mesh::<f64>(3, 2, [0.0, 1.0], [0.0, 1.0]);
    let dof_map = elasticity_dof_map(mesh.num_vertices());
    let lambda = dof_map.variable_number("lambda").unwrap();
    let lambda_dof = dof_map.scalar_dof(lambda).unwrap();
    assert_eq!(lambda_dof, dof_map.n_dofs() - 1);

    let mut indices = Vec::new();
    for connectivity in mesh.connectivity() {
        dof_map.dof_indices(connectivity, lambda, &mut indices);
        assert_eq!(indices, vec![lambda_dof]);

        dof_map.element_dof_indices(connectivity, &mut indices);
        assert_eq!(indices.len(), 19);
        assert_eq!(indices.last(), Some(&lambda_dof));
        // Apart from the multiplier, no index appears twice on an element
        assert!(indices.iter().all_unique());
    }
}

#[test]
fn nodal_dofs_are_interleaved() {
    let dof_map = elasticity_dof_map(10);
    let connectivity = Quad9d2Connectivity([0, 1, 2, 3, 4, 5, 6, 7, 9]);
    let mut indices = Vec::new();
    dof_map.element_dof_indices(&connectivity, &mut indices);
    let expected_u = [0, 2, 4, 6, 8, 10, 12, 14, 18];
    let expected_v = [1, 3, 5, 7, 9, 11, 13, 15, 19];
    assert_eq!(&indices[0..9], &expected_u);
    assert_eq!(&indices[9..18], &expected_v);
    assert_eq!(indices[18], 20);

    assert_eq!(dof_map.node_dof(9, 1), Some(19));
    assert_eq!(dof_map.node_dof(9, 2), None);
    assert_eq!(dof_map.scalar_dof(0), None);
}

#[test]
fn local_layout_concatenates_fields() {
    let layout = elasticity_dof_map(10).local_layout(9);
    assert_eq!(layout.total(), 19);
    assert_eq!(layout.field_range(0), 0..9);
    assert_eq!(layout.field_range(1), 9..18);
    assert_eq!(layout.field_range(2), 18..19);
}

#[test]
fn unknown_variable_name_is_an_error() {
    let dof_map = elasticity_dof_map(1);
    assert_eq!(
        dof_map.variable_number("w"),
        Err(AssemblyError::UnknownVariable { name: "w".to_string() })
    );
}
