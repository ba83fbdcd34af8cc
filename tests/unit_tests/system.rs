use crate::small_cantilever;
use elastica::assembly::local::BoundaryCondition;
use elastica::config::{DirichletStrategy, ElasticityConfig, SolverConfig, SolverKind};
use elastica::connectivity::Quad9d2Connectivity;
use elastica::error::AssemblyError;
use elastica::mesh::procedural::{create_rectangular_quad9_mesh, BOTTOM, RIGHT};
use elastica::mesh::Mesh;
use elastica::nalgebra::DVector;
use elastica::system::{ElasticitySystem, SolverError};
use matrixcompare::assert_scalar_eq;

fn serial_config() -> ElasticityConfig {
    ElasticityConfig {
        parallel: false,
        ..ElasticityConfig::default()
    }
}

fn dense_lu() -> SolverConfig {
    SolverConfig {
        kind: SolverKind::DenseLu,
        ..SolverConfig::default()
    }
}

#[test]
fn cantilever_satisfies_constraint_and_deflects_downwards() {
    let problem = small_cantilever(8, 2, serial_config());
    let system = problem.assemble().unwrap();
    let solution = problem.solve_assembled(&system, &dense_lu()).unwrap();

    let v_scale = solution.v.amax();
    assert!(v_scale > 0.0);
    assert!(solution.v.min() < 0.0);
    assert!(solution.lambda.abs() > 1e-8 * v_scale);

    // The multiplier enforces that the integral of v over the right side vanishes
    let v_integral = problem.boundary_integral(&solution.v, RIGHT).unwrap();
    assert!(v_integral.abs() <= 1e-8 * v_scale, "integral of v = {}", v_integral);
    let residual = problem.constraint_residual(&solution).unwrap();
    assert_scalar_eq!(residual, -v_integral, comp = abs, tol = 1e-14);

    // Clamped side does not move
    for (vertex, x) in problem.mesh().vertices().iter().enumerate() {
        if x.x == 0.0 {
            assert!(solution.u[vertex].abs() <= 1e-12 * v_scale);
            assert!(solution.v[vertex].abs() <= 1e-12 * v_scale);
        }
    }
}

#[test]
fn schur_complement_cg_matches_dense_lu() {
    let problem = small_cantilever(8, 2, serial_config());
    let system = problem.assemble().unwrap();
    let reference = problem.solve_assembled(&system, &dense_lu()).unwrap();

    let cg = SolverConfig {
        kind: SolverKind::SchurComplementCg,
        tolerance: 1e-12,
        ..SolverConfig::default()
    };
    let solution = problem.solve_assembled(&system, &cg).unwrap();

    let relative_error = (&solution.dofs - &reference.dofs).norm() / reference.dofs.norm();
    assert!(relative_error < 1e-6, "relative error = {}", relative_error);
    let lambda_error = (solution.lambda - reference.lambda).abs() / reference.lambda.abs();
    assert!(lambda_error < 1e-6, "relative multiplier error = {}", lambda_error);
}

#[test]
fn local_and_global_dirichlet_give_same_solution() {
    let local = small_cantilever(6, 2, serial_config());
    let global = small_cantilever(
        6,
        2,
        ElasticityConfig {
            dirichlet_strategy: DirichletStrategy::Global,
            ..serial_config()
        },
    );

    let local_system = local.assemble().unwrap();
    let global_system = global.assemble().unwrap();
    assert_ne!(local_system.matrix, global_system.matrix);

    let x_local = local.solve_assembled(&local_system, &dense_lu()).unwrap();
    let x_global = global.solve_assembled(&global_system, &dense_lu()).unwrap();
    let relative_error = (&x_local.dofs - &x_global.dofs).norm() / x_local.dofs.norm();
    assert!(relative_error < 1e-8, "relative error = {}", relative_error);
}

#[test]
fn parallel_and_serial_systems_are_identical() {
    let serial = small_cantilever(10, 3, serial_config()).assemble().unwrap();
    let parallel = small_cantilever(10, 3, ElasticityConfig::default())
        .assemble()
        .unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn failed_cg_solve_leaves_system_reusable() {
    let problem = small_cantilever(6, 2, serial_config());
    let system = problem.assemble().unwrap();
    let before = system.clone();

    let crippled = SolverConfig {
        kind: SolverKind::ConjugateGradient,
        max_iterations: Some(1),
        ..SolverConfig::default()
    };
    let result = problem.solve_assembled(&system, &crippled);
    assert!(matches!(result, Err(SolverError::ConjugateGradient(_))));
    assert_eq!(system, before);

    let solution = problem.solve_assembled(&system, &dense_lu()).unwrap();
    assert!(solution.v.min() < 0.0);
}

#[test]
fn solve_uses_configured_solver() {
    let config = ElasticityConfig {
        solver: dense_lu(),
        ..serial_config()
    };
    let problem = small_cantilever(4, 1, config);
    let solution = problem.solve().unwrap();
    assert_eq!(solution.dofs.len(), problem.dof_map().n_dofs());
    assert_eq!(solution.u.len(), problem.mesh().num_vertices());
    assert_eq!(solution.lambda, solution.dofs[problem.dof_map().n_dofs() - 1]);
}

#[test]
fn system_from_json_configuration() {
    let json = r#"{
        "mesh": { "elements_x": 4, "elements_y": 1 },
        "poisson_ratio": 0.25,
        "parallel": false
    }"#;
    let config = ElasticityConfig::from_json_str(json).unwrap();
    let problem = ElasticitySystem::<f64>::from_config(config).unwrap();
    assert_eq!(problem.mesh().num_elements(), 4);
    assert_eq!(problem.dof_map().n_dofs(), 2 * 9 * 3 + 1);
    // Both components of the three left vertices
    assert_eq!(problem.constraints().len(), 6);
}

#[test]
fn empty_mesh_configuration_is_an_error() {
    let config = ElasticityConfig::from_json_str(r#"{ "mesh": { "elements_x": 0 } }"#).unwrap();
    let result = ElasticitySystem::<f64>::from_config(config);
    assert!(matches!(result, Err(AssemblyError::InvalidMeshConfig { .. })));
}

#[test]
fn solution_values_are_copied_back_per_vertex() {
    let problem = small_cantilever(1, 1, serial_config());
    let n = problem.dof_map().n_dofs();
    let dofs = DVector::from_fn(n, |i, _| i as f64);
    let solution = problem.solution_from_dofs(dofs);
    for vertex in 0..problem.mesh().num_vertices() {
        assert_eq!(solution.u[vertex], (2 * vertex) as f64);
        assert_eq!(solution.v[vertex], (2 * vertex + 1) as f64);
    }
    assert_eq!(solution.lambda, (n - 1) as f64);
}

#[test]
fn boundary_integral_of_constant_is_side_length() {
    let problem = small_cantilever(5, 2, serial_config());
    let ones = DVector::repeat(problem.mesh().num_vertices(), 1.0);
    assert_scalar_eq!(problem.boundary_integral(&ones, RIGHT).unwrap(), 0.2, comp = abs, tol = 1e-14);
    assert_scalar_eq!(problem.boundary_integral(&ones, BOTTOM).unwrap(), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn untagged_exterior_side_is_an_error() {
    let vertices = create_rectangular_quad9_mesh::<f64>(1, 1, [0.0, 1.0], [0.0, 1.0])
        .vertices()
        .to_vec();
    let connectivity = vec![Quad9d2Connectivity([0, 2, 8, 6, 1, 5, 7, 3, 4])];
    let mesh = Mesh::from_vertices_and_connectivity(vertices, connectivity).unwrap();
    let result = ElasticitySystem::new(mesh, ElasticityConfig::default());
    assert!(matches!(
        result,
        Err(AssemblyError::UnsetBoundaryId { element: 0, side: 0 })
    ));
}

#[test]
fn side_with_unbound_id_is_an_error() {
    let mesh = create_rectangular_quad9_mesh::<f64>(2, 1, [0.0, 1.0], [0.0, 0.2]);
    let mut config = ElasticityConfig::default();
    config.boundary.conditions.remove(&BOTTOM);
    let result = ElasticitySystem::new(mesh, config);
    assert!(matches!(
        result,
        Err(AssemblyError::UnboundBoundaryId {
            element: 0,
            side: 0,
            id: BOTTOM
        })
    ));
}

#[test]
fn condition_on_invalid_component_is_an_error() {
    let mesh = create_rectangular_quad9_mesh::<f64>(2, 1, [0.0, 1.0], [0.0, 0.2]);
    let mut config = ElasticityConfig::default();
    config
        .boundary
        .conditions
        .insert(BOTTOM, BoundaryCondition::Traction { component: 2, value: 1.0 });
    let result = ElasticitySystem::new(mesh, config);
    assert!(matches!(
        result,
        Err(AssemblyError::InvalidComponent { id: BOTTOM, component: 2 })
    ));
}

#[test]
fn unsupported_quadrature_is_reported_before_assembly() {
    let config = ElasticityConfig {
        quadrature_points: 0,
        ..serial_config()
    };
    let mesh = create_rectangular_quad9_mesh::<f64>(2, 1, [0.0, 1.0], [0.0, 0.2]);
    assert!(matches!(
        ElasticitySystem::new(mesh, config),
        Err(AssemblyError::NoQuadratureRule(_))
    ));
}
