//! Solves the propped cantilever problem and writes the displacement to `cantilever.vtk`.
//!
//! An optional JSON configuration file may be given as the first argument. Missing entries
//! take their default values.
use elastica::config::{ElasticityConfig, SolverConfig, SolverKind};
use elastica::io::vtk::FiniteElementMeshDataSetBuilder;
use elastica::mesh::procedural::RIGHT;
use elastica::system::ElasticitySystem;
use eyre::WrapErr;
use log::{info, warn};

fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ElasticityConfig::from_json_file(path)?,
        None => ElasticityConfig::default(),
    };
    let problem = ElasticitySystem::<f64>::from_config(config).wrap_err("Invalid problem setup")?;
    let system = problem.assemble()?;

    let solution = match problem.solve_assembled(&system, &problem.config().solver) {
        Ok(solution) => solution,
        Err(err) => {
            warn!("Falling back to dense LU: {}", err);
            let fallback = SolverConfig {
                kind: SolverKind::DenseLu,
                ..SolverConfig::default()
            };
            problem.solve_assembled(&system, &fallback)?
        }
    };

    let v_integral = problem.boundary_integral(&solution.v, RIGHT)?;
    info!("lambda = {}", solution.lambda);
    info!("min v = {}", solution.v.min());
    info!("integral of v over the right side = {:e}", v_integral);

    FiniteElementMeshDataSetBuilder::from_mesh(problem.mesh())
        .with_title("Cantilever")
        .with_solution(&solution)
        .try_export("cantilever.vtk")?;
    Ok(())
}
