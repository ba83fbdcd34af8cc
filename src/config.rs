//! Serializable configuration of an elasticity problem.
//!
//! Every field has a default, so that an empty JSON object describes the cantilever beam
//! problem: a `50 x 10` Quad9 mesh of `[0, 1] x [0, 0.2]` with Poisson ratio `0.3`, clamped on the
//! left, loaded on top and with the integral of the vertical displacement over the right side
//! constrained to zero.
use crate::assembly::local::BoundaryBindings;
use crate::error::AssemblyError;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub elements_x: usize,
    pub elements_y: usize,
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            elements_x: 50,
            elements_y: 10,
            x_range: [0.0, 1.0],
            y_range: [0.0, 0.2],
        }
    }
}

impl MeshConfig {
    /// Checks that the configuration describes a non-empty, positively oriented rectangle.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let invalid = |reason: String| -> Result<(), AssemblyError> {
            Err(AssemblyError::InvalidMeshConfig { reason })
        };
        if self.elements_x == 0 || self.elements_y == 0 {
            return invalid(format!(
                "need at least one element in each direction, got {} x {}",
                self.elements_x, self.elements_y
            ));
        }
        for (name, [min, max]) in [("x", self.x_range), ("y", self.y_range)] {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return invalid(format!(
                    "{}_range [{}, {}] is not an increasing finite interval",
                    name, min, max
                ));
            }
        }
        Ok(())
    }
}

/// How Dirichlet conditions enter the global system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirichletStrategy {
    /// Eliminate constrained degrees of freedom from each local system before scattering.
    #[default]
    Local,
    /// Eliminate constrained degrees of freedom from the assembled CSR system.
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Conjugate gradient on the displacement block, with the multiplier recovered from the
    /// Schur complement of the single constraint.
    #[default]
    SchurComplementCg,
    /// Conjugate gradient applied to the full, indefinite system. May fail.
    ConjugateGradient,
    /// Dense LU factorization of the full system. Only suitable for small problems.
    DenseLu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// Relative residual tolerance for iterative solvers.
    pub tolerance: f64,
    pub max_iterations: Option<usize>,
    /// Use a Jacobi preconditioner for iterative solvers.
    pub jacobi: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::default(),
            tolerance: 1e-10,
            max_iterations: None,
            jacobi: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticityConfig {
    pub mesh: MeshConfig,
    pub poisson_ratio: f64,
    /// Gauss points per reference direction for element and side integrals.
    pub quadrature_points: usize,
    pub boundary: BoundaryBindings,
    pub dirichlet_strategy: DirichletStrategy,
    pub solver: SolverConfig,
    /// Compute element contributions in parallel.
    pub parallel: bool,
}

impl Default for ElasticityConfig {
    fn default() -> Self {
        Self {
            mesh: MeshConfig::default(),
            poisson_ratio: 0.3,
            quadrature_points: crate::quadrature::DEFAULT_POINTS_PER_DIM,
            boundary: BoundaryBindings::default(),
            dirichlet_strategy: DirichletStrategy::default(),
            solver: SolverConfig::default(),
            parallel: true,
        }
    }
}

impl ElasticityConfig {
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse elasticity configuration")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(self).wrap_err("Failed to serialize elasticity configuration")
    }
}
