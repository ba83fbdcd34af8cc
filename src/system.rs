//! High-level driver: set up, assemble and solve the constrained elasticity problem.
use crate::assembly::dirichlet::DirichletConstraints;
use crate::assembly::global::{apply_dirichlet_csr, ElasticityAssembler, ElasticityFields, GlobalSystem};
use crate::assembly::local::{BoundaryBindings, BoundaryCondition};
use crate::config::{DirichletStrategy, ElasticityConfig, SolverConfig, SolverKind};
use crate::dof::{DofMap, FeType, Variable};
use crate::error::AssemblyError;
use crate::fe::FeEvaluator;
use crate::material::ElasticityTensor;
use crate::mesh::procedural::create_rectangular_quad9_mesh;
use crate::mesh::{BoundaryId, Mesh};
use crate::nalgebra::{convert, DVector};
use crate::Real;
use elastica_sparse::cg::{ConjugateGradient, Preconditioner, SolveError};
use elastica_sparse::direct::{solve_dense_lu, DirectSolveError};
use eyre::WrapErr;
use itertools::izip;
use log::{debug, info, warn};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::fmt;

/// Failure of the linear solver.
///
/// The assembled system remains valid and can be solved again with a different
/// [`SolverConfig`].
#[derive(Debug)]
#[non_exhaustive]
pub enum SolverError {
    ConjugateGradient(SolveError),
    Direct(DirectSolveError),
    /// The multiplier is not determined by the system, typically because the constraint
    /// functional vanishes identically.
    SingularConstraint,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConjugateGradient(err) => write!(f, "Conjugate gradient failed: {}", err),
            Self::Direct(err) => write!(f, "Direct solve failed: {}", err),
            Self::SingularConstraint => write!(f, "Constraint does not determine the multiplier"),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConjugateGradient(err) => Some(err),
            Self::Direct(err) => Some(err),
            Self::SingularConstraint => None,
        }
    }
}

impl From<SolveError> for SolverError {
    fn from(err: SolveError) -> Self {
        Self::ConjugateGradient(err)
    }
}

impl From<DirectSolveError> for SolverError {
    fn from(err: DirectSolveError) -> Self {
        Self::Direct(err)
    }
}

/// Solution fields copied back to the mesh vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T: Real> {
    /// Horizontal displacement at each vertex.
    pub u: DVector<T>,
    /// Vertical displacement at each vertex.
    pub v: DVector<T>,
    /// The Lagrange multiplier of the constraint.
    pub lambda: T,
    /// The full solution vector, indexed by global degree of freedom.
    pub dofs: DVector<T>,
}

/// The elasticity problem with a scalar multiplier constraint on a Quad9 mesh.
#[derive(Debug)]
pub struct ElasticitySystem<T: Real> {
    mesh: Mesh<T>,
    dof_map: DofMap,
    fields: ElasticityFields,
    tensor: ElasticityTensor<T>,
    constraints: DirichletConstraints<T>,
    config: ElasticityConfig,
}

impl<T> ElasticitySystem<T>
where
    T: Real + Send + Sync,
{
    /// Sets up the problem on the given mesh.
    ///
    /// The variables are `u` and `v` (second order Lagrange) and the scalar `lambda`.
    pub fn new(mesh: Mesh<T>, config: ElasticityConfig) -> Result<Self, AssemblyError> {
        let variables = vec![
            Variable::new("u", FeType::Lagrange { order: 2 }),
            Variable::new("v", FeType::Lagrange { order: 2 }),
            Variable::new("lambda", FeType::Scalar),
        ];
        let dof_map = DofMap::new(mesh.num_vertices(), variables);
        let fields = ElasticityFields {
            u: dof_map.variable_number("u")?,
            v: dof_map.variable_number("v")?,
            lambda: dof_map.variable_number("lambda")?,
        };

        // Fail on invalid element types and boundary tags before anything is assembled
        FeEvaluator::<T>::new(2, dof_map.variable_type(fields.u), config.quadrature_points)?;
        config.boundary.validate(&mesh)?;

        let constraints = DirichletConstraints::from_boundaries(&mesh, &dof_map, &config.boundary.dirichlet)?;
        let tensor = ElasticityTensor::from_poisson_ratio(convert(config.poisson_ratio));

        info!(
            "Elasticity system: {} elements, {} vertices, {} dofs, {} Dirichlet constrained dofs",
            mesh.num_elements(),
            mesh.num_vertices(),
            dof_map.n_dofs(),
            constraints.len()
        );

        Ok(Self {
            mesh,
            dof_map,
            fields,
            tensor,
            constraints,
            config,
        })
    }

    /// Sets up the problem on the rectangular mesh described by the configuration.
    pub fn from_config(config: ElasticityConfig) -> Result<Self, AssemblyError> {
        let mesh_config = &config.mesh;
        mesh_config.validate()?;
        let mesh = create_rectangular_quad9_mesh(
            mesh_config.elements_x,
            mesh_config.elements_y,
            mesh_config.x_range.map(convert),
            mesh_config.y_range.map(convert),
        );
        Self::new(mesh, config)
    }

    pub fn mesh(&self) -> &Mesh<T> {
        &self.mesh
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    pub fn fields(&self) -> ElasticityFields {
        self.fields
    }

    pub fn tensor(&self) -> &ElasticityTensor<T> {
        &self.tensor
    }

    pub fn constraints(&self) -> &DirichletConstraints<T> {
        &self.constraints
    }

    pub fn config(&self) -> &ElasticityConfig {
        &self.config
    }

    pub fn bindings(&self) -> &BoundaryBindings {
        &self.config.boundary
    }

    /// An assembler for this system, without Dirichlet elimination.
    pub fn assembler(&self) -> Result<ElasticityAssembler<T>, AssemblyError> {
        ElasticityAssembler::new(
            &self.mesh,
            &self.dof_map,
            &self.config.boundary,
            self.tensor,
            self.fields,
            self.config.quadrature_points,
        )
    }

    /// Assembles the global system, with Dirichlet conditions applied according to the
    /// configured strategy.
    pub fn assemble(&self) -> Result<GlobalSystem<T>, AssemblyError> {
        let strategy = self.config.dirichlet_strategy;
        let mut assembler = self.assembler()?;
        if strategy == DirichletStrategy::Local {
            assembler = assembler.with_local_dirichlet(&self.constraints);
        }

        let mut system = if self.config.parallel {
            assembler.par_assemble()?
        } else {
            assembler.assemble()?
        };

        if strategy == DirichletStrategy::Global {
            apply_dirichlet_csr(&mut system, &self.constraints)?;
        }
        debug!(
            "Assembled global system ({:?} Dirichlet strategy, {} nonzeros)",
            strategy,
            system.matrix.nnz()
        );
        Ok(system)
    }

    /// Assembles and solves the system with the configured solver.
    pub fn solve(&self) -> eyre::Result<Solution<T>> {
        let system = self.assemble().wrap_err("Failed to assemble elasticity system")?;
        let solution = self
            .solve_assembled(&system, &self.config.solver)
            .wrap_err("Failed to solve elasticity system")?;
        Ok(solution)
    }

    /// Solves an assembled system.
    ///
    /// A solver failure leaves `system` untouched, so the caller may retry with another
    /// configuration.
    pub fn solve_assembled(&self, system: &GlobalSystem<T>, solver: &SolverConfig) -> Result<Solution<T>, SolverError> {
        let multiplier_dof = self.multiplier_dof();
        let result = match solver.kind {
            SolverKind::DenseLu => solve_dense_lu(&system.matrix, &system.rhs).map_err(SolverError::from),
            SolverKind::ConjugateGradient => solve_cg(&system.matrix, &system.rhs, solver),
            SolverKind::SchurComplementCg => solve_schur_complement_cg(system, multiplier_dof, solver),
        };

        let dofs = result.map_err(|err| {
            warn!("Linear solve with {:?} failed: {}", solver.kind, err);
            err
        })?;

        let solution = self.solution_from_dofs(dofs);
        info!(
            "Solved with {:?}: lambda = {}, min v = {}",
            solver.kind,
            solution.lambda,
            solution.v.min()
        );
        Ok(solution)
    }

    /// Copies the values of a global solution vector back to the mesh vertices.
    ///
    /// # Panics
    ///
    /// Panics if the vector does not have one entry per degree of freedom.
    pub fn solution_from_dofs(&self, dofs: DVector<T>) -> Solution<T> {
        assert_eq!(dofs.len(), self.dof_map.n_dofs(), "Solution must have one entry per dof");
        let nodal = |field| {
            DVector::from_fn(self.mesh.num_vertices(), |node, _| {
                self.dof_map
                    .node_dof(node, field)
                    .map(|dof| dofs[dof])
                    .unwrap_or_else(T::zero)
            })
        };
        let u = nodal(self.fields.u);
        let v = nodal(self.fields.v);
        let lambda = dofs[self.multiplier_dof()];
        Solution { u, v, lambda, dofs }
    }

    /// Integrates a nodal field over all sides tagged with the given boundary id.
    pub fn boundary_integral(&self, nodal_values: &DVector<T>, id: BoundaryId) -> Result<T, AssemblyError> {
        let mut fe = FeEvaluator::new(
            2,
            self.dof_map.variable_type(self.fields.u),
            self.config.quadrature_points,
        )?;
        let mut integral = T::zero();
        for (element_index, side) in self.mesh.exterior_sides() {
            if self.mesh.boundary_id(element_index, side) != Some(id) {
                continue;
            }
            let element = self
                .mesh
                .element(element_index)
                .ok_or(AssemblyError::ElementOutOfBounds { element: element_index })?;
            let connectivity = &self.mesh.connectivity()[element_index];
            fe.reinit_side(element_index, &element, side)?;
            for (&jxw, phi) in izip!(fe.side_jxw(), fe.side_phi()) {
                for (i, &node) in connectivity.iter().enumerate() {
                    integral += jxw * phi[i] * nodal_values[node];
                }
            }
        }
        Ok(integral)
    }

    /// Evaluates the functional enforced by the multiplier constraints for the given solution.
    ///
    /// Returns the sum of `coefficient * \int component` over all constrained boundaries.
    pub fn constraint_residual(&self, solution: &Solution<T>) -> Result<T, AssemblyError> {
        let mut residual = T::zero();
        for (&id, condition) in &self.config.boundary.conditions {
            if let BoundaryCondition::MultiplierConstraint { component, coefficient } = *condition {
                let values = if component == 0 { &solution.u } else { &solution.v };
                residual += convert::<f64, T>(coefficient) * self.boundary_integral(values, id)?;
            }
        }
        Ok(residual)
    }

    fn multiplier_dof(&self) -> usize {
        self.dof_map
            .scalar_dof(self.fields.lambda)
            .expect("Multiplier is a scalar variable")
    }
}

fn solve_cg<T: Real>(matrix: &CsrMatrix<T>, rhs: &DVector<T>, config: &SolverConfig) -> Result<DVector<T>, SolverError> {
    let mut cg = ConjugateGradient::new(convert(config.tolerance));
    if let Some(max_iterations) = config.max_iterations {
        cg = cg.with_max_iterations(max_iterations);
    }
    if config.jacobi {
        cg = cg.with_preconditioner(Preconditioner::jacobi(matrix));
    }
    let mut x = DVector::zeros(rhs.len());
    let output = cg.solve(matrix, rhs, &mut x)?;
    debug!("CG converged in {} iterations", output.num_iterations);
    Ok(x)
}

/// Solves the saddle point system
/// ```text
/// [ K    b ] [ x      ]   [ f ]
/// [ b^T  c ] [ lambda ] = [ g ]
/// ```
/// by solving `K x1 = f` and `K x2 = b` with CG, then setting
/// `lambda = (b^T x1 - g) / (b^T x2 - c)` and `x = x1 - lambda x2`.
///
/// The system is assumed to be symmetric, so `b` is read from the multiplier row.
fn solve_schur_complement_cg<T: Real>(
    system: &GlobalSystem<T>,
    multiplier_dof: usize,
    config: &SolverConfig,
) -> Result<DVector<T>, SolverError> {
    let n = system.num_dofs();
    let m = multiplier_dof;
    // Index in the reduced system, which lacks the multiplier
    let reduced = |i: usize| if i < m { i } else { i - 1 };

    let mut coo = CooMatrix::new(n - 1, n - 1);
    for (i, j, &value) in system.matrix.triplet_iter() {
        if i != m && j != m {
            coo.push(reduced(i), reduced(j), value);
        }
    }
    let k = CsrMatrix::from(&coo);

    let mut b = DVector::zeros(n - 1);
    let mut c = T::zero();
    let multiplier_row = system.matrix.row(m);
    for (&j, &value) in multiplier_row.col_indices().iter().zip(multiplier_row.values()) {
        if j == m {
            c = value;
        } else {
            b[reduced(j)] = value;
        }
    }

    let f = DVector::from_iterator(
        n - 1,
        (0..n).filter(|&i| i != m).map(|i| system.rhs[i]),
    );
    let g = system.rhs[m];

    let x1 = solve_cg(&k, &f, config)?;
    let x2 = solve_cg(&k, &b, config)?;

    let schur = b.dot(&x2) - c;
    if schur == T::zero() {
        return Err(SolverError::SingularConstraint);
    }
    let lambda = (b.dot(&x1) - g) / schur;
    let x = x1 - x2 * lambda;

    let mut solution = DVector::zeros(n);
    for i in (0..n).filter(|&i| i != m) {
        solution[i] = x[reduced(i)];
    }
    solution[m] = lambda;
    Ok(solution)
}
