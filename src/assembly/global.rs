use crate::assembly::dirichlet::{apply_local_dirichlet, check_local_size, DirichletConstraints};
use crate::assembly::local::{
    assemble_element_boundary_terms, assemble_element_stiffness, BoundaryBindings, ElasticityBlocks, LocalSystem,
};
use crate::dof::{DofMap, FeType, LocalLayout};
use crate::error::AssemblyError;
use crate::fe::FeEvaluator;
use crate::material::ElasticityTensor;
use crate::mesh::Mesh;
use crate::nalgebra::storage::Storage;
use crate::nalgebra::{DVector, Dyn, Matrix, Scalar, U1};
use crate::Real;

use log::debug;
use nalgebra_sparse::csr::CsrRowMut;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use num::Zero;
use rayon::prelude::*;
use thread_local::ThreadLocal;

use std::cell::RefCell;
use std::collections::BTreeSet;

/// Builds the sparsity pattern of a square matrix from the global indices of each element.
///
/// The pattern contains exactly the pairs of indices that appear together in at least one
/// element.
pub fn pattern_from_element_dofs<'a>(
    num_dofs: usize,
    element_dofs: impl IntoIterator<Item = &'a [usize]>,
) -> SparsityPattern {
    // Collecting into a BTreeSet stores each entry exactly once, which matters since a large
    // number of entries (in particular those of the multiplier) are shared by many elements.
    let mut matrix_entries = BTreeSet::new();
    for dofs in element_dofs {
        for &i in dofs {
            for &j in dofs {
                matrix_entries.insert((i, j));
            }
        }
    }

    let mut offsets = Vec::with_capacity(num_dofs + 1);
    let mut column_indices = Vec::with_capacity(matrix_entries.len());

    offsets.push(0);
    for (i, j) in matrix_entries {
        while i + 1 > offsets.len() {
            // Loop to correctly handle consecutive empty rows
            offsets.push(column_indices.len());
        }
        column_indices.push(j);
    }

    // Fill out the remaining offsets if the last rows are empty
    while offsets.len() < (num_dofs + 1) {
        offsets.push(column_indices.len());
    }

    SparsityPattern::try_from_offsets_and_indices(num_dofs, num_dofs, offsets, column_indices)
        .expect("Sorted, deduplicated entries always form a valid pattern")
}

/// A global sparse matrix and its right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSystem<T: Scalar> {
    pub matrix: CsrMatrix<T>,
    pub rhs: DVector<T>,
}

impl<T> GlobalSystem<T>
where
    T: Scalar + Zero,
{
    /// A system with the given sparsity pattern and all values zero.
    pub fn zeros(pattern: SparsityPattern) -> Self {
        let n = pattern.major_dim();
        let values = vec![T::zero(); pattern.nnz()];
        let matrix = CsrMatrix::try_from_pattern_and_values(pattern, values)
            .expect("Number of values matches the number of pattern entries");
        Self {
            matrix,
            rhs: DVector::zeros(n),
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.rhs.len()
    }
}

impl<T> GlobalSystem<T>
where
    T: Real,
{
    /// Adds another system to this one.
    ///
    /// If both systems share the same sparsity pattern, values are added in place. Otherwise
    /// the matrix is replaced by the sparse sum, whose pattern is the union of both patterns.
    ///
    /// # Panics
    ///
    /// Panics if the systems have different dimensions.
    pub fn add_assign_system(&mut self, other: &GlobalSystem<T>) {
        assert_eq!(self.num_dofs(), other.num_dofs(), "Systems must have the same dimensions");
        if self.matrix.pattern() == other.matrix.pattern() {
            for (a, b) in self.matrix.values_mut().iter_mut().zip(other.matrix.values()) {
                *a += *b;
            }
        } else {
            self.matrix = &self.matrix + &other.matrix;
        }
        self.rhs += &other.rhs;
    }

    /// Adds a local system into the global system at the given global indices.
    pub fn scatter_add(&mut self, dofs: &[usize], local: &LocalSystem<T>) -> Result<(), AssemblyError> {
        let mut permutation = Vec::with_capacity(dofs.len());
        scatter_add_local(self, dofs, local, &mut permutation)
    }
}

fn scatter_add_local<T: Real>(
    system: &mut GlobalSystem<T>,
    dofs: &[usize],
    local: &LocalSystem<T>,
    sorted_permutation: &mut Vec<usize>,
) -> Result<(), AssemblyError> {
    check_local_size(local, dofs)?;
    check_pattern_contains(system.matrix.pattern(), dofs)?;

    sorted_permutation.clear();
    sorted_permutation.extend(0..dofs.len());
    sorted_permutation.sort_unstable_by_key(|i| dofs[*i]);

    for (local_row_index, &global_row_index) in dofs.iter().enumerate() {
        let mut csr_row = system
            .matrix
            .get_row_mut(global_row_index)
            .ok_or(AssemblyError::PatternMismatch {
                row: global_row_index,
                col: global_row_index,
            })?;
        let a_row = local.matrix().row(local_row_index);
        add_element_row_to_csr_row(&mut csr_row, global_row_index, dofs, sorted_permutation, &a_row)?;
        system.rhs[global_row_index] += local.rhs()[local_row_index];
    }
    Ok(())
}

/// Checks that every pair of the given indices is an entry of the pattern, so that a failed
/// scatter leaves the global system untouched.
fn check_pattern_contains(pattern: &SparsityPattern, dofs: &[usize]) -> Result<(), AssemblyError> {
    for &row in dofs {
        let lane = pattern
            .get_lane(row)
            .ok_or(AssemblyError::PatternMismatch { row, col: row })?;
        for &col in dofs {
            if lane.binary_search(&col).is_err() {
                return Err(AssemblyError::PatternMismatch { row, col });
            }
        }
    }
    Ok(())
}

/// Add a row of a local element matrix to the provided row of a CSR matrix.
///
/// `global_indices`: The global indices of the local degrees of freedom.
/// `sorted_permutation`: The local indices ordered such that the corresponding global indices
///    are sorted.
/// `local_row`: The local row of the element matrix that should be added to the CSR matrix.
fn add_element_row_to_csr_row<T, S>(
    row: &mut CsrRowMut<T>,
    global_row_index: usize,
    global_indices: &[usize],
    sorted_permutation: &[usize],
    local_row: &Matrix<T, U1, Dyn, S>,
) -> Result<(), AssemblyError>
where
    T: Real,
    S: Storage<T, U1, Dyn>,
{
    assert_eq!(global_indices.len(), sorted_permutation.len());
    assert_eq!(global_indices.len(), local_row.ncols());

    let (column_indices, values) = row.cols_and_values_mut();
    let mut csr_col_idx_iter = column_indices.iter().copied().enumerate();

    for &local_col_index in sorted_permutation {
        let global_col_index = global_indices[local_col_index];
        // Both sequences are sorted, so a single linear pass suffices
        let (local_csr_col_idx, _) = csr_col_idx_iter
            .find(|(_, csr_col_idx)| *csr_col_idx == global_col_index)
            .ok_or(AssemblyError::PatternMismatch {
                row: global_row_index,
                col: global_col_index,
            })?;
        values[local_csr_col_idx] += local_row[local_col_index];
    }
    Ok(())
}

/// The local contribution of a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementContribution<T: Scalar> {
    pub element: usize,
    /// Global indices of the local degrees of freedom.
    pub dofs: Vec<usize>,
    pub local: LocalSystem<T>,
}

impl<T: Scalar + Zero> ElementContribution<T> {
    pub fn new(element: usize) -> Self {
        Self {
            element,
            dofs: Vec::new(),
            local: LocalSystem::zeros(0),
        }
    }
}

/// Variable indices of the fields of the elasticity problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElasticityFields {
    pub u: usize,
    pub v: usize,
    pub lambda: usize,
}

/// Assembles the elasticity system with multiplier constraint over the active elements of a
/// mesh.
///
/// Each element produces an independent [`ElementContribution`]. The serial assembler scatters
/// each contribution as soon as it is computed. The parallel assembler computes all
/// contributions with `rayon` before scattering them sequentially in element order, so both
/// produce identical systems.
#[derive(Debug)]
pub struct ElasticityAssembler<'a, T: Real + Send> {
    mesh: &'a Mesh<T>,
    dof_map: &'a DofMap,
    bindings: &'a BoundaryBindings,
    tensor: ElasticityTensor<T>,
    constraints: Option<&'a DirichletConstraints<T>>,
    layout: LocalLayout,
    blocks: ElasticityBlocks,
    fe: FeEvaluator<T>,
    fe_workspaces: ThreadLocal<RefCell<FeEvaluator<T>>>,
}

impl<'a, T: Real + Send> ElasticityAssembler<'a, T> {
    /// Creates an assembler, checking the configuration before any element is visited.
    ///
    /// Fails if the displacement fields are not second order Lagrange fields, if the multiplier
    /// is not a scalar field, if no quadrature with `points_per_dim` points exists or if an
    /// exterior side of the mesh has no valid boundary condition.
    pub fn new(
        mesh: &'a Mesh<T>,
        dof_map: &'a DofMap,
        bindings: &'a BoundaryBindings,
        tensor: ElasticityTensor<T>,
        fields: ElasticityFields,
        points_per_dim: usize,
    ) -> Result<Self, AssemblyError> {
        for field in [fields.u, fields.v, fields.lambda] {
            if field >= dof_map.n_variables() {
                return Err(AssemblyError::UnknownVariable {
                    name: format!("#{}", field),
                });
            }
        }

        let fe_type = dof_map.variable_type(fields.u);
        let fe = FeEvaluator::new(2, fe_type, points_per_dim)?;
        let v_type = dof_map.variable_type(fields.v);
        if v_type != fe_type {
            return Err(AssemblyError::UnsupportedElement {
                dimension: 2,
                fe_type: v_type,
            });
        }
        let lambda_type = dof_map.variable_type(fields.lambda);
        if lambda_type != FeType::Scalar {
            return Err(AssemblyError::UnsupportedElement {
                dimension: 2,
                fe_type: lambda_type,
            });
        }

        bindings.validate(mesh)?;

        let layout = dof_map.local_layout(9);
        let blocks = ElasticityBlocks::new(&layout, [fields.u, fields.v], fields.lambda);
        Ok(Self {
            mesh,
            dof_map,
            bindings,
            tensor,
            constraints: None,
            layout,
            blocks,
            fe,
            fe_workspaces: ThreadLocal::new(),
        })
    }

    /// Eliminates the given constraints from every local system before it is scattered.
    pub fn with_local_dirichlet(self, constraints: &'a DirichletConstraints<T>) -> Self {
        Self {
            constraints: Some(constraints),
            ..self
        }
    }

    pub fn layout(&self) -> &LocalLayout {
        &self.layout
    }

    pub fn blocks(&self) -> &ElasticityBlocks {
        &self.blocks
    }

    /// Computes the local system of a single element.
    pub fn compute_element(
        &self,
        element_index: usize,
        fe: &mut FeEvaluator<T>,
        contribution: &mut ElementContribution<T>,
    ) -> Result<(), AssemblyError> {
        let connectivity = self
            .mesh
            .connectivity()
            .get(element_index)
            .ok_or(AssemblyError::ElementOutOfBounds { element: element_index })?;
        let element = self
            .mesh
            .element(element_index)
            .ok_or(AssemblyError::ElementOutOfBounds { element: element_index })?;

        contribution.element = element_index;
        self.dof_map
            .element_dof_indices(connectivity, &mut contribution.dofs);
        let expected = self.layout.total();
        if contribution.dofs.len() != expected {
            return Err(AssemblyError::DofCountMismatch {
                element: Some(element_index),
                expected,
                actual: contribution.dofs.len(),
            });
        }

        let local = &mut contribution.local;
        local.reset(expected);
        fe.reinit(element_index, &element)?;
        assemble_element_stiffness(local, fe, &self.tensor, &self.blocks);
        assemble_element_boundary_terms(
            local,
            fe,
            self.mesh,
            element_index,
            &element,
            self.bindings,
            &self.blocks,
        )?;

        if let Some(constraints) = self.constraints {
            apply_local_dirichlet(local, &contribution.dofs, constraints)?;
        }
        Ok(())
    }

    /// The sparsity pattern of the system restricted to the given elements.
    pub fn assemble_pattern(&self, elements: &[usize]) -> Result<SparsityPattern, AssemblyError> {
        let mut element_dofs = Vec::with_capacity(elements.len());
        for &element in elements {
            let connectivity = self
                .mesh
                .connectivity()
                .get(element)
                .ok_or(AssemblyError::ElementOutOfBounds { element })?;
            let mut dofs = Vec::new();
            self.dof_map.element_dof_indices(connectivity, &mut dofs);
            element_dofs.push(dofs);
        }
        Ok(pattern_from_element_dofs(
            self.dof_map.n_dofs(),
            element_dofs.iter().map(Vec::as_slice),
        ))
    }

    /// Serially assembles the system over the active local elements of the mesh.
    pub fn assemble(&self) -> Result<GlobalSystem<T>, AssemblyError> {
        let elements: Vec<_> = self.mesh.active_local_elements().collect();
        self.assemble_elements(&elements)
    }

    /// Serially assembles the contributions of the given elements only.
    pub fn assemble_elements(&self, elements: &[usize]) -> Result<GlobalSystem<T>, AssemblyError> {
        let mut system = GlobalSystem::zeros(self.assemble_pattern(elements)?);
        let mut fe = self.fe.clone();
        let mut contribution = ElementContribution::new(0);
        let mut permutation = Vec::new();
        for &element in elements {
            self.compute_element(element, &mut fe, &mut contribution)?;
            scatter_add_local(&mut system, &contribution.dofs, &contribution.local, &mut permutation)?;
        }
        debug!(
            "Assembled {} elements into system with {} dofs and {} nonzeros",
            elements.len(),
            system.num_dofs(),
            system.matrix.nnz()
        );
        Ok(system)
    }
}

impl<'a, T: Real + Send + Sync> ElasticityAssembler<'a, T> {
    /// Computes the contributions of all active local elements in parallel.
    ///
    /// Fails without producing any contribution if a single element fails.
    pub fn compute_contributions_par(&self) -> Result<Vec<ElementContribution<T>>, AssemblyError> {
        let elements: Vec<_> = self.mesh.active_local_elements().collect();
        elements
            .into_par_iter()
            .with_min_len(16)
            .map(|element| {
                let mut fe = self
                    .fe_workspaces
                    .get_or(|| RefCell::new(self.fe.clone()))
                    .borrow_mut();
                let mut contribution = ElementContribution::new(element);
                self.compute_element(element, &mut fe, &mut contribution)?;
                Ok::<_, AssemblyError>(contribution)
            })
            .collect()
    }

    /// Assembles the system over the active local elements, computing element contributions
    /// in parallel and scattering them sequentially.
    pub fn par_assemble(&self) -> Result<GlobalSystem<T>, AssemblyError> {
        let contributions = self.compute_contributions_par()?;
        let pattern = pattern_from_element_dofs(
            self.dof_map.n_dofs(),
            contributions
                .iter()
                .map(|contribution| contribution.dofs.as_slice()),
        );
        let mut system = GlobalSystem::zeros(pattern);
        let mut permutation = Vec::new();
        for contribution in &contributions {
            scatter_add_local(&mut system, &contribution.dofs, &contribution.local, &mut permutation)?;
        }
        debug!(
            "Assembled {} elements in parallel into system with {} dofs",
            contributions.len(),
            system.num_dofs()
        );
        Ok(system)
    }
}

/// Applies Dirichlet conditions to an assembled system.
///
/// Constrained rows are replaced by a scaled identity row with the scaled prescribed value on
/// the right-hand side. Constrained columns are zeroed, after moving their contribution to the
/// right-hand side. The sparsity pattern must be structurally symmetric.
pub fn apply_dirichlet_csr<T>(
    system: &mut GlobalSystem<T>,
    constraints: &DirichletConstraints<T>,
) -> Result<(), AssemblyError>
where
    T: Real,
{
    let n = system.num_dofs();

    // Take the first non-zero diagonal entry as a representative scale, so that the
    // constrained rows do not ruin the conditioning of the matrix
    let scale = system
        .matrix
        .diagonal_as_csr()
        .values()
        .iter()
        .copied()
        .find(|x| *x != T::zero())
        .map(|x| x.abs())
        .unwrap_or(T::one());

    let mut dirichlet_membership = vec![false; n];
    let mut rows_to_visit = vec![false; n];

    for (row_idx, value) in constraints.sorted() {
        if row_idx >= n {
            return Err(AssemblyError::PatternMismatch {
                row: row_idx,
                col: row_idx,
            });
        }
        dirichlet_membership[row_idx] = true;
        let mut row = system.matrix.row_mut(row_idx);
        let (cols, values) = row.cols_and_values_mut();
        let mut has_diagonal = false;
        for (&col_idx, val) in cols.iter().zip(values) {
            if col_idx == row_idx {
                *val = scale;
                has_diagonal = true;
            } else {
                *val = T::zero();
                // Zeroing (r, c) means (c, r) must be zeroed too, so column c is visited later
                rows_to_visit[col_idx] = true;
            }
        }
        if !has_diagonal {
            return Err(AssemblyError::PatternMismatch {
                row: row_idx,
                col: row_idx,
            });
        }
        system.rhs[row_idx] = scale * value;
    }

    for row_index in (0..n).filter(|&i| rows_to_visit[i] && !dirichlet_membership[i]) {
        let mut row = system.matrix.row_mut(row_index);
        let (cols, values) = row.cols_and_values_mut();
        let mut rhs_correction = T::zero();
        for (&col_idx, val) in cols.iter().zip(values) {
            if let Some(prescribed) = constraints.get(col_idx) {
                rhs_correction += *val * prescribed;
                *val = T::zero();
            }
        }
        system.rhs[row_index] -= rhs_correction;
    }

    Ok(())
}
