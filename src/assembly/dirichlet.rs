//! Essential (Dirichlet) boundary conditions and their elimination from local systems.
use crate::assembly::local::LocalSystem;
use crate::dof::DofMap;
use crate::error::AssemblyError;
use crate::mesh::{procedural, BoundaryId, Mesh};
use crate::nalgebra::convert;
use crate::Real;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declares that the given fields take the prescribed value on all sides tagged with one of
/// the given boundary ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirichletBoundary {
    pub boundary_ids: BTreeSet<BoundaryId>,
    /// Variable indices in the [`DofMap`].
    pub fields: Vec<usize>,
    #[serde(default)]
    pub value: f64,
}

impl Default for DirichletBoundary {
    /// Clamps both displacement components on the left side of a rectangular mesh.
    fn default() -> Self {
        Self {
            boundary_ids: [procedural::LEFT].into_iter().collect(),
            fields: vec![0, 1],
            value: 0.0,
        }
    }
}

/// Prescribed values of constrained global degrees of freedom.
///
/// Computed once before assembly and shared read-only by all elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirichletConstraints<T> {
    values: FxHashMap<usize, T>,
}

impl<T: Real> DirichletConstraints<T> {
    /// Collects the constrained degrees of freedom of every vertex on the declared boundaries.
    ///
    /// If several declarations constrain the same degree of freedom, the last one wins.
    pub fn from_boundaries(
        mesh: &Mesh<T>,
        dof_map: &DofMap,
        boundaries: &[DirichletBoundary],
    ) -> Result<Self, AssemblyError> {
        let mut values = FxHashMap::default();
        for boundary in boundaries {
            let value: T = convert(boundary.value);
            let vertices = mesh.vertices_with_boundary_ids(&boundary.boundary_ids);
            for &field in &boundary.fields {
                if field >= dof_map.n_variables() {
                    return Err(AssemblyError::UnknownVariable {
                        name: format!("#{}", field),
                    });
                }
                match dof_map.scalar_dof(field) {
                    Some(dof) => {
                        if !vertices.is_empty() {
                            values.insert(dof, value);
                        }
                    }
                    None => {
                        for &vertex in &vertices {
                            if let Some(dof) = dof_map.node_dof(vertex, field) {
                                values.insert(dof, value);
                            }
                        }
                    }
                }
            }
        }
        Ok(Self { values })
    }

    pub fn from_values(values: impl IntoIterator<Item = (usize, T)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// The prescribed value of the given global degree of freedom, if it is constrained.
    pub fn get(&self, dof: usize) -> Option<T> {
        self.values.get(&dof).copied()
    }

    pub fn contains(&self, dof: usize) -> bool {
        self.values.contains_key(&dof)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The constrained degrees of freedom in ascending order, with their values.
    pub fn sorted(&self) -> Vec<(usize, T)> {
        let mut entries: Vec<_> = self.values.iter().map(|(&dof, &value)| (dof, value)).collect();
        entries.sort_unstable_by_key(|&(dof, _)| dof);
        entries
    }
}

/// Eliminates constrained degrees of freedom from a local system.
///
/// For every local degree of freedom `r` whose global index `dofs[r]` is constrained to the
/// value `g`, the column `r` times `g` is moved to the right-hand side, row and column `r` are
/// zeroed, the diagonal entry is set to one and the right-hand side entry to `g`.
///
/// Applying the elimination twice gives the same result as applying it once.
///
/// Fails with [`AssemblyError::DofCountMismatch`] if the number of indices does not match the
/// size of the local system, in which case the local system is left untouched.
pub fn apply_local_dirichlet<T>(
    local: &mut LocalSystem<T>,
    dofs: &[usize],
    constraints: &DirichletConstraints<T>,
) -> Result<(), AssemblyError>
where
    T: Real,
{
    check_local_size(local, dofs)?;
    if constraints.is_empty() {
        return Ok(());
    }

    let n = local.size();
    for (r, &dof) in dofs.iter().enumerate() {
        if let Some(value) = constraints.get(dof) {
            for i in 0..n {
                if i != r {
                    let coupling = local.matrix()[(i, r)];
                    local.rhs_mut()[i] -= coupling * value;
                }
            }
            let matrix = local.matrix_mut();
            matrix.column_mut(r).fill(T::zero());
            matrix.row_mut(r).fill(T::zero());
            matrix[(r, r)] = T::one();
            local.rhs_mut()[r] = value;
        }
    }
    Ok(())
}

/// Checks that a local system has one row per global index.
pub(crate) fn check_local_size<T: Real>(local: &LocalSystem<T>, dofs: &[usize]) -> Result<(), AssemblyError> {
    if dofs.len() == local.size() {
        Ok(())
    } else {
        Err(AssemblyError::DofCountMismatch {
            element: None,
            expected: local.size(),
            actual: dofs.len(),
        })
    }
}
