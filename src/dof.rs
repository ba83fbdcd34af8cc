//! Variables and the map from element-local to global degrees of freedom.
use crate::connectivity::Quad9d2Connectivity;
use crate::error::AssemblyError;
use serde::{Deserialize, Serialize};

/// Finite element family and order used to approximate a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FeType {
    /// Nodal Lagrange basis of the given polynomial order.
    Lagrange { order: usize },
    /// A single constant basis function spanning the whole domain.
    Scalar,
}

impl FeType {
    pub fn is_nodal(&self) -> bool {
        matches!(self, FeType::Lagrange { .. })
    }
}

/// A named unknown field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub fe_type: FeType,
}

impl Variable {
    pub fn new(name: impl Into<String>, fe_type: FeType) -> Self {
        Self {
            name: name.into(),
            fe_type,
        }
    }
}

/// Offsets of the field blocks in an element-local system.
///
/// The local system of an element is the concatenation of the blocks of all variables,
/// in variable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLayout {
    offsets: Vec<usize>,
    sizes: Vec<usize>,
}

impl LocalLayout {
    pub fn field_offset(&self, field: usize) -> usize {
        self.offsets[field]
    }

    pub fn field_size(&self, field: usize) -> usize {
        self.sizes[field]
    }

    pub fn field_range(&self, field: usize) -> std::ops::Range<usize> {
        let offset = self.field_offset(field);
        offset..offset + self.field_size(field)
    }

    /// Total number of local degrees of freedom.
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }
}

/// Map from (element, variable) to global degrees of freedom.
///
/// Nodal degrees of freedom are interleaved node by node: the `k`-th nodal variable at node `n`
/// has index `n * num_nodal_variables + k`. The degrees of freedom of scalar variables follow
/// after all nodal degrees of freedom, one per scalar variable. A scalar variable contributes
/// the same global index to every element.
#[derive(Debug, Clone)]
pub struct DofMap {
    num_nodes: usize,
    variables: Vec<Variable>,
    // Position of each variable among the variables of its kind
    slots: Vec<usize>,
    num_nodal_variables: usize,
    num_scalar_variables: usize,
}

impl DofMap {
    pub fn new(num_nodes: usize, variables: Vec<Variable>) -> Self {
        let mut num_nodal_variables = 0;
        let mut num_scalar_variables = 0;
        let slots = variables
            .iter()
            .map(|variable| {
                let counter = if variable.fe_type.is_nodal() {
                    &mut num_nodal_variables
                } else {
                    &mut num_scalar_variables
                };
                *counter += 1;
                *counter - 1
            })
            .collect();
        Self {
            num_nodes,
            variables,
            slots,
            num_nodal_variables,
            num_scalar_variables,
        }
    }

    pub fn n_dofs(&self) -> usize {
        self.num_nodes * self.num_nodal_variables + self.num_scalar_variables
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// # Panics
    ///
    /// Panics if the field index is out of bounds.
    pub fn variable_type(&self, field: usize) -> FeType {
        self.variables[field].fe_type
    }

    /// The index of the variable with the given name.
    pub fn variable_number(&self, name: &str) -> Result<usize, AssemblyError> {
        self.variables
            .iter()
            .position(|variable| variable.name == name)
            .ok_or_else(|| AssemblyError::UnknownVariable { name: name.to_string() })
    }

    /// The global index of the given nodal variable at the given node.
    ///
    /// Returns `None` if the variable is not nodal.
    pub fn node_dof(&self, node: usize, field: usize) -> Option<usize> {
        self.variable_type(field)
            .is_nodal()
            .then(|| node * self.num_nodal_variables + self.slots[field])
    }

    /// The global index of the given scalar variable.
    ///
    /// Returns `None` if the variable is not a scalar variable.
    pub fn scalar_dof(&self, field: usize) -> Option<usize> {
        (!self.variable_type(field).is_nodal()).then(|| self.num_nodes * self.num_nodal_variables + self.slots[field])
    }

    /// Replaces the contents of `indices` with the global indices of the given field on
    /// the element, ordered like the element's local basis functions.
    pub fn dof_indices(&self, connectivity: &Quad9d2Connectivity, field: usize, indices: &mut Vec<usize>) {
        indices.clear();
        self.push_dof_indices(connectivity, field, indices);
    }

    /// Replaces the contents of `indices` with the global indices of all fields on the element,
    /// concatenated in variable order.
    pub fn element_dof_indices(&self, connectivity: &Quad9d2Connectivity, indices: &mut Vec<usize>) {
        indices.clear();
        for field in 0..self.n_variables() {
            self.push_dof_indices(connectivity, field, indices);
        }
    }

    fn push_dof_indices(&self, connectivity: &Quad9d2Connectivity, field: usize, indices: &mut Vec<usize>) {
        match self.variable_type(field) {
            FeType::Lagrange { .. } => {
                let k = self.slots[field];
                let stride = self.num_nodal_variables;
                indices.extend(connectivity.iter().map(|node| node * stride + k));
            }
            FeType::Scalar => {
                indices.push(self.num_nodes * self.num_nodal_variables + self.slots[field]);
            }
        }
    }

    /// The layout of the local system of an element with the given number of nodes.
    pub fn local_layout(&self, nodes_per_element: usize) -> LocalLayout {
        let sizes: Vec<_> = self
            .variables
            .iter()
            .map(|variable| {
                if variable.fe_type.is_nodal() {
                    nodes_per_element
                } else {
                    1
                }
            })
            .collect();
        let offsets = sizes
            .iter()
            .scan(0, |offset, size| {
                let current = *offset;
                *offset += size;
                Some(current)
            })
            .collect();
        LocalLayout { offsets, sizes }
    }
}
