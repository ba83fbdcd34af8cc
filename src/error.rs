//! Errors that abort assembly.
use crate::dof::FeType;
use crate::mesh::BoundaryId;
use std::fmt;

/// A fatal error encountered while setting up or assembling a system.
///
/// None of these conditions are recoverable: the caller must discard any partially
/// assembled system.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// An exterior side of an element carries no boundary id.
    UnsetBoundaryId { element: usize, side: usize },
    /// An exterior side carries a boundary id with no associated boundary condition.
    UnboundBoundaryId {
        element: usize,
        side: usize,
        id: BoundaryId,
    },
    /// No shape function evaluator exists for the requested dimension and finite element type.
    UnsupportedElement { dimension: usize, fe_type: FeType },
    /// No quadrature rule satisfies the request.
    NoQuadratureRule(elastica_quadrature::Error),
    /// The number of local degrees of freedom does not match the number of global indices.
    ///
    /// `element` is `None` when the local system is not tied to a mesh element.
    DofCountMismatch {
        element: Option<usize>,
        expected: usize,
        actual: usize,
    },
    /// The Jacobian of the reference map is not positive somewhere in the element.
    DegenerateElement { element: usize },
    /// An element index does not refer to an element of the mesh.
    ElementOutOfBounds { element: usize },
    /// A connectivity refers to a vertex that does not exist.
    VertexOutOfBounds { element: usize, vertex: usize },
    /// No variable with the given name exists.
    UnknownVariable { name: String },
    /// A local contribution refers to a global entry missing from the sparsity pattern.
    PatternMismatch { row: usize, col: usize },
    /// A boundary condition refers to a displacement component that does not exist.
    InvalidComponent { id: BoundaryId, component: usize },
    /// The mesh description does not produce a valid mesh.
    InvalidMeshConfig { reason: String },
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsetBoundaryId { element, side } => {
                write!(f, "Exterior side {} of element {} has no boundary id", side, element)
            }
            Self::UnboundBoundaryId { element, side, id } => write!(
                f,
                "Exterior side {} of element {} has boundary id {} with no boundary condition",
                side, element, id
            ),
            Self::UnsupportedElement { dimension, fe_type } => write!(
                f,
                "No shape functions available for {:?} in dimension {}",
                fe_type, dimension
            ),
            Self::NoQuadratureRule(err) => write!(f, "Failed to construct quadrature: {}", err),
            Self::DofCountMismatch {
                element,
                expected,
                actual,
            } => match element {
                Some(element) => write!(
                    f,
                    "Element {} expected {} global degrees of freedom, got {}",
                    element, expected, actual
                ),
                None => write!(
                    f,
                    "Local system of size {} does not match {} global indices",
                    expected, actual
                ),
            },
            Self::DegenerateElement { element } => {
                write!(f, "Element {} has non-positive Jacobian determinant", element)
            }
            Self::ElementOutOfBounds { element } => write!(f, "Element {} does not exist", element),
            Self::VertexOutOfBounds { element, vertex } => {
                write!(f, "Element {} refers to non-existent vertex {}", element, vertex)
            }
            Self::UnknownVariable { name } => write!(f, "Unknown variable \"{}\"", name),
            Self::PatternMismatch { row, col } => {
                write!(f, "Entry ({}, {}) is not part of the sparsity pattern", row, col)
            }
            Self::InvalidComponent { id, component } => write!(
                f,
                "Boundary condition for id {} refers to invalid displacement component {}",
                id, component
            ),
            Self::InvalidMeshConfig { reason } => write!(f, "Invalid mesh configuration: {}", reason),
        }
    }
}

impl std::error::Error for AssemblyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoQuadratureRule(err) => Some(err),
            _ => None,
        }
    }
}

impl From<elastica_quadrature::Error> for AssemblyError {
    fn from(err: elastica_quadrature::Error) -> Self {
        Self::NoQuadratureRule(err)
    }
}
