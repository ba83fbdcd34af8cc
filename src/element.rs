//! Reference finite elements and the maps from reference to physical coordinates.
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName, Matrix2, OMatrix, Point2, Scalar, U1, U2};

mod quadrilateral;

pub use quadrilateral::*;

/// A reference element with a fixed number of nodes in two dimensions.
pub trait FixedNodesReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: Allocator<T, U1, Self::NodalDim> + Allocator<T, U2, Self::NodalDim>,
{
    type NodalDim: DimName;

    /// Evaluates all basis functions at the given reference coordinates.
    fn evaluate_basis(&self, xi: &Point2<T>) -> OMatrix<T, U1, Self::NodalDim>;

    /// Evaluates the reference gradients of all basis functions, one column per function.
    fn gradients(&self, xi: &Point2<T>) -> OMatrix<T, U2, Self::NodalDim>;

    fn num_nodes(&self) -> usize {
        Self::NodalDim::dim()
    }
}

/// A finite element together with its map from reference to physical coordinates.
pub trait FiniteElement<T>: FixedNodesReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: Allocator<T, U1, Self::NodalDim> + Allocator<T, U2, Self::NodalDim>,
{
    fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T>;

    /// The Jacobian `dx/dxi` of the reference map.
    fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix2<T>;

    /// The largest distance between two vertices of the element.
    fn diameter(&self) -> T;
}
