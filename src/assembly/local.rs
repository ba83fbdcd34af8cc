//! Dense element-local systems and the kernels that fill them.
use crate::dof::LocalLayout;
use crate::nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVector, DVectorView, DVectorViewMut, Scalar};
use num::Zero;
use std::ops::AddAssign;

mod boundary;
mod elasticity;

pub use boundary::*;
pub use elasticity::*;

/// A rectangular sub-block of a local matrix, addressed by offsets into the full matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub row_offset: usize,
    pub col_offset: usize,
    pub nrows: usize,
    pub ncols: usize,
}

impl BlockDescriptor {
    /// The block coupling the test functions of `row_field` with the trial functions
    /// of `col_field`.
    pub fn between_fields(layout: &LocalLayout, row_field: usize, col_field: usize) -> Self {
        Self {
            row_offset: layout.field_offset(row_field),
            col_offset: layout.field_offset(col_field),
            nrows: layout.field_size(row_field),
            ncols: layout.field_size(col_field),
        }
    }

    /// Maps a block-local index to an index into the full matrix.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> (usize, usize) {
        debug_assert!(i < self.nrows && j < self.ncols, "Index out of block bounds");
        (self.row_offset + i, self.col_offset + j)
    }
}

/// A dense element matrix and right-hand side.
///
/// Blocks of the matrix are never stored separately: they are accessed through
/// [`BlockDescriptor`]s applied to the single underlying matrix, so that all contributions
/// to a block accumulate in the same storage.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSystem<T: Scalar> {
    matrix: DMatrix<T>,
    rhs: DVector<T>,
}

impl<T> LocalSystem<T>
where
    T: Scalar + Zero,
{
    pub fn zeros(size: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
        }
    }

    /// Resizes the system to the given size and fills it with zeros.
    ///
    /// Allocations are reused when the size does not change.
    pub fn reset(&mut self, size: usize) {
        if self.size() != size {
            self.matrix.resize_mut(size, size, T::zero());
            self.rhs.resize_vertically_mut(size, T::zero());
        }
        self.matrix.fill(T::zero());
        self.rhs.fill(T::zero());
    }

    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut DMatrix<T> {
        &mut self.matrix
    }

    pub fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    pub fn rhs_mut(&mut self) -> &mut DVector<T> {
        &mut self.rhs
    }

    pub fn block(&self, block: &BlockDescriptor) -> DMatrixView<T> {
        self.matrix
            .view((block.row_offset, block.col_offset), (block.nrows, block.ncols))
    }

    pub fn block_mut(&mut self, block: &BlockDescriptor) -> DMatrixViewMut<T> {
        self.matrix
            .view_mut((block.row_offset, block.col_offset), (block.nrows, block.ncols))
    }

    /// The part of the right-hand side belonging to the rows of the given block.
    pub fn rhs_block(&self, block: &BlockDescriptor) -> DVectorView<T> {
        self.rhs.rows(block.row_offset, block.nrows)
    }

    pub fn rhs_block_mut(&mut self, block: &BlockDescriptor) -> DVectorViewMut<T> {
        self.rhs.rows_mut(block.row_offset, block.nrows)
    }
}

impl<T> LocalSystem<T>
where
    T: Scalar + Zero + AddAssign,
{
    /// Adds `value` to entry `(i, j)` of the given block.
    #[inline]
    pub fn add_to_block(&mut self, block: &BlockDescriptor, i: usize, j: usize, value: T) {
        self.matrix[block.index(i, j)] += value;
    }
}

/// Descriptors for the named blocks of the local elasticity system.
///
/// The displacement blocks are indexed by component, so that `displacement[0][1]` is the
/// `Kuv` block. The multiplier blocks couple every displacement component with the global
/// scalar multiplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticityBlocks {
    pub displacement: [[BlockDescriptor; 2]; 2],
    /// `K_{u lambda}` and `K_{v lambda}`.
    pub displacement_multiplier: [BlockDescriptor; 2],
    /// `K_{lambda u}` and `K_{lambda v}`.
    pub multiplier_displacement: [BlockDescriptor; 2],
    /// The single row of the multiplier.
    pub multiplier: BlockDescriptor,
}

impl ElasticityBlocks {
    /// Block descriptors for the displacement fields `[u, v]` and the multiplier field with the
    /// given variable indices.
    pub fn new(layout: &LocalLayout, displacement_fields: [usize; 2], multiplier_field: usize) -> Self {
        let [u, v] = displacement_fields;
        let b = |row, col| BlockDescriptor::between_fields(layout, row, col);
        Self {
            displacement: [[b(u, u), b(u, v)], [b(v, u), b(v, v)]],
            displacement_multiplier: [b(u, multiplier_field), b(v, multiplier_field)],
            multiplier_displacement: [b(multiplier_field, u), b(multiplier_field, v)],
            multiplier: b(multiplier_field, multiplier_field),
        }
    }
}
