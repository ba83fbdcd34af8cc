//! Direct solution of (small) sparse systems through a dense LU factorization.
//!
//! Saddle point systems, such as elasticity augmented with Lagrange multipliers, are
//! symmetric but indefinite, so CG is not guaranteed to succeed on them. A dense LU
//! factorization is a robust fallback for moderately sized problems.

use log::debug;
use nalgebra::{DMatrix, DVector, RealField};
use nalgebra_sparse::CsrMatrix;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DirectSolveError {
    /// The matrix and the right-hand side have incompatible dimensions.
    DimensionMismatch { nrows: usize, ncols: usize, rhs_len: usize },
    /// The matrix is (numerically) singular.
    SingularMatrix,
}

impl fmt::Display for DirectSolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { nrows, ncols, rhs_len } => write!(
                f,
                "Cannot solve {}x{} system with right-hand side of length {}",
                nrows, ncols, rhs_len
            ),
            Self::SingularMatrix => write!(f, "Matrix is singular"),
        }
    }
}

impl std::error::Error for DirectSolveError {}

/// Solves `A x = b` by densifying `A` and computing an LU factorization with partial pivoting.
pub fn solve_dense_lu<T>(matrix: &CsrMatrix<T>, rhs: &DVector<T>) -> Result<DVector<T>, DirectSolveError>
where
    T: RealField + Copy,
{
    if matrix.nrows() != matrix.ncols() || matrix.nrows() != rhs.len() {
        return Err(DirectSolveError::DimensionMismatch {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
            rhs_len: rhs.len(),
        });
    }

    debug!("Dense LU solve of {}x{} system", matrix.nrows(), matrix.ncols());
    let dense = DMatrix::from(matrix);
    dense
        .lu()
        .solve(rhs)
        .ok_or(DirectSolveError::SingularMatrix)
}
