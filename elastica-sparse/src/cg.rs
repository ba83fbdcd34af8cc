//! Preconditioned conjugate gradient for symmetric positive definite systems.
use log::debug;
use nalgebra::{DMatrix, DVector, RealField, Scalar};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use std::fmt;

/// A square matrix that can be applied to a vector.
pub trait LinearOperator<T: Scalar> {
    fn nrows(&self) -> usize;

    /// Computes `y = A x`.
    fn apply(&self, x: &DVector<T>, y: &mut DVector<T>);
}

impl<T: RealField + Copy> LinearOperator<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        CsrMatrix::nrows(self)
    }

    fn apply(&self, x: &DVector<T>, y: &mut DVector<T>) {
        spmm_csr_dense(T::zero(), y, T::one(), Op::NoOp(self), Op::NoOp(x));
    }
}

impl<T: RealField + Copy> LinearOperator<T> for DMatrix<T> {
    fn nrows(&self) -> usize {
        DMatrix::nrows(self)
    }

    fn apply(&self, x: &DVector<T>, y: &mut DVector<T>) {
        y.gemv(T::one(), self, x, T::zero());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preconditioner<T: Scalar> {
    Identity,
    /// Scales each residual entry by the inverse of the diagonal entry of its row.
    Jacobi { inverse_diagonal: DVector<T> },
}

impl<T: RealField + Copy> Preconditioner<T> {
    /// The Jacobi preconditioner of the given matrix.
    ///
    /// Rows without a non-zero diagonal entry, such as the row of a Lagrange multiplier, are
    /// left unscaled.
    pub fn jacobi(matrix: &CsrMatrix<T>) -> Self {
        let inverse_diagonal = DVector::from_fn(matrix.nrows(), |i, _| {
            let diagonal = matrix
                .get_entry(i, i)
                .map(|entry| entry.into_value())
                .unwrap_or_else(T::zero);
            if diagonal == T::zero() {
                T::one()
            } else {
                T::one() / diagonal
            }
        });
        Self::Jacobi { inverse_diagonal }
    }

    /// Computes `z = P r`.
    pub fn apply(&self, r: &DVector<T>, z: &mut DVector<T>) {
        match self {
            Self::Identity => z.copy_from(r),
            Self::Jacobi { inverse_diagonal } => {
                z.zip_zip_apply(r, inverse_diagonal, |z_i, r_i, d_i| *z_i = r_i * d_i)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SolveErrorKind {
    /// The operator, the right-hand side and the initial guess do not have matching sizes.
    DimensionMismatch { nrows: usize, rhs_len: usize, guess_len: usize },
    /// A search direction with non-positive curvature was encountered.
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                nrows,
                rhs_len,
                guess_len,
            } => write!(
                f,
                "Operator with {} rows does not match right-hand side of length {} and guess of length {}",
                nrows, rhs_len, guess_len
            ),
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Preconditioner appears to be indefinite"),
            Self::MaxIterationsReached { max_iter } => write!(f, "Max iterations ({}) reached", max_iter),
        }
    }
}

/// Failure of a conjugate gradient solve.
///
/// The system is left untouched. The initial guess holds the last iterate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveError {
    pub num_iterations: usize,
    pub kind: SolveErrorKind,
}

impl SolveError {
    fn new(num_iterations: usize, kind: SolveErrorKind) -> Self {
        Self { num_iterations, kind }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CG failed after {} iterations: {}", self.num_iterations, self.kind)
    }
}

impl std::error::Error for SolveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CgOutput {
    /// Number of updates made to the initial guess.
    pub num_iterations: usize,
}

/// Conjugate gradient with a relative residual stopping criterion `||r|| <= tol * ||b||`.
///
/// The residual is the recursively updated one, which may drift from the true residual on
/// ill-conditioned systems.
///
/// ```ignore
/// let output = ConjugateGradient::new(1e-10)
///     .with_preconditioner(Preconditioner::jacobi(&matrix))
///     .with_max_iterations(1000)
///     .solve(&matrix, &b, &mut x)?;
/// ```
#[derive(Debug, Clone)]
pub struct ConjugateGradient<T: Scalar> {
    tolerance: T,
    max_iterations: Option<usize>,
    preconditioner: Preconditioner<T>,
}

impl<T: RealField + Copy> ConjugateGradient<T> {
    pub fn new(tolerance: T) -> Self {
        Self {
            tolerance,
            max_iterations: None,
            preconditioner: Preconditioner::Identity,
        }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..self
        }
    }

    pub fn with_preconditioner(self, preconditioner: Preconditioner<T>) -> Self {
        Self { preconditioner, ..self }
    }

    /// Solves `A x = b`, starting from the given value of `x`.
    pub fn solve<A>(&self, a: &A, b: &DVector<T>, x: &mut DVector<T>) -> Result<CgOutput, SolveError>
    where
        A: ?Sized + LinearOperator<T>,
    {
        let n = b.len();
        if a.nrows() != n || x.len() != n {
            let kind = SolveErrorKind::DimensionMismatch {
                nrows: a.nrows(),
                rhs_len: n,
                guess_len: x.len(),
            };
            return Err(SolveError::new(0, kind));
        }

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(CgOutput { num_iterations: 0 });
        }

        let mut ap = DVector::zeros(n);
        a.apply(x, &mut ap);
        let mut r = b - &ap;
        let mut z = DVector::zeros(n);
        self.preconditioner.apply(&r, &mut z);
        let mut p = z.clone();
        let mut rz = r.dot(&z);

        let mut num_iterations = 0;

        while r.norm() > self.tolerance * b_norm {
            if let Some(max_iter) = self.max_iterations {
                if num_iterations >= max_iter {
                    return Err(SolveError::new(num_iterations, SolveErrorKind::MaxIterationsReached { max_iter }));
                }
            }

            a.apply(&p, &mut ap);
            let curvature = p.dot(&ap);
            if curvature <= T::zero() {
                return Err(SolveError::new(num_iterations, SolveErrorKind::IndefiniteOperator));
            }
            if rz <= T::zero() {
                return Err(SolveError::new(num_iterations, SolveErrorKind::IndefinitePreconditioner));
            }

            let alpha = rz / curvature;
            x.axpy(alpha, &p, T::one());
            r.axpy(-alpha, &ap, T::one());
            num_iterations += 1;

            self.preconditioner.apply(&r, &mut z);
            let rz_next = r.dot(&z);
            // p <- z + beta p
            p.axpy(T::one(), &z, rz_next / rz);
            rz = rz_next;
        }

        debug!("CG converged after {} iterations", num_iterations);
        Ok(CgOutput { num_iterations })
    }
}
