use super::laplacian_1d;
use elastica_sparse::direct::{solve_dense_lu, DirectSolveError};
use matrixcompare::assert_matrix_eq;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

#[test]
fn dense_lu_solves_indefinite_saddle_point_system() {
    // [[2, 0, 1], [0, 2, 1], [1, 1, 0]]
    let mut coo = CooMatrix::new(3, 3);
    coo.push(0, 0, 2.0);
    coo.push(1, 1, 2.0);
    coo.push(0, 2, 1.0);
    coo.push(2, 0, 1.0);
    coo.push(1, 2, 1.0);
    coo.push(2, 1, 1.0);
    let a = CsrMatrix::from(&coo);
    let x0 = DVector::from_column_slice(&[1.0, -1.0, 3.0]);
    let b = &a * &x0;

    let x = solve_dense_lu(&a, &b).unwrap();
    assert_matrix_eq!(x, x0, comp = abs, tol = 1e-12);
}

#[test]
fn dense_lu_agrees_with_spd_solution() {
    let a = laplacian_1d(10, 0.0);
    let x0 = DVector::from_fn(10, |i, _| i as f64 - 4.5);
    let b = &a * &x0;
    let x = solve_dense_lu(&a, &b).unwrap();
    assert_matrix_eq!(x, x0, comp = abs, tol = 1e-10);
}

#[test]
fn dense_lu_reports_singular_matrix() {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(0, 0, 1.0);
    let a = CsrMatrix::from(&coo);
    let b = DVector::from_column_slice(&[1.0, 1.0]);
    assert_eq!(solve_dense_lu(&a, &b), Err(DirectSolveError::SingularMatrix));
}

#[test]
fn dense_lu_reports_dimension_mismatch() {
    let a = laplacian_1d(4, 0.0);
    let b = DVector::zeros(3);
    assert_eq!(
        solve_dense_lu(&a, &b),
        Err(DirectSolveError::DimensionMismatch {
            nrows: 4,
            ncols: 4,
            rhs_len: 3
        })
    );
}
