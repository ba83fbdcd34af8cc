mod direct;

use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Tridiagonal `[-1, 2, -1]` matrix with an additional `shift` on the diagonal.
pub fn laplacian_1d(n: usize, shift: f64) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    for i in 0..n {
        coo.push(i, i, 2.0 + shift);
        if i > 0 {
            coo.push(i, i - 1, -1.0);
        }
        if i + 1 < n {
            coo.push(i, i + 1, -1.0);
        }
    }
    CsrMatrix::from(&coo)
}
