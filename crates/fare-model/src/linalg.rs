//! Symmetric eigendecomposition and least-squares solves.
//!
//! The normal equations of a regression are small (one row per feature
//! after encoding), so a plain Jacobi sweep is accurate and fast enough.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};

/// Eigenvalues below `RCOND * largest` are treated as zero.
pub const RCOND: f64 = 1e-10;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Jacobi eigenvalue decomposition of a symmetric matrix.
///
/// Rotates away the largest off-diagonal element until every off-diagonal
/// element is below `tolerance` times the Frobenius norm, or
/// `max_iterations` rotations have been applied.
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let threshold = tolerance * matrix.iter().map(|x| x * x).sum::<f64>().sqrt();

    if n > 1 {
        for _ in 0..max_iterations {
            let (p, q, apq) = largest_off_diagonal(&a);
            if apq.abs() <= threshold {
                break;
            }
            let (c, s) = rotation(a[[p, p]], a[[q, q]], apq);
            rotate(&mut a, &mut v, p, q, c, s);
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (to, &from) in order.iter().enumerate() {
        eigenvectors.column_mut(to).assign(&v.column(from));
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Minimum-norm solution of `gram * x = rhs` for a symmetric positive
/// semi-definite `gram`.
///
/// Directions whose eigenvalue falls below [`RCOND`] times the largest one
/// are dropped, which is what a pseudo-inverse does for a rank-deficient
/// design (e.g. one-hot columns that always sum to one).
pub fn solve_symmetric_min_norm(gram: &Array2<f64>, rhs: &Array1<f64>) -> Result<Array1<f64>> {
    let n = gram.nrows();
    if rhs.len() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: rhs.len(),
        });
    }
    if n == 0 {
        return Ok(Array1::zeros(0));
    }

    let decomp = jacobi_eigendecomp(gram, 100 * n * n, 1e-15)?;
    let largest = decomp.eigenvalues[0].max(0.0);
    let cutoff = largest * RCOND;

    let projected = decomp.eigenvectors.t().dot(rhs);
    let mut scaled = Array1::<f64>::zeros(n);
    for (i, &lambda) in decomp.eigenvalues.iter().enumerate() {
        if lambda > cutoff && lambda > 0.0 {
            scaled[i] = projected[i] / lambda;
        }
    }

    Ok(decomp.eigenvectors.dot(&scaled))
}

fn largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    let (mut p, mut q, mut best) = (0, 1, 0.0);

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > best {
                best = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, matrix[[p, q]])
}

/// (cos, sin) of the rotation that zeroes `a[p][q]`.
fn rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq == 0.0 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = tau.signum() / (tau.abs() + (1.0 + tau * tau).sqrt());
    let c = 1.0 / (1.0 + t * t).sqrt();
    (c, t * c)
}

fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let n = a.nrows();
    let (app, aqq, apq) = (a[[p, p]], a[[q, q]], a[[p, q]]);

    a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let (aip, aiq) = (a[[i, p]], a[[i, q]]);
            a[[i, p]] = c * aip - s * aiq;
            a[[p, i]] = a[[i, p]];
            a[[i, q]] = s * aip + c * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let (vip, viq) = (v[[i, p]], v[[i, q]]);
        v[[i, p]] = c * vip - s * viq;
        v[[i, q]] = s * vip + c * viq;
    }
}
