//! Covariance and eigen-decomposition helpers for the weight estimator.
//!
//! Observations are rows and layers are columns of an [`Array2`]. The
//! covariance matrix is diagonalised with the cyclic Jacobi method, which is
//! deterministic for a given input.

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, Axis, Zip, s};

/// Upper bound on Jacobi sweeps; a 4x4 matrix converges in a handful.
const MAX_SWEEPS: usize = 64;

/// Off-diagonal mass, relative to the whole matrix, treated as converged.
const CONVERGENCE_RATIO: f64 = 1e-24;

/// Largest eigenvalue and its unit eigenvector.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Eigenpair {
    pub(crate) value: f64,
    pub(crate) vector: Array1<f64>,
}

/// Join equally long columns side by side into an observation matrix.
///
/// Returns `None` when the columns differ in length or none are supplied.
pub(crate) fn observation_matrix(columns: &[Vec<f64>]) -> Option<Array2<f64>> {
    let views: Vec<ArrayView1<'_, f64>> = columns
        .iter()
        .map(|column| ArrayView1::from(column.as_slice()))
        .collect();
    ndarray::stack(Axis(1), &views).ok()
}

/// Sample covariance (N - 1 denominator) of the columns of `data`.
///
/// Returns `None` when fewer than two rows are supplied.
#[expect(
    clippy::cast_precision_loss,
    reason = "row counts stay far below 2^52"
)]
pub(crate) fn covariance(data: &Array2<f64>) -> Option<Array2<f64>> {
    let rows = data.nrows();
    if rows < 2 {
        return None;
    }
    let means = data.mean_axis(Axis(0))?;
    let centred = data - &means;
    Some(centred.t().dot(&centred) / (rows - 1) as f64)
}

/// Sum of the diagonal, i.e. the total variance.
pub(crate) fn trace(matrix: &Array2<f64>) -> f64 {
    matrix.diag().sum()
}

/// Eigenpair with the largest eigenvalue, via cyclic Jacobi rotations.
///
/// Returns `None` for an empty or non-square matrix, non-finite entries, or
/// when the iteration fails to converge.
#[expect(
    clippy::float_arithmetic,
    reason = "convergence is judged on floating-point mass"
)]
pub(crate) fn leading_eigenpair(matrix: &Array2<f64>) -> Option<Eigenpair> {
    let size = matrix.nrows();
    if size == 0 || !matrix.is_square() || matrix.iter().any(|cell| !cell.is_finite()) {
        return None;
    }
    let mut work = matrix.clone();
    let mut vectors = Array2::<f64>::eye(size);
    let total: f64 = matrix.iter().map(|cell| cell * cell).sum();

    for _ in 0..MAX_SWEEPS {
        if off_diagonal_mass(&work) <= CONVERGENCE_RATIO * total {
            return pick_leading(&work, &vectors);
        }
        for p in 0..size {
            for q in (p + 1)..size {
                rotate(&mut work, &mut vectors, p, q)?;
            }
        }
    }
    log::debug!("Jacobi iteration did not converge after {MAX_SWEEPS} sweeps");
    None
}

#[expect(
    clippy::float_arithmetic,
    reason = "sums squared off-diagonal entries"
)]
fn off_diagonal_mass(matrix: &Array2<f64>) -> f64 {
    matrix
        .indexed_iter()
        .filter(|((row, column), _)| row != column)
        .map(|(_, value)| value * value)
        .sum()
}

/// Zero the `(p, q)` entry with a Givens rotation, accumulating it into
/// `vectors`. `p` must be below `q`.
#[expect(
    clippy::float_arithmetic,
    reason = "Jacobi rotations are floating-point by nature"
)]
fn rotate(work: &mut Array2<f64>, vectors: &mut Array2<f64>, p: usize, q: usize) -> Option<()> {
    let apq = *work.get((p, q))?;
    if apq == 0.0 {
        return Some(());
    }
    let theta = (*work.get((q, q))? - *work.get((p, p))?) / (2.0 * apq);
    let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
    let t = sign / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
    let c = 1.0 / t.mul_add(t, 1.0).sqrt();
    let s = t * c;

    let (column_p, column_q) = work.multi_slice_mut((s![.., p], s![.., q]));
    rotate_pair(column_p, column_q, c, s);
    let (row_p, row_q) = work.multi_slice_mut((s![p, ..], s![q, ..]));
    rotate_pair(row_p, row_q, c, s);
    let (vector_p, vector_q) = vectors.multi_slice_mut((s![.., p], s![.., q]));
    rotate_pair(vector_p, vector_q, c, s);
    Some(())
}

#[expect(clippy::float_arithmetic, reason = "applies a plane rotation")]
fn rotate_pair(first: ArrayViewMut1<'_, f64>, second: ArrayViewMut1<'_, f64>, c: f64, s: f64) {
    Zip::from(first).and(second).for_each(|a, b| {
        let (left, right) = (*a, *b);
        *a = c * left - s * right;
        *b = s * left + c * right;
    });
}

fn pick_leading(work: &Array2<f64>, vectors: &Array2<f64>) -> Option<Eigenpair> {
    let (best, value) = work
        .diag()
        .iter()
        .copied()
        .enumerate()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })?;
    Some(Eigenpair {
        value,
        vector: vectors.column(best).to_owned(),
    })
}
