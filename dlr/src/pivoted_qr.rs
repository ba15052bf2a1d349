//! Rank-revealing column selection through a pivoted QR factorization.

use nalgebra::{ComplexField, DMatrix};

/// Outcome of a column-pivoted QR factorization.
pub struct PivotedQr {
    /// Absolute column permutation: entry `k` is the original index of the
    /// column pivoted into position `k`.
    pub permutation: Vec<usize>,
    /// Number of leading diagonal entries of `R` above the tolerance,
    /// relative to the first one.
    pub rank: usize,
}

/// Factorizes `matrix` with greedy column pivoting.
///
/// The factorization backend reports its pivots as a swap list ("at step `k`,
/// exchange columns `k` and `p_k`"); those swaps are composed here into the
/// absolute permutation callers index with. A `tolerance` of zero requests
/// the full factorization, in which case `rank` is the number of structurally
/// nonzero diagonal entries.
pub fn pivoted_qr<T>(matrix: DMatrix<T>, tolerance: f64) -> PivotedQr
where
    T: ComplexField<RealField = f64>,
{
    let ncols = matrix.ncols();
    let steps = matrix.nrows().min(ncols);
    let qr = matrix.col_piv_qr();

    let mut positions = DMatrix::<usize>::from_row_iterator(1, ncols, 0..ncols);
    qr.p().permute_columns(&mut positions);
    let permutation: Vec<usize> = positions.iter().copied().collect();

    let r = qr.r();
    let rank = if steps == 0 {
        0
    } else {
        let scale = r[(0, 0)].clone().modulus();
        (0..steps)
            .take_while(|&k| r[(k, k)].clone().modulus() > tolerance * scale)
            .count()
    };

    PivotedQr { permutation, rank }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_numerical_rank() {
        // two independent columns plus a copy and a near-copy
        let a = DMatrix::from_columns(&[
            nalgebra::dvector![1.0, 0.0, 0.0, 0.0],
            nalgebra::dvector![1.0, 0.0, 0.0, 0.0],
            nalgebra::dvector![0.0, 2.0, 0.0, 0.0],
            nalgebra::dvector![1.0, 0.0, 1e-13, 0.0],
        ]);

        let factorization = pivoted_qr(a, 1e-10);
        assert_eq!(factorization.rank, 2);

        let mut sorted = factorization.permutation.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_tolerance_keeps_every_pivot() {
        let a = DMatrix::from_fn(3, 5, |i, j| ((i + 2) * (j + 1)) as f64 + (i * i * j) as f64);
        let factorization = pivoted_qr(a, 0.0);
        assert!(factorization.rank <= 3);
        assert_eq!(factorization.permutation.len(), 5);
    }

    #[test]
    fn pivots_select_the_dominant_column() {
        let a = DMatrix::from_columns(&[
            nalgebra::dvector![1e-8, 0.0],
            nalgebra::dvector![5.0, 1.0],
            nalgebra::dvector![0.3, 0.0],
        ]);
        let factorization = pivoted_qr(a, 1e-12);
        assert_eq!(factorization.permutation[0], 1);
    }
}
