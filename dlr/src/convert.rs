use nalgebra::{DMatrix, DVector, Scalar};
use ndarray::{Array1, Array2};

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn usize_from_f64(x: f64) -> usize {
    x.max(0.0) as usize
}

pub fn f64_from_usize(x: usize) -> f64 {
    f64::from(u32::try_from(x).unwrap())
}

pub fn dmatrix_from_array<T: Scalar>(array: &Array2<T>) -> DMatrix<T> {
    DMatrix::from_row_iterator(array.nrows(), array.ncols(), array.iter().cloned())
}

pub fn array_from_dmatrix<T: Scalar>(matrix: &DMatrix<T>) -> Array2<T> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(i, j)| {
        matrix[(i, j)].clone()
    })
}

pub fn dvector_from_array<T: Scalar>(array: &Array1<T>) -> DVector<T> {
    DVector::from_iterator(array.len(), array.iter().cloned())
}

pub fn array_from_dvector<T: Scalar>(vector: &DVector<T>) -> Array1<T> {
    Array1::from_iter(vector.iter().cloned())
}
