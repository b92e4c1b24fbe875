//! Conversions between OpenCV matrices and the core parameter types.

use chess_calib_core::{CameraMatrix, CameraParams, DistCoeffs};
use opencv::core::{Mat, CV_64F};
use opencv::prelude::*;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("expected a {expected} f64 matrix, got {rows}x{cols} (type {typ})")]
    BadShape {
        expected: &'static str,
        rows: i32,
        cols: i32,
        typ: i32,
    },

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// Read a 3x3 CV_64F camera matrix out of `mat`.
pub fn camera_matrix_from_mat(mat: &Mat) -> Result<CameraMatrix, ConvertError> {
    if mat.rows() != 3 || mat.cols() != 3 || mat.typ() != CV_64F {
        return Err(ConvertError::BadShape {
            expected: "3x3",
            rows: mat.rows(),
            cols: mat.cols(),
            typ: mat.typ(),
        });
    }

    let mut rows = [[0.0; 3]; 3];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = *mat.at_2d::<f64>(r as i32, c as i32)?;
        }
    }
    Ok(CameraMatrix::from_rows(rows))
}

/// Build a 3x3 CV_64F matrix from a camera matrix.
pub fn camera_matrix_to_mat(camera_matrix: &CameraMatrix) -> Result<Mat, ConvertError> {
    Ok(Mat::from_slice_2d(&camera_matrix.rows())?)
}

/// Read distortion coefficients out of a 1xN or Nx1 CV_64F `mat`.
pub fn dist_coeffs_from_mat(mat: &Mat) -> Result<DistCoeffs, ConvertError> {
    let (rows, cols) = (mat.rows(), mat.cols());
    if mat.typ() != CV_64F || (rows != 1 && cols != 1) || rows * cols == 0 {
        return Err(ConvertError::BadShape {
            expected: "1xN",
            rows,
            cols,
            typ: mat.typ(),
        });
    }

    let mut values = Vec::with_capacity((rows * cols) as usize);
    if rows == 1 {
        for c in 0..cols {
            values.push(*mat.at_2d::<f64>(0, c)?);
        }
    } else {
        for r in 0..rows {
            values.push(*mat.at_2d::<f64>(r, 0)?);
        }
    }
    Ok(DistCoeffs::new(values))
}

/// Build a 1xN CV_64F row from distortion coefficients.
pub fn dist_coeffs_to_mat(dist_coeffs: &DistCoeffs) -> Result<Mat, ConvertError> {
    Ok(Mat::from_slice_2d(&[dist_coeffs.as_slice()])?)
}

/// Assemble `CameraParams` from the matrices a calibration run produced.
pub fn params_from_mats(camera_matrix: &Mat, dist_coeffs: &Mat) -> Result<CameraParams, ConvertError> {
    Ok(CameraParams::new(
        camera_matrix_from_mat(camera_matrix)?,
        dist_coeffs_from_mat(dist_coeffs)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_camera_matrix() -> CameraMatrix {
        CameraMatrix::from_rows([
            [532.8, 0.0, 342.5],
            [0.0, 532.9, 233.9],
            [0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn camera_matrix_round_trips_through_mat() {
        let k = sample_camera_matrix();
        let mat = camera_matrix_to_mat(&k).expect("to mat");
        let back = camera_matrix_from_mat(&mat).expect("from mat");
        assert_eq!(back, k);
    }

    #[test]
    fn dist_coeffs_round_trip_through_mat() {
        let d = DistCoeffs::new(vec![-0.28, 0.07, 0.001, -0.0002, 0.09]);
        let mat = dist_coeffs_to_mat(&d).expect("to mat");
        let back = dist_coeffs_from_mat(&mat).expect("from mat");
        assert_eq!(back, d);
    }

    #[test]
    fn dist_coeffs_accept_a_column_vector() {
        let column = Mat::from_slice_2d(&[[-0.28], [0.07], [0.001]]).expect("mat");
        let d = dist_coeffs_from_mat(&column).expect("from mat");
        assert_eq!(d.len(), 3);
        assert_relative_eq!(d.as_slice()[1], 0.07);
    }

    #[test]
    fn wrong_camera_matrix_shape_is_rejected() {
        let mat = Mat::from_slice_2d(&[[1.0, 0.0], [0.0, 1.0]]).expect("mat");
        let err = camera_matrix_from_mat(&mat).expect_err("should fail");
        assert!(matches!(err, ConvertError::BadShape { expected: "3x3", .. }));
    }

    #[test]
    fn two_dimensional_coeff_tables_are_rejected() {
        let mat = Mat::from_slice_2d(&[[1.0, 2.0], [3.0, 4.0]]).expect("mat");
        let err = dist_coeffs_from_mat(&mat).expect_err("should fail");
        assert!(matches!(err, ConvertError::BadShape { expected: "1xN", .. }));
    }
}
