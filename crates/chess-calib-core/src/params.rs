//! Intrinsic camera parameters.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// 3x3 pinhole camera matrix.
///
/// Row-major layout `[[fx, s, cx], [0, fy, cy], [0, 0, 1]]`: focal lengths
/// on the diagonal, optical center in the last column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMatrix {
    pub matrix: Matrix3<f64>,
}

impl CameraMatrix {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Build from three row-major rows, as read from the text store.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self {
            matrix: Matrix3::from_row_slice(&[
                rows[0][0], rows[0][1], rows[0][2], //
                rows[1][0], rows[1][1], rows[1][2], //
                rows[2][0], rows[2][1], rows[2][2],
            ]),
        }
    }

    /// Row-major rows, as written to the text store.
    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Focal length along x, in pixels.
    pub fn fx(&self) -> f64 {
        self.matrix[(0, 0)]
    }

    /// Focal length along y, in pixels.
    pub fn fy(&self) -> f64 {
        self.matrix[(1, 1)]
    }

    /// Optical center x, in pixels.
    pub fn cx(&self) -> f64 {
        self.matrix[(0, 2)]
    }

    /// Optical center y, in pixels.
    pub fn cy(&self) -> f64 {
        self.matrix[(1, 2)]
    }
}

/// Lens distortion coefficients.
///
/// The plain pinhole model yields five values `[k1, k2, p1, p2, k3]`, but
/// the backend may return more; whatever comes out of the optimizer is
/// stored verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistCoeffs {
    pub values: Vec<f64>,
}

impl DistCoeffs {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A complete set of persisted calibration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub camera_matrix: CameraMatrix,
    pub dist_coeffs: DistCoeffs,
}

impl CameraParams {
    pub fn new(camera_matrix: CameraMatrix, dist_coeffs: DistCoeffs) -> Self {
        Self {
            camera_matrix,
            dist_coeffs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_matrix() -> CameraMatrix {
        CameraMatrix::from_rows([
            [532.8, 0.0, 342.5],
            [0.0, 532.9, 233.9],
            [0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn accessors_read_the_expected_cells() {
        let k = sample_matrix();
        assert_relative_eq!(k.fx(), 532.8);
        assert_relative_eq!(k.fy(), 532.9);
        assert_relative_eq!(k.cx(), 342.5);
        assert_relative_eq!(k.cy(), 233.9);
    }

    #[test]
    fn rows_round_trip() {
        let k = sample_matrix();
        assert_eq!(CameraMatrix::from_rows(k.rows()), k);
    }

    #[test]
    fn params_serialize_to_json_and_back() {
        let params = CameraParams::new(
            sample_matrix(),
            DistCoeffs::new(vec![-0.28, 0.07, 0.001, -0.0002, 0.09]),
        );
        let json = serde_json::to_string(&params).expect("serialize");
        let back: CameraParams = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, params);
    }
}
