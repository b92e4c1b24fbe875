//! Camera parameter types and persistence for chessboard calibration.
//!
//! This crate is intentionally small and free of any computer-vision
//! dependency. It owns the intrinsic parameter types produced by a
//! calibration run and their on-disk comma-delimited text format, so that
//! downstream tools can read a calibration without linking the CV backend.

mod logger;
mod params;
mod store;

pub use params::{CameraMatrix, CameraParams, DistCoeffs};
pub use store::{
    camera_matrix_path, dist_coeffs_path, load_params, save_params, StoreError,
    DEFAULT_PARAMS_DIR,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
