//! Checkerboard camera calibration tools built on OpenCV.
//!
//! Corner detection, sub-pixel refinement, the calibration fit and image
//! undistortion are all delegated to the `opencv` crate. This crate
//! orchestrates folders of images around those calls and persists the
//! result through `chess-calib-core`.
//!
//! ## API map
//! - [`board`]: physical checkerboard description and object points.
//! - [`detect`]: per-image corner detection and refinement.
//! - [`folder`]: image folder scanning.
//! - [`calibrate`]: parallel folder calibration.
//! - [`undistort`]: folder undistortion with stored parameters.
//! - [`capture`]: headless timed frame capture.
//!
//! ## Quickstart
//!
//! ```no_run
//! use chess_calib::{calibrate_folder, BoardSpec, CalibrateOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let board = BoardSpec::new(9, 6, 0.024)?;
//! let outcome = calibrate_folder("images/webcam", &board, CalibrateOptions::default())?;
//! println!("rms = {:.4}", outcome.rms);
//! chess_calib_core::save_params("output", "webcam", &outcome.params)?;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod calibrate;
pub mod capture;
pub mod convert;
pub mod detect;
pub mod folder;
pub mod undistort;

pub use board::{BoardSpec, BoardSpecError};
pub use calibrate::{
    calibrate_folder, CalibrateError, CalibrateOptions, CalibrationOutcome, ReportError,
    MIN_GOOD_VIEWS,
};
pub use capture::{capture_frames, CaptureConfig, CaptureError};
pub use convert::ConvertError;
pub use detect::{find_board_corners, DetectError, ImageCorners};
pub use folder::{image_files, FolderError};
pub use undistort::{undistort_folder, UndistortError, UndistortSummary};

pub use chess_calib_core as core;
