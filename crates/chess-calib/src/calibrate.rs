//! Folder calibration: a parallel corner-detection map followed by the
//! camera fit.
//!
//! Detection runs per image on a rayon pool; the fit itself is a single
//! `calibrate_camera` call on the accepted views.

use std::path::{Path, PathBuf};

use log::{info, warn};
use opencv::calib3d;
use opencv::core::{self, Mat, Point2f, Point3f, Size, Vector};
use opencv::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use chess_calib_core::CameraParams;

use crate::board::BoardSpec;
use crate::convert::{self, ConvertError};
use crate::detect::{self, DetectError, ImageCorners};
use crate::folder::{self, FolderError};

/// Minimum number of accepted views for a trustworthy fit.
pub const MIN_GOOD_VIEWS: usize = 9;

#[derive(thiserror::Error, Debug)]
pub enum CalibrateError {
    #[error(transparent)]
    Folder(#[from] FolderError),

    #[error("only {found} of {total} images contained a usable board, need at least {needed}")]
    NotEnoughViews {
        found: usize,
        total: usize,
        needed: usize,
    },

    #[error("failed to build the worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Options for [`calibrate_folder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrateOptions {
    /// Worker threads for the detection map. `None` keeps rayon's default;
    /// explicit values are capped at the available parallelism.
    pub threads: Option<usize>,
}

/// Outcome of a folder calibration.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationOutcome {
    pub params: CameraParams,
    /// RMS reprojection error reported by the optimizer.
    pub rms: f64,
    /// Mean per-view reprojection error.
    pub mean_reproj_error: f64,
    /// Width and height all accepted images share.
    pub image_size: [i32; 2],
    pub used_images: Vec<PathBuf>,
    pub rejected_images: Vec<PathBuf>,
}

impl CalibrationOutcome {
    /// Write this outcome to disk as a pretty JSON report.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Calibrate a camera from every checkerboard image in `dir`.
///
/// Images that cannot be read, contain no complete board, or disagree with
/// the first accepted image's dimensions are logged and reported as
/// rejected. Requires [`MIN_GOOD_VIEWS`] accepted views.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn calibrate_folder(
    dir: impl AsRef<Path>,
    board: &BoardSpec,
    options: CalibrateOptions,
) -> Result<CalibrationOutcome, CalibrateError> {
    let dir = dir.as_ref();
    let files = folder::image_files(dir)?;
    info!("detecting boards in {} images from {}", files.len(), dir.display());

    let detections = run_detection(&files, board, options.threads)?;

    let mut image_size: Option<Size> = None;
    let mut used_images = Vec::new();
    let mut rejected_images = Vec::new();
    let mut image_points = Vector::<Vector<Point2f>>::new();

    for (path, result) in detections {
        match result {
            Ok(Some(ImageCorners {
                corners,
                image_size: size,
            })) => {
                if let Some(expected) = image_size {
                    if size != expected {
                        warn!(
                            "rejecting {}: {}x{} differs from the first image's {}x{}",
                            path.display(),
                            size.width,
                            size.height,
                            expected.width,
                            expected.height
                        );
                        rejected_images.push(path);
                        continue;
                    }
                } else {
                    image_size = Some(size);
                }
                image_points.push(corners);
                used_images.push(path);
            }
            Ok(None) => {
                info!("no board found in {}", path.display());
                rejected_images.push(path);
            }
            Err(err) => {
                warn!("skipping {}: {err}", path.display());
                rejected_images.push(path);
            }
        }
    }

    let image_size = match image_size {
        Some(size) if used_images.len() >= MIN_GOOD_VIEWS => size,
        _ => {
            return Err(CalibrateError::NotEnoughViews {
                found: used_images.len(),
                total: files.len(),
                needed: MIN_GOOD_VIEWS,
            })
        }
    };
    info!("using {} of {} images", used_images.len(), files.len());

    let grid = Vector::<Point3f>::from_iter(board.object_points());
    let mut object_points = Vector::<Vector<Point3f>>::new();
    for _ in 0..used_images.len() {
        object_points.push(grid.clone());
    }

    let mut camera_matrix = Mat::default();
    let mut dist_coeffs = Mat::default();
    let mut rvecs = Vector::<Mat>::new();
    let mut tvecs = Vector::<Mat>::new();
    let rms = calib3d::calibrate_camera_def(
        &object_points,
        &image_points,
        image_size,
        &mut camera_matrix,
        &mut dist_coeffs,
        &mut rvecs,
        &mut tvecs,
    )?;

    let mean_reproj_error = mean_reprojection_error(
        &object_points,
        &image_points,
        &rvecs,
        &tvecs,
        &camera_matrix,
        &dist_coeffs,
    )?;
    info!("rms = {rms:.6}, mean reprojection error = {mean_reproj_error:.6}");

    Ok(CalibrationOutcome {
        params: convert::params_from_mats(&camera_matrix, &dist_coeffs)?,
        rms,
        mean_reproj_error,
        image_size: [image_size.width, image_size.height],
        used_images,
        rejected_images,
    })
}

type Detection = (PathBuf, Result<Option<ImageCorners>, DetectError>);

fn run_detection(
    files: &[PathBuf],
    board: &BoardSpec,
    threads: Option<usize>,
) -> Result<Vec<Detection>, CalibrateError> {
    let detect_all = || {
        files
            .par_iter()
            .map(|path| (path.clone(), detect::find_board_corners(path, board)))
            .collect::<Vec<Detection>>()
    };

    match threads {
        Some(requested) => {
            let cap = std::thread::available_parallelism().map_or(requested, |max| {
                requested.clamp(1, max.get())
            });
            if cap != requested {
                info!("capping worker threads at {cap}");
            }
            let pool = rayon::ThreadPoolBuilder::new().num_threads(cap).build()?;
            Ok(pool.install(detect_all))
        }
        None => Ok(detect_all()),
    }
}

/// Average per-view reprojection error: for each view, project the object
/// points with the fitted pose and compare with the detected corners
/// (L2 norm over the view, divided by the corner count).
fn mean_reprojection_error(
    object_points: &Vector<Vector<Point3f>>,
    image_points: &Vector<Vector<Point2f>>,
    rvecs: &Vector<Mat>,
    tvecs: &Vector<Mat>,
    camera_matrix: &Mat,
    dist_coeffs: &Mat,
) -> opencv::Result<f64> {
    let views = object_points.len();
    let mut total = 0.0;
    for i in 0..views {
        let mut projected = Vector::<Point2f>::new();
        calib3d::project_points_def(
            &object_points.get(i)?,
            &rvecs.get(i)?,
            &tvecs.get(i)?,
            camera_matrix,
            dist_coeffs,
            &mut projected,
        )?;
        let err = core::norm2_def(&image_points.get(i)?, &projected)?;
        total += err / projected.len() as f64;
    }
    Ok(total / views as f64)
}
