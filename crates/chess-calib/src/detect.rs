//! Per-image checkerboard corner detection.
//!
//! All pixel work is delegated to OpenCV: grayscale load,
//! `find_chessboard_corners`, then `corner_sub_pix` refinement.

use std::path::{Path, PathBuf};

use log::debug;
use opencv::calib3d;
use opencv::core::{Point2f, Size, TermCriteria, TermCriteria_COUNT, TermCriteria_EPS, Vector};
use opencv::imgcodecs::{self, IMREAD_GRAYSCALE};
use opencv::imgproc;
use opencv::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::board::BoardSpec;

/// Sub-pixel search window half-size, in pixels.
const SUBPIX_WINDOW: i32 = 11;
/// Refinement stops after this many iterations or once a corner moves by
/// less than `SUBPIX_EPSILON`.
const SUBPIX_MAX_ITERS: i32 = 40;
const SUBPIX_EPSILON: f64 = 1e-3;

#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("failed to read image {}", .path.display())]
    UnreadableImage { path: PathBuf },

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// Refined checkerboard corners of one image.
#[derive(Debug)]
pub struct ImageCorners {
    pub corners: Vector<Point2f>,
    pub image_size: Size,
}

/// Find and refine the corners of `board` in the image at `path`.
///
/// Returns `Ok(None)` when the image loads fine but no complete board is
/// visible in it.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(board)))]
pub fn find_board_corners(
    path: &Path,
    board: &BoardSpec,
) -> Result<Option<ImageCorners>, DetectError> {
    let gray = imgcodecs::imread(path.to_string_lossy().as_ref(), IMREAD_GRAYSCALE)?;
    if gray.empty() {
        return Err(DetectError::UnreadableImage {
            path: path.to_path_buf(),
        });
    }
    let image_size = gray.size()?;

    let mut corners = Vector::<Point2f>::new();
    let found = calib3d::find_chessboard_corners(
        &gray,
        board.pattern_size(),
        &mut corners,
        calib3d::CALIB_CB_ADAPTIVE_THRESH + calib3d::CALIB_CB_NORMALIZE_IMAGE,
    )?;
    if !found {
        debug!(
            "no {}x{} board in {}",
            board.cols,
            board.rows,
            path.display()
        );
        return Ok(None);
    }

    let criteria = TermCriteria::new(
        TermCriteria_COUNT + TermCriteria_EPS,
        SUBPIX_MAX_ITERS,
        SUBPIX_EPSILON,
    )?;
    imgproc::corner_sub_pix(
        &gray,
        &mut corners,
        Size::new(SUBPIX_WINDOW, SUBPIX_WINDOW),
        Size::new(-1, -1),
        criteria,
    )?;

    Ok(Some(ImageCorners {
        corners,
        image_size,
    }))
}
