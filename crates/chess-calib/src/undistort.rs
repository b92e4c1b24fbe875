//! Folder undistortion with stored calibration parameters.

use std::path::{Path, PathBuf};

use log::{info, warn};
use opencv::calib3d;
use opencv::core::{Mat, Rect, Vector};
use opencv::imgcodecs::{self, IMREAD_COLOR};
use opencv::prelude::*;

use chess_calib_core::CameraParams;

use crate::convert::{self, ConvertError};
use crate::folder::{self, FolderError};

const OUTPUT_DIR_SUFFIX: &str = "_undistorted";

#[derive(thiserror::Error, Debug)]
pub enum UndistortError {
    #[error("alpha must be within [0, 1], got {0}")]
    AlphaOutOfRange(f64),

    #[error(transparent)]
    Folder(#[from] FolderError),

    #[error("failed to create {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read image {}", .path.display())]
    UnreadableImage { path: PathBuf },

    #[error("failed to write {}", .path.display())]
    WriteImage { path: PathBuf },

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// What a folder undistortion pass produced.
#[derive(Debug, Clone)]
pub struct UndistortSummary {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Undistort every image in `dir` with `params` and write the results into
/// a sibling `<dir>_undistorted/` folder.
///
/// `alpha` controls how many invalid border pixels survive: 0 crops to
/// valid pixels only, 1 keeps the whole frame. Each output is undistorted
/// against the original camera matrix and cropped to the valid-pixel region
/// computed from the first image's dimensions.
pub fn undistort_folder(
    dir: impl AsRef<Path>,
    params: &CameraParams,
    alpha: f64,
) -> Result<UndistortSummary, UndistortError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(UndistortError::AlphaOutOfRange(alpha));
    }

    let dir = dir.as_ref();
    let files = folder::image_files(dir)?;
    let output_dir = output_dir_for(dir);
    std::fs::create_dir_all(&output_dir).map_err(|source| UndistortError::CreateDir {
        path: output_dir.clone(),
        source,
    })?;

    let camera_matrix = convert::camera_matrix_to_mat(&params.camera_matrix)?;
    let dist_coeffs = convert::dist_coeffs_to_mat(&params.dist_coeffs)?;

    // The alpha-dependent matrix is only needed for its valid-pixel region;
    // the frames themselves are undistorted against the original matrix.
    let first = imgcodecs::imread(files[0].to_string_lossy().as_ref(), IMREAD_COLOR)?;
    if first.empty() {
        return Err(UndistortError::UnreadableImage {
            path: files[0].clone(),
        });
    }
    let image_size = first.size()?;
    let mut roi = Rect::default();
    let refined = calib3d::get_optimal_new_camera_matrix(
        &camera_matrix,
        &dist_coeffs,
        image_size,
        alpha,
        image_size,
        Some(&mut roi),
        false,
    )?;
    let refined = convert::camera_matrix_from_mat(&refined)?;
    info!(
        "valid-pixel region at alpha {alpha}: {}x{} at ({}, {}); refined fx={:.2} fy={:.2}",
        roi.width,
        roi.height,
        roi.x,
        roi.y,
        refined.fx(),
        refined.fy()
    );

    let mut written = Vec::new();
    let mut skipped = Vec::new();
    for path in &files {
        let img = imgcodecs::imread(path.to_string_lossy().as_ref(), IMREAD_COLOR)?;
        if img.empty() {
            warn!("skipping unreadable image {}", path.display());
            skipped.push(path.clone());
            continue;
        }
        if img.size()? != image_size {
            warn!(
                "skipping {}: dimensions differ from the first image",
                path.display()
            );
            skipped.push(path.clone());
            continue;
        }

        let mut undistorted = Mat::default();
        calib3d::undistort_def(&img, &mut undistorted, &camera_matrix, &dist_coeffs)?;

        let output = if roi.width > 0 && roi.height > 0 {
            Mat::roi(&undistorted, roi)?.try_clone()?
        } else {
            undistorted
        };

        let out_path = output_dir.join(undistorted_file_name(path));
        let ok = imgcodecs::imwrite(out_path.to_string_lossy().as_ref(), &output, &Vector::new())?;
        if !ok {
            return Err(UndistortError::WriteImage { path: out_path });
        }
        written.push(out_path);
    }

    info!(
        "undistorted {} images into {} ({} skipped)",
        written.len(),
        output_dir.display(),
        skipped.len()
    );
    Ok(UndistortSummary {
        output_dir,
        written,
        skipped,
    })
}

fn output_dir_for(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "images".to_owned());
    dir.with_file_name(format!("{name}{OUTPUT_DIR_SUFFIX}"))
}

fn undistorted_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{OUTPUT_DIR_SUFFIX}.{ext}"),
        None => format!("{stem}{OUTPUT_DIR_SUFFIX}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_calib_core::{CameraMatrix, DistCoeffs};

    #[test]
    fn alpha_is_validated_before_any_io() {
        let params = CameraParams::new(
            CameraMatrix::from_rows([[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]]),
            DistCoeffs::new(vec![0.0; 5]),
        );
        let err = undistort_folder("does-not-exist", &params, 1.5).expect_err("should fail");
        assert!(matches!(err, UndistortError::AlphaOutOfRange(_)));
    }

    #[test]
    fn output_folder_is_a_sibling_with_suffix() {
        let out = output_dir_for(Path::new("images/webcam"));
        assert_eq!(out, Path::new("images/webcam_undistorted"));
    }

    #[test]
    fn output_names_keep_the_extension() {
        assert_eq!(
            undistorted_file_name(Path::new("images/frame_003.png")),
            "frame_003_undistorted.png"
        );
        assert_eq!(
            undistorted_file_name(Path::new("shot.JPG")),
            "shot_undistorted.JPG"
        );
    }
}
