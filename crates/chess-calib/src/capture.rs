//! Headless camera capture.
//!
//! Grabs timed snapshots from a camera device into an image folder. There
//! is deliberately no preview window or key-driven loop here; point the
//! camera, run the command, move the board between frames.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use opencv::core::{Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

/// Frames discarded right after opening, so auto exposure can settle.
const WARMUP_FRAMES: usize = 5;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("camera device {0} could not be opened")]
    DeviceUnavailable(i32),

    #[error("camera device {0} stopped producing frames")]
    DeadFrame(i32),

    #[error("failed to create {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", .path.display())]
    WriteImage { path: PathBuf },

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// What to capture and how fast.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device: i32,
    /// Requested frame width, in pixels.
    pub width: i32,
    /// Requested frame height, in pixels.
    pub height: i32,
    /// Number of frames to save.
    pub count: usize,
    /// Pause between consecutive frames.
    pub interval: Duration,
}

/// Grab `config.count` frames and write them as `frame_NNN.png` into
/// `out_dir`, creating the folder if needed. Returns the written paths.
pub fn capture_frames(config: &CaptureConfig, out_dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let mut cap = VideoCapture::new(config.device, videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        return Err(CaptureError::DeviceUnavailable(config.device));
    }
    cap.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.width))?;
    cap.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.height))?;

    std::fs::create_dir_all(out_dir).map_err(|source| CaptureError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut frame = Mat::default();
    for _ in 0..WARMUP_FRAMES {
        if !cap.read(&mut frame)? {
            return Err(CaptureError::DeadFrame(config.device));
        }
    }
    debug!("warm-up done, frame is {}x{}", frame.cols(), frame.rows());

    let mut written = Vec::with_capacity(config.count);
    for index in 0..config.count {
        if index > 0 {
            thread::sleep(config.interval);
        }
        if !cap.read(&mut frame)? || frame.empty() {
            return Err(CaptureError::DeadFrame(config.device));
        }

        let path = out_dir.join(format!("frame_{index:03}.png"));
        let ok = imgcodecs::imwrite(path.to_string_lossy().as_ref(), &frame, &Vector::new())?;
        if !ok {
            return Err(CaptureError::WriteImage { path });
        }
        info!("saved {}", path.display());
        written.push(path);
    }

    Ok(written)
}
