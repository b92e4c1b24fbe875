use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use chess_calib::{
    calibrate_folder, capture_frames, undistort_folder, BoardSpec, BoardSpecError, CalibrateError,
    CalibrateOptions, CaptureConfig, CaptureError, ReportError, UndistortError,
};
use chess_calib_core::{load_params, save_params, CameraParams, StoreError, DEFAULT_PARAMS_DIR};

#[derive(Parser)]
#[command(
    name = "chess-calib",
    about = "Checkerboard camera calibration utilities",
    version
)]
struct Cli {
    /// Log more (-v: debug, -vv: trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grab timed snapshots from a camera into an image folder.
    Capture {
        /// Camera device index.
        #[arg(long, default_value_t = 0)]
        device: i32,
        /// Requested frame width, in pixels.
        #[arg(long, default_value_t = 640)]
        width: i32,
        /// Requested frame height, in pixels.
        #[arg(long, default_value_t = 480)]
        height: i32,
        /// Number of frames to save.
        #[arg(long, default_value_t = 20)]
        count: usize,
        /// Pause between frames, in milliseconds.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
        /// Folder to store frames in.
        #[arg(long)]
        dir: PathBuf,
    },

    /// Detect checkerboards in a folder of images and fit camera parameters.
    Calibrate {
        /// Folder with checkerboard images.
        #[arg(long)]
        dir: PathBuf,
        /// Inner corners along the long board side.
        #[arg(long, default_value_t = 9)]
        cols: i32,
        /// Inner corners along the short board side.
        #[arg(long, default_value_t = 6)]
        rows: i32,
        /// Square side length, in meters.
        #[arg(long, default_value_t = 1.0)]
        square_size: f64,
        /// Worker threads for corner detection.
        #[arg(long)]
        threads: Option<usize>,
        /// Name the parameters are stored under.
        #[arg(long)]
        name: String,
        /// Folder the parameter tables go into.
        #[arg(long, default_value = DEFAULT_PARAMS_DIR)]
        params_dir: PathBuf,
        /// Also write a JSON calibration report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Undistort every image in a folder with stored parameters.
    Undistort {
        /// Folder with images to undistort.
        #[arg(long)]
        dir: PathBuf,
        /// Name the parameters were stored under.
        #[arg(long)]
        name: String,
        /// Fraction of invalid border pixels to keep, in [0, 1].
        #[arg(long, default_value_t = 0.0)]
        alpha: f64,
        /// Folder the parameter tables are read from.
        #[arg(long, default_value = DEFAULT_PARAMS_DIR)]
        params_dir: PathBuf,
    },

    /// Print stored calibration parameters.
    Show {
        /// Name the parameters were stored under.
        #[arg(long)]
        name: String,
        /// Folder the parameter tables are read from.
        #[arg(long, default_value = DEFAULT_PARAMS_DIR)]
        params_dir: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Board(#[from] BoardSpecError),

    #[error(transparent)]
    Calibrate(#[from] CalibrateError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Undistort(#[from] UndistortError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = chess_calib_core::init_with_level(level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let CliError::Calibrate(CalibrateError::NotEnoughViews { .. }) = err {
                eprintln!("hint: check the inner-corner counts against your board (--cols/--rows)");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Capture {
            device,
            width,
            height,
            count,
            interval_ms,
            dir,
        } => {
            let config = CaptureConfig {
                device,
                width,
                height,
                count,
                interval: Duration::from_millis(interval_ms),
            };
            let written = capture_frames(&config, &dir)?;
            println!("saved {} frames to {}", written.len(), dir.display());
            Ok(())
        }

        Command::Calibrate {
            dir,
            cols,
            rows,
            square_size,
            threads,
            name,
            params_dir,
            report,
        } => {
            let board = BoardSpec::new(cols, rows, square_size)?;
            let outcome = calibrate_folder(&dir, &board, CalibrateOptions { threads })?;
            save_params(&params_dir, &name, &outcome.params)?;

            println!(
                "calibrated from {} of {} images ({} rejected)",
                outcome.used_images.len(),
                outcome.used_images.len() + outcome.rejected_images.len(),
                outcome.rejected_images.len()
            );
            println!("rms reprojection error:  {:.6}", outcome.rms);
            println!("mean reprojection error: {:.6}", outcome.mean_reproj_error);
            print_params(&outcome.params);
            println!(
                "parameters saved as {:?} in {}",
                name,
                params_dir.display()
            );

            if let Some(report_path) = report {
                outcome.write_json(&report_path)?;
                println!("report written to {}", report_path.display());
            }
            Ok(())
        }

        Command::Undistort {
            dir,
            name,
            alpha,
            params_dir,
        } => {
            let params = load_params(&params_dir, &name)?;
            let summary = undistort_folder(&dir, &params, alpha)?;
            println!(
                "undistorted {} images into {} ({} skipped)",
                summary.written.len(),
                summary.output_dir.display(),
                summary.skipped.len()
            );
            Ok(())
        }

        Command::Show { name, params_dir } => {
            let params = load_params(&params_dir, &name)?;
            print_params(&params);
            Ok(())
        }
    }
}

fn print_params(params: &CameraParams) {
    println!("camera matrix:");
    for row in params.camera_matrix.rows() {
        println!("  {:14.6} {:14.6} {:14.6}", row[0], row[1], row[2]);
    }
    let coeffs: Vec<String> = params
        .dist_coeffs
        .as_slice()
        .iter()
        .map(|v| format!("{v:.6}"))
        .collect();
    println!("distortion coefficients: [{}]", coeffs.join(", "));
    println!(
        "focal length: fx={:.2} fy={:.2}, optical center: cx={:.2} cy={:.2}",
        params.camera_matrix.fx(),
        params.camera_matrix.fy(),
        params.camera_matrix.cx(),
        params.camera_matrix.cy()
    );
}
