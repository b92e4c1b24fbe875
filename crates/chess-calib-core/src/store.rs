//! Comma-delimited text persistence for calibration parameters.
//!
//! A parameter set is keyed by a user-supplied name and stored as two flat
//! tables next to each other: `<name>_camera_matrix.txt` holds the 3x3
//! camera matrix as three comma-delimited rows, `<name>_dist_coeffs.txt`
//! holds the distortion coefficients as a single row. Values are written in
//! scientific notation with enough digits to round-trip `f64` exactly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::params::{CameraMatrix, CameraParams, DistCoeffs};

/// Default directory the CLI stores parameters in.
pub const DEFAULT_PARAMS_DIR: &str = "output";

const CAMERA_MATRIX_SUFFIX: &str = "_camera_matrix.txt";
const DIST_COEFFS_SUFFIX: &str = "_dist_coeffs.txt";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed number {token:?} in {} (line {line})", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("{}: expected a {expected} table, got {rows} row(s) of {cols} value(s)", .path.display())]
    Shape {
        path: PathBuf,
        expected: &'static str,
        rows: usize,
        cols: usize,
    },
}

/// Path of the camera-matrix table for `name` under `dir`.
pub fn camera_matrix_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(format!("{name}{CAMERA_MATRIX_SUFFIX}"))
}

/// Path of the distortion-coefficient table for `name` under `dir`.
pub fn dist_coeffs_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(format!("{name}{DIST_COEFFS_SUFFIX}"))
}

/// Persist `params` under `dir` keyed by `name`, creating `dir` if needed.
pub fn save_params(
    dir: impl AsRef<Path>,
    name: &str,
    params: &CameraParams,
) -> Result<(), StoreError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let matrix_rows: Vec<Vec<f64>> = params
        .camera_matrix
        .rows()
        .iter()
        .map(|row| row.to_vec())
        .collect();
    write_table(camera_matrix_path(dir, name), &matrix_rows)?;
    write_table(
        dist_coeffs_path(dir, name),
        &[params.dist_coeffs.values.clone()],
    )
}

/// Load the parameters saved under `dir` keyed by `name`.
pub fn load_params(dir: impl AsRef<Path>, name: &str) -> Result<CameraParams, StoreError> {
    let dir = dir.as_ref();

    let matrix_path = camera_matrix_path(dir, name);
    let table = read_table(&matrix_path)?;
    if table.len() != 3 || table.iter().any(|row| row.len() != 3) {
        return Err(StoreError::Shape {
            path: matrix_path,
            expected: "3x3",
            rows: table.len(),
            cols: table.first().map_or(0, Vec::len),
        });
    }
    let mut rows = [[0.0; 3]; 3];
    for (r, row) in table.iter().enumerate() {
        rows[r].copy_from_slice(row);
    }

    let coeffs_path = dist_coeffs_path(dir, name);
    let table = read_table(&coeffs_path)?;
    if table.len() != 1 || table[0].is_empty() {
        return Err(StoreError::Shape {
            path: coeffs_path,
            expected: "1xN",
            rows: table.len(),
            cols: table.first().map_or(0, Vec::len),
        });
    }

    Ok(CameraParams::new(
        CameraMatrix::from_rows(rows),
        DistCoeffs::new(table.into_iter().next().unwrap_or_default()),
    ))
}

fn write_table(path: PathBuf, rows: &[Vec<f64>]) -> Result<(), StoreError> {
    let mut out = String::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.16e}")).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    fs::write(&path, out).map_err(|source| StoreError::Io { path, source })
}

fn read_table(path: &Path) -> Result<Vec<Vec<f64>>, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split(',') {
            let token = token.trim();
            let value: f64 = token.parse().map_err(|_| StoreError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                token: token.to_owned(),
            })?;
            row.push(value);
        }
        rows.push(row);
    }
    Ok(rows)
}
