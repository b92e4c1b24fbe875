use assert_cmd::Command;
use predicates::prelude::*;

use chess_calib_core::{save_params, CameraMatrix, CameraParams, DistCoeffs};

fn chess_calib() -> Command {
    Command::cargo_bin("chess-calib").expect("binary builds")
}

fn sample_params() -> CameraParams {
    CameraParams::new(
        CameraMatrix::from_rows([
            [532.79, 0.0, 342.46],
            [0.0, 532.92, 233.90],
            [0.0, 0.0, 1.0],
        ]),
        DistCoeffs::new(vec![-0.281, 0.0243, 0.00121, -0.000136, 0.155]),
    )
}

#[test]
fn help_lists_the_subcommands() {
    chess_calib()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("capture")
                .and(predicate::str::contains("calibrate"))
                .and(predicate::str::contains("undistort"))
                .and(predicate::str::contains("show")),
        );
}

#[test]
fn calibrate_fails_on_a_missing_folder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("no-such-folder");

    chess_calib()
        .args(["calibrate", "--name", "cam", "--dir"])
        .arg(&missing)
        .args(["--params-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read folder"));
}

#[test]
fn calibrate_fails_on_a_folder_without_images() {
    let dir = tempfile::tempdir().expect("tempdir");

    chess_calib()
        .args(["calibrate", "--name", "cam", "--dir"])
        .arg(dir.path())
        .args(["--params-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no .jpg/.jpeg/.png images"));
}

#[test]
fn calibrate_rejects_a_degenerate_board() {
    let dir = tempfile::tempdir().expect("tempdir");

    chess_calib()
        .args(["calibrate", "--name", "cam", "--cols", "1", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2x2 inner corners"));
}

#[test]
fn undistort_fails_without_saved_parameters() {
    let dir = tempfile::tempdir().expect("tempdir");

    chess_calib()
        .args(["undistort", "--name", "ghost", "--dir"])
        .arg(dir.path())
        .args(["--params-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to access"));
}

#[test]
fn undistort_validates_alpha() {
    let dir = tempfile::tempdir().expect("tempdir");
    save_params(dir.path(), "cam", &sample_params()).expect("save");

    chess_calib()
        .args(["undistort", "--name", "cam", "--alpha", "1.5", "--dir"])
        .arg(dir.path())
        .args(["--params-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("alpha must be within [0, 1]"));
}

#[test]
fn show_prints_saved_parameters() {
    let dir = tempfile::tempdir().expect("tempdir");
    save_params(dir.path(), "cam", &sample_params()).expect("save");

    chess_calib()
        .args(["show", "--name", "cam", "--params-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("camera matrix:")
                .and(predicate::str::contains("fx=532.79"))
                .and(predicate::str::contains("distortion coefficients:")),
        );
}

#[test]
fn show_fails_on_an_unknown_name() {
    let dir = tempfile::tempdir().expect("tempdir");

    chess_calib()
        .args(["show", "--name", "ghost", "--params-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to access"));
}
