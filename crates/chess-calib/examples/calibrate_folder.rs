use chess_calib::{calibrate_folder, BoardSpec, CalibrateOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = chess_calib_core::init_with_level(log::LevelFilter::Info);

    let Some(dir) = std::env::args().nth(1) else {
        eprintln!("Usage: calibrate_folder <image_folder>");
        return Ok(());
    };

    let board = BoardSpec::new(9, 6, 1.0)?;
    let outcome = calibrate_folder(&dir, &board, CalibrateOptions::default())?;

    println!(
        "used {} images, rms {:.6}, mean reprojection error {:.6}",
        outcome.used_images.len(),
        outcome.rms,
        outcome.mean_reproj_error
    );
    println!("fx = {:.2}", outcome.params.camera_matrix.fx());

    Ok(())
}
