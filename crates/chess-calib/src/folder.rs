//! Image folder scanning.

use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(thiserror::Error, Debug)]
pub enum FolderError {
    #[error("failed to read folder {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no .jpg/.jpeg/.png images in {}", .path.display())]
    NoImages { path: PathBuf },
}

/// Collect the image files in `dir`, sorted for a reproducible processing
/// order.
pub fn image_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, FolderError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| FolderError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| FolderError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(FolderError::NoImages {
            path: dir.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
