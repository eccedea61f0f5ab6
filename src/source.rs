//! Collecting label images from a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::model::LabelItem;

/// File extension recognised as a label image, compared case-insensitively.
pub const IMAGE_EXTENSION: &str = "png";

/// Lists the PNG files in `dir` as labels, sorted by file name.
///
/// Each label is captioned with its file stem.  A missing directory is not an error: it is
/// reported as a warning and produces no labels.
pub fn scan_directory(dir: impl AsRef<Path>) -> io::Result<Vec<LabelItem>> {
    let dir = dir.as_ref();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("label image directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    info!("found {} label image(s) in {}", paths.len(), dir.display());
    Ok(paths.iter().map(LabelItem::from_path).collect())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION))
}
