//! Font discovery for PDF output.
//!
//! `genpdf` needs a complete TrueType family (regular, bold, italic, bold italic) even though
//! label captions only use the regular face.  Directories are searched in this order:
//!
//! 1. `QR_LABEL_SHEET_FONTS_DIR`, expected to hold the Roboto files,
//! 2. `assets/fonts` next to the running binary,
//! 3. `assets/fonts` in the crate directory,
//! 4. common system locations of Liberation Sans.

use std::env;
use std::io;
use std::path::PathBuf;

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Environment variable overriding the bundled font directory.
pub const FONTS_DIR_ENV: &str = "QR_LABEL_SHEET_FONTS_DIR";

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

const SYSTEM_FAMILY_NAME: &str = "LiberationSans";

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/TTF",
];

const FACE_SUFFIXES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

/// A directory expected to contain `<family>-<Face>.ttf` files.
#[derive(Clone, Debug, PartialEq, Eq)]
struct FontCandidate {
    directory: PathBuf,
    family: &'static str,
}

impl FontCandidate {
    fn new(directory: PathBuf, family: &'static str) -> Self {
        Self { directory, family }
    }

    fn missing_files(&self) -> Vec<String> {
        FACE_SUFFIXES
            .iter()
            .map(|face| format!("{}-{}.ttf", self.family, face))
            .filter(|name| !self.directory.join(name).is_file())
            .collect()
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn font_candidates() -> Vec<FontCandidate> {
    let mut candidates = Vec::new();
    let mut push = |candidate: FontCandidate| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push(FontCandidate::new(path, DEFAULT_FONT_FAMILY_NAME));
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(FontCandidate::new(
                bin_dir.join("assets/fonts"),
                DEFAULT_FONT_FAMILY_NAME,
            ));
        }
    }

    push(FontCandidate::new(
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"),
        DEFAULT_FONT_FAMILY_NAME,
    ));

    for dir in SYSTEM_FONT_DIRS {
        push(FontCandidate::new(PathBuf::from(dir), SYSTEM_FAMILY_NAME));
    }

    candidates
}

fn resolve_font_candidate() -> Result<FontCandidate, Error> {
    let mut attempts = Vec::new();

    for candidate in font_candidates() {
        if !candidate.directory.is_dir() {
            attempts.push(format!(
                "{} (directory missing)",
                candidate.directory.display()
            ));
            continue;
        }
        let missing = candidate.missing_files();
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.directory.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate a font family. Checked: {}. Set {} to a directory holding the Roboto TTF files.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

/// Loads the first complete font family found in the search path.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let candidate = resolve_font_candidate()?;
    if candidate.family != DEFAULT_FONT_FAMILY_NAME {
        warn!(
            "Bundled {} fonts unavailable; using {} from {}",
            DEFAULT_FONT_FAMILY_NAME,
            candidate.family,
            candidate.directory.display()
        );
    }
    debug!(
        "loading font family {} from {}",
        candidate.family,
        candidate.directory.display()
    );

    fonts::from_files(&candidate.directory, candidate.family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                candidate.family,
                candidate.directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Indicates whether any complete font family is available for PDF output.
pub fn default_fonts_available() -> bool {
    resolve_font_candidate().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_reports_each_missing_face() {
        let candidate = FontCandidate::new(
            PathBuf::from("/__qr_label_sheet_no_fonts__"),
            DEFAULT_FONT_FAMILY_NAME,
        );
        assert_eq!(
            candidate.missing_files(),
            vec![
                "Roboto-Regular.ttf",
                "Roboto-Bold.ttf",
                "Roboto-Italic.ttf",
                "Roboto-BoldItalic.ttf",
            ]
        );
    }

    #[test]
    fn search_path_ends_with_system_fonts() {
        let candidates = font_candidates();
        let last = candidates.last().expect("at least one candidate");
        assert_eq!(last.family, SYSTEM_FAMILY_NAME);
        assert!(candidates
            .iter()
            .any(|c| c.directory.ends_with("assets/fonts")));
    }
}
