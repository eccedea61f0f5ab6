//! Error types shared by the geometry resolver, the label filler and the document writers.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::units::Emu;

/// Invalid sheet configuration detected before any document work starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The grid has no rows.
    ZeroRows,
    /// The grid has no columns.
    ZeroColumns,
    /// The page width or height is not strictly positive.
    NonPositivePage { width: Emu, height: Emu },
    /// A margin is negative.
    NegativeMargin,
    /// Left plus right margin leave no printable width.
    MarginsExceedWidth { width: Emu, margins: Emu },
    /// Top plus bottom margin leave no printable height.
    MarginsExceedHeight { height: Emu, margins: Emu },
    /// The label-stock cell height override is not strictly positive.
    NonPositiveCellHeight(Emu),
    /// The fixed cell height is so large that the rows cannot be measured.
    CellHeightTooLarge(Emu),
    /// The caption font size must be at least one point.
    ZeroCaptionFontSize,
    /// A resolved geometry was paired with a page it does not fit.
    GeometryMismatch { grid_width: Emu, usable_width: Emu },
    /// Even the minimum image size does not fit the cell next to its caption.
    CellTooSmall {
        cell_width: Emu,
        cell_height: Emu,
        caption_height: Emu,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroRows => write!(f, "grid must have at least one row"),
            Self::ZeroColumns => write!(f, "grid must have at least one column"),
            Self::NonPositivePage { width, height } => {
                write!(f, "page size {width} x {height} is not positive")
            }
            Self::NegativeMargin => write!(f, "page margins must not be negative"),
            Self::MarginsExceedWidth { width, margins } => write!(
                f,
                "left and right margins ({margins}) leave no room on a page {width} wide"
            ),
            Self::MarginsExceedHeight { height, margins } => write!(
                f,
                "top and bottom margins ({margins}) leave no room on a page {height} high"
            ),
            Self::NonPositiveCellHeight(height) => {
                write!(f, "fixed cell height {height} is not positive")
            }
            Self::CellHeightTooLarge(height) => {
                write!(f, "fixed cell height {height} is too large")
            }
            Self::ZeroCaptionFontSize => write!(f, "caption font size must be at least 1pt"),
            Self::GeometryMismatch {
                grid_width,
                usable_width,
            } => write!(
                f,
                "grid {grid_width} wide does not fit the printable width {usable_width}; resolve the geometry for this page and grid"
            ),
            Self::CellTooSmall {
                cell_width,
                cell_height,
                caption_height,
            } => write!(
                f,
                "cells of {cell_width} x {cell_height} cannot hold a minimum size image above a {caption_height} caption"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reason an image artifact could not be placed into its cell.
#[derive(Debug)]
pub enum ArtifactErrorKind {
    /// The referenced file does not exist.
    Missing(PathBuf),
    /// The referenced file exists but could not be read.
    Unreadable(PathBuf, io::Error),
    /// The in-memory image holds no bytes.
    Empty,
    /// The bytes are not an image the writer understands.
    Undecodable(String),
}

/// A label whose image could not be resolved; the label still gets its caption.
#[derive(Debug)]
pub struct ArtifactError {
    identifier: String,
    kind: ArtifactErrorKind,
}

impl ArtifactError {
    /// Creates a new artifact error for the label `identifier`.
    pub fn new(identifier: impl Into<String>, kind: ArtifactErrorKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
        }
    }

    /// Identifier of the affected label.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// What went wrong.
    pub fn kind(&self) -> &ArtifactErrorKind {
        &self.kind
    }

    /// Short description of the failure without the label identifier.
    pub fn reason(&self) -> String {
        match &self.kind {
            ArtifactErrorKind::Missing(path) => format!("{} not found", path.display()),
            ArtifactErrorKind::Unreadable(path, err) => {
                format!("{} unreadable: {err}", path.display())
            }
            ArtifactErrorKind::Empty => "image data is empty".to_owned(),
            ArtifactErrorKind::Undecodable(message) => format!("cannot decode image: {message}"),
        }
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image for label '{}': {}", self.identifier, self.reason())
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ArtifactErrorKind::Unreadable(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Underlying cause of a failed save.
#[derive(Debug)]
pub enum PersistenceErrorKind {
    /// Writing the output file failed.
    Io(io::Error),
    /// The PDF renderer rejected the document.
    Render(genpdf::error::Error),
}

/// The finished document could not be written to its destination.
#[derive(Debug)]
pub struct PersistenceError {
    path: PathBuf,
    kind: PersistenceErrorKind,
}

impl PersistenceError {
    /// Creates a persistence error for the output `path`.
    pub fn new(path: impl Into<PathBuf>, kind: PersistenceErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Destination that could not be written.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Underlying cause.
    pub fn kind(&self) -> &PersistenceErrorKind {
        &self.kind
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to save document to {}", self.path.display())
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            PersistenceErrorKind::Io(err) => Some(err),
            PersistenceErrorKind::Render(err) => Some(err),
        }
    }
}

/// Errors that abort a label sheet build.
#[derive(Debug)]
pub enum LabelError {
    /// The sheet geometry is impossible.
    Configuration(ConfigError),
    /// The finished document could not be saved.
    Persistence(PersistenceError),
}

impl From<ConfigError> for LabelError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err)
    }
}

impl From<PersistenceError> for LabelError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(_) => write!(f, "invalid label sheet configuration"),
            Self::Persistence(_) => write!(f, "label sheet could not be saved"),
        }
    }
}

impl std::error::Error for LabelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}
