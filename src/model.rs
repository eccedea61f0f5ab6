//! Label items and their grouping into pages.
//!
//! A [`LabelItem`] pairs the identifier printed under a QR code with the place its image can be
//! loaded from.  The items are treated as read-only once constructed; pagination only borrows
//! contiguous slices of the caller's list.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ArtifactError, ArtifactErrorKind};

/// Where the image of a label comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Image held in memory.
    Bytes(Vec<u8>),
    /// Image stored in a file.
    Path(PathBuf),
}

impl ImageSource {
    /// Creates a new in-memory image from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Creates an image sourced from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Loads the encoded image bytes, reporting failures against `identifier`.
    pub fn load(&self, identifier: &str) -> Result<Cow<'_, [u8]>, ArtifactError> {
        match self {
            Self::Bytes(bytes) if bytes.is_empty() => {
                Err(ArtifactError::new(identifier, ArtifactErrorKind::Empty))
            }
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            Self::Path(path) => match fs::read(path) {
                Ok(bytes) if bytes.is_empty() => {
                    Err(ArtifactError::new(identifier, ArtifactErrorKind::Empty))
                }
                Ok(bytes) => Ok(Cow::Owned(bytes)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ArtifactError::new(
                    identifier,
                    ArtifactErrorKind::Missing(path.clone()),
                )),
                Err(err) => Err(ArtifactError::new(
                    identifier,
                    ArtifactErrorKind::Unreadable(path.clone(), err),
                )),
            },
        }
    }
}

/// One QR label: the caption text and its image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelItem {
    identifier: String,
    image: ImageSource,
}

impl LabelItem {
    /// Creates a label from an identifier and an image source.
    pub fn new(identifier: impl Into<String>, image: ImageSource) -> Self {
        Self {
            identifier: identifier.into(),
            image,
        }
    }

    /// Creates a label for an image file, using the file stem as identifier.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let identifier = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(identifier, ImageSource::from_path(path))
    }

    /// Text printed beneath the image.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }
}

/// A run of consecutive labels that share one sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page<'a> {
    index: usize,
    first_item: usize,
    items: &'a [LabelItem],
}

impl<'a> Page<'a> {
    /// Zero-based page number.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position of this page's first label in the full item list.
    pub fn first_item(&self) -> usize {
        self.first_item
    }

    /// Labels on this page in row-major order.
    pub fn items(&self) -> &'a [LabelItem] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Splits `items` into pages of `labels_per_page`, preserving order.
///
/// Only the last page can be shorter.  An empty list yields no pages.
///
/// # Panics
///
/// Panics if `labels_per_page` is zero; resolved grids always have at least one cell.
pub fn paginate(items: &[LabelItem], labels_per_page: usize) -> impl Iterator<Item = Page<'_>> {
    items
        .chunks(labels_per_page)
        .enumerate()
        .map(move |(index, chunk)| Page {
            index,
            first_item: index * labels_per_page,
            items: chunk,
        })
}

/// Number of pages `item_count` labels occupy.
pub fn page_count(item_count: usize, labels_per_page: usize) -> usize {
    if labels_per_page == 0 {
        0
    } else {
        (item_count + labels_per_page - 1) / labels_per_page
    }
}
