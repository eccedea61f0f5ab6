//! Print-ready grid sheets of QR code labels.
//!
//! The crate resolves a page into fixed-size label cells ([`geometry`]), splits an ordered list
//! of labels into pages and fills one grid per page ([`layout`]).  Documents are produced through
//! the [`writer::DocumentWriter`] capability; [`pdf::PdfWriter`] renders PDF files with `genpdf`
//! and [`writer::FlowDocument`] keeps everything in memory.

pub mod builder;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod source;
pub mod units;
pub mod writer;

pub use config::SheetConfig;
pub use error::{ArtifactError, ConfigError, LabelError, PersistenceError};
pub use geometry::{CellGeometry, GridSpec, Margins, PageSpec, RemainderPolicy};
pub use layout::{build_sheet, layout_labels, prune_blank_paragraphs, LabelSheet, LayoutReport};
pub use model::{ImageSource, LabelItem};
pub use units::Emu;
pub use writer::{DocumentWriter, FlowDocument};
