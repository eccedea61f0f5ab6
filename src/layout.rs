//! Pagination and cell filling for label sheets.
//!
//! [`layout_labels`] walks the label list one page at a time, appends a grid per page and fills
//! its cells in row-major order.  [`prune_blank_paragraphs`] is the separate normalization pass
//! that runs once every page is in place.  [`LabelSheet`] ties both to a resolved configuration
//! and saves the result.

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};

use crate::config::SheetConfig;
use crate::error::{ArtifactError, ConfigError, LabelError};
use crate::geometry::{CellGeometry, GridSpec, PageSpec};
use crate::model::{self, LabelItem, Page};
use crate::units::Emu;
use crate::writer::{CaptionFit, CellAddress, DocumentWriter};

/// A label printed incompletely: its image was left out or its caption overflows the cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DegradedLabel {
    /// Identifier of the label.
    pub identifier: String,
    /// What is wrong with the printed label.
    pub reason: String,
}

impl From<&ArtifactError> for DegradedLabel {
    fn from(err: &ArtifactError) -> Self {
        Self {
            identifier: err.identifier().to_owned(),
            reason: format!("image omitted ({})", err.reason()),
        }
    }
}

/// Summary of a finished layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Pages emitted.
    pub pages: usize,
    /// Labels placed, including degraded ones.
    pub items: usize,
    /// Labels printed incompletely, in layout order.
    pub degraded: Vec<DegradedLabel>,
    /// Blank top-level paragraphs removed by normalization.
    pub pruned_paragraphs: usize,
}

impl LayoutReport {
    /// Whether every label got its image and a caption inside its cell.
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "laid out {} label{} on {} page{}",
            self.items,
            if self.items == 1 { "" } else { "s" },
            self.pages,
            if self.pages == 1 { "" } else { "s" }
        )?;
        for label in &self.degraded {
            write!(f, "\nlabel {}: {}", label.identifier, label.reason)?;
        }
        Ok(())
    }
}

/// Lays `items` out as one grid per page on `writer`.
///
/// Page setup comes from `page`; each page receives a `grid.rows` x `grid.columns` grid sized by
/// `geometry`, with a page break between consecutive pages.  Cells past the end of a short last
/// page stay empty.  Images that cannot be loaded are reported in the returned summary and the
/// label keeps its caption.
///
/// `geometry` is expected to come from [`geometry::resolve`](crate::geometry::resolve) for the
/// same `page` and `grid`; [`LabelSheet`] keeps the three together.  A geometry whose columns are
/// wider than the printable width of `page` is rejected before the writer is touched.
pub fn layout_labels<W>(
    items: &[LabelItem],
    page: &PageSpec,
    grid: &GridSpec,
    geometry: &CellGeometry,
    caption_font_size: u8,
    writer: &mut W,
) -> Result<LayoutReport, ConfigError>
where
    W: DocumentWriter + ?Sized,
{
    if grid.rows == 0 {
        return Err(ConfigError::ZeroRows);
    }
    if grid.columns == 0 {
        return Err(ConfigError::ZeroColumns);
    }
    let grid_width = (0..grid.columns)
        .map(|column| geometry.column_width(column))
        .try_fold(Emu::ZERO, |total, width| total.checked_add(width));
    let usable_width = page.usable_width();
    match grid_width {
        Some(grid_width) if grid_width <= usable_width => {}
        _ => {
            return Err(ConfigError::GeometryMismatch {
                grid_width: grid_width.unwrap_or(Emu(i64::MAX)),
                usable_width,
            })
        }
    }

    writer.set_page_setup(page);

    let mut report = LayoutReport::default();
    for page in model::paginate(items, grid.labels_per_page()) {
        if page.index() > 0 {
            writer.append_page_break();
        }
        fill_page(&page, grid, geometry, caption_font_size, writer, &mut report);
        report.pages += 1;
        debug!(
            "page {} done ({} labels from #{})",
            page.index() + 1,
            page.len(),
            page.first_item() + 1
        );
    }

    Ok(report)
}

fn fill_page<W>(
    page: &Page<'_>,
    grid: &GridSpec,
    geometry: &CellGeometry,
    caption_font_size: u8,
    writer: &mut W,
    report: &mut LayoutReport,
) where
    W: DocumentWriter + ?Sized,
{
    let grid_id = writer.append_grid(grid.rows, grid.columns, geometry);

    for (slot, item) in page.items().iter().enumerate() {
        let row = (slot / grid.columns as usize) as u32;
        let column = (slot % grid.columns as usize) as u32;
        let cell = CellAddress::new(grid_id, row, column);

        let placed = item.image().load(item.identifier()).and_then(|bytes| {
            writer.insert_image(cell, item.identifier(), &bytes, geometry.image_size())
        });
        if let Err(err) = placed {
            warn!("{}; rendering caption only", err);
            report.degraded.push(DegradedLabel::from(&err));
        }

        match writer.insert_caption(cell, item.identifier(), caption_font_size) {
            CaptionFit::Exact => {}
            CaptionFit::Shrunk(points) => debug!(
                "caption '{}' set at {}pt to fit its cell",
                item.identifier(),
                points
            ),
            CaptionFit::Overflow => {
                warn!(
                    "caption '{}' is wider than its cell even at the smallest size",
                    item.identifier()
                );
                report.degraded.push(DegradedLabel {
                    identifier: item.identifier().to_owned(),
                    reason: "caption wider than its cell".to_owned(),
                });
            }
        }
        report.items += 1;
    }
}

/// Removes every blank top-level paragraph from the document.
///
/// Paragraphs inside grid cells are never touched.  Returns the number of removed paragraphs.
pub fn prune_blank_paragraphs<W>(writer: &mut W) -> usize
where
    W: DocumentWriter + ?Sized,
{
    let blanks = writer.blank_paragraphs();
    let removed = blanks
        .into_iter()
        .filter(|node| writer.remove_node(*node))
        .count();
    if removed > 0 {
        debug!("pruned {} blank top-level paragraph(s)", removed);
    }
    removed
}

/// A validated sheet layout that can build any number of documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelSheet {
    config: SheetConfig,
    geometry: CellGeometry,
}

impl LabelSheet {
    /// Validates `config` and resolves its geometry.
    pub fn new(config: SheetConfig) -> Result<Self, ConfigError> {
        let geometry = config.resolve()?;
        Ok(Self { config, geometry })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    /// Lays out `items` and normalizes the document without saving it.
    pub fn compose<W>(
        &self,
        items: &[LabelItem],
        writer: &mut W,
    ) -> Result<LayoutReport, ConfigError>
    where
        W: DocumentWriter + ?Sized,
    {
        let mut report = layout_labels(
            items,
            self.config.page(),
            self.config.grid(),
            &self.geometry,
            self.config.caption_font_size(),
            &mut *writer,
        )?;
        report.pruned_paragraphs = prune_blank_paragraphs(&mut *writer);
        Ok(report)
    }

    /// Lays out `items`, normalizes the document and saves it to `output`.
    pub fn build<W>(
        &self,
        items: &[LabelItem],
        writer: &mut W,
        output: impl AsRef<Path>,
    ) -> Result<LayoutReport, LabelError>
    where
        W: DocumentWriter + ?Sized,
    {
        let output = output.as_ref();
        if items.is_empty() {
            warn!("no labels to lay out; saving an empty sheet");
        }

        let report = self.compose(items, &mut *writer)?;
        writer.save(output)?;

        info!("{} -> {}", report, output.display());
        Ok(report)
    }
}

/// Resolves `config` and builds a sheet in one call.
pub fn build_sheet<W>(
    config: SheetConfig,
    items: &[LabelItem],
    writer: &mut W,
    output: impl AsRef<Path>,
) -> Result<LayoutReport, LabelError>
where
    W: DocumentWriter + ?Sized,
{
    LabelSheet::new(config)?.build(items, writer, output)
}
