//! PDF output for label sheets through `genpdf`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use genpdf::elements::Paragraph;
use genpdf::error::Error;
use genpdf::fonts::{FontCache, FontData, FontFamily};
use image::DynamicImage;

use crate::builder::DocumentBuilder;
use crate::elements::{self, mm_from_emu, LabelCell, LabelGrid, SheetBlock, SheetFlow};
use crate::error::{ArtifactError, ArtifactErrorKind, PersistenceError, PersistenceErrorKind};
use crate::fonts;
use crate::geometry::{CellGeometry, PageSpec, IMAGE_EPSILON};
use crate::units::Emu;
use crate::writer::{
    CaptionFit, CellAddress, CellContent, DocumentWriter, FlowDocument, FlowNode, Grid, GridId,
    NodeId,
};

/// Result of rendering a sheet to memory.
pub struct PdfOutput {
    /// Encoded PDF file.
    pub bytes: Vec<u8>,
}

/// A [`DocumentWriter`] producing PDF files.
///
/// Structure is recorded in a [`FlowDocument`]; images are decoded as they are inserted so that
/// unreadable artifacts are reported per label instead of failing the save.  Captions are
/// measured with the document font when inserted and set smaller when they would not fit their
/// column.
pub struct PdfWriter {
    flow: FlowDocument,
    images: BTreeMap<CellAddress, DynamicImage>,
    font_family: FontFamily<FontData>,
    font_cache: FontCache,
    title: Option<String>,
    cell_borders: bool,
}

impl PdfWriter {
    /// Creates a writer using the first font family found by [`fonts::default_font_family`].
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_font_family(fonts::default_font_family()?))
    }

    /// Creates a writer rendering text with `font_family`.
    pub fn with_font_family(font_family: FontFamily<FontData>) -> Self {
        Self {
            flow: FlowDocument::new(),
            images: BTreeMap::new(),
            font_cache: FontCache::new(font_family.clone()),
            font_family,
            title: None,
            cell_borders: false,
        }
    }

    /// Sets the PDF document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Draws cut lines around every cell when enabled.
    pub fn with_cell_borders(mut self, borders: bool) -> Self {
        self.cell_borders = borders;
        self
    }

    /// Appends a body paragraph outside the label grids.
    pub fn append_paragraph(&mut self, text: impl Into<String>) -> NodeId {
        self.flow.append_paragraph(text)
    }

    /// The recorded document structure.
    pub fn flow(&self) -> &FlowDocument {
        &self.flow
    }

    /// Renders the current document to PDF bytes.
    pub fn render(&self) -> Result<PdfOutput, Error> {
        let mut builder = DocumentBuilder::new();
        if let Some(page) = self.flow.page_setup() {
            builder = builder.with_page(*page);
        }
        if let Some(title) = &self.title {
            builder = builder.with_title(title.clone());
        }

        let mut document = builder.build(self.font_family.clone());
        document.push(SheetFlow::new(self.blocks()?));

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;
        Ok(PdfOutput { bytes })
    }

    fn blocks(&self) -> Result<Vec<SheetBlock>, Error> {
        let mut blocks = Vec::new();
        for node in self.flow.nodes() {
            let block = match node {
                FlowNode::Paragraph(text) => SheetBlock::Text(Paragraph::new(text.as_str())),
                FlowNode::PageBreak => SheetBlock::PageBreak,
                FlowNode::Grid(grid) => SheetBlock::Grid(self.label_grid(grid)?),
            };
            blocks.push(block);
        }
        Ok(blocks)
    }

    fn label_grid(&self, grid: &Grid) -> Result<LabelGrid, Error> {
        let mut label_grid = LabelGrid::new(
            grid.column_widths().iter().copied().map(mm_from_emu).collect(),
            grid.row_heights().iter().copied().map(mm_from_emu).collect(),
        )
        .with_borders(self.cell_borders);

        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let Some(contents) = grid.cell(row, column) else {
                    continue;
                };
                if contents.is_empty() {
                    continue;
                }
                let address = CellAddress::new(grid.id(), row, column);
                let cell = self.label_cell(address, contents)?;
                label_grid.set_cell(row as usize, column as usize, cell);
            }
        }
        Ok(label_grid)
    }

    fn label_cell(
        &self,
        address: CellAddress,
        contents: &[CellContent],
    ) -> Result<LabelCell, Error> {
        let mut cell = LabelCell::new();
        for content in contents {
            match content {
                CellContent::Image { size } => {
                    if let Some(decoded) = self.images.get(&address) {
                        let image = elements::square_image(decoded.clone(), *size)?;
                        cell = cell.with_image(image, mm_from_emu(*size));
                    }
                }
                CellContent::Caption { text, font_size } => {
                    cell = cell.with_caption(text.as_str(), *font_size);
                }
            }
        }
        Ok(cell)
    }
}

impl DocumentWriter for PdfWriter {
    fn set_page_setup(&mut self, page: &PageSpec) {
        self.flow.set_page_setup(page);
    }

    fn append_page_break(&mut self) {
        self.flow.append_page_break();
    }

    fn append_grid(&mut self, rows: u32, columns: u32, geometry: &CellGeometry) -> GridId {
        self.flow.append_grid(rows, columns, geometry)
    }

    fn insert_image(
        &mut self,
        cell: CellAddress,
        identifier: &str,
        image: &[u8],
        size: Emu,
    ) -> Result<(), ArtifactError> {
        let decoded = elements::decode_image_from_bytes(image).map_err(|err| {
            ArtifactError::new(identifier, ArtifactErrorKind::Undecodable(err.to_string()))
        })?;
        self.images.insert(cell, elements::flatten_alpha(decoded));
        self.flow.push_image(cell, size);
        Ok(())
    }

    fn insert_caption(&mut self, cell: CellAddress, text: &str, font_size: u8) -> CaptionFit {
        let column_width = self
            .flow
            .grid(cell.grid)
            .and_then(|grid| grid.column_widths().get(cell.column as usize).copied());
        let (size, fit) = match column_width {
            Some(width) => elements::fit_caption(
                &self.font_cache,
                text,
                font_size,
                mm_from_emu(width - IMAGE_EPSILON),
            ),
            None => (font_size, CaptionFit::Exact),
        };
        self.flow.push_caption(cell, text, size);
        fit
    }

    fn blank_paragraphs(&self) -> Vec<NodeId> {
        self.flow.blank_paragraphs()
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        self.flow.remove_node(node)
    }

    fn save(&mut self, path: &Path) -> Result<(), PersistenceError> {
        let output = self
            .render()
            .map_err(|err| PersistenceError::new(path, PersistenceErrorKind::Render(err)))?;
        fs::write(path, &output.bytes)
            .map_err(|err| PersistenceError::new(path, PersistenceErrorKind::Io(err)))?;
        log::debug!("wrote {} ({} bytes)", path.display(), output.bytes.len());
        Ok(())
    }
}
