//! The document-writer capability consumed by the label filler, and an in-memory implementation.
//!
//! [`DocumentWriter`] is the narrow set of operations the layout needs from a document format:
//! page setup, page breaks, fixed-layout grids, images and captions inside grid cells, and
//! access to top-level paragraphs so blank ones can be pruned.  [`FlowDocument`] records those
//! operations as a node tree; other writers (see [`crate::pdf`]) reuse it as their structure.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{ArtifactError, PersistenceError, PersistenceErrorKind};
use crate::geometry::{CellGeometry, PageSpec};
use crate::units::Emu;

/// Identifies a grid appended to a document.  Stable across removal of other nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridId(u32);

/// Identifies a top-level node.  Stable across removal of other nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

/// A cell inside a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    pub grid: GridId,
    pub row: u32,
    pub column: u32,
}

impl CellAddress {
    pub fn new(grid: GridId, row: u32, column: u32) -> Self {
        Self { grid, row, column }
    }
}

/// Operations a document format must offer to receive a label sheet.
pub trait DocumentWriter {
    /// Sets the paper size and margins for every page.
    fn set_page_setup(&mut self, page: &PageSpec);

    /// Starts a new page.
    fn append_page_break(&mut self);

    /// Appends a fixed-layout grid with exact cell sizes and zero cell margins.
    fn append_grid(&mut self, rows: u32, columns: u32, geometry: &CellGeometry) -> GridId;

    /// Places a square image of side `size` centered in `cell`.
    ///
    /// `identifier` names the label in errors.  A failure leaves the cell without an image.
    fn insert_image(
        &mut self,
        cell: CellAddress,
        identifier: &str,
        image: &[u8],
        size: Emu,
    ) -> Result<(), ArtifactError>;

    /// Adds a centered single-line caption with `text` below the cell content.
    ///
    /// The text is kept verbatim.  Writers that can measure text may set it smaller than
    /// `font_size` to fit the cell width and report how it was fitted.
    fn insert_caption(&mut self, cell: CellAddress, text: &str, font_size: u8) -> CaptionFit;

    /// Top-level paragraphs whose text is empty or whitespace.
    fn blank_paragraphs(&self) -> Vec<NodeId>;

    /// Removes a top-level node; returns `false` if it does not exist.
    fn remove_node(&mut self, node: NodeId) -> bool;

    /// Writes the finished document to `path`.
    fn save(&mut self, path: &Path) -> Result<(), PersistenceError>;
}

/// How a caption was fitted into the width of its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionFit {
    /// Set at the requested size.
    Exact,
    /// Set at the given, smaller point size to fit the cell.
    Shrunk(u8),
    /// Wider than the cell even at the smallest size; printed across the cell edge.
    Overflow,
}

/// Content placed inside a grid cell, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellContent {
    /// Square image with the given side length.
    Image { size: Emu },
    /// Centered caption paragraph.
    Caption { text: String, font_size: u8 },
}

/// A fixed-layout grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    id: GridId,
    rows: u32,
    columns: u32,
    column_widths: Vec<Emu>,
    row_heights: Vec<Emu>,
    cells: Vec<Vec<CellContent>>,
}

impl Grid {
    fn new(id: GridId, rows: u32, columns: u32, geometry: &CellGeometry) -> Self {
        Self {
            id,
            rows,
            columns,
            column_widths: (0..columns).map(|c| geometry.column_width(c)).collect(),
            row_heights: (0..rows).map(|r| geometry.row_height(r)).collect(),
            cells: vec![Vec::new(); rows as usize * columns as usize],
        }
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn column_widths(&self) -> &[Emu] {
        &self.column_widths
    }

    pub fn row_heights(&self) -> &[Emu] {
        &self.row_heights
    }

    /// Content of the cell at `row`, `column`; `None` outside the grid.
    pub fn cell(&self, row: u32, column: u32) -> Option<&[CellContent]> {
        self.index(row, column).map(|i| self.cells[i].as_slice())
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &[CellContent]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Number of cells holding any content.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// Caption text of each occupied cell in row-major order.
    pub fn captions(&self) -> Vec<&str> {
        self.cells
            .iter()
            .filter_map(|cell| {
                cell.iter().find_map(|content| match content {
                    CellContent::Caption { text, .. } => Some(text.as_str()),
                    CellContent::Image { .. } => None,
                })
            })
            .collect()
    }

    fn index(&self, row: u32, column: u32) -> Option<usize> {
        (row < self.rows && column < self.columns)
            .then(|| row as usize * self.columns as usize + column as usize)
    }

    fn cell_mut(&mut self, row: u32, column: u32) -> Option<&mut Vec<CellContent>> {
        let index = self.index(row, column)?;
        Some(&mut self.cells[index])
    }
}

/// A top-level node in the document flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowNode {
    /// Body paragraph outside any grid.
    Paragraph(String),
    /// Hard page break.
    PageBreak,
    /// Label grid.
    Grid(Grid),
}

/// In-memory document built from [`DocumentWriter`] calls.
///
/// Like most word-processor containers it starts out holding one empty paragraph.  Saving writes
/// a plain-text outline of the layout, which is handy for previews and diffing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowDocument {
    page: Option<PageSpec>,
    nodes: Vec<(NodeId, FlowNode)>,
    next_node: u32,
    next_grid: u32,
}

impl Default for FlowDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowDocument {
    /// Creates a document holding a single empty paragraph.
    pub fn new() -> Self {
        let mut document = Self::empty();
        document.append_paragraph("");
        document
    }

    /// Creates a document without any nodes.
    pub fn empty() -> Self {
        Self {
            page: None,
            nodes: Vec::new(),
            next_node: 0,
            next_grid: 0,
        }
    }

    /// Appends a top-level paragraph.
    pub fn append_paragraph(&mut self, text: impl Into<String>) -> NodeId {
        self.push(FlowNode::Paragraph(text.into()))
    }

    pub fn page_setup(&self) -> Option<&PageSpec> {
        self.page.as_ref()
    }

    /// Top-level nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes.iter().map(|(_, node)| node)
    }

    /// Grids in document order.
    pub fn grids(&self) -> impl Iterator<Item = &Grid> {
        self.nodes().filter_map(|node| match node {
            FlowNode::Grid(grid) => Some(grid),
            _ => None,
        })
    }

    /// Looks up a grid by id.
    pub fn grid(&self, id: GridId) -> Option<&Grid> {
        self.grids().find(|grid| grid.id == id)
    }

    /// Number of explicit page breaks.
    pub fn page_breaks(&self) -> usize {
        self.nodes()
            .filter(|node| matches!(node, FlowNode::PageBreak))
            .count()
    }

    /// Number of pages the flow spans: one more than the page breaks.
    pub fn page_count(&self) -> usize {
        self.page_breaks() + 1
    }

    fn push(&mut self, node: FlowNode) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.push((id, node));
        id
    }

    fn cell_mut(&mut self, cell: CellAddress) -> Option<&mut Vec<CellContent>> {
        self.nodes.iter_mut().find_map(|(_, node)| match node {
            FlowNode::Grid(grid) if grid.id == cell.grid => grid.cell_mut(cell.row, cell.column),
            _ => None,
        })
    }

    pub(crate) fn push_image(&mut self, cell: CellAddress, size: Emu) {
        match self.cell_mut(cell) {
            Some(contents) => contents.push(CellContent::Image { size }),
            None => log::warn!("ignoring image for unknown cell {:?}", cell),
        }
    }

    pub(crate) fn push_caption(&mut self, cell: CellAddress, text: &str, font_size: u8) {
        let caption = CellContent::Caption {
            text: text.to_owned(),
            font_size,
        };
        match self.cell_mut(cell) {
            Some(contents) => contents.push(caption),
            None => log::warn!("ignoring caption for unknown cell {:?}", cell),
        }
    }

    /// Renders the plain-text outline written by [`DocumentWriter::save`].
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if let Some(page) = &self.page {
            let m = &page.margins;
            let _ = writeln!(
                out,
                "page {} x {} margins top {} right {} bottom {} left {}",
                page.width, page.height, m.top, m.right, m.bottom, m.left
            );
        }
        for node in self.nodes() {
            match node {
                FlowNode::Paragraph(text) => {
                    let _ = writeln!(out, "paragraph {:?}", text);
                }
                FlowNode::PageBreak => out.push_str("page-break\n"),
                FlowNode::Grid(grid) => write_grid_outline(&mut out, grid),
            }
        }
        out
    }
}

fn write_grid_outline(out: &mut String, grid: &Grid) {
    let _ = writeln!(
        out,
        "grid {}x{} columns [{}] rows [{}]",
        grid.rows,
        grid.columns,
        join(&grid.column_widths),
        join(&grid.row_heights)
    );
    for row in 0..grid.rows {
        for column in 0..grid.columns {
            let Some(contents) = grid.cell(row, column) else {
                continue;
            };
            if contents.is_empty() {
                continue;
            }
            let _ = write!(out, "  r{}c{}", row + 1, column + 1);
            for content in contents {
                match content {
                    CellContent::Image { size } => {
                        let _ = write!(out, " image {}", size);
                    }
                    CellContent::Caption { text, font_size } => {
                        let _ = write!(out, " caption {:?} {}pt", text, font_size);
                    }
                }
            }
            out.push('\n');
        }
    }
}

fn join(lengths: &[Emu]) -> String {
    lengths
        .iter()
        .map(Emu::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DocumentWriter for FlowDocument {
    fn set_page_setup(&mut self, page: &PageSpec) {
        self.page = Some(*page);
    }

    fn append_page_break(&mut self) {
        self.push(FlowNode::PageBreak);
    }

    fn append_grid(&mut self, rows: u32, columns: u32, geometry: &CellGeometry) -> GridId {
        let id = GridId(self.next_grid);
        self.next_grid += 1;
        self.push(FlowNode::Grid(Grid::new(id, rows, columns, geometry)));
        id
    }

    fn insert_image(
        &mut self,
        cell: CellAddress,
        _identifier: &str,
        _image: &[u8],
        size: Emu,
    ) -> Result<(), ArtifactError> {
        self.push_image(cell, size);
        Ok(())
    }

    fn insert_caption(&mut self, cell: CellAddress, text: &str, font_size: u8) -> CaptionFit {
        self.push_caption(cell, text, font_size);
        CaptionFit::Exact
    }

    fn blank_paragraphs(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| match node {
                FlowNode::Paragraph(text) if text.trim().is_empty() => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|(id, _)| *id != node);
        self.nodes.len() != before
    }

    fn save(&mut self, path: &Path) -> Result<(), PersistenceError> {
        fs::write(path, self.outline())
            .map_err(|err| PersistenceError::new(path, PersistenceErrorKind::Io(err)))
    }
}
