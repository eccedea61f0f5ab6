//! Geometry resolution for fixed-layout label grids.
//!
//! [`resolve`] turns a physical page, its margins and a row/column count into a [`CellGeometry`]
//! that every cell of every page shares.  All arithmetic happens in whole [`Emu`] so that two
//! builds with the same inputs produce identical numbers.

use log::{debug, warn};

use crate::error::ConfigError;
use crate::units::Emu;

/// Padding kept between the image and the cell edges.
pub const IMAGE_EPSILON: Emu = Emu(9_144);
/// Smallest image side the resolver will ever produce.
pub const MIN_IMAGE_SIZE: Emu = Emu(54_864);
/// Extra vertical room reserved above the caption font size, in points.
pub const CAPTION_LEADING_POINTS: i64 = 2;

/// Page margins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Margins {
    pub top: Emu,
    pub right: Emu,
    pub bottom: Emu,
    pub left: Emu,
}

impl Margins {
    /// Creates margins in top, right, bottom, left order.
    pub fn trbl(top: Emu, right: Emu, bottom: Emu, left: Emu) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same margin on every side.
    pub fn all(margin: Emu) -> Self {
        Self::trbl(margin, margin, margin, margin)
    }
}

/// Physical page size and margins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSpec {
    pub width: Emu,
    pub height: Emu,
    pub margins: Margins,
}

impl PageSpec {
    /// Creates a page without margins.
    pub fn new(width: Emu, height: Emu) -> Self {
        Self {
            width,
            height,
            margins: Margins::default(),
        }
    }

    /// ISO A4 portrait, 210 x 297 mm.
    pub fn a4() -> Self {
        Self::new(Emu::from_mm(210.0), Emu::from_mm(297.0))
    }

    /// Sets the margins and returns the updated page.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Width left between the side margins.
    pub fn usable_width(&self) -> Emu {
        self.width - self.margins.left - self.margins.right
    }

    /// Height left between the top and bottom margins.
    pub fn usable_height(&self) -> Emu {
        self.height - self.margins.top - self.margins.bottom
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.width.is_positive() || !self.height.is_positive() {
            return Err(ConfigError::NonPositivePage {
                width: self.width,
                height: self.height,
            });
        }
        let Margins {
            top,
            right,
            bottom,
            left,
        } = self.margins;
        if [top, right, bottom, left].iter().any(|m| *m < Emu::ZERO) {
            return Err(ConfigError::NegativeMargin);
        }
        if !self.usable_width().is_positive() {
            return Err(ConfigError::MarginsExceedWidth {
                width: self.width,
                margins: left + right,
            });
        }
        if !self.usable_height().is_positive() {
            return Err(ConfigError::MarginsExceedHeight {
                height: self.height,
                margins: top + bottom,
            });
        }
        Ok(())
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::a4()
    }
}

/// Number of label rows and columns on each page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    pub rows: u32,
    pub columns: u32,
}

impl GridSpec {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Cells per page.
    pub fn labels_per_page(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::ZeroRows);
        }
        if self.columns == 0 {
            return Err(ConfigError::ZeroColumns);
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::new(8, 4)
    }
}

/// What to do with the EMUs left over when the usable area does not divide evenly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemainderPolicy {
    /// Leave the remainder unused after the last row/column.
    #[default]
    Absorb,
    /// Give one extra EMU to each leading row/column until the remainder is used up.
    Distribute,
}

/// Resolved cell dimensions shared by every cell in a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellGeometry {
    cell_width: Emu,
    cell_height: Emu,
    image_size: Emu,
    caption_height: Emu,
    width_remainder: Emu,
    height_remainder: Emu,
    vertical_overshoot: Emu,
}

impl CellGeometry {
    /// Base cell width.
    pub fn cell_width(&self) -> Emu {
        self.cell_width
    }

    /// Base cell (row) height.
    pub fn cell_height(&self) -> Emu {
        self.cell_height
    }

    /// Side length of the square image placed in each cell.
    pub fn image_size(&self) -> Emu {
        self.image_size
    }

    /// Vertical space reserved for the caption line.
    pub fn caption_height(&self) -> Emu {
        self.caption_height
    }

    /// Width of the column at `index`, including any distributed remainder.
    pub fn column_width(&self, index: u32) -> Emu {
        if i64::from(index) < self.width_remainder.get() {
            self.cell_width + Emu(1)
        } else {
            self.cell_width
        }
    }

    /// Height of the row at `index`, including any distributed remainder.
    pub fn row_height(&self, index: u32) -> Emu {
        if i64::from(index) < self.height_remainder.get() {
            self.cell_height + Emu(1)
        } else {
            self.cell_height
        }
    }

    /// How far the rows extend past the printable height; negative when they fall short.
    pub fn vertical_overshoot(&self) -> Emu {
        self.vertical_overshoot
    }
}

/// Computes the shared cell geometry for `page` split into `grid`.
///
/// `fixed_cell_height` overrides the even split of the usable height, for label stock with a
/// predefined row pitch.  Configuration problems are reported before anything is laid out.
pub fn resolve(
    page: &PageSpec,
    grid: &GridSpec,
    fixed_cell_height: Option<Emu>,
    caption_font_size: u8,
    policy: RemainderPolicy,
) -> Result<CellGeometry, ConfigError> {
    grid.validate()?;
    page.validate()?;
    if caption_font_size == 0 {
        return Err(ConfigError::ZeroCaptionFontSize);
    }

    let usable_width = page.usable_width();
    let usable_height = page.usable_height();

    let (cell_width, width_rest) = usable_width.split(grid.columns);
    let (cell_height, height_rest) = match fixed_cell_height {
        Some(height) if !height.is_positive() => {
            return Err(ConfigError::NonPositiveCellHeight(height))
        }
        Some(height) => (height, Emu::ZERO),
        None => usable_height.split(grid.rows),
    };

    let caption_height = Emu::from_points(i64::from(caption_font_size) + CAPTION_LEADING_POINTS);
    let fitted = (cell_width - IMAGE_EPSILON).min(cell_height - caption_height - IMAGE_EPSILON);
    let image_size = fitted.max(MIN_IMAGE_SIZE);

    if image_size > cell_width || image_size > cell_height - caption_height {
        return Err(ConfigError::CellTooSmall {
            cell_width,
            cell_height,
            caption_height,
        });
    }

    let (width_remainder, height_remainder) = match policy {
        RemainderPolicy::Absorb => (Emu::ZERO, Emu::ZERO),
        RemainderPolicy::Distribute => (width_rest, height_rest),
    };
    let vertical_overshoot = cell_height
        .checked_mul(i64::from(grid.rows))
        .and_then(|rows_height| rows_height.checked_add(height_remainder))
        .map(|rows_height| rows_height - usable_height)
        .ok_or(ConfigError::CellHeightTooLarge(cell_height))?;

    if vertical_overshoot.is_positive() {
        warn!(
            "{} rows of {} overrun the printable height {} by {}",
            grid.rows, cell_height, usable_height, vertical_overshoot
        );
    }

    let geometry = CellGeometry {
        cell_width,
        cell_height,
        image_size,
        caption_height,
        width_remainder,
        height_remainder,
        vertical_overshoot,
    };
    debug!(
        "resolved {}x{} grid: cell {} x {}, image {}, caption {}",
        grid.rows, grid.columns, cell_width, cell_height, image_size, caption_height
    );
    Ok(geometry)
}
