//! Sheet configuration with the defaults used for A4 8 x 4 QR label stock.

use crate::error::ConfigError;
use crate::geometry::{self, CellGeometry, GridSpec, Margins, PageSpec, RemainderPolicy};
use crate::units::Emu;

/// Default caption size in points.
pub const DEFAULT_CAPTION_FONT_SIZE: u8 = 8;

/// Physical layout of a label sheet.
///
/// Values are plain data so several sheets with different layouts can be built side by side.
/// [`SheetConfig::resolve`] validates the combination and computes the shared cell geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetConfig {
    page: PageSpec,
    grid: GridSpec,
    fixed_cell_height: Option<Emu>,
    caption_font_size: u8,
    remainder_policy: RemainderPolicy,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            page: PageSpec::a4().with_margins(default_margins()),
            grid: GridSpec::default(),
            fixed_cell_height: None,
            caption_font_size: DEFAULT_CAPTION_FONT_SIZE,
            remainder_policy: RemainderPolicy::Absorb,
        }
    }
}

/// 0.8 cm top and bottom, 0.7 cm on the sides.
pub fn default_margins() -> Margins {
    Margins::trbl(
        Emu::from_cm(0.8),
        Emu::from_cm(0.7),
        Emu::from_cm(0.8),
        Emu::from_cm(0.7),
    )
}

impl SheetConfig {
    /// Creates a configuration with the default A4 8 x 4 layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size and margins.
    pub fn with_page(mut self, page: PageSpec) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size, keeping the current margins.
    pub fn with_page_size(mut self, width: Emu, height: Emu) -> Self {
        self.page.width = width;
        self.page.height = height;
        self
    }

    /// Sets the page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.page.margins = margins;
        self
    }

    /// Sets the number of label rows and columns per page.
    pub fn with_grid(mut self, rows: u32, columns: u32) -> Self {
        self.grid = GridSpec::new(rows, columns);
        self
    }

    /// Forces every row to the given height instead of splitting the usable height evenly.
    pub fn with_fixed_cell_height(mut self, height: impl Into<Option<Emu>>) -> Self {
        self.fixed_cell_height = height.into();
        self
    }

    /// Sets the caption font size in points.
    pub fn with_caption_font_size(mut self, points: u8) -> Self {
        self.caption_font_size = points;
        self
    }

    /// Sets how division remainders are handled.
    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder_policy = policy;
        self
    }

    pub fn page(&self) -> &PageSpec {
        &self.page
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn fixed_cell_height(&self) -> Option<Emu> {
        self.fixed_cell_height
    }

    pub fn caption_font_size(&self) -> u8 {
        self.caption_font_size
    }

    pub fn remainder_policy(&self) -> RemainderPolicy {
        self.remainder_policy
    }

    /// Validates the configuration and computes the cell geometry.
    pub fn resolve(&self) -> Result<CellGeometry, ConfigError> {
        geometry::resolve(
            &self.page,
            &self.grid,
            self.fixed_cell_height,
            self.caption_font_size,
            self.remainder_policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a4_eight_by_four() {
        let config = SheetConfig::default();
        assert_eq!(config.grid().labels_per_page(), 32);
        assert_eq!(config.page().width, Emu::from_mm(210.0));
        assert_eq!(config.page().height, Emu::from_mm(297.0));
        assert_eq!(config.caption_font_size(), 8);
        assert_eq!(config.fixed_cell_height(), None);
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn builders_replace_individual_fields() {
        let config = SheetConfig::new()
            .with_grid(10, 3)
            .with_fixed_cell_height(Emu::from_cm(2.5))
            .with_caption_font_size(6)
            .with_remainder_policy(RemainderPolicy::Distribute);

        assert_eq!(config.grid(), &GridSpec::new(10, 3));
        assert_eq!(config.fixed_cell_height(), Some(Emu::from_cm(2.5)));
        assert_eq!(config.page().margins, default_margins());
        assert_eq!(config.remainder_policy(), RemainderPolicy::Distribute);
    }

    #[test]
    fn resolve_surfaces_configuration_errors() {
        let config = SheetConfig::new().with_grid(0, 4);
        assert_eq!(config.resolve(), Err(ConfigError::ZeroRows));
    }
}
