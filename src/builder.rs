//! Construction of `genpdf` documents matching a label sheet's page setup.

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style;
use genpdf::{self, Margins, PageDecorator, Size};

use crate::elements::mm_from_emu;
use crate::geometry::PageSpec;

/// Default document title embedded in the PDF metadata.
pub const DEFAULT_TITLE: &str = "QR labels";

/// Builder for `genpdf::Document` instances sized for a label sheet.
#[derive(Default)]
pub struct DocumentBuilder {
    page: Option<PageSpec>,
    title: Option<String>,
}

impl DocumentBuilder {
    /// Creates a new builder using A4 without margins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size and the margins applied to every page.
    pub fn with_page(mut self, page: PageSpec) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builds a `genpdf::Document` that renders with `font_family`.
    pub fn build(self, font_family: FontFamily<FontData>) -> genpdf::Document {
        let page = self.page.unwrap_or_default();
        let mut document = genpdf::Document::new(font_family);

        document.set_paper_size(Size::new(
            mm_from_emu(page.width),
            mm_from_emu(page.height),
        ));
        document.set_title(self.title.as_deref().unwrap_or(DEFAULT_TITLE));
        document.set_minimal_conformance();
        document.set_line_spacing(1.0);
        document.set_page_decorator(MarginDecorator::new(page));

        document
    }
}

/// Page decorator that insets every page by the sheet margins.
struct MarginDecorator {
    page: usize,
    margins: Margins,
}

impl MarginDecorator {
    fn new(page: PageSpec) -> Self {
        let m = page.margins;
        Self {
            page: 0,
            margins: Margins::trbl(
                mm_from_emu(m.top),
                mm_from_emu(m.right),
                mm_from_emu(m.bottom),
                mm_from_emu(m.left),
            ),
        }
    }
}

impl PageDecorator for MarginDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        log::trace!("starting PDF page {}", self.page);
        area.add_margins(self.margins);
        Ok(area)
    }
}
