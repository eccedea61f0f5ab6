//! `genpdf` elements that draw label sheets.
//!
//! This module holds the image decoding helpers used when labels are inserted into a PDF and the
//! custom elements that place a fixed-size grid of labels on a page.  `genpdf` has no notion of
//! fixed row heights, so [`LabelGrid`] positions every cell itself.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, Rgba};

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::fonts::FontCache;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

use crate::units::Emu;
use crate::writer::CaptionFit;

/// Resolution assumed for bitmaps when computing their natural print size.
const DEFAULT_IMAGE_DPI: f64 = 300.0;

/// Smallest point size a caption is shrunk to before it is allowed to overflow its cell.
pub const MIN_CAPTION_FONT_SIZE: u8 = 4;

pub(crate) fn mm_from_emu(value: Emu) -> Mm {
    Mm::from(value.to_mm())
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode label image")
}

/// Composites images with an alpha channel onto white; PDF images here are opaque.
pub fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }
    let rgba = image.to_rgba8();
    let rgb = ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(rgb)
}

/// Builds a centered `genpdf` image scaled to a `side` x `side` square.
pub fn square_image(image: DynamicImage, side: Emu) -> Result<Image, Error> {
    let (px_width, px_height) = image.dimensions();
    let mut element = Image::from_dynamic_image(image)?;
    if px_width > 0 && px_height > 0 {
        let side_inches = side.to_inches();
        element.set_scale(Scale::new(
            side_inches * DEFAULT_IMAGE_DPI / f64::from(px_width),
            side_inches * DEFAULT_IMAGE_DPI / f64::from(px_height),
        ));
    }
    element.set_alignment(Alignment::Center);
    Ok(element)
}

/// Picks the point size for a single-line caption no wider than `max_width`.
///
/// Sizes from `font_size` down to [`MIN_CAPTION_FONT_SIZE`] are tried in order; when none fits
/// the minimum is returned together with [`CaptionFit::Overflow`].
pub fn fit_caption(
    font_cache: &FontCache,
    text: &str,
    font_size: u8,
    max_width: Mm,
) -> (u8, CaptionFit) {
    let fits = |size: u8| {
        StyledString::new(text, Style::new().with_font_size(size)).width(font_cache) <= max_width
    };
    if fits(font_size) {
        return (font_size, CaptionFit::Exact);
    }
    let floor = MIN_CAPTION_FONT_SIZE.min(font_size);
    match (floor..font_size).rev().find(|size| fits(*size)) {
        Some(size) => (size, CaptionFit::Shrunk(size)),
        None => (floor, CaptionFit::Overflow),
    }
}

/// Content of one occupied grid cell.
pub struct LabelCell {
    image: Option<(Image, Mm)>,
    caption: Option<StyledString>,
}

impl LabelCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self {
            image: None,
            caption: None,
        }
    }

    /// Sets the square image and its side length.
    pub fn with_image(mut self, image: Image, side: Mm) -> Self {
        self.image = Some((image, side));
        self
    }

    /// Sets the caption, printed on one line exactly as given.
    pub fn with_caption(mut self, text: impl Into<String>, font_size: u8) -> Self {
        self.caption = Some(StyledString::new(
            text.into(),
            Style::new().with_font_size(font_size),
        ));
        self
    }

    /// Renders the image and caption as one block centered inside `area`.
    ///
    /// The caption is never wrapped: a caption wider than the cell is centered on the cell and
    /// runs past its edges.  Returns `false` when the cell is too short for the caption line.
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<bool, Error> {
        let cell = area.size();
        let image_height = self
            .image
            .as_ref()
            .map(|(_, side)| *side)
            .unwrap_or_default();
        let caption = self.caption.as_ref().map(|caption| {
            let mut caption = caption.clone();
            caption.style = style.and(caption.style);
            let line_height = caption.style.line_height(&context.font_cache);
            (caption, line_height)
        });
        let caption_height = caption
            .as_ref()
            .map(|(_, line_height)| *line_height)
            .unwrap_or_default();

        let free = cell.height - image_height - caption_height;
        let top = if free > Mm::default() {
            free / 2.0
        } else {
            Mm::default()
        };

        if let Some((image, side)) = &mut self.image {
            let mut image_area = area.clone();
            image_area.add_offset(Position::new(0, top));
            image_area.set_height(*side);
            image.render(context, image_area, style)?;
        }

        let Some((caption, line_height)) = caption else {
            return Ok(true);
        };
        let mut caption_top = top + image_height;
        if caption_top + line_height > cell.height {
            caption_top = cell.height - line_height;
        }
        if caption_top < Mm::default() {
            return Ok(false);
        }
        let x = (cell.width - caption.width(&context.font_cache)) / 2.0;
        match area.text_section(
            &context.font_cache,
            Position::new(x, caption_top),
            caption.style,
        ) {
            Some(mut section) => {
                section.print_str(&caption.s, caption.style)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for LabelCell {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed-layout grid of label cells drawn at the current position.
///
/// Column widths and row heights are exact; the grid is never split across pages and may extend
/// past the bottom margin when the rows are taller than the printable area.
pub struct LabelGrid {
    column_widths: Vec<Mm>,
    row_heights: Vec<Mm>,
    cells: Vec<Option<LabelCell>>,
    borders: bool,
}

impl LabelGrid {
    /// Creates an empty grid with the given column widths and row heights.
    pub fn new(column_widths: Vec<Mm>, row_heights: Vec<Mm>) -> Self {
        let cells = (0..column_widths.len() * row_heights.len())
            .map(|_| None)
            .collect();
        Self {
            column_widths,
            row_heights,
            cells,
            borders: false,
        }
    }

    /// Draws thin cut lines around every cell.
    pub fn with_borders(mut self, borders: bool) -> Self {
        self.borders = borders;
        self
    }

    /// Places `cell` at `row`, `column`; positions outside the grid are ignored.
    pub fn set_cell(&mut self, row: usize, column: usize, cell: LabelCell) {
        let columns = self.column_widths.len();
        if column < columns && row < self.row_heights.len() {
            self.cells[row * columns + column] = Some(cell);
        }
    }

    fn size(&self) -> Size {
        let width = self
            .column_widths
            .iter()
            .fold(Mm::default(), |total, w| total + *w);
        let height = self
            .row_heights
            .iter()
            .fold(Mm::default(), |total, h| total + *h);
        Size::new(width, height)
    }

    fn draw_borders(&self, area: render::Area<'_>) {
        let size = self.size();
        let mut y = Mm::default();
        for edge in std::iter::once(Mm::default()).chain(self.row_heights.iter().copied()) {
            y += edge;
            area.draw_line(
                vec![Position::new(0, y), Position::new(size.width, y)],
                Style::new(),
            );
        }
        let mut x = Mm::default();
        for edge in std::iter::once(Mm::default()).chain(self.column_widths.iter().copied()) {
            x += edge;
            area.draw_line(
                vec![Position::new(x, 0), Position::new(x, size.height)],
                Style::new(),
            );
        }
    }
}

impl Element for LabelGrid {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let columns = self.column_widths.len();
        let mut y = Mm::default();
        for (row, height) in self.row_heights.iter().enumerate() {
            let mut x = Mm::default();
            for (column, width) in self.column_widths.iter().enumerate() {
                if let Some(cell) = &mut self.cells[row * columns + column] {
                    let mut cell_area = area.clone();
                    cell_area.add_offset(Position::new(x, y));
                    cell_area.set_width(*width);
                    cell_area.set_height(*height);
                    if !cell.render(context, cell_area, style)? {
                        log::warn!(
                            "row {} is too short for its caption line; caption not drawn",
                            row + 1
                        );
                    }
                }
                x += *width;
            }
            y += *height;
        }

        if self.borders {
            self.draw_borders(area);
        }

        let mut result = RenderResult::default();
        result.size = self.size();
        Ok(result)
    }
}

/// Top-level content of a label sheet in document order.
pub enum SheetBlock {
    /// Body text outside the grids.
    Text(Paragraph),
    /// One page worth of labels.
    Grid(LabelGrid),
    /// Forced start of a new page.
    PageBreak,
}

/// Root element that lays out sheet blocks and only starts new pages at explicit breaks or
/// when body text runs out of room.
pub struct SheetFlow {
    blocks: Vec<SheetBlock>,
    next: usize,
}

impl SheetFlow {
    pub fn new(blocks: Vec<SheetBlock>) -> Self {
        Self { blocks, next: 0 }
    }
}

impl Element for SheetFlow {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        while let Some(block) = self.blocks.get_mut(self.next) {
            let block_result = match block {
                SheetBlock::PageBreak => {
                    self.next += 1;
                    result.has_more = true;
                    if result.size == Size::default() {
                        // A zero-sized page would abort rendering.
                        result.size = Size::new(1, 0);
                    }
                    return Ok(result);
                }
                SheetBlock::Text(paragraph) => paragraph.render(context, area.clone(), style)?,
                SheetBlock::Grid(grid) => grid.render(context, area.clone(), style)?,
            };

            area.add_offset(Position::new(0, block_result.size.height));
            result.size = result.size.stack_vertical(block_result.size);
            if block_result.has_more {
                result.has_more = true;
                return Ok(result);
            }
            self.next += 1;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_alpha_blends_onto_white() {
        let buffer = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0u8, 0, 0, 0])
            } else {
                Rgba([0u8, 0, 0, 255])
            }
        });
        let flattened = flatten_alpha(DynamicImage::ImageRgba8(buffer));
        let rgb = flattened.to_rgb8();

        assert!(!flattened.color().has_alpha());
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn opaque_images_pass_through() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(3, 3, Rgb([9u8, 9, 9])));
        let flattened = flatten_alpha(image.clone());
        assert_eq!(flattened.to_bytes(), image.to_bytes());
    }

    #[test]
    fn emu_converts_to_genpdf_millimetres() {
        assert_eq!(mm_from_emu(Emu::from_mm(49.0)), Mm::from(49.0));
        assert_eq!(mm_from_emu(Emu::ZERO), Mm::default());
    }

    #[test]
    fn captions_shrink_before_overflowing() {
        let Ok(family) = crate::fonts::default_font_family() else {
            eprintln!("Skipping captions_shrink_before_overflowing: no fonts available");
            return;
        };
        let cache = FontCache::new(family);
        let short = StyledString::new("A1", Style::new().with_font_size(8)).width(&cache);
        let long = "WAREHOUSE-SHELF-0001-BIN-0042";
        let long_at_8 = StyledString::new(long, Style::new().with_font_size(8)).width(&cache);

        assert_eq!(
            fit_caption(&cache, "A1", 8, short),
            (8, CaptionFit::Exact)
        );

        let (size, fit) = fit_caption(&cache, long, 8, long_at_8 - long_at_8 / 3.0);
        assert!(size < 8 && size >= MIN_CAPTION_FONT_SIZE);
        assert_eq!(fit, CaptionFit::Shrunk(size));
        let width = StyledString::new(long, Style::new().with_font_size(size)).width(&cache);
        assert!(width <= long_at_8 - long_at_8 / 3.0);

        assert_eq!(
            fit_caption(&cache, long, 8, short),
            (MIN_CAPTION_FONT_SIZE, CaptionFit::Overflow)
        );
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        assert!(decode_image_from_bytes([0u8, 1, 2, 3]).is_err());
    }
}
