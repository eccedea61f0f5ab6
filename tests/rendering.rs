use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma, Rgba};
use qr_label_sheet::fonts;
use qr_label_sheet::pdf::PdfWriter;
use qr_label_sheet::{ImageSource, LabelItem, LabelSheet, SheetConfig};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "no font family found. Set QR_LABEL_SHEET_FONTS_DIR or install Liberation Sans.";

/// A 25x25 module pattern with finder-like corners, close enough to a QR code for layout tests.
fn qr_like_png(seed: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(100, 100, |x, y| {
        let (mx, my) = (x / 4, y / 4);
        let finder = |cx: u32, cy: u32| mx.wrapping_sub(cx) < 7 && my.wrapping_sub(cy) < 7;
        let dark = if finder(0, 0) || finder(18, 0) || finder(0, 18) {
            true
        } else {
            (mx * 31 + my * 17 + seed) % 3 == 0
        };
        Luma([if dark { 0u8 } else { 255 }])
    });
    encode(DynamicImage::ImageLuma8(buffer))
}

fn translucent_png() -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(40, 40, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 0 };
        Rgba([0u8, 0, 0, alpha])
    });
    encode(DynamicImage::ImageRgba8(buffer))
}

fn encode(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("encode png");
    bytes
}

fn labels(count: u32) -> Vec<LabelItem> {
    (1..=count)
        .map(|i| {
            LabelItem::new(
                format!("BIN-{i:03}"),
                ImageSource::from_bytes(qr_like_png(i)),
            )
        })
        .collect()
}

fn render(sheet: &LabelSheet, items: &[LabelItem]) -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }
    let mut writer = PdfWriter::new()
        .expect("fonts are available")
        .with_title("Label test");
    sheet.compose(items, &mut writer).expect("layout");
    Some(writer.render().expect("render pdf").bytes)
}

fn page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes)
        .expect("parse rendered pdf")
        .get_pages()
        .len()
}

/// Text-showing and XObject-drawing operators on each page, in page order.
fn drawn_per_page(bytes: &[u8]) -> Vec<(usize, usize)> {
    let document = lopdf::Document::load_mem(bytes).expect("parse rendered pdf");
    document
        .get_pages()
        .values()
        .map(|page_id| {
            let content = document
                .get_page_content(*page_id)
                .expect("page content stream");
            let operations = lopdf::content::Content::decode(&content)
                .expect("decode page content")
                .operations;
            let text = operations
                .iter()
                .filter(|op| op.operator == "Tj" || op.operator == "TJ")
                .count();
            let images = operations.iter().filter(|op| op.operator == "Do").count();
            (text, images)
        })
        .collect()
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn partial_sheet_renders_one_page() {
    let sheet = LabelSheet::new(SheetConfig::default()).expect("valid");
    let Some(bytes) = render(&sheet, &labels(17)) else {
        eprintln!("Skipping partial_sheet_renders_one_page: {}", SKIP_HINT);
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn full_pages_do_not_leave_a_trailing_blank_page() {
    let sheet = LabelSheet::new(SheetConfig::new().with_grid(2, 2)).expect("valid");
    let Some(bytes) = render(&sheet, &labels(8)) else {
        eprintln!(
            "Skipping full_pages_do_not_leave_a_trailing_blank_page: {}",
            SKIP_HINT
        );
        return;
    };
    assert_eq!(page_count(&bytes), 2);
}

#[test]
fn overflow_starts_a_new_page() {
    let sheet = LabelSheet::new(SheetConfig::new().with_grid(2, 2)).expect("valid");
    let Some(bytes) = render(&sheet, &labels(9)) else {
        eprintln!("Skipping overflow_starts_a_new_page: {}", SKIP_HINT);
        return;
    };
    assert_eq!(page_count(&bytes), 3);
}

#[test]
fn degraded_and_translucent_images_still_render() {
    let sheet = LabelSheet::new(SheetConfig::default()).expect("valid");
    let mut items = labels(3);
    items.push(LabelItem::new(
        "BIN-ALPHA",
        ImageSource::from_bytes(translucent_png()),
    ));
    items.push(LabelItem::new(
        "BIN-BROKEN",
        ImageSource::from_bytes(b"not a png".to_vec()),
    ));

    if !fonts::default_fonts_available() {
        eprintln!(
            "Skipping degraded_and_translucent_images_still_render: {}",
            SKIP_HINT
        );
        return;
    }
    let mut writer = PdfWriter::new().expect("fonts are available");
    let report = sheet.compose(&items, &mut writer).expect("layout");
    assert_eq!(report.degraded.len(), 1);
    assert_eq!(report.degraded[0].identifier, "BIN-BROKEN");

    let bytes = writer.render().expect("render pdf").bytes;
    assert_eq!(page_count(&bytes), 1);
    assert_eq!(drawn_per_page(&bytes), vec![(5, 4)]);
}

#[test]
fn every_occupied_cell_gets_image_and_caption() {
    let sheet = LabelSheet::new(SheetConfig::new().with_grid(2, 2)).expect("valid");
    let Some(bytes) = render(&sheet, &labels(5)) else {
        eprintln!(
            "Skipping every_occupied_cell_gets_image_and_caption: {}",
            SKIP_HINT
        );
        return;
    };
    assert_eq!(drawn_per_page(&bytes), vec![(4, 4), (1, 1)]);
}

#[test]
fn captions_wider_than_the_cell_are_still_drawn() {
    let sheet = LabelSheet::new(SheetConfig::new().with_grid(8, 10)).expect("valid");
    let items = vec![
        LabelItem::new("A1", ImageSource::from_bytes(qr_like_png(1))),
        LabelItem::new(
            "WAREHOUSE-SHELF-0001-BIN-0042",
            ImageSource::from_bytes(qr_like_png(2)),
        ),
        LabelItem::new(
            "WAREHOUSE SHELF 0001 BIN 0042 AISLE 7",
            ImageSource::from_bytes(qr_like_png(3)),
        ),
    ];

    if !fonts::default_fonts_available() {
        eprintln!(
            "Skipping captions_wider_than_the_cell_are_still_drawn: {}",
            SKIP_HINT
        );
        return;
    }
    let mut writer = PdfWriter::new().expect("fonts are available");
    let report = sheet.compose(&items, &mut writer).expect("layout");
    assert!(report
        .degraded
        .iter()
        .all(|label| label.identifier.starts_with("WAREHOUSE")));

    let bytes = writer.render().expect("render pdf").bytes;
    assert_eq!(drawn_per_page(&bytes), vec![(3, 3)]);
}

#[test]
fn rendering_is_deterministic() {
    let sheet = LabelSheet::new(SheetConfig::default()).expect("valid");
    let items = labels(40);
    let Some(bytes_a) = render(&sheet, &items) else {
        eprintln!("Skipping rendering_is_deterministic: {}", SKIP_HINT);
        return;
    };
    let Some(bytes_b) = render(&sheet, &items) else {
        eprintln!("Skipping rendering_is_deterministic: {}", SKIP_HINT);
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}
