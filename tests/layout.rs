use std::fs;

use qr_label_sheet::writer::{CellContent, FlowNode};
use qr_label_sheet::{
    build_sheet, layout_labels, ConfigError, DocumentWriter, Emu, FlowDocument, GridSpec,
    ImageSource, LabelError, LabelItem, LabelSheet, PageSpec, SheetConfig,
};

fn labels(count: usize) -> Vec<LabelItem> {
    (1..=count)
        .map(|i| {
            LabelItem::new(
                format!("QR-{i:04}"),
                ImageSource::from_bytes(vec![0x89, b'P', b'N', b'G']),
            )
        })
        .collect()
}

fn default_sheet() -> LabelSheet {
    LabelSheet::new(SheetConfig::default()).expect("default configuration is valid")
}

#[test]
fn partial_page_fills_row_major_and_leaves_the_rest_empty() {
    let items = labels(17);
    let mut document = FlowDocument::new();
    let report = default_sheet()
        .compose(&items, &mut document)
        .expect("layout");

    assert_eq!(report.pages, 1);
    assert_eq!(report.items, 17);
    assert!(report.is_complete());
    assert_eq!(document.page_breaks(), 0);

    let grids: Vec<_> = document.grids().collect();
    assert_eq!(grids.len(), 1);
    let grid = grids[0];
    assert_eq!((grid.rows(), grid.columns()), (8, 4));

    let expected: Vec<String> = (1..=17).map(|i| format!("QR-{i:04}")).collect();
    assert_eq!(grid.captions(), expected);
    assert_eq!(grid.occupied_cells(), 17);
    assert_eq!(grid.cells().filter(|cell| cell.is_empty()).count(), 15);

    // Item 17 lands in row 5, column 1.
    let last = grid.cell(4, 0).expect("cell exists");
    assert!(matches!(
        last.last(),
        Some(CellContent::Caption { text, .. }) if text == "QR-0017"
    ));
    assert!(grid.cell(4, 1).expect("cell exists").is_empty());
}

#[test]
fn full_pages_are_separated_by_a_single_break() {
    let items = labels(64);
    let mut document = FlowDocument::new();
    let report = default_sheet()
        .compose(&items, &mut document)
        .expect("layout");

    assert_eq!(report.pages, 2);
    assert_eq!(document.grids().count(), 2);
    assert_eq!(document.page_breaks(), 1);
    assert_eq!(document.page_count(), 2);
    assert!(matches!(document.nodes().last(), Some(FlowNode::Grid(_))));
    for grid in document.grids() {
        assert_eq!(grid.occupied_cells(), 32);
    }

    let second = document.grids().nth(1).expect("second grid");
    assert_eq!(second.captions().first().copied(), Some("QR-0033"));
    assert_eq!(second.captions().last().copied(), Some("QR-0064"));
}

#[test]
fn missing_image_keeps_caption_and_build_succeeds() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut items = labels(3);
    items[1] = LabelItem::new(
        "QR-0002",
        ImageSource::from_path(dir.path().join("QR-0002.png")),
    );
    let output = dir.path().join("sheet.txt");

    let mut document = FlowDocument::new();
    let report = build_sheet(SheetConfig::default(), &items, &mut document, &output)
        .expect("missing artifact is not fatal");

    assert_eq!(report.items, 3);
    assert_eq!(report.degraded.len(), 1);
    assert_eq!(report.degraded[0].identifier, "QR-0002");

    let grid = document.grids().next().expect("grid");
    assert_eq!(
        grid.cell(0, 1).expect("cell exists"),
        &[CellContent::Caption {
            text: "QR-0002".into(),
            font_size: 8
        }][..]
    );
    assert_eq!(grid.cell(0, 0).map(<[_]>::len), Some(2));
    assert!(output.is_file());
}

#[test]
fn zero_rows_fail_before_the_document_is_touched() {
    let mut document = FlowDocument::new();
    let pristine = document.clone();

    let err = build_sheet(
        SheetConfig::new().with_grid(0, 4),
        &labels(5),
        &mut document,
        "unused.txt",
    )
    .expect_err("zero rows");
    assert!(matches!(err, LabelError::Configuration(ConfigError::ZeroRows)));
    assert_eq!(document, pristine);

    let geometry = default_sheet().geometry().to_owned();
    let err = layout_labels(
        &labels(5),
        &PageSpec::a4(),
        &GridSpec::new(0, 4),
        &geometry,
        8,
        &mut document,
    )
    .expect_err("zero rows");
    assert_eq!(err, ConfigError::ZeroRows);
    assert_eq!(document, pristine);
}

#[test]
fn layout_is_idempotent_for_identical_input() {
    let items = labels(41);
    let sheet = default_sheet();

    let mut first = FlowDocument::new();
    let mut second = FlowDocument::new();
    let report_a = sheet.compose(&items, &mut first).expect("layout");
    let report_b = sheet.compose(&items, &mut second).expect("layout");

    assert_eq!(report_a, report_b);
    assert_eq!(first, second);
    assert_eq!(first.outline(), second.outline());
}

#[test]
fn no_blank_top_level_paragraph_survives() {
    for count in [0, 1, 32, 33] {
        let mut document = FlowDocument::new();
        document.append_paragraph("  ");
        let report = default_sheet()
            .compose(&labels(count), &mut document)
            .expect("layout");

        assert_eq!(report.pruned_paragraphs, 2);
        assert!(document.blank_paragraphs().is_empty());
        assert!(document
            .nodes()
            .all(|node| !matches!(node, FlowNode::Paragraph(_))));
    }
}

#[test]
fn page_count_is_ceiling_of_items_over_capacity() {
    let sheet = LabelSheet::new(SheetConfig::new().with_grid(3, 2)).expect("valid");
    for (count, pages) in [(1, 1), (5, 1), (6, 1), (7, 2), (12, 2), (13, 3), (60, 10)] {
        let mut document = FlowDocument::new();
        let report = sheet.compose(&labels(count), &mut document).expect("layout");
        assert_eq!(report.pages, pages, "{count} labels");
        assert_eq!(document.grids().count(), pages, "{count} labels");
        assert_eq!(document.page_breaks(), pages - 1, "{count} labels");
    }
}

#[test]
fn empty_input_produces_an_empty_document() {
    let mut document = FlowDocument::new();
    let report = default_sheet().compose(&[], &mut document).expect("layout");

    assert_eq!(report.pages, 0);
    assert_eq!(document.nodes().count(), 0);
    assert!(document.page_setup().is_some());
}

#[test]
fn every_grid_uses_the_resolved_geometry() {
    let config = SheetConfig::new()
        .with_grid(5, 3)
        .with_fixed_cell_height(Emu::from_cm(5.0));
    let sheet = LabelSheet::new(config).expect("valid");
    let mut document = FlowDocument::new();
    sheet.compose(&labels(20), &mut document).expect("layout");

    let geometry = sheet.geometry();
    for grid in document.grids() {
        assert!(grid
            .row_heights()
            .iter()
            .all(|height| *height == Emu::from_cm(5.0)));
        for (index, width) in grid.column_widths().iter().enumerate() {
            assert_eq!(*width, geometry.column_width(index as u32));
        }
        for cell in grid.cells() {
            for content in cell {
                if let CellContent::Image { size } = content {
                    assert_eq!(*size, geometry.image_size());
                }
            }
        }
    }
}

#[test]
fn outline_is_saved_to_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("labels.txt");
    let mut document = FlowDocument::new();

    default_sheet()
        .build(&labels(2), &mut document, &output)
        .expect("build");

    let saved = fs::read_to_string(&output).expect("outline written");
    assert_eq!(saved, document.outline());
    assert!(saved.starts_with("page 210.00mm x 297.00mm"));
    assert!(saved.contains("grid 8x4"));
    assert!(saved.contains("caption \"QR-0002\" 8pt"));
    assert!(!saved.contains("paragraph"));
}

#[test]
fn unwritable_output_is_a_persistence_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("missing").join("labels.txt");
    let mut document = FlowDocument::new();

    let err = default_sheet()
        .build(&labels(2), &mut document, &output)
        .expect_err("parent directory does not exist");

    match err {
        LabelError::Persistence(err) => assert_eq!(err.path(), output.as_path()),
        other => panic!("unexpected error: {other}"),
    }
}
