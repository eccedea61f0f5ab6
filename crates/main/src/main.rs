use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use qr_label_sheet::pdf::PdfWriter;
use qr_label_sheet::source;
use qr_label_sheet::{
    DocumentWriter, Emu, FlowDocument, LabelSheet, Margins, RemainderPolicy, SheetConfig,
};

/// Lays out a directory of QR code images as a printable label sheet.
///
/// PDF output needs a TrueType family: Roboto under `assets/fonts` (or the directory named by
/// `QR_LABEL_SHEET_FONTS_DIR`), or a system installation of Liberation Sans.
#[derive(Parser)]
#[command(author, version, about = "Grid label sheets for QR code images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a label sheet from the PNG files in a directory.
    Build(BuildArgs),

    /// Print the resolved cell geometry without building anything.
    Geometry(LayoutArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Directory holding one PNG per label; the file stem becomes the caption.
    #[arg(short, long, default_value = "qr_codes")]
    input: PathBuf,

    /// Output file.
    #[arg(short, long, default_value = "QR_All_8x4_A4final.pdf")]
    output: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Pdf)]
    format: Format,

    /// Draw cut lines around every cell (PDF only).
    #[arg(long)]
    borders: bool,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args)]
struct LayoutArgs {
    /// Label rows per page.
    #[arg(long, default_value_t = 8)]
    rows: u32,

    /// Label columns per page.
    #[arg(long, default_value_t = 4)]
    columns: u32,

    /// Page width in millimetres.
    #[arg(long, default_value_t = 210.0)]
    page_width_mm: f64,

    /// Page height in millimetres.
    #[arg(long, default_value_t = 297.0)]
    page_height_mm: f64,

    /// Top margin in centimetres.
    #[arg(long, default_value_t = 0.8)]
    margin_top_cm: f64,

    /// Bottom margin in centimetres.
    #[arg(long, default_value_t = 0.8)]
    margin_bottom_cm: f64,

    /// Left and right margin in centimetres.
    #[arg(long, default_value_t = 0.7)]
    margin_side_cm: f64,

    /// Fixed row height in centimetres for pre-cut label stock.
    #[arg(long)]
    cell_height_cm: Option<f64>,

    /// Caption font size in points.
    #[arg(long, default_value_t = 8)]
    caption_pt: u8,

    /// What to do with space left over by uneven division.
    #[arg(long, value_enum, default_value_t = Remainder::Absorb)]
    remainder: Remainder,
}

impl LayoutArgs {
    fn config(&self) -> SheetConfig {
        let side = Emu::from_cm(self.margin_side_cm);
        SheetConfig::new()
            .with_grid(self.rows, self.columns)
            .with_page_size(
                Emu::from_mm(self.page_width_mm),
                Emu::from_mm(self.page_height_mm),
            )
            .with_margins(Margins::trbl(
                Emu::from_cm(self.margin_top_cm),
                side,
                Emu::from_cm(self.margin_bottom_cm),
                side,
            ))
            .with_fixed_cell_height(self.cell_height_cm.map(Emu::from_cm))
            .with_caption_font_size(self.caption_pt)
            .with_remainder_policy(self.remainder.into())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pdf,
    Outline,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Remainder {
    Absorb,
    Distribute,
}

impl From<Remainder> for RemainderPolicy {
    fn from(value: Remainder) -> Self {
        match value {
            Remainder::Absorb => RemainderPolicy::Absorb,
            Remainder::Distribute => RemainderPolicy::Distribute,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build(args) => build(&args),
        Commands::Geometry(args) => geometry(&args),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn build(args: &BuildArgs) -> Result<(), Box<dyn Error>> {
    let sheet = LabelSheet::new(args.layout.config())?;
    let items = source::scan_directory(&args.input)?;
    info!(
        "building {} output for {} label(s)",
        match args.format {
            Format::Pdf => "PDF",
            Format::Outline => "outline",
        },
        items.len()
    );

    let mut writer: Box<dyn DocumentWriter> = match args.format {
        Format::Pdf => Box::new(PdfWriter::new()?.with_cell_borders(args.borders)),
        Format::Outline => Box::new(FlowDocument::new()),
    };
    let report = sheet.build(&items, writer.as_mut(), &args.output)?;

    println!("{}", report);
    if !report.is_complete() {
        println!(
            "{} label(s) printed incompletely",
            report.degraded.len()
        );
    }
    println!("Saved {}", args.output.display());
    Ok(())
}

fn geometry(args: &LayoutArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config();
    let sheet = LabelSheet::new(config)?;
    let geometry = sheet.geometry();
    let page = config.page();

    println!("usable area   {} x {}", page.usable_width(), page.usable_height());
    println!(
        "cell          {} x {}",
        geometry.cell_width(),
        geometry.cell_height()
    );
    println!("image         {}", geometry.image_size());
    println!("caption       {}", geometry.caption_height());
    if geometry.vertical_overshoot().is_positive() {
        println!(
            "rows overrun the printable height by {}",
            geometry.vertical_overshoot()
        );
    }
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
