//! # cfgrid
//!
//! Read XLSX worksheets into cell grids whose colors come from the
//! workbook's conditional formatting, and write such grids back.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cfgrid::{parse_file, Color};
//!
//! let parsed = parse_file("report.xlsx")?;
//! for sheet in &parsed.sheets {
//!     let red = sheet.grid.cells().filter(|(_, _, c)| c.color == Color::Red).count();
//!     println!("{}: {} red cells", sheet.name, red);
//! }
//!
//! // Write the first sheet's grid to a new workbook
//! cfgrid::write_grid("colored.xlsx", &parsed.sheets[0].grid)?;
//! # Ok::<(), cfgrid::Error>(())
//! ```
//!
//! ## Batch Scanning
//!
//! ```no_run
//! use cfgrid::{scan_dir, ParseOptions};
//!
//! let report = scan_dir("incoming", &ParseOptions::default())?;
//! for failure in &report.failed {
//!     eprintln!("{}: {}", failure.path.display(), failure.error);
//! }
//! # Ok::<(), cfgrid::Error>(())
//! ```
//!
//! ## Grid Alignment
//!
//! By default rows and cells are placed in document order, so a gap in the
//! source shifts later rows up and later cells left. Use
//! [`CellPlacement::Addressed`] to keep true spreadsheet coordinates.

pub mod batch;
pub mod color;
pub mod conditional;
pub mod container;
pub mod error;
pub mod model;
pub mod options;
pub mod range;
pub mod render;
pub mod writer;
pub mod xlsx;

// Re-exports
pub use batch::{scan_dir, BatchReport, FileFailure};
pub use color::{Color, HexDecoding, Palette, Rgb};
pub use conditional::{CfEngine, CfKind, CfRule, ConditionalFormatting, ConflictPolicy};
pub use container::Package;
pub use error::{Error, RangeError, Result};
pub use model::{Cell, Grid, GridRow, ParsedFile, Sheet};
pub use options::ParseOptions;
pub use range::{parse_cell_reference, parse_sqref, AxisSpan, ColumnLetters, RangeGrammar, SqrefRange};
pub use writer::{CellCoord, GridWriter, SpreadsheetSink, StyleId, XlsxSink};
pub use xlsx::{CellPlacement, XlsxParser};

use std::path::Path;

/// Parse every sheet of an XLSX file with default options.
///
/// # Example
///
/// ```no_run
/// let parsed = cfgrid::parse_file("report.xlsx")?;
/// println!("{} sheets", parsed.sheets.len());
/// # Ok::<(), cfgrid::Error>(())
/// ```
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParsedFile> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Parse every sheet of an XLSX file.
///
/// The package is read into memory and its file handle closed before any
/// part is parsed.
pub fn parse_file_with_options(path: impl AsRef<Path>, options: ParseOptions) -> Result<ParsedFile> {
    let path = path.as_ref();
    let sheets = XlsxParser::open_with_options(path, options)?.parse()?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ParsedFile {
        path: path.to_path_buf(),
        file_name,
        sheets,
    })
}

/// Parse every sheet of an XLSX package held in memory.
pub fn parse_bytes(data: &[u8], options: ParseOptions) -> Result<Vec<Sheet>> {
    XlsxParser::from_bytes(data.to_vec(), options)?.parse()
}

/// Write `grid` to a new workbook at `path`.
///
/// The file is written to a temporary path first and moved into place, so
/// a failed write leaves any existing file untouched.
///
/// # Example
///
/// ```no_run
/// use cfgrid::{Cell, Color, Grid};
///
/// let mut grid = Grid::new();
/// grid.set(0, 0, Cell::new("hello").with_color(Color::Green));
/// cfgrid::write_grid("hello.xlsx", &grid)?;
/// # Ok::<(), cfgrid::Error>(())
/// ```
pub fn write_grid(path: impl AsRef<Path>, grid: &Grid) -> Result<()> {
    writer::write(path, grid)
}

/// Write `grid` into `Sheet1` of an existing workbook, or a new one.
pub fn update_grid(path: impl AsRef<Path>, grid: &Grid) -> Result<()> {
    writer::update(path, grid)
}
