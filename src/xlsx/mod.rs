//! XLSX (Excel) workbook reading.
//!
//! This module reads the subset of Office Open XML spreadsheets needed to
//! rebuild a colored cell grid: values, shared strings, differential-format
//! fills and conditional-formatting rules.
//!
//! # Example
//!
//! ```no_run
//! use cfgrid::xlsx::XlsxParser;
//!
//! let parser = XlsxParser::open("report.xlsx")?;
//! for sheet in parser.parse()? {
//!     println!("{}: {} rows", sheet.name, sheet.grid.row_count());
//! }
//! # Ok::<(), cfgrid::Error>(())
//! ```

mod parser;
mod shared_strings;
mod sheet;
mod styles;
mod workbook;

pub use parser::XlsxParser;
pub use shared_strings::SharedStrings;
pub use sheet::{parse_worksheet, CellPlacement, WorksheetPart};
pub use styles::{DxfEntry, DxfTable, Styles};
pub use workbook::{RelationshipMap, SheetEntry, Workbook};
