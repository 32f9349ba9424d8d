//! Output rendering for parsed workbooks.
//!
//! # Example
//!
//! ```no_run
//! use cfgrid::{parse_file, render::*};
//!
//! let parsed = parse_file("report.xlsx")?;
//!
//! // Aligned text table per sheet
//! print!("{}", render_file(&parsed));
//!
//! // JSON
//! let json = to_json(&parsed, JsonFormat::Pretty)?;
//! # Ok::<(), cfgrid::Error>(())
//! ```

mod json;
mod text;

pub use json::{report_to_json, to_json, JsonFormat};
pub use text::{cell_label, render_file, render_sheet};
