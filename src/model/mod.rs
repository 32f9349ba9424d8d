//! Grid model for parsed worksheets.
//!
//! Parsers turn worksheet XML into these structures, the conditional-format
//! engine stamps colors onto them, and the writer turns them back into a
//! package.

mod cell;
mod grid;

pub use cell::*;
pub use grid::*;
