//! Parsing options.

use crate::color::HexDecoding;
use crate::conditional::ConflictPolicy;
use crate::error::{Error, Result};
use crate::range::{AxisSpan, ColumnLetters, RangeGrammar};
use crate::xlsx::CellPlacement;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling how a workbook is read and colored.
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes:
///
/// ```
/// use cfgrid::{ConflictPolicy, ParseOptions};
///
/// let options = ParseOptions::from_json_str(r#"{"conflict_policy": "first_applied"}"#)?;
/// assert_eq!(options.conflict_policy, ConflictPolicy::FirstApplied);
/// assert!(!options.read_cell_fills);
/// # Ok::<(), cfgrid::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// How `rgb` hex strings become channels
    pub hex_decoding: HexDecoding,

    /// How `sqref` tokens are read
    #[serde(flatten)]
    pub range: RangeGrammar,

    /// Which rule keeps a cell that several rules match
    pub conflict_policy: ConflictPolicy,

    /// Where rows and cells land in the grid
    pub cell_placement: CellPlacement,

    /// Seed cell colors from their direct solid fills before conditional
    /// formatting runs
    pub read_cell_fills: bool,

    /// Run conditional formatting; when off, cells keep their base color
    pub conditional_formatting: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            hex_decoding: HexDecoding::default(),
            range: RangeGrammar::default(),
            conflict_policy: ConflictPolicy::default(),
            cell_placement: CellPlacement::default(),
            read_cell_fills: false,
            conditional_formatting: true,
        }
    }
}

impl ParseOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hex decoding.
    pub fn with_hex_decoding(mut self, decoding: HexDecoding) -> Self {
        self.hex_decoding = decoding;
        self
    }

    /// Set how column-only and row-only range sides span the grid.
    pub fn with_axis_span(mut self, span: AxisSpan) -> Self {
        self.range.axis_span = span;
        self
    }

    /// Set the column letter numbering.
    pub fn with_column_letters(mut self, letters: ColumnLetters) -> Self {
        self.range.column_letters = letters;
        self
    }

    /// Set the conflict policy.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Set the cell placement.
    pub fn with_cell_placement(mut self, placement: CellPlacement) -> Self {
        self.cell_placement = placement;
        self
    }

    /// Enable or disable reading direct cell fills.
    pub fn with_cell_fills(mut self, enabled: bool) -> Self {
        self.read_cell_fills = enabled;
        self
    }

    /// Enable or disable conditional formatting.
    pub fn with_conditional_formatting(mut self, enabled: bool) -> Self {
        self.conditional_formatting = enabled;
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
