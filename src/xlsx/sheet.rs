//! Worksheet parsing: cell grid and conditional-formatting blocks.
//!
//! With [`CellPlacement::DocumentOrder`], rows and cells land in the grid
//! in the order the XML lists them. Declared `r` attributes are ignored,
//! so a skipped row moves every later row up and a skipped cell moves every
//! later cell in that row left. Grid column N is therefore not necessarily
//! spreadsheet column N + 1. Callers that need true coordinates use
//! [`CellPlacement::Addressed`].

use super::shared_strings::SharedStrings;
use crate::conditional::{CfKind, CfRule, ConditionalFormatting};
use crate::error::{Error, Result};
use crate::model::{Cell, Grid, GridRow};
use crate::range::{parse_reference_with, ColumnLetters, RefPart};
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

/// Rows in a worksheet.
pub const MAX_ROWS: usize = 1_048_576;

/// Columns in a worksheet.
pub const MAX_COLS: usize = 16_384;

/// Where parsed rows and cells are placed in the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellPlacement {
    /// Physical document order; gaps collapse.
    #[default]
    DocumentOrder,
    /// Declared `r` attributes; gaps become empty slots.
    Addressed,
}

/// Everything read from one worksheet part.
#[derive(Debug, Clone, Default)]
pub struct WorksheetPart {
    pub grid: Grid,
    /// `(row, col, s)` for every cell that declared a style index
    pub cell_styles: Vec<(usize, usize, usize)>,
    pub conditional_formats: Vec<ConditionalFormatting>,
}

/// Attributes of the `<c>` element being read.
#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<usize>,
    raw: String,
    inline: String,
}

impl PendingCell {
    fn from_element(e: &BytesStart<'_>) -> Result<Self> {
        let mut cell = Self::default();
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"r" => cell.reference = Some(attr.unescape_value()?.into_owned()),
                b"t" => cell.cell_type = Some(attr.unescape_value()?.into_owned()),
                b"s" => cell.style = attr.unescape_value()?.trim().parse().ok(),
                _ => {}
            }
        }
        Ok(cell)
    }

    fn resolve(self, shared_strings: &SharedStrings) -> (Cell, Option<usize>) {
        let value = match self.cell_type.as_deref() {
            // An out-of-range or non-numeric index keeps the raw text.
            Some("s") => self
                .raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| shared_strings.get(idx))
                .map(str::to_string)
                .unwrap_or(self.raw),
            Some("inlineStr") if self.raw.is_empty() => self.inline,
            _ => self.raw,
        };
        let number = match self.cell_type.as_deref() {
            None | Some("n") => value.trim().parse::<i64>().ok(),
            _ => None,
        };
        let cell = Cell {
            value,
            number,
            ..Default::default()
        };
        (cell, self.style)
    }
}

/// Builds the grid row by row.
struct GridBuilder {
    placement: CellPlacement,
    grid: Grid,
    row: Option<GridRow>,
    cell_styles: Vec<(usize, usize, usize)>,
}

impl GridBuilder {
    fn new(placement: CellPlacement) -> Self {
        Self {
            placement,
            grid: Grid::new(),
            row: None,
            cell_styles: Vec::new(),
        }
    }

    fn start_row(&mut self, e: &BytesStart<'_>) -> Result<()> {
        if self.placement == CellPlacement::Addressed {
            let declared = attr(e, b"r")?.and_then(|r| r.trim().parse::<usize>().ok());
            if let Some(index) = declared.and_then(|r| r.checked_sub(1)) {
                if index >= MAX_ROWS {
                    return Err(Error::InvalidData(format!(
                        "row {} is beyond the last worksheet row",
                        index + 1
                    )));
                }
                // Rows never move backwards.
                while self.grid.rows.len() < index {
                    self.grid.push_row(Vec::new());
                }
            }
        }
        self.row = Some(Vec::new());
        Ok(())
    }

    fn end_row(&mut self) {
        if let Some(row) = self.row.take() {
            self.grid.push_row(row);
        }
    }

    fn push_cell(&mut self, pending: PendingCell, shared_strings: &SharedStrings) -> Result<()> {
        let declared_col = match (self.placement, pending.reference.as_deref()) {
            (CellPlacement::Addressed, Some(reference)) => {
                match parse_reference_with(reference, ColumnLetters::Bijective) {
                    Ok(RefPart::Cell { col, .. }) => Some(col),
                    _ => None,
                }
            }
            _ => None,
        };
        if declared_col.is_some_and(|col| col >= MAX_COLS) {
            return Err(Error::InvalidData(format!(
                "cell {} is beyond the last worksheet column",
                pending.reference.as_deref().unwrap_or_default()
            )));
        }

        let row_index = self.grid.rows.len();
        // A `<c>` outside any `<row>` still gets a row of its own.
        let row = self.row.get_or_insert_with(Vec::new);
        if let Some(col) = declared_col {
            if col > row.len() {
                row.resize(col, None);
            }
        }

        let (cell, style) = pending.resolve(shared_strings);
        if let Some(style) = style {
            self.cell_styles.push((row_index, row.len(), style));
        }
        row.push(Some(cell));
        Ok(())
    }

    fn finish(mut self) -> (Grid, Vec<(usize, usize, usize)>) {
        self.end_row();
        (self.grid, self.cell_styles)
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_rule(e: &BytesStart<'_>) -> Result<CfRule> {
    let kind = CfKind::from_type_name(attr(e, b"type")?.as_deref().unwrap_or_default());
    let dxf_id = attr(e, b"dxfId")?.and_then(|v| v.trim().parse::<u32>().ok());
    let priority = attr(e, b"priority")?
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let mut rule = CfRule::new(kind, dxf_id, priority);
    rule.text = attr(e, b"text")?;
    Ok(rule)
}

/// Parse a worksheet part.
pub fn parse_worksheet(
    xml: &str,
    shared_strings: &SharedStrings,
    placement: CellPlacement,
) -> Result<WorksheetPart> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut builder = GridBuilder::new(placement);
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    let mut conditional_formats = Vec::new();
    let mut block: Option<ConditionalFormatting> = None;
    let mut rule: Option<CfRule> = None;
    // x14 formatting in `<extLst>` uses inline dxfs and child sqrefs.
    let mut ext_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"extLst" => ext_depth += 1,
                _ if ext_depth > 0 => {}
                b"row" => builder.start_row(&e)?,
                b"c" => cell = Some(PendingCell::from_element(&e)?),
                b"v" if cell.is_some() => in_value = true,
                b"t" if cell.is_some() => in_inline_text = true,
                b"conditionalFormatting" => {
                    let sqref = attr(&e, b"sqref")?.unwrap_or_default();
                    block = Some(ConditionalFormatting::new(sqref, Vec::new()));
                }
                b"cfRule" if block.is_some() => rule = Some(parse_rule(&e)?),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                _ if ext_depth > 0 => {}
                b"row" => {
                    builder.start_row(&e)?;
                    builder.end_row();
                }
                b"c" => builder.push_cell(PendingCell::from_element(&e)?, shared_strings)?,
                b"cfRule" => {
                    if let Some(block) = block.as_mut() {
                        block.rules.push(parse_rule(&e)?);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_value || in_inline_text => {
                let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                if let Some(cell) = cell.as_mut() {
                    if in_value {
                        cell.raw.push_str(&text);
                    } else {
                        cell.inline.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"extLst" => ext_depth = ext_depth.saturating_sub(1),
                _ if ext_depth > 0 => {}
                b"row" => builder.end_row(),
                b"c" => {
                    if let Some(pending) = cell.take() {
                        builder.push_cell(pending, shared_strings)?;
                    }
                    in_value = false;
                    in_inline_text = false;
                }
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"cfRule" => {
                    if let (Some(block), Some(rule)) = (block.as_mut(), rule.take()) {
                        block.rules.push(rule);
                    }
                }
                b"conditionalFormatting" => {
                    if let Some(block) = block.take() {
                        conditional_formats.push(block);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let (grid, cell_styles) = builder.finish();
    Ok(WorksheetPart {
        grid,
        cell_styles,
        conditional_formats,
    })
}
