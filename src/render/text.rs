//! Plain text renderer implementation.

use crate::model::{Cell, ParsedFile, Sheet};
use unicode_width::UnicodeWidthStr;

/// Text shown for one cell: its value, or its integer when the value is
/// empty, followed by `(color)` when it has one.
pub fn cell_label(cell: &Cell) -> String {
    let base = if !cell.value.is_empty() {
        cell.value.replace(['\n', '\r'], " ")
    } else {
        cell.number.map(|n| n.to_string()).unwrap_or_default()
    };
    if cell.color.is_none() {
        base
    } else {
        format!("{}({})", base, cell.color)
    }
}

/// Render a sheet as an aligned table, one grid row per line.
pub fn render_sheet(sheet: &Sheet) -> String {
    let mut output = format!("== {} ==\n", sheet.name);

    let labels: Vec<Vec<String>> = sheet
        .grid
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|slot| slot.as_ref().map(cell_label).unwrap_or_default())
                .collect()
        })
        .collect();

    // Widths in terminal columns, not bytes
    let mut widths = vec![0usize; sheet.grid.col_count()];
    for row in &labels {
        for (i, label) in row.iter().enumerate() {
            widths[i] = widths[i].max(label.width());
        }
    }

    for row in &labels {
        let mut line = String::new();
        for (i, label) in row.iter().enumerate() {
            if i > 0 {
                line.push_str(" | ");
            }
            line.push_str(label);
            line.push_str(&" ".repeat(widths[i] - label.width()));
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// Render every sheet of a parsed file, separated by blank lines.
pub fn render_file(file: &ParsedFile) -> String {
    file.sheets
        .iter()
        .map(render_sheet)
        .collect::<Vec<_>>()
        .join("\n")
}
