//! Excel-style range references.
//!
//! Parses `sqref` tokens such as `A1:C3`, `$ET$68:$A$1`, `F:F` or `$14:$14`
//! into normalized, clamped, 0-based rectangles.

use crate::error::RangeError;
use serde::{Deserialize, Serialize};

/// How a column-only or row-only side of a range covers the opposite axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSpan {
    /// `F:F` is every row of column F; `3:3` is every column of row 3.
    #[default]
    Full,
    /// A column-only side sits at row 0 and a row-only side at column 0,
    /// so `F:F` covers the single cell `F1`.
    Point,
}

/// One side of a range token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPart {
    /// Letters only, e.g. `A` or `$F`
    Column(usize),
    /// Digits only, e.g. `6` or `$8`; 0-based, so `0` stands for row number 0
    Row(i64),
    /// Letters then digits, e.g. `A1` or `$ET$68`
    Cell { row: i64, col: usize },
}

/// An inclusive, normalized, clamped rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqrefRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl SqrefRange {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }
}

/// How multi-letter column names map to indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLetters {
    /// Plain base-26 with `A` = 0, so `ET` = 4 * 26 + 19 = 123 and `AA`
    /// reads the same as `A`. Single letters agree with Excel.
    #[default]
    Positional,
    /// Excel's numbering: `Z` = 25, `AA` = 26, `ET` = 149.
    Bijective,
}

/// Convert column letters to a 0-based index under `scheme`.
///
/// Case-insensitive. Very long inputs saturate instead of overflowing.
pub fn column_index(letters: &str, scheme: ColumnLetters) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize;
        acc = match scheme {
            ColumnLetters::Positional => acc.saturating_mul(26).saturating_add(digit),
            ColumnLetters::Bijective => acc.saturating_mul(26).saturating_add(digit + 1),
        };
    }
    Some(match scheme {
        ColumnLetters::Positional => acc,
        ColumnLetters::Bijective => acc - 1,
    })
}

/// Settings that shape how `sqref` tokens are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeGrammar {
    pub axis_span: AxisSpan,
    pub column_letters: ColumnLetters,
}

/// Excel column letters for a 0-based index (`0` = `A`, `26` = `AA`).
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// `A1`-style name for a 0-based position.
pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

fn parse_row_number(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overlong row numbers clamp anyway.
    let n = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(n.saturating_sub(1))
}

/// Parse one side of a range token with positional column letters.
pub fn parse_reference(reference: &str) -> Result<RefPart, RangeError> {
    parse_reference_with(reference, ColumnLetters::Positional)
}

/// Parse one side of a range token.
pub fn parse_reference_with(
    reference: &str,
    scheme: ColumnLetters,
) -> Result<RefPart, RangeError> {
    let reference = reference.trim();
    let invalid = || RangeError::InvalidReference(reference.to_string());

    let clean: String = reference.chars().filter(|&c| c != '$').collect();
    if clean.is_empty() {
        return Err(invalid());
    }

    if clean.chars().all(|c| c.is_ascii_alphabetic()) {
        return column_index(&clean, scheme).map(RefPart::Column).ok_or_else(invalid);
    }
    if clean.bytes().all(|b| b.is_ascii_digit()) {
        return parse_row_number(&clean).map(RefPart::Row).ok_or_else(invalid);
    }

    // `$`? letters `$`? digits, with `$` only in those two positions.
    let rest = reference.strip_prefix('$').unwrap_or(reference);
    let split = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (letters, rest) = rest.split_at(split);
    let digits = rest.strip_prefix('$').unwrap_or(rest);

    let col = column_index(letters, scheme).ok_or_else(invalid)?;
    let row = parse_row_number(digits).ok_or_else(invalid)?;
    Ok(RefPart::Cell { row, col })
}

/// Parse a single cell reference into a 0-based `(row, col)`.
///
/// ```
/// use cfgrid::range::parse_cell_reference;
///
/// assert_eq!(parse_cell_reference("A1").unwrap(), (0, 0));
/// assert_eq!(parse_cell_reference("$ET$68").unwrap(), (67, 123));
/// ```
pub fn parse_cell_reference(reference: &str) -> Result<(usize, usize), RangeError> {
    match parse_reference(reference)? {
        RefPart::Cell { row, col } if row >= 0 => Ok((row as usize, col)),
        _ => Err(RangeError::InvalidReference(reference.to_string())),
    }
}

#[derive(Clone, Copy)]
enum Side {
    Start,
    End,
}

fn position(part: RefPart, side: Side, span: AxisSpan, rows: usize, cols: usize) -> (i64, i64) {
    let far = |total: usize| match (span, side) {
        (AxisSpan::Full, Side::End) => total as i64 - 1,
        _ => 0,
    };
    match part {
        RefPart::Column(col) => (far(rows), col as i64),
        RefPart::Row(row) => (row, far(cols)),
        RefPart::Cell { row, col } => (row, col as i64),
    }
}

fn clamp_axis(value: i64, total: usize) -> usize {
    value.clamp(0, total as i64 - 1) as usize
}

/// Parse one `sqref` token against a grid of `total_rows` x `total_cols`.
///
/// Both sides are parsed independently, each axis is clamped into the
/// grid, then swapped if reversed, so `C3:A1` and `A1:C3` are equal.
pub fn parse_sqref(
    token: &str,
    total_rows: usize,
    total_cols: usize,
    grammar: RangeGrammar,
) -> Result<SqrefRange, RangeError> {
    if total_rows == 0 || total_cols == 0 {
        return Err(RangeError::EmptyExtent {
            rows: total_rows,
            cols: total_cols,
        });
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(RangeError::Empty);
    }

    let mut sides = token.split(':');
    let (start, end) = match (sides.next(), sides.next(), sides.next()) {
        (Some(start), Some(end), None) => (start, end),
        _ => return Err(RangeError::MissingSeparator(token.to_string())),
    };

    let span = grammar.axis_span;
    let start = parse_reference_with(start, grammar.column_letters)?;
    let end = parse_reference_with(end, grammar.column_letters)?;
    let start = position(start, Side::Start, span, total_rows, total_cols);
    let end = position(end, Side::End, span, total_rows, total_cols);

    let (r1, r2) = (clamp_axis(start.0, total_rows), clamp_axis(end.0, total_rows));
    let (c1, c2) = (clamp_axis(start.1, total_cols), clamp_axis(end.1, total_cols));

    Ok(SqrefRange {
        start_row: r1.min(r2),
        start_col: c1.min(c2),
        end_row: r1.max(r2),
        end_col: c1.max(c2),
    })
}

/// Parse every token of an `sqref` attribute.
///
/// Tokens are separated by whitespace or commas. A token that fails to
/// parse is dropped; the rest still apply.
pub fn parse_sqref_list(
    sqref: &str,
    total_rows: usize,
    total_cols: usize,
    grammar: RangeGrammar,
) -> Vec<SqrefRange> {
    sqref
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(|token| match parse_sqref(token, total_rows, total_cols, grammar) {
            Ok(range) => Some(range),
            Err(e) => {
                log::debug!("dropping sqref token {token:?}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> RangeGrammar {
        RangeGrammar::default()
    }

    fn point() -> RangeGrammar {
        RangeGrammar {
            axis_span: AxisSpan::Point,
            ..Default::default()
        }
    }

    fn rect(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> SqrefRange {
        SqrefRange {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(parse_cell_reference("A1").unwrap(), (0, 0));
        assert_eq!(parse_cell_reference("$ET$68").unwrap(), (67, 123));
        assert_eq!(parse_cell_reference("et68").unwrap(), (67, 123));
        // Positional letters: AA reads like A.
        assert_eq!(parse_cell_reference("AA10").unwrap(), (9, 0));
        assert!(parse_cell_reference("A").is_err());
        assert!(parse_cell_reference("1A").is_err());
        assert!(parse_cell_reference("A$$1").is_err());
        assert!(parse_cell_reference("A1B").is_err());
    }

    #[test]
    fn test_reference_kinds() {
        assert_eq!(parse_reference("$F").unwrap(), RefPart::Column(5));
        assert_eq!(parse_reference("8").unwrap(), RefPart::Row(7));
        assert_eq!(parse_reference("$8").unwrap(), RefPart::Row(7));
        assert_eq!(parse_reference("B$2").unwrap(), RefPart::Cell { row: 1, col: 1 });
        assert!(parse_reference("").is_err());
        assert!(parse_reference("$").is_err());
        assert!(parse_reference("A-1").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_index("A", ColumnLetters::Positional), Some(0));
        assert_eq!(column_index("Z", ColumnLetters::Positional), Some(25));
        assert_eq!(column_index("ET", ColumnLetters::Positional), Some(123));
        assert_eq!(column_index("A", ColumnLetters::Bijective), Some(0));
        assert_eq!(column_index("AA", ColumnLetters::Bijective), Some(26));
        assert_eq!(column_index("ET", ColumnLetters::Bijective), Some(149));
        assert_eq!(column_index("XFD", ColumnLetters::Bijective), Some(16383));
        assert_eq!(column_index("A1", ColumnLetters::Bijective), None);

        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(149), "ET");
        assert_eq!(column_letters(16383), "XFD");
        assert_eq!(cell_name(67, 149), "ET68");
    }

    #[test]
    fn test_bijective_grammar() {
        let grammar = RangeGrammar {
            column_letters: ColumnLetters::Bijective,
            ..Default::default()
        };
        assert_eq!(
            parse_sqref("A1:AB3", 10, 40, grammar).unwrap(),
            rect(0, 0, 2, 27)
        );
        assert_eq!(
            parse_sqref("A1:AB3", 10, 40, full()).unwrap(),
            rect(0, 0, 2, 1)
        );
    }

    #[test]
    fn test_reversed_range_normalizes() {
        let forward = parse_sqref("A1:C3", 10, 10, full()).unwrap();
        let reversed = parse_sqref("C3:A1", 10, 10, full()).unwrap();
        assert_eq!(forward, rect(0, 0, 2, 2));
        assert_eq!(reversed, forward);

        let crossed = parse_sqref("C1:A3", 10, 10, full()).unwrap();
        assert_eq!(crossed, rect(0, 0, 2, 2));
    }

    #[test]
    fn test_clamped_to_grid() {
        let range = parse_sqref("$A$1:$ET$68", 5, 4, full()).unwrap();
        assert_eq!(range, rect(0, 0, 4, 3));

        // Row 0 does not exist; it clamps to the first row.
        let range = parse_sqref("A0:B2", 5, 4, full()).unwrap();
        assert_eq!(range, rect(0, 0, 1, 1));
    }

    #[test]
    fn test_full_column_and_row_span() {
        assert_eq!(parse_sqref("F:F", 10, 8, full()).unwrap(), rect(0, 5, 9, 5));
        assert_eq!(parse_sqref("$B:$D", 10, 8, full()).unwrap(), rect(0, 1, 9, 3));
        assert_eq!(parse_sqref("$14:$14", 20, 8, full()).unwrap(), rect(13, 0, 13, 7));
        assert_eq!(parse_sqref("3:5", 20, 8, full()).unwrap(), rect(2, 0, 4, 7));
    }

    #[test]
    fn test_point_column_and_row_span() {
        assert_eq!(parse_sqref("F:F", 10, 8, point()).unwrap(), rect(0, 5, 0, 5));
        assert_eq!(parse_sqref("$14:$14", 20, 8, point()).unwrap(), rect(13, 0, 13, 0));
        // Point mode still spans when the other side supplies the extreme.
        assert_eq!(parse_sqref("F:H9", 10, 8, point()).unwrap(), rect(0, 5, 8, 7));
    }

    #[test]
    fn test_sqref_errors() {
        assert_eq!(
            parse_sqref("A1", 10, 10, full()),
            Err(RangeError::MissingSeparator("A1".to_string()))
        );
        assert!(matches!(
            parse_sqref("A1:B2:C3", 10, 10, full()),
            Err(RangeError::MissingSeparator(_))
        ));
        assert!(matches!(
            parse_sqref("A1:??", 10, 10, full()),
            Err(RangeError::InvalidReference(_))
        ));
        assert_eq!(parse_sqref("  ", 10, 10, full()), Err(RangeError::Empty));
        assert_eq!(
            parse_sqref("A1:B2", 0, 10, full()),
            Err(RangeError::EmptyExtent { rows: 0, cols: 10 })
        );
    }

    #[test]
    fn test_sqref_list_skips_bad_tokens() {
        let ranges = parse_sqref_list("A1:B2 bogus C3 D4:E5,F6:F6", 10, 10, full());
        assert_eq!(ranges, vec![rect(0, 0, 1, 1), rect(3, 3, 4, 4), rect(5, 5, 5, 5)]);

        assert!(parse_sqref_list("", 10, 10, full()).is_empty());
        assert!(parse_sqref_list("A1:B2", 0, 0, full()).is_empty());
    }

    #[test]
    fn test_contains() {
        let range = rect(1, 1, 2, 3);
        assert!(range.contains(1, 1));
        assert!(range.contains(2, 3));
        assert!(!range.contains(0, 1));
        assert!(!range.contains(2, 4));
    }
}
