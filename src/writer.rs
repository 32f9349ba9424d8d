//! Writing colored grids back to XLSX.
//!
//! [`GridWriter`] turns a [`Grid`] into calls on a [`SpreadsheetSink`].
//! [`XlsxSink`] is the sink backed by `rust_xlsxwriter`; it buffers every
//! cell and renders the whole package on [`SpreadsheetSink::save`], which
//! replaces the destination atomically.

use crate::color::Palette;
use crate::error::{Error, Result};
use crate::model::{Cell, Grid};
use crate::options::ParseOptions;
use crate::range::cell_name;
use crate::xlsx::{CellPlacement, XlsxParser};
use rust_xlsxwriter::{Format, FormatPattern, Workbook};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Sheet that `write` creates and `update` targets.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Handle returned by [`SpreadsheetSink::register_fill`].
pub type StyleId = usize;

/// Largest magnitude an integer cell can hold without rounding.
pub const MAX_EXACT_INTEGER: i64 = 1 << 53;

fn is_exact_integer(value: i64) -> bool {
    value.unsigned_abs() <= MAX_EXACT_INTEGER as u64
}

/// A 1-based spreadsheet coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub row: u32,
    pub col: u16,
}

impl CellCoord {
    /// Coordinate of the 0-based grid position `(row, col)`.
    pub fn from_grid(row: usize, col: usize) -> Result<Self> {
        let out_of_range = || Error::Write(format!("cell ({row}, {col}) is outside the sheet"));
        let row = u32::try_from(row + 1).map_err(|_| out_of_range())?;
        let col = u16::try_from(col + 1).map_err(|_| out_of_range())?;
        Ok(Self { row, col })
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cell_name(self.row as usize - 1, self.col as usize - 1))
    }
}

/// Destination for grid values and fills.
///
/// Calls only ever add or overwrite; nothing is read back.
pub trait SpreadsheetSink {
    fn set_string(&mut self, coord: CellCoord, value: &str) -> Result<()>;

    /// Write an integer. Magnitudes above [`MAX_EXACT_INTEGER`] are an
    /// error for sinks that store doubles.
    fn set_integer(&mut self, coord: CellCoord, value: i64) -> Result<()>;

    /// Register a solid fill for an `RRGGBB` hex color.
    fn register_fill(&mut self, hex: &str) -> Result<StyleId>;

    fn apply_style(&mut self, coord: CellCoord, style: StyleId) -> Result<()>;

    fn save(&mut self) -> Result<()>;
}

/// Drives a sink from a grid, registering each fill color once.
pub struct GridWriter<'a, S: SpreadsheetSink + ?Sized> {
    sink: &'a mut S,
    styles: HashMap<&'static str, StyleId>,
}

impl<'a, S: SpreadsheetSink + ?Sized> GridWriter<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            styles: HashMap::new(),
        }
    }

    /// Write every present cell, returning how many were written.
    ///
    /// A non-empty value is written as a string. Otherwise a present
    /// integer is written, zero included. A cell with neither only gets
    /// its fill.
    pub fn write_grid(&mut self, grid: &Grid) -> Result<usize> {
        let mut written = 0;
        for (row, col, cell) in grid.cells() {
            let coord = CellCoord::from_grid(row, col)?;
            self.write_cell(coord, cell)?;
            written += 1;
        }
        Ok(written)
    }

    fn write_cell(&mut self, coord: CellCoord, cell: &Cell) -> Result<()> {
        if !cell.value.is_empty() {
            self.sink.set_string(coord, &cell.value)?;
        } else if let Some(number) = cell.number {
            self.sink.set_integer(coord, number)?;
        }

        if let Some(hex) = cell.color.fill_hex() {
            let style = match self.styles.get(hex) {
                Some(style) => *style,
                None => {
                    let style = self.sink.register_fill(hex)?;
                    self.styles.insert(hex, style);
                    style
                }
            };
            self.sink.apply_style(coord, style)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
enum PendingValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Default)]
struct PendingCell {
    value: PendingValue,
    style: Option<StyleId>,
}

#[derive(Debug, Clone)]
struct SheetBuffer {
    name: String,
    cells: BTreeMap<CellCoord, PendingCell>,
}

impl SheetBuffer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }
}

/// A [`SpreadsheetSink`] that saves an `.xlsx` package.
pub struct XlsxSink {
    path: PathBuf,
    sheets: Vec<SheetBuffer>,
    target: usize,
    formats: Vec<Format>,
    fill_ids: HashMap<u32, StyleId>,
}

impl XlsxSink {
    /// Start an empty workbook with one `Sheet1`.
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sheets: vec![SheetBuffer::new(DEFAULT_SHEET)],
            target: 0,
            formats: Vec::new(),
            fill_ids: HashMap::new(),
        }
    }

    /// Load an existing workbook, or start an empty one if `path` does not
    /// exist.
    ///
    /// Every sheet's values and direct solid fills are carried over.
    /// Integers stay numbers. Other formatting, formulas and conditional
    /// formatting rules are not carried over, and non-integer numbers (or
    /// integers beyond [`MAX_EXACT_INTEGER`]) come back as text. Writes
    /// target `Sheet1`, which is appended when the workbook has none.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::create(path));
        }

        let options = ParseOptions::new()
            .with_cell_placement(CellPlacement::Addressed)
            .with_cell_fills(true)
            .with_conditional_formatting(false);
        let parser = XlsxParser::from_package_with_palette(
            crate::container::Package::open(path)?,
            options,
            &Palette::fills(),
        )?;

        let mut sink = Self {
            path: path.to_path_buf(),
            sheets: Vec::new(),
            target: 0,
            formats: Vec::new(),
            fill_ids: HashMap::new(),
        };
        for sheet in parser.parse()? {
            sink.sheets.push(SheetBuffer::new(&sheet.name));
            sink.target = sink.sheets.len() - 1;
            sink.load_grid(&sheet.grid)?;
        }

        sink.target = match sink.sheets.iter().position(|s| s.name == DEFAULT_SHEET) {
            Some(index) => index,
            None => {
                sink.sheets.push(SheetBuffer::new(DEFAULT_SHEET));
                sink.sheets.len() - 1
            }
        };
        log::debug!(
            "{}: loaded {} sheets for update",
            path.display(),
            sink.sheets.len()
        );
        Ok(sink)
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sheet names in output order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Replay a re-read grid. Numeric cells carry both their text and their
    /// integer, so the integer is preferred whenever the text is just its
    /// decimal form.
    fn load_grid(&mut self, grid: &Grid) -> Result<()> {
        for (row, col, cell) in grid.cells() {
            let coord = CellCoord::from_grid(row, col)?;
            match cell.number {
                Some(number)
                    if is_exact_integer(number)
                        && (cell.value.is_empty() || cell.value == number.to_string()) =>
                {
                    self.set_integer(coord, number)?
                }
                _ if !cell.value.is_empty() => self.set_string(coord, &cell.value)?,
                _ => {}
            }
            if let Some(hex) = cell.color.fill_hex() {
                let style = self.register_fill(hex)?;
                self.apply_style(coord, style)?;
            }
        }
        Ok(())
    }

    fn pending(&mut self, coord: CellCoord) -> &mut PendingCell {
        self.sheets[self.target].cells.entry(coord).or_default()
    }

    /// Render the workbook into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            for (coord, cell) in &sheet.cells {
                let (row, col) = (coord.row - 1, coord.col - 1);
                let format = cell.style.and_then(|id| self.formats.get(id));
                match (&cell.value, format) {
                    (PendingValue::Text(text), Some(format)) => {
                        worksheet.write_string_with_format(row, col, text, format)?;
                    }
                    (PendingValue::Text(text), None) => {
                        worksheet.write_string(row, col, text)?;
                    }
                    (PendingValue::Number(number), Some(format)) => {
                        worksheet.write_number_with_format(row, col, *number, format)?;
                    }
                    (PendingValue::Number(number), None) => {
                        worksheet.write_number(row, col, *number)?;
                    }
                    (PendingValue::Empty, Some(format)) => {
                        worksheet.write_blank(row, col, format)?;
                    }
                    (PendingValue::Empty, None) => {}
                }
            }
        }
        Ok(workbook.save_to_buffer()?)
    }
}

impl SpreadsheetSink for XlsxSink {
    fn set_string(&mut self, coord: CellCoord, value: &str) -> Result<()> {
        self.pending(coord).value = PendingValue::Text(value.to_string());
        Ok(())
    }

    fn set_integer(&mut self, coord: CellCoord, value: i64) -> Result<()> {
        // Cells store IEEE doubles.
        if !is_exact_integer(value) {
            return Err(Error::Write(format!(
                "{value} at {coord} cannot be stored exactly"
            )));
        }
        self.pending(coord).value = PendingValue::Number(value as f64);
        Ok(())
    }

    fn register_fill(&mut self, hex: &str) -> Result<StyleId> {
        let digits = hex.trim().trim_start_matches('#');
        let rgb = u32::from_str_radix(digits, 16)
            .ok()
            .filter(|_| digits.len() == 6)
            .ok_or_else(|| Error::Write(format!("invalid fill color: {hex}")))?;
        if let Some(&style) = self.fill_ids.get(&rgb) {
            return Ok(style);
        }
        self.formats.push(
            Format::new()
                .set_background_color(rust_xlsxwriter::Color::RGB(rgb))
                .set_pattern(FormatPattern::Solid),
        );
        let style = self.formats.len() - 1;
        self.fill_ids.insert(rgb, style);
        Ok(style)
    }

    fn apply_style(&mut self, coord: CellCoord, style: StyleId) -> Result<()> {
        if style >= self.formats.len() {
            return Err(Error::Write(format!("unknown style id {style}")));
        }
        self.pending(coord).style = Some(style);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let bytes = self.to_bytes()?;
        atomic_write(&self.path, &bytes)
    }
}

impl fmt::Debug for XlsxSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XlsxSink")
            .field("path", &self.path)
            .field("sheets", &self.sheet_names())
            .field("styles", &self.formats.len())
            .finish()
    }
}

/// Write `bytes` to a temporary file next to `dest`, sync it, then move it
/// over `dest`. A failure at any step leaves `dest` as it was.
pub fn atomic_write(dest: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Write `grid` to a new workbook at `path`, replacing any existing file.
pub fn write(path: impl AsRef<Path>, grid: &Grid) -> Result<()> {
    let mut sink = XlsxSink::create(path);
    GridWriter::new(&mut sink).write_grid(grid)?;
    sink.save()
}

/// Write `grid` into `Sheet1` of the workbook at `path`, creating the file
/// when it does not exist. See [`XlsxSink::open_or_create`] for what an
/// existing file keeps.
pub fn update(path: impl AsRef<Path>, grid: &Grid) -> Result<()> {
    let mut sink = XlsxSink::open_or_create(path)?;
    GridWriter::new(&mut sink).write_grid(grid)?;
    sink.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::model::Cell;

    #[derive(Debug, PartialEq)]
    enum Call {
        String(String, String),
        Integer(String, i64),
        Register(String),
        Style(String, StyleId),
        Save,
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<Call>,
        fills: usize,
    }

    impl SpreadsheetSink for RecordingSink {
        fn set_string(&mut self, coord: CellCoord, value: &str) -> Result<()> {
            self.calls.push(Call::String(coord.to_string(), value.to_string()));
            Ok(())
        }

        fn set_integer(&mut self, coord: CellCoord, value: i64) -> Result<()> {
            self.calls.push(Call::Integer(coord.to_string(), value));
            Ok(())
        }

        fn register_fill(&mut self, hex: &str) -> Result<StyleId> {
            self.calls.push(Call::Register(hex.to_string()));
            self.fills += 1;
            Ok(self.fills - 1)
        }

        fn apply_style(&mut self, coord: CellCoord, style: StyleId) -> Result<()> {
            self.calls.push(Call::Style(coord.to_string(), style));
            Ok(())
        }

        fn save(&mut self) -> Result<()> {
            self.calls.push(Call::Save);
            Ok(())
        }
    }

    #[test]
    fn test_cell_coord() {
        let coord = CellCoord::from_grid(0, 0).unwrap();
        assert_eq!((coord.row, coord.col), (1, 1));
        assert_eq!(coord.to_string(), "A1");
        assert_eq!(CellCoord::from_grid(67, 149).unwrap().to_string(), "ET68");
        assert!(CellCoord::from_grid(0, 70_000).is_err());
    }

    #[test]
    fn test_value_contract() {
        let grid = Grid::from_rows(vec![vec![
            Some(Cell::new("text")),
            Some(Cell::integer(0)),
            Some(Cell {
                value: "wins".to_string(),
                number: Some(7),
                ..Default::default()
            }),
            Some(Cell::new("")),
            None,
            Some(Cell::integer(-3)),
        ]]);

        let mut sink = RecordingSink::default();
        assert_eq!(GridWriter::new(&mut sink).write_grid(&grid).unwrap(), 5);
        assert_eq!(
            sink.calls,
            vec![
                Call::String("A1".into(), "text".into()),
                Call::Integer("B1".into(), 0),
                Call::String("C1".into(), "wins".into()),
                Call::Integer("F1".into(), -3),
            ]
        );
    }

    #[test]
    fn test_fill_styles_are_cached() {
        let grid = Grid::from_rows(vec![
            vec![
                Some(Cell::new("a").with_color(Color::Green)),
                Some(Cell::new("b").with_color(Color::Red)),
            ],
            vec![Some(Cell::new("").with_color(Color::Green))],
        ]);

        let mut sink = RecordingSink::default();
        GridWriter::new(&mut sink).write_grid(&grid).unwrap();
        assert_eq!(
            sink.calls,
            vec![
                Call::String("A1".into(), "a".into()),
                Call::Register("00FF00".into()),
                Call::Style("A1".into(), 0),
                Call::String("B1".into(), "b".into()),
                Call::Register("FF0000".into()),
                Call::Style("B1".into(), 1),
                Call::Style("A2".into(), 0),
            ]
        );
    }

    #[test]
    fn test_xlsx_sink_rejects_bad_styles() {
        let mut sink = XlsxSink::create("unused.xlsx");
        assert!(sink.register_fill("GG0000").is_err());
        assert!(sink.register_fill("FFF").is_err());
        let coord = CellCoord::from_grid(0, 0).unwrap();
        assert!(sink.apply_style(coord, 3).is_err());
        assert_eq!(sink.register_fill("#FFFACD").unwrap(), 0);
        assert!(sink.apply_style(coord, 0).is_ok());
    }

    #[test]
    fn test_xlsx_sink_reuses_fills() {
        let mut sink = XlsxSink::create("unused.xlsx");
        let green = sink.register_fill("00FF00").unwrap();
        assert_eq!(sink.register_fill("#00ff00").unwrap(), green);
        assert_ne!(sink.register_fill("FF0000").unwrap(), green);
        assert_eq!(sink.formats.len(), 2);
    }

    #[test]
    fn test_xlsx_sink_rejects_inexact_integers() {
        let mut sink = XlsxSink::create("unused.xlsx");
        let coord = CellCoord::from_grid(0, 0).unwrap();
        assert!(sink.set_integer(coord, MAX_EXACT_INTEGER).is_ok());
        assert!(sink.set_integer(coord, -MAX_EXACT_INTEGER).is_ok());
        let err = sink.set_integer(coord, MAX_EXACT_INTEGER + 1).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
        assert!(sink.set_integer(coord, i64::MIN).is_err());
    }

    #[test]
    fn test_load_grid_keeps_integers() {
        let grid = Grid::from_rows(vec![vec![
            Some(Cell {
                value: "7".to_string(),
                number: Some(7),
                ..Default::default()
            }),
            Some(Cell {
                value: "007".to_string(),
                number: Some(7),
                ..Default::default()
            }),
            Some(Cell {
                value: "9007199254740993".to_string(),
                number: Some(9_007_199_254_740_993),
                ..Default::default()
            }),
            Some(Cell::new("").with_color(Color::Green)),
            Some(Cell::new("g").with_color(Color::Green)),
        ]]);

        let mut sink = XlsxSink::create("unused.xlsx");
        sink.load_grid(&grid).unwrap();
        let cells: Vec<_> = sink.sheets[0].cells.values().collect();
        assert!(matches!(cells[0].value, PendingValue::Number(n) if n == 7.0));
        assert!(matches!(&cells[1].value, PendingValue::Text(t) if t == "007"));
        assert!(matches!(&cells[2].value, PendingValue::Text(t) if t == "9007199254740993"));
        assert!(matches!(cells[3].value, PendingValue::Empty));
        assert_eq!(cells[3].style, Some(0));
        assert_eq!(cells[4].style, Some(0));
        assert_eq!(sink.formats.len(), 1);
    }

    #[test]
    fn test_write_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        fs::write(&path, b"stale").unwrap();

        let grid = Grid::from_rows(vec![vec![Some(Cell::new("x"))]]);
        write(&path, &grid).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        // No temp files left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.bin");
        atomic_write(&path, b"payload").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");
    }
}
