//! XLSX parser implementation.

use super::shared_strings::SharedStrings;
use super::sheet::{parse_worksheet, WorksheetPart};
use super::styles::Styles;
use super::workbook::{RelationshipMap, SheetEntry, Workbook};
use crate::color::Palette;
use crate::conditional::CfEngine;
use crate::container::Package;
use crate::error::Result;
use crate::model::{Grid, Sheet};
use crate::options::ParseOptions;
use std::path::Path;

/// Parser for XLSX (Excel) workbooks.
///
/// Opening a parser loads the workbook-level parts (sheet list,
/// relationships, shared strings and styles). Worksheets are read by
/// [`XlsxParser::parse`].
#[derive(Debug)]
pub struct XlsxParser {
    package: Package,
    shared_strings: SharedStrings,
    workbook: Workbook,
    relationships: RelationshipMap,
    styles: Styles,
    options: ParseOptions,
}

impl XlsxParser {
    /// Open an XLSX file with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open an XLSX file.
    pub fn open_with_options(path: impl AsRef<Path>, options: ParseOptions) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package, options)
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>, options: ParseOptions) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        Self::from_package(package, options)
    }

    /// Create a parser from an opened package.
    pub fn from_package(package: Package, options: ParseOptions) -> Result<Self> {
        Self::from_package_with_palette(package, options, &Palette::standard())
    }

    /// Create a parser that quantizes fills against `palette`.
    pub fn from_package_with_palette(
        package: Package,
        options: ParseOptions,
        palette: &Palette,
    ) -> Result<Self> {
        let workbook = Workbook::load(&package)?;
        let relationships = RelationshipMap::load(&package)?;
        let shared_strings = SharedStrings::load(&package)?;
        let styles = Styles::load(&package, palette, options.hex_decoding)?;

        Ok(Self {
            package,
            shared_strings,
            workbook,
            relationships,
            styles,
            options,
        })
    }

    /// Read every resolvable sheet, in workbook order, with colors applied.
    ///
    /// A sheet whose relationship id or worksheet part cannot be found is
    /// skipped with a warning.
    pub fn parse(&self) -> Result<Vec<Sheet>> {
        let mut sheets = Vec::with_capacity(self.workbook.sheets.len());

        for entry in &self.workbook.sheets {
            let Some(xml) = self.worksheet_xml(entry)? else {
                continue;
            };
            let part = parse_worksheet(&xml, &self.shared_strings, self.options.cell_placement)?;
            sheets.push(Sheet::new(entry.name.clone(), self.color(part)));
        }

        Ok(sheets)
    }

    fn worksheet_xml(&self, entry: &SheetEntry) -> Result<Option<String>> {
        let Some(target) = self.relationships.get(&entry.rel_id) else {
            log::warn!(
                "sheet '{}': relationship '{}' does not resolve",
                entry.name,
                entry.rel_id
            );
            return Ok(None);
        };

        let xml = self.package.read_optional_xml(target)?;
        if xml.is_none() {
            log::warn!("sheet '{}': part '{}' not found", entry.name, target);
        }
        Ok(xml)
    }

    /// Seed direct fills, then run conditional formatting over the grid.
    fn color(&self, part: WorksheetPart) -> Grid {
        let WorksheetPart {
            mut grid,
            cell_styles,
            conditional_formats,
        } = part;

        if self.options.read_cell_fills {
            for (row, col, style) in cell_styles {
                if let (Some(color), Some(cell)) =
                    (self.styles.cell_fill(style), grid.get_mut(row, col))
                {
                    cell.color = color;
                }
            }
        }

        if !self.options.conditional_formatting {
            return grid;
        }

        let writes = CfEngine::new(&self.styles.dxfs)
            .with_grammar(self.options.range)
            .with_policy(self.options.conflict_policy)
            .apply(&mut grid, &conditional_formats);
        log::debug!(
            "{} conditional formatting blocks, {} color writes",
            conditional_formats.len(),
            writes
        );

        grid
    }

    /// Get the number of sheets declared by the workbook.
    pub fn sheet_count(&self) -> usize {
        self.workbook.sheets.len()
    }

    /// Get sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheet_names()
    }

    /// Parsed styles.
    pub fn styles(&self) -> &Styles {
        &self.styles
    }
}
