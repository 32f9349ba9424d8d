//! XLSX styles parsing: differential-format fills and cell fills.

use crate::color::{Color, HexDecoding, Palette};
use crate::container::Package;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};

/// One `<dxf>` entry, reduced to its fill color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DxfEntry {
    pub fill: Option<Color>,
}

/// Differential formats in document order; the position is the `dxfId`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DxfTable {
    entries: Vec<DxfEntry>,
}

impl DxfTable {
    pub fn from_entries(entries: Vec<DxfEntry>) -> Self {
        Self { entries }
    }

    /// Fill color for a `dxfId`.
    ///
    /// A missing id, an id past the end, an entry without a fill and an
    /// entry whose fill is `Color::None` are all misses.
    pub fn fill_color(&self, dxf_id: Option<u32>) -> Option<Color> {
        let entry = self.entries.get(dxf_id? as usize)?;
        entry.fill.filter(|c| !c.is_none())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fill state collected while inside a `<patternFill>`.
#[derive(Debug, Default)]
struct PatternFill {
    pattern: Option<String>,
    fg_rgb: Option<String>,
    bg_rgb: Option<String>,
}

impl PatternFill {
    fn read_pattern(&mut self, e: &BytesStart<'_>) -> Result<()> {
        self.pattern = attr_value(e, b"patternType")?;
        Ok(())
    }

    fn read_color(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let rgb = attr_value(e, b"rgb")?;
        match e.local_name().as_ref() {
            b"fgColor" => self.fg_rgb = rgb,
            b"bgColor" => self.bg_rgb = rgb,
            _ => {}
        }
        Ok(())
    }

    /// Differential fills usually omit `patternType` and carry their color
    /// in `bgColor`.
    fn dxf_rgb(&self) -> Option<&str> {
        match self.pattern.as_deref() {
            None | Some("solid") => self.bg_rgb.as_deref().or(self.fg_rgb.as_deref()),
            _ => None,
        }
    }

    /// Regular solid fills carry their color in `fgColor`.
    fn cell_rgb(&self) -> Option<&str> {
        match self.pattern.as_deref() {
            Some("solid") => self.fg_rgb.as_deref(),
            _ => None,
        }
    }
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Style information parsed from `styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    /// Differential formats referenced by conditional formatting
    pub dxfs: DxfTable,
    /// Quantized solid fill per `<fills>` entry
    fills: Vec<Option<Color>>,
    /// `fillId` per `<cellXfs>` entry, i.e. per cell `s` index
    cell_xf_fills: Vec<Option<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fills,
    Dxfs,
    CellXfs,
}

impl Styles {
    /// Load `styles.xml`; a package without one has no styles.
    pub fn load(package: &Package, palette: &Palette, decoding: HexDecoding) -> Result<Self> {
        match package.read_optional_xml("styles.xml")? {
            Some(xml) => Self::parse(&xml, palette, decoding),
            None => Ok(Self::default()),
        }
    }

    /// Parse `styles.xml` content.
    pub fn parse(xml: &str, palette: &Palette, decoding: HexDecoding) -> Result<Self> {
        let mut styles = Self::default();
        let mut dxfs = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut section = Section::Other;
        let mut in_dxf = false;
        // Color of the `<fill>` or `<dxf>` currently open.
        let mut current_fill: Option<Color> = None;
        let mut pattern: Option<PatternFill> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::XmlParse(e.to_string()))?;
            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"fills" => section = Section::Fills,
                    b"dxfs" => section = Section::Dxfs,
                    b"cellXfs" => section = Section::CellXfs,
                    b"dxf" if section == Section::Dxfs => {
                        in_dxf = true;
                        current_fill = None;
                    }
                    b"fill" if section == Section::Fills => current_fill = None,
                    b"patternFill" => {
                        let mut fill = PatternFill::default();
                        fill.read_pattern(&e)?;
                        pattern = Some(fill);
                    }
                    b"fgColor" | b"bgColor" => {
                        if let Some(fill) = pattern.as_mut() {
                            fill.read_color(&e)?;
                        }
                    }
                    b"xf" if section == Section::CellXfs => {
                        styles.cell_xf_fills.push(fill_id(&e)?);
                    }
                    _ => {}
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"dxf" if section == Section::Dxfs => dxfs.push(DxfEntry::default()),
                    b"fill" if section == Section::Fills => styles.fills.push(None),
                    b"fgColor" | b"bgColor" => {
                        if let Some(fill) = pattern.as_mut() {
                            fill.read_color(&e)?;
                        }
                    }
                    b"xf" if section == Section::CellXfs => {
                        styles.cell_xf_fills.push(fill_id(&e)?);
                    }
                    _ => {}
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"fills" | b"dxfs" | b"cellXfs" => section = Section::Other,
                    b"patternFill" => {
                        if let Some(fill) = pattern.take() {
                            let rgb = if in_dxf { fill.dxf_rgb() } else { fill.cell_rgb() };
                            current_fill = rgb.and_then(|rgb| palette.resolve_hex(rgb, decoding));
                        }
                    }
                    b"fill" if section == Section::Fills => {
                        styles.fills.push(current_fill.take());
                    }
                    b"dxf" if in_dxf => {
                        dxfs.push(DxfEntry {
                            fill: current_fill.take(),
                        });
                        in_dxf = false;
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        styles.dxfs = DxfTable::from_entries(dxfs);
        Ok(styles)
    }

    /// Quantized direct fill for a cell's `s` style index.
    pub fn cell_fill(&self, style_index: usize) -> Option<Color> {
        let fill_id = (*self.cell_xf_fills.get(style_index)?)?;
        (*self.fills.get(fill_id)?).filter(|c| !c.is_none())
    }
}

fn fill_id(e: &BytesStart<'_>) -> Result<Option<usize>> {
    Ok(attr_value(e, b"fillId")?.and_then(|v| v.trim().parse().ok()))
}
