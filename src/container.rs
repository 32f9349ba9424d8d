//! ZIP package access for XLSX workbooks.
//!
//! A [`Package`] owns the archive bytes in memory. The file handle used to
//! load them is dropped before [`Package::open`] returns, on success and on
//! failure alike, so nothing stays open while the parts are parsed.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// An opened spreadsheet package.
///
/// Parts are looked up by filename suffix rather than by exact path, so
/// packages that place `workbook.xml` or the worksheets in unusual folders
/// still resolve.
pub struct Package {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
    part_names: Vec<String>,
}

impl Package {
    /// Open a package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cfgrid::container::Package;
    ///
    /// let package = Package::open("report.xlsx")?;
    /// let styles = package.find_part_name("styles.xml");
    /// # Ok::<(), cfgrid::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = {
            let file = File::open(path.as_ref())?;
            let mut reader = BufReader::new(file);
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            data
        };
        Self::from_bytes(data)
    }

    /// Create a package from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        let part_names = archive.file_names().map(String::from).collect();
        Ok(Self {
            archive: RefCell::new(archive),
            part_names,
        })
    }

    /// Name of the first part whose path ends with `suffix`, in archive order.
    pub fn find_part_name(&self, suffix: &str) -> Option<&str> {
        let suffix = normalize_suffix(suffix);
        if suffix.is_empty() {
            return None;
        }
        self.part_names
            .iter()
            .find(|name| name.ends_with(suffix))
            .map(String::as_str)
    }

    /// Raw bytes of the first part whose path ends with `suffix`.
    pub fn find_part(&self, suffix: &str) -> Result<Vec<u8>> {
        let name = self
            .find_part_name(suffix)
            .ok_or_else(|| Error::MissingComponent(suffix.to_string()))?
            .to_string();

        let mut archive = self.archive.borrow_mut();
        let mut file = archive.by_name(&name)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Decoded XML text of the part matching `suffix`.
    pub fn read_xml(&self, suffix: &str) -> Result<String> {
        let bytes = self.find_part(suffix)?;
        decode_xml_bytes(&bytes)
    }

    /// Like [`Package::read_xml`], but an absent part is `Ok(None)`.
    pub fn read_optional_xml(&self, suffix: &str) -> Result<Option<String>> {
        match self.read_xml(suffix) {
            Ok(xml) => Ok(Some(xml)),
            Err(Error::MissingComponent(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if any part ends with `suffix`.
    pub fn contains(&self, suffix: &str) -> bool {
        self.find_part_name(suffix).is_some()
    }

    /// List all part names in archive order.
    pub fn part_names(&self) -> &[String] {
        &self.part_names
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.part_names.len())
            .finish()
    }
}

/// Relationship targets may be absolute (`/xl/worksheets/sheet1.xml`) or
/// climb out of `xl/` (`../xl/worksheets/sheet1.xml`); neither prefix can
/// appear in a stored part name.
fn normalize_suffix(suffix: &str) -> &str {
    let mut s = suffix.trim_start_matches('/');
    while let Some(rest) = s.strip_prefix("../") {
        s = rest;
    }
    s.strip_prefix("./").unwrap_or(s)
}

/// Decode XML bytes, handling UTF-8 (with or without BOM) and BOM-marked
/// UTF-16 in either byte order.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec())
            .map_err(|e| Error::InvalidData(format!("UTF-8 part: {e}")));
    }

    let utf16 = match bytes {
        [0xFF, 0xFE, rest @ ..] => Some((rest, u16::from_le_bytes as fn([u8; 2]) -> u16)),
        [0xFE, 0xFF, rest @ ..] => Some((rest, u16::from_be_bytes as fn([u8; 2]) -> u16)),
        _ => None,
    };

    if let Some((rest, to_unit)) = utf16 {
        let units = rest.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
        let text = char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| Error::InvalidData(format!("UTF-16 part: {e}")))?;
        // The declaration still names UTF-16; quick-xml would try to honor it.
        return Ok(text
            .replacen("encoding=\"UTF-16\"", "encoding=\"UTF-8\"", 1)
            .replacen("encoding=\"utf-16\"", "encoding=\"UTF-8\"", 1));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}
