//! Error types for the cfgrid library.

use std::io;
use thiserror::Error;

/// Result type alias for cfgrid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the package.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A range reference failed to parse.
    #[error("Range error: {0}")]
    Range(#[from] RangeError),

    /// The spreadsheet writer rejected a cell, style or save.
    #[error("Write error: {0}")]
    Write(String),

    /// Options could not be loaded.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for archive and filesystem failures.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::ZipArchive(_) | Error::Write(_))
    }

    /// True for malformed package content.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::XmlParse(_) | Error::InvalidData(_) | Error::MissingComponent(_)
        )
    }
}

/// Errors produced by the range reference grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The token is blank.
    #[error("empty range reference")]
    Empty,

    /// The token has no `:` separator, or more than one.
    #[error("range reference without a single ':' separator: {0}")]
    MissingSeparator(String),

    /// One side of the range is not a cell, column or row reference.
    #[error("invalid cell reference: {0}")]
    InvalidReference(String),

    /// The grid has no rows or no columns to clamp against.
    #[error("cannot clamp a range into a {rows}x{cols} grid")]
    EmptyExtent { rows: usize, cols: usize },
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::Write(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
