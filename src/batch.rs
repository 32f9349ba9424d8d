//! Directory scanning.
//!
//! Every `.xlsx` file under a directory is parsed on its own. One broken
//! file never stops the scan: its error is recorded and the walk goes on.

use crate::error::{Error, Result};
use crate::model::ParsedFile;
use crate::options::ParseOptions;
use std::io;
use std::path::{Path, PathBuf};

/// A file that could not be read.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of a directory scan.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<ParsedFile>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    /// Files attempted, successful or not.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// True when the file name ends in `.xlsx`, ignoring case.
pub fn is_xlsx(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .is_some_and(|name| name.ends_with(".xlsx"))
}

/// Collect `.xlsx` files under `root`, sorted by path.
///
/// Directory entries that cannot be read are returned as failures next to
/// the file list.
pub fn collect_workbooks(root: &Path) -> Result<(Vec<PathBuf>, Vec<FileFailure>)> {
    if !root.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }

    let mut files = Vec::new();
    let mut failures = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let error = match err.into_io_error() {
                    Some(io) => Error::Io(io),
                    None => Error::InvalidData("filesystem loop".to_string()),
                };
                failures.push(FileFailure { path, error });
                continue;
            }
        };
        if entry.file_type().is_file() && is_xlsx(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok((files, failures))
}

/// Parse every `.xlsx` file under `dir`.
///
/// Only a missing or unreadable root is an error; per-file problems land
/// in [`BatchReport::failed`].
pub fn scan_dir(dir: impl AsRef<Path>, options: &ParseOptions) -> Result<BatchReport> {
    let dir = dir.as_ref();
    let (files, failed) = collect_workbooks(dir)?;
    let mut report = BatchReport {
        succeeded: Vec::with_capacity(files.len()),
        failed,
    };

    for path in files {
        match crate::parse_file_with_options(&path, *options) {
            Ok(parsed) => {
                log::debug!("{}: {} sheets", path.display(), parsed.sheets.len());
                report.succeeded.push(parsed);
            }
            Err(error) => {
                log::warn!("{}: {}", path.display(), error);
                report.failed.push(FileFailure { path, error });
            }
        }
    }

    log::info!(
        "scanned {}: {} parsed, {} failed",
        dir.display(),
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(report)
}
