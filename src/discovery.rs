//! Per-basin dataset file discovery
//!
//! Each dataset type has its own file naming convention. Files are looked up
//! by recursive search below the source directory; the directory is scanned
//! once and the listing reused for every basin.
//!
//! | type        | role       | file name                                   |
//! |-------------|------------|---------------------------------------------|
//! | `camels-us` | forcings   | `{basin}_lump_{product}_forcing_leap.txt`   |
//! | `camels-us` | streamflow | `{basin}_streamflow_qc.txt`                 |
//! | `daymet`    | any        | contains `{basin}`, ends with `.nc`         |
//! | `daymet-2d` | any        | contains `{basin}`                          |
//!
//! CAMELS-US ships three basin-mean forcing sets side by side. The product
//! token is taken from the last component of the source directory:
//! `maurer` and `nldas` map to themselves, anything else (`daymet`) to `cida`.
//! Directory symlinks are not followed.

use crate::config::{DatasetSource, DatasetType};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What a source is used for in the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Forcings,
    Streamflow,
}

/// File listing of one dataset directory
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    dir: PathBuf,
    kind: DatasetType,
    forcing_product: &'static str,
    files: Vec<PathBuf>,
}

impl DatasetIndex {
    /// Recursively list the files below the source directory
    pub fn scan(source: &DatasetSource) -> Result<Self> {
        if !source.dir.is_dir() {
            return Err(Error::not_found("dataset directory", &source.dir));
        }

        let mut files = Vec::new();
        collect_files(&source.dir, &mut files)?;
        files.sort();

        tracing::debug!(
            dir = %source.dir.display(),
            kind = %source.kind,
            files = files.len(),
            "scanned dataset directory"
        );

        Ok(Self {
            dir: source.dir.clone(),
            kind: source.kind,
            forcing_product: camels_forcing_product(&source.dir),
            files,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Locate the file holding `basin`'s series
    ///
    /// When several files match, the first in path order is used.
    pub fn find(&self, role: SourceRole, basin: &str) -> Result<PathBuf> {
        let mut matches = self.files.iter().filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| file_matches(self.kind, role, self.forcing_product, basin, name))
        });

        let first = matches.next().ok_or_else(|| {
            Error::not_found(format!("{} file for basin {basin}", self.kind), &self.dir)
        })?;

        let extra = matches.count();
        if extra > 0 {
            tracing::warn!(
                basin,
                dir = %self.dir.display(),
                chosen = %first.display(),
                ignored = extra,
                "multiple files found for basin, using the first one"
            );
        }

        Ok(first.clone())
    }
}

/// Locate one basin's file below `source.dir`
pub fn discover_basin_file(source: &DatasetSource, role: SourceRole, basin: &str) -> Result<PathBuf> {
    DatasetIndex::scan(source)?.find(role, basin)
}

/// Locate the file of every basin, in basin order
pub fn discover_basin_files(
    source: &DatasetSource,
    role: SourceRole,
    basins: &[String],
) -> Result<Vec<PathBuf>> {
    let index = DatasetIndex::scan(source)?;
    basins.iter().map(|basin| index.find(role, basin)).collect()
}

/// File name token of a CAMELS-US basin-mean forcing set
fn camels_forcing_product(dir: &Path) -> &'static str {
    match dir.file_name().and_then(|name| name.to_str()) {
        Some("maurer") => "maurer",
        Some("nldas") => "nldas",
        _ => "cida",
    }
}

fn file_matches(
    kind: DatasetType,
    role: SourceRole,
    forcing_product: &str,
    basin: &str,
    name: &str,
) -> bool {
    match (kind, role) {
        (DatasetType::CamelsUs, SourceRole::Forcings) => {
            name == format!("{basin}_lump_{forcing_product}_forcing_leap.txt")
        }
        (DatasetType::CamelsUs, SourceRole::Streamflow) => {
            name == format!("{basin}_streamflow_qc.txt")
        }
        (DatasetType::Daymet, _) => name.contains(basin) && name.ends_with(".nc"),
        (DatasetType::Daymet2d, _) => name.contains(basin),
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if !file_type.is_symlink() || entry.path().is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}
