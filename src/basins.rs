//! Basin list files
//!
//! A basins file holds one basin identifier per line. Identifiers are kept as
//! strings since gauge IDs carry leading zeros (e.g. `01013500`).

use crate::config::ValidationError;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read basin identifiers from a newline-delimited file
///
/// Blank lines are skipped and surrounding whitespace is trimmed. Duplicate
/// identifiers are dropped (first occurrence wins) with a warning.
pub fn read_basins<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::not_found("data.basinsFile", path),
        _ => Error::Io(e),
    })?;

    let basins = parse_basins(&content);
    if basins.is_empty() {
        return Err(ValidationError::EmptyField {
            field: "data.basinsFile".to_string(),
        }
        .into());
    }

    tracing::debug!(path = %path.display(), count = basins.len(), "read basins file");
    Ok(basins)
}

/// Parse the contents of a basins file
pub fn parse_basins(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut basins = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if seen.insert(line) {
            basins.push(line.to_string());
        } else {
            tracing::warn!(basin = line, "duplicate basin in basins file, ignoring");
        }
    }

    basins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basins() {
        let basins = parse_basins("01013500\n01022500\n01030500\n");
        assert_eq!(basins, vec!["01013500", "01022500", "01030500"]);
    }

    #[test]
    fn test_parse_basins_trims_and_skips_blank_lines() {
        let basins = parse_basins("  01013500 \r\n\n\t\n01022500");
        assert_eq!(basins, vec!["01013500", "01022500"]);
    }

    #[test]
    fn test_parse_basins_drops_duplicates() {
        let basins = parse_basins("01013500\n01022500\n01013500\n");
        assert_eq!(basins, vec!["01013500", "01022500"]);
    }

    #[test]
    fn test_read_basins_missing_file() {
        let err = read_basins("/nonexistent/basins.txt").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.field(), Some("data.basinsFile"));
    }

    #[test]
    fn test_read_basins_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basins.txt");
        fs::write(&path, "\n\n").unwrap();

        let err = read_basins(&path).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn test_read_basins_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basins.txt");
        fs::write(&path, "01013500\n01022500\n").unwrap();

        assert_eq!(read_basins(&path).unwrap().len(), 2);
    }
}
