//! Input name list
//!
//! Accepts `{"professors": ["Name", ...]}` or a bare JSON array of strings.
//! Order is preserved; it defines the resume point.

use profscan_common::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameListFile {
    Wrapped { professors: Vec<String> },
    Bare(Vec<String>),
}

/// Load and clean the name list at `path`
pub fn load_names(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    parse_names(&raw).map_err(|e| match e {
        Error::InvalidInput(msg) => Error::InvalidInput(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse and clean a JSON name list
///
/// Names are trimmed, empty entries dropped, and later duplicates of an
/// earlier name dropped with a warning.
pub fn parse_names(raw: &str) -> Result<Vec<String>> {
    let parsed: NameListFile = serde_json::from_str(raw).map_err(|e| {
        Error::InvalidInput(format!(
            "expected {{\"professors\": [...]}} or an array of names ({})",
            e
        ))
    })?;

    let names = match parsed {
        NameListFile::Wrapped { professors } => professors,
        NameListFile::Bare(names) => names,
    };

    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name.to_string()) {
            tracing::warn!(name = %name, "Duplicate name in input; keeping first occurrence");
            continue;
        }
        cleaned.push(name.to_string());
    }

    Ok(cleaned)
}

/// Names left after `last` and the list length, for status reporting
///
/// An unreadable or malformed list is reported with a warning and yields
/// `None` rather than failing the caller.
pub fn remaining_count(path: &Path, last: Option<&str>) -> Option<(usize, usize)> {
    match load_names(path) {
        Ok(names) => Some((crate::workflow::resume_slice(&names, last).len(), names.len())),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Cannot read input list; pending count unavailable"
            );
            None
        }
    }
}
