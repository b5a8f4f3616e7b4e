//! Host list file parsing.
//!
//! Each useful line holds exactly two whitespace-separated tokens: a label
//! (rack, site, anything) and the switch hostname. Every other line is
//! ignored.

use std::path::Path;

use log::trace;

use crate::error::{HostListError, Result};

/// One switch to visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// First token of the line; not used for anything but logging.
    pub label: String,

    /// Second token of the line.
    pub hostname: String,
}

impl HostEntry {
    /// Parse one line; `None` unless it has exactly two tokens.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(label), Some(hostname), None) => Some(Self {
                label: label.to_string(),
                hostname: hostname.to_string(),
            }),
            _ => None,
        }
    }
}

/// Parse host list text, keeping file order.
pub fn parse(text: &str) -> Vec<HostEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let entry = HostEntry::parse(line);
            if entry.is_none() && !line.trim().is_empty() {
                trace!("host list line {} skipped: {:?}", index + 1, line);
            }
            entry
        })
        .collect()
}

/// Read and parse a host list file.
pub fn read(path: &Path) -> Result<Vec<HostEntry>> {
    let text = std::fs::read_to_string(path).map_err(|source| HostListError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text))
}
