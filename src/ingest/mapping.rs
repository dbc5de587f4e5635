//! Append-only mapping log
//!
//! One line per newly ingested item:
//!
//! ```text
//! locator | artifact-ref-or-NA | caption-ref-lang1-or-NA | caption-ref-lang2-or-NA
//! ```
//!
//! `lang1` and `lang2` are the first two configured caption languages.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const MISSING: &str = "NA";
const SEPARATOR: &str = " | ";

/// One line of the mapping log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingRecord {
    pub locator: String,
    pub artifact: Option<String>,
    pub primary_caption: Option<String>,
    pub secondary_caption: Option<String>,
}

impl MappingRecord {
    /// A record for an item with no retrieved files
    pub fn bare(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            ..Default::default()
        }
    }

    pub fn to_line(&self) -> String {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| MISSING.to_string());
        [
            self.locator.clone(),
            field(&self.artifact),
            field(&self.primary_caption),
            field(&self.secondary_caption),
        ]
        .join(SEPARATOR)
    }

    /// Parses a line, returning `None` if it does not have four fields
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
        if fields.len() != 4 || fields[0].is_empty() {
            return None;
        }

        let field = |value: &str| (value != MISSING && !value.is_empty()).then(|| value.to_string());
        Some(Self {
            locator: fields[0].to_string(),
            artifact: field(fields[1]),
            primary_caption: field(fields[2]),
            secondary_caption: field(fields[3]),
        })
    }

    pub fn has_captions(&self) -> bool {
        self.primary_caption.is_some() || self.secondary_caption.is_some()
    }
}

/// Writer for the mapping log
///
/// The file is opened in append mode for every record, so a crash never
/// truncates earlier lines.
#[derive(Debug, Clone)]
pub struct MappingLog {
    path: PathBuf,
}

impl MappingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &MappingRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record.to_line())
    }
}

/// Reads every well-formed record of a mapping log
///
/// A missing file reads as empty; malformed lines are skipped.
pub fn read_mapping(path: &Path) -> io::Result<Vec<MappingRecord>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    Ok(content.lines().filter_map(MappingRecord::parse_line).collect())
}
