//! Snapshot Module
//!
//! Point-in-time record sets and their text interchange formats.
//!
//! ## Responsibilities
//! - Hold an immutable, ordered copy of a store's live records
//! - Export to delimited rows or nested markup, atomically
//! - Import from either format with format-specific strictness
//!
//! ## Formats
//! ```text
//! csv   id,first_name,last_name,birth_date,balance,code,flag
//!       1,Ada,Lovelace,12/10/1815,100.00,7,a
//!
//! xml   <records>
//!         <record id="1" first_name="Ada" last_name="Lovelace" ... flag="a"/>
//!       </records>
//! ```
//!
//! Delimited import skips bad rows one at a time; markup import is all or
//! nothing.

mod delimited;
mod markup;

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, RosterError};
use crate::record::Record;

/// Interchange text format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-delimited rows with a header line
    Csv,
    /// One `<records>` element wrapping one `<record>` per record
    Xml,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Xml => "xml",
        }
    }
}

impl FromStr for Format {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "xml" => Ok(Format::Xml),
            other => Err(RosterError::InvalidArgument(format!(
                "unknown format: {:?} (expected csv or xml)",
                other
            ))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A row dropped during delimited import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the source text
    pub line: u64,
    pub reason: String,
}

/// A parsed snapshot plus the rows that could not be imported
#[derive(Debug, Clone)]
pub struct Import {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedRow>,
}

/// Immutable, ordered copy of records taken at one moment
///
/// Owns its records outright; nothing links it back to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<Record>,
}

impl Snapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Fail if two records share an id
    pub fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        match self.records.iter().find(|r| !seen.insert(r.id)) {
            Some(dup) => Err(RosterError::InvalidArgument(format!(
                "snapshot holds id {} more than once",
                dup.id
            ))),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Serialize into any writer
    pub fn write_to<W: Write>(&self, writer: W, format: Format) -> Result<()> {
        match format {
            Format::Csv => delimited::write(&self.records, writer),
            Format::Xml => markup::write(&self.records, writer),
        }
    }

    /// Serialize to text
    pub fn to_text(&self, format: Format) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf, format)?;
        String::from_utf8(buf).map_err(|e| RosterError::Interchange(e.to_string()))
    }

    /// Write to `path`, leaving no file behind on failure
    ///
    /// The text goes to a `.tmp` sibling which is synced and renamed into
    /// place, so an unwritable destination never yields a partial file.
    pub fn export(&self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = tmp_path(path);

        let written = (|| -> Result<()> {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            self.write_to(&mut writer, format)?;
            let file = writer
                .into_inner()
                .map_err(|e| RosterError::Io(e.into_error()))?;
            file.sync_all()?;
            fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        match written {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    %format,
                    records = self.records.len(),
                    "Exported snapshot"
                );
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Parse text into a snapshot, reporting skipped rows
    pub fn import_report(text: &str, format: Format) -> Result<Import> {
        let import = match format {
            Format::Csv => delimited::read(text)?,
            Format::Xml => Import {
                snapshot: Snapshot::new(markup::read(text)?),
                skipped: Vec::new(),
            },
        };

        for row in &import.skipped {
            tracing::warn!(line = row.line, reason = %row.reason, "Skipped row during import");
        }
        tracing::info!(
            %format,
            records = import.snapshot.len(),
            skipped = import.skipped.len(),
            "Imported snapshot"
        );
        Ok(import)
    }

    /// Parse text into a snapshot
    pub fn import(text: &str, format: Format) -> Result<Snapshot> {
        Ok(Self::import_report(text, format)?.snapshot)
    }

    /// Read and parse a file
    pub fn import_file(path: impl AsRef<Path>, format: Format) -> Result<Import> {
        let text = fs::read_to_string(path)?;
        Self::import_report(&text, format)
    }
}

impl From<Vec<Record>> for Snapshot {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
