//! Comma-delimited interchange.
//!
//! Lenient on import: a row with the wrong field count, an unparseable
//! value or an empty name is skipped and the rest still import.

use std::io::Write;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::Result;
use crate::record::{Field, Record};

use super::{Import, SkippedRow, Snapshot};

/// Write a header line of field names, then one row per record
pub(super) fn write<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(Field::ALL.iter().map(|f| f.name()))?;
    for record in records {
        writer.write_record(Field::ALL.iter().map(|f| record.text(*f)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse rows after the header line
pub(super) fn read(text: &str) -> Result<Import> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (index, row) in reader.records().enumerate() {
        // Header is line 1
        let fallback_line = index as u64 + 2;

        match row {
            Ok(row) => {
                let line = row.position().map_or(fallback_line, |p| p.line());
                match parse_row(&row) {
                    Ok(record) => records.push(record),
                    Err(e) => skipped.push(SkippedRow {
                        line,
                        reason: e.to_string(),
                    }),
                }
            }
            Err(e) => skipped.push(SkippedRow {
                line: e.position().map_or(fallback_line, |p| p.line()),
                reason: e.to_string(),
            }),
        }
    }

    Ok(Import {
        snapshot: Snapshot::new(records),
        skipped,
    })
}

fn parse_row(row: &StringRecord) -> Result<Record> {
    let values: Vec<&str> = row.iter().collect();
    Record::from_texts(&values)
}
