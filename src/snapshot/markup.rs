//! Nested markup interchange.
//!
//! Strict on import: any malformed element or field value aborts the
//! whole import.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};
use crate::record::{Field, Record};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Top-level collection element
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "records")]
struct RecordSet {
    #[serde(rename = "record", default)]
    records: Vec<RecordElement>,
}

/// One `<record>` carrying every field as an attribute, in declaration order
///
/// Attribute values keep leading and trailing whitespace, which element
/// text would lose.
#[derive(Debug, Serialize, Deserialize)]
struct RecordElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@first_name")]
    first_name: String,
    #[serde(rename = "@last_name")]
    last_name: String,
    #[serde(rename = "@birth_date")]
    birth_date: String,
    #[serde(rename = "@balance")]
    balance: String,
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "@flag")]
    flag: String,
}

impl From<&Record> for RecordElement {
    fn from(record: &Record) -> Self {
        Self {
            id: record.text(Field::Id),
            first_name: record.text(Field::FirstName),
            last_name: record.text(Field::LastName),
            birth_date: record.text(Field::BirthDate),
            balance: record.text(Field::Balance),
            code: record.text(Field::Code),
            flag: record.text(Field::Flag),
        }
    }
}

impl TryFrom<RecordElement> for Record {
    type Error = RosterError;

    fn try_from(element: RecordElement) -> Result<Self> {
        Record::from_texts(&[
            element.id.as_str(),
            element.first_name.as_str(),
            element.last_name.as_str(),
            element.birth_date.as_str(),
            element.balance.as_str(),
            element.code.as_str(),
            element.flag.as_str(),
        ])
    }
}

pub(super) fn write<W: Write>(records: &[Record], mut writer: W) -> Result<()> {
    let set = RecordSet {
        records: records.iter().map(RecordElement::from).collect(),
    };
    let body = quick_xml::se::to_string(&set)
        .map_err(|e| RosterError::Interchange(format!("markup encoding failed: {}", e)))?;

    writeln!(writer, "{}", DECLARATION)?;
    writeln!(writer, "{}", body)?;
    writer.flush()?;
    Ok(())
}

pub(super) fn read(text: &str) -> Result<Vec<Record>> {
    let set: RecordSet = quick_xml::de::from_str(text)
        .map_err(|e| RosterError::MalformedInput(format!("malformed markup: {}", e)))?;

    set.records
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            Record::try_from(element).map_err(|e| {
                RosterError::MalformedInput(format!("record #{}: {}", index + 1, e))
            })
        })
        .collect()
}
