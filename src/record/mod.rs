//! Record Module
//!
//! The fixed-shape record stored by every backend.
//!
//! ## Responsibilities
//! - Define the seven record fields and their name lookup
//! - Canonical text rendering used by queries and interchange
//! - Fixed-length binary slot encoding (see [`slot`])
//! - Typed field assignments for bulk update (see [`change`])

pub(crate) mod change;
mod slot;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Result, RosterError};

pub use change::{Assignment, FieldChanges, ResolvedChanges};
pub use slot::{decode_slot, encode_slot, SlotStatus, NAME_WIDTH, SLOT_SIZE};

/// Text rendering of dates, shared by queries and interchange
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Alternative date inputs accepted when parsing text
const DATE_INPUT_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

// =============================================================================
// Field Names
// =============================================================================

/// The fixed field set, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    FirstName,
    LastName,
    BirthDate,
    Balance,
    Code,
    Flag,
}

impl Field {
    /// All fields in declaration order
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::FirstName,
        Field::LastName,
        Field::BirthDate,
        Field::Balance,
        Field::Code,
        Field::Flag,
    ];

    /// Canonical field name used in headers and markup elements
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::BirthDate => "birth_date",
            Field::Balance => "balance",
            Field::Code => "code",
            Field::Flag => "flag",
        }
    }

    /// Look up a field by name, ignoring case and underscores
    ///
    /// `lastname`, `last_name` and `LastName` all name [`Field::LastName`].
    pub fn lookup(name: &str) -> Option<Field> {
        let folded: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "id" => Some(Field::Id),
            "firstname" => Some(Field::FirstName),
            "lastname" => Some(Field::LastName),
            "birthdate" | "dateofbirth" => Some(Field::BirthDate),
            "balance" => Some(Field::Balance),
            "code" => Some(Field::Code),
            "flag" => Some(Field::Flag),
            _ => None,
        }
    }
}

impl FromStr for Field {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self> {
        Field::lookup(s).ok_or_else(|| RosterError::UnknownField(s.trim().to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Record
// =============================================================================

/// The mutable fields of a record (everything except the id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordData {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub balance: Decimal,
    pub code: i16,
    pub flag: char,
}

/// A stored record: a store-assigned id plus its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u32,
    pub data: RecordData,
}

impl RecordData {
    /// Build record fields, rejecting empty names
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: NaiveDate,
        balance: Decimal,
        code: i16,
        flag: char,
    ) -> Result<Self> {
        let data = Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date,
            balance,
            code,
            flag,
        };
        data.check_names()?;
        Ok(data)
    }

    /// Names are the only fields the core insists on
    pub(crate) fn check_names(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(RosterError::InvalidArgument(
                "first_name must not be empty".to_string(),
            ));
        }
        if self.last_name.trim().is_empty() {
            return Err(RosterError::InvalidArgument(
                "last_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Record {
    pub fn new(id: u32, data: RecordData) -> Self {
        Self { id, data }
    }

    /// Canonical text form of one field
    ///
    /// This is the form queries compare against and interchange writes.
    pub fn text(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.to_string(),
            Field::FirstName => self.data.first_name.clone(),
            Field::LastName => self.data.last_name.clone(),
            Field::BirthDate => format_date(self.data.birth_date),
            Field::Balance => self.data.balance.to_string(),
            Field::Code => self.data.code.to_string(),
            Field::Flag => self.data.flag.to_string(),
        }
    }

    /// Build a record from seven text fields in declaration order
    pub fn from_texts(values: &[&str]) -> Result<Self> {
        if values.len() != Field::ALL.len() {
            return Err(RosterError::MalformedInput(format!(
                "expected {} fields, got {}",
                Field::ALL.len(),
                values.len()
            )));
        }

        let id = parse_id(values[0])?;
        let data = RecordData::new(
            values[1],
            values[2],
            parse_date(values[3])?,
            parse_balance(values[4])?,
            parse_code(values[5])?,
            parse_flag(values[6])?,
        )
        .map_err(|e| RosterError::MalformedInput(e.to_string()))?;

        Ok(Record::new(id, data))
    }
}

// =============================================================================
// Text Parsing Helpers
// =============================================================================

/// Render a date in the canonical `MM/DD/YYYY` form
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_id(text: &str) -> Result<u32> {
    let id: u32 = text
        .trim()
        .parse()
        .map_err(|_| RosterError::MalformedInput(format!("invalid id: {:?}", text)))?;
    if id == 0 {
        return Err(RosterError::MalformedInput("id must be positive".to_string()));
    }
    Ok(id)
}

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| RosterError::MalformedInput(format!("invalid date: {:?}", text)))
}

pub fn parse_balance(text: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|_| RosterError::MalformedInput(format!("invalid balance: {:?}", text)))
}

pub fn parse_code(text: &str) -> Result<i16> {
    text.trim()
        .parse()
        .map_err(|_| RosterError::MalformedInput(format!("invalid code: {:?}", text)))
}

pub fn parse_flag(text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(RosterError::MalformedInput(format!(
            "flag must be a single character: {:?}",
            text
        ))),
    }
}
