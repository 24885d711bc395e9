//! Field assignments for bulk update.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Result, RosterError};

use super::{parse_balance, parse_code, parse_date, parse_flag, Field, RecordData};

/// A typed new value for one mutable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    FirstName(String),
    LastName(String),
    BirthDate(NaiveDate),
    Balance(Decimal),
    Code(i16),
    Flag(char),
}

impl Assignment {
    pub fn apply(&self, data: &mut RecordData) {
        match self {
            Assignment::FirstName(v) => data.first_name = v.clone(),
            Assignment::LastName(v) => data.last_name = v.clone(),
            Assignment::BirthDate(v) => data.birth_date = *v,
            Assignment::Balance(v) => data.balance = *v,
            Assignment::Code(v) => data.code = *v,
            Assignment::Flag(v) => data.flag = *v,
        }
    }
}

/// Ordered list of `field = value` changes, still in text form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChanges {
    changes: Vec<(String, String)>,
}

/// Outcome of resolving [`FieldChanges`] against the field set
#[derive(Debug, Clone, Default)]
pub struct ResolvedChanges {
    pub assignments: Vec<Assignment>,
    /// Field names that matched no field
    pub unknown: Vec<String>,
}

impl ResolvedChanges {
    pub fn apply(&self, data: &mut RecordData) {
        for assignment in &self.assignments {
            assignment.apply(data);
        }
    }
}

impl FieldChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one change
    pub fn set(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.changes.push((field.into(), value.into()));
        self
    }

    /// Parse `"first_name = 'Ann', code = 5"`
    pub fn parse(text: &str) -> Result<Self> {
        let mut changes = FieldChanges::new();
        for part in split_outside_quotes(text, ',') {
            if part.trim().is_empty() {
                continue;
            }
            let (field, value) = split_assignment(&part)?;
            changes = changes.set(field, value);
        }
        if changes.is_empty() {
            return Err(RosterError::InvalidArgument(
                "no field changes given".to_string(),
            ));
        }
        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.changes.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    /// Resolve names and parse values
    ///
    /// Unknown names are collected, `id` is dropped since ids never change,
    /// and a value that does not parse for a known field is an error.
    pub fn resolve(&self) -> Result<ResolvedChanges> {
        let mut resolved = ResolvedChanges::default();

        for (name, value) in self.iter() {
            let field = match Field::lookup(name) {
                Some(field) => field,
                None => {
                    resolved.unknown.push(name.to_string());
                    continue;
                }
            };

            let invalid = |e: RosterError| {
                RosterError::InvalidArgument(format!("cannot set {}: {}", field, e))
            };

            let assignment = match field {
                Field::Id => continue,
                Field::FirstName | Field::LastName if value.trim().is_empty() => {
                    return Err(RosterError::InvalidArgument(format!(
                        "{} must not be empty",
                        field
                    )));
                }
                Field::FirstName => Assignment::FirstName(value.to_string()),
                Field::LastName => Assignment::LastName(value.to_string()),
                Field::BirthDate => Assignment::BirthDate(parse_date(value).map_err(invalid)?),
                Field::Balance => Assignment::Balance(parse_balance(value).map_err(invalid)?),
                Field::Code => Assignment::Code(parse_code(value).map_err(invalid)?),
                Field::Flag => Assignment::Flag(parse_flag(value).map_err(invalid)?),
            };
            resolved.assignments.push(assignment);
        }

        Ok(resolved)
    }
}

// =============================================================================
// Text Helpers (shared with query parsing)
// =============================================================================

/// Split `field = value`, stripping one layer of quotes from the value
pub(crate) fn split_assignment(text: &str) -> Result<(String, String)> {
    let (field, value) = text.split_once('=').ok_or_else(|| {
        RosterError::InvalidArgument(format!("expected `field = value`, got {:?}", text.trim()))
    })?;

    let field = field.trim();
    if field.is_empty() {
        return Err(RosterError::InvalidArgument(format!(
            "missing field name in {:?}",
            text.trim()
        )));
    }
    Ok((field.to_string(), unquote(value.trim()).to_string()))
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Split on `sep`, ignoring separators inside single or double quotes
pub(crate) fn split_outside_quotes(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == sep => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}
