//! Query evaluator
//!
//! Decides matches by comparing canonical text forms.

use std::collections::HashSet;

use crate::record::{format_date, parse_balance, parse_code, parse_date, parse_id, Field, Record};

use super::{Combinator, Criteria};

/// Canonical text of a record field, as compared by queries
///
/// Balances are normalized so `10.5` and `10.50` compare equal.
pub fn canonical_text(record: &Record, field: Field) -> String {
    match field {
        Field::Balance => record.data.balance.normalize().to_string(),
        _ => record.text(field),
    }
}

/// Canonical text of a criterion target
///
/// Targets that parse as the field's type are rendered the way the field
/// would be; anything else is compared as given (and so never matches a
/// typed field).
pub fn canonical_target(field: Field, target: &str) -> String {
    if field == Field::Flag {
        return canonical_flag(target).to_string();
    }

    let target = target.trim();
    let canonical = match field {
        Field::Id => parse_id(target).ok().map(|id| id.to_string()),
        Field::Code => parse_code(target).ok().map(|code| code.to_string()),
        Field::BirthDate => parse_date(target).ok().map(format_date),
        Field::Balance => parse_balance(target)
            .ok()
            .map(|b| b.normalize().to_string()),
        Field::FirstName | Field::LastName | Field::Flag => None,
    };
    canonical.unwrap_or_else(|| target.to_string())
}

/// A flag target with surrounding padding removed
///
/// A target that is all whitespace names a whitespace flag and is kept.
fn canonical_flag(target: &str) -> &str {
    match target.trim() {
        "" => target,
        trimmed => trimmed,
    }
}

/// Whether one field of a record equals the target
///
/// Names compare case-insensitively as whole strings; every other field
/// compares exactly.
pub fn field_matches(record: &Record, field: Field, target: &str) -> bool {
    let actual = canonical_text(record, field);
    match field {
        Field::FirstName | Field::LastName => {
            actual.to_lowercase() == target.trim().to_lowercase()
        }
        _ => actual == canonical_target(field, target),
    }
}

/// Select the records matching a criteria set, in input order
///
/// Under AND an empty criteria set selects nothing. Under OR a record that
/// matches several criteria is still reported once; records sharing an id
/// are reported once as well.
pub fn select<'a, I>(criteria: &Criteria, records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    if criteria.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let selected: Vec<&Record> = records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .filter(|record| criteria.combinator() == Combinator::And || seen.insert(record.id))
        .collect();

    tracing::debug!(
        criteria = %criteria,
        matched = selected.len(),
        "Evaluated criteria"
    );
    selected
}
