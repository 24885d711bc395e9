//! Criteria definitions
//!
//! Stateless value objects describing which records to select.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RosterError};
use crate::record::change::{split_assignment, split_outside_quotes};
use crate::record::{Field, Record};

use super::evaluator::field_matches;

/// How the criteria of a set combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("and") {
            Ok(Combinator::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(Combinator::Or)
        } else {
            Err(RosterError::InvalidArgument(format!(
                "unknown combinator: {:?}",
                s
            )))
        }
    }
}

/// One `field = value` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub field: Field,
    /// Target value in text form, as given by the caller
    pub target: String,
}

impl Criterion {
    /// Build a criterion, failing on unknown field names
    pub fn new(field: &str, target: impl Into<String>) -> Result<Self> {
        Ok(Self {
            field: field.parse()?,
            target: target.into(),
        })
    }

    /// Parse a single `field = value` predicate
    ///
    /// An unquoted `and`/`or` after a complete predicate is rejected, since
    /// a single predicate cannot combine with another.
    pub fn parse(text: &str) -> Result<Self> {
        let (combinator, predicates) = split_predicates(text, false)?;
        if combinator.is_some() || predicates.len() != 1 {
            return Err(RosterError::InvalidArgument(format!(
                "expected a single `field = value` predicate, got {:?}",
                text.trim()
            )));
        }
        Self::parse_one(&predicates[0])
    }

    fn parse_one(predicate: &str) -> Result<Self> {
        let (field, value) = split_assignment(predicate)?;
        Self::new(&field, value)
    }

    pub fn matches(&self, record: &Record) -> bool {
        field_matches(record, self.field, &self.target)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = '{}'", self.field, self.target)
    }
}

/// A field → value mapping combined by one [`Combinator`]
///
/// Field names are case-insensitive; setting the same field twice keeps the
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    criteria: Vec<Criterion>,
    combinator: Combinator,
}

impl Criteria {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            criteria: Vec::new(),
            combinator,
        }
    }

    pub fn and() -> Self {
        Self::new(Combinator::And)
    }

    pub fn or() -> Self {
        Self::new(Combinator::Or)
    }

    /// Add or replace the target for a field
    pub fn with(mut self, field: &str, target: impl Into<String>) -> Result<Self> {
        self.push(Criterion::new(field, target)?);
        Ok(self)
    }

    fn push(&mut self, criterion: Criterion) {
        match self.criteria.iter_mut().find(|c| c.field == criterion.field) {
            Some(existing) => existing.target = criterion.target,
            None => self.criteria.push(criterion),
        }
    }

    /// Parse `field = value [and|or field = value ...]`
    ///
    /// A leading `where` is accepted. Values may be single or double quoted;
    /// `and` and `or` cannot be mixed in one criteria set.
    pub fn parse(text: &str) -> Result<Self> {
        let (combinator, predicates) = split_predicates(text, true)?;

        let mut criteria = Criteria::new(combinator.unwrap_or_default());
        if predicates.len() == 1 && predicates[0].is_empty() {
            return Ok(criteria);
        }
        for predicate in &predicates {
            criteria.push(Criterion::parse_one(predicate)?);
        }
        Ok(criteria)
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Same criteria under a different combinator
    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Whether a record satisfies the whole set
    ///
    /// An empty set matches nothing under either combinator.
    pub fn matches(&self, record: &Record) -> bool {
        if self.criteria.is_empty() {
            return false;
        }
        match self.combinator {
            Combinator::And => self.criteria.iter().all(|c| c.matches(record)),
            Combinator::Or => self.criteria.iter().any(|c| c.matches(record)),
        }
    }
}

/// Split criteria text into predicates and the combinator joining them
///
/// A token reads as a combinator only once the current predicate has a
/// value, so `last_name = Or` is a predicate, not a dangling `or`.
fn split_predicates(text: &str, allow_where: bool) -> Result<(Option<Combinator>, Vec<String>)> {
    let tokens: Vec<String> = split_outside_quotes(text, ' ')
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect();

    let mut tokens = tokens.as_slice();
    if allow_where && tokens.first().is_some_and(|t| t.eq_ignore_ascii_case("where")) {
        tokens = &tokens[1..];
    }

    let mut combinator: Option<Combinator> = None;
    let mut predicates: Vec<String> = vec![String::new()];

    for token in tokens {
        let current = predicates.last().map_or("", String::as_str);
        if has_value(current) {
            if let Ok(next) = token.parse::<Combinator>() {
                if combinator.is_some_and(|c| c != next) {
                    return Err(RosterError::InvalidArgument(
                        "cannot mix AND and OR in one criteria set".to_string(),
                    ));
                }
                combinator = Some(next);
                predicates.push(String::new());
                continue;
            }
        }

        if let Some(current) = predicates.last_mut() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(token);
        }
    }

    if predicates.len() > 1 && predicates.iter().any(|p| !has_value(p)) {
        return Err(RosterError::InvalidArgument(format!(
            "dangling combinator in {:?}",
            text.trim()
        )));
    }
    Ok((combinator, predicates))
}

/// Whether a partial predicate already reads `field = <something>`
fn has_value(predicate: &str) -> bool {
    predicate
        .split_once('=')
        .is_some_and(|(_, value)| !value.trim().is_empty())
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joiner = match self.combinator {
            Combinator::And => " and ",
            Combinator::Or => " or ",
        };
        for (i, criterion) in self.criteria.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            write!(f, "{}", criterion)?;
        }
        Ok(())
    }
}
