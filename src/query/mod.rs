//! Query Module
//!
//! Predicate-based record selection shared by find, update and delete.
//!
//! ## Responsibilities
//! - Parse flat `field = value` criteria joined by a single AND or OR
//! - Compare fields by canonical text form
//! - Select the matching subset of any record collection
//!
//! ## Semantics
//! ```text
//! AND  every criterion must match   (empty criteria → no records)
//! OR   at least one must match      (each record reported once)
//! ```
//!
//! Nothing here knows about a particular store: both backends run the
//! same evaluator over their own record representation.

mod criteria;
mod evaluator;

pub use criteria::{Combinator, Criteria, Criterion};
pub use evaluator::{canonical_target, canonical_text, field_matches, select};
