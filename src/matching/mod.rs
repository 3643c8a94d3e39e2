//! Track matching: search query construction and candidate selection.

pub mod query;
pub mod selector;

pub use query::build_query;
pub use selector::{select_best_match, select_with_tier, MatchTier, Selection};
