//! Address patterns for the vanity search.

mod pattern;

pub use pattern::{Pattern, PatternType};
