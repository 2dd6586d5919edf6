//! Utility functions for string comparison and normalization.

pub mod text;

// Re-export commonly used functions at module level
pub use text::{cmp_ignore_case, contains_ignore_case, eq_ignore_case, ids_match};
