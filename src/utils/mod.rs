//! Utility functions

pub mod text;
pub mod validation;

pub use text::truncate_utf8;
pub use validation::validate_source_code;
