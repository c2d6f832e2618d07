//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod contest;
pub mod judge_node;
pub mod problem;
pub mod progress;
pub mod submission;

pub use contest::*;
pub use judge_node::*;
pub use problem::*;
pub use progress::*;
pub use submission::*;
