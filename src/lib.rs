//! JudgeFlow - Submission dispatch and grading orchestrator
//!
//! This library provides the judging core of an online coding-judge and
//! contest platform. Submitted source code is dispatched test case by test
//! case to a remote execution engine running on a judge node, polled until
//! every test case is finished, graded and persisted.
//!
//! # Features
//!
//! - Least-loaded judge node selection with guaranteed load release
//! - Concurrent dispatch and polling against a Judge0-style engine
//! - Partial scoring and a fixed engine status table
//! - Contest attempt log with race-free first-accept counting
//! - Multiple-choice grading
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Business logic
//! - **Judge**: Engine client, node directory and result poller
//! - **Repositories**: Database access
//! - **Models**: Domain models and DTOs

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod judge;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
