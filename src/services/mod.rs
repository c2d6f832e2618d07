//! Business logic services

pub mod contest_service;
pub mod progress_service;
pub mod submission_service;

pub use contest_service::{ContestService, ContestSubmissionDetail};
pub use progress_service::{ProgressService, ProgressTracker};
pub use submission_service::{JudgeSettings, RefreshedSubmission, SubmissionService};
