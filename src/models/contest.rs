//! Contest models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::SubmissionState;

/// Contest database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contest {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One attempt inside one contest (append-only log row)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContestSubmission {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub submission_id: Uuid,
    pub student_id: Uuid,
    pub problem_id: Uuid,
    #[serde(skip_serializing)]
    pub code: String,
    pub language: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionState,
    pub score: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub submitted_at: DateTime<Utc>,
    pub solved_at: Option<DateTime<Utc>>,
}

/// Values copied from a finished submission into the contest log
#[derive(Debug, Clone)]
pub struct NewContestSubmission {
    pub contest_id: Uuid,
    pub submission_id: Uuid,
    pub student_id: Uuid,
    pub problem_id: Uuid,
    pub code: String,
    pub language: String,
    pub status: SubmissionState,
    pub score: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub submitted_at: DateTime<Utc>,
    pub solved_at: Option<DateTime<Utc>>,
}

/// Display names joined onto a contest submission
#[derive(Debug, Clone, Default, FromRow)]
pub struct ContestSubmissionNames {
    pub username: String,
    pub problem_title: String,
    pub contest_title: String,
}
