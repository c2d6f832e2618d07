//! Contest response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{models::SubmissionState, services::ContestSubmissionDetail};

/// One logged contest attempt
#[derive(Debug, Serialize)]
pub struct ContestSubmissionResponse {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub contest_title: String,
    pub submission_id: Uuid,
    pub student_id: Uuid,
    pub username: String,
    pub problem_id: Uuid,
    pub problem_title: String,
    pub language: String,
    pub status: SubmissionState,
    pub score: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub submitted_at: DateTime<Utc>,
    pub solved_at: Option<DateTime<Utc>>,
    /// Counted on the scoreboard as the first accepted solution
    pub first_accepted: bool,
}

impl From<ContestSubmissionDetail> for ContestSubmissionResponse {
    fn from(detail: ContestSubmissionDetail) -> Self {
        let row = detail.contest_submission;
        Self {
            id: row.id,
            contest_id: row.contest_id,
            contest_title: detail.names.contest_title,
            submission_id: row.submission_id,
            student_id: row.student_id,
            username: detail.names.username,
            problem_id: row.problem_id,
            problem_title: detail.names.problem_title,
            language: row.language,
            status: row.status,
            score: row.score,
            execution_time_ms: row.execution_time_ms,
            memory_used_mb: row.memory_used_mb,
            test_cases_passed: row.test_cases_passed,
            total_test_cases: row.total_test_cases,
            submitted_at: row.submitted_at,
            solved_at: row.solved_at,
            first_accepted: detail.first_accepted,
        }
    }
}
