//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    judge::map_status,
    models::{SubmissionDetail, SubmissionState},
    services::RefreshedSubmission,
};

/// Submission response
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub problem_id: Uuid,
    pub problem_title: String,
    pub context_id: Option<Uuid>,
    pub judge_node_id: Option<Uuid>,
    pub language: String,
    pub status: SubmissionState,
    pub score: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub error_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub judged_at: Option<DateTime<Utc>>,
}

impl From<SubmissionDetail> for SubmissionResponse {
    fn from(detail: SubmissionDetail) -> Self {
        let s = detail.submission;
        Self {
            id: s.id,
            user_id: s.user_id,
            username: detail.username,
            problem_id: s.problem_id,
            problem_title: detail.problem_title,
            context_id: s.context_id,
            judge_node_id: s.judge_node_id,
            language: s.language,
            status: s.status,
            score: s.score,
            execution_time_ms: s.execution_time_ms,
            memory_used_mb: s.memory_used_mb,
            test_cases_passed: s.test_cases_passed,
            total_test_cases: s.total_test_cases,
            error_message: s.error_message,
            submitted_at: s.submitted_at,
            judged_at: s.judged_at,
        }
    }
}

/// Engine's current view of the last dispatched test case
#[derive(Debug, Serialize)]
pub struct EngineResultView {
    pub token: String,
    pub status: SubmissionState,
    pub engine_status_id: i32,
    pub engine_status: String,
    pub time_ms: Option<f64>,
    pub memory_kb: Option<f64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshSubmissionResponse {
    pub submission: SubmissionResponse,
    pub engine_result: Option<EngineResultView>,
}

impl From<RefreshedSubmission> for RefreshSubmissionResponse {
    fn from(refreshed: RefreshedSubmission) -> Self {
        let engine_result = refreshed
            .token
            .zip(refreshed.result)
            .map(|(token, raw)| EngineResultView {
                token,
                status: map_status(raw.status.id),
                engine_status_id: raw.status.id,
                engine_status: raw.status.description,
                time_ms: raw.time.map(|seconds| seconds * 1000.0),
                memory_kb: raw.memory,
                stdout: raw.stdout,
                stderr: raw.stderr,
                compile_output: raw.compile_output,
            });

        Self {
            submission: refreshed.detail.into(),
            engine_result,
        }
    }
}
