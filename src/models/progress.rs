//! Per-user problem progress model

use uuid::Uuid;

use super::SubmissionState;

/// Notification sent after a submission reaches a final state
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub status: SubmissionState,
    pub score: Option<f64>,
}
