//! Submission request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create submission request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    /// Problem ID to submit for
    pub problem_id: Uuid,

    /// Contest or class the attempt belongs to
    pub context_id: Option<Uuid>,

    /// Programming language
    #[validate(length(min = 1, max = 20))]
    pub language: String,

    /// Source code
    #[validate(length(min = 1, max = 262144))] // 256KB max
    pub source_code: String,
}

/// Multiple-choice attempt
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChoiceSubmissionRequest {
    pub problem_id: Uuid,

    pub context_id: Option<Uuid>,

    /// Selected option labels, e.g. `["A", "C"]`
    #[validate(length(min = 1, max = 26))]
    pub answers: Vec<String>,
}
