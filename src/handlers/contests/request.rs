//! Contest request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::submissions::request::{CreateChoiceSubmissionRequest, CreateSubmissionRequest};

/// Code submission to a contest problem
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContestSubmissionRequest {
    pub problem_id: Uuid,

    #[validate(length(min = 1, max = 20))]
    pub language: String,

    #[validate(length(min = 1, max = 262144))]
    pub source_code: String,
}

impl CreateContestSubmissionRequest {
    pub fn into_submission(self, contest_id: Uuid) -> CreateSubmissionRequest {
        CreateSubmissionRequest {
            problem_id: self.problem_id,
            context_id: Some(contest_id),
            language: self.language,
            source_code: self.source_code,
        }
    }
}

/// Multiple-choice attempt on a contest problem
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContestChoiceRequest {
    pub problem_id: Uuid,

    #[validate(length(min = 1, max = 26))]
    pub answers: Vec<String>,
}

impl CreateContestChoiceRequest {
    pub fn into_submission(self, contest_id: Uuid) -> CreateChoiceSubmissionRequest {
        CreateChoiceSubmissionRequest {
            problem_id: self.problem_id,
            context_id: Some(contest_id),
            answers: self.answers,
        }
    }
}
