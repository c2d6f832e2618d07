//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

use crate::judge::compute_score;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub context_id: Option<Uuid>,
    pub judge_node_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub source_code: String,
    pub language: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionState,
    pub score: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub error_message: Option<String>,
    pub judge_token: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub judged_at: Option<DateTime<Utc>>,
}

/// Submission joined with the summary fields shown to callers
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionDetail {
    #[sqlx(flatten)]
    pub submission: Submission,
    pub username: String,
    pub problem_title: String,
}

/// Values needed to insert a submission in the `pending` state
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub context_id: Option<Uuid>,
    pub judge_node_id: Option<Uuid>,
    pub source_code: String,
    pub language: String,
}

/// Runtime error sub-kinds reported by the execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeErrorKind {
    General,
    Segfault,
    Abort,
    FloatingPoint,
    ResourceLimit,
    NonZeroExit,
    Other,
}

/// Lifecycle state of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    Pending,
    Running,
    Judging,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError(RuntimeErrorKind),
    CompileError,
    InternalError,
    ExecFormatError,
}

impl SubmissionState {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Judging => "judging",
            Self::Accepted => "accepted",
            Self::WrongAnswer => "wrong_answer",
            Self::TimeLimitExceeded => "time_limit_exceeded",
            Self::MemoryLimitExceeded => "memory_limit_exceeded",
            Self::RuntimeError(kind) => match kind {
                RuntimeErrorKind::General => "runtime_error",
                RuntimeErrorKind::Segfault => "runtime_error_segfault",
                RuntimeErrorKind::Abort => "runtime_error_abort",
                RuntimeErrorKind::FloatingPoint => "runtime_error_fpe",
                RuntimeErrorKind::ResourceLimit => "runtime_error_resource_limit",
                RuntimeErrorKind::NonZeroExit => "runtime_error_nzec",
                RuntimeErrorKind::Other => "runtime_error_other",
            },
            Self::CompileError => "compile_error",
            Self::InternalError => "internal_error",
            Self::ExecFormatError => "exec_format_error",
        }
    }

    /// Parse a state from its storage representation
    pub fn parse(s: &str) -> Option<Self> {
        let state = match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "judging" => Self::Judging,
            "accepted" => Self::Accepted,
            "wrong_answer" => Self::WrongAnswer,
            "time_limit_exceeded" => Self::TimeLimitExceeded,
            "memory_limit_exceeded" => Self::MemoryLimitExceeded,
            "runtime_error" => Self::RuntimeError(RuntimeErrorKind::General),
            "runtime_error_segfault" => Self::RuntimeError(RuntimeErrorKind::Segfault),
            "runtime_error_abort" => Self::RuntimeError(RuntimeErrorKind::Abort),
            "runtime_error_fpe" => Self::RuntimeError(RuntimeErrorKind::FloatingPoint),
            "runtime_error_resource_limit" => Self::RuntimeError(RuntimeErrorKind::ResourceLimit),
            "runtime_error_nzec" => Self::RuntimeError(RuntimeErrorKind::NonZeroExit),
            "runtime_error_other" => Self::RuntimeError(RuntimeErrorKind::Other),
            "compile_error" => Self::CompileError,
            "internal_error" => Self::InternalError,
            "exec_format_error" => Self::ExecFormatError,
            _ => return None,
        };
        Some(state)
    }

    /// Judging is complete once the state leaves pending/running/judging
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running | Self::Judging)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// States a finalize transition may start from
    pub const IN_FLIGHT: [SubmissionState; 3] = [Self::Pending, Self::Running, Self::Judging];
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored status string is not a known state
#[derive(Debug, thiserror::Error)]
#[error("unknown submission state: {0}")]
pub struct UnknownState(pub String);

impl TryFrom<String> for SubmissionState {
    type Error = UnknownState;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(UnknownState(value))
    }
}

impl Serialize for SubmissionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubmissionState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(UnknownState(raw)))
    }
}

/// Terminal write applied to a submission by `SubmissionStore::finalize`
#[derive(Debug, Clone, PartialEq)]
pub struct Finalization {
    pub status: SubmissionState,
    pub score: Option<f64>,
    pub execution_time_ms: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub error_message: Option<String>,
    pub judge_token: Option<String>,
}

impl Finalization {
    /// Graded outcome. The state is `Accepted` exactly when every test case
    /// passed and there was at least one, otherwise `WrongAnswer`.
    pub fn graded(passed: i32, total: i32, execution_time_ms: f64, memory_used_mb: f64) -> Self {
        let total = total.max(0);
        let passed = passed.clamp(0, total);
        let status = if total > 0 && passed == total {
            SubmissionState::Accepted
        } else {
            SubmissionState::WrongAnswer
        };

        Self {
            status,
            score: Some(compute_score(status, passed, total)),
            execution_time_ms: Some(execution_time_ms),
            memory_used_mb: Some(memory_used_mb),
            test_cases_passed: passed,
            total_test_cases: total,
            error_message: None,
            judge_token: None,
        }
    }

    /// Recovered failure after the record exists; carries no score
    pub fn internal_error(message: impl Into<String>, total: i32) -> Self {
        Self {
            status: SubmissionState::InternalError,
            score: None,
            execution_time_ms: None,
            memory_used_mb: None,
            test_cases_passed: 0,
            total_test_cases: total.max(0),
            error_message: Some(message.into()),
            judge_token: None,
        }
    }

    pub fn with_error_text(mut self, error: Option<String>) -> Self {
        self.error_message = error;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.judge_token = token;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_storage_names() {
        let states = [
            SubmissionState::Pending,
            SubmissionState::Accepted,
            SubmissionState::RuntimeError(RuntimeErrorKind::Segfault),
            SubmissionState::RuntimeError(RuntimeErrorKind::NonZeroExit),
            SubmissionState::ExecFormatError,
        ];
        for state in states {
            assert_eq!(SubmissionState::parse(state.as_str()), Some(state));
        }
        assert!(SubmissionState::try_from("bogus".to_string()).is_err());
    }

    #[test]
    fn test_terminal_states() {
        for state in SubmissionState::IN_FLIGHT {
            assert!(!state.is_terminal());
        }
        assert!(SubmissionState::InternalError.is_terminal());
        assert!(SubmissionState::RuntimeError(RuntimeErrorKind::Abort).is_terminal());
    }

    #[test]
    fn test_graded_accepts_only_full_pass() {
        let all = Finalization::graded(3, 3, 12.0, 3.0);
        assert_eq!(all.status, SubmissionState::Accepted);
        assert_eq!(all.score, Some(100.0));

        let partial = Finalization::graded(2, 3, 12.0, 3.0);
        assert_eq!(partial.status, SubmissionState::WrongAnswer);
        assert_eq!(partial.score, Some(66.67));

        let empty = Finalization::graded(0, 0, 0.0, 0.0);
        assert_eq!(empty.status, SubmissionState::WrongAnswer);
        assert_eq!(empty.score, Some(0.0));
    }

    #[test]
    fn test_graded_clamps_passed_to_total() {
        let result = Finalization::graded(5, 3, 0.0, 0.0);
        assert_eq!(result.test_cases_passed, 3);
        assert_eq!(result.status, SubmissionState::Accepted);
    }

    #[test]
    fn test_internal_error_has_no_score() {
        let result = Finalization::internal_error("engine unreachable", 4);
        assert_eq!(result.status, SubmissionState::InternalError);
        assert_eq!(result.score, None);
        assert_eq!(result.total_test_cases, 4);
        assert_eq!(result.test_cases_passed, 0);
    }

    #[test]
    fn test_state_serializes_as_storage_name() {
        let state = SubmissionState::RuntimeError(RuntimeErrorKind::FloatingPoint);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"runtime_error_fpe\"");
    }
}
