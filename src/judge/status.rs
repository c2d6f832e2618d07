//! Execution engine status table
//!
//! The engine reports a numeric status id for every dispatched test case.
//! This table is the only place those ids are interpreted.

use crate::models::{RuntimeErrorKind, SubmissionState};

pub const IN_QUEUE: i32 = 1;
pub const PROCESSING: i32 = 2;
pub const ACCEPTED: i32 = 3;
pub const WRONG_ANSWER: i32 = 4;
pub const TIME_LIMIT_EXCEEDED: i32 = 5;
pub const COMPILATION_ERROR: i32 = 6;
pub const RUNTIME_ERROR_SIGSEGV: i32 = 7;
pub const RUNTIME_ERROR_SIGXFSZ: i32 = 8;
pub const RUNTIME_ERROR_SIGFPE: i32 = 9;
pub const RUNTIME_ERROR_SIGABRT: i32 = 10;
pub const RUNTIME_ERROR_NZEC: i32 = 11;
pub const RUNTIME_ERROR_OTHER: i32 = 12;
pub const INTERNAL_ERROR: i32 = 13;
pub const EXEC_FORMAT_ERROR: i32 = 14;

/// Whether the engine has finished with this test case
pub fn is_terminal(status_id: i32) -> bool {
    !matches!(status_id, IN_QUEUE | PROCESSING)
}

/// Translate an engine status id into the internal state.
/// Unknown ids are treated as a terminal internal error.
///
/// The engine has no memory-limit id: a process killed for exceeding its
/// limits reports `RUNTIME_ERROR_SIGXFSZ`, so `MemoryLimitExceeded` never
/// comes out of this table.
pub fn map_status(status_id: i32) -> SubmissionState {
    match status_id {
        IN_QUEUE => SubmissionState::Pending,
        PROCESSING => SubmissionState::Judging,
        ACCEPTED => SubmissionState::Accepted,
        WRONG_ANSWER => SubmissionState::WrongAnswer,
        TIME_LIMIT_EXCEEDED => SubmissionState::TimeLimitExceeded,
        COMPILATION_ERROR => SubmissionState::CompileError,
        RUNTIME_ERROR_SIGSEGV => SubmissionState::RuntimeError(RuntimeErrorKind::Segfault),
        RUNTIME_ERROR_SIGXFSZ => SubmissionState::RuntimeError(RuntimeErrorKind::ResourceLimit),
        RUNTIME_ERROR_SIGFPE => SubmissionState::RuntimeError(RuntimeErrorKind::FloatingPoint),
        RUNTIME_ERROR_SIGABRT => SubmissionState::RuntimeError(RuntimeErrorKind::Abort),
        RUNTIME_ERROR_NZEC => SubmissionState::RuntimeError(RuntimeErrorKind::NonZeroExit),
        RUNTIME_ERROR_OTHER => SubmissionState::RuntimeError(RuntimeErrorKind::Other),
        INTERNAL_ERROR => SubmissionState::InternalError,
        EXEC_FORMAT_ERROR => SubmissionState::ExecFormatError,
        _ => SubmissionState::InternalError,
    }
}

/// Score on a 0-100 scale, rounded to two decimals
pub fn compute_score(state: SubmissionState, passed: i32, total: i32) -> f64 {
    if state.is_accepted() {
        return 100.0;
    }
    if total <= 0 {
        return 0.0;
    }
    let raw = 100.0 * passed.clamp(0, total) as f64 / total as f64;
    (raw * 100.0).round() / 100.0
}
