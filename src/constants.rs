//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Number of polling rounds before a submission is declared timed out
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30;

/// Delay between two polling rounds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Timeout applied to every request sent to an execution engine
pub const DEFAULT_ENGINE_HTTP_TIMEOUT_SECS: u64 = 10;

/// Upper bound for the aggregated error text stored on a submission
pub const MAX_ERROR_TEXT_BYTES: usize = 64 * 1024;

/// Redis list receiving node load change events
pub const NODE_LOAD_EVENTS_KEY: &str = "judge:node_load_events";

/// Number of load events kept in the Redis list
pub const NODE_LOAD_EVENTS_RETAINED: isize = 1000;

/// Largest accepted source file
pub const MAX_SOURCE_CODE_BYTES: usize = 256 * 1024;

/// Language recorded for multiple-choice attempts
pub const CHOICE_LANGUAGE: &str = "choice";

// =============================================================================
// CONTESTS
// =============================================================================

/// Enrollment status that allows submitting to a contest
pub const ENROLLMENT_ENROLLED: &str = "enrolled";

/// Reported when the retired per-problem unique constraint is still present
pub const LEGACY_UNIQUE_CONFLICT: &str = "Contest submission rejected by the legacy unique \
     constraint on (contest_id, student_id, problem_id); drop it to record repeated attempts";

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers and their execution engine ids
pub mod languages {
    pub const C: &str = "c";
    pub const CPP: &str = "cpp";
    pub const JAVA: &str = "java";
    pub const PYTHON: &str = "python";
    pub const RUST: &str = "rust";
    pub const GO: &str = "go";
    pub const JAVASCRIPT: &str = "javascript";

    /// All supported language identifiers
    pub const ALL: &[&str] = &[C, CPP, JAVA, PYTHON, RUST, GO, JAVASCRIPT];

    /// Resolve the execution engine's numeric language id
    pub fn engine_id(language: &str) -> Option<i32> {
        match language {
            C => Some(50),
            CPP => Some(54),
            JAVA => Some(62),
            PYTHON => Some(71),
            RUST => Some(73),
            GO => Some(60),
            JAVASCRIPT => Some(63),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_an_engine_id() {
        for language in languages::ALL {
            assert!(languages::engine_id(language).is_some(), "{language}");
        }
        assert_eq!(languages::engine_id("brainfuck"), None);
    }
}
