//! Problem and test case models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Problem fields consumed by the judge
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub time_limit_ms: i32,
    pub memory_limit_kb: i32,
    /// Answer key for multiple-choice problems
    pub choice_answers: Option<Vec<String>>,
}

impl Problem {
    /// CPU limit in seconds as the execution engine expects it
    pub fn cpu_time_limit_seconds(&self) -> f64 {
        self.time_limit_ms as f64 / 1000.0
    }
}

/// One input / expected-output pair
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub input: String,
    pub expected_output: String,
    pub order: i32,
}
