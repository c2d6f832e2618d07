//! Result poller
//!
//! Polls a batch of dispatched tokens until every one is terminal or the
//! attempt budget runs out. Rounds are sequential with a fixed sleep between
//! them; the fetches inside one round run concurrently.

use std::time::Duration;

use futures::future::join_all;

use crate::{
    config::JudgeConfig,
    constants::MAX_ERROR_TEXT_BYTES,
    models::SubmissionState,
    utils::truncate_utf8,
};

use super::{
    client::{ExecutionEngine, RawResult},
    status::{is_terminal, map_status},
};

/// Attempt budget and spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&JudgeConfig::default())
    }
}

impl From<&JudgeConfig> for PollPolicy {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            max_attempts: config.poll_max_attempts.max(1),
            interval: config.poll_interval(),
        }
    }
}

/// A dispatched test case awaiting its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToken {
    pub test_index: usize,
    pub token: String,
}

/// Terminal result of one test case
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub test_index: usize,
    pub state: SubmissionState,
    pub time_ms: f64,
    pub memory_kb: f64,
    /// Compile output and stderr, when present
    pub message: Option<String>,
}

impl TestOutcome {
    fn from_raw(test_index: usize, raw: &RawResult) -> Self {
        let message = [raw.compile_output.as_deref(), raw.stderr.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            test_index,
            state: map_status(raw.status.id),
            time_ms: raw.time_ms(),
            memory_kb: raw.memory_kb(),
            message: (!message.is_empty()).then_some(message),
        }
    }

    pub fn passed(&self) -> bool {
        self.state.is_accepted()
    }
}

/// Aggregate over all terminal test cases
#[derive(Debug, Clone, PartialEq)]
pub struct PollSummary {
    pub passed: i32,
    pub total: i32,
    pub time_ms: f64,
    pub memory_mb: f64,
    pub error_text: Option<String>,
    pub outcomes: Vec<TestOutcome>,
}

impl PollSummary {
    /// Only all-pass versus not-all-pass is distinguished at this level;
    /// individual failure kinds survive in `error_text`.
    pub fn state(&self) -> SubmissionState {
        if self.total > 0 && self.passed == self.total {
            SubmissionState::Accepted
        } else {
            SubmissionState::WrongAnswer
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(PollSummary),
    TimedOut { attempts: u32, pending: usize },
}

/// Fold terminal outcomes into the submission aggregate. `total` is the
/// number of test cases the problem has, so dropped dispatches count as
/// failures.
pub fn aggregate(mut outcomes: Vec<TestOutcome>, total: usize) -> PollSummary {
    outcomes.sort_by_key(|o| o.test_index);

    let passed = outcomes.iter().filter(|o| o.passed()).count() as i32;
    let time_ms = outcomes.iter().map(|o| o.time_ms).sum();
    let memory_kb: f64 = outcomes.iter().map(|o| o.memory_kb).sum();

    let error_text = outcomes
        .iter()
        .filter_map(|o| {
            o.message
                .as_ref()
                .map(|message| format!("[Test {}] {}", o.test_index + 1, message))
        })
        .collect::<Vec<_>>()
        .join("\n");

    PollSummary {
        passed,
        total: total.max(outcomes.len()) as i32,
        time_ms,
        memory_mb: memory_kb / 1024.0,
        error_text: (!error_text.is_empty())
            .then(|| truncate_utf8(&error_text, MAX_ERROR_TEXT_BYTES).to_string()),
        outcomes,
    }
}

pub struct ResultPoller<'a> {
    engine: &'a dyn ExecutionEngine,
    base_url: &'a str,
    policy: PollPolicy,
}

impl<'a> ResultPoller<'a> {
    pub fn new(engine: &'a dyn ExecutionEngine, base_url: &'a str, policy: PollPolicy) -> Self {
        Self {
            engine,
            base_url,
            policy,
        }
    }

    /// Poll until every token is terminal or the budget is exhausted
    pub async fn await_results(&self, tokens: Vec<PendingToken>, total: usize) -> PollOutcome {
        let mut pending = tokens;
        let mut finished: Vec<TestOutcome> = Vec::with_capacity(pending.len());

        for attempt in 1..=self.policy.max_attempts {
            let fetches = pending.iter().map(|p| async move {
                let result = self.engine.fetch_result(self.base_url, &p.token).await;
                (p.test_index, result)
            });

            let mut still_pending = Vec::new();
            for ((test_index, result), entry) in join_all(fetches).await.into_iter().zip(pending) {
                match result {
                    Ok(raw) if is_terminal(raw.status.id) => {
                        finished.push(TestOutcome::from_raw(test_index, &raw));
                    }
                    Ok(_) => still_pending.push(entry),
                    Err(e) => {
                        tracing::warn!(
                            token = %entry.token,
                            test_index,
                            attempt,
                            error = %e,
                            "Failed to fetch test case result, retrying next round"
                        );
                        still_pending.push(entry);
                    }
                }
            }
            pending = still_pending;

            if pending.is_empty() {
                tracing::debug!(attempt, "All test cases reached a terminal state");
                return PollOutcome::Completed(aggregate(finished, total));
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        PollOutcome::TimedOut {
            attempts: self.policy.max_attempts,
            pending: pending.len(),
        }
    }
}
