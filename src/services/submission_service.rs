//! Submission service
//!
//! Drives one submission from validation to its final state: pick a judge
//! node, create the record, fan the test cases out to the node's execution
//! engine, poll for results, finalize and release the node.

use std::{collections::BTreeSet, sync::Arc};

use futures::future::join_all;
use uuid::Uuid;

use crate::{
    config::JudgeConfig,
    constants::{languages, CHOICE_LANGUAGE},
    db::{ProblemCatalog, SubmissionStore},
    error::{AppError, AppResult},
    handlers::submissions::request::{CreateChoiceSubmissionRequest, CreateSubmissionRequest},
    judge::{
        DispatchRequest, ExecutionEngine, NodeDirectory, NodeLease, PendingToken, PollOutcome,
        PollPolicy, RawResult, ResultPoller,
    },
    models::{
        Finalization, JudgeNode, NewSubmission, Problem, ProgressUpdate, Submission,
        SubmissionDetail, TestCase,
    },
    utils::validate_source_code,
};

use super::progress_service::ProgressTracker;

/// Judging knobs taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct JudgeSettings {
    pub poll: PollPolicy,
    /// Probe the node before dispatching
    pub liveness_probe: bool,
}

impl From<&JudgeConfig> for JudgeSettings {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            poll: PollPolicy::from(config),
            liveness_probe: config.liveness_probe,
        }
    }
}

/// Current engine view of a submission's last dispatched test case
#[derive(Debug, Clone)]
pub struct RefreshedSubmission {
    pub detail: SubmissionDetail,
    pub token: Option<String>,
    pub result: Option<RawResult>,
}

/// Submission service for business logic
#[derive(Clone)]
pub struct SubmissionService {
    submissions: Arc<dyn SubmissionStore>,
    problems: Arc<dyn ProblemCatalog>,
    nodes: Arc<dyn NodeDirectory>,
    engine: Arc<dyn ExecutionEngine>,
    progress: Arc<dyn ProgressTracker>,
    settings: JudgeSettings,
}

impl SubmissionService {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        problems: Arc<dyn ProblemCatalog>,
        nodes: Arc<dyn NodeDirectory>,
        engine: Arc<dyn ExecutionEngine>,
        progress: Arc<dyn ProgressTracker>,
        settings: JudgeSettings,
    ) -> Self {
        Self {
            submissions,
            problems,
            nodes,
            engine,
            progress,
            settings,
        }
    }

    /// Judge a code submission and return its final state
    pub async fn submit(
        &self,
        user_id: Uuid,
        payload: CreateSubmissionRequest,
    ) -> AppResult<SubmissionDetail> {
        let problem = self
            .problems
            .find_problem(payload.problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;

        let language_id = languages::engine_id(&payload.language).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported language: {}. Supported languages: {:?}",
                payload.language,
                languages::ALL
            ))
        })?;
        validate_source_code(&payload.source_code)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let node = self.nodes.select_best().await?;

        let submission = self
            .submissions
            .create(&NewSubmission {
                id: Uuid::now_v7(),
                user_id,
                problem_id: problem.id,
                context_id: payload.context_id,
                judge_node_id: Some(node.id),
                source_code: payload.source_code,
                language: payload.language,
            })
            .await?;

        tracing::info!(
            submission_id = %submission.id,
            problem_id = %problem.id,
            node = %node.name,
            language = %submission.language,
            "Submission created"
        );

        // Detached: a dropped request must not cancel judging
        let service = self.clone();
        let finalized = tokio::spawn(async move {
            service.run_to_completion(submission, problem, language_id, node).await
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

        self.detail(finalized.id).await
    }

    /// Grade a multiple-choice attempt against the problem's answer key
    pub async fn submit_choice(
        &self,
        user_id: Uuid,
        payload: CreateChoiceSubmissionRequest,
    ) -> AppResult<SubmissionDetail> {
        let problem = self
            .problems
            .find_problem(payload.problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;

        let answer_key = problem
            .choice_answers
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Problem is not a multiple-choice problem".to_string())
            })?;

        let selected = normalize_choices(&payload.answers);
        if selected.is_empty() {
            return Err(AppError::Validation("At least one answer is required".to_string()));
        }
        let correct = selected == normalize_choices(answer_key);

        let submission = self
            .submissions
            .create(&NewSubmission {
                id: Uuid::now_v7(),
                user_id,
                problem_id: problem.id,
                context_id: payload.context_id,
                judge_node_id: None,
                source_code: selected.iter().cloned().collect::<Vec<_>>().join(","),
                language: CHOICE_LANGUAGE.to_string(),
            })
            .await?;

        let finalized = self
            .submissions
            .finalize(submission.id, &Finalization::graded(correct as i32, 1, 0.0, 0.0))
            .await?;

        tracing::info!(
            submission_id = %finalized.id,
            status = %finalized.status,
            "Choice submission graded"
        );
        self.notify_progress(&finalized);

        self.detail(finalized.id).await
    }

    /// Get submission by ID
    pub async fn get(&self, id: Uuid) -> AppResult<SubmissionDetail> {
        self.detail(id).await
    }

    /// Re-read the engine result of the stored token. Nothing is written.
    pub async fn refresh(&self, id: Uuid) -> AppResult<RefreshedSubmission> {
        let detail = self.detail(id).await?;
        let token = detail.submission.judge_token.clone();

        let (Some(token_value), Some(node_id)) = (token.clone(), detail.submission.judge_node_id)
        else {
            return Ok(RefreshedSubmission {
                detail,
                token,
                result: None,
            });
        };

        let Some(node) = self.nodes.find_node(node_id).await? else {
            tracing::warn!(
                submission_id = %id,
                node_id = %node_id,
                "Judge node of submission no longer exists"
            );
            return Ok(RefreshedSubmission {
                detail,
                token,
                result: None,
            });
        };

        let result = self.engine.fetch_result(&node.base_url, &token_value).await?;

        Ok(RefreshedSubmission {
            detail,
            token,
            result: Some(result),
        })
    }

    async fn detail(&self, id: Uuid) -> AppResult<SubmissionDetail> {
        self.submissions
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    /// Reserve the node, judge, release, then notify. Always ends with the
    /// record in a terminal state.
    async fn run_to_completion(
        &self,
        submission: Submission,
        problem: Problem,
        language_id: i32,
        node: JudgeNode,
    ) -> AppResult<Submission> {
        let lease = match NodeLease::acquire(self.nodes.clone(), node.id).await {
            Ok(lease) => lease,
            Err(e) => {
                tracing::error!(
                    submission_id = %submission.id,
                    node_id = %node.id,
                    error = %e,
                    "Failed to reserve judge node"
                );
                let finalized = self
                    .submissions
                    .finalize(
                        submission.id,
                        &Finalization::internal_error("Failed to reserve judge node", 0),
                    )
                    .await?;
                self.notify_progress(&finalized);
                return Ok(finalized);
            }
        };

        let judged = self.judge(&submission, &problem, language_id, &node).await;
        lease.release().await;

        let finalized = judged?;
        tracing::info!(
            submission_id = %finalized.id,
            status = %finalized.status,
            score = ?finalized.score,
            passed = finalized.test_cases_passed,
            total = finalized.total_test_cases,
            "Submission judged"
        );
        self.notify_progress(&finalized);

        Ok(finalized)
    }

    /// Everything after the record exists. Failures here become an
    /// `InternalError` submission, except a problem without test cases.
    async fn judge(
        &self,
        submission: &Submission,
        problem: &Problem,
        language_id: i32,
        node: &JudgeNode,
    ) -> AppResult<Submission> {
        let test_cases = match self.problems.test_cases(problem.id).await {
            Ok(test_cases) => test_cases,
            Err(e) => {
                tracing::error!(
                    submission_id = %submission.id,
                    error = %e,
                    "Failed to load test cases"
                );
                return self
                    .submissions
                    .finalize(
                        submission.id,
                        &Finalization::internal_error("Failed to load test cases", 0),
                    )
                    .await;
            }
        };

        if test_cases.is_empty() {
            let finalized = self
                .submissions
                .finalize(
                    submission.id,
                    &Finalization::internal_error("Problem has no test cases", 0),
                )
                .await?;
            self.notify_progress(&finalized);
            return Err(AppError::BadRequest("Problem has no test cases".to_string()));
        }
        let total = test_cases.len() as i32;

        if self.settings.liveness_probe {
            if let Err(e) = self.engine.probe(&node.base_url).await {
                tracing::warn!(
                    submission_id = %submission.id,
                    node = %node.name,
                    error = %e,
                    "Judge node failed liveness probe"
                );
                let message = format!("Judge node {} is unreachable", node.name);
                return self
                    .submissions
                    .finalize(submission.id, &Finalization::internal_error(message, total))
                    .await;
            }
        }

        let tokens = self
            .dispatch_all(submission, problem, language_id, &node.base_url, &test_cases)
            .await;
        if tokens.is_empty() {
            return self
                .submissions
                .finalize(
                    submission.id,
                    &Finalization::internal_error(
                        "No test case could be dispatched to the judge node",
                        total,
                    ),
                )
                .await;
        }
        tracing::debug!(
            submission_id = %submission.id,
            dispatched = tokens.len(),
            total,
            "Test cases dispatched"
        );

        let last_token = tokens
            .iter()
            .max_by_key(|pending| pending.test_index)
            .map(|pending| pending.token.clone());

        let poller = ResultPoller::new(self.engine.as_ref(), &node.base_url, self.settings.poll);
        let result = match poller.await_results(tokens, test_cases.len()).await {
            PollOutcome::Completed(summary) => {
                Finalization::graded(
                    summary.passed,
                    summary.total,
                    summary.time_ms,
                    summary.memory_mb,
                )
                .with_error_text(summary.error_text)
            }
            PollOutcome::TimedOut { attempts, pending } => {
                tracing::warn!(
                    submission_id = %submission.id,
                    attempts,
                    pending,
                    "Judging timed out"
                );
                Finalization::internal_error(
                    format!(
                        "Judging timed out after {attempts} polling rounds \
                         with {pending} test case(s) unfinished"
                    ),
                    total,
                )
            }
        };

        self.submissions
            .finalize(submission.id, &result.with_token(last_token))
            .await
    }

    /// Dispatch every test case concurrently. Failed dispatches are logged
    /// and left out of the returned batch.
    async fn dispatch_all(
        &self,
        submission: &Submission,
        problem: &Problem,
        language_id: i32,
        base_url: &str,
        test_cases: &[TestCase],
    ) -> Vec<PendingToken> {
        let dispatches = test_cases.iter().enumerate().map(|(test_index, test_case)| {
            let request = DispatchRequest {
                source_code: submission.source_code.clone(),
                language_id,
                stdin: test_case.input.clone(),
                expected_output: test_case.expected_output.clone(),
                cpu_time_limit: problem.cpu_time_limit_seconds(),
                memory_limit: problem.memory_limit_kb,
                compiler_options: None,
                command_line_arguments: None,
            };

            async move {
                match self.engine.dispatch(base_url, &request).await {
                    Ok(token) => {
                        if let Err(e) = self.submissions.mark_running(submission.id, &token).await
                        {
                            tracing::warn!(
                                submission_id = %submission.id,
                                error = %e,
                                "Failed to record dispatched token"
                            );
                        }
                        Some(PendingToken { test_index, token })
                    }
                    Err(e) => {
                        tracing::warn!(
                            submission_id = %submission.id,
                            test_index,
                            error = %e,
                            "Failed to dispatch test case"
                        );
                        None
                    }
                }
            }
        });

        join_all(dispatches).await.into_iter().flatten().collect()
    }

    /// Fire-and-forget progress bookkeeping
    fn notify_progress(&self, submission: &Submission) {
        let tracker = self.progress.clone();
        let update = ProgressUpdate {
            user_id: submission.user_id,
            problem_id: submission.problem_id,
            status: submission.status,
            score: submission.score,
        };
        let submission_id = submission.id;

        tokio::spawn(async move {
            if let Err(e) = tracker.record(update).await {
                tracing::warn!(
                    submission_id = %submission_id,
                    error = %e,
                    "Failed to record progress"
                );
            }
        });
    }
}

/// Trimmed, upper-cased and de-duplicated option labels
fn normalize_choices(answers: &[String]) -> BTreeSet<String> {
    answers
        .iter()
        .map(|answer| answer.trim().to_uppercase())
        .filter(|answer| !answer.is_empty())
        .collect()
}
