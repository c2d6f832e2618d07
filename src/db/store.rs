//! Storage seams used by the services
//!
//! The services depend on these traits rather than on the repositories so
//! judging and contest bookkeeping can run against in-memory stores in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::repositories::{ContestRepository, ProblemRepository, SubmissionRepository},
    error::{AppError, AppResult},
    models::{
        Contest, ContestSubmission, ContestSubmissionNames, Finalization, NewContestSubmission,
        NewSubmission, Problem, Submission, SubmissionDetail, TestCase,
    },
};

/// Submission records and their status transitions
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create(&self, new: &NewSubmission) -> AppResult<Submission>;

    /// Best-effort progress write after a successful dispatch
    async fn mark_running(&self, id: Uuid, token: &str) -> AppResult<()>;

    /// Terminal transition; fails with `Conflict` if the record is already final
    async fn finalize(&self, id: Uuid, result: &Finalization) -> AppResult<Submission>;

    async fn find_detail(&self, id: Uuid) -> AppResult<Option<SubmissionDetail>>;
}

/// Read access to problems and their test cases
#[async_trait]
pub trait ProblemCatalog: Send + Sync {
    async fn find_problem(&self, id: Uuid) -> AppResult<Option<Problem>>;

    /// Ordered test cases
    async fn test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>>;
}

/// Contest enrollment, attempt log and scoreboard counters
#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>>;

    async fn enrollment_status(&self, contest_id: Uuid, user_id: Uuid) -> AppResult<Option<String>>;

    async fn contains_problem(&self, contest_id: Uuid, problem_id: Uuid) -> AppResult<bool>;

    async fn has_accepted(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<bool>;

    async fn insert_submission(&self, new: &NewContestSubmission) -> AppResult<ContestSubmission>;

    /// Atomically claim the first accepted solution and bump the counter.
    /// Exactly one caller per (contest, student, problem) gets `true`.
    async fn claim_first_accept(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
        submission_id: Uuid,
    ) -> AppResult<bool>;

    async fn submission_names(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<ContestSubmissionNames>;
}

/// Postgres implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn create(&self, new: &NewSubmission) -> AppResult<Submission> {
        SubmissionRepository::create(&self.pool, new).await
    }

    async fn mark_running(&self, id: Uuid, token: &str) -> AppResult<()> {
        if !SubmissionRepository::mark_running(&self.pool, &id, token).await? {
            tracing::debug!(
                submission_id = %id,
                "Submission no longer in flight, token not recorded"
            );
        }
        Ok(())
    }

    async fn finalize(&self, id: Uuid, result: &Finalization) -> AppResult<Submission> {
        SubmissionRepository::finalize(&self.pool, &id, result)
            .await?
            .ok_or_else(|| AppError::Conflict("Submission is already final".to_string()))
    }

    async fn find_detail(&self, id: Uuid) -> AppResult<Option<SubmissionDetail>> {
        SubmissionRepository::find_detail(&self.pool, &id).await
    }
}

#[async_trait]
impl ProblemCatalog for PgStore {
    async fn find_problem(&self, id: Uuid) -> AppResult<Option<Problem>> {
        ProblemRepository::find_by_id(&self.pool, &id).await
    }

    async fn test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>> {
        ProblemRepository::get_test_cases(&self.pool, &problem_id).await
    }
}

#[async_trait]
impl ContestStore for PgStore {
    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>> {
        ContestRepository::find_by_id(&self.pool, &id).await
    }

    async fn enrollment_status(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<String>> {
        ContestRepository::enrollment_status(&self.pool, &contest_id, &user_id).await
    }

    async fn contains_problem(&self, contest_id: Uuid, problem_id: Uuid) -> AppResult<bool> {
        ContestRepository::contains_problem(&self.pool, &contest_id, &problem_id).await
    }

    async fn has_accepted(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<bool> {
        ContestRepository::has_accepted(&self.pool, &contest_id, &student_id, &problem_id).await
    }

    async fn insert_submission(&self, new: &NewContestSubmission) -> AppResult<ContestSubmission> {
        ContestRepository::insert_submission(&self.pool, new).await
    }

    async fn claim_first_accept(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
        submission_id: Uuid,
    ) -> AppResult<bool> {
        ContestRepository::claim_first_accept(
            &self.pool,
            &contest_id,
            &student_id,
            &problem_id,
            &submission_id,
        )
        .await
    }

    async fn submission_names(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<ContestSubmissionNames> {
        ContestRepository::submission_names(&self.pool, &contest_id, &student_id, &problem_id).await
    }
}
