//! Submission repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Finalization, NewSubmission, Submission, SubmissionDetail, SubmissionState},
};

/// Repository for submission database operations
pub struct SubmissionRepository;

impl SubmissionRepository {
    /// Insert a new submission in the `pending` state
    pub async fn create(pool: &PgPool, new: &NewSubmission) -> AppResult<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (
                id, user_id, problem_id, context_id, judge_node_id,
                source_code, language, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.user_id)
        .bind(new.problem_id)
        .bind(new.context_id)
        .bind(new.judge_node_id)
        .bind(&new.source_code)
        .bind(&new.language)
        .bind(SubmissionState::Pending.as_str())
        .fetch_one(pool)
        .await?;

        Ok(submission)
    }

    /// Find submission with username and problem title
    pub async fn find_detail(pool: &PgPool, id: &Uuid) -> AppResult<Option<SubmissionDetail>> {
        let detail = sqlx::query_as::<_, SubmissionDetail>(
            r#"
            SELECT s.*, u.username, p.title AS problem_title
            FROM submissions s
            JOIN users u ON u.id = s.user_id
            JOIN problems p ON p.id = s.problem_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(detail)
    }

    /// Record a dispatched token and move the submission to `running`.
    /// Returns false when the submission already left the in-flight states.
    pub async fn mark_running(pool: &PgPool, id: &Uuid, token: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2, judge_token = $3
            WHERE id = $1 AND status = ANY($4)
            "#,
        )
        .bind(id)
        .bind(SubmissionState::Running.as_str())
        .bind(token)
        .bind(in_flight_states())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply the terminal write. `None` means the submission was missing or
    /// already final.
    pub async fn finalize(
        pool: &PgPool,
        id: &Uuid,
        result: &Finalization,
    ) -> AppResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET
                status = $2,
                score = $3,
                execution_time_ms = $4,
                memory_used_mb = $5,
                test_cases_passed = $6,
                total_test_cases = $7,
                error_message = $8,
                judge_token = COALESCE($9, judge_token),
                judged_at = NOW()
            WHERE id = $1 AND status = ANY($10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(result.status.as_str())
        .bind(result.score)
        .bind(result.execution_time_ms)
        .bind(result.memory_used_mb)
        .bind(result.test_cases_passed)
        .bind(result.total_test_cases)
        .bind(&result.error_message)
        .bind(&result.judge_token)
        .bind(in_flight_states())
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }
}

fn in_flight_states() -> Vec<String> {
    SubmissionState::IN_FLIGHT
        .iter()
        .map(|state| state.as_str().to_string())
        .collect()
}
