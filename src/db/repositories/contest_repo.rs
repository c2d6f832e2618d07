//! Contest repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    constants::{ENROLLMENT_ENROLLED, LEGACY_UNIQUE_CONFLICT},
    error::{AppError, AppResult},
    models::{
        Contest, ContestSubmission, ContestSubmissionNames, NewContestSubmission, SubmissionState,
    },
};

/// Repository for contest database operations
pub struct ContestRepository;

impl ContestRepository {
    /// Find contest by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"SELECT id, title, start_time, end_time FROM contests WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(contest)
    }

    /// Enrollment status of a user, if enrolled at all
    pub async fn enrollment_status(
        pool: &PgPool,
        contest_id: &Uuid,
        user_id: &Uuid,
    ) -> AppResult<Option<String>> {
        let status = sqlx::query_scalar(
            r#"SELECT status FROM contest_users WHERE contest_id = $1 AND user_id = $2"#,
        )
        .bind(contest_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(status)
    }

    /// Check if a problem is part of a contest
    pub async fn contains_problem(
        pool: &PgPool,
        contest_id: &Uuid,
        problem_id: &Uuid,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contest_problems
                WHERE contest_id = $1 AND problem_id = $2
            )
            "#,
        )
        .bind(contest_id)
        .bind(problem_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Whether the student already has an accepted attempt on the problem
    pub async fn has_accepted(
        pool: &PgPool,
        contest_id: &Uuid,
        student_id: &Uuid,
        problem_id: &Uuid,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contest_submissions
                WHERE contest_id = $1 AND student_id = $2 AND problem_id = $3 AND status = $4
            )
            "#,
        )
        .bind(contest_id)
        .bind(student_id)
        .bind(problem_id)
        .bind(SubmissionState::Accepted.as_str())
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Append one attempt to the contest log
    pub async fn insert_submission(
        pool: &PgPool,
        new: &NewContestSubmission,
    ) -> AppResult<ContestSubmission> {
        let row = sqlx::query_as::<_, ContestSubmission>(
            r#"
            INSERT INTO contest_submissions (
                contest_id, submission_id, student_id, problem_id, code, language,
                status, score, execution_time_ms, memory_used_mb,
                test_cases_passed, total_test_cases, submitted_at, solved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(new.contest_id)
        .bind(new.submission_id)
        .bind(new.student_id)
        .bind(new.problem_id)
        .bind(&new.code)
        .bind(&new.language)
        .bind(new.status.as_str())
        .bind(new.score)
        .bind(new.execution_time_ms)
        .bind(new.memory_used_mb)
        .bind(new.test_cases_passed)
        .bind(new.total_test_cases)
        .bind(new.submitted_at)
        .bind(new.solved_at)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(LEGACY_UNIQUE_CONFLICT.to_string())
            }
            other => other.into(),
        })?;

        Ok(row)
    }

    /// Claim the first-accept marker and bump the scoreboard counter in one
    /// transaction. Returns true only for the caller whose insert took effect.
    pub async fn claim_first_accept(
        pool: &PgPool,
        contest_id: &Uuid,
        student_id: &Uuid,
        problem_id: &Uuid,
        submission_id: &Uuid,
    ) -> AppResult<bool> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            INSERT INTO contest_first_accepts (contest_id, student_id, problem_id, submission_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (contest_id, student_id, problem_id) DO NOTHING
            "#,
        )
        .bind(contest_id)
        .bind(student_id)
        .bind(problem_id)
        .bind(submission_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if claimed {
            sqlx::query(
                r#"
                UPDATE contest_users
                SET accepted_count = accepted_count + 1
                WHERE contest_id = $1 AND user_id = $2 AND status = $3
                "#,
            )
            .bind(contest_id)
            .bind(student_id)
            .bind(ENROLLMENT_ENROLLED)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(claimed)
    }

    /// Display names for a contest submission; missing rows yield empty names
    pub async fn submission_names(
        pool: &PgPool,
        contest_id: &Uuid,
        student_id: &Uuid,
        problem_id: &Uuid,
    ) -> AppResult<ContestSubmissionNames> {
        let names = sqlx::query_as::<_, ContestSubmissionNames>(
            r#"
            SELECT
                COALESCE((SELECT username FROM users WHERE id = $2), '') AS username,
                COALESCE((SELECT title FROM problems WHERE id = $3), '') AS problem_title,
                COALESCE((SELECT title FROM contests WHERE id = $1), '') AS contest_title
            "#,
        )
        .bind(contest_id)
        .bind(student_id)
        .bind(problem_id)
        .fetch_one(pool)
        .await?;

        Ok(names)
    }
}
