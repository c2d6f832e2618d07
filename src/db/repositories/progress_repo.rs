//! User problem progress repository

use sqlx::PgPool;

use crate::{error::AppResult, models::ProgressUpdate};

/// Repository for per-user problem progress
pub struct ProgressRepository;

impl ProgressRepository {
    /// Count one more attempt and fold in its outcome
    pub async fn record(pool: &PgPool, update: &ProgressUpdate) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_problem_progress (
                user_id, problem_id, attempts, solved, best_score, last_status, updated_at
            )
            VALUES ($1, $2, 1, $3, $4, $5, NOW())
            ON CONFLICT (user_id, problem_id) DO UPDATE
            SET
                attempts = user_problem_progress.attempts + 1,
                solved = user_problem_progress.solved OR EXCLUDED.solved,
                best_score = GREATEST(user_problem_progress.best_score, EXCLUDED.best_score),
                last_status = EXCLUDED.last_status,
                updated_at = NOW()
            "#,
        )
        .bind(update.user_id)
        .bind(update.problem_id)
        .bind(update.status.is_accepted())
        .bind(update.score)
        .bind(update.status.as_str())
        .execute(pool)
        .await?;

        Ok(())
    }
}
