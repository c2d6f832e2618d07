//! Progress service
//!
//! Keeps the per-user, per-problem attempt counters in step with final
//! submission states. Callers treat it as best effort.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{db::repositories::ProgressRepository, error::AppResult, models::ProgressUpdate};

/// Receives every final submission state
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    async fn record(&self, update: ProgressUpdate) -> AppResult<()>;
}

/// Postgres-backed progress tracker
pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressTracker for ProgressService {
    async fn record(&self, update: ProgressUpdate) -> AppResult<()> {
        ProgressRepository::record(&self.pool, &update).await?;
        tracing::debug!(
            user_id = %update.user_id,
            problem_id = %update.problem_id,
            status = %update.status,
            "Progress recorded"
        );
        Ok(())
    }
}
