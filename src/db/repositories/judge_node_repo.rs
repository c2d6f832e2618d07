//! Judge node repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::JudgeNode,
};

/// Repository for judge node database operations
pub struct JudgeNodeRepository;

impl JudgeNodeRepository {
    /// Online nodes in registration order
    pub async fn list_online(pool: &PgPool) -> AppResult<Vec<JudgeNode>> {
        let nodes = sqlx::query_as::<_, JudgeNode>(
            r#"
            SELECT * FROM judge_nodes
            WHERE is_online = TRUE
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(nodes)
    }

    /// Find node by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<JudgeNode>> {
        let node = sqlx::query_as::<_, JudgeNode>(r#"SELECT * FROM judge_nodes WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(node)
    }

    /// Atomically add `delta` to the node's load, never going below zero.
    /// Returns the new load.
    pub async fn adjust_load(pool: &PgPool, id: &Uuid, delta: i32) -> AppResult<i32> {
        let load: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE judge_nodes
            SET current_load = GREATEST(current_load + $2, 0), updated_at = NOW()
            WHERE id = $1
            RETURNING current_load
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(pool)
        .await?;

        load.ok_or_else(|| AppError::NotFound("Judge node not found".to_string()))
    }
}
