//! Judge node directory
//!
//! Node selection and the load counter discipline: every increment is paired
//! with exactly one decrement through [`NodeLease`].

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    constants::{NODE_LOAD_EVENTS_KEY, NODE_LOAD_EVENTS_RETAINED},
    db::repositories::JudgeNodeRepository,
    error::{AppError, AppResult},
    models::JudgeNode,
};

/// Capability interface over the set of judge nodes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeDirectory: Send + Sync {
    /// Least loaded online node with spare capacity
    async fn select_best(&self) -> AppResult<JudgeNode>;

    async fn find_node(&self, node_id: Uuid) -> AppResult<Option<JudgeNode>>;

    async fn increment_load(&self, node_id: Uuid) -> AppResult<()>;

    async fn decrement_load(&self, node_id: Uuid) -> AppResult<()>;
}

/// Lowest `current_load / max_capacity` among nodes accepting work.
/// Ties go to the lower absolute load, then to the earlier entry.
pub fn pick_least_loaded(nodes: &[JudgeNode]) -> Option<&JudgeNode> {
    nodes
        .iter()
        .filter(|node| node.accepts_work())
        .filter_map(|node| node.load_ratio().map(|ratio| (ratio, node)))
        .min_by(|(a, node_a), (b, node_b)| {
            a.total_cmp(b)
                .then_with(|| node_a.current_load.cmp(&node_b.current_load))
        })
        .map(|(_, node)| node)
}

/// Postgres-backed directory; load changes are also appended to a Redis list
pub struct PgNodeDirectory {
    pool: PgPool,
    redis: Option<ConnectionManager>,
}

impl PgNodeDirectory {
    pub fn new(pool: PgPool, redis: Option<ConnectionManager>) -> Self {
        Self { pool, redis }
    }

    /// Best effort; failures never affect the load counter itself
    async fn record_load_event(&self, node_id: Uuid, delta: i32, current_load: i32) {
        let Some(mut redis) = self.redis.clone() else {
            return;
        };

        let event = serde_json::json!({
            "node_id": node_id,
            "delta": delta,
            "current_load": current_load,
            "at": chrono::Utc::now(),
        })
        .to_string();

        let pushed: redis::RedisResult<()> = async {
            redis.lpush::<_, _, ()>(NODE_LOAD_EVENTS_KEY, event).await?;
            redis
                .ltrim::<_, ()>(NODE_LOAD_EVENTS_KEY, 0, NODE_LOAD_EVENTS_RETAINED - 1)
                .await
        }
        .await;

        if let Err(e) = pushed {
            tracing::warn!(node_id = %node_id, error = %e, "Failed to record node load event");
        }
    }
}

#[async_trait]
impl NodeDirectory for PgNodeDirectory {
    async fn select_best(&self) -> AppResult<JudgeNode> {
        let nodes = JudgeNodeRepository::list_online(&self.pool).await?;
        pick_least_loaded(&nodes)
            .cloned()
            .ok_or_else(|| AppError::BadGateway("No judge node available".to_string()))
    }

    async fn find_node(&self, node_id: Uuid) -> AppResult<Option<JudgeNode>> {
        JudgeNodeRepository::find_by_id(&self.pool, &node_id).await
    }

    async fn increment_load(&self, node_id: Uuid) -> AppResult<()> {
        let load = JudgeNodeRepository::adjust_load(&self.pool, &node_id, 1).await?;
        tracing::debug!(node_id = %node_id, current_load = load, "Node load incremented");
        self.record_load_event(node_id, 1, load).await;
        Ok(())
    }

    async fn decrement_load(&self, node_id: Uuid) -> AppResult<()> {
        let load = JudgeNodeRepository::adjust_load(&self.pool, &node_id, -1).await?;
        tracing::debug!(node_id = %node_id, current_load = load, "Node load decremented");
        self.record_load_event(node_id, -1, load).await;
        Ok(())
    }
}

/// One unit of load held on a node.
///
/// `release` decrements exactly once. A lease dropped without being released
/// (early return, panic) schedules the decrement on the current runtime.
pub struct NodeLease {
    directory: Arc<dyn NodeDirectory>,
    node_id: Uuid,
    released: bool,
}

impl std::fmt::Debug for NodeLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeLease")
            .field("node_id", &self.node_id)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl NodeLease {
    /// Increment the node's load and hold it until release
    pub async fn acquire(directory: Arc<dyn NodeDirectory>, node_id: Uuid) -> AppResult<Self> {
        directory.increment_load(node_id).await?;
        Ok(Self {
            directory,
            node_id,
            released: false,
        })
    }

    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.directory.decrement_load(self.node_id).await {
            tracing::error!(node_id = %self.node_id, error = %e, "Failed to release node load");
        }
    }
}

impl Drop for NodeLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let directory = self.directory.clone();
        let node_id = self.node_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    node_id = %node_id,
                    "Node lease dropped without release, decrementing in background"
                );
                handle.spawn(async move {
                    if let Err(e) = directory.decrement_load(node_id).await {
                        tracing::error!(
                            node_id = %node_id,
                            error = %e,
                            "Failed to release node load"
                        );
                    }
                });
            }
            Err(_) => {
                tracing::error!(
                    node_id = %node_id,
                    "Node lease dropped outside a runtime, load not released"
                );
            }
        }
    }
}
