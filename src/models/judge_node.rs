//! Judge node model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Remote worker exposing the execution engine API
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JudgeNode {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub current_load: i32,
    pub max_capacity: i32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JudgeNode {
    /// `current_load / max_capacity`, or `None` for a node without capacity
    pub fn load_ratio(&self) -> Option<f64> {
        if self.max_capacity <= 0 {
            return None;
        }
        Some(self.current_load.max(0) as f64 / self.max_capacity as f64)
    }

    /// Online and below capacity
    pub fn accepts_work(&self) -> bool {
        self.is_online && self.max_capacity > 0 && self.current_load < self.max_capacity
    }
}
