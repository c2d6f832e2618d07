//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use crate::{
    config::Config,
    db::PgStore,
    error::AppResult,
    judge::{ExecutionClient, PgNodeDirectory},
    services::{ContestService, JudgeSettings, ProgressService, SubmissionService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Database connection pool
    db: PgPool,

    /// Application configuration
    config: Config,

    submissions: Arc<SubmissionService>,

    contests: Arc<ContestService>,
}

impl AppState {
    /// Wire the Postgres-backed services. Redis is optional and only feeds
    /// the node load event log.
    pub fn new(db: PgPool, redis: Option<ConnectionManager>, config: Config) -> AppResult<Self> {
        let store = Arc::new(PgStore::new(db.clone()));
        let engine = ExecutionClient::new(config.judge.http_timeout())?;

        let submissions = Arc::new(SubmissionService::new(
            store.clone(),
            store.clone(),
            Arc::new(PgNodeDirectory::new(db.clone(), redis)),
            Arc::new(engine),
            Arc::new(ProgressService::new(db.clone())),
            JudgeSettings::from(&config.judge),
        ));
        let contests = Arc::new(ContestService::new(store, submissions.clone()));

        Ok(Self::from_parts(db, config, submissions, contests))
    }

    /// Assemble state from already built services
    pub fn from_parts(
        db: PgPool,
        config: Config,
        submissions: Arc<SubmissionService>,
        contests: Arc<ContestService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                config,
                submissions,
                contests,
            }),
        }
    }

    /// Get a reference to the database pool
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.inner.submissions
    }

    pub fn contests(&self) -> &ContestService {
        &self.inner.contests
    }
}
