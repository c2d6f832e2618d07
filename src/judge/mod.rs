//! Judging pipeline building blocks
//!
//! - `status`: engine status table, terminal check and scoring
//! - `client`: HTTP client for the execution engine
//! - `node`: judge node selection and load leases
//! - `poller`: batch result polling and aggregation

pub mod client;
pub mod node;
pub mod poller;
pub mod status;

pub use client::{
    DispatchRequest, EngineStatus, ExecutionClient, ExecutionEngine, ExecutionError, RawResult,
};
pub use node::{pick_least_loaded, NodeDirectory, NodeLease, PgNodeDirectory};
pub use poller::{
    aggregate, PendingToken, PollOutcome, PollPolicy, PollSummary, ResultPoller, TestOutcome,
};
pub use status::{compute_score, is_terminal, map_status};

#[cfg(test)]
pub use client::MockExecutionEngine;
#[cfg(test)]
pub use node::MockNodeDirectory;
