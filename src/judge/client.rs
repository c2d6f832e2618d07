//! HTTP client for the remote execution engine

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised while talking to an execution engine
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to reach execution engine: {0}")]
    Request(#[from] reqwest::Error),

    #[error("execution engine responded with {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// One test case sent to the engine
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DispatchRequest {
    pub source_code: String,
    pub language_id: i32,
    pub stdin: String,
    pub expected_output: String,
    /// Seconds
    pub cpu_time_limit: f64,
    /// Kilobytes
    pub memory_limit: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line_arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Engine status block
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EngineStatus {
    pub id: i32,
    #[serde(default)]
    pub description: String,
}

/// Result of one test case as reported by the engine
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawResult {
    pub status: EngineStatus,
    /// Seconds; the engine sends it as a decimal string
    #[serde(default, deserialize_with = "lenient_number")]
    pub time: Option<f64>,
    /// Kilobytes
    #[serde(default, deserialize_with = "lenient_number")]
    pub memory: Option<f64>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
}

impl RawResult {
    pub fn time_ms(&self) -> f64 {
        self.time.unwrap_or(0.0) * 1000.0
    }

    pub fn memory_kb(&self) -> f64 {
        self.memory.unwrap_or(0.0)
    }
}

/// Accepts `"0.012"`, `0.012` or `null`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Operations the orchestrator needs from an execution engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Submit one test case; returns the token used to poll for it
    async fn dispatch(
        &self,
        base_url: &str,
        request: &DispatchRequest,
    ) -> Result<String, ExecutionError>;

    /// Fetch the current result for a token
    async fn fetch_result(&self, base_url: &str, token: &str) -> Result<RawResult, ExecutionError>;

    /// Liveness check
    async fn probe(&self, base_url: &str) -> Result<(), ExecutionError>;
}

/// Stateless reqwest-backed engine client; every call is bounded by the
/// client timeout and never retried here.
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    client: Client,
}

impl ExecutionClient {
    pub fn new(timeout: Duration) -> Result<Self, ExecutionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn endpoint(base_url: &str, path: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn ensure_success(res: Response) -> Result<Response, ExecutionError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(ExecutionError::UnexpectedStatus { status, body })
    }
}

#[async_trait]
impl ExecutionEngine for ExecutionClient {
    async fn dispatch(
        &self,
        base_url: &str,
        request: &DispatchRequest,
    ) -> Result<String, ExecutionError> {
        let res = self
            .client
            .post(Self::endpoint(base_url, "submissions"))
            .query(&[("base64_encoded", "false"), ("wait", "false")])
            .json(request)
            .send()
            .await?;
        let body: TokenResponse = Self::ensure_success(res).await?.json().await?;
        Ok(body.token)
    }

    async fn fetch_result(&self, base_url: &str, token: &str) -> Result<RawResult, ExecutionError> {
        let res = self
            .client
            .get(Self::endpoint(base_url, &format!("submissions/{}", token)))
            .query(&[
                ("base64_encoded", "false"),
                ("fields", "status,time,memory,stdout,stderr,compile_output"),
            ])
            .send()
            .await?;
        Ok(Self::ensure_success(res).await?.json().await?)
    }

    async fn probe(&self, base_url: &str) -> Result<(), ExecutionError> {
        let res = self.client.get(Self::endpoint(base_url, "about")).send().await?;
        Self::ensure_success(res).await?;
        Ok(())
    }
}
