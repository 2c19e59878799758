//! Batch REST API client.
//!
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Observability (tracing spans, metrics)
//!
//! Requests are sent once. Callers decide whether a failure is worth
//! resubmitting; see [`BatchError::is_retryable`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{BatchError, BatchResult};
use crate::metrics::record_request;
use crate::token_cache::{AccessTokenSource, TokenCache};
use crate::types::Job;

/// Public Batch API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://batch.googleapis.com/v1";

/// Region used when `GCP_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-central1";

// =============================================================================
// Configuration
// =============================================================================

/// Batch client configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// GCP project ID
    pub project_id: String,
    /// Region jobs are created in
    pub region: String,
    /// API base URL, without trailing slash
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl BatchConfig {
    pub fn new(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Point the client at another endpoint (emulator, test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> BatchResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("GOOGLE_CLOUD_PROJECT"))
            .map_err(|_| {
                BatchError::config_error(
                    "GCP_PROJECT_ID or GOOGLE_CLOUD_PROJECT must be set to submit batch jobs",
                )
            })?;

        if project_id.is_empty() {
            return Err(BatchError::config_error(
                "GCP_PROJECT_ID or GOOGLE_CLOUD_PROJECT cannot be empty",
            ));
        }

        let region = std::env::var("GCP_REGION")
            .ok()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let timeout_secs: u64 = std::env::var("BATCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("BATCH_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let config = Self {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            ..Self::new(project_id, region)
        };

        Ok(match std::env::var("BATCH_API_ENDPOINT") {
            Ok(endpoint) if !endpoint.is_empty() => config.with_endpoint(endpoint),
            _ => config,
        })
    }

    /// Parent resource for jobs: `projects/<project>/locations/<region>`.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.region)
    }
}

// =============================================================================
// API seam
// =============================================================================

/// Remote batch service, as seen by job submitters.
#[async_trait]
pub trait BatchApi: Send + Sync {
    /// Parent resource jobs are created under.
    fn parent(&self) -> String;

    /// Create `job` with the given id and return the stored resource.
    async fn create_job(&self, job_id: &str, job: &Job) -> BatchResult<Job>;
}

// =============================================================================
// Client
// =============================================================================

/// Batch REST API client.
#[derive(Clone)]
pub struct BatchClient {
    http: Client,
    config: BatchConfig,
    tokens: Arc<dyn AccessTokenSource>,
}

impl BatchClient {
    /// Create a client authenticated with Application Default Credentials.
    ///
    /// `GOOGLE_APPLICATION_CREDENTIALS` is tried first; otherwise gcp_auth
    /// falls back to the metadata server or the gcloud CLI.
    pub async fn new(config: BatchConfig) -> BatchResult<Self> {
        let auth = Self::create_auth_provider().await?;
        Self::with_token_source(config, Arc::new(TokenCache::new(auth)))
    }

    /// Create a client with an explicit token source.
    pub fn with_token_source(
        config: BatchConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> BatchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("render-batch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BatchError::Network)?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    async fn create_auth_provider() -> BatchResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            BatchError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => gcp_auth::provider().await.map_err(|e| {
                BatchError::auth_error(format!(
                    "No Google credentials found (set GOOGLE_APPLICATION_CREDENTIALS): {}",
                    e
                ))
            }),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Full resource name of a job.
    pub fn job_name(&self, job_id: &str) -> String {
        format!("{}/jobs/{}", self.config.parent(), job_id)
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Create a job. Sends exactly one request.
    pub async fn create_job(&self, job_id: &str, job: &Job) -> BatchResult<Job> {
        let url = format!(
            "{}/{}/jobs?jobId={}",
            self.config.endpoint,
            self.config.parent(),
            urlencoding::encode(job_id)
        );

        self.execute_request("create_job", job_id, async {
            let token = self.tokens.access_token().await?;
            let response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(job)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    // 2xx means the job exists; decode failures are not transport errors.
                    let body = response.text().await?;
                    serde_json::from_str::<Job>(&body).map_err(|e| {
                        BatchError::invalid_response(format!(
                            "job {} was created but the response could not be decoded: {}",
                            job_id, e
                        ))
                    })
                }
                StatusCode::UNAUTHORIZED => {
                    let body = response.text().await.unwrap_or_default();
                    if Self::is_access_token_expired(&body) {
                        // Next call fetches a fresh token; this one is not resent.
                        self.tokens.invalidate().await;
                    }
                    Err(BatchError::from_http_status(status.as_u16(), body))
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, job_id: &str, fut: F) -> BatchResult<T>
    where
        F: std::future::Future<Output = BatchResult<T>>,
    {
        let span = info_span!(
            "batch_request",
            operation = %operation,
            parent = %self.config.parent(),
            job_id = %job_id
        );

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);
        debug!(operation, status, latency_ms, "Batch request finished");

        result
    }

    async fn handle_error_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> BatchError {
        let body = response.text().await.unwrap_or_default();
        debug!(%url, status = status.as_u16(), "Batch request rejected");
        BatchError::from_http_status(status.as_u16(), body)
    }
}

#[async_trait]
impl BatchApi for BatchClient {
    fn parent(&self) -> String {
        self.config.parent()
    }

    async fn create_job(&self, job_id: &str, job: &Job) -> BatchResult<Job> {
        BatchClient::create_job(self, job_id, job).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_cache::StaticToken;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "GCP_PROJECT_ID",
            "GOOGLE_CLOUD_PROJECT",
            "GCP_REGION",
            "BATCH_API_ENDPOINT",
            "BATCH_TIMEOUT_SECS",
            "BATCH_CONNECT_TIMEOUT_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_requires_project_id() {
        clear_env();
        assert!(matches!(
            BatchConfig::from_env(),
            Err(BatchError::ConfigError(_))
        ));
    }

    #[test]
    #[serial]
    fn test_config_rejects_empty_project_id() {
        clear_env();
        std::env::set_var("GCP_PROJECT_ID", "");
        assert!(BatchConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        clear_env();
        std::env::set_var("GCP_PROJECT_ID", "test-project");
        let config = BatchConfig::from_env().unwrap();
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_config_reads_overrides() {
        clear_env();
        std::env::set_var("GOOGLE_CLOUD_PROJECT", "fallback-project");
        std::env::set_var("GCP_REGION", "europe-west4");
        std::env::set_var("BATCH_API_ENDPOINT", "http://localhost:8085/v1/");
        std::env::set_var("BATCH_CONNECT_TIMEOUT_SECS", "not-a-number");
        let config = BatchConfig::from_env().unwrap();
        assert_eq!(config.project_id, "fallback-project");
        assert_eq!(config.region, "europe-west4");
        assert_eq!(config.endpoint, "http://localhost:8085/v1");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        clear_env();
    }

    #[test]
    fn test_resource_names() {
        let client = BatchClient::with_token_source(
            BatchConfig::new("proj", "us-central1"),
            Arc::new(StaticToken::new("t")),
        )
        .unwrap();
        assert_eq!(
            BatchApi::parent(&client),
            "projects/proj/locations/us-central1"
        );
        assert_eq!(
            client.job_name("render-abc"),
            "projects/proj/locations/us-central1/jobs/render-abc"
        );
    }
}
