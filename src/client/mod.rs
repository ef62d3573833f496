//! HTTP client for the analysis backend.
//!
//! One method per backend endpoint, all keyed by a URL-escaped topic.
//! Errors are classified into a small taxonomy so callers can contain a
//! failure at the source boundary instead of aborting sibling requests.

use crate::models::{
    Briefing, ConvergencePair, DocumentRecord, SCurvePoint, SubmissionAck, SynthesisResult,
    TrlSeries,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Classified failure from one backend request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, broken transport.
    #[error("cannot reach backend at {url}: {message}")]
    Transport { url: String, message: String },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// The backend answered with a non-success status.
    #[error("backend returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body was not the expected JSON shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Transport and timeout failures are transient; a non-2xx status or
    /// a malformed body would just come back identical.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Timeout { .. })
    }
}

/// Client for the intelligence backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
    retries: u32,
}

impl ApiClient {
    /// Create a client with the given base URL, per-request timeout, and
    /// number of extra attempts after a transient failure.
    pub fn new(base_url: &str, timeout_seconds: u64, retries: u32) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
            retries,
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full endpoint URL with the topic escaped into the path.
    pub fn endpoint_url(&self, path: &str, topic: &str) -> String {
        format!("{}{}/{}", self.base_url, path, urlencoding::encode(topic))
    }

    /// `GET /api/analytics/synthesis/{topic}`
    pub async fn fetch_synthesis(&self, topic: &str) -> Result<SynthesisResult, ApiError> {
        self.get_json(&self.endpoint_url("/api/analytics/synthesis", topic))
            .await
    }

    /// `GET /api/analytics/convergence/{topic}`
    pub async fn fetch_convergence(&self, topic: &str) -> Result<Vec<ConvergencePair>, ApiError> {
        self.get_json(&self.endpoint_url("/api/analytics/convergence", topic))
            .await
    }

    /// `GET /api/analytics/scurve/{topic}`
    pub async fn fetch_scurve(&self, topic: &str) -> Result<Vec<SCurvePoint>, ApiError> {
        self.get_json(&self.endpoint_url("/api/analytics/scurve", topic))
            .await
    }

    /// `GET /api/analytics/trl_progression/{topic}`
    pub async fn fetch_trl_progression(&self, topic: &str) -> Result<TrlSeries, ApiError> {
        self.get_json(&self.endpoint_url("/api/analytics/trl_progression", topic))
            .await
    }

    /// `GET /api/analyze/{topic}` - the live briefing fast path.
    ///
    /// A `{"error": ...}` body with a non-2xx status is still decoded and
    /// returned as data; the caller renders it as "not enough data".
    pub async fn fetch_briefing(&self, topic: &str) -> Result<Briefing, ApiError> {
        let url = self.endpoint_url("/api/analyze", topic);
        let response = self.get_with_retry(&url).await?;

        // The briefing endpoint reports semantic failures as JSON error
        // bodies under 4xx/5xx. Decode the body regardless of status.
        response.json::<Briefing>().await.map_err(|e| ApiError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })
    }

    /// `POST /api/analyze/{topic}` - submit a background analysis job.
    pub async fn submit_analysis(&self, topic: &str) -> Result<SubmissionAck, ApiError> {
        let url = self.endpoint_url("/api/analyze", topic);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: response.status(),
            });
        }

        response.json::<SubmissionAck>().await.map_err(|e| ApiError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })
    }

    /// `GET /api/documents/{topic}`
    pub async fn fetch_documents(&self, topic: &str) -> Result<Vec<DocumentRecord>, ApiError> {
        self.get_json(&self.endpoint_url("/api/documents", topic))
            .await
    }

    /// GET a URL, retrying transient transport failures up to the
    /// configured budget. POSTs are never retried.
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            debug!("GET {}", url);
            match self.http.get(url).send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let error = self.classify(url, e);
                    if !error.is_retryable() || attempt >= self.retries {
                        return Err(error);
                    }
                    attempt += 1;
                    debug!("retrying {} (attempt {}/{}): {}", url, attempt, self.retries, error);
                }
            }
        }
    }

    /// GET a URL and decode its JSON body, enforcing a 2xx status.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.get_with_retry(url).await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Map a reqwest error into the transport taxonomy.
    fn classify(&self, url: &str, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                seconds: self.timeout_seconds,
            }
        } else {
            ApiError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_escapes_topic() {
        let client = ApiClient::new("http://127.0.0.1:5000", 30, 0).unwrap();
        assert_eq!(
            client.endpoint_url("/api/analytics/synthesis", "quantum radar"),
            "http://127.0.0.1:5000/api/analytics/synthesis/quantum%20radar"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://127.0.0.1:5000/", 30, 0).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(
            client.endpoint_url("/api/documents", "ai"),
            "http://127.0.0.1:5000/api/documents/ai"
        );
    }

    #[test]
    fn test_only_transient_failures_are_retryable() {
        let transport = ApiError::Transport {
            url: "http://x".to_string(),
            message: "connection refused".to_string(),
        };
        let timeout = ApiError::Timeout {
            url: "http://x".to_string(),
            seconds: 30,
        };
        let status = ApiError::Status {
            url: "http://x".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        let decode = ApiError::Decode {
            url: "http://x".to_string(),
            message: "expected value".to_string(),
        };

        assert!(transport.is_retryable());
        assert!(timeout.is_retryable());
        assert!(!status.is_retryable());
        assert!(!decode.is_retryable());
    }

    #[tokio::test]
    async fn test_retry_budget_still_surfaces_transport_error() {
        // Nothing listens here; both attempts fail and the classified
        // error comes back instead of hanging or panicking.
        let client = ApiClient::new("http://127.0.0.1:1", 1, 1).unwrap();
        let result = client.fetch_documents("quantum radar").await;
        assert!(matches!(result, Err(ApiError::Transport { .. })));
    }
}
