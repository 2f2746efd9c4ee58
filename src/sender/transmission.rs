use super::RecordTransport;
use super::client::HttpClient;
use crate::domain::LogRecord;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Why a single delivery attempt failed.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("collector responded with HTTP {status}")]
    Status { status: u16 },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(String),
}

/// Posts one record per request to the collector endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    pub client: HttpClient,
}

impl HttpTransport {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn build_headers(&self, record: &LogRecord) -> Result<HeaderMap, AttemptError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers.insert(
            HeaderName::from_static("x-log-source"),
            HeaderValue::from_str(record.source())
                .map_err(|e| AttemptError::InvalidHeaderValue(format!("Invalid source: {e}")))?,
        );

        headers.insert(
            HeaderName::from_static("x-relay-version"),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        Ok(headers)
    }
}

impl RecordTransport for HttpTransport {
    async fn transmit(&self, record: &LogRecord) -> Result<(), AttemptError> {
        let body = serde_json::to_vec(record)?;
        let headers = self.build_headers(record)?;
        let bytes_sent = body.len();
        let start = Instant::now();

        let response = self
            .client
            .client
            .post(self.client.endpoint_url.clone())
            .headers(headers)
            .timeout(self.client.config.timeout)
            .body(body)
            .send()
            .await;

        let latency = start.elapsed();
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.client.stats.record_request(false, latency);
                return Err(AttemptError::Transport(e));
            }
        };

        let status = response.status();
        self.client.stats.record_request(status.is_success(), latency);

        if status.is_success() {
            debug!(
                "Delivered {} record ({} bytes) to {} in {:?}",
                record.severity(),
                bytes_sent,
                self.client.endpoint(),
                latency
            );
            Ok(())
        } else {
            Err(AttemptError::Status {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RecordFactory, Severity};
    use crate::sender::ClientConfig;

    #[test]
    fn test_build_headers() {
        let transport = HttpTransport::new(HttpClient::new(ClientConfig::default()).unwrap());
        let record = RecordFactory::new("orders-dev")
            .build(Severity::Warn, "slow query", None)
            .unwrap();

        let headers = transport.build_headers(&record).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["x-log-source"], "orders-dev");
        assert!(headers.contains_key("x-relay-version"));
    }

    #[test]
    fn test_invalid_source_header_is_an_attempt_error() {
        let transport = HttpTransport::new(HttpClient::new(ClientConfig::default()).unwrap());
        let record = RecordFactory::new("bad\nsource")
            .build(Severity::Info, "hello", None)
            .unwrap();

        assert!(matches!(
            transport.build_headers(&record),
            Err(AttemptError::InvalidHeaderValue(_))
        ));
    }
}
