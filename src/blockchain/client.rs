use crate::blockchain::models::{parse_dashboard, RawEvent};
use crate::blockchain::LedgerSource;
use crate::config::{Config, LEDGER_RETRY_MAX_DELAY, LEDGER_RETRY_MIN_DELAY};
use crate::validation::is_valid_bitcoin_address;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status: {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Connection problems, throttling and server errors are worth another try.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout(),
            ClientError::Status(code) => *code == 429 || *code >= 500,
            ClientError::Decode(_) | ClientError::Timeout(_) => false,
        }
    }
}

/// Blockchair dashboard API client.
pub struct BlockchairClient {
    http_client: Client,
    base_url: String,
    max_retries: usize,
}

impl BlockchairClient {
    pub fn new(base_url: &str, timeout: Duration, max_retries: usize) -> Result<Self, ClientError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        info!(
            "Initializing ledger client with endpoint: {}, timeout: {:?}",
            base_url, timeout
        );

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.ledger_api_url,
            config.ledger_timeout,
            config.ledger_max_retries,
        )
    }

    async fn fetch_dashboard(&self, address: &str, limit: usize) -> Result<Vec<RawEvent>, ClientError> {
        let url = format!("{}/dashboards/address/{}", self.base_url, address);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("limit", limit.to_string()),
                ("transaction_details", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_dashboard(address, &body)
    }
}

#[async_trait]
impl LedgerSource for BlockchairClient {
    fn validate_format(&self, address: &str) -> bool {
        is_valid_bitcoin_address(address)
    }

    async fn fetch_recent_events(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<RawEvent>, ClientError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(LEDGER_RETRY_MIN_DELAY)
            .with_max_delay(LEDGER_RETRY_MAX_DELAY)
            .with_max_times(self.max_retries);

        let events = (|| self.fetch_dashboard(address, limit))
            .retry(backoff)
            .when(ClientError::is_transient)
            .notify(|err, delay| {
                warn!("Ledger request for {} failed ({}), retrying in {:?}", address, err, delay);
            })
            .await?;

        debug!("Fetched {} events for {}", events.len(), address);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ADDRESS: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn transient_classification() {
        assert!(ClientError::Status(503).is_transient());
        assert!(ClientError::Status(429).is_transient());
        assert!(!ClientError::Status(404).is_transient());
        assert!(!ClientError::Decode("bad".into()).is_transient());
    }

    #[tokio::test]
    async fn fetches_events_from_dashboard() {
        let router = Router::new().route(
            "/dashboards/address/{address}",
            get(|Path(address): Path<String>| async move {
                format!(
                    r#"{{"data":{{"{}":{{"transactions":[{{"block_id":800000,"hash":"h1","time":"2023-07-24 10:00:00","balance_change":42}}]}}}}}}"#,
                    address
                )
            }),
        );
        let base_url = serve(router).await;

        let client = BlockchairClient::new(&base_url, Duration::from_secs(5), 0).unwrap();
        let events = client.fetch_recent_events(ADDRESS, 100).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].hash, "h1");
        assert_eq!(events[0].balance_delta, 42);
    }

    #[tokio::test]
    async fn retries_server_errors_then_gives_up() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/dashboards/address/{address}",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::SERVICE_UNAVAILABLE
                }
            }),
        );
        let base_url = serve(router).await;

        let client = BlockchairClient::new(&base_url, Duration::from_secs(5), 1).unwrap();
        let result = client.fetch_recent_events(ADDRESS, 100).await;

        assert!(matches!(result, Err(ClientError::Status(503))));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/dashboards/address/{address}",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::BAD_REQUEST
                }
            }),
        );
        let base_url = serve(router).await;

        let client = BlockchairClient::new(&base_url, Duration::from_secs(5), 3).unwrap();
        let result = client.fetch_recent_events(ADDRESS, 100).await;

        assert!(matches!(result, Err(ClientError::Status(400))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
