// Configuration structure for:
// - Database connection string
// - Server listening address/port
// - Ledger API endpoint, timeout and retry budget
// - Sync window and background sync interval
// - Pagination defaults

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// First backoff delay between ledger request attempts. Doubles per retry.
pub const LEDGER_RETRY_MIN_DELAY: Duration = Duration::from_millis(250);
/// Cap on a single backoff delay.
pub const LEDGER_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub ledger_api_url: String,
    /// Bound on each HTTP attempt against the ledger API.
    pub ledger_timeout: Duration,
    pub ledger_max_retries: usize,
    pub sync_window: usize,
    pub sync_interval: Duration,
    pub page_default_limit: i64,
    pub page_max_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:bitcoin_tracker.db".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            ledger_api_url: "https://api.blockchair.com/bitcoin".to_string(),
            ledger_timeout: Duration::from_secs(30),
            ledger_max_retries: 2,
            sync_window: 100,
            sync_interval: Duration::from_secs(300),
            page_default_limit: 50,
            page_max_limit: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = parse_or("SERVER_PORT", defaults.server_port);
        let ledger_api_url = env::var("LEDGER_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.ledger_api_url);
        let ledger_timeout = parse_or("LEDGER_TIMEOUT_SECS", 0u64);
        let ledger_timeout = if ledger_timeout == 0 {
            defaults.ledger_timeout
        } else {
            Duration::from_secs(ledger_timeout)
        };
        let ledger_max_retries = parse_or("LEDGER_MAX_RETRIES", defaults.ledger_max_retries);
        let sync_window = match parse_or("SYNC_WINDOW", defaults.sync_window) {
            0 => defaults.sync_window,
            n => n,
        };
        let sync_interval = match parse_or("SYNC_INTERVAL_SECS", 0u64) {
            0 => defaults.sync_interval,
            secs => Duration::from_secs(secs),
        };
        let page_max_limit = match parse_or("PAGE_MAX_LIMIT", defaults.page_max_limit) {
            n if n > 0 => n,
            _ => defaults.page_max_limit,
        };
        let page_default_limit = match parse_or("PAGE_DEFAULT_LIMIT", defaults.page_default_limit) {
            n if n > 0 => n.min(page_max_limit),
            _ => defaults.page_default_limit.min(page_max_limit),
        };

        Self {
            database_url,
            server_host,
            server_port,
            ledger_api_url,
            ledger_timeout,
            ledger_max_retries,
            sync_window,
            sync_interval,
            page_default_limit,
            page_max_limit,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Upper bound on one upstream fetch: every attempt at `ledger_timeout`
    /// plus the backoff slept between them.
    pub fn upstream_budget(&self) -> Duration {
        let retries = u32::try_from(self.ledger_max_retries).unwrap_or(u32::MAX);

        let mut backoff = Duration::ZERO;
        let mut delay = LEDGER_RETRY_MIN_DELAY;
        for _ in 0..retries.min(64) {
            backoff = backoff.saturating_add(delay);
            delay = delay.saturating_mul(2).min(LEDGER_RETRY_MAX_DELAY);
        }

        self.ledger_timeout
            .saturating_mul(retries.saturating_add(1))
            .saturating_add(backoff)
    }
}

/// Read `key` from the environment, falling back to `default` when unset or unparsable.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
