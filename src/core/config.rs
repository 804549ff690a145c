/// Tracker configuration
///
/// # Environment variables
///
/// Every entry can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | . | working directory (database, logs) |
/// | TRACKING_API_URL | https://www.ubereats.com/_p/api/getActiveOrdersV1?localeCode=fr | tracking endpoint |
/// | TRACKING_TIMEZONE | Europe/Paris | timezone sent with each poll |
/// | TRACKING_COOKIES | (empty) | initial session cookies |
/// | TRACKING_USER_AGENT | Chrome/120 desktop UA | user-agent for polls |
/// | LOG_LEVEL | info | tracing level |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/tracker LOG_LEVEL=debug cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the order database and log files
    pub work_dir: String,
    /// Remote tracking endpoint
    pub tracking_api_url: String,
    /// Timezone included in the tracking payload
    pub tracking_timezone: String,
    /// Initial session cookies shared by all workers
    pub tracking_cookies: String,
    /// User-agent sent with every poll; keeping a single value avoids
    /// inconsistencies that trip the endpoint's anti-bot protections
    pub user_agent: String,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
}

/// Default user-agent, matching a mainstream desktop browser.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DEFAULT_API_URL: &str = "https://www.ubereats.com/_p/api/getActiveOrdersV1?localeCode=fr";

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| ".".into()),
            tracking_api_url: std::env::var("TRACKING_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.into()),
            tracking_timezone: std::env::var("TRACKING_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Paris".into()),
            tracking_cookies: std::env::var("TRACKING_COOKIES").unwrap_or_default(),
            user_agent: std::env::var("TRACKING_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Override the endpoint and cookies, keeping everything else from the
    /// environment. Mostly used in tests.
    pub fn with_overrides(api_url: impl Into<String>, cookies: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.tracking_api_url = api_url.into();
        config.tracking_cookies = cookies.into();
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
