use std::time::Duration;

/// Listen on every interface by default.
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
/// How often the dashboard page re-polls the API.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub refresh_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl ApiConfig {
    /// `host:port` string for binding.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
