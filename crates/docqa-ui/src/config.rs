//! UI configuration from the environment

/// Where the UI listens and which API it drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiConfig {
    /// docqa API base URL
    pub api_url: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout towards the API, in seconds
    pub timeout_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8501,
            timeout_secs: 600,
        }
    }
}

impl UiConfig {
    /// Defaults overridden by `DOCQA_API_URL`, `DOCQA_UI_HOST` and `DOCQA_UI_PORT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("DOCQA_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(host) = lookup("DOCQA_UI_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DOCQA_UI_PORT").and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        config
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
