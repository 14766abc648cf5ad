pub const DEFAULT_BASE_URL: &str = "http://localhost/api";
pub const BASE_URL_ENV: &str = "FORMFLOW_API_BASE_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the form API lives. Resolved once and handed to [`crate::FormClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Reads [`BASE_URL_ENV`], falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            Some(base_url) => Self::new(base_url.trim()),
            None => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn version_url(&self, version_id: u64) -> String {
        format!("{}/form-versions/{}", self.base_url, version_id)
    }

    pub fn submissions_url(&self, version_id: u64) -> String {
        format!("{}/submissions", self.version_url(version_id))
    }

    pub fn uploads_url(&self, version_id: u64) -> String {
        format!("{}/uploads", self.version_url(version_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = ApiConfig::new("https://forms.example.com/api//");
        assert_eq!(config.base_url, "https://forms.example.com/api");
        assert_eq!(
            config.submissions_url(7),
            "https://forms.example.com/api/form-versions/7/submissions"
        );
    }

    #[test]
    fn lookup_prefers_env_and_ignores_blank() {
        let config = ApiConfig::from_lookup(|_| Some("http://api.test/".into()));
        assert_eq!(config.version_url(1), "http://api.test/form-versions/1");

        let config = ApiConfig::from_lookup(|_| Some("  ".into()));
        assert_eq!(config, ApiConfig::default());

        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
