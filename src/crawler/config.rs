use std::collections::HashMap;
use url::Url;

/// Default timeout for page requests in seconds
pub const LINK_REQUEST_TIMEOUT_SEC: u64 = 10;
/// Candidate links rejected per page before the page counts as broken
pub const MAX_LINK_RETRIES: usize = 100;
/// The distinguished title every walk is trying to reach
pub const ROOT_TITLE: &str = "Philosophy";

const RANDOM_PATH: &str = "/wiki/Special:Random";

/// Configuration for the walk driver. `overrides` is the exception table for
/// known-broken pages: instead of fetching and scanning such a title, the
/// driver takes the fixed next title and continues from the given URL.
pub struct CrawlerConfig {
    pub base_url: Url,
    pub random_url: Url,
    pub root_title: String,
    pub request_delay_ms: u64,
    pub request_timeout_sec: u64,
    pub max_link_retries: usize,
    overrides: HashMap<String, (String, Url)>,
}

impl CrawlerConfig {
    pub fn new(base_url: Url) -> Self {
        let random_url = base_url
            .join(RANDOM_PATH)
            .unwrap_or_else(|_| base_url.clone());
        let overrides = default_overrides(&base_url);
        Self {
            base_url,
            random_url,
            root_title: ROOT_TITLE.to_string(),
            request_delay_ms: 1050,
            request_timeout_sec: LINK_REQUEST_TIMEOUT_SEC,
            max_link_retries: MAX_LINK_RETRIES,
            overrides,
        }
    }

    pub fn with_request_delay(mut self, delay_ms: u64) -> Self {
        self.request_delay_ms = delay_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout_sec: u64) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn with_root_title(mut self, title: impl Into<String>) -> Self {
        self.root_title = title.into();
        self
    }

    pub fn with_random_url(mut self, url: Url) -> Self {
        self.random_url = url;
        self
    }

    pub fn with_override(
        mut self,
        title: impl Into<String>,
        next_title: impl Into<String>,
        next_url: Url,
    ) -> Self {
        self.overrides
            .insert(title.into(), (next_title.into(), next_url));
        self
    }

    pub fn override_for(&self, title: &str) -> Option<&(String, Url)> {
        self.overrides.get(title)
    }
}

fn default_overrides(base_url: &Url) -> HashMap<String, (String, Url)> {
    let mut overrides = HashMap::new();
    // "Flowering plant" trips the parenthesis heuristic; skip straight to
    // Embryophyte and continue from the Plant article.
    if let Ok(url) = base_url.join("/wiki/Plant") {
        overrides.insert(
            "Flowering plant".to_string(),
            ("Embryophyte".to_string(), url),
        );
    }
    overrides
}
