//! Runtime settings
//!
//! Defaults cover every field; `Settings::from_env` layers `GEOLENS_*`
//! environment overrides on top. A value that fails to parse is logged and
//! the default is kept.

use std::time::Duration;

use url::Url;

/// Labels kept from an NLP entity recognizer
pub const DEFAULT_ENTITY_LABELS: &[&str] = &[
    "PERSON", "ORG", "GPE", "DATE", "NORP", "FAC", "LOC", "EVENT",
];

/// Model names tried in order when loading an entity recognizer
pub const DEFAULT_NLP_MODELS: &[&str] = &["en_core_web_sm", "xx_ent_wiki_sm"];

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub fetcher: FetcherSettings,
    pub access: AccessSettings,
    pub nlp: NlpSettings,
    pub capabilities: CapabilitySettings,
    pub seo: SeoSettings,
    /// Hosts that serve unpublished drafts; pages from them skip accessibility checks
    pub draft_hosts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub request_timeout_secs: u64,
    pub max_response_size: usize,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            max_response_size: 10 * 1024 * 1024,
            max_redirects: 5,
            user_agent: format!("geolens/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetcherSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// robots.txt and header probes
#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub probe_timeout_secs: u64,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 10,
        }
    }
}

impl AccessSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct NlpSettings {
    pub models: Vec<String>,
    pub entity_labels: Vec<String>,
    /// Use suffix patterns instead of NLP for Chinese, Japanese and Korean text
    pub enable_cjk_fallback: bool,
}

impl Default for NlpSettings {
    fn default() -> Self {
        Self {
            models: DEFAULT_NLP_MODELS.iter().map(|s| s.to_string()).collect(),
            entity_labels: DEFAULT_ENTITY_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            enable_cjk_fallback: true,
        }
    }
}

impl NlpSettings {
    pub fn keeps_label(&self, label: &str) -> bool {
        self.entity_labels.iter().any(|l| l == label)
    }
}

/// Built-in capabilities that can be switched off per deployment
#[derive(Debug, Clone)]
pub struct CapabilitySettings {
    /// Boilerplate removal before block extraction (needs the `readability` feature)
    pub main_content: bool,
    pub readability: bool,
    pub structured_data: bool,
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        Self {
            main_content: true,
            readability: true,
            structured_data: true,
        }
    }
}

/// Length thresholds for the SEO checks
#[derive(Debug, Clone)]
pub struct SeoSettings {
    pub title_min_length: usize,
    pub title_max_length: usize,
    pub description_min_length: usize,
    pub description_max_length: usize,
    pub min_content_words: usize,
    pub max_external_links: usize,
}

impl Default for SeoSettings {
    fn default() -> Self {
        Self {
            title_min_length: 30,
            title_max_length: 60,
            description_min_length: 70,
            description_max_length: 160,
            min_content_words: 300,
            max_external_links: 100,
        }
    }
}

impl Settings {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(secs) = parse_var(&lookup, "GEOLENS_REQUEST_TIMEOUT") {
            settings.fetcher.request_timeout_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, "GEOLENS_PROBE_TIMEOUT") {
            settings.access.probe_timeout_secs = secs;
        }
        if let Some(bytes) = parse_var(&lookup, "GEOLENS_MAX_RESPONSE_SIZE") {
            settings.fetcher.max_response_size = bytes;
        }
        if let Some(agent) = lookup("GEOLENS_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            settings.fetcher.user_agent = agent.trim().to_string();
        }
        if let Some(models) = lookup("GEOLENS_NLP_MODELS") {
            settings.nlp.models = split_list(&models);
        }
        if let Some(enabled) = parse_var(&lookup, "GEOLENS_CJK_FALLBACK") {
            settings.nlp.enable_cjk_fallback = enabled;
        }
        if let Some(hosts) = lookup("GEOLENS_DRAFT_HOSTS") {
            settings.draft_hosts = split_list(&hosts)
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect();
        }

        settings
    }

    /// True when `url` points at a host configured as a draft source.
    pub fn is_draft_source(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.draft_hosts.iter().any(|h| *h == host)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
