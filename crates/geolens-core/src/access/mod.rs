//! AI crawler accessibility
//!
//! Decides, for the four AI crawlers that matter for citation, whether the
//! site's robots.txt lets them read the page, and inspects the page's
//! `noindex`/`nofollow` signals from `<meta name="robots">` and the
//! `X-Robots-Tag` response header.

pub mod robots_txt;

use std::collections::HashMap;
use std::future::Future;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::url_utils::{normalize_origin, parse_http_url, request_path};

/// An AI crawler tracked by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiCrawler {
    /// Field name in [`AiAccessResult`]
    pub key: &'static str,
    /// User-agent token matched against robots.txt
    pub agent: &'static str,
}

pub const AI_CRAWLERS: [AiCrawler; 4] = [
    AiCrawler {
        key: "gptbot",
        agent: "GPTBot",
    },
    AiCrawler {
        key: "claudebot",
        agent: "ClaudeBot",
    },
    AiCrawler {
        key: "perplexitybot",
        agent: "PerplexityBot",
    },
    AiCrawler {
        key: "google_extended",
        agent: "Google-Extended",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlerVerdict {
    Allow,
    Disallow,
    #[default]
    Unspecified,
}

/// `<meta name="robots">` as found on the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRobots {
    pub content: String,
    pub noindex: bool,
    pub nofollow: bool,
}

impl MetaRobots {
    pub fn from_content(content: &str) -> Self {
        let lower = content.to_lowercase();
        Self {
            content: content.to_string(),
            noindex: lower.contains("noindex"),
            nofollow: lower.contains("nofollow"),
        }
    }
}

/// `X-Robots-Tag` response header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XRobotsTag {
    pub value: String,
    pub noindex: bool,
    pub nofollow: bool,
}

impl XRobotsTag {
    pub fn from_value(value: &str) -> Self {
        let lower = value.to_lowercase();
        Self {
            value: value.to_string(),
            noindex: lower.contains("noindex"),
            nofollow: lower.contains("nofollow"),
        }
    }

    /// Header value from a response header map, matched case-insensitively.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("x-robots-tag"))
            .map(|(_, value)| Self::from_value(value))
            .unwrap_or_default()
    }
}

/// Per-crawler verdicts plus indexing directives for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAccessResult {
    pub robots_txt_found: bool,
    pub gptbot: CrawlerVerdict,
    pub claudebot: CrawlerVerdict,
    pub perplexitybot: CrawlerVerdict,
    pub google_extended: CrawlerVerdict,
    pub meta_robots: MetaRobots,
    pub x_robots_tag: XRobotsTag,
    pub notes: String,
}

const NON_URL_NOTE: &str = "Non-URL input; robots.txt not checked.";
const DRAFT_NOTE: &str = "Draft mode: accessibility checks skipped.";
const CLEAN_NOTE: &str = "No blocking signals detected in robots settings.";

impl AiAccessResult {
    pub fn verdict(&self, crawler: &AiCrawler) -> CrawlerVerdict {
        match crawler.key {
            "gptbot" => self.gptbot,
            "claudebot" => self.claudebot,
            "perplexitybot" => self.perplexitybot,
            "google_extended" => self.google_extended,
            _ => CrawlerVerdict::Unspecified,
        }
    }

    fn set_verdict(&mut self, crawler: &AiCrawler, verdict: CrawlerVerdict) {
        match crawler.key {
            "gptbot" => self.gptbot = verdict,
            "claudebot" => self.claudebot = verdict,
            "perplexitybot" => self.perplexitybot = verdict,
            "google_extended" => self.google_extended = verdict,
            _ => {}
        }
    }

    /// Display names of crawlers disallowed for the page, in fixed order.
    pub fn blocked_crawlers(&self) -> Vec<&'static str> {
        AI_CRAWLERS
            .iter()
            .filter(|c| self.verdict(c) == CrawlerVerdict::Disallow)
            .map(|c| c.agent)
            .collect()
    }

    pub fn allowed_count(&self) -> usize {
        AI_CRAWLERS
            .iter()
            .filter(|c| self.verdict(c) == CrawlerVerdict::Allow)
            .count()
    }

    /// `noindex` from either the meta tag or the response header.
    pub fn noindex(&self) -> bool {
        self.meta_robots.noindex || self.x_robots_tag.noindex
    }

    pub fn nofollow(&self) -> bool {
        self.meta_robots.nofollow || self.x_robots_tag.nofollow
    }
}

/// Network side of the evaluator.
///
/// Neither probe may fail: a missing or unreachable robots.txt is
/// `(false, "")` and a failed header request is an empty map.
pub trait AccessFetcher: Send + Sync {
    /// `(found, body)` for `{origin}/robots.txt`
    fn fetch_robots_txt(&self, origin: &str) -> impl Future<Output = (bool, String)> + Send;

    /// Response headers of a GET for `url`
    fn fetch_headers(&self, url: &str) -> impl Future<Output = HashMap<String, String>> + Send;
}

/// Canned robots.txt bodies and headers, keyed by origin and URL.
///
/// The default value behaves like a network where nothing is reachable.
#[derive(Debug, Clone, Default)]
pub struct StaticAccess {
    robots: HashMap<String, String>,
    headers: HashMap<String, HashMap<String, String>>,
}

impl StaticAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_robots(mut self, origin: &str, body: &str) -> Self {
        self.robots
            .insert(normalize_origin(origin), body.to_string());
        self
    }

    pub fn with_header(mut self, url: &str, name: &str, value: &str) -> Self {
        self.headers
            .entry(url.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self
    }
}

impl AccessFetcher for StaticAccess {
    fn fetch_robots_txt(&self, origin: &str) -> impl Future<Output = (bool, String)> + Send {
        let found = self.robots.get(&normalize_origin(origin)).cloned();
        std::future::ready(match found {
            Some(body) => (true, body),
            None => (false, String::new()),
        })
    }

    fn fetch_headers(&self, url: &str) -> impl Future<Output = HashMap<String, String>> + Send {
        std::future::ready(self.headers.get(url).cloned().unwrap_or_default())
    }
}

static META_ROBOTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name]").expect("valid meta selector"));

/// First `<meta name="robots">` (name matched case-insensitively).
pub fn extract_meta_robots(html: &str) -> MetaRobots {
    let document = Html::parse_document(html);
    document
        .select(&META_ROBOTS)
        .find(|m| {
            m.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("robots"))
        })
        .map(|m| MetaRobots::from_content(m.value().attr("content").unwrap_or_default()))
        .unwrap_or_default()
}

/// Evaluate AI crawler access for the page at `url` whose markup is `html`.
///
/// Input that is not an http(s) URL gets every crawler unspecified and no
/// network traffic at all.
pub async fn evaluate_access<F>(url: &str, html: &str, fetcher: &F) -> AiAccessResult
where
    F: AccessFetcher,
{
    let meta_robots = extract_meta_robots(html);

    let Some(parsed) = parse_http_url(url) else {
        return AiAccessResult {
            meta_robots,
            notes: NON_URL_NOTE.to_string(),
            ..Default::default()
        };
    };

    let origin = normalize_origin(url);
    let (found, robots_text) = fetcher.fetch_robots_txt(&origin).await;
    if !found {
        tracing::debug!(%origin, "robots.txt not found or unreadable");
    }
    let headers = fetcher.fetch_headers(url).await;

    assess(
        found,
        &robots_text,
        &request_path(&parsed),
        meta_robots,
        XRobotsTag::from_headers(&headers),
    )
}

/// Build the result from already gathered inputs.
pub fn assess(
    robots_found: bool,
    robots_text: &str,
    path: &str,
    meta_robots: MetaRobots,
    x_robots_tag: XRobotsTag,
) -> AiAccessResult {
    let groups = if robots_found {
        robots_txt::parse_robots_txt(robots_text)
    } else {
        Vec::new()
    };

    let mut result = AiAccessResult {
        robots_txt_found: robots_found,
        meta_robots,
        x_robots_tag,
        ..Default::default()
    };
    for crawler in &AI_CRAWLERS {
        result.set_verdict(
            crawler,
            robots_txt::verdict_for(&groups, crawler.agent, path),
        );
    }

    let mut notes = Vec::new();
    if !robots_found {
        notes.push("robots.txt not found or unreadable.");
    }
    if result.meta_robots.noindex || result.meta_robots.nofollow {
        notes.push("meta robots contains noindex/nofollow.");
    }
    if result.x_robots_tag.noindex || result.x_robots_tag.nofollow {
        notes.push("X-Robots-Tag contains noindex/nofollow.");
    }
    result.notes = if notes.is_empty() {
        CLEAN_NOTE.to_string()
    } else {
        notes.join(" ")
    };
    result
}

/// Neutral result for unpublished drafts: nothing checked, nothing penalised.
pub fn draft_access() -> AiAccessResult {
    AiAccessResult {
        notes: DRAFT_NOTE.to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><meta name="Robots" content="NOINDEX, follow"></head><body></body></html>"#;

    #[test]
    fn meta_robots_is_case_insensitive() {
        let meta = extract_meta_robots(PAGE);
        assert_eq!(meta.content, "NOINDEX, follow");
        assert!(meta.noindex);
        assert!(!meta.nofollow);

        assert_eq!(extract_meta_robots("<p>none</p>"), MetaRobots::default());
    }

    #[test]
    fn x_robots_header_lookup() {
        let mut headers = HashMap::new();
        headers.insert("X-ROBOTS-TAG".to_string(), "nofollow".to_string());
        let tag = XRobotsTag::from_headers(&headers);
        assert!(tag.nofollow);
        assert!(!tag.noindex);
        assert_eq!(XRobotsTag::from_headers(&HashMap::new()), XRobotsTag::default());
    }

    #[tokio::test]
    async fn non_url_input_skips_network() {
        let fetcher = StaticAccess::new().with_robots("https://example.com", "User-agent: *\nDisallow: /");
        let result = evaluate_access("just some text", PAGE, &fetcher).await;
        assert!(!result.robots_txt_found);
        assert_eq!(result.gptbot, CrawlerVerdict::Unspecified);
        assert!(result.meta_robots.noindex);
        assert_eq!(result.notes, NON_URL_NOTE);
    }

    #[tokio::test]
    async fn robots_verdicts_per_crawler() {
        let fetcher = StaticAccess::new()
            .with_robots(
                "https://example.com",
                "User-agent: *\nAllow: /\n\nUser-agent: GPTBot\nDisallow: /blog",
            )
            .with_header("https://example.com/blog/post", "X-Robots-Tag", "noindex");

        let result = evaluate_access("https://example.com/blog/post", "<p></p>", &fetcher).await;
        assert!(result.robots_txt_found);
        assert_eq!(result.gptbot, CrawlerVerdict::Disallow);
        assert_eq!(result.claudebot, CrawlerVerdict::Allow);
        assert_eq!(result.google_extended, CrawlerVerdict::Allow);
        assert_eq!(result.blocked_crawlers(), vec!["GPTBot"]);
        assert_eq!(result.allowed_count(), 3);
        assert!(result.noindex());
        assert_eq!(result.notes, "X-Robots-Tag contains noindex/nofollow.");
    }

    #[tokio::test]
    async fn unreachable_robots_is_not_an_error() {
        let result = evaluate_access("https://example.com/", "<p></p>", &StaticAccess::new()).await;
        assert!(!result.robots_txt_found);
        assert_eq!(result.allowed_count(), 0);
        assert!(result.blocked_crawlers().is_empty());
        assert_eq!(result.notes, "robots.txt not found or unreadable.");
    }

    #[test]
    fn clean_note_when_nothing_blocks() {
        let result = assess(
            true,
            "User-agent: *\nDisallow:",
            "/",
            MetaRobots::default(),
            XRobotsTag::default(),
        );
        assert_eq!(result.allowed_count(), 4);
        assert_eq!(result.notes, CLEAN_NOTE);
    }

    #[test]
    fn draft_access_is_neutral() {
        let draft = draft_access();
        assert!(!draft.noindex());
        assert!(!draft.nofollow());
        assert!(draft.blocked_crawlers().is_empty());
        assert_eq!(draft.notes, DRAFT_NOTE);
    }
}
