//! Classic SEO checks
//!
//! Rule-based checks over the parsed page and its raw markup. Issues come
//! back sorted errors first, then warnings, then informational notes.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::access::extract_meta_robots;
use crate::config::SeoSettings;
use crate::types::{HeadingLevel, ParsedContent};
use crate::url_utils::{LinkKind, classify_link, parse_http_url};

const TITLE_OPTIMAL: &str = "50-60";
const DESCRIPTION_OPTIMAL: &str = "120-160";
const INTERNAL_LINKS_CHECKED: usize = 50;

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("valid img selector"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
    pub current_value: Option<String>,
    pub recommended_value: Option<String>,
}

impl SeoIssue {
    fn new(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            suggestion: None,
            current_value: None,
            recommended_value: None,
        }
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    fn current(mut self, value: impl ToString) -> Self {
        self.current_value = Some(value.to_string());
        self
    }

    fn recommend(mut self, value: &str) -> Self {
        self.recommended_value = Some(value.to_string());
        self
    }
}

/// Run the SEO checks with default thresholds.
pub fn check_seo(parsed: &ParsedContent, html: &str) -> Vec<SeoIssue> {
    check_seo_with(parsed, html, &SeoSettings::default())
}

pub fn check_seo_with(parsed: &ParsedContent, html: &str, settings: &SeoSettings) -> Vec<SeoIssue> {
    let mut issues = Vec::new();
    check_title(parsed, settings, &mut issues);
    check_description(parsed, settings, &mut issues);
    check_headings(parsed, &mut issues);
    check_canonical(parsed, &mut issues);
    check_images(html, &mut issues);
    check_links(parsed, settings, &mut issues);
    check_meta_robots(html, &mut issues);
    check_content(parsed, settings, &mut issues);

    // stable, so rule order is kept within a severity
    issues.sort_by_key(|issue| issue.severity);
    issues
}

fn check_title(parsed: &ParsedContent, settings: &SeoSettings, issues: &mut Vec<SeoIssue>) {
    let title = &parsed.meta.title;
    if title.is_empty() {
        issues.push(
            SeoIssue::new("title_missing", Severity::Error, "Page title is missing")
                .suggest("Add a descriptive <title> tag to the page"),
        );
        return;
    }

    let len = title.chars().count();
    if len < settings.title_min_length {
        issues.push(
            SeoIssue::new(
                "title_too_short",
                Severity::Warning,
                format!("Title is too short ({len} chars)"),
            )
            .current(len)
            .recommend(TITLE_OPTIMAL)
            .suggest("Expand the title to be more descriptive (50-60 characters recommended)"),
        );
    } else if len > settings.title_max_length {
        issues.push(
            SeoIssue::new(
                "title_too_long",
                Severity::Warning,
                format!("Title may be truncated in search results ({len} chars)"),
            )
            .current(len)
            .recommend(TITLE_OPTIMAL)
            .suggest("Shorten the title to prevent truncation (50-60 characters recommended)"),
        );
    }
}

fn check_description(parsed: &ParsedContent, settings: &SeoSettings, issues: &mut Vec<SeoIssue>) {
    let description = &parsed.meta.description;
    if description.is_empty() {
        issues.push(
            SeoIssue::new(
                "description_missing",
                Severity::Warning,
                "Meta description is missing",
            )
            .suggest("Add a meta description to improve click-through rates"),
        );
        return;
    }

    let len = description.chars().count();
    if len < settings.description_min_length {
        issues.push(
            SeoIssue::new(
                "description_too_short",
                Severity::Info,
                format!("Meta description is short ({len} chars)"),
            )
            .current(len)
            .recommend(DESCRIPTION_OPTIMAL)
            .suggest("Expand the description for better search visibility (120-160 characters recommended)"),
        );
    } else if len > settings.description_max_length {
        issues.push(
            SeoIssue::new(
                "description_too_long",
                Severity::Info,
                format!("Meta description may be truncated ({len} chars)"),
            )
            .current(len)
            .recommend(DESCRIPTION_OPTIMAL)
            .suggest("Shorten the description to prevent truncation (120-160 characters recommended)"),
        );
    }
}

fn check_headings(parsed: &ParsedContent, issues: &mut Vec<SeoIssue>) {
    let headings = &parsed.content.headings;
    let h1_count = headings
        .iter()
        .filter(|h| h.level == HeadingLevel::H1)
        .count();

    if h1_count == 0 {
        issues.push(
            SeoIssue::new("h1_missing", Severity::Warning, "No H1 heading found on the page")
                .suggest("Add a single H1 heading that describes the page content"),
        );
    } else if h1_count > 1 {
        issues.push(
            SeoIssue::new(
                "multiple_h1",
                Severity::Warning,
                format!("Multiple H1 headings found ({h1_count})"),
            )
            .current(h1_count)
            .recommend("1")
            .suggest("Use only one H1 per page for better SEO structure"),
        );
    }

    if let Some(pair) = headings
        .windows(2)
        .find(|pair| pair[1].level.depth() > pair[0].level.depth() + 1)
    {
        issues.push(
            SeoIssue::new(
                "heading_skip",
                Severity::Info,
                format!(
                    "Heading level skipped: {} followed by {}",
                    pair[0].level.as_str(),
                    pair[1].level.as_str()
                ),
            )
            .suggest("Maintain proper heading hierarchy (don't skip levels)"),
        );
    }
}

fn check_canonical(parsed: &ParsedContent, issues: &mut Vec<SeoIssue>) {
    let canonical = &parsed.meta.canonical;
    if canonical.is_empty() {
        issues.push(
            SeoIssue::new("canonical_missing", Severity::Info, "No canonical URL specified")
                .suggest("Add a canonical URL to prevent duplicate content issues"),
        );
        return;
    }

    let fully_qualified = url::Url::parse(canonical).is_ok_and(|u| u.has_host());
    if !fully_qualified {
        issues.push(
            SeoIssue::new(
                "canonical_invalid",
                Severity::Warning,
                "Canonical URL appears to be invalid",
            )
            .current(canonical)
            .suggest("Use a fully qualified URL for the canonical tag"),
        );
    }
}

fn check_images(html: &str, issues: &mut Vec<SeoIssue>) {
    let document = Html::parse_document(html);
    let mut missing_alt = 0;
    let mut empty_alt = 0;

    for img in document.select(&IMG) {
        let src = img.value().attr("src").unwrap_or_default();
        // tracking pixels
        if src.to_lowercase().contains("pixel") || src.contains("1x1") {
            continue;
        }
        match img.value().attr("alt") {
            None => missing_alt += 1,
            Some(alt) if alt.trim().is_empty() => empty_alt += 1,
            Some(_) => {}
        }
    }

    if missing_alt > 0 {
        issues.push(
            SeoIssue::new(
                "images_missing_alt",
                Severity::Warning,
                format!("{missing_alt} image(s) missing alt attribute"),
            )
            .current(missing_alt)
            .suggest("Add descriptive alt text to all meaningful images"),
        );
    }
    if empty_alt > 0 {
        issues.push(
            SeoIssue::new(
                "images_empty_alt",
                Severity::Info,
                format!("{empty_alt} image(s) have empty alt attribute"),
            )
            .current(empty_alt)
            .suggest("Add descriptive alt text unless image is decorative"),
        );
    }
}

fn check_links(parsed: &ParsedContent, settings: &SeoSettings, issues: &mut Vec<SeoIssue>) {
    let external = parsed.stats.external_links;
    if external > settings.max_external_links {
        issues.push(
            SeoIssue::new(
                "too_many_external_links",
                Severity::Info,
                format!("Page has many external links ({external})"),
            )
            .current(external)
            .suggest("Consider reducing external links or using nofollow where appropriate"),
        );
    }

    let base = parse_http_url(&parsed.url);
    let suspicious = parsed
        .content
        .links
        .iter()
        .filter(|l| classify_link(&l.href, base.as_ref()) == LinkKind::Internal)
        .take(INTERNAL_LINKS_CHECKED)
        .map(|l| l.href.as_str())
        .filter(|href| !href.starts_with("javascript:") && *href != "#")
        .find(|href| href.contains("undefined") || href.contains("null"));

    if let Some(href) = suspicious {
        issues.push(
            SeoIssue::new(
                "suspicious_link",
                Severity::Warning,
                "Found potentially broken link pattern",
            )
            .current(href.chars().take(100).collect::<String>())
            .suggest("Review and fix links containing 'undefined' or 'null'"),
        );
    }
}

fn check_meta_robots(html: &str, issues: &mut Vec<SeoIssue>) {
    let robots = extract_meta_robots(html);
    if robots.noindex {
        issues.push(
            SeoIssue::new(
                "noindex_detected",
                Severity::Error,
                "Page is set to noindex - it won't appear in search results",
            )
            .current(&robots.content)
            .suggest("Remove noindex if you want the page to be indexed"),
        );
    }
    if robots.nofollow {
        issues.push(
            SeoIssue::new(
                "nofollow_detected",
                Severity::Warning,
                "Page is set to nofollow - links won't pass PageRank",
            )
            .current(&robots.content)
            .suggest("Remove nofollow if you want links to be followed"),
        );
    }
}

fn check_content(parsed: &ParsedContent, settings: &SeoSettings, issues: &mut Vec<SeoIssue>) {
    let words = parsed.stats.word_count;
    if words < settings.min_content_words {
        issues.push(
            SeoIssue::new(
                "thin_content",
                Severity::Warning,
                format!("Page has thin content ({words} words)"),
            )
            .current(words)
            .recommend(&format!("{}+", settings.min_content_words))
            .suggest("Add more substantive content for better search visibility"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Heading, Link};

    fn rule_ids(issues: &[SeoIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule_id.as_str()).collect()
    }

    fn well_formed() -> ParsedContent {
        let mut parsed = ParsedContent {
            url: "https://example.com/guide".to_string(),
            ..Default::default()
        };
        parsed.meta.title = "A complete guide to generative engine optimization".to_string();
        parsed.meta.description = "Learn how answer engines read pages, which structures they quote, \
            and how to make your content easy to cite."
            .to_string();
        parsed.meta.canonical = "https://example.com/guide".to_string();
        parsed.content.headings = vec![
            Heading::new(HeadingLevel::H1, "Guide"),
            Heading::new(HeadingLevel::H2, "Basics"),
            Heading::new(HeadingLevel::H3, "Details"),
        ];
        parsed.stats.word_count = 800;
        parsed
    }

    #[test]
    fn clean_page_has_no_issues() {
        let issues = check_seo(&well_formed(), r#"<img src="a.png" alt="Diagram">"#);
        assert!(issues.is_empty(), "{:?}", rule_ids(&issues));
    }

    #[test]
    fn empty_page_issues_are_sorted() {
        let issues = check_seo(&ParsedContent::default(), "");
        assert_eq!(
            rule_ids(&issues),
            vec![
                "title_missing",
                "description_missing",
                "h1_missing",
                "thin_content",
                "canonical_missing"
            ]
        );
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[3].recommended_value.as_deref(), Some("300+"));
    }

    #[test]
    fn title_and_description_lengths() {
        let mut parsed = well_formed();
        parsed.meta.title = "Short".to_string();
        parsed.meta.description = "x".repeat(200);
        let issues = check_seo(&parsed, "");
        let short = issues.iter().find(|i| i.rule_id == "title_too_short").unwrap();
        assert_eq!(short.current_value.as_deref(), Some("5"));
        assert_eq!(short.recommended_value.as_deref(), Some("50-60"));
        assert!(issues.iter().any(|i| i.rule_id == "description_too_long"));
    }

    #[test]
    fn heading_checks() {
        let mut parsed = well_formed();
        parsed.content.headings = vec![
            Heading::new(HeadingLevel::H1, "One"),
            Heading::new(HeadingLevel::H3, "Skip"),
            Heading::new(HeadingLevel::H1, "Two"),
            Heading::new(HeadingLevel::H4, "Skip again"),
        ];
        let issues = check_seo(&parsed, "");
        assert!(issues.iter().any(|i| i.rule_id == "multiple_h1"));
        let skips: Vec<_> = issues.iter().filter(|i| i.rule_id == "heading_skip").collect();
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].message, "Heading level skipped: h1 followed by h3");
    }

    #[test]
    fn images_and_pixels() {
        let html = r#"
            <img src="photo.jpg">
            <img src="chart.png" alt="  ">
            <img src="https://t.example.com/pixel.gif">
            <img src="spacer-1x1.gif">
        "#;
        let issues = check_seo(&well_formed(), html);
        let missing = issues.iter().find(|i| i.rule_id == "images_missing_alt").unwrap();
        assert_eq!(missing.current_value.as_deref(), Some("1"));
        assert!(issues.iter().any(|i| i.rule_id == "images_empty_alt"));
    }

    #[test]
    fn canonical_must_be_absolute() {
        let mut parsed = well_formed();
        parsed.meta.canonical = "/guide".to_string();
        let issues = check_seo(&parsed, "");
        assert_eq!(rule_ids(&issues), vec!["canonical_invalid"]);
    }

    #[test]
    fn suspicious_internal_links_and_meta_robots() {
        let mut parsed = well_formed();
        parsed.content.links = vec![
            Link {
                href: "https://other.org/null".to_string(),
                text: "external".to_string(),
            },
            Link {
                href: "https://example.com/posts/undefined".to_string(),
                text: "broken".to_string(),
            },
        ];
        let html = r#"<meta name="robots" content="noindex,nofollow">"#;
        let issues = check_seo(&parsed, html);
        assert_eq!(issues[0].rule_id, "noindex_detected");
        let link = issues.iter().find(|i| i.rule_id == "suspicious_link").unwrap();
        assert_eq!(
            link.current_value.as_deref(),
            Some("https://example.com/posts/undefined")
        );
        assert!(issues.iter().any(|i| i.rule_id == "nofollow_detected"));
    }
}
