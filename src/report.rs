use std::fmt::Write as FmtWrite;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use geolens_core::AnalysisReport;
use geolens_core::access::{AI_CRAWLERS, CrawlerVerdict};
use geolens_core::compare::ComparisonPayload;
use geolens_core::geo::scoring::DimensionScore;
use geolens_core::geo::summary::{FixPriority, Impact, Issue, IssueKey};
use geolens_core::seo::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Cli,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Cli => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "cli" => Ok(OutputFormat::Cli),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(anyhow!(
                "invalid output format '{other}'; use cli, json or markdown"
            )),
        }
    }
}

const DIVIDER: &str = "─────────────────────────────────────────────────────────────";
const LABEL_WIDTH: usize = 16;
const BAR_WIDTH: u32 = 20;
const TITLE_MAX_CHARS: usize = 60;

fn push_section_header(buf: &mut String, icon: &str, title: &str) {
    let _ = writeln!(buf, "{DIVIDER}");
    let _ = writeln!(buf, "{icon} {title}");
    let _ = writeln!(buf, "{DIVIDER}");
}

fn push_key_value(buf: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(buf, "• {:<width$} : {}", label, value, width = LABEL_WIDTH);
}

pub fn render_report(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize report")
        }
        OutputFormat::Markdown => Ok(render_markdown(report)),
        OutputFormat::Cli => Ok(render_cli(report)),
    }
}

/// One line per page: grade, total and URL.
pub fn render_check_line(report: &AnalysisReport) -> String {
    let score = &report.geo.geo_score;
    format!("{} ({}/100) - {}", score.grade, score.total, report.url())
}

fn render_cli(report: &AnalysisReport) -> String {
    let geo = &report.geo;
    let score = &geo.geo_score;
    let mut out = String::new();

    push_section_header(&mut out, "🔎", "GEO Analysis Report");
    push_key_value(&mut out, "Page", &page_title(report));
    push_key_value(&mut out, "URL", report.url());
    push_key_value(
        &mut out,
        "GEO Score",
        &format!("{}/100 ({} - {})", score.total, score.grade, score.grade_label),
    );
    if geo.draft_mode {
        push_key_value(&mut out, "Mode", "draft (accessibility checks skipped)");
    }
    let _ = writeln!(out);

    push_section_header(&mut out, "📊", "Score Breakdown");
    for (name, dimension) in dimensions(report) {
        let filled = BAR_WIDTH * dimension.percentage.min(100) / 100;
        let bar = format!(
            "{}{}",
            "█".repeat(filled as usize),
            "░".repeat((BAR_WIDTH - filled) as usize)
        );
        push_key_value(
            &mut out,
            name,
            &format!(
                "{bar} {}/{} ({}%)",
                dimension.score, dimension.max, dimension.percentage
            ),
        );
    }
    let _ = writeln!(out);

    push_section_header(&mut out, "🤖", "AI Crawler Access");
    for crawler in &AI_CRAWLERS {
        let status = match geo.ai_crawler_access.verdict(crawler) {
            CrawlerVerdict::Allow => "✓ allowed",
            CrawlerVerdict::Disallow => "✗ blocked",
            CrawlerVerdict::Unspecified => "? unspecified",
        };
        push_key_value(&mut out, crawler.agent, status);
    }
    push_key_value(&mut out, "Notes", &geo.ai_crawler_access.notes);
    let _ = writeln!(out);

    let issues = &geo.summary.issues;
    for (icon, title, marker, bucket) in [
        ("🚨", "Critical Issues", "✗", &issues.critical),
        ("⚠️", "Warnings", "!", &issues.warning),
        ("✅", "Good Practices", "✓", &issues.good),
    ] {
        if bucket.is_empty() {
            continue;
        }
        push_section_header(&mut out, icon, title);
        for issue in bucket {
            let _ = writeln!(out, "  {marker} {}", issue_message(issue));
        }
        let _ = writeln!(out);
    }

    if !geo.summary.priority_fixes.is_empty() {
        push_section_header(&mut out, "🛠️", "Recommended Fixes");
        for (i, fix) in geo.summary.priority_fixes.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. [{}] {} (impact: {})",
                i + 1,
                priority_label(fix.priority),
                fix_message(&fix.action),
                impact_label(fix.impact)
            );
        }
        let _ = writeln!(out);
    }

    if !report.seo.is_empty() {
        push_section_header(&mut out, "🔧", "SEO Checks");
        for issue in &report.seo {
            let _ = writeln!(out, "  [{}] {}", severity_label(issue.severity), issue.message);
            if let Some(suggestion) = issue.suggestion.as_deref() {
                let _ = writeln!(out, "      → {suggestion}");
            }
        }
        let _ = writeln!(out);
    }

    let metrics = &geo.extended_metrics;
    push_section_header(&mut out, "🧠", "AI Interpretation");
    push_key_value(&mut out, "Type", geo.ai_usage_interpretation.kind.as_str());
    push_key_value(
        &mut out,
        "Citation",
        &format!(
            "{}/{} ({:?})",
            metrics.citation_potential.score,
            metrics.citation_potential.max_score,
            metrics.citation_potential.level
        )
        .to_lowercase(),
    );
    push_key_value(&mut out, "Entities", &metrics.entity_count.to_string());
    push_key_value(
        &mut out,
        "Words",
        &report.parsed.stats.word_count.to_string(),
    );

    out
}

fn render_markdown(report: &AnalysisReport) -> String {
    let geo = &report.geo;
    let score = &geo.geo_score;
    let mut out = String::new();

    let _ = writeln!(out, "# GEO Analysis Report\n");
    let _ = writeln!(out, "**Page:** {}", page_title(report));
    if !report.url().is_empty() {
        let _ = writeln!(out, "**URL:** {}", report.url());
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## GEO Score\n");
    let _ = writeln!(
        out,
        "**{}/100** ({} - {})\n",
        score.total, score.grade, score.grade_label
    );

    let _ = writeln!(out, "### Score Breakdown\n");
    let _ = writeln!(out, "| Dimension | Score | Max | Percentage |");
    let _ = writeln!(out, "|-----------|-------|-----|------------|");
    for (name, dimension) in dimensions(report) {
        let _ = writeln!(
            out,
            "| {name} | {} | {} | {}% |",
            dimension.score, dimension.max, dimension.percentage
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## AI Crawler Access\n");
    let _ = writeln!(out, "| Crawler | Status |");
    let _ = writeln!(out, "|---------|--------|");
    for crawler in &AI_CRAWLERS {
        let (emoji, status) = match geo.ai_crawler_access.verdict(crawler) {
            CrawlerVerdict::Allow => ("✅", "allow"),
            CrawlerVerdict::Disallow => ("❌", "disallow"),
            CrawlerVerdict::Unspecified => ("❓", "unspecified"),
        };
        let _ = writeln!(out, "| {} | {emoji} {status} |", crawler.agent);
    }
    let _ = writeln!(out);

    let issues = &geo.summary.issues;
    if !(issues.critical.is_empty() && issues.warning.is_empty() && issues.good.is_empty()) {
        let _ = writeln!(out, "## Issues & Findings\n");
    }
    for (title, marker, bucket) in [
        ("Critical Issues", "❌", &issues.critical),
        ("Warnings", "⚠️", &issues.warning),
        ("Good Practices", "✅", &issues.good),
    ] {
        if bucket.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {title}\n");
        for issue in bucket {
            let _ = writeln!(out, "- {marker} {}", issue_message(issue));
        }
        let _ = writeln!(out);
    }

    if !geo.summary.priority_fixes.is_empty() {
        let _ = writeln!(out, "## Recommended Fixes\n");
        for (i, fix) in geo.summary.priority_fixes.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **[{}]** {} _(impact: {})_",
                i + 1,
                priority_label(fix.priority).to_uppercase(),
                fix_message(&fix.action),
                impact_label(fix.impact)
            );
        }
        let _ = writeln!(out);
    }

    if !report.seo.is_empty() {
        let _ = writeln!(out, "## SEO Checks\n");
        let _ = writeln!(out, "| Severity | Rule | Message |");
        let _ = writeln!(out, "|----------|------|---------|");
        for issue in &report.seo {
            let _ = writeln!(
                out,
                "| {} | `{}` | {} |",
                severity_label(issue.severity),
                issue.rule_id,
                issue.message.replace('|', "\\|")
            );
        }
        let _ = writeln!(out);
    }

    let interpretation = &geo.ai_usage_interpretation;
    let _ = writeln!(out, "## AI Interpretation\n");
    let _ = writeln!(
        out,
        "This page is classified as **{}**.\n",
        interpretation.kind.as_str()
    );
    let signals = &interpretation.signals;
    let _ = writeln!(out, "| Signal | Value |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(out, "| Reference | {} |", signals.reference);
    let _ = writeln!(out, "| Conceptual | {} |", signals.conceptual);
    let _ = writeln!(
        out,
        "| Structural Diversity | {} |",
        signals.structural_diversity
    );
    let _ = writeln!(out, "| Enumeratable | {} |", signals.enumeratable);

    out
}

/// Text table of a multi-page comparison followed by its insights.
pub fn render_comparison(payload: &ComparisonPayload, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(payload).context("failed to serialize comparison");
    }

    let comparison = &payload.comparison;
    let ids = &comparison.url_ids;
    let mut out = String::new();

    let headers: Vec<String> = std::iter::once("Metric".to_string())
        .chain(ids.iter().cloned())
        .collect();
    let rows: Vec<Vec<String>> = comparison
        .diffs
        .iter()
        .map(|diff| {
            std::iter::once(diff.metric.clone())
                .chain(
                    ids.iter()
                        .map(|id| diff.values.get(id).cloned().unwrap_or_else(|| "-".into())),
                )
                .collect()
        })
        .collect();

    if format == OutputFormat::Markdown {
        let _ = writeln!(out, "# GEO Comparison\n");
        for id in ids {
            if let Some(url) = payload.urls.get(id) {
                let _ = writeln!(out, "- **{id}**: {url}");
            }
        }
        let _ = writeln!(out);
    } else {
        push_section_header(&mut out, "⚖️", "GEO Comparison");
        for id in ids {
            if let Some(url) = payload.urls.get(id) {
                push_key_value(&mut out, id, url);
            }
        }
        let _ = writeln!(out);
    }

    render_table(&mut out, &headers, &rows);
    let _ = writeln!(out);

    if let Some(winner) = comparison.summary.winner.as_deref() {
        let url = payload.urls.get(winner).map(String::as_str).unwrap_or("");
        let _ = writeln!(out, "Winner: {winner} {url}");
    }
    for insight in &payload.insights {
        let _ = writeln!(out, "• {insight}");
    }

    Ok(out)
}

fn render_table(buf: &mut String, headers: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        let mut parts = Vec::with_capacity(cells.len());
        for (idx, cell) in cells.iter().enumerate() {
            parts.push(format!(" {:<width$} ", cell, width = widths[idx]));
        }
        format!("|{}|", parts.join("|"))
    };

    let _ = writeln!(buf, "{}", format_row(headers));
    let separator: Vec<String> = widths
        .iter()
        .map(|width| format!(" {:-<width$} ", "", width = *width))
        .collect();
    let _ = writeln!(buf, "|{}|", separator.join("|"));
    for row in rows {
        let _ = writeln!(buf, "{}", format_row(row));
    }
}

fn page_title(report: &AnalysisReport) -> String {
    let title = &report.parsed.meta.title;
    if title.is_empty() {
        return "Unknown Page".to_string();
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        let short: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
        format!("{short}...")
    } else {
        title.clone()
    }
}

fn dimensions(report: &AnalysisReport) -> [(&'static str, DimensionScore); 3] {
    let breakdown = &report.geo.geo_score.breakdown;
    [
        ("Accessibility", breakdown.accessibility),
        ("Structure", breakdown.structure),
        ("Quality", breakdown.quality),
    ]
}

fn issue_message(issue: &Issue) -> String {
    let message = match issue.key {
        IssueKey::CrawlersBlocked => "AI crawlers are blocked by robots.txt",
        IssueKey::NoindexSet => "Page has noindex directive - AI cannot index",
        IssueKey::NoSchema => "No Schema.org structured data found",
        IssueKey::WeakEntry => "Weak narrative entry (missing H1/H2 or meta description)",
        IssueKey::NoFacts => "No enumerable facts (lists/tables) found",
        IssueKey::LowReadability => "Content readability is low",
        IssueKey::ThinContent => "Content is thin (under 500 words)",
        IssueKey::WeakOpening => "First paragraph does not summarize the page",
        IssueKey::UnclearPronouns => "Paragraphs open with unclear pronouns",
        IssueKey::HasFaqSchema => "FAQPage schema detected",
        IssueKey::HasArticleSchema => "Article schema detected",
        IssueKey::HasBreadcrumbSchema => "BreadcrumbList schema detected",
        IssueKey::GoodLists => "Good use of lists for content organization",
        IssueKey::GoodDefinitions => "Good definition density",
        IssueKey::EntityRich => "Rich in named entities",
        IssueKey::QuotableContent => "Contains quotable sentences (facts, statistics)",
        IssueKey::QuotableDiversity => "Quotable sentences of several kinds",
        IssueKey::QaStructure => "Question and answer structure detected",
        IssueKey::ComprehensiveContent => "Comprehensive content depth",
        IssueKey::StrongOpening => "Strong opening paragraph",
        IssueKey::ClearPronouns => "Paragraphs open with clear subjects",
        IssueKey::HighCitationPotential => "High citation potential",
    };
    match issue.crawlers.as_deref() {
        Some(crawlers) if !crawlers.is_empty() => format!("{message}: {}", crawlers.join(", ")),
        _ => message.to_string(),
    }
}

fn fix_message(action: &str) -> &str {
    match action {
        "update_robots_txt" => "Update robots.txt to allow AI crawlers (GPTBot, ClaudeBot, etc.)",
        "remove_noindex" => "Remove noindex directive from meta robots or X-Robots-Tag",
        "add_schema" => "Add Schema.org structured data (Article, FAQPage, HowTo, etc.)",
        "add_h_framing" => "Add clear H1/H2 headings and meta description",
        "add_fact_list" => "Add lists or tables with enumerable facts",
        "improve_readability" => "Simplify sentences and improve readability score",
        "expand_content" => "Expand the content with more substantive detail",
        "improve_first_paragraph" => "Open with a 50-200 word paragraph that answers the main question",
        "reduce_pronouns" => "Start paragraphs with explicit subjects instead of pronouns",
        other => other,
    }
}

fn priority_label(priority: FixPriority) -> &'static str {
    match priority {
        FixPriority::Critical => "critical",
        FixPriority::Recommended => "recommended",
        FixPriority::Suggested => "suggested",
    }
}

fn impact_label(impact: Impact) -> &'static str {
    match impact {
        Impact::High => "high",
        Impact::Medium => "medium",
        Impact::Low => "low",
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geolens_core::ParsedContent;
    use geolens_core::access::AiAccessResult;
    use geolens_core::geo::check_geo_with_access;
    use geolens_core::seo::check_seo;

    fn report(title: &str) -> AnalysisReport {
        let mut parsed = ParsedContent {
            url: "https://example.com/page".to_string(),
            ..Default::default()
        };
        parsed.meta.title = title.to_string();
        let geo = check_geo_with_access(&parsed, AiAccessResult::default(), false);
        let seo = check_seo(&parsed, "");
        AnalysisReport { parsed, geo, seo }
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn cli_report_sections() {
        let text = render_report(&report("Example"), OutputFormat::Cli).unwrap();
        assert!(text.contains("GEO Analysis Report"));
        assert!(text.contains("• GEO Score        : 33/100 (F - critical)"));
        assert!(text.contains("? unspecified"));
        assert!(text.contains("Recommended Fixes"));
        assert!(text.contains("[warning] Meta description is missing"));
    }

    #[test]
    fn markdown_report_tables() {
        let text = render_report(&report("Example"), OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("# GEO Analysis Report"));
        assert!(text.contains("| Accessibility | 25 | 40 | 62% |"));
        assert!(text.contains("| GPTBot | ❓ unspecified |"));
        assert!(text.contains("This page is classified as **Conceptual Summary-leaning**."));
    }

    #[test]
    fn json_report_is_flat() {
        let text = render_report(&report("Example"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["url"], "https://example.com/page");
        assert_eq!(value["meta"]["title"], "Example");
        assert_eq!(value["geo"]["geo_score"]["grade"], "F");
    }

    #[test]
    fn long_titles_are_shortened() {
        let title = "t".repeat(80);
        let shortened = page_title(&report(&title));
        assert_eq!(shortened.chars().count(), TITLE_MAX_CHARS);
        assert!(shortened.ends_with("..."));
        assert_eq!(page_title(&report("")), "Unknown Page");
    }

    #[test]
    fn check_line() {
        assert_eq!(
            render_check_line(&report("Example")),
            "F (33/100) - https://example.com/page"
        );
    }

    #[test]
    fn table_columns_align() {
        let mut buf = String::new();
        render_table(
            &mut buf,
            &["Metric".to_string(), "u1".to_string()],
            &[vec!["GEO Score".to_string(), "80".to_string()]],
        );
        let lines: Vec<&str> = buf.lines().collect();
        assert_eq!(lines[0], "| Metric    | u1 |");
        assert_eq!(lines[1], "| --------- | -- |");
        assert_eq!(lines[2], "| GEO Score | 80 |");
    }
}
