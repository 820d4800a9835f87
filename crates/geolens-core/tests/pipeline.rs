//! End-to-end analyses over HTML fixtures served from memory

use geolens_core::access::CrawlerVerdict;
use geolens_core::language::Language;
use geolens_core::types::EntitySource;
use geolens_core::{
    AnalysisReport, Analyzer, Capabilities, Settings, StaticFetcher, compare_reports,
    comparison_insights, parse_content,
};

const GUIDE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Generative engine optimization: a practical guide</title>
  <meta name="description" content="What GEO is, which page structures answer engines quote, and how to measure them.">
  <link rel="canonical" href="https://example.com/guide">
  <script type="application/ld+json">
    {"@context": "https://schema.org", "@type": "Article", "headline": "GEO guide"}
  </script>
</head>
<body>
  <nav><a href="/">Home</a><a href="/blog">Blog</a></nav>
  <main>
    <h1>Generative engine optimization</h1>
    <p>Generative engine optimization refers to shaping web pages so that AI answer engines can find, read and cite them.</p>
    <h2>What do answer engines look for?</h2>
    <p>According to a 2024 study of 10,000 answers, 42% of citations pointed at pages with explicit lists or tables.</p>
    <ul>
      <li>Clear headings that frame each section</li>
      <li>Definitions stated in a single sentence</li>
      <li>Facts that can be enumerated</li>
    </ul>
    <h3>Signals by weight</h3>
    <table>
      <tr><th>Dimension</th><th>Points</th></tr>
      <tr><td>Accessibility</td><td>40</td></tr>
      <tr><td>Structure</td><td>30</td></tr>
      <tr><td>Quality</td><td>30</td></tr>
    </table>
    <h2>How to get started</h2>
    <ol>
      <li>Check robots.txt for AI crawler rules</li>
      <li>Add a meta description</li>
    </ol>
    <p>Read the <a href="/docs/robots">robots.txt reference</a> before changing crawler rules.</p>
  </main>
  <footer>Example Inc.</footer>
</body>
</html>"#;

const BARE: &str = r#"<html><body><div>Just some text without structure.</div></body></html>"#;

fn analyzer(fetcher: StaticFetcher) -> Analyzer<StaticFetcher> {
    Analyzer::new(Settings::default(), Capabilities::none(), fetcher)
}

async fn analyze(fetcher: StaticFetcher, url: &str) -> AnalysisReport {
    analyzer(fetcher).analyze(url, false).await.unwrap()
}

#[tokio::test]
async fn structured_page_outscores_bare_page() {
    let fetcher = StaticFetcher::new()
        .with_page("https://example.com/guide", GUIDE)
        .with_page("https://example.com/bare", BARE);
    let analyzer = analyzer(fetcher);

    let guide = analyzer.analyze("https://example.com/guide", false).await.unwrap();
    let bare = analyzer.analyze("https://example.com/bare", false).await.unwrap();

    let components = guide.parsed.content_surface_size.components;
    assert_eq!(guide.parsed.stats.heading_count, 4);
    assert_eq!(components.list_blocks, 2);
    assert_eq!(components.table_blocks, 1);
    assert!(components.definition_blocks >= 1);
    assert!(guide.geo.last_mile_blockers.is_empty());
    assert!(guide.geo.extended_metrics.qa_structure.question_headings >= 1);

    assert_eq!(bare.geo.last_mile_blockers.len(), 3);
    assert!(guide.geo.geo_score.total > bare.geo.geo_score.total);
    assert!(
        guide.geo.geo_score.breakdown.structure.score > bare.geo.geo_score.breakdown.structure.score
    );
}

#[tokio::test]
async fn robots_precedence_through_fetcher() {
    let robots = "User-agent: *\nDisallow: /private\nAllow: /private/public\n";
    let fetcher = || {
        StaticFetcher::new()
            .with_page("https://example.com/private/public/page", GUIDE)
            .with_page("https://example.com/private/secret", GUIDE)
            .with_robots("https://example.com", robots)
    };

    let open = analyze(fetcher(), "https://example.com/private/public/page").await;
    assert!(open.geo.ai_crawler_access.robots_txt_found);
    assert_eq!(open.geo.ai_crawler_access.gptbot, CrawlerVerdict::Allow);
    assert_eq!(open.geo.ai_crawler_access.google_extended, CrawlerVerdict::Allow);

    let closed = analyze(fetcher(), "https://example.com/private/secret").await;
    assert_eq!(closed.geo.ai_crawler_access.claudebot, CrawlerVerdict::Disallow);
    assert_eq!(open.geo.geo_score.breakdown.accessibility.score, 40);
    assert_eq!(closed.geo.geo_score.breakdown.accessibility.score, 0);
}

#[tokio::test]
async fn noindex_header_and_meta_cost_points() {
    let url = "https://example.com/guide";
    let baseline = analyze(StaticFetcher::new().with_page(url, GUIDE), url).await;

    let header = analyze(
        StaticFetcher::new()
            .with_page(url, GUIDE)
            .with_header(url, "X-Robots-Tag", "noindex"),
        url,
    )
    .await;
    assert!(header.geo.ai_crawler_access.x_robots_tag.noindex);
    assert!(baseline.geo.geo_score.total - header.geo.geo_score.total >= 10);

    let with_meta = GUIDE.replace(
        "<head>",
        r#"<head><meta name="robots" content="noindex, follow">"#,
    );
    let meta = analyze(StaticFetcher::new().with_page(url, &with_meta), url).await;
    assert!(meta.geo.ai_crawler_access.meta_robots.noindex);
    assert!(baseline.geo.geo_score.total - meta.geo.geo_score.total >= 10);
    assert!(meta.seo.iter().any(|issue| issue.rule_id == "noindex_detected"));
}

#[test]
fn url_does_not_change_structure_or_quality() {
    let settings = Settings::default();
    let caps = Capabilities::none();
    let a = parse_content(GUIDE, "https://example.com/guide", &caps, &settings).unwrap();
    let b = parse_content(GUIDE, "http://mirror.example.org/a/b", &caps, &settings).unwrap();

    let geo_a = geolens_core::geo::check_geo_with_access(&a, Default::default(), false);
    let geo_b = geolens_core::geo::check_geo_with_access(&b, Default::default(), false);
    assert_eq!(
        geo_a.geo_score.breakdown.structure,
        geo_b.geo_score.breakdown.structure
    );
    assert_eq!(geo_a.geo_score.breakdown.quality, geo_b.geo_score.breakdown.quality);
}

#[test]
fn content_ratio_stays_in_range() {
    let settings = Settings::default();
    for html in [GUIDE, BARE, "<p>only a paragraph</p>", "<script>var x = 1;</script>"] {
        let parsed = parse_content(html, "", &Capabilities::none(), &settings).unwrap();
        let ratio = parsed.stats.content_ratio;
        assert!((0.0..=1.0).contains(&ratio), "{ratio} for {html}");
    }
}

#[test]
fn multilingual_pages() {
    let settings = Settings::default();
    let caps = Capabilities::none();

    let zh = r#"<html><body><main>
        <h1>智慧城市</h1>
        <p>智慧城市是利用資訊科技改善公共服務的城市發展模式。</p>
        <p>台北市政府在2023年宣布新的交通計畫，研究指出通勤時間縮短了15%。</p>
    </main></body></html>"#;
    let parsed = parse_content(zh, "https://example.tw/city", &caps, &settings).unwrap();
    assert_eq!(parsed.language, Language::Zh);
    assert!(parsed.content_surface_size.components.definition_blocks >= 1);
    assert!(!parsed.entities.is_empty());
    assert!(parsed.entities.iter().all(|e| e.source == EntitySource::Pattern));
    assert!(parsed.entities.iter().any(|e| e.label == "DATE" && e.text == "2023年"));

    let ja = r#"<html><body><main>
        <h1>機械学習</h1>
        <p>機械学習とは、データから規則を学ぶ技術のことである。</p>
    </main></body></html>"#;
    let parsed = parse_content(ja, "https://example.jp/ml", &caps, &settings).unwrap();
    assert_eq!(parsed.language, Language::Ja);
    assert_eq!(parsed.content_surface_size.components.definition_blocks, 1);

    let ko = r#"<html><body><main>
        <h1>인공지능</h1>
        <p>인공지능이란 사람의 학습 능력을 컴퓨터로 구현한 기술이다.</p>
    </main></body></html>"#;
    let parsed = parse_content(ko, "https://example.kr/ai", &caps, &settings).unwrap();
    assert_eq!(parsed.language, Language::Ko);
    assert_eq!(parsed.content_surface_size.components.definition_blocks, 1);

    // every language still yields a complete, scored result
    let result = geolens_core::geo::check_geo_with_access(&parsed, Default::default(), false);
    assert!(result.geo_score.total <= 100);
}

#[tokio::test]
async fn compares_analysed_pages() {
    let fetcher = StaticFetcher::new()
        .with_page("https://example.com/guide", GUIDE)
        .with_page("https://example.com/bare", BARE);
    let analyzer = analyzer(fetcher);

    let reports = vec![
        (
            "u1".to_string(),
            analyzer.analyze("https://example.com/bare", false).await.unwrap(),
        ),
        (
            "u2".to_string(),
            analyzer.analyze("https://example.com/guide", false).await.unwrap(),
        ),
    ];
    let comparison = compare_reports(&reports).unwrap();
    assert_eq!(comparison.summary.winner.as_deref(), Some("u2"));
    assert_eq!(comparison.summary.risk_flags["u1"], 3);

    let headings = comparison.diffs.iter().find(|d| d.key == "headings").unwrap();
    assert_eq!(headings.values["u2"], "4");
    let crawlers = comparison.diffs.iter().find(|d| d.key == "ai_crawlers").unwrap();
    assert_eq!(crawlers.values["u1"], "0/4");

    let insights = comparison_insights(&comparison);
    assert!(insights.contains(&"u1 has more structural issues to address".to_string()));
}
