//! Whole-page analysis: fetch, parse, GEO and SEO checks

use serde::{Deserialize, Serialize};

use crate::access::AccessFetcher;
use crate::capabilities::Capabilities;
use crate::config::Settings;
use crate::error::AnalyzeError;
use crate::fetch::PageFetcher;
use crate::geo::{GeoResult, check_geo};
use crate::parser::parse_content;
use crate::seo::{SeoIssue, check_seo_with};
use crate::types::ParsedContent;

/// Everything known about one page after analysis.
///
/// The parsed content fields, `url` included, sit at the top level next to
/// `geo` and `seo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub parsed: ParsedContent,
    pub geo: GeoResult,
    pub seo: Vec<SeoIssue>,
}

impl AnalysisReport {
    pub fn url(&self) -> &str {
        &self.parsed.url
    }
}

/// Runs analyses with one settings/capability context and one fetcher.
pub struct Analyzer<F> {
    settings: Settings,
    capabilities: Capabilities,
    fetcher: F,
}

impl<F> Analyzer<F>
where
    F: PageFetcher + AccessFetcher,
{
    pub fn new(settings: Settings, capabilities: Capabilities, fetcher: F) -> Self {
        Self {
            settings,
            capabilities,
            fetcher,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch and analyse `url`.
    ///
    /// Draft mode applies when `draft` is set or the URL belongs to a
    /// configured draft host.
    pub async fn analyze(&self, url: &str, draft: bool) -> Result<AnalysisReport, AnalyzeError> {
        tracing::info!(url, "analyzing page");
        let html = self.fetcher.fetch_page(url).await?;
        let draft_mode = draft || self.settings.is_draft_source(url);
        self.analyze_html(url, &html, draft_mode).await
    }

    /// Analyse markup that was already retrieved for `url`.
    pub async fn analyze_html(
        &self,
        url: &str,
        html: &str,
        draft_mode: bool,
    ) -> Result<AnalysisReport, AnalyzeError> {
        let parsed = parse_content(html, url, &self.capabilities, &self.settings)?;

        let geo = check_geo(&parsed, html, url, draft_mode, &self.fetcher).await;
        let seo = check_seo_with(&parsed, html, &self.settings.seo);

        tracing::info!(
            url,
            total = geo.geo_score.total,
            grade = %geo.geo_score.grade,
            seo_issues = seo.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            parsed,
            geo,
            seo,
        })
    }
}
