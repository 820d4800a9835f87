//! GEO checks
//!
//! [`check_geo`] is the entry point: it evaluates crawler access, detects
//! last-mile blockers, scores the page and assembles the summary and the
//! extended metrics into one [`GeoResult`].

pub mod metrics;
pub mod scoring;
pub mod summary;

use serde::{Deserialize, Serialize};

use crate::access::{AccessFetcher, AiAccessResult, draft_access, evaluate_access};
use crate::types::ParsedContent;

pub use metrics::ExtendedMetrics;
pub use scoring::{GeoScore, Grade, calculate_geo_score};
pub use summary::{
    Blocker, BlockerSignalMapping, Interpretation, InterpretationRuleHints, StructuralFix, Summary,
};

/// Complete GEO assessment of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoResult {
    pub geo_score: GeoScore,
    pub summary: Summary,
    pub ai_crawler_access: AiAccessResult,
    pub ai_usage_interpretation: Interpretation,
    pub interpretation_rule_hints: InterpretationRuleHints,
    pub last_mile_blockers: Vec<Blocker>,
    pub blocker_signal_mapping: BlockerSignalMapping,
    pub structural_fixes: Vec<StructuralFix>,
    pub extended_metrics: ExtendedMetrics,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub draft_mode: bool,
}

/// Run every GEO check for `parsed`, fetching robots.txt and headers through
/// `fetcher` unless `draft_mode` is set.
pub async fn check_geo<F>(
    parsed: &ParsedContent,
    html: &str,
    url: &str,
    draft_mode: bool,
    fetcher: &F,
) -> GeoResult
where
    F: AccessFetcher,
{
    let access = if draft_mode {
        draft_access()
    } else {
        evaluate_access(url, html, fetcher).await
    };
    check_geo_with_access(parsed, access, draft_mode)
}

/// [`check_geo`] with the access result already known.
///
/// In draft mode blockers are still reported but do not reduce the score.
pub fn check_geo_with_access(
    parsed: &ParsedContent,
    access: AiAccessResult,
    draft_mode: bool,
) -> GeoResult {
    let components = &parsed.content_surface_size.components;
    let mapping = BlockerSignalMapping::compute(parsed);
    let blockers = mapping.triggered();
    let metrics = ExtendedMetrics::compute(parsed);

    let scored_blockers: &[Blocker] = if draft_mode { &[] } else { &blockers };
    let geo_score = scoring::score_with_metrics(parsed, &access, scored_blockers, &metrics);
    let summary =
        summary::generate_summary(&geo_score, &blockers, &access, parsed, &metrics, draft_mode);

    tracing::debug!(
        url = %parsed.url,
        total = geo_score.total,
        grade = %geo_score.grade,
        blockers = blockers.len(),
        draft_mode,
        "geo score computed"
    );

    GeoResult {
        geo_score,
        summary,
        ai_crawler_access: access,
        ai_usage_interpretation: summary::interpret(
            components,
            parsed.stats.avg_paragraph_length,
            parsed.entities.len(),
        ),
        interpretation_rule_hints: InterpretationRuleHints::default(),
        structural_fixes: summary::structural_fixes(&blockers),
        last_mile_blockers: blockers,
        blocker_signal_mapping: mapping,
        extended_metrics: metrics,
        draft_mode,
    }
}
