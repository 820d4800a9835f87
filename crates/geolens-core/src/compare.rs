//! Side-by-side comparison of analysed pages
//!
//! Reports are compared through their JSON form so that every metric is
//! addressed by the same dotted path a downstream consumer would use.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::AI_CRAWLERS;
use crate::analyzer::AnalysisReport;
use crate::error::CompareError;

/// Metrics compared for every page: (path, display name, key)
const COMPARED_METRICS: &[(&str, &str, &str)] = &[
    ("geo.geo_score.total", "GEO Score", "geo_score"),
    ("geo.geo_score.grade", "Grade", "grade"),
    ("geo.geo_score.breakdown.accessibility.score", "Accessibility", "accessibility"),
    ("geo.geo_score.breakdown.structure.score", "Structure", "structure"),
    ("geo.geo_score.breakdown.quality.score", "Quality", "quality"),
    ("readability.flesch_reading_ease", "Readability (Flesch)", "readability_flesch"),
    ("readability.flesch_kincaid_grade", "Reading Grade", "reading_grade"),
    ("stats.word_count", "Word Count", "word_count"),
    ("stats.heading_count", "Headings", "headings"),
    ("stats.paragraph_count", "Paragraphs", "paragraphs"),
    ("geo.extended_metrics.entity_count", "Entities", "entities"),
    (
        "geo.extended_metrics.citation_potential.level",
        "Citation Potential",
        "citation_potential",
    ),
    (
        "geo.extended_metrics.qa_structure.has_qa_structure",
        "Has Q&A Structure",
        "qa_structure",
    ),
    (
        "geo.extended_metrics.content_depth.has_deep_hierarchy",
        "Deep Hierarchy",
        "deep_hierarchy",
    ),
    ("schema_org.types_found", "Schema Types", "schema_types"),
];

/// Position of the crawler row, right after the three dimension scores
const CRAWLER_ROW_INDEX: usize = 6;

const SIGNIFICANT_GAP: u64 = 20;
const SIMILAR_GAP: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// GEO total per page
    pub coverage: BTreeMap<String, u64>,
    /// Last-mile blocker count per page
    pub risk_flags: BTreeMap<String, usize>,
    pub winner: Option<String>,
    pub grades: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDiff {
    pub metric: String,
    pub key: String,
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub summary: ComparisonSummary,
    pub diffs: Vec<MetricDiff>,
    /// Page ids in the order they were supplied
    pub url_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPayload {
    pub urls: BTreeMap<String, String>,
    pub comparison: Comparison,
    pub insights: Vec<String>,
}

/// Compare serialized analysis reports keyed by page id.
///
/// Ids must be unique. The winner is the page with the highest GEO total;
/// on a tie the page supplied first wins.
pub fn compare_results(results: &[(String, Value)]) -> Result<Comparison, CompareError> {
    let mut seen = BTreeSet::new();
    if let Some((id, _)) = results.iter().find(|(id, _)| !seen.insert(id.as_str())) {
        return Err(CompareError::DuplicateId(id.clone()));
    }
    if results.len() < 2 {
        return Err(CompareError::TooFew {
            found: results.len(),
        });
    }

    let mut summary = ComparisonSummary::default();
    let mut winner: Option<(&str, u64)> = None;

    for (id, result) in results {
        let total = lookup(result, "geo.geo_score.total")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let grade = lookup(result, "geo.geo_score.grade")
            .and_then(Value::as_str)
            .unwrap_or("F");
        let blockers = lookup(result, "geo.last_mile_blockers")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        summary.coverage.insert(id.clone(), total);
        summary.grades.insert(id.clone(), grade.to_string());
        summary.risk_flags.insert(id.clone(), blockers);

        if winner.is_none_or(|(_, best)| total > best) {
            winner = Some((id.as_str(), total));
        }
    }
    summary.winner = winner.map(|(id, _)| id.to_string());

    let mut diffs: Vec<MetricDiff> = COMPARED_METRICS
        .iter()
        .map(|(path, metric, key)| MetricDiff {
            metric: metric.to_string(),
            key: key.to_string(),
            values: results
                .iter()
                .map(|(id, result)| (id.clone(), format_value(lookup(result, path))))
                .collect(),
        })
        .collect();

    let crawlers = MetricDiff {
        metric: "AI Crawlers Allowed".to_string(),
        key: "ai_crawlers".to_string(),
        values: results
            .iter()
            .map(|(id, result)| (id.clone(), format!("{}/{}", allowed_crawlers(result), AI_CRAWLERS.len())))
            .collect(),
    };
    diffs.insert(CRAWLER_ROW_INDEX, crawlers);

    Ok(Comparison {
        summary,
        diffs,
        url_ids: results.iter().map(|(id, _)| id.clone()).collect(),
    })
}

/// [`compare_results`] over in-memory reports.
pub fn compare_reports(reports: &[(String, AnalysisReport)]) -> Result<Comparison, CompareError> {
    let results = reports
        .iter()
        .map(|(id, report)| {
            serde_json::to_value(report)
                .map(|value| (id.clone(), value))
                .map_err(|err| CompareError::Serialize {
                    id: id.clone(),
                    reason: err.to_string(),
                })
        })
        .collect::<Result<Vec<(String, Value)>, _>>()?;
    compare_results(&results)
}

/// Plain-language observations about a comparison.
pub fn comparison_insights(comparison: &Comparison) -> Vec<String> {
    let summary = &comparison.summary;
    let mut insights = Vec::new();

    let scores = summary.coverage.values().copied();
    if let (Some(max), Some(min)) = (scores.clone().max(), scores.min()) {
        if summary.coverage.len() >= 2 {
            let gap = max - min;
            if gap > SIGNIFICANT_GAP {
                insights.push(format!("Significant GEO score gap: {gap} points difference"));
            } else if gap < SIMILAR_GAP {
                insights.push("Pages have similar GEO scores".to_string());
            }
        }
    }

    // first page with the most blockers, in supplied order
    let mut riskiest: Option<(&str, usize)> = None;
    let mut fewest = usize::MAX;
    for id in &comparison.url_ids {
        let Some(&flags) = summary.risk_flags.get(id) else {
            continue;
        };
        fewest = fewest.min(flags);
        if riskiest.is_none_or(|(_, most)| flags > most) {
            riskiest = Some((id.as_str(), flags));
        }
    }
    if let Some((id, most)) = riskiest {
        if most > fewest {
            insights.push(format!("{id} has more structural issues to address"));
        }
    }

    if let Some(winner) = &summary.winner {
        match summary.grades.get(winner).map(String::as_str) {
            Some("A" | "B") => insights.push(format!("{winner} is already well-optimized for AI")),
            Some("D" | "F") => {
                insights.push("All pages need significant improvement for AI visibility".to_string())
            }
            _ => {}
        }
    }

    insights
}

/// Comparison plus insights plus the URL behind each page id.
pub fn create_comparison_payload(
    urls: &[(String, String)],
    results: &[(String, Value)],
) -> Result<ComparisonPayload, CompareError> {
    let comparison = compare_results(results)?;
    let insights = comparison_insights(&comparison);
    Ok(ComparisonPayload {
        urls: urls.iter().cloned().collect(),
        comparison,
        insights,
    })
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(Value::Number(n)) if n.is_f64() => format!("{:.1}", n.as_f64().unwrap_or_default()),
        Some(Value::Array(items)) => items
            .iter()
            .take(3)
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn allowed_crawlers(result: &Value) -> usize {
    AI_CRAWLERS
        .iter()
        .filter(|crawler| {
            lookup(result, "geo.ai_crawler_access")
                .and_then(|access| access.get(crawler.key))
                .and_then(Value::as_str)
                == Some("allow")
        })
        .count()
}
