//! Weighted GEO score
//!
//! Three dimensions add up to the 0-100 total:
//!
//! | Dimension     | Max | Inputs                                            |
//! |---------------|-----|---------------------------------------------------|
//! | accessibility | 40  | crawler verdicts, noindex/nofollow, blockers       |
//! | structure     | 30  | headings, lists/tables, Schema.org, Q&A            |
//! | quality       | 30  | readability, entities, definitions, quotables, ... |

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Blocker;
use super::metrics::{ExtendedMetrics, QaStructure};
use crate::access::{AI_CRAWLERS, AiAccessResult, CrawlerVerdict};
use crate::readability::round_to;
use crate::types::ParsedContent;

pub const ACCESSIBILITY_MAX: u32 = 40;
pub const STRUCTURE_MAX: u32 = 30;
pub const QUALITY_MAX: u32 = 30;

/// Schema.org points the structure dimension accepts
const SCHEMA_STRUCTURE_CAP: u32 = 11;
/// Readability points when no metrics could be computed
const READABILITY_DEFAULT_POINTS: u32 = 3;
const FLESCH_WHEN_MISSING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_total(total: u32) -> Self {
        match total {
            t if t >= 90 => Grade::A,
            t if t >= 75 => Grade::B,
            t if t >= 60 => Grade::C,
            t if t >= 40 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::A => "excellent",
            Grade::B => "good",
            Grade::C => "fair",
            Grade::D => "poor",
            Grade::F => "critical",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// D and F
    pub fn is_failing(self) -> bool {
        matches!(self, Grade::D | Grade::F)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u32,
    pub max: u32,
    pub percentage: u32,
}

impl DimensionScore {
    pub fn new(score: u32, max: u32) -> Self {
        let percentage = round_to(score as f64 / max as f64 * 100.0, 0) as u32;
        Self {
            score,
            max,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub accessibility: DimensionScore,
    pub structure: DimensionScore,
    pub quality: DimensionScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoScore {
    pub total: u32,
    pub grade: Grade,
    pub grade_label: String,
    pub breakdown: ScoreBreakdown,
}

/// 40 minus crawler blocks, indexing directives and blockers; never negative.
pub fn score_accessibility(access: &AiAccessResult, blockers: &[Blocker]) -> u32 {
    let blocked = AI_CRAWLERS
        .iter()
        .filter(|c| access.verdict(c) == CrawlerVerdict::Disallow)
        .count() as i64;

    let mut score = ACCESSIBILITY_MAX as i64 - blocked * 10;
    if access.noindex() {
        score -= 15;
    }
    if access.nofollow() {
        score -= 5;
    }
    score -= blockers.len() as i64 * 5;

    score.max(0) as u32
}

pub fn score_structure(parsed: &ParsedContent, qa: &QaStructure) -> u32 {
    let components = &parsed.content_surface_size.components;
    let schema = &parsed.schema_org;
    let mut score = 0;

    score += match parsed.stats.heading_count {
        n if n >= 5 => 8,
        n if n >= 3 => 6,
        n if n >= 1 => 4,
        _ => 0,
    };

    if components.list_blocks >= 2 || components.table_blocks >= 1 {
        score += 7;
    } else if components.list_blocks >= 1 {
        score += 5;
    }

    if schema.available {
        score += schema.score_contribution.min(SCHEMA_STRUCTURE_CAP);
    }
    if schema.has_breadcrumb {
        score += 2;
    }

    if qa.has_qa_structure {
        score += 4;
    } else if qa.question_headings >= 1 {
        score += 2;
    }

    score.min(STRUCTURE_MAX)
}

pub fn score_quality(parsed: &ParsedContent, metrics: &ExtendedMetrics) -> u32 {
    let components = &parsed.content_surface_size.components;
    let mut score = 0;

    score += if parsed.readability.available {
        match parsed
            .readability
            .flesch_reading_ease
            .unwrap_or(FLESCH_WHEN_MISSING)
        {
            f if f >= 60.0 => 6,
            f if f >= 50.0 => 5,
            f if f >= 40.0 => 4,
            f if f >= 30.0 => 2,
            _ => 1,
        }
    } else {
        READABILITY_DEFAULT_POINTS
    };

    score += match parsed.entities.len() {
        n if n >= 10 => 4,
        n if n >= 5 => 3,
        n if n >= 2 => 2,
        n if n >= 1 => 1,
        _ => 0,
    };

    score += match components.definition_blocks {
        n if n >= 3 => 5,
        2 => 4,
        1 => 2,
        _ => 0,
    };

    score += match parsed.stats.content_ratio {
        r if r >= 0.7 => 4,
        r if r >= 0.5 => 3,
        r if r >= 0.3 => 2,
        _ => 0,
    };

    score += quotable_points(parsed);

    score += metrics.link_quality.quality_score.min(2);
    score += metrics.content_depth.depth_score.min(2);
    score += metrics.first_paragraph.score.min(2);
    score += metrics.pronoun_clarity.score;

    score.min(QUALITY_MAX)
}

fn quotable_points(parsed: &ParsedContent) -> u32 {
    let count = parsed.quotable_sentences.len();
    let types: HashSet<_> = parsed
        .quotable_sentences
        .iter()
        .map(|q| q.quote_type)
        .collect();
    let high_value = types.iter().any(|t| t.is_high_value());

    if count >= 3 && types.len() >= 2 {
        5
    } else if count >= 2 && high_value {
        4
    } else if count >= 3 || (count >= 1 && high_value) {
        3
    } else if count >= 1 {
        2
    } else {
        0
    }
}

/// Score `parsed` against the given access result and blockers.
pub fn calculate_geo_score(
    parsed: &ParsedContent,
    access: &AiAccessResult,
    blockers: &[Blocker],
) -> GeoScore {
    let metrics = ExtendedMetrics::compute(parsed);
    score_with_metrics(parsed, access, blockers, &metrics)
}

pub(crate) fn score_with_metrics(
    parsed: &ParsedContent,
    access: &AiAccessResult,
    blockers: &[Blocker],
    metrics: &ExtendedMetrics,
) -> GeoScore {
    let accessibility = score_accessibility(access, blockers);
    let structure = score_structure(parsed, &metrics.qa_structure);
    let quality = score_quality(parsed, metrics);

    let total = (accessibility + structure + quality).min(100);
    let grade = Grade::from_total(total);

    GeoScore {
        total,
        grade,
        grade_label: grade.label().to_string(),
        breakdown: ScoreBreakdown {
            accessibility: DimensionScore::new(accessibility, ACCESSIBILITY_MAX),
            structure: DimensionScore::new(structure, STRUCTURE_MAX),
            quality: DimensionScore::new(quality, QUALITY_MAX),
        },
    }
}
