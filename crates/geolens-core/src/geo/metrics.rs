//! Extended GEO metrics
//!
//! Each metric is a pure function of the parsed content and carries its own
//! small score, which the quality dimension and the summary consume.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Heading, Link, ParsedContent};

static QA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?i)^(what|how|why|when|where|who|which|can|does|is|are|do|will|should)\s+.+\?",
        )
        .expect("valid question regex"),
        Regex::new(r"^.+\?\s*$").expect("valid question regex"),
    ]
});

static UNCLEAR_PRONOUNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(this|that|these|those|it|they|them|he|she|him|her)\b")
        .expect("valid pronoun regex")
});

static STRONG_OPENINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^.+\s+(is|are|was|were)\s+.+",
        r"(?i)^(this|the)\s+(article|guide|post|tutorial|page)\s+",
        r"(?i)^(learn|discover|find out|understand)\s+",
        r"^\d+\s+.+",
    ]
    .iter()
    .map(|re| Regex::new(re).expect("valid opening regex"))
    .collect()
});

const GENERIC_ANCHORS: &[&str] = &[
    "click here",
    "here",
    "link",
    "read more",
    "more",
    "learn more",
    "this",
];

const PRONOUN_STARTS: &[&str] = &["this", "that", "these", "those", "it", "they", "he", "she"];

const QA_PARAGRAPH_WINDOW: usize = 20;
const PRONOUN_PARAGRAPH_WINDOW: usize = 10;

fn is_question(text: &str) -> bool {
    QA_PATTERNS.iter().any(|re| re.is_match(text))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaStructure {
    pub has_qa_structure: bool,
    pub question_headings: usize,
    pub question_paragraphs: usize,
}

/// Question-shaped headings and (early) paragraphs.
pub fn detect_qa_structure(headings: &[Heading], paragraphs: &[String]) -> QaStructure {
    let question_headings = headings.iter().filter(|h| is_question(&h.text)).count();
    let question_paragraphs = paragraphs
        .iter()
        .take(QA_PARAGRAPH_WINDOW)
        .filter(|p| is_question(p))
        .count();

    QaStructure {
        has_qa_structure: question_headings >= 2 || question_paragraphs >= 3,
        question_headings,
        question_paragraphs,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkQuality {
    pub total_links: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub descriptive_anchors: usize,
    pub quality_score: u32,
}

/// Anchor-text quality of the content links.
///
/// Links are split by the shape of the href alone: root-relative and fragment
/// links are internal, anything starting with `http` is external.
pub fn assess_link_quality(links: &[Link]) -> LinkQuality {
    if links.is_empty() {
        return LinkQuality::default();
    }

    let mut quality = LinkQuality {
        total_links: links.len(),
        ..Default::default()
    };

    for link in links {
        if link.href.starts_with('/') || link.href.starts_with('#') {
            quality.internal_links += 1;
        } else if link.href.starts_with("http") {
            quality.external_links += 1;
        } else {
            quality.internal_links += 1;
        }

        let text = link.text.trim().to_lowercase();
        if !text.is_empty() && !GENERIC_ANCHORS.contains(&text.as_str()) && text.chars().count() > 3
        {
            quality.descriptive_anchors += 1;
        }
    }

    let ratio = quality.descriptive_anchors as f64 / quality.total_links as f64;
    quality.quality_score = if ratio >= 0.8 {
        3
    } else if ratio >= 0.5 {
        2
    } else if ratio >= 0.3 {
        1
    } else {
        0
    };
    quality
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDepth {
    pub word_count: usize,
    pub unique_heading_levels: usize,
    pub has_deep_hierarchy: bool,
    pub depth_score: u32,
}

pub fn assess_content_depth(parsed: &ParsedContent) -> ContentDepth {
    let word_count = parsed.stats.word_count;
    let unique_heading_levels = parsed
        .content
        .headings
        .iter()
        .map(|h| h.level)
        .collect::<HashSet<_>>()
        .len();
    let has_deep_hierarchy = unique_heading_levels >= 3;

    let mut depth_score = match word_count {
        n if n >= 2000 => 3,
        n if n >= 1000 => 2,
        n if n >= 500 => 1,
        _ => 0,
    };
    if has_deep_hierarchy {
        depth_score += 2;
    } else if unique_heading_levels >= 2 {
        depth_score += 1;
    }

    ContentDepth {
        word_count,
        unique_heading_levels,
        has_deep_hierarchy,
        depth_score,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstParagraph {
    pub has_strong_opening: bool,
    pub first_paragraph_length: usize,
    pub score: u32,
}

/// How well the first paragraph works as a standalone summary.
pub fn assess_first_paragraph(paragraphs: &[String]) -> FirstParagraph {
    let Some(first) = paragraphs.first() else {
        return FirstParagraph::default();
    };

    let first = first.trim();
    let word_count = first.split_whitespace().count();
    let has_strong_opening = STRONG_OPENINGS.iter().any(|re| re.is_match(first));

    let mut score = if (50..=200).contains(&word_count) {
        2
    } else if (30..=250).contains(&word_count) {
        1
    } else {
        0
    };
    if has_strong_opening {
        score += 1;
    }

    FirstParagraph {
        has_strong_opening,
        first_paragraph_length: word_count,
        score,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronounClarity {
    pub paragraphs_starting_with_pronoun: usize,
    pub total_pronouns_in_first_10: usize,
    pub score: u32,
}

/// Early paragraphs that open with a pronoun lose their referent when quoted alone.
pub fn detect_pronoun_issues(paragraphs: &[String]) -> PronounClarity {
    let mut starts = 0;
    let mut total = 0;

    for paragraph in paragraphs.iter().take(PRONOUN_PARAGRAPH_WINDOW) {
        let paragraph = paragraph.trim();
        let Some(first_word) = paragraph.split_whitespace().next() else {
            continue;
        };
        if PRONOUN_STARTS.contains(&first_word.to_lowercase().as_str()) {
            starts += 1;
        }
        total += UNCLEAR_PRONOUNS.find_iter(paragraph).count();
    }

    PronounClarity {
        paragraphs_starting_with_pronoun: starts,
        total_pronouns_in_first_10: total,
        score: match starts {
            0 => 2,
            1 | 2 => 1,
            _ => 0,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationLevel {
    High,
    Medium,
    Low,
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationPotential {
    pub score: u32,
    pub max_score: u32,
    pub level: CitationLevel,
    pub signals: Vec<String>,
}

pub const CITATION_MAX_SCORE: u32 = 11;

/// Likelihood that an answer engine quotes the page, from 0 to 11.
pub fn calculate_citation_potential(
    parsed: &ParsedContent,
    qa: &QaStructure,
    links: &LinkQuality,
) -> CitationPotential {
    let mut score = 0;
    let mut signals = Vec::new();
    let mut add = |points: u32, signal: &str| {
        score += points;
        signals.push(signal.to_string());
    };

    let quotable = parsed.quotable_sentences.len();
    if quotable >= 3 {
        add(3, "multiple_quotable_sentences");
    } else if quotable >= 1 {
        add(1, "has_quotable_content");
    }

    if parsed.schema_org.has_article {
        add(1, "article_schema");
    }
    if parsed.schema_org.has_faq {
        add(1, "faq_schema");
    }

    let entities = parsed.entities.len();
    if entities >= 5 {
        add(2, "entity_rich");
    } else if entities >= 2 {
        add(1, "has_entities");
    }

    if qa.has_qa_structure {
        add(2, "qa_structure");
    }
    if links.external_links >= 2 {
        add(1, "external_references");
    }

    let level = match score {
        s if s >= 8 => CitationLevel::High,
        s if s >= 5 => CitationLevel::Medium,
        s if s >= 2 => CitationLevel::Low,
        _ => CitationLevel::Minimal,
    };

    CitationPotential {
        score,
        max_score: CITATION_MAX_SCORE,
        level,
        signals,
    }
}

/// Every extended metric for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedMetrics {
    pub qa_structure: QaStructure,
    pub link_quality: LinkQuality,
    pub content_depth: ContentDepth,
    pub entity_count: usize,
    pub first_paragraph: FirstParagraph,
    pub pronoun_clarity: PronounClarity,
    pub citation_potential: CitationPotential,
}

impl ExtendedMetrics {
    pub fn compute(parsed: &ParsedContent) -> Self {
        let content = &parsed.content;
        let qa_structure = detect_qa_structure(&content.headings, &content.paragraphs);
        let link_quality = assess_link_quality(&content.links);
        let citation_potential = calculate_citation_potential(parsed, &qa_structure, &link_quality);

        Self {
            content_depth: assess_content_depth(parsed),
            entity_count: parsed.entities.len(),
            first_paragraph: assess_first_paragraph(&content.paragraphs),
            pronoun_clarity: detect_pronoun_issues(&content.paragraphs),
            qa_structure,
            link_quality,
            citation_potential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeadingLevel;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn link(href: &str, text: &str) -> Link {
        Link {
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn qa_needs_two_headings_or_three_paragraphs() {
        let headings = vec![
            Heading::new(HeadingLevel::H2, "What is GEO?"),
            Heading::new(HeadingLevel::H2, "Pricing"),
        ];
        let qa = detect_qa_structure(&headings, &[]);
        assert_eq!(qa.question_headings, 1);
        assert!(!qa.has_qa_structure);

        let paragraphs = strings(&["Really?", "Is it fast?", "Plain text.", "Why not?"]);
        let qa = detect_qa_structure(&[], &paragraphs);
        assert_eq!(qa.question_paragraphs, 3);
        assert!(qa.has_qa_structure);
    }

    #[test]
    fn link_quality_ratios() {
        assert_eq!(assess_link_quality(&[]), LinkQuality::default());

        let links = vec![
            link("https://example.com/guide", "Complete setup guide"),
            link("/pricing", "Pricing plans"),
            link("#top", "here"),
            link("docs/api", "API"),
        ];
        let quality = assess_link_quality(&links);
        assert_eq!(quality.external_links, 1);
        assert_eq!(quality.internal_links, 3);
        assert_eq!(quality.descriptive_anchors, 2);
        assert_eq!(quality.quality_score, 2);
    }

    #[test]
    fn first_paragraph_scoring() {
        let long = format!("GEO is a discipline. {}", "word ".repeat(60));
        let assessed = assess_first_paragraph(&[long]);
        assert!(assessed.has_strong_opening);
        assert_eq!(assessed.score, 3);

        let short = assess_first_paragraph(&strings(&["Welcome aboard"]));
        assert!(!short.has_strong_opening);
        assert_eq!(short.score, 0);
        assert_eq!(assess_first_paragraph(&[]), FirstParagraph::default());
    }

    #[test]
    fn pronoun_starts_reduce_score() {
        assert_eq!(detect_pronoun_issues(&[]).score, 2);

        let paragraphs = strings(&[
            "It works well.",
            "They said so.",
            "This matters.",
            "GEO helps them.",
        ]);
        let clarity = detect_pronoun_issues(&paragraphs);
        assert_eq!(clarity.paragraphs_starting_with_pronoun, 3);
        assert_eq!(clarity.total_pronouns_in_first_10, 4);
        assert_eq!(clarity.score, 0);
    }

    #[test]
    fn content_depth_counts_levels() {
        let mut parsed = ParsedContent::default();
        parsed.stats.word_count = 1200;
        parsed.content.headings = vec![
            Heading::new(HeadingLevel::H1, "a"),
            Heading::new(HeadingLevel::H2, "b"),
            Heading::new(HeadingLevel::H2, "c"),
        ];
        let depth = assess_content_depth(&parsed);
        assert_eq!(depth.unique_heading_levels, 2);
        assert!(!depth.has_deep_hierarchy);
        assert_eq!(depth.depth_score, 3);
    }

    #[test]
    fn citation_levels() {
        let parsed = ParsedContent::default();
        let potential =
            calculate_citation_potential(&parsed, &QaStructure::default(), &LinkQuality::default());
        assert_eq!(potential.score, 0);
        assert_eq!(potential.level, CitationLevel::Minimal);
        assert_eq!(potential.max_score, 11);

        let qa = QaStructure {
            has_qa_structure: true,
            ..Default::default()
        };
        let links = LinkQuality {
            external_links: 2,
            ..Default::default()
        };
        let potential = calculate_citation_potential(&parsed, &qa, &links);
        assert_eq!(potential.score, 3);
        assert_eq!(potential.level, CitationLevel::Low);
        assert_eq!(potential.signals, vec!["qa_structure", "external_references"]);
    }
}
