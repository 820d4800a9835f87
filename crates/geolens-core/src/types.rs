//! Content tree and statistics produced by the extractor

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Everything the extractor learned about one page.
///
/// Built once per analysis by [`crate::parser::parse_content`] and treated as
/// read-only afterwards; every detector and scorer borrows it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedContent {
    pub url: String,
    pub meta: PageMeta,
    pub content: ContentTree,
    pub stats: ContentStats,
    pub content_surface_size: ContentSurfaceSize,
    pub entities: Vec<Entity>,
    pub readability: ReadabilityMetrics,
    pub schema_org: SchemaOrgSummary,
    pub quotable_sentences: Vec<QuotableSentence>,
    pub language: Language,
}

/// Head metadata of the full document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentTree {
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<Vec<String>>,
    /// Each table is a list of rows, cells joined with `" | "`
    pub tables: Vec<Vec<String>>,
    pub links: Vec<Link>,
    /// Paragraphs grouped under the heading that precedes them
    pub sections: Vec<Section>,
    /// All blocks in document order
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// Map a tag name such as `h2` to its level.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            _ => None,
        }
    }

    pub fn depth(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
            Self::H5 => 5,
            Self::H6 => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
}

impl Heading {
    pub fn new(level: HeadingLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Heading,
    pub paragraphs: Vec<String>,
}

/// An anchor found inside the main content, `href` already resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Heading { level: HeadingLevel, text: String },
    Paragraph { text: String },
    List { items: Vec<String> },
    Table { rows: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStats {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub avg_paragraph_length: usize,
    pub heading_count: usize,
    pub internal_links: usize,
    pub external_links: usize,
    /// Share of visible page text that survived main-content extraction
    pub content_ratio: f64,
}

impl Default for ContentStats {
    /// Stats of a page that was never measured. The content ratio sits at the
    /// neutral midpoint so it neither rewards nor punishes the page.
    fn default() -> Self {
        Self {
            word_count: 0,
            paragraph_count: 0,
            avg_paragraph_length: 0,
            heading_count: 0,
            internal_links: 0,
            external_links: 0,
            content_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceComponents {
    pub heading_blocks: usize,
    pub paragraph_blocks: usize,
    pub list_blocks: usize,
    pub table_blocks: usize,
    pub definition_blocks: usize,
}

impl SurfaceComponents {
    pub fn total(&self) -> usize {
        self.heading_blocks
            + self.paragraph_blocks
            + self.list_blocks
            + self.table_blocks
            + self.definition_blocks
    }

    /// Number of block kinds (heading, paragraph, list, table) present at all.
    pub fn structural_diversity(&self) -> usize {
        [
            self.heading_blocks,
            self.paragraph_blocks,
            self.list_blocks,
            self.table_blocks,
        ]
        .iter()
        .filter(|count| **count > 0)
        .count()
    }

    /// Lists or tables give an AI something it can enumerate.
    pub fn has_enumerable_content(&self) -> bool {
        self.list_blocks > 0 || self.table_blocks > 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSurfaceSize {
    pub score: usize,
    pub components: SurfaceComponents,
}

impl From<SurfaceComponents> for ContentSurfaceSize {
    fn from(components: SurfaceComponents) -> Self {
        Self {
            score: components.total(),
            components,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitySource {
    Nlp,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub paragraph_index: usize,
    pub source: EntitySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl ReadingLevel {
    pub fn from_flesch(score: f64) -> Self {
        if score >= 90.0 {
            Self::VeryEasy
        } else if score >= 80.0 {
            Self::Easy
        } else if score >= 70.0 {
            Self::FairlyEasy
        } else if score >= 60.0 {
            Self::Standard
        } else if score >= 50.0 {
            Self::FairlyDifficult
        } else if score >= 30.0 {
            Self::Difficult
        } else {
            Self::VeryDifficult
        }
    }
}

/// Readability statistics. `available == false` means every metric is null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub available: bool,
    pub flesch_reading_ease: Option<f64>,
    pub flesch_kincaid_grade: Option<f64>,
    pub gunning_fog: Option<f64>,
    pub smog_index: Option<f64>,
    pub automated_readability_index: Option<f64>,
    pub coleman_liau_index: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    pub avg_syllables_per_word: Option<f64>,
    pub difficult_words_percent: Option<f64>,
    pub reading_level: Option<ReadingLevel>,
    pub reading_time_minutes: Option<f64>,
}

impl ReadabilityMetrics {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaSource {
    JsonLd,
    Microdata,
    Rdfa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaItem {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub source: SchemaSource,
    pub data: serde_json::Value,
}

/// Schema.org markup found on the page and the structure points it earns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaOrgSummary {
    pub available: bool,
    pub schemas: Vec<SchemaItem>,
    pub types_found: Vec<String>,
    pub has_article: bool,
    pub has_faq: bool,
    pub has_howto: bool,
    pub has_qa: bool,
    pub has_organization: bool,
    pub has_person: bool,
    pub has_product: bool,
    pub has_breadcrumb: bool,
    /// 0..=15
    pub score_contribution: u32,
}

impl SchemaOrgSummary {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteType {
    Statistic,
    Definition,
    Fact,
    Citation,
}

impl QuoteType {
    /// Statistics and citations are the sentences answer engines lift verbatim.
    pub fn is_high_value(self) -> bool {
        matches!(self, Self::Statistic | Self::Citation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotableSentence {
    pub text: String,
    #[serde(rename = "type")]
    pub quote_type: QuoteType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_score_is_sum_of_components() {
        let components = SurfaceComponents {
            heading_blocks: 3,
            paragraph_blocks: 5,
            list_blocks: 2,
            table_blocks: 1,
            definition_blocks: 2,
        };
        let surface = ContentSurfaceSize::from(components);
        assert_eq!(surface.score, 13);
    }

    #[test]
    fn structural_diversity_counts_present_kinds() {
        let full = SurfaceComponents {
            heading_blocks: 3,
            paragraph_blocks: 5,
            list_blocks: 2,
            table_blocks: 1,
            definition_blocks: 0,
        };
        assert_eq!(full.structural_diversity(), 4);

        let partial = SurfaceComponents {
            heading_blocks: 3,
            paragraph_blocks: 5,
            ..Default::default()
        };
        assert_eq!(partial.structural_diversity(), 2);
        assert_eq!(SurfaceComponents::default().structural_diversity(), 0);
    }

    #[test]
    fn heading_levels_serialize_as_tag_names() {
        let heading = Heading::new(HeadingLevel::H2, "Overview");
        let json = serde_json::to_value(&heading).unwrap();
        assert_eq!(json["level"], "h2");
        assert_eq!(HeadingLevel::from_tag("h4"), Some(HeadingLevel::H4));
        assert_eq!(HeadingLevel::from_tag("p"), None);
    }

    #[test]
    fn unavailable_readability_serializes_nulls() {
        let json = serde_json::to_value(ReadabilityMetrics::unavailable()).unwrap();
        assert_eq!(json["available"], false);
        assert!(json["flesch_reading_ease"].is_null());
        assert!(json["reading_level"].is_null());
    }

    #[test]
    fn quotable_type_field_is_named_type() {
        let sentence = QuotableSentence {
            text: "Over 85% of teams use it".to_string(),
            quote_type: QuoteType::Statistic,
        };
        let json = serde_json::to_value(&sentence).unwrap();
        assert_eq!(json["type"], "statistic");
    }
}
