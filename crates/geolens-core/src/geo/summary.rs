//! Blockers, interpretation and the human-facing summary

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::metrics::{CitationLevel, ExtendedMetrics};
use super::scoring::{GeoScore, Grade};
use crate::access::AiAccessResult;
use crate::types::{HeadingLevel, ParsedContent, SurfaceComponents};

/// Structural gap that keeps an otherwise reachable page from being understood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocker {
    NoEnumeratableFacts,
    WeakNarrativeEntry,
    LowStructuralDiversity,
}

impl Blocker {
    pub fn as_str(self) -> &'static str {
        match self {
            Blocker::NoEnumeratableFacts => "no_enumeratable_facts",
            Blocker::WeakNarrativeEntry => "weak_narrative_entry",
            Blocker::LowStructuralDiversity => "low_structural_diversity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerSignals {
    pub signals: Vec<String>,
    pub triggered: bool,
}

impl BlockerSignals {
    fn new(signals: &[&str], triggered: bool) -> Self {
        Self {
            signals: signals.iter().map(|s| s.to_string()).collect(),
            triggered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerSignalMapping {
    pub no_enumeratable_facts: BlockerSignals,
    pub weak_narrative_entry: BlockerSignals,
    pub low_structural_diversity: BlockerSignals,
}

impl BlockerSignalMapping {
    pub fn compute(parsed: &ParsedContent) -> Self {
        let components = &parsed.content_surface_size.components;
        let has_h1_h2 = parsed
            .content
            .headings
            .iter()
            .any(|h| matches!(h.level, HeadingLevel::H1 | HeadingLevel::H2));

        Self {
            no_enumeratable_facts: BlockerSignals::new(
                &[
                    "ul_ol_count < threshold",
                    "table_count == 0",
                    "numeric_statements_ratio low",
                ],
                !components.has_enumerable_content(),
            ),
            weak_narrative_entry: BlockerSignals::new(
                &["no_h1_or_h2", "meta_description_empty"],
                !has_h1_h2 || parsed.meta.description.is_empty(),
            ),
            low_structural_diversity: BlockerSignals::new(
                &["structural_diversity <= 2"],
                components.structural_diversity() <= 2,
            ),
        }
    }

    /// Triggered blockers in fixed order.
    pub fn triggered(&self) -> Vec<Blocker> {
        [
            (Blocker::NoEnumeratableFacts, &self.no_enumeratable_facts),
            (Blocker::WeakNarrativeEntry, &self.weak_narrative_entry),
            (Blocker::LowStructuralDiversity, &self.low_structural_diversity),
        ]
        .into_iter()
        .filter(|(_, signals)| signals.triggered)
        .map(|(blocker, _)| blocker)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpretationType {
    #[serde(rename = "Reference-leaning")]
    ReferenceLeaning,
    #[serde(rename = "Mixed Usage")]
    MixedUsage,
    #[serde(rename = "Conceptual Summary-leaning")]
    ConceptualSummaryLeaning,
}

impl InterpretationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReferenceLeaning => "Reference-leaning",
            Self::MixedUsage => "Mixed Usage",
            Self::ConceptualSummaryLeaning => "Conceptual Summary-leaning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationSignals {
    pub reference: u32,
    pub conceptual: u32,
    pub structural_diversity: usize,
    pub enumeratable: bool,
}

/// Whether the page reads as reference material or as narrative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(rename = "type")]
    pub kind: InterpretationType,
    pub signals: InterpretationSignals,
}

pub fn interpret(
    components: &SurfaceComponents,
    avg_paragraph_length: usize,
    entity_count: usize,
) -> Interpretation {
    let diversity = components.structural_diversity();
    let enumeratable = components.has_enumerable_content();

    let reference = [
        enumeratable,
        components.table_blocks > 0,
        components.definition_blocks > 0,
        entity_count > 0 && components.definition_blocks > 0,
        diversity >= 3,
    ]
    .into_iter()
    .filter(|signal| *signal)
    .count() as u32;

    let conceptual = [
        components.paragraph_blocks >= 3,
        diversity <= 2,
        !enumeratable,
        avg_paragraph_length >= 40,
    ]
    .into_iter()
    .filter(|signal| *signal)
    .count() as u32;

    let kind = if reference >= 3 && conceptual <= 1 {
        InterpretationType::ReferenceLeaning
    } else if reference >= 2 {
        InterpretationType::MixedUsage
    } else {
        InterpretationType::ConceptualSummaryLeaning
    };

    Interpretation {
        kind,
        signals: InterpretationSignals {
            reference,
            conceptual,
            structural_diversity: diversity,
            enumeratable,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationRuleHints {
    pub reference_leaning: Vec<String>,
    pub conceptual_summary_leaning: Vec<String>,
}

impl Default for InterpretationRuleHints {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            reference_leaning: owned(&["faq_present", "lists_tables", "entity_explanations"]),
            conceptual_summary_leaning: owned(&["long_narrative", "low_diversity", "few_units"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFix {
    pub action: String,
    pub addresses_blockers: Vec<Blocker>,
}

pub fn structural_fixes(blockers: &[Blocker]) -> Vec<StructuralFix> {
    let mut fixes = Vec::new();
    if blockers.contains(&Blocker::NoEnumeratableFacts) {
        fixes.push(StructuralFix {
            action: "add_fact_list".to_string(),
            addresses_blockers: vec![
                Blocker::NoEnumeratableFacts,
                Blocker::LowStructuralDiversity,
            ],
        });
    }
    if blockers.contains(&Blocker::WeakNarrativeEntry) {
        fixes.push(StructuralFix {
            action: "add_h_framing".to_string(),
            addresses_blockers: vec![Blocker::WeakNarrativeEntry],
        });
    }
    fixes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKey {
    CrawlersBlocked,
    NoindexSet,
    NoSchema,
    WeakEntry,
    NoFacts,
    LowReadability,
    ThinContent,
    WeakOpening,
    UnclearPronouns,
    HasFaqSchema,
    HasArticleSchema,
    HasBreadcrumbSchema,
    GoodLists,
    GoodDefinitions,
    EntityRich,
    QuotableContent,
    QuotableDiversity,
    QaStructure,
    ComprehensiveContent,
    StrongOpening,
    ClearPronouns,
    HighCitationPotential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: IssueKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawlers: Option<Vec<String>>,
}

impl Issue {
    fn new(key: IssueKey) -> Self {
        Self {
            key,
            crawlers: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueBuckets {
    pub critical: Vec<Issue>,
    pub warning: Vec<Issue>,
    pub good: Vec<Issue>,
}

impl IssueBuckets {
    pub fn contains(&self, key: IssueKey) -> bool {
        self.critical
            .iter()
            .chain(&self.warning)
            .chain(&self.good)
            .any(|i| i.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixPriority {
    Critical,
    Recommended,
    Suggested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFix {
    pub priority: FixPriority,
    pub action: String,
    pub impact: Impact,
}

impl PriorityFix {
    fn new(priority: FixPriority, action: &str, impact: Impact) -> Self {
        Self {
            priority,
            action: action.to_string(),
            impact,
        }
    }
}

const MAX_PRIORITY_FIXES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary_key: String,
    pub issues: IssueBuckets,
    pub priority_fixes: Vec<PriorityFix>,
}

/// Sort the page's findings into critical, warning and good buckets and pick
/// the fixes worth doing first. Draft mode leaves out the crawler findings.
pub fn generate_summary(
    score: &GeoScore,
    blockers: &[Blocker],
    access: &AiAccessResult,
    parsed: &ParsedContent,
    metrics: &ExtendedMetrics,
    draft_mode: bool,
) -> Summary {
    let mut issues = IssueBuckets::default();
    let schema = &parsed.schema_org;
    let components = &parsed.content_surface_size.components;
    let word_count = parsed.stats.word_count;

    if !draft_mode {
        let blocked = access.blocked_crawlers();
        if !blocked.is_empty() {
            issues.critical.push(Issue {
                key: IssueKey::CrawlersBlocked,
                crawlers: Some(blocked.into_iter().map(str::to_string).collect()),
            });
        }
        if access.meta_robots.noindex {
            issues.critical.push(Issue::new(IssueKey::NoindexSet));
        }
    }

    if !schema.available || schema.types_found.is_empty() {
        issues.warning.push(Issue::new(IssueKey::NoSchema));
    }
    if blockers.contains(&Blocker::WeakNarrativeEntry) {
        issues.warning.push(Issue::new(IssueKey::WeakEntry));
    }
    if blockers.contains(&Blocker::NoEnumeratableFacts) {
        issues.warning.push(Issue::new(IssueKey::NoFacts));
    }
    if parsed.readability.available
        && parsed.readability.flesch_reading_ease.unwrap_or(100.0) < 40.0
    {
        issues.warning.push(Issue::new(IssueKey::LowReadability));
    }
    if word_count < 300 {
        issues.warning.push(Issue::new(IssueKey::ThinContent));
    }

    let mut good = |condition: bool, key: IssueKey| {
        if condition {
            issues.good.push(Issue::new(key));
        }
    };
    good(schema.has_faq, IssueKey::HasFaqSchema);
    good(schema.has_article, IssueKey::HasArticleSchema);
    good(schema.has_breadcrumb, IssueKey::HasBreadcrumbSchema);
    good(components.list_blocks >= 2, IssueKey::GoodLists);
    good(components.definition_blocks >= 2, IssueKey::GoodDefinitions);
    good(parsed.entities.len() >= 5, IssueKey::EntityRich);

    let quote_types: HashSet<_> = parsed
        .quotable_sentences
        .iter()
        .map(|q| q.quote_type)
        .collect();
    good(parsed.quotable_sentences.len() >= 2, IssueKey::QuotableContent);
    good(quote_types.len() >= 2, IssueKey::QuotableDiversity);
    good(metrics.qa_structure.has_qa_structure, IssueKey::QaStructure);
    good(word_count >= 1000, IssueKey::ComprehensiveContent);

    let first = &metrics.first_paragraph;
    if first.has_strong_opening {
        issues.good.push(Issue::new(IssueKey::StrongOpening));
    } else if first.first_paragraph_length < 30 {
        issues.warning.push(Issue::new(IssueKey::WeakOpening));
    }

    let pronouns = &metrics.pronoun_clarity;
    if pronouns.paragraphs_starting_with_pronoun >= 3 {
        issues.warning.push(Issue::new(IssueKey::UnclearPronouns));
    } else if pronouns.score >= 2 {
        issues.good.push(Issue::new(IssueKey::ClearPronouns));
    }

    if metrics.citation_potential.level == CitationLevel::High {
        issues.good.push(Issue::new(IssueKey::HighCitationPotential));
    }

    let summary_key = match score.grade {
        Grade::A => "summary_excellent",
        Grade::B => "summary_good",
        Grade::C => "summary_fair",
        Grade::D | Grade::F => "summary_poor",
    };

    Summary {
        summary_key: summary_key.to_string(),
        priority_fixes: priority_fixes(&issues),
        issues,
    }
}

/// Up to five fixes, critical findings first, then warnings in bucket order.
pub fn priority_fixes(issues: &IssueBuckets) -> Vec<PriorityFix> {
    use FixPriority::{Critical, Recommended, Suggested};

    let critical = issues.critical.iter().filter_map(|issue| match issue.key {
        IssueKey::CrawlersBlocked => Some(PriorityFix::new(
            Critical,
            "update_robots_txt",
            Impact::High,
        )),
        IssueKey::NoindexSet => Some(PriorityFix::new(Critical, "remove_noindex", Impact::High)),
        _ => None,
    });

    let warnings = issues.warning.iter().filter_map(|issue| match issue.key {
        IssueKey::NoSchema => Some(PriorityFix::new(Recommended, "add_schema", Impact::Medium)),
        IssueKey::WeakEntry => Some(PriorityFix::new(
            Recommended,
            "add_h_framing",
            Impact::Medium,
        )),
        IssueKey::NoFacts => Some(PriorityFix::new(
            Recommended,
            "add_fact_list",
            Impact::Medium,
        )),
        IssueKey::LowReadability => Some(PriorityFix::new(
            Suggested,
            "improve_readability",
            Impact::Low,
        )),
        IssueKey::ThinContent => Some(PriorityFix::new(
            Recommended,
            "expand_content",
            Impact::Medium,
        )),
        IssueKey::WeakOpening => Some(PriorityFix::new(
            Suggested,
            "improve_first_paragraph",
            Impact::Medium,
        )),
        IssueKey::UnclearPronouns => Some(PriorityFix::new(
            Suggested,
            "reduce_pronouns",
            Impact::Low,
        )),
        _ => None,
    });

    critical.chain(warnings).take(MAX_PRIORITY_FIXES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CrawlerVerdict;
    use crate::geo::scoring::calculate_geo_score;
    use crate::types::Heading;

    fn components(h: usize, p: usize, l: usize, t: usize, d: usize) -> SurfaceComponents {
        SurfaceComponents {
            heading_blocks: h,
            paragraph_blocks: p,
            list_blocks: l,
            table_blocks: t,
            definition_blocks: d,
        }
    }

    #[test]
    fn blockers_on_empty_page() {
        let mapping = BlockerSignalMapping::compute(&ParsedContent::default());
        assert_eq!(
            mapping.triggered(),
            vec![
                Blocker::NoEnumeratableFacts,
                Blocker::WeakNarrativeEntry,
                Blocker::LowStructuralDiversity
            ]
        );
    }

    #[test]
    fn weak_entry_needs_heading_and_description() {
        let mut parsed = ParsedContent::default();
        parsed.content.headings = vec![Heading::new(HeadingLevel::H2, "Intro")];
        parsed.meta.description = "Short description".to_string();
        parsed.content_surface_size.components = components(1, 3, 1, 0, 0);

        let mapping = BlockerSignalMapping::compute(&parsed);
        assert!(!mapping.weak_narrative_entry.triggered);
        assert!(!mapping.no_enumeratable_facts.triggered);
        assert!(!mapping.low_structural_diversity.triggered);
        assert!(mapping.triggered().is_empty());

        parsed.content.headings = vec![Heading::new(HeadingLevel::H3, "Intro")];
        assert!(BlockerSignalMapping::compute(&parsed).weak_narrative_entry.triggered);
    }

    #[test]
    fn interpretation_classes() {
        let reference = interpret(&components(4, 2, 2, 1, 1), 20, 3);
        assert_eq!(reference.kind, InterpretationType::ReferenceLeaning);
        assert_eq!(reference.signals.reference, 5);
        assert_eq!(reference.signals.conceptual, 0);

        let mixed = interpret(&components(2, 5, 1, 0, 1), 45, 0);
        assert_eq!(mixed.signals.reference, 3);
        assert_eq!(mixed.signals.conceptual, 2);
        assert_eq!(mixed.kind, InterpretationType::MixedUsage);

        let narrative = interpret(&components(0, 6, 0, 0, 0), 80, 0);
        assert_eq!(narrative.kind, InterpretationType::ConceptualSummaryLeaning);
        assert_eq!(narrative.signals.conceptual, 4);
    }

    #[test]
    fn structural_fixes_follow_blockers() {
        assert!(structural_fixes(&[Blocker::LowStructuralDiversity]).is_empty());
        let fixes = structural_fixes(&[Blocker::NoEnumeratableFacts, Blocker::WeakNarrativeEntry]);
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].action, "add_fact_list");
        assert_eq!(fixes[1].addresses_blockers, vec![Blocker::WeakNarrativeEntry]);
    }

    #[test]
    fn summary_for_blocked_thin_page() {
        let parsed = ParsedContent::default();
        let access = AiAccessResult {
            gptbot: CrawlerVerdict::Disallow,
            perplexitybot: CrawlerVerdict::Disallow,
            meta_robots: crate::access::MetaRobots::from_content("noindex"),
            ..Default::default()
        };
        let blockers = BlockerSignalMapping::compute(&parsed).triggered();
        let score = calculate_geo_score(&parsed, &access, &blockers);
        let metrics = ExtendedMetrics::compute(&parsed);

        let summary = generate_summary(&score, &blockers, &access, &parsed, &metrics, false);
        assert_eq!(summary.summary_key, "summary_poor");
        assert_eq!(
            summary.issues.critical[0].crawlers,
            Some(vec!["GPTBot".to_string(), "PerplexityBot".to_string()])
        );
        assert!(summary.issues.contains(IssueKey::NoindexSet));
        assert!(summary.issues.contains(IssueKey::ThinContent));
        assert!(summary.issues.contains(IssueKey::WeakOpening));
        assert!(summary.issues.contains(IssueKey::ClearPronouns));

        let actions: Vec<_> = summary.priority_fixes.iter().map(|f| f.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![
                "update_robots_txt",
                "remove_noindex",
                "add_schema",
                "add_h_framing",
                "add_fact_list"
            ]
        );

        let draft = generate_summary(&score, &blockers, &access, &parsed, &metrics, true);
        assert!(draft.issues.critical.is_empty());
        assert_eq!(draft.priority_fixes[0].action, "add_schema");
    }
}
