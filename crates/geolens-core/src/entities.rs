//! Named-entity extraction with a CJK suffix-pattern fallback

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::capabilities::EntityRecognizer;
use crate::config::NlpSettings;
use crate::language::Language;
use crate::types::{Entity, EntitySource};

const MAX_PATTERN_ENTITIES: usize = 50;
const MAX_ENTITIES: usize = 100;

struct EntityPattern {
    label: &'static str,
    regex: Regex,
}

fn pattern(label: &'static str, re: &str) -> EntityPattern {
    EntityPattern {
        label,
        regex: Regex::new(re).expect("valid entity regex"),
    }
}

// Organisations, then places, then dates. Each group lists Chinese suffixes
// before Japanese ones.
static CJK_PATTERNS: Lazy<Vec<EntityPattern>> = Lazy::new(|| {
    vec![
        pattern(
            "ORG",
            r"[\x{4e00}-\x{9fff}]+(?:公司|集團|銀行|大學|學院|醫院|政府|委員會|協會|基金會|研究所|中心)",
        ),
        pattern("ORG", r"[\x{4e00}-\x{9fff}]+(?:会社|銀行|大学|研究所)"),
        pattern("GPE", r"[\x{4e00}-\x{9fff}]+(?:市|省|縣|區|國|州|島)"),
        pattern("GPE", r"[\x{4e00}-\x{9fff}]+(?:市|県|区|国)"),
        pattern("DATE", r"\d{4}年\d{1,2}月\d{1,2}日"),
        pattern("DATE", r"\d{4}年\d{1,2}月"),
        pattern("DATE", r"\d{4}年"),
        pattern("DATE", r"\d{1,2}月\d{1,2}日"),
    ]
});

/// Suffix-pattern entities in `text`, deduplicated by (text, label), at most 50.
pub fn extract_cjk_entities(text: &str) -> Vec<(String, &'static str)> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for entity_pattern in CJK_PATTERNS.iter() {
        for m in entity_pattern.regex.find_iter(text) {
            let key = (m.as_str().to_string(), entity_pattern.label);
            if seen.insert(key.clone()) {
                found.push(key);
            }
        }
    }

    found.truncate(MAX_PATTERN_ENTITIES);
    found
}

/// Entities for a page's paragraphs.
///
/// CJK pages use suffix patterns when the fallback is enabled. Other pages use
/// the recognizer when one is available, keeping only the configured labels;
/// a paragraph the recognizer fails on is skipped. Without a recognizer the
/// pattern pass runs whatever the language, as long as the fallback is enabled.
pub fn extract_entities(
    paragraphs: &[String],
    language: Language,
    recognizer: Option<&dyn EntityRecognizer>,
    nlp: &NlpSettings,
) -> Vec<Entity> {
    let use_patterns = nlp.enable_cjk_fallback && language.is_cjk();
    let mut entities = Vec::new();

    if let Some(recognizer) = recognizer.filter(|_| !use_patterns) {
        for (index, paragraph) in paragraphs.iter().enumerate() {
            match recognizer.recognize(paragraph) {
                Ok(found) => entities.extend(
                    found
                        .into_iter()
                        .filter(|e| nlp.keeps_label(&e.label))
                        .map(|e| Entity {
                            text: e.text,
                            label: e.label,
                            paragraph_index: index,
                            source: EntitySource::Nlp,
                        }),
                ),
                Err(err) => {
                    tracing::debug!(paragraph = index, error = %err, "entity recognizer failed; skipping paragraph");
                }
            }
        }
    }

    if use_patterns || (recognizer.is_none() && nlp.enable_cjk_fallback) {
        let joined = paragraphs.join(" ");
        for (text, label) in extract_cjk_entities(&joined) {
            let paragraph_index = paragraphs
                .iter()
                .position(|p| p.contains(text.as_str()))
                .unwrap_or(0);
            entities.push(Entity {
                text,
                label: label.to_string(),
                paragraph_index,
                source: EntitySource::Pattern,
            });
        }
    }

    dedupe(entities)
}

fn dedupe(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .filter(|e| seen.insert((e.text.clone(), e.label.clone())))
        .take(MAX_ENTITIES)
        .collect()
}
