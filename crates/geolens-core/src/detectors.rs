//! Multilingual definition and quotable-sentence detection
//!
//! Patterns live in per-language tables so a new language is one more entry.
//! Coverage is deliberately literal: the Chinese table carries traditional
//! characters only (為 but not 为).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{QuotableSentence, QuoteType};

const MIN_QUOTABLE_CHARS: usize = 20;
const MAX_QUOTABLE_CHARS: usize = 200;
const MAX_QUOTABLE_SENTENCES: usize = 5;

enum Matcher {
    Substring(&'static str),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Substring(needle) => text.contains(needle),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }
}

struct PatternTable {
    language: &'static str,
    matchers: Vec<Matcher>,
}

fn substrings(needles: &[&'static str]) -> Vec<Matcher> {
    needles.iter().copied().map(Matcher::Substring).collect()
}

fn regex(pattern: &str) -> Matcher {
    Matcher::Pattern(Regex::new(pattern).expect("valid definition regex"))
}

static DEFINITION_TABLES: Lazy<Vec<PatternTable>> = Lazy::new(|| {
    vec![
        PatternTable {
            language: "zh",
            matchers: substrings(&[
                "是",
                "指的是",
                "可以理解為",
                "為",
                "意指",
                "定義為",
                "係指",
                " 是 ",
                " 為 ",
            ]),
        },
        PatternTable {
            language: "en",
            matchers: vec![
                regex(r"(?i)\bis\s+defined\s+as\b"),
                regex(r"(?i)\brefers\s+to\b"),
                regex(r"(?i)\bmeans\s+that\b"),
                regex(r"(?i)\bis\s+known\s+as\b"),
                regex(r"(?i)\bis\s+a\s+type\s+of\b"),
                regex(r"(?i)\bis\s+characterized\s+by\b"),
                regex(r"(?i)\bcan\s+be\s+described\s+as\b"),
                regex(r"(?i)\bis\s+the\s+process\s+of\b"),
                regex(r"(?i)\bis\s+when\b"),
                // "Term: Explanation". Case-sensitive: the colon must be
                // followed by an uppercase letter, so no (?i) here.
                regex(r":\s*[A-Z]"),
            ],
        },
        PatternTable {
            language: "ja",
            matchers: substrings(&["とは", "である", "を意味する", "と定義される", "のことを指す"]),
        },
        PatternTable {
            language: "ko",
            matchers: substrings(&["이란", "란", "를 의미", "을 뜻", "라고 정의"]),
        },
    ]
});

static SENTENCE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.。!?！？]+").expect("valid sentence regex"));

static STATISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+%|\d+\s*percent|統計|調查|研究顯示|according to")
        .expect("valid statistic regex")
});

static FACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(19|20)\d{2}\b|\b\d{1,3}(,\d{3})+\b").expect("valid fact regex")
});

static CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)according to|研究指出|專家表示|reported by").expect("valid citation regex")
});

/// True when `text` reads like a definition in any supported language.
pub fn is_definition(text: &str) -> bool {
    definition_language(text).is_some()
}

/// Code of the first pattern table (`zh`, `en`, `ja`, `ko`) that matches `text`.
pub fn definition_language(text: &str) -> Option<&'static str> {
    if text.is_empty() {
        return None;
    }
    DEFINITION_TABLES
        .iter()
        .find(|table| table.matchers.iter().any(|m| m.matches(text)))
        .map(|table| table.language)
}

/// Classify one sentence, first match wins: statistic, definition, fact, citation.
pub fn classify_sentence(sentence: &str) -> Option<QuoteType> {
    if STATISTIC.is_match(sentence) {
        Some(QuoteType::Statistic)
    } else if is_definition(sentence) {
        Some(QuoteType::Definition)
    } else if FACT.is_match(sentence) {
        Some(QuoteType::Fact)
    } else if CITATION.is_match(sentence) {
        Some(QuoteType::Citation)
    } else {
        None
    }
}

/// Up to five sentences an answer engine could lift verbatim.
pub fn detect_quotable_sentences(text: &str) -> Vec<QuotableSentence> {
    SENTENCE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_QUOTABLE_CHARS)
        .filter_map(|sentence| {
            classify_sentence(sentence).map(|quote_type| QuotableSentence {
                text: sentence.chars().take(MAX_QUOTABLE_CHARS).collect(),
                quote_type,
            })
        })
        .take(MAX_QUOTABLE_SENTENCES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_definitions() {
        assert!(is_definition("GEO is defined as optimizing for AI answers."));
        assert!(is_definition("The term REFERS TO a ranking signal."));
        assert!(is_definition("Crawling is the process of fetching pages."));
        assert!(is_definition("Canonical URL: The preferred address of a page."));
        assert!(!is_definition("We shipped a new release last week."));
        assert!(!is_definition(""));
    }

    #[test]
    fn colon_rule_needs_a_capital_letter() {
        assert!(!is_definition("note: lowercase continues here"));
        assert!(!is_definition("Status:   pending review by the team"));
        assert!(is_definition("status:   Pending review by the team"));
        assert!(is_definition("Crawl budget:The number of URLs fetched per day"));
    }

    #[test]
    fn chinese_japanese_korean_definitions() {
        assert_eq!(definition_language("生成式引擎優化是一種新的優化方法"), Some("zh"));
        assert_eq!(definition_language("GEOとは生成エンジン最適化のことです"), Some("ja"));
        assert_eq!(definition_language("생성형 엔진 최적화란 새로운 방법입니다"), Some("ko"));
    }

    #[test]
    fn simplified_wei_is_not_matched() {
        // 为 (simplified) is absent from the table; 為 (traditional) is present.
        assert!(!is_definition("他们称之为优化"));
        assert!(is_definition("他們稱之為優化"));
    }

    #[test]
    fn sentence_classification_priority() {
        assert_eq!(
            classify_sentence("About 45% of searches end without a click"),
            Some(QuoteType::Statistic)
        );
        assert_eq!(
            classify_sentence("According to the survey, adoption doubled"),
            Some(QuoteType::Statistic)
        );
        assert_eq!(
            classify_sentence("Schema markup refers to structured annotations"),
            Some(QuoteType::Definition)
        );
        assert_eq!(
            classify_sentence("The protocol was first published in 1994 by a working group"),
            Some(QuoteType::Fact)
        );
        assert_eq!(
            classify_sentence("The findings were reported by several newspapers"),
            Some(QuoteType::Citation)
        );
        assert_eq!(classify_sentence("Nothing notable happens in this line"), None);
    }

    #[test]
    fn short_fragments_are_skipped() {
        let found = detect_quotable_sentences("In 1999 it grew. Short 50%.");
        assert!(found.is_empty());
    }

    #[test]
    fn keeps_at_most_five_sentences() {
        let text = (0..8)
            .map(|i| format!("Sentence number {i} reports that 40% of users agree"))
            .collect::<Vec<_>>()
            .join(". ");
        let found = detect_quotable_sentences(&text);
        assert_eq!(found.len(), 5);
        assert!(found.iter().all(|q| q.quote_type == QuoteType::Statistic));
    }

    #[test]
    fn splits_on_cjk_punctuation_and_truncates() {
        let long = "x".repeat(300);
        let text = format!("研究顯示使用者偏好結構化的內容與清楚的答案。{long} was founded in 2001!");
        let found = detect_quotable_sentences(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].quote_type, QuoteType::Statistic);
        assert_eq!(found[1].quote_type, QuoteType::Fact);
        assert_eq!(found[1].text.chars().count(), 200);
    }
}
