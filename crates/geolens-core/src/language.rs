//! Dominant-language detection from Unicode code-point ranges

use serde::{Deserialize, Serialize};

const SAMPLE_CHARS: usize = 1000;
const CJK_RATIO_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
    Ja,
    Ko,
    /// Reserved for mixed-script pages. The detector currently resolves every
    /// sample to a single language.
    Mixed,
}

impl Language {
    pub fn is_cjk(self) -> bool {
        matches!(self, Self::Zh | Self::Ja | Self::Ko)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Mixed => "mixed",
        }
    }
}

/// Classify the first 1000 characters of `text`.
///
/// Any kana means Japanese and any Hangul syllable means Korean, whichever is
/// seen first. Otherwise CJK ideographs above 30% of ideographs plus ASCII
/// letters means Chinese. Everything else, including empty input, is English.
pub fn detect_language(text: &str) -> Language {
    let mut cjk = 0usize;
    let mut latin = 0usize;

    for ch in text.chars().take(SAMPLE_CHARS) {
        match ch as u32 {
            0x4E00..=0x9FFF => cjk += 1,
            0x3040..=0x30FF => return Language::Ja,
            0xAC00..=0xD7AF => return Language::Ko,
            _ if ch.is_ascii_alphabetic() => latin += 1,
            _ => {}
        }
    }

    let total = cjk + latin;
    if total == 0 {
        return Language::En;
    }

    if cjk as f64 / total as f64 > CJK_RATIO_THRESHOLD {
        Language::Zh
    } else {
        Language::En
    }
}
