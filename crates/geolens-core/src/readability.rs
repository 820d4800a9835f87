//! Built-in readability statistics
//!
//! Classic English readability formulas over paragraph text. Syllables are
//! estimated from vowel groups, so scores for non-English text are only
//! indicative.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{ReadabilityMetrics, ReadingLevel};

/// Shorter text yields the unavailable bundle.
pub const MIN_TEXT_CHARS: usize = 100;

const WORDS_PER_MINUTE: f64 = 200.0;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct TextCounts {
    sentences: usize,
    words: usize,
    syllables: usize,
    polysyllables: usize,
    characters: usize,
}

impl TextCounts {
    fn measure(text: &str) -> Self {
        let mut counts = TextCounts {
            sentences: count_sentences(text),
            ..Default::default()
        };

        for word in text.unicode_words() {
            let syllables = count_syllables(word);
            counts.words += 1;
            counts.syllables += syllables;
            if syllables >= 3 {
                counts.polysyllables += 1;
            }
            counts.characters += word.chars().filter(|c| c.is_alphanumeric()).count();
        }

        counts
    }

    fn words_per_sentence(&self) -> f64 {
        self.words as f64 / self.sentences.max(1) as f64
    }

    fn syllables_per_word(&self) -> f64 {
        self.syllables as f64 / self.words.max(1) as f64
    }

    fn characters_per_word(&self) -> f64 {
        self.characters as f64 / self.words.max(1) as f64
    }
}

/// Readability metrics for `text`, or [`ReadabilityMetrics::unavailable`] when
/// the capability is off or the text is too short to measure.
pub fn compute_readability(text: &str, enabled: bool) -> ReadabilityMetrics {
    if !enabled || text.chars().count() < MIN_TEXT_CHARS {
        return ReadabilityMetrics::unavailable();
    }

    let counts = TextCounts::measure(text);
    if counts.words == 0 {
        return ReadabilityMetrics::unavailable();
    }

    let wps = counts.words_per_sentence();
    let spw = counts.syllables_per_word();
    let words = counts.words as f64;
    let sentences = counts.sentences.max(1) as f64;

    let flesch = 206.835 - 1.015 * wps - 84.6 * spw;
    let fk_grade = 0.39 * wps + 11.8 * spw - 15.59;
    let fog = 0.4 * (wps + 100.0 * counts.polysyllables as f64 / words);
    let smog = if counts.sentences >= 3 {
        1.043 * (counts.polysyllables as f64 * 30.0 / sentences).sqrt() + 3.1291
    } else {
        0.0
    };
    let ari = 4.71 * counts.characters_per_word() + 0.5 * wps - 21.43;
    let letters_per_100 = counts.characters as f64 / words * 100.0;
    let sentences_per_100 = sentences / words * 100.0;
    let coleman_liau = 0.0588 * letters_per_100 - 0.296 * sentences_per_100 - 15.8;
    let difficult_percent = counts.polysyllables as f64 / words * 100.0;

    ReadabilityMetrics {
        available: true,
        flesch_reading_ease: Some(round_to(flesch, 1)),
        flesch_kincaid_grade: Some(round_to(fk_grade, 1)),
        gunning_fog: Some(round_to(fog, 1)),
        smog_index: Some(round_to(smog, 1)),
        automated_readability_index: Some(round_to(ari, 1)),
        coleman_liau_index: Some(round_to(coleman_liau, 1)),
        avg_sentence_length: Some(round_to(wps, 1)),
        avg_syllables_per_word: Some(round_to(spw, 2)),
        difficult_words_percent: Some(round_to(difficult_percent, 1)),
        reading_level: Some(ReadingLevel::from_flesch(flesch)),
        reading_time_minutes: Some(round_to(words / WORDS_PER_MINUTE, 1)),
    }
}

fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?', '。', '！', '？'])
        .filter(|s| s.unicode_words().next().is_some())
        .count()
        .max(1)
}

/// Vowel-group syllable estimate with a silent trailing `e`; never below one.
fn count_syllables(word: &str) -> usize {
    const VOWELS: [char; 6] = ['a', 'e', 'i', 'o', 'u', 'y'];

    let lower = word.to_lowercase();
    let mut count = 0;
    let mut previous_was_vowel = false;

    for ch in lower.chars() {
        let is_vowel = VOWELS.contains(&ch);
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }

    if lower.ends_with('e') && count > 1 {
        count -= 1;
    }

    count.max(1)
}

/// Round half to even at `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
