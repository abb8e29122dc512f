//! SRT-to-plain-text cleanup for ASR output (spec.md §4.10).

use once_cell::sync::Lazy;
use regex::Regex;

static TIMESTAMP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}:\d{2}:\d{2}[,.:]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[,.:]\d{3}").unwrap()
});
static SEQUENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

const SENTENCE_BREAK_EVERY: usize = 5;

#[must_use]
pub fn looks_like_srt(text: &str) -> bool {
    text.lines().any(|line| TIMESTAMP_LINE.is_match(line.trim()))
}

/// Strips sequence numbers and timestamp cue lines, then reflows the
/// remaining dialogue into paragraphs with a soft break roughly every five
/// sentence-ending punctuation marks.
#[must_use]
pub fn clean_srt(text: &str) -> String {
    let mut words = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || SEQUENCE_LINE.is_match(trimmed) || TIMESTAMP_LINE.is_match(trimmed)
        {
            continue;
        }
        words.extend(trimmed.split_whitespace().map(str::to_string));
    }

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut sentence_ends = 0usize;

    for word in words {
        let ends_sentence = word.ends_with(['.', '!', '?']);
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
        if ends_sentence {
            sentence_ends += 1;
            if sentence_ends >= SENTENCE_BREAK_EVERY {
                paragraphs.push(std::mem::take(&mut current));
                sentence_ends = 0;
            }
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SRT: &str = "1\n00:00:00,000 --> 00:00:02,500\nHello there.\n\n2\n00:00:02,500 --> 00:00:05,000\nHow are you today?\n";

    #[test]
    fn detects_srt_format() {
        assert!(looks_like_srt(SAMPLE_SRT));
        assert!(!looks_like_srt("just plain transcript text"));
    }

    #[test]
    fn strips_sequence_numbers_and_timestamps() {
        let cleaned = clean_srt(SAMPLE_SRT);
        assert!(!cleaned.contains("-->"));
        assert!(!cleaned.contains("00:00:00"));
        assert!(cleaned.contains("Hello there."));
        assert!(cleaned.contains("How are you today?"));
    }

    #[test]
    fn breaks_paragraph_every_five_sentences() {
        let srt = (1..=12)
            .map(|i| format!("{i}\n00:00:0{}.000 --> 00:00:0{}.000\nSentence {i}.\n", i % 9, (i % 9) + 1))
            .collect::<Vec<_>>()
            .join("\n");
        let cleaned = clean_srt(&srt);
        let paragraphs: Vec<&str> = cleaned.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 3); // 5 + 5 + 2
    }
}
