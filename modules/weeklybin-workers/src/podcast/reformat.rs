//! LLM-assisted transcript reformatting (spec.md §4.10 step 4).

use weeklybin_llm::{ChatClient, ChatMessage, ChatOptions, ChatRequest};
use weeklybin_model::PodcastMetadata;

const MIN_LENGTH_FOR_REFORMAT: usize = 500;
const MAX_CHUNK_CHARS: usize = 15_000;
const TEMPERATURE: f32 = 0.3;

/// Chunks `text` at paragraph boundaries (falling back to sentence
/// boundaries when a single paragraph exceeds the cap) so each chunk stays
/// at or under [`MAX_CHUNK_CHARS`].
#[must_use]
pub fn chunk_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        if paragraph.len() > MAX_CHUNK_CHARS {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(chunk_by_sentence(paragraph));
            continue;
        }
        let candidate_len = current.len() + 2 + paragraph.len();
        if !current.is_empty() && candidate_len > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn chunk_by_sentence(paragraph: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in paragraph.split_inclusive(['.', '!', '?']) {
        if current.len() + sentence.len() > MAX_CHUNK_CHARS && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn prompt_for(metadata: &PodcastMetadata, chunk: &str) -> String {
    let brand_hints: Vec<&str> = metadata
        .show_notes
        .links
        .iter()
        .map(|l| l.text.as_str())
        .collect();

    format!(
        "You are cleaning up a raw podcast transcript excerpt for \"{title}\".\n\
         Combine the text into flowing paragraphs of 4-6 sentences each, remove \
         filler words (um, uh, you know, like), but preserve any sponsor reads \
         verbatim. Use these names as spelling hints where relevant: {hints}.\n\
         Return only the cleaned text, no commentary.\n\n---\n{chunk}",
        title = metadata.episode_title,
        hints = brand_hints.join(", "),
    )
}

/// Reformats `text` through the LLM, chunk by chunk. Skipped entirely when
/// `text` is short enough that reformatting wouldn't meaningfully help.
/// A chunk that errors falls back to its unchanged input rather than
/// failing the whole job.
pub async fn reformat(client: &ChatClient, model: &str, metadata: &PodcastMetadata, text: &str) -> String {
    if text.len() < MIN_LENGTH_FOR_REFORMAT {
        return text.to_string();
    }

    let mut out = Vec::new();
    for chunk in chunk_text(text) {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt_for(metadata, &chunk))],
            stream: false,
            options: Some(ChatOptions {
                temperature: Some(TEMPERATURE),
                num_predict: None,
            }),
        };
        match client.chat(&request).await {
            Ok(response) => {
                let reformatted = response.text();
                if reformatted.trim().is_empty() {
                    out.push(chunk);
                } else {
                    out.push(reformatted);
                }
            }
            Err(_) => out.push(chunk),
        }
    }

    out.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_respects_paragraph_boundaries() {
        let text = "para one.\n\npara two.\n\npara three.";
        let chunks = chunk_text(text);
        assert_eq!(chunks.join("\n\n"), text);
    }

    #[test]
    fn chunk_text_splits_oversized_paragraph_by_sentence() {
        let long_sentence = "word ".repeat(4000);
        let paragraph = format!("{long_sentence}. {long_sentence}.");
        let chunks = chunk_text(&paragraph);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_CHARS));
    }

    #[test]
    fn chunk_text_caps_each_chunk_length() {
        let paragraph = "x".repeat(100);
        let text = std::iter::repeat(paragraph).take(300).collect::<Vec<_>>().join("\n\n");
        let chunks = chunk_text(&text);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_CHARS));
    }
}
