//! Rendering answers for the terminal.

use std::fmt::Write as _;

use docqa_rag::{Answer, ScoredChunk};
use serde::Serialize;

const PREVIEW_CHARS: usize = 120;

/// Answer text followed by a numbered list of its sources.
pub fn render_answer(answer: &Answer, show_sources: bool) -> String {
    let mut out = answer.text.trim_end().to_string();
    out.push('\n');
    if show_sources && !answer.sources.is_empty() {
        out.push_str("\nSources:\n");
        for (i, source) in answer.sources.iter().enumerate() {
            out.push_str(&render_source(i + 1, source));
        }
    }
    out
}

fn render_source(rank: usize, source: &ScoredChunk) -> String {
    let mut line = String::new();
    let _ = writeln!(
        line,
        "  [{rank}] chunk {} (chars {}..{}, score {:.3}): {}",
        source.chunk.index,
        source.chunk.start,
        source.chunk.end,
        source.score,
        preview(&source.chunk.text)
    );
    line
}

/// Collapse whitespace and cut to a short single line.
pub fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

#[derive(Serialize)]
struct JsonAnswer<'a> {
    question: &'a str,
    #[serde(flatten)]
    answer: &'a Answer,
}

/// Pretty JSON with the question, answer text and scored sources.
pub fn render_json(question: &str, answer: &Answer) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonAnswer { question, answer })
}
