//! Prompt assembly for grounded question answering.

use crate::document::ScoredChunk;

const DEFAULT_INSTRUCTIONS: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know; don't try to make up an answer.";

/// Renders retrieved chunks and a question into a single prompt.
///
/// The layout keeps context and question in separately labeled sections:
///
/// ```text
/// <instructions>
///
/// ### Context
/// [1] <highest-ranked chunk>
///
/// [2] <next chunk>
///
/// ### Question
/// <question>
///
/// ### Answer
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    instructions: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { instructions: DEFAULT_INSTRUCTIONS.to_string() }
    }
}

impl PromptTemplate {
    /// Create the default template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the instruction preamble.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// The instruction preamble.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Render the prompt; `sources` are emitted in the order given.
    pub fn render(&self, question: &str, sources: &[ScoredChunk]) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.instructions.trim_end());
        prompt.push_str("\n\n### Context\n");
        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                prompt.push('\n');
            }
            prompt.push_str(&format!("[{}] {}\n", i + 1, source.chunk.text.trim()));
        }

        prompt.push_str("\n### Question\n");
        prompt.push_str(question.trim());
        prompt.push_str("\n\n### Answer\n");

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn scored(index: usize, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk { index, text: text.into(), start: 0, end: text.chars().count() },
            score: 1.0,
        }
    }

    #[test]
    fn renders_sections_in_order() {
        let prompt = PromptTemplate::new()
            .with_instructions("Answer briefly.")
            .render("What is an inlier?", &[scored(3, "first"), scored(0, "second")]);

        assert_eq!(
            prompt,
            "Answer briefly.\n\n### Context\n[1] first\n\n[2] second\n\n### Question\nWhat is an inlier?\n\n### Answer\n"
        );
    }
}
