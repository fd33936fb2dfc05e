//! Grounded prompt construction and answer assembly.

use docqa_core::progress::{ProgressObserver, QueryStage};
use docqa_core::traits::Generator;
use docqa_core::types::{QueryResult, Source};
use docqa_core::Result;

use crate::retriever::RetrievedChunk;

pub const SNIPPET_CHARS: usize = 200;

/// `[Page n]: <text>` blocks in retrieval order, separated by a blank line.
pub fn build_context(retrieved: &[RetrievedChunk<'_>]) -> String {
    retrieved
        .iter()
        .map(|r| format!("[Page {}]: {}", r.page, r.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful AI assistant.\n\
         Answer the question based ONLY on the provided context.\n\
         If the context contains relevant information, summarize it to answer the question.\n\
         If the context is completely unrelated to the question, say \"Not found in the document\".\n\
         \n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer:"
    )
}

/// First 200 chars of `text`, with `...` appended only when cut.
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub struct AnswerComposer<'a> {
    generator: &'a dyn Generator,
}

impl<'a> AnswerComposer<'a> {
    pub fn new(generator: &'a dyn Generator) -> Self {
        Self { generator }
    }

    /// Generates an answer from exactly `retrieved`, in the given order.
    pub async fn compose(
        &self,
        question: &str,
        retrieved: &[RetrievedChunk<'_>],
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<QueryResult> {
        let prompt = build_prompt(&build_context(retrieved), question);
        if let Some(o) = observer { o.on_stage(QueryStage::Generating); }
        tracing::debug!(model = self.generator.model_id(), chunks = retrieved.len(), prompt_chars = prompt.len(), "generating answer");
        let answer = self.generator.generate(&prompt).await?.trim().to_string();
        let sources = retrieved.iter().map(|r| Source { page: r.page, snippet: snippet(&r.chunk.text) }).collect();
        Ok(QueryResult { answer, sources })
    }
}
