//! Order-preserving batch embedding with bounded concurrency.
//!
//! Up to `concurrency` requests are in flight at once, but results are
//! yielded in input order, so `vectors[i]` always belongs to `texts[i]`.

use futures::stream::{self, StreamExt};

use docqa_core::progress::{CancelFlag, ProgressObserver};
use docqa_core::traits::Embedder;
use docqa_core::{Error, Result};

const SNIPPET_CHARS: usize = 40;

pub struct BatchEmbedder<'a> {
    embedder: &'a dyn Embedder,
    concurrency: usize,
    observer: Option<&'a dyn ProgressObserver>,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> BatchEmbedder<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder, concurrency: 1, observer: None, cancel: None }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cancel_on(mut self, flag: &'a CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelFlag::is_cancelled)
    }

    /// Embeds every text, failing fast on the first provider error or on
    /// cancellation. Nothing is returned for a partially embedded batch.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let total = texts.len();
        let mut vectors = Vec::with_capacity(total);
        // Collected before streaming so the future can be handed to `tokio::spawn`.
        let requests: Vec<_> = texts
            .iter()
            .map(|text| async move {
                if self.is_cancelled() {
                    return Err(Error::Interrupted { completed: 0, total });
                }
                self.embedder.embed(text).await
            })
            .collect();
        let mut results = stream::iter(requests).buffered(self.concurrency);

        while let Some(result) = results.next().await {
            let vector = match result {
                Ok(vector) => vector,
                Err(Error::Interrupted { .. }) => {
                    return Err(Error::Interrupted { completed: vectors.len(), total })
                }
                Err(e) => return Err(e),
            };
            vectors.push(vector);
            let completed = vectors.len();
            tracing::debug!(completed, total, "embedded chunk");
            if let Some(observer) = self.observer {
                observer.on_progress(completed, total, &describe(completed, total, &texts[completed - 1]));
            }
            if completed < total && self.is_cancelled() {
                return Err(Error::Interrupted { completed, total });
            }
        }
        Ok(vectors)
    }
}

/// `Embedding 3/10: "first forty chars of the chunk..."`
pub fn describe(completed: usize, total: usize, text: &str) -> String {
    let snippet: String = text
        .chars()
        .take(SNIPPET_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("Embedding {}/{}: \"{}...\"", completed, total, snippet)
}
