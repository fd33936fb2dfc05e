#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docqa_answer::{Session, SessionOptions};
use docqa_core::traits::{Embedder, Generator};
use docqa_core::types::PageText;
use docqa_core::{Error, Result};
use docqa_embed::FakeEmbedder;
use docqa_vector::CollectionStore;

pub const DIM: usize = 64;

/// Fake embedder that counts calls and can be told to fail.
pub struct SwitchableEmbedder {
    inner: FakeEmbedder,
    pub calls: AtomicUsize,
    fail: AtomicBool,
}

impl SwitchableEmbedder {
    pub fn new(dim: usize) -> Arc<Self> {
        Arc::new(Self { inner: FakeEmbedder::new(dim), calls: AtomicUsize::new(0), fail: AtomicBool::new(false) })
    }

    pub fn set_failing(&self, on: bool) { self.fail.store(on, Ordering::SeqCst); }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl Embedder for SwitchableEmbedder {
    fn model_id(&self) -> &str { self.inner.model_id() }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("connection refused"));
        }
        self.inner.embed(text).await
    }
}

/// Records every prompt and answers with a fixed reply.
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    reply: String,
    fail: AtomicBool,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self { prompts: Mutex::new(Vec::new()), reply: reply.to_string(), fail: AtomicBool::new(false) })
    }

    pub fn set_failing(&self, on: bool) { self.fail.store(on, Ordering::SeqCst); }

    pub fn prompts(&self) -> Vec<String> { self.prompts.lock().unwrap().clone() }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn model_id(&self) -> &str { "recording" }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::generation("model 'llama3.2' not found"));
        }
        Ok(self.reply.clone())
    }
}

pub fn session(dir: &Path, embedder: Arc<SwitchableEmbedder>, generator: Arc<RecordingGenerator>) -> Session {
    Session::new(embedder, generator, CollectionStore::new(dir), SessionOptions::default()).expect("session")
}

/// `chars` chars of `words` repeated.
pub fn filler(words: &str, chars: usize) -> String {
    words.chars().cycle().take(chars).collect()
}

/// Three 400-char pages with unrelated vocabularies.
pub fn three_pages() -> Vec<PageText> {
    vec![
        PageText::new(1, filler("solar panel wiring and charge controller fuses ", 400)),
        PageText::new(2, filler("sourdough starter needs flour water and warmth ", 400)),
        PageText::new(3, filler("goat milking schedule twice daily in winter ", 400)),
    ]
}
