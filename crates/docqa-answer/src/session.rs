//! The question-answering session: owns the active [`Collection`] and runs
//! ingest and ask against it.
//!
//! Asks hold a shared read lock for the whole embed/search/compose round
//! trip. An ingest embeds and persists outside the lock and only takes the
//! write lock to swap in the finished collection, so readers see either the
//! old collection or the new one. Ingests are serialised by a gate, which
//! cold loads also take so they never read a generation being replaced.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

use docqa_core::chunker::{Chunker, ChunkingConfig};
use docqa_core::config::Settings;
use docqa_core::parser::PlainTextParser;
use docqa_core::progress::{CancelFlag, ProgressObserver, QueryStage};
use docqa_core::traits::{DocumentParser, Embedder, Generator};
use docqa_core::types::{IngestReport, PageText, QueryResult};
use docqa_core::{Error, Result};
use docqa_embed::{get_default_embedder, BatchEmbedder};
use docqa_vector::{Collection, CollectionStore, IndexBuilder};

use crate::composer::AnswerComposer;
use crate::generator::OllamaGenerator;
use crate::retriever::Retriever;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub embed_concurrency: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { chunking: ChunkingConfig::default(), top_k: 3, embed_concurrency: 1 }
    }
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            chunking: settings.chunking,
            top_k: settings.retrieval.top_k,
            embed_concurrency: settings.retrieval.embed_concurrency,
        }
    }
}

pub struct Session {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    parser: Arc<dyn DocumentParser>,
    store: CollectionStore,
    chunker: Chunker,
    options: SessionOptions,
    active: RwLock<Option<Arc<Collection>>>,
    ingest_gate: Mutex<()>,
}

impl Session {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: CollectionStore,
        options: SessionOptions,
    ) -> Result<Self> {
        if options.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        Ok(Self {
            embedder,
            generator,
            parser: Arc::new(PlainTextParser::new()),
            store,
            chunker: Chunker::new(options.chunking)?,
            options,
            active: RwLock::new(None),
            ingest_gate: Mutex::new(()),
        })
    }

    /// Wires the Ollama providers (or the fake embedder) and the data
    /// directory from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let embedder = get_default_embedder(&settings.ollama)?;
        let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::from_settings(&settings.ollama)?);
        Self::new(embedder, generator, CollectionStore::from_settings(&settings.data), SessionOptions::from_settings(settings))
    }

    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn store(&self) -> &CollectionStore { &self.store }

    pub fn options(&self) -> &SessionOptions { &self.options }

    pub fn embed_model(&self) -> &str { self.embedder.model_id() }

    pub fn llm_model(&self) -> &str { self.generator.model_id() }

    /// The collection currently answering questions, if any.
    pub async fn collection(&self) -> Option<Arc<Collection>> {
        self.active.read().await.clone()
    }

    /// Loads the persisted collection, replacing whatever is active.
    pub async fn load(&self) -> Result<Arc<Collection>> {
        // an ingest in flight may be publishing and pruning generations
        let _gate = self.ingest_gate.lock().await;
        let mut active = self.active.write().await;
        let collection = Arc::new(self.store.load()?);
        self.check_model(&collection);
        *active = Some(Arc::clone(&collection));
        Ok(collection)
    }

    /// Returns the active collection, loading it from disk on first use.
    pub async fn ensure_loaded(&self) -> Result<Arc<Collection>> {
        if let Some(c) = self.active.read().await.as_ref() {
            return Ok(Arc::clone(c));
        }
        let _gate = self.ingest_gate.lock().await;
        let mut active = self.active.write().await;
        if let Some(c) = active.as_ref() {
            return Ok(Arc::clone(c));
        }
        let collection = Arc::new(self.store.load()?);
        self.check_model(&collection);
        *active = Some(Arc::clone(&collection));
        Ok(collection)
    }

    /// Read guard over the active collection, loading it on first use.
    async fn read_active(&self) -> Result<RwLockReadGuard<'_, Arc<Collection>>> {
        loop {
            match RwLockReadGuard::try_map(self.active.read().await, Option::as_ref) {
                Ok(collection) => return Ok(collection),
                Err(empty) => drop(empty),
            }
            self.ensure_loaded().await?;
        }
    }

    fn check_model(&self, collection: &Collection) {
        if collection.embed_model() != self.embedder.model_id() {
            tracing::warn!(
                stored = collection.embed_model(),
                active = self.embedder.model_id(),
                "collection was embedded with a different model; re-ingest for reliable answers"
            );
        }
    }

    pub async fn ingest_path(
        &self,
        path: &Path,
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelFlag>,
    ) -> Result<IngestReport> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Ingest(format!("cannot read {}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "ingesting document");
        self.ingest_bytes(&bytes, observer, cancel).await
    }

    pub async fn ingest_bytes(
        &self,
        bytes: &[u8],
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelFlag>,
    ) -> Result<IngestReport> {
        let pages = self.parser.parse(bytes)?;
        self.ingest_pages(&pages, observer, cancel).await
    }

    /// Chunks, embeds, indexes and persists `pages` as the new collection.
    /// On any failure the previous collection stays active, in memory and on
    /// disk.
    pub async fn ingest_pages(
        &self,
        pages: &[PageText],
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelFlag>,
    ) -> Result<IngestReport> {
        let _gate = self.ingest_gate.lock().await;

        let (chunks, metadata) = self.chunker.chunk(pages);
        if chunks.is_empty() {
            return Err(Error::Ingest("document contains no extractable text".into()));
        }
        tracing::info!(pages = pages.len(), chunks = chunks.len(), model = self.embedder.model_id(), "embedding chunks");

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut batch = BatchEmbedder::new(self.embedder.as_ref()).concurrency(self.options.embed_concurrency);
        if let Some(o) = observer { batch = batch.observer(o); }
        if let Some(c) = cancel { batch = batch.cancel_on(c); }
        let vectors = batch.embed_all(&texts).await?;

        let mut builder = IndexBuilder::with_capacity(vectors.len(), vectors.first().map_or(0, Vec::len));
        for v in &vectors { builder.push(v)?; }
        let collection = Collection::new(chunks, metadata, builder.finish(), self.embedder.model_id(), pages.len())?;
        let generation = self.store.save(&collection)?;

        let report = IngestReport { pages: pages.len(), chunks: collection.len(), dimension: collection.dimension() };
        *self.active.write().await = Some(Arc::new(collection));
        tracing::info!(generation, chunks = report.chunks, dimension = report.dimension, "ingest complete");
        Ok(report)
    }

    pub async fn ask(&self, question: &str) -> Result<QueryResult> {
        self.ask_with(question, self.options.top_k, None).await
    }

    /// Answers from the `top_k` nearest chunks of the active collection.
    pub async fn ask_with(
        &self,
        question: &str,
        top_k: usize,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<QueryResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question is empty".into()));
        }
        if top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".into()));
        }
        if let Some(o) = observer { o.on_stage(QueryStage::Analyzing); }

        let collection = self.read_active().await?;
        let retrieved = Retriever::new(&collection, self.embedder.as_ref()).retrieve(question, top_k, observer).await?;
        AnswerComposer::new(self.generator.as_ref()).compose(question, &retrieved, observer).await
    }
}
