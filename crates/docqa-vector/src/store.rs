//! Versioned, all-or-nothing persistence of a [`Collection`].
//!
//! A save writes a complete generation directory, fsyncs it, then publishes
//! it by replacing `CURRENT` (temp file + rename). A crash at any point leaves
//! either the old generation or the new one active, never a mix.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;

use docqa_core::config::DataSettings;
use docqa_core::{Error, Result};

use crate::collection::Collection;
use crate::format::{
    check_header, decode_vectors, encode_vectors, generation_dir_name, parse_generation_dir, ChunksFile,
    MetadataFile, CHUNKS_FILE, CHUNKS_FORMAT, CURRENT_FILE, FORMAT_VERSION, METADATA_FILE, METADATA_FORMAT,
    VECTORS_FILE,
};

const MAX_LOAD_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct CollectionStore {
    root: PathBuf,
}

impl CollectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_settings(settings: &DataSettings) -> Self {
        Self::new(settings.resolved_dir())
    }

    pub fn root(&self) -> &Path { &self.root }

    /// Whether a generation has been published. Says nothing about its integrity.
    pub fn exists(&self) -> bool {
        self.root.join(CURRENT_FILE).is_file()
    }

    /// The published generation number, if any.
    pub fn current_generation(&self) -> Result<Option<u64>> {
        let raw = match fs::read_to_string(self.root.join(CURRENT_FILE)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        parse_generation_dir(raw.trim())
            .map(Some)
            .ok_or_else(|| Error::CorruptState(format!("{} names no generation: '{}'", CURRENT_FILE, raw.trim())))
    }

    /// Persists the collection as a new generation and publishes it. Returns
    /// the generation number.
    pub fn save(&self, collection: &Collection) -> Result<u64> {
        fs::create_dir_all(&self.root)?;
        let generation = self.next_generation()?;
        let gen_name = generation_dir_name(generation);
        let gen_dir = self.root.join(&gen_name);
        if gen_dir.exists() {
            // leftover from an unpublished save
            fs::remove_dir_all(&gen_dir)?;
        }
        fs::create_dir_all(&gen_dir)?;

        let chunks = ChunksFile {
            format: CHUNKS_FORMAT.to_string(),
            version: FORMAT_VERSION,
            generation,
            embed_model: collection.embed_model().to_string(),
            created_at: Utc::now(),
            count: collection.len(),
            chunks: collection.chunks().to_vec(),
        };
        let metadata = MetadataFile {
            format: METADATA_FORMAT.to_string(),
            version: FORMAT_VERSION,
            generation,
            count: collection.len(),
            total_pages: collection.total_pages(),
            entries: collection.metadata().to_vec(),
        };
        write_synced(&gen_dir.join(CHUNKS_FILE), &to_json(&chunks)?)?;
        write_synced(&gen_dir.join(METADATA_FILE), &to_json(&metadata)?)?;
        write_synced(&gen_dir.join(VECTORS_FILE), &encode_vectors(generation, collection.index())?)?;
        sync_dir(&gen_dir)?;

        let tmp = self.root.join(format!("{}.tmp", CURRENT_FILE));
        write_synced(&tmp, format!("{}\n", gen_name).as_bytes())?;
        fs::rename(&tmp, self.root.join(CURRENT_FILE))?;
        sync_dir(&self.root)?;

        tracing::info!(
            generation,
            chunks = collection.len(),
            dimension = collection.dimension(),
            dir = %gen_dir.display(),
            "published collection"
        );
        self.remove_stale_generations(generation);
        Ok(generation)
    }

    /// Loads the published generation. `IndexNotInitialized` when nothing is
    /// published or an artifact is missing; `CorruptState` when the artifacts
    /// disagree with each other.
    ///
    /// A concurrent save may publish a newer generation and prune the one
    /// being read; the load then follows `CURRENT` to the newer one.
    pub fn load(&self) -> Result<Collection> {
        let mut attempts = 0;
        loop {
            let generation = self.current_generation()?.ok_or_else(|| {
                Error::IndexNotInitialized(format!("no persisted collection in {}", self.root.display()))
            })?;
            match self.load_generation(generation) {
                Ok(collection) => return Ok(collection),
                Err(e) => {
                    attempts += 1;
                    let republished = self.current_generation()?.is_some_and(|g| g != generation);
                    if !republished || attempts >= MAX_LOAD_ATTEMPTS {
                        return Err(e);
                    }
                    tracing::debug!(generation, error = %e, "generation replaced during load, retrying");
                }
            }
        }
    }

    fn load_generation(&self, generation: u64) -> Result<Collection> {
        let gen_dir = self.root.join(generation_dir_name(generation));

        let chunks: ChunksFile = read_json(&gen_dir, CHUNKS_FILE)?;
        check_header(CHUNKS_FILE, &chunks.format, CHUNKS_FORMAT, chunks.version)?;
        let metadata: MetadataFile = read_json(&gen_dir, METADATA_FILE)?;
        check_header(METADATA_FILE, &metadata.format, METADATA_FORMAT, metadata.version)?;
        let (vector_generation, index) = decode_vectors(&read_artifact(&gen_dir, VECTORS_FILE)?)?;

        for (file, found) in [
            (CHUNKS_FILE, chunks.generation),
            (METADATA_FILE, metadata.generation),
            (VECTORS_FILE, vector_generation),
        ] {
            if found != generation {
                return Err(Error::CorruptState(format!(
                    "{} belongs to generation {}, expected {}",
                    file, found, generation
                )));
            }
        }
        if chunks.count != chunks.chunks.len() || metadata.count != metadata.entries.len() {
            return Err(Error::CorruptState(format!(
                "declared counts ({} chunks, {} entries) disagree with stored records ({}, {})",
                chunks.count,
                metadata.count,
                chunks.chunks.len(),
                metadata.entries.len()
            )));
        }

        let collection =
            Collection::new(chunks.chunks, metadata.entries, index, chunks.embed_model, metadata.total_pages)?;
        tracing::info!(
            generation,
            chunks = collection.len(),
            dimension = collection.dimension(),
            embed_model = collection.embed_model(),
            created_at = %chunks.created_at,
            "loaded collection"
        );
        Ok(collection)
    }

    fn next_generation(&self) -> Result<u64> {
        let mut highest = self.current_generation()?.unwrap_or(0);
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(g) = entry.file_name().to_str().and_then(parse_generation_dir) {
                highest = highest.max(g);
            }
        }
        Ok(highest + 1)
    }

    fn remove_stale_generations(&self, keep: u64) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list store directory for cleanup");
                return;
            }
        };
        for entry in entries.flatten() {
            let Some(g) = entry.file_name().to_str().and_then(parse_generation_dir) else { continue };
            if g == keep { continue; }
            if let Err(e) = fs::remove_dir_all(entry.path()) {
                tracing::warn!(generation = g, error = %e, "failed to remove stale generation");
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| Error::InvalidInput(format!("cannot serialize collection: {}", e)))
}

fn read_artifact(dir: &Path, file: &str) -> Result<Vec<u8>> {
    match fs::read(dir.join(file)) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::IndexNotInitialized(format!(
            "persisted collection is missing {}",
            file
        ))),
        Err(e) => Err(e.into()),
    }
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let bytes = read_artifact(dir, file)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::CorruptState(format!("{}: {}", file, e)))
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
