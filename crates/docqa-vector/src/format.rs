//! On-disk layout of one persisted generation.
//!
//! ```text
//! <root>/CURRENT              "gen-000042\n"
//! <root>/gen-000042/chunks.json
//! <root>/gen-000042/metadata.json
//! <root>/gen-000042/vectors.bin
//! ```
//!
//! `vectors.bin` layout (little-endian):
//! `"DQVX" | u32 version | u64 generation | u32 dimension | u64 count |
//! count * dimension f32 | 32-byte blake3 digest of all preceding bytes`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docqa_core::types::{Chunk, ChunkMetadata};
use docqa_core::{Error, Result};

use crate::index::FlatL2Index;

pub const FORMAT_VERSION: u32 = 1;
pub const CHUNKS_FORMAT: &str = "docqa.chunks";
pub const METADATA_FORMAT: &str = "docqa.metadata";
pub const VECTORS_MAGIC: &[u8; 4] = b"DQVX";

pub const CURRENT_FILE: &str = "CURRENT";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const VECTORS_FILE: &str = "vectors.bin";

const HEADER_LEN: usize = 4 + 4 + 8 + 4 + 8;
const DIGEST_LEN: usize = 32;

pub fn generation_dir_name(generation: u64) -> String {
    format!("gen-{:06}", generation)
}

pub fn parse_generation_dir(name: &str) -> Option<u64> {
    let digits = name.strip_prefix("gen-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) { return None; }
    digits.parse().ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunksFile {
    pub format: String,
    pub version: u32,
    pub generation: u64,
    pub embed_model: String,
    pub created_at: DateTime<Utc>,
    pub count: usize,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFile {
    pub format: String,
    pub version: u32,
    pub generation: u64,
    pub count: usize,
    pub total_pages: usize,
    pub entries: Vec<ChunkMetadata>,
}

/// Checks the self-describing tag and version of a JSON artifact.
pub fn check_header(file: &str, format: &str, expected: &str, version: u32) -> Result<()> {
    if format != expected {
        return Err(Error::CorruptState(format!("{}: unknown format tag '{}'", file, format)));
    }
    if version != FORMAT_VERSION {
        return Err(Error::CorruptState(format!("{}: unsupported version {}", file, version)));
    }
    Ok(())
}

pub fn encode_vectors(generation: u64, index: &FlatL2Index) -> Result<Vec<u8>> {
    let dimension = u32::try_from(index.dimension())
        .map_err(|_| Error::InvalidInput(format!("dimension {} too large to persist", index.dimension())))?;
    let floats = index.as_slice();
    let mut out = Vec::with_capacity(HEADER_LEN + floats.len() * 4 + DIGEST_LEN);
    out.extend_from_slice(VECTORS_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&generation.to_le_bytes());
    out.extend_from_slice(&dimension.to_le_bytes());
    out.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for f in floats { out.extend_from_slice(&f.to_le_bytes()); }
    let digest = blake3::hash(&out);
    out.extend_from_slice(digest.as_bytes());
    Ok(out)
}

/// Decodes `vectors.bin`, returning its generation and the index.
pub fn decode_vectors(bytes: &[u8]) -> Result<(u64, FlatL2Index)> {
    let corrupt = |msg: String| Error::CorruptState(format!("{}: {}", VECTORS_FILE, msg));
    if bytes.len() < HEADER_LEN + DIGEST_LEN {
        return Err(corrupt(format!("truncated ({} bytes)", bytes.len())));
    }
    if &bytes[0..4] != VECTORS_MAGIC {
        return Err(corrupt("bad magic".to_string()));
    }
    let (body, stored) = bytes.split_at(bytes.len() - DIGEST_LEN);
    if blake3::hash(body).as_bytes() != stored {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    let version = u32::from_le_bytes(fixed(&body[4..8]));
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported version {}", version)));
    }
    let generation = u64::from_le_bytes(fixed(&body[8..16]));
    let dimension = u32::from_le_bytes(fixed(&body[16..20])) as usize;
    let count = usize::try_from(u64::from_le_bytes(fixed(&body[20..28])))
        .map_err(|_| corrupt("vector count out of range".to_string()))?;

    let payload = &body[HEADER_LEN..];
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt("vector count out of range".to_string()))?;
    if payload.len() != expected {
        return Err(corrupt(format!(
            "{} vectors of dimension {} need {} bytes, found {}",
            count, dimension, expected, payload.len()
        )));
    }
    let data: Vec<f32> = payload.chunks_exact(4).map(|b| f32::from_le_bytes(fixed(b))).collect();
    Ok((generation, FlatL2Index::from_raw(dimension, data)?))
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_dir_names_round_trip() {
        assert_eq!(generation_dir_name(42), "gen-000042");
        assert_eq!(parse_generation_dir("gen-000042"), Some(42));
        assert_eq!(parse_generation_dir("gen-"), None);
        assert_eq!(parse_generation_dir("gen-12a"), None);
        assert_eq!(parse_generation_dir("CURRENT"), None);
    }

    #[test]
    fn flipped_bit_fails_checksum() {
        let index = FlatL2Index::build(vec![vec![1.0f32, 2.0], vec![3.0, 4.0]]).unwrap();
        let mut bytes = encode_vectors(7, &index).unwrap();
        let (generation, decoded) = decode_vectors(&bytes).unwrap();
        assert_eq!(generation, 7);
        assert_eq!(decoded, index);

        bytes[HEADER_LEN] ^= 0x01;
        let err = decode_vectors(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum"), "{err}");
    }

    #[test]
    fn truncated_file_is_corrupt() {
        assert!(matches!(decode_vectors(b"DQVX"), Err(Error::CorruptState(_))));
    }
}
