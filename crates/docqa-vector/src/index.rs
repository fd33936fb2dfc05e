//! Exhaustive squared-L2 index over a flat row-major `f32` buffer.
//!
//! Vector `i` is stored at `data[i * dimension..(i + 1) * dimension]` and is
//! the vector of chunk `i`. Vectors are only ever appended through an
//! [`IndexBuilder`], so a half-built index is never observable.

use std::cmp::Ordering;

use docqa_core::types::{ChunkId, SearchHit};
use docqa_core::{Error, Result};

/// Squared Euclidean distance. Lower is closer.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| { let d = x - y; d * d }).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Builds an index from vectors in chunk order.
    pub fn build<I, V>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut builder = IndexBuilder::new();
        for v in vectors { builder.push(v.as_ref())?; }
        Ok(builder.finish())
    }

    /// Reassembles an index from a decoded row-major buffer.
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 && !data.is_empty() {
            return Err(Error::CorruptState("vector data present with dimension 0".to_string()));
        }
        if dimension > 0 && data.len() % dimension != 0 {
            return Err(Error::CorruptState(format!(
                "vector buffer of {} floats is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> usize { self.dimension }

    pub fn len(&self) -> usize {
        if self.dimension == 0 { 0 } else { self.data.len() / self.dimension }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn vector(&self, id: ChunkId) -> Option<&[f32]> {
        if id >= self.len() { return None; }
        Some(&self.data[id * self.dimension..(id + 1) * self.dimension])
    }

    pub fn as_slice(&self) -> &[f32] { &self.data }

    /// The `min(k, len)` nearest vectors, ascending by distance, ties by id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Err(Error::IndexNotInitialized("index holds no vectors".to_string()));
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch { expected: self.dimension, actual: query.len() });
        }
        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, v)| SearchHit { id, distance: squared_l2(query, v) })
            .collect();
        let by_distance = |a: &SearchHit, b: &SearchHit| -> Ordering {
            a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id))
        };
        let k = k.min(hits.len());
        if k == 0 { return Ok(Vec::new()); }
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance);
            hits.truncate(k);
        }
        hits.sort_unstable_by(by_distance);
        Ok(hits)
    }
}

/// Staging area for a new index. The dimension is fixed by the first vector.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    dimension: Option<usize>,
    data: Vec<f32>,
    count: usize,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(vectors: usize, dimension: usize) -> Self {
        Self { dimension: None, data: Vec::with_capacity(vectors * dimension), count: 0 }
    }

    /// Appends the next vector and returns its id.
    pub fn push(&mut self, vector: &[f32]) -> Result<ChunkId> {
        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(Error::DimensionMismatch { expected, actual: vector.len() });
            }
            None if vector.is_empty() => {
                return Err(Error::embedding("received an empty embedding vector"));
            }
            None => self.dimension = Some(vector.len()),
            Some(_) => {}
        }
        self.data.extend_from_slice(vector);
        self.count += 1;
        Ok(self.count - 1)
    }

    pub fn len(&self) -> usize { self.count }

    pub fn is_empty(&self) -> bool { self.count == 0 }

    pub fn finish(self) -> FlatL2Index {
        FlatL2Index { dimension: self.dimension.unwrap_or(0), data: self.data }
    }
}
