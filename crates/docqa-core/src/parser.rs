//! Plain-text stand-in for the external document parser.
//!
//! Pages are separated by form feed (`\x0c`), which is what `pdftotext`
//! emits between pages. Invalid UTF-8 is decoded lossily rather than rejected.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::DocumentParser;
use crate::types::PageText;

pub const PAGE_SEPARATOR: char = '\x0c';

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    pub fn new() -> Self { Self }

    pub fn parse_path(&self, path: &Path) -> Result<Vec<PageText>> {
        let bytes = fs::read(path)
            .map_err(|e| Error::Ingest(format!("cannot read {}: {}", path.display(), e)))?;
        self.parse(&bytes)
    }
}

impl DocumentParser for PlainTextParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<PageText>> {
        let content = String::from_utf8_lossy(bytes);
        // pdftotext terminates the last page with a form feed too
        let content = content.strip_suffix(PAGE_SEPARATOR).unwrap_or(&content);
        if content.trim().is_empty() {
            return Err(Error::Ingest("document contains no extractable text".into()));
        }
        Ok(content
            .split(PAGE_SEPARATOR)
            .enumerate()
            .map(|(i, text)| PageText::new(i + 1, text))
            .collect())
    }
}
