use std::fs;
use std::sync::mpsc;
use tempfile::TempDir;

use docqa_core::chunker::{estimate_page, Chunker, ChunkingConfig};
use docqa_core::config::{Config, Settings};
use docqa_core::parser::PlainTextParser;
use docqa_core::progress::{CancelFlag, ChannelObserver, ProgressEvent, ProgressObserver, QueryStage};
use docqa_core::traits::DocumentParser;
use docqa_core::types::PageText;
use docqa_core::Error;

fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
    Chunker::new(ChunkingConfig { chunk_size, overlap }).expect("valid chunking config")
}

fn sample_text(len: usize) -> String {
    // Mixed ASCII and multi-byte chars so offsets are exercised in chars, not bytes
    let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyzé ñ".chars().collect();
    (0..len).map(|i| alphabet[i % alphabet.len()]).collect()
}

#[test]
fn chunk_count_and_windows_follow_stride() {
    let chunker = chunker(500, 100);
    for len in [1usize, 399, 400, 401, 500, 1200, 1999, 4321] {
        let text = sample_text(len);
        let chars: Vec<char> = text.chars().collect();
        let (chunks, metadata) = chunker.chunk(&[PageText::new(1, text.clone())]);

        assert_eq!(chunks.len(), len.div_ceil(400), "len={len}");
        assert_eq!(metadata.len(), chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let start = 400 * i;
            let end = (start + 500).min(len);
            let expected: String = chars[start..end].iter().collect();
            assert_eq!(chunk.id, i);
            assert_eq!(chunk.start_offset, start);
            assert_eq!(chunk.text, expected, "window {i} for len={len}");
        }
    }
}

#[test]
fn estimated_pages_stay_in_range() {
    let chunker = chunker(120, 30);
    let pages: Vec<PageText> = (1..=7)
        .map(|n| PageText::new(n, sample_text(n * 37)))
        .collect();
    let (_, metadata) = chunker.chunk(&pages);
    assert!(!metadata.is_empty());
    for m in &metadata {
        assert!((1..=7).contains(&m.estimated_page), "page {} out of range", m.estimated_page);
    }
}

#[test]
fn three_page_document_maps_to_three_pages() {
    let chunker = chunker(500, 100);
    let pages = vec![
        PageText::new(1, "a".repeat(400)),
        PageText::new(2, "b".repeat(400)),
        PageText::new(3, "c".repeat(400)),
    ];
    let (chunks, metadata) = chunker.chunk(&pages);

    let offsets: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
    assert_eq!(offsets, vec![0, 400, 800]);
    let estimated: Vec<usize> = metadata.iter().map(|m| m.estimated_page).collect();
    assert_eq!(estimated, vec![1, 2, 3]);
    assert_eq!(chunks[2].text.len(), 400, "last window is clamped at the end");
}

#[test]
fn empty_document_yields_no_chunks() {
    let chunker = chunker(500, 100);
    let (chunks, metadata) = chunker.chunk(&[]);
    assert!(chunks.is_empty() && metadata.is_empty());

    let (chunks, metadata) = chunker.chunk(&[PageText::new(1, ""), PageText::new(2, "")]);
    assert!(chunks.is_empty() && metadata.is_empty());
}

#[test]
fn short_single_page_is_one_chunk() {
    let (chunks, metadata) = chunker(500, 100).chunk(&[PageText::new(1, "Short text")]);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Short text");
    assert_eq!(metadata[0].estimated_page, 1);
}

#[test]
fn rechunking_is_deterministic() {
    let chunker = chunker(64, 16);
    let pages = vec![PageText::new(1, sample_text(300)), PageText::new(2, sample_text(150))];
    assert_eq!(chunker.chunk(&pages), chunker.chunk(&pages));
}

#[test]
fn non_positive_stride_is_rejected() {
    for (size, overlap) in [(100, 100), (100, 150), (0, 0)] {
        let err = Chunker::new(ChunkingConfig { chunk_size: size, overlap }).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "size={size} overlap={overlap}");
    }
}

#[test]
fn page_estimate_clamps_to_last_page() {
    assert_eq!(estimate_page(0, 400, 3), 1);
    assert_eq!(estimate_page(1199, 400, 3), 3);
    assert_eq!(estimate_page(5000, 400, 3), 3);
    // avg of zero is treated as one char per page
    assert_eq!(estimate_page(1, 0, 5), 2);
}

#[test]
fn parser_splits_pages_on_form_feed() {
    let pages = PlainTextParser::new().parse(b"first page\x0csecond page\x0cthird\x0c").expect("parse");
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0], PageText::new(1, "first page"));
    assert_eq!(pages[2], PageText::new(3, "third"));
}

#[test]
fn parser_rejects_empty_and_unreadable_documents() {
    let err = PlainTextParser::new().parse(b"  \n\x0c \t ").unwrap_err();
    assert!(matches!(err, Error::Ingest(_)));

    let tmp = TempDir::new().unwrap();
    let err = PlainTextParser::new().parse_path(&tmp.path().join("missing.txt")).unwrap_err();
    assert!(matches!(err, Error::Ingest(_)));
}

#[test]
fn parser_reads_files_with_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.txt");
    fs::write(&path, [b'o', b'k', 0xff, b'!']).unwrap();
    let pages = PlainTextParser::new().parse_path(&path).expect("lossy parse");
    assert_eq!(pages.len(), 1);
    assert!(pages[0].text.starts_with("ok"));
}

#[test]
fn observers_receive_progress_and_stages() {
    let (tx, rx) = mpsc::channel();
    let observer = ChannelObserver::new(tx);
    observer.on_stage(QueryStage::Searching);
    observer.on_progress(1, 2, "Embedding 1/2");
    let events: Vec<ProgressEvent> = rx.try_iter().collect();
    assert_eq!(events[0], ProgressEvent::Stage(QueryStage::Searching));
    assert_eq!(
        events[1],
        ProgressEvent::Progress { completed: 1, total: 2, description: "Embedding 1/2".into() }
    );

    let seen = std::sync::Mutex::new(Vec::new());
    let closure = |done: usize, total: usize, _: &str| seen.lock().unwrap().push((done, total));
    closure.on_progress(3, 4, "");
    assert_eq!(*seen.lock().unwrap(), vec![(3, 4)]);
}

#[test]
fn cancel_flag_is_shared_between_clones() {
    let flag = CancelFlag::new();
    let clone = flag.clone();
    assert!(!clone.is_cancelled());
    flag.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn settings_defaults_match_local_ollama_setup() {
    let settings = Settings::default();
    assert_eq!(settings.chunking, ChunkingConfig { chunk_size: 500, overlap: 100 });
    assert_eq!(settings.retrieval.top_k, 3);
    assert_eq!(settings.ollama.embed_model, "nomic-embed-text");
    assert_eq!(settings.ollama.llm_model, "llama3.2");
    settings.validate().expect("defaults are valid");
}

#[test]
fn settings_layer_toml_over_defaults() {
    use figment::providers::{Format, Toml};
    use figment::Figment;

    let figment = Figment::from(Toml::string(
        r#"
        [chunking]
        chunk_size = 800

        [ollama]
        llm_model = "mistral"
        "#,
    ));
    let config = Config::from_figment(figment).expect("config");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.chunking.chunk_size, 800);
    assert_eq!(settings.chunking.overlap, 100, "unspecified keys keep defaults");
    assert_eq!(settings.ollama.llm_model, "mistral");
    assert_eq!(config.get::<usize>("retrieval.top_k").expect("top_k"), 3);
}

#[test]
fn invalid_settings_are_rejected() {
    use figment::providers::{Format, Toml};
    use figment::Figment;

    let figment = Figment::from(Toml::string("[chunking]\nchunk_size = 100\noverlap = 100\n"));
    assert!(Config::from_figment(figment).is_err());

    let figment = Figment::from(Toml::string("[retrieval]\ntop_k = 0\n"));
    assert!(Config::from_figment(figment).is_err());
}

#[test]
fn error_kinds_name_the_failure_class() {
    assert_eq!(Error::IndexNotInitialized("empty".into()).kind(), "index_not_initialized");
    assert_eq!(Error::DimensionMismatch { expected: 768, actual: 512 }.kind(), "dimension_mismatch");
    assert_eq!(Error::Interrupted { completed: 2, total: 5 }.kind(), "interrupted");
    assert_eq!(Error::generation("timeout").kind(), "generation_provider");
    let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    assert_eq!(io.kind(), "io");
}
