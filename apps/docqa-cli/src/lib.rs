//! Shared plumbing for the `docqa`, `docqa-ingest` and `docqa-chat` binaries.

use std::io::{BufRead, Write};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docqa_answer::Session;
use docqa_core::config::Config;
use docqa_core::progress::{CancelFlag, ProgressObserver, QueryStage};
use docqa_core::types::{IngestReport, QueryResult};
use docqa_core::Error;

pub const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "/quit"];

/// Installs the fmt subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Loads layered config and wires a session from it.
pub fn load_session() -> anyhow::Result<Session> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    Ok(Session::from_settings(&settings)?)
}

/// Drives an indicatif bar from ingest progress and a spinner message from
/// query stages.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn for_ingest() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }

    pub fn for_query() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_progress(&self, completed: usize, total: usize, description: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        self.bar.set_message(description.to_string());
    }

    fn on_stage(&self, stage: QueryStage) {
        self.bar.set_message(stage.status());
    }
}

/// Ingests `path` with a progress bar. Ctrl+C stops the ingest between chunks
/// and leaves the previous collection in place.
pub async fn run_ingest(session: &Session, path: &Path) -> anyhow::Result<IngestReport> {
    println!("📄 Ingesting {}", path.display());
    let cancel = CancelFlag::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let progress = ProgressBarObserver::for_ingest()?;
    let result = session.ingest_path(path, Some(&progress), Some(&cancel)).await;
    watcher.abort();
    match result {
        Ok(report) => {
            progress.finish("✅ Embedding completed!");
            println!(
                "📊 Indexed {} chunks from {} pages (dimension {}) into {}",
                report.chunks,
                report.pages,
                report.dimension,
                session.store().root().display()
            );
            Ok(report)
        }
        Err(e) => {
            progress.clear();
            Err(e.into())
        }
    }
}

pub fn print_answer<W: Write>(out: &mut W, result: &QueryResult) -> std::io::Result<()> {
    writeln!(out, "\n💡 Answer:\n{}\n", result.answer)?;
    if !result.sources.is_empty() {
        writeln!(out, "📄 Sources:")?;
        for source in &result.sources {
            writeln!(out, "  [Page {}] {}", source.page, source.snippet.replace('\n', " "))?;
        }
    }
    Ok(())
}

pub fn print_error<W: Write>(out: &mut W, err: &Error) -> std::io::Result<()> {
    match err {
        Error::IndexNotInitialized(_) => {
            writeln!(out, "⚠️  No document loaded. Run `docqa ingest <path>` first.")
        }
        other => writeln!(out, "❌ {}", other),
    }
}

pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.iter().any(|c| line.eq_ignore_ascii_case(c))
}

/// Interactive loop: one question per line until EOF or an exit command.
/// Errors are printed and the loop continues.
pub async fn run_chat<R: BufRead, W: Write>(
    session: &Session,
    mut input: R,
    out: &mut W,
    show_progress: bool,
) -> anyhow::Result<usize> {
    match session.ensure_loaded().await {
        Ok(collection) => writeln!(out, "📚 Loaded {} text chunks", collection.len())?,
        Err(e) => print_error(out, &e)?,
    }
    writeln!(out, "Ask a question about the document (type 'exit' to quit).")?;

    let mut answered = 0usize;
    let mut line = String::new();
    loop {
        write!(out, "\n❓ Question: ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 { break; }
        let question = line.trim();
        if question.is_empty() { continue; }
        if is_exit_command(question) { break; }

        let spinner = show_progress.then(ProgressBarObserver::for_query);
        let observer = spinner.as_ref().map(|s| s as &dyn ProgressObserver);
        let result = session.ask_with(question, session.options().top_k, observer).await;
        if let Some(s) = &spinner { s.clear(); }
        match result {
            Ok(result) => {
                print_answer(out, &result)?;
                answered += 1;
            }
            Err(e) => {
                tracing::debug!(kind = e.kind(), error = %e, "question failed");
                print_error(out, &e)?;
            }
        }
    }
    writeln!(out, "👋 Bye")?;
    Ok(answered)
}
