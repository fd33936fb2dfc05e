//! Transport-agnostic progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Coarse phases of answering a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStage {
    Analyzing,
    Searching,
    Generating,
}

impl QueryStage {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Analyzing => "Analyzing question...",
            Self::Searching => "Searching document...",
            Self::Generating => "Generating answer...",
        }
    }
}

/// Receives advisory progress. Implementations must not block for long; the
/// pipeline calls them inline and ignores their outcome.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize, description: &str);

    fn on_stage(&self, _stage: QueryStage) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize, description: &str) {
        self(completed, total, description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Progress { completed: usize, total: usize, description: String },
    Stage(QueryStage),
}

/// Forwards events into a channel. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver(Sender<ProgressEvent>);

impl ChannelObserver {
    pub fn new(sender: Sender<ProgressEvent>) -> Self { Self(sender) }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, completed: usize, total: usize, description: &str) {
        let _ = self.0.send(ProgressEvent::Progress { completed, total, description: description.to_string() });
    }

    fn on_stage(&self, stage: QueryStage) {
        let _ = self.0.send(ProgressEvent::Stage(stage));
    }
}

/// Shared flag checked between chunks of a long-running ingest.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }

    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::SeqCst) }
}
