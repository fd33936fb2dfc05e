//! Retrieval and grounded answering on top of the vector store.

pub mod composer;
pub mod generator;
pub mod retriever;
pub mod session;

pub use composer::{build_context, build_prompt, snippet, AnswerComposer};
pub use generator::OllamaGenerator;
pub use retriever::{RetrievedChunk, Retriever};
pub use session::{Session, SessionOptions};
