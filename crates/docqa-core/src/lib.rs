pub mod chunker;
pub mod config;
pub mod error;
pub mod parser;
pub mod progress;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
