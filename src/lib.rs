pub mod analytics;
pub mod cli;
pub mod config;
pub mod documents;
pub mod entity;
pub mod error;
pub mod etl;
pub mod http;
pub mod lifecycle;
pub mod storage;
pub mod time;

pub use documents::DocumentStore;
pub use error::{AacError, Result};
pub use storage::BatchStore;
