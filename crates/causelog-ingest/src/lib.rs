//! Causelog ingestion - bounded buffer + stream multiplexing

pub mod buffer;
pub mod pipeline;

pub use buffer::{IngestionBuffer, SharedBuffer, DEFAULT_CAPACITY};
pub use pipeline::{ErrorObserved, IngestHandle, IngestPipeline, SourceLine};
