pub mod chunk;
pub mod pipeline;

pub use chunk::{plan_chunks, Chunk, ChunkWindow, MIN_CHUNK_SECONDS};
pub use pipeline::{process_chunks, PipelineOptions, PipelineReport, ProcessingStatus};
