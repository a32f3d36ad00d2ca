//! Click-prediction provider trait.

use async_trait::async_trait;

use crate::error::InferenceError;
use crate::inference::chunk::Chunk;

/// Anything that turns one padded chunk into click times.
///
/// Returned times are chunk-local seconds measured from the start of the
/// padded audio. Filtering to the valid window and remapping to recording
/// time is the pipeline's job, not the provider's.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Provider name for logs (e.g. "http").
    fn name(&self) -> &str;

    async fn predict(&self, chunk: &Chunk) -> Result<Vec<f64>, InferenceError>;
}
