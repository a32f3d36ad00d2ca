//! Sequential, fail-fast chunked inference.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::chunk::{plan_chunks, Chunk, ChunkWindow};
use crate::audio::{AudioSource, ExtractAudio};
use crate::config::Config;
use crate::error::{ExtractionError, InferenceError};
use crate::markers::Selection;
use crate::services::predictor::Predictor;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStatus {
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub current_chunk_index: usize,
    pub is_complete: bool,
    pub error: Option<String>,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub chunk_duration_seconds: f64,
    pub padding_seconds: f64,
    pub request_timeout: Duration,
    /// Click end time is `begin + click_epsilon_seconds`.
    pub click_epsilon_seconds: f64,
    /// Group id stamped on every produced selection.
    pub group_id: String,
    pub audio_id: Option<String>,
    /// Written to selection files as the row's file name.
    pub source_file: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            chunk_duration_seconds: config.chunk_duration_seconds,
            padding_seconds: config.padding_seconds,
            request_timeout: config.request_timeout(),
            click_epsilon_seconds: config.click_epsilon_seconds,
            group_id: "model".to_string(),
            audio_id: None,
            source_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Everything accumulated before completion, failure or cancellation.
    pub selections: Vec<Selection>,
    pub status: ProcessingStatus,
    pub cancelled: bool,
}

enum ChunkOutcome {
    Predicted(Vec<f64>),
    Failed(InferenceError),
    Cancelled,
}

/// Runs `predictor` over every chunk of `source`, strictly one at a time.
///
/// `on_chunk` fires once per attempted chunk: with the new selections on
/// success, or with an empty slice and `status.error` set on failure, after
/// which the run stops. Cancellation is checked before each chunk and while
/// a request is outstanding; once observed, no further callbacks fire.
///
/// Only failure to read the source header is returned as `Err`. Chunk
/// failures end up in the report's status.
pub async fn process_chunks<X, P, F>(
    extractor: Arc<X>,
    source: &AudioSource,
    options: &PipelineOptions,
    predictor: &P,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> Result<PipelineReport, ExtractionError>
where
    X: ExtractAudio + 'static,
    P: Predictor + ?Sized,
    F: FnMut(usize, &[Selection], &ProcessingStatus),
{
    let total_seconds = source.info()?.duration_seconds();
    let windows = plan_chunks(
        total_seconds,
        options.chunk_duration_seconds,
        options.padding_seconds,
    );

    let mut status = ProcessingStatus {
        total_chunks: windows.len(),
        is_complete: windows.is_empty(),
        ..ProcessingStatus::default()
    };
    let mut selections = Vec::new();

    info!(
        predictor = predictor.name(),
        chunks = windows.len(),
        duration = total_seconds,
        "inference started"
    );

    for window in &windows {
        if cancel.is_cancelled() {
            info!(processed = status.processed_chunks, "inference cancelled");
            return Ok(PipelineReport {
                selections,
                status,
                cancelled: true,
            });
        }
        status.current_chunk_index = window.index;

        let outcome = tokio::select! {
            _ = cancel.cancelled() => ChunkOutcome::Cancelled,
            outcome = run_chunk(Arc::clone(&extractor), source, window, predictor, options.request_timeout) => outcome,
        };

        match outcome {
            ChunkOutcome::Cancelled => {
                info!(processed = status.processed_chunks, "inference cancelled");
                return Ok(PipelineReport {
                    selections,
                    status,
                    cancelled: true,
                });
            }
            ChunkOutcome::Failed(e) => {
                warn!(chunk = window.index, error = %e, "inference aborted");
                status.error = Some(e.to_string());
                on_chunk(window.index, &[], &status);
                return Ok(PipelineReport {
                    selections,
                    status,
                    cancelled: false,
                });
            }
            ChunkOutcome::Predicted(local) => {
                let fresh = to_selections(window, &local, options);
                status.processed_chunks = window.index + 1;
                status.is_complete = status.processed_chunks == status.total_chunks;
                debug!(
                    chunk = window.index,
                    predicted = local.len(),
                    kept = fresh.len(),
                    "chunk processed"
                );
                on_chunk(window.index, &fresh, &status);
                selections.extend(fresh);
            }
        }
    }

    info!(selections = selections.len(), "inference complete");
    Ok(PipelineReport {
        selections,
        status,
        cancelled: false,
    })
}

async fn run_chunk<X, P>(
    extractor: Arc<X>,
    source: &AudioSource,
    window: &ChunkWindow,
    predictor: &P,
    timeout: Duration,
) -> ChunkOutcome
where
    X: ExtractAudio + 'static,
    P: Predictor + ?Sized,
{
    let chunk = match extract_chunk(extractor, source, window).await {
        Ok(chunk) => chunk,
        Err(e) => return ChunkOutcome::Failed(e.into()),
    };
    match tokio::time::timeout(timeout, predictor.predict(&chunk)).await {
        Ok(Ok(local)) => ChunkOutcome::Predicted(local),
        Ok(Err(e)) => ChunkOutcome::Failed(e),
        Err(_) => ChunkOutcome::Failed(InferenceError::Timeout(timeout)),
    }
}

async fn extract_chunk<X: ExtractAudio + 'static>(
    extractor: Arc<X>,
    source: &AudioSource,
    window: &ChunkWindow,
) -> Result<Chunk, ExtractionError> {
    let source = source.clone();
    let (start, end) = (window.padded_start, window.padded_end);
    let audio = tokio::task::spawn_blocking(move || extractor.extract(&source, start, end))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))??;
    Ok(Chunk::new(window, audio))
}

fn to_selections(window: &ChunkWindow, local: &[f64], options: &PipelineOptions) -> Vec<Selection> {
    let mut global = window.remap(local);
    global.sort_by(f64::total_cmp);
    global
        .into_iter()
        .enumerate()
        .map(|(n, begin)| Selection {
            id: format!("{}-{}-{}", options.group_id, window.index, n),
            begin_time: begin,
            end_time: begin + options.click_epsilon_seconds,
            source_group_id: options.group_id.clone(),
            audio_id: options.audio_id.clone(),
            source_file: options.source_file.clone(),
        })
        .collect()
}
