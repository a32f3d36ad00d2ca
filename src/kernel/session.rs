use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::event::{ExtractionTicket, RegionEvent};
use super::reactor::RegionReactor;
use super::scheduler::{ExtractionRequest, SideEffect};
use super::state::{RegionState, SelectedRegionState};
use super::telemetry::{AssetEventKind, TelemetryEvent, TelemetryRecorder};
use crate::audio::{AssetHandle, AssetRegistry, AudioInfo, AudioSource, ExtractAudio};
use crate::config::Config;
use crate::error::{ExtractionError, SessionError, ValidationError};

// Driver-internal result (never seen by the reactor as-is)
struct Completion {
    ticket: ExtractionTicket,
    outcome: Result<AudioSource, ExtractionError>,
    elapsed: Duration,
}

/// Async driver around `RegionReactor`.
///
/// Executes the reactor's side effects: extraction runs off the caller's
/// task, results come back through a channel and are fed to the reactor as
/// `ExtractionFinished`. The session owns every extracted asset and
/// releases whatever is still live when dropped.
///
/// Must be created and driven inside a tokio runtime.
pub struct RegionSession<E: ExtractAudio + 'static> {
    reactor: RegionReactor,
    extractor: Arc<E>,
    source: Option<AudioSource>,
    assets: AssetRegistry,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: HashMap<u64, JoinHandle<()>>,
    telemetry: TelemetryRecorder,
}

impl<E: ExtractAudio + 'static> RegionSession<E> {
    pub fn new(extractor: Arc<E>, reactor: RegionReactor) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            reactor,
            extractor,
            source: None,
            assets: AssetRegistry::new(),
            completion_tx,
            completion_rx,
            in_flight: HashMap::new(),
            telemetry: TelemetryRecorder::new(),
        }
    }

    pub fn from_config(extractor: Arc<E>, config: &Config) -> Self {
        Self::new(extractor, RegionReactor::from_config(config))
    }

    /// Attaches `source` and re-extracts the current selection against it.
    /// A rejected source leaves the session on its previous one.
    pub fn load_source(&mut self, source: AudioSource) -> Result<AudioInfo, SessionError> {
        let info = source.info()?;
        let effects = self.reactor.step(RegionEvent::SourceLoaded {
            duration_seconds: info.duration_seconds(),
        })?;
        info!(
            source = %source.label(),
            channels = info.channels,
            sample_rate = info.sample_rate,
            duration = info.duration_seconds(),
            "audio loaded"
        );
        self.extractor.source_attached(source.id());
        if let Some(previous) = self.source.replace(source) {
            self.retire_source(previous);
        }
        self.execute(effects);
        Ok(info)
    }

    pub fn unload_source(&mut self) {
        if let Err(e) = self.dispatch(RegionEvent::SourceUnloaded) {
            warn!(error = %e, "unload rejected");
        }
        if let Some(previous) = self.source.take() {
            self.retire_source(previous);
        }
    }

    fn retire_source(&self, previous: AudioSource) {
        if self.source.as_ref().map(|s| s.id()) == Some(previous.id()) {
            return;
        }
        debug!(source = %previous.label(), "audio released");
        self.extractor.source_released(previous.id());
    }

    pub fn dispatch(&mut self, event: RegionEvent) -> Result<(), ValidationError> {
        let effects = self.reactor.step(event)?;
        self.execute(effects);
        Ok(())
    }

    /// Processes completions that have already arrived. Never waits.
    pub fn poll_completions(&mut self) -> usize {
        let mut count = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion);
            count += 1;
        }
        count
    }

    /// Waits for the next extraction to finish and processes it. Returns
    /// `false` when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight.is_empty() {
            return self.poll_completions() > 0;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.handle_completion(completion);
                true
            }
            None => false,
        }
    }

    /// Runs until no extraction is in flight.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    pub fn selection(&self) -> SelectedRegionState {
        self.reactor.state.snapshot()
    }

    pub fn state(&self) -> &RegionState {
        &self.reactor.state
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    /// The ready extracted asset of the selected region, if any.
    pub fn resolve_extracted(&self) -> Option<&AudioSource> {
        let handle = self.selection().extracted_asset?;
        self.assets.resolve(handle).ok()
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn execute(&mut self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::StartExtraction(request) => self.start_extraction(request),
                SideEffect::CancelExtraction(ticket) => {
                    if let Some(task) = self.in_flight.remove(&ticket.generation) {
                        task.abort();
                        debug!(region = %ticket.region_id, generation = ticket.generation, "extraction cancelled");
                    }
                }
                SideEffect::ReleaseAsset(handle) => self.release(handle),
                SideEffect::Log(msg) => debug!("{msg}"),
            }
        }
    }

    fn start_extraction(&mut self, request: ExtractionRequest) {
        let ExtractionRequest {
            ticket,
            start_seconds,
            end_seconds,
        } = request;
        self.telemetry.record(TelemetryEvent::ExtractionRequested {
            region_id: ticket.region_id.clone(),
            generation: ticket.generation,
        });

        let generation = ticket.generation;
        let tx = self.completion_tx.clone();

        let Some(source) = self.source.clone() else {
            let _ = tx.send(Completion {
                ticket,
                outcome: Err(ExtractionError::Task("no audio loaded".to_string())),
                elapsed: Duration::ZERO,
            });
            return;
        };
        let extractor = Arc::clone(&self.extractor);

        debug!(region = %ticket.region_id, generation, start_seconds, end_seconds, "extraction started");
        let task = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match tokio::task::spawn_blocking(move || {
                extractor.extract(&source, start_seconds, end_seconds)
            })
            .await
            {
                Ok(result) => result,
                Err(e) => Err(ExtractionError::Task(e.to_string())),
            };
            let _ = tx.send(Completion {
                ticket,
                outcome,
                elapsed: started.elapsed(),
            });
        });
        self.in_flight.insert(generation, task);
    }

    fn handle_completion(&mut self, completion: Completion) {
        let Completion {
            ticket,
            outcome,
            elapsed,
        } = completion;
        self.in_flight.remove(&ticket.generation);

        let is_current = self
            .reactor
            .state
            .selected()
            .and_then(|s| s.ticket.as_ref())
            == Some(&ticket);

        let outcome = match outcome {
            Ok(asset) => {
                let handle = self.assets.register(asset);
                self.telemetry.record(TelemetryEvent::Asset {
                    handle,
                    kind: AssetEventKind::Registered,
                });
                Ok(handle)
            }
            Err(e) => Err(e),
        };

        let region_id = ticket.region_id.clone();
        let generation = ticket.generation;
        if !is_current {
            self.telemetry
                .record(TelemetryEvent::ExtractionDiscarded { region_id, generation });
        } else if let Err(e) = &outcome {
            warn!(region = %region_id, error = %e, "extraction failed");
            self.telemetry
                .record(TelemetryEvent::ExtractionFailed { region_id, generation });
        } else {
            self.telemetry.record(TelemetryEvent::ExtractionCompleted {
                region_id,
                generation,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }

        if let Err(e) = self.dispatch(RegionEvent::ExtractionFinished { ticket, outcome }) {
            warn!(error = %e, "completion rejected");
        }
    }

    fn release(&mut self, handle: AssetHandle) {
        match self.assets.release(handle) {
            Ok(_) => {
                debug!(%handle, "asset released");
                self.telemetry.record(TelemetryEvent::Asset {
                    handle,
                    kind: AssetEventKind::Released,
                });
            }
            Err(e) => {
                error!(error = %e, "asset release rejected");
                self.telemetry.record(TelemetryEvent::Asset {
                    handle,
                    kind: AssetEventKind::ReleaseRejected,
                });
            }
        }
    }
}

impl<E: ExtractAudio + 'static> Drop for RegionSession<E> {
    fn drop(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
        if let Some(source) = self.source.take() {
            self.extractor.source_released(source.id());
        }
        let released = self.assets.release_all();
        if !released.is_empty() {
            debug!(count = released.len(), "released assets on teardown");
        }
    }
}
