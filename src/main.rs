use anyhow::{anyhow, bail, Context, Result};
use cachalot::audio::{AudioSource, Extractor};
use cachalot::inference::{process_chunks, PipelineOptions};
use cachalot::kernel::{ExtractionStatus, RegionEvent, RegionId, RegionSession};
use cachalot::markers::{format_selection_file, parse_selection_file, MarkerBoard, SelectionGroup};
use cachalot::services::predictor::HttpPredictor;
use cachalot::view::peaks::peaks_for_range;
use cachalot::view::spectrogram::{compute_spectrogram, SpectrogramConfig};
use cachalot::view::{CroppedSource, DualViewController, RegionTransport};
use cachalot::Config;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "cachalot", about = "Click-detection region tools for whale recordings")]
struct Cli {
    /// Path to a TOML config file. Missing keys use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select a region and write its exact samples to a WAV file.
    Extract {
        /// Recording path or http(s) URL.
        audio: String,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run chunked click inference against the configured endpoint.
    Infer {
        audio: String,
        /// Overrides `inference_url` from the config.
        #[arg(long)]
        endpoint: Option<String>,
        /// Write detections as a selection file.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "model")]
        group: String,
    },
    /// Print the cropped-view layout for a region.
    Inspect {
        audio: String,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        /// Selection files to overlay, one group per file.
        #[arg(long)]
        markers: Vec<PathBuf>,
        #[arg(long, default_value_t = 200)]
        bins: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let client = reqwest::Client::new();

    match cli.command {
        Command::Extract {
            audio,
            start,
            end,
            out,
        } => extract(&config, &client, &audio, start, end, &out).await,
        Command::Infer {
            audio,
            endpoint,
            out,
            group,
        } => infer(&config, &client, &audio, endpoint, out.as_deref(), group).await,
        Command::Inspect {
            audio,
            start,
            end,
            markers,
            bins,
        } => inspect(&config, &client, &audio, start, end, &markers, bins).await,
    }
}

/// Loads `audio`, selects `[start, end]` and waits for the extraction.
async fn select_region(
    config: &Config,
    client: &reqwest::Client,
    audio: &str,
    start: f64,
    end: f64,
) -> Result<(RegionSession<Extractor>, Arc<Extractor>)> {
    let source = AudioSource::load(client, audio).await?;
    let extractor = Arc::new(Extractor::new());
    let mut session = RegionSession::from_config(Arc::clone(&extractor), config);
    session.load_source(source)?;
    session.dispatch(RegionEvent::Created {
        id: RegionId::generate(),
        start_seconds: start,
        end_seconds: end,
    })?;
    session.settle().await;
    Ok((session, extractor))
}

async fn extract(
    config: &Config,
    client: &reqwest::Client,
    audio: &str,
    start: f64,
    end: f64,
    out: &Path,
) -> Result<()> {
    let (session, _) = select_region(config, client, audio, start, end).await?;
    let selection = session.selection();
    if let ExtractionStatus::Failed(reason) = &selection.extraction_status {
        bail!("extraction failed: {reason}");
    }
    let asset = session
        .resolve_extracted()
        .ok_or_else(|| anyhow!("no extracted asset for the selected region"))?;

    tokio::fs::write(out, asset.bytes())
        .await
        .with_context(|| format!("write {}", out.display()))?;

    if let Some(region) = &selection.region {
        info!(
            start = region.start_seconds,
            end = region.end_seconds,
            bytes = asset.len(),
            out = %out.display(),
            "region written"
        );
    }
    Ok(())
}

async fn infer(
    config: &Config,
    client: &reqwest::Client,
    audio: &str,
    endpoint: Option<String>,
    out: Option<&Path>,
    group: String,
) -> Result<()> {
    let source = AudioSource::load(client, audio).await?;
    let label = source.label();
    let audio_id = Path::new(&label)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string());

    let mut predictor_config = config.clone();
    if let Some(url) = endpoint {
        predictor_config.inference_url = url;
    }
    let predictor = HttpPredictor::from_config(&predictor_config)
        .context("building prediction client")?;

    let options = PipelineOptions {
        group_id: group.clone(),
        audio_id,
        source_file: Some(label.clone()),
        ..PipelineOptions::from(config)
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut board = MarkerBoard::new();
    board.upsert_group(SelectionGroup::new(group.clone(), group.clone(), "#e74c3c"));

    let report = process_chunks(
        Arc::new(Extractor::new()),
        &source,
        &options,
        &predictor,
        &cancel,
        |index, selections, status| {
            board.append(&group, selections);
            match &status.error {
                Some(err) => warn!(chunk = index, error = %err, "chunk failed"),
                None => info!(
                    chunk = index,
                    clicks = selections.len(),
                    "{}/{} chunks",
                    status.processed_chunks,
                    status.total_chunks
                ),
            }
        },
    )
    .await?;

    if let Some(path) = out {
        let text = format_selection_file(&report.selections, &label);
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("write {}", path.display()))?;
    }

    if report.cancelled {
        info!(
            processed = report.status.processed_chunks,
            "inference cancelled"
        );
        return Ok(());
    }
    if let Some(err) = &report.status.error {
        bail!(
            "inference stopped after {}/{} chunks: {err}",
            report.status.processed_chunks,
            report.status.total_chunks
        );
    }
    println!(
        "{} clicks in {} chunks",
        report.selections.len(),
        report.status.total_chunks
    );
    Ok(())
}

async fn inspect(
    config: &Config,
    client: &reqwest::Client,
    audio: &str,
    start: f64,
    end: f64,
    markers: &[PathBuf],
    bins: usize,
) -> Result<()> {
    let (session, extractor) = select_region(config, client, audio, start, end).await?;
    let selection = session.selection();

    let mut board = MarkerBoard::new();
    for path in markers {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let selections = parse_selection_file(&text, &id, config.click_epsilon_seconds)?;
        board.upsert_group(SelectionGroup::new(id.clone(), id, "#3498db").with_selections(selections));
    }

    let mut views = DualViewController::new(config.viewport_width_px);
    views.sync(&selection);
    let view = views
        .current()
        .ok_or_else(|| anyhow!("no region selected"))?;

    let rendered = match view.source {
        CroppedSource::Extracted { .. } => session.resolve_extracted(),
        CroppedSource::Original => session.source(),
    }
    .ok_or_else(|| anyhow!("rendered asset is not available"))?;
    let decoded = extractor.decoded(rendered)?;
    let (from, to) = view.asset_range();
    let peaks = peaks_for_range(&decoded, from, to, bins);
    let sr = decoded.sample_rate as f64;
    let mono = decoded.mono_range((from * sr).floor() as usize, (to * sr).floor() as usize);
    let spectrogram = compute_spectrogram(&mono, decoded.sample_rate, &SpectrogramConfig::default());
    let transport = RegionTransport::new().state(&selection);

    println!(
        "region       [{:.4}, {:.4}]",
        view.region.start_seconds, view.region.end_seconds
    );
    println!("status       {:?}", selection.extraction_status);
    println!("source       {:?}", view.source);
    println!("zoom         {:.1} px/s", view.zoom());
    println!("scroll       {:.4}s", view.scroll_seconds);
    println!(
        "labels       {}",
        view.labels()
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!("transport    {:?}", transport);
    println!("peaks        {} bins", peaks.len());
    println!(
        "spectrogram  {} frames x {} bins",
        spectrogram.frames, spectrogram.bins
    );
    for marker in view.project(&board) {
        println!(
            "marker       {:>8.1}px  {} ({})",
            marker.x, marker.selection_id, marker.group_id
        );
    }
    Ok(())
}
