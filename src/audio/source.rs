use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::ExtractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the bytes of a source came from. Consumers treat every origin
/// identically as a decodable stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOrigin {
    Url(String),
    File(PathBuf),
    Memory,
    /// Sliced out of `parent` by the extractor.
    Derived {
        parent: SourceId,
        start_seconds: f64,
        end_seconds: f64,
    },
}

/// Header-level facts about a source, read without a full decode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub total_samples: usize,
}

impl AudioInfo {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_samples as f64 / self.sample_rate as f64
    }
}

/// An opaque, cheaply clonable encoded audio stream.
#[derive(Debug, Clone)]
pub struct AudioSource {
    id: SourceId,
    origin: SourceOrigin,
    bytes: Bytes,
}

impl AudioSource {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            id: SourceId::new(),
            origin: SourceOrigin::Memory,
            bytes: bytes.into(),
        }
    }

    pub fn derived(
        parent: SourceId,
        start_seconds: f64,
        end_seconds: f64,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: SourceId::new(),
            origin: SourceOrigin::Derived {
                parent,
                start_seconds,
                end_seconds,
            },
            bytes: bytes.into(),
        }
    }

    pub async fn open(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("open audio: {}", path.display()))?;
        Ok(Self {
            id: SourceId::new(),
            origin: SourceOrigin::File(path.to_path_buf()),
            bytes: Bytes::from(data),
        })
    }

    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self> {
        let response = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetch audio: {url}"))?;
        if !response.status().is_success() {
            return Err(anyhow!("fetch audio {url}: status {}", response.status()));
        }
        let data = response.bytes().await?;
        Ok(Self {
            id: SourceId::new(),
            origin: SourceOrigin::Url(url.to_string()),
            bytes: data,
        })
    }

    /// Loads from an `http(s)://` URL or a local path.
    pub async fn load(client: &reqwest::Client, location: &str) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::fetch(client, location).await
        } else {
            Self::open(Path::new(location)).await
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn info(&self) -> Result<AudioInfo, ExtractionError> {
        super::decode::read_info(&self.bytes)
    }

    /// A human label for logs and output file names.
    pub fn label(&self) -> String {
        match &self.origin {
            SourceOrigin::Url(url) => url.rsplit('/').next().unwrap_or(url).to_string(),
            SourceOrigin::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            SourceOrigin::Memory => format!("memory-{}", self.id),
            SourceOrigin::Derived {
                start_seconds,
                end_seconds,
                ..
            } => format!("region-{start_seconds:.3}-{end_seconds:.3}"),
        }
    }
}
