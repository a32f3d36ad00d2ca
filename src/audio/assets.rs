use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use super::source::AudioSource;

/// Handle to a derived, explicitly released asset (the object-URL analogue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetHandle(u64);

impl AssetHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("{0} was already released")]
    AlreadyReleased(AssetHandle),

    #[error("{0} was never registered")]
    Unknown(AssetHandle),
}

/// Owns every live derived asset. Each handle is released exactly once;
/// a second release or a resolve after release is an error.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    next: u64,
    live: HashMap<AssetHandle, AudioSource>,
    released: HashSet<AssetHandle>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: AudioSource) -> AssetHandle {
        self.next += 1;
        let handle = AssetHandle(self.next);
        self.live.insert(handle, source);
        handle
    }

    pub fn resolve(&self, handle: AssetHandle) -> Result<&AudioSource, AssetError> {
        match self.live.get(&handle) {
            Some(source) => Ok(source),
            None => Err(self.missing(handle)),
        }
    }

    pub fn release(&mut self, handle: AssetHandle) -> Result<AudioSource, AssetError> {
        match self.live.remove(&handle) {
            Some(source) => {
                self.released.insert(handle);
                Ok(source)
            }
            None => Err(self.missing(handle)),
        }
    }

    /// Releases everything still live, returning the handles in order.
    pub fn release_all(&mut self) -> Vec<AssetHandle> {
        let mut handles: Vec<AssetHandle> = self.live.keys().copied().collect();
        handles.sort();
        for handle in &handles {
            self.live.remove(handle);
            self.released.insert(*handle);
        }
        handles
    }

    pub fn is_live(&self, handle: AssetHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn released_count(&self) -> usize {
        self.released.len()
    }

    fn missing(&self, handle: AssetHandle) -> AssetError {
        if self.released.contains(&handle) {
            AssetError::AlreadyReleased(handle)
        } else {
            AssetError::Unknown(handle)
        }
    }
}
