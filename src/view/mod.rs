//! Cropped-view model: what the secondary waveform shows and how.

pub mod peaks;
pub mod spectrogram;
pub mod sync;
pub mod timeline;
pub mod transport;

pub use sync::{CroppedSource, CroppedView, DualViewController, ProjectedMarker, ViewUpdate};
pub use timeline::{label_interval, timeline_labels, TimelineLabel};
pub use transport::{PlayerTarget, RegionTransport, TransportState};
