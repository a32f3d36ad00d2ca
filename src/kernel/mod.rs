//! Region/selection kernel.
//!
//! `reactor` is pure and synchronous; `session` is the async driver that
//! executes its side effects.

pub mod event;
pub mod reactor;
pub mod region;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod telemetry;

pub use event::{ExtractionTicket, PlaybackEvent, RegionEvent};
pub use reactor::RegionReactor;
pub use region::{ColorToken, Region, RegionId, MIN_REGION_SECONDS};
pub use scheduler::{ExtractionRequest, SideEffect};
pub use session::RegionSession;
pub use state::{ExtractionStatus, Phase, RegionState, SelectedRegionState};
