pub mod audio;
pub mod config;
pub mod error;
pub mod inference;
pub mod kernel;
pub mod markers;
pub mod services;
pub mod view;

// Re-export specific items for convenient access
pub use config::Config;
pub use error::{ExtractionError, InferenceError, SessionError, ValidationError};
pub use kernel::reactor::RegionReactor;
pub use kernel::session::RegionSession;
