pub mod assets;
pub mod decode;
pub mod extract;
pub mod source;
pub mod wav;

pub use assets::{AssetError, AssetHandle, AssetRegistry};
pub use decode::{DecodeCache, DecodedAudio};
pub use extract::{ExtractAudio, Extractor};
pub use source::{AudioInfo, AudioSource, SourceId, SourceOrigin};
