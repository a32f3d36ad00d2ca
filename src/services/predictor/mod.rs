pub mod client;
pub mod provider;

pub use client::{parse_prediction_body, HttpPredictor};
pub use provider::Predictor;
