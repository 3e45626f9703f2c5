//! Report module - summarizing models and correlation results

pub mod correlation_summary;
pub mod export;
pub mod model_summary;

pub use correlation_summary::*;
pub use export::*;
pub use model_summary::*;
