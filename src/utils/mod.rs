//! Terminal helpers: progress bars, styling and logging setup

pub mod logging;
pub mod progress;
pub mod styling;

pub use logging::init_tracing;
pub use progress::*;
pub use styling::*;
