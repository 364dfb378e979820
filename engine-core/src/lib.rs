//! engine-core: Shared infrastructure for the commercial document engine.
pub mod config;
pub mod error;
pub mod observability;

pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
