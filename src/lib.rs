pub mod agent;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod messaging;
pub mod types;

pub use config::SimConfig;
pub use error::{KarisError, Result};
pub use types::*;
