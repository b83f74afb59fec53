pub mod agents;
pub mod config;
pub mod confidence;
pub mod extract;
pub mod orchestrator;
pub mod providers;
pub mod scoring;
pub mod types;

pub use config::Config;
pub use types::*;
