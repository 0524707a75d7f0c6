//! CLI command implementations.

mod config;
mod doctor;
mod generate;
mod mcp;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::{read_transcript, run_generate};
pub use mcp::run_mcp;
pub use serve::run_serve;
