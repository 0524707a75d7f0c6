//! coursegen - course material generation backend
//!
//! Produces course outlines, multiple-choice quizzes, homework problems and
//! reference solutions from a chat-completion model, finds 15-20 minute
//! lecture videos through a web search API, and transcribes the opening
//! minutes of a lecture with a speech-to-text model.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `completion` - Chat-completion backends (OpenAI, scripted replies for tests)
//! - `generation` - Prompt/retry pipeline and the four generators
//! - `schema` - Typed course, quiz, homework and solution records
//! - `lookup` - Video search and length filtering
//! - `transcript` - Audio download, cropping and transcription
//! - `dispatch` - Operation registry shared by every front end
//! - `mcp` - MCP server over stdio
//! - `cli` - Command line, including the HTTP API server
//!
//! # Example
//!
//! ```rust,no_run
//! use coursegen::config::Settings;
//! use coursegen::dispatch::Dispatcher;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = Dispatcher::new(Settings::load()?)?;
//!
//!     let result = dispatcher
//!         .call("generate_quiz", json!({ "title": "Intro to Loops", "duration": 15 }))
//!         .await?;
//!     println!("{} ({})", result.data, result.status);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generation;
pub mod lookup;
pub mod mcp;
pub mod openai;
pub mod schema;
pub mod transcript;

pub use error::{CourseGenError, Result};
