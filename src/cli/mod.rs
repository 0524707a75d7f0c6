//! CLI module for coursegen.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// coursegen - course, quiz and homework generation
///
/// Generates course outlines, finds lecture videos, writes quizzes, transcribes
/// lectures and produces homework with solutions. Everything is also available
/// as an MCP server and an HTTP API.
#[derive(Parser, Debug)]
#[command(name = "coursegen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Generate a course outline
    Course {
        /// Course title
        title: String,

        /// Number of sessions
        #[arg(short, long, default_value = "4")]
        sessions: u32,

        /// Topics per session
        #[arg(short, long, default_value = "3")]
        topics: u32,
    },

    /// Find a 15-20 minute video for a topic
    Video {
        /// Topic to search for
        topic: String,
    },

    /// Generate a multiple-choice quiz for a video
    Quiz {
        /// Video title
        title: String,

        /// Video length in minutes (at least 5)
        #[arg(short, long)]
        duration: u32,
    },

    /// Transcribe the opening minutes of a video
    Transcript {
        /// Video URL
        url: String,
    },

    /// Generate homework from a lecture transcript
    Homework {
        /// Transcript text
        #[arg(conflicts_with = "file")]
        transcript: Option<String>,

        /// Read the transcript from a file ("-" for stdin)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Generate a solution for a coding problem
    Solution {
        /// Problem statement
        #[arg(short, long)]
        problem: String,

        /// Skeleton code
        #[arg(short, long, default_value = "")]
        skeleton: String,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start MCP server for AI assistant integration (Claude, etc.)
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
