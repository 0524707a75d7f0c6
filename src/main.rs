//! coursegen CLI entry point.

use anyhow::Result;
use clap::Parser;
use coursegen::cli::{commands, Cli, Commands};
use coursegen::config::Settings;
use coursegen::dispatch::GenerationRequest;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    // stdout carries JSON results and the MCP protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("coursegen={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    std::fs::create_dir_all(settings.temp_dir())?;

    match cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Course {
            title,
            sessions,
            topics,
        } => {
            let request = GenerationRequest::GenerateCourse {
                title,
                sessions,
                topics,
            };
            commands::run_generate(request, settings).await?;
        }

        Commands::Video { topic } => {
            commands::run_generate(GenerationRequest::FindVideo { topic }, settings).await?;
        }

        Commands::Quiz { title, duration } => {
            let request = GenerationRequest::GenerateQuiz { title, duration };
            commands::run_generate(request, settings).await?;
        }

        Commands::Transcript { url } => {
            commands::run_generate(GenerationRequest::GetTranscript { url }, settings).await?;
        }

        Commands::Homework { transcript, file } => {
            let transcript = commands::read_transcript(transcript, file)?;
            let request = GenerationRequest::GenerateHomework { transcript };
            commands::run_generate(request, settings).await?;
        }

        Commands::Solution { problem, skeleton } => {
            let request = GenerationRequest::GenerateSolution { problem, skeleton };
            commands::run_generate(request, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
