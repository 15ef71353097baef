//! TTS Studio CLI - HTTP server and one-off synthesis
//!
//! Engines:
//! - Kitten TTS (default)
//! - Coqui TTS (simulated)
//! - OpenAI TTS
//! - Google TTS
//! - Azure TTS

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tts_studio::engine::{GenerationPipeline, GenerationRequest};
use tts_studio::history::MemoryHistoryStore;
use tts_studio::server::build_registry;
use tts_studio::{ServerConfig, TtsServer, VERSION};

/// TTS Studio - multi-engine text-to-speech with generation history
#[derive(Parser, Debug)]
#[command(name = "tts-studio")]
#[command(author, version, about, long_about = None)]
#[command(long_about = "
TTS Studio turns text into WAV audio through interchangeable engines.

Examples:
  # Start the HTTP server on port 5000
  tts-studio serve

  # List engines and their readiness
  tts-studio engines

  # One-off synthesis
  tts-studio say --text \"Hello world\" --voice expr-voice-2-f --output hello.wav
")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List engines and their readiness
    Engines,

    /// List the voices of an engine
    Voices {
        /// Engine ID (defaults to the configured default engine)
        #[arg(short, long)]
        engine: Option<String>,
    },

    /// Synthesize text to a WAV file
    Say {
        /// Text to synthesize
        #[arg(short, long)]
        text: String,

        /// Voice ID (defaults to the engine's first voice)
        #[arg(long)]
        voice: Option<String>,

        /// Engine ID (defaults to the configured default engine)
        #[arg(short, long)]
        engine: Option<String>,

        /// Output audio file path
        #[arg(short, long, default_value = "output.wav")]
        output: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ServerConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid environment override")?;
    Ok(config)
}

fn setup_logging(verbose: bool, config_level: &str) {
    let fallback = if verbose { "debug" } else { config_level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn list_engines(config: &ServerConfig) -> Result<()> {
    let registry = build_registry(config).await?;

    println!("┌──────────┬──────────────────────┬──────────────┬─────────┐");
    println!("│ {:8} │ {:20} │ {:12} │ {:7} │", "ID", "Name", "Status", "Current");
    println!("├──────────┼──────────────────────┼──────────────┼─────────┤");
    for engine in registry.list_engines()? {
        println!(
            "│ {:8} │ {:20} │ {:12} │ {:7} │",
            engine.id,
            engine.name,
            engine.status.to_string(),
            if engine.current { "*" } else { "" }
        );
    }
    println!("└──────────┴──────────────────────┴──────────────┴─────────┘");
    Ok(())
}

async fn list_voices(config: &ServerConfig, engine: Option<&str>) -> Result<()> {
    let registry = build_registry(config).await?;
    let engine_id = match engine {
        Some(id) => id.to_string(),
        None => registry.current_engine_id()?,
    };

    println!("Voices of '{}':", engine_id);
    for voice in registry.list_voices(Some(&engine_id))? {
        println!(
            "  {:16} {:24} {:12} {}",
            voice.id,
            voice.display_name,
            voice.gender.to_string(),
            voice.description
        );
    }
    Ok(())
}

async fn say(
    config: &ServerConfig,
    request: GenerationRequest,
    output: &Path,
) -> Result<()> {
    let pb = create_spinner("Loading engines...");
    let start = Instant::now();

    let registry = Arc::new(build_registry(config).await?);
    let history = Arc::new(MemoryHistoryStore::new(config.history.retention()));
    let pipeline = GenerationPipeline::new(
        registry,
        history,
        config.generation.pipeline_config(),
    );

    pb.set_message("Synthesizing...");
    let audio = pipeline.render(&request).await?;
    std::fs::write(output, &audio.wav)
        .with_context(|| format!("Failed to write {:?}", output))?;
    pb.finish_and_clear();

    info!(
        "Saved {:.2}s of audio ({}/{}) to {:?} in {:.2}s",
        audio.duration_secs,
        audio.engine_id,
        audio.voice_id,
        output,
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    setup_logging(cli.verbose, &config.logging.level);

    info!("TTS Studio v{}", VERSION);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            TtsServer::new(config)
                .run()
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))
        }
        Commands::Engines => list_engines(&config).await,
        Commands::Voices { engine } => list_voices(&config, engine.as_deref()).await,
        Commands::Say {
            text,
            voice,
            engine,
            output,
        } => {
            let mut request = GenerationRequest::new(text);
            request.voice_id = voice;
            request.engine_id = engine;
            say(&config, request, &output).await
        }
    }
}
