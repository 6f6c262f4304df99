use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use soundmark::api;
use soundmark::config::{self, ServeConfig};
use soundmark::engine::Engine;
use soundmark::queue::IngestQueue;
use soundmark::store::postgres::PgStore;

#[derive(Parser)]
#[command(name = "soundmark", about = "Acoustic fingerprinting service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the HTTP API.
    Serve(ServeConfig),
    /// Ingests a local audio file without going through HTTP.
    IngestFile {
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Recognizes a local audio file without going through HTTP.
    RecognizeFile {
        path: PathBuf,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Records from the default input device and writes a WAV file.
    Record {
        #[arg(long)]
        seconds: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => serve(config).await,
        Command::IngestFile {
            path,
            title,
            artist,
            database_url,
        } => {
            let store = PgStore::connect(&database_url)?;
            let engine = Engine::new(Arc::new(store));
            let bytes = std::fs::read(&path)?;
            let content_hash = engine.ingest(bytes, &title, artist.as_deref()).await?;
            println!("ingested {} (content_hash={content_hash})", path.display());
            Ok(())
        }
        Command::RecognizeFile { path, database_url } => {
            let store = PgStore::connect(&database_url)?;
            let engine = Engine::new(Arc::new(store));
            let bytes = std::fs::read(&path)?;
            match engine.recognize(bytes).await? {
                Some(m) => println!(
                    "match: {} by {} (confidence={:.2}, aligned={})",
                    m.title,
                    m.artist.as_deref().unwrap_or("unknown"),
                    m.confidence,
                    m.aligned_matches
                ),
                None => println!("no match"),
            }
            Ok(())
        }
        Command::Record { seconds, out } => {
            let (samples, config) = soundmark::audio::capture::record_audio(seconds)?;
            soundmark::audio::capture::save_as_wav(&samples, &config, out.to_str().unwrap())?;
            println!("wrote {}", out.display());
            Ok(())
        }
    }
}

async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let store = PgStore::connect(&config.database_url)?;
    let engine = Arc::new(Engine::with_min_match_count(
        Arc::new(store),
        config.min_match_count,
    ));
    let queue = Arc::new(IngestQueue::spawn(engine.clone()));
    let state = api::AppState { engine, queue };
    let router = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
