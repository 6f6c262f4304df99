//! Environment-driven configuration, loaded via `dotenvy` then `clap(env)`
//! so the same flags work from a `.env` file, the shell, or `--flag`.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct ServeConfig {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value_t = 8085)]
    pub port: u16,

    /// Minimum aligned landmarks for a recognize match to count.
    #[arg(long, env = "MIN_MATCH_COUNT", default_value_t = crate::matcher::DEFAULT_MIN_MATCH_COUNT)]
    pub min_match_count: usize,
}

/// Loads `.env` (if present) before `ServeConfig::parse` reads the
/// environment; a missing file is not an error.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }
}
