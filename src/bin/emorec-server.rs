use std::time::Duration;

use clap::Parser;
use emorec::{build_router, AppState, Config, EmbeddingConfig, EmbeddingProvider};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emorec-server")]
#[command(about = "EmoRec - emotion-based playlist generation API", long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Spotify client ID (Spotify search is disabled without it)
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    spotify_client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,

    /// Market for artist top tracks
    #[arg(long, env = "SPOTIFY_MARKET", default_value = "US")]
    spotify_market: String,

    /// Genius API token (lyrics enrichment is disabled without it)
    #[arg(long, env = "GENIUS_ACCESS_TOKEN", hide_env_values = true)]
    genius_access_token: Option<String>,

    /// Embedding backend: hashing or openai
    #[arg(long, env = "EMBEDDING_PROVIDER", default_value = "hashing")]
    embedding_provider: EmbeddingProvider,

    #[arg(long, env = "EMBEDDING_API_URL")]
    embedding_api_url: Option<String>,

    #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    embedding_api_key: Option<String>,

    #[arg(long, env = "EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Vector width of the hashing embedder
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = 384)]
    embedding_dimensions: usize,

    /// Embedding request timeout in seconds
    #[arg(long, env = "EMBEDDING_TIMEOUT", default_value_t = 30)]
    embedding_timeout: u64,

    #[arg(long, env = "COLLAGE_WIDTH", default_value_t = 800)]
    collage_width: u32,

    #[arg(long, env = "COLLAGE_HEIGHT", default_value_t = 600)]
    collage_height: u32,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Config {
        let defaults = EmbeddingConfig::default();
        Config {
            host: self.host,
            port: self.port,
            spotify_client_id: self.spotify_client_id,
            spotify_client_secret: self.spotify_client_secret,
            spotify_market: self.spotify_market,
            genius_access_token: self.genius_access_token,
            embedding: EmbeddingConfig {
                provider: self.embedding_provider,
                api_url: self.embedding_api_url.unwrap_or(defaults.api_url),
                api_key: self.embedding_api_key,
                model: self.embedding_model.unwrap_or(defaults.model),
                dimensions: self.embedding_dimensions,
                timeout: Duration::from_secs(self.embedding_timeout),
            },
            collage_width: self.collage_width,
            collage_height: self.collage_height,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    info!("Starting EmoRec API v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.into_config();
    let addr = config.bind_addr()?;
    let state = AppState::new(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("EmoRec listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;

    Ok(())
}
