//! pdfsign API Server
//!
//! Accepts a PDF and a signature image over a multipart upload, draws the
//! image on the requested page and sends the signed document back.
//!
//! Endpoints:
//! - `POST /upload` - sign a document
//! - `GET /` - browser upload form
//! - `GET /health` - liveness probe

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod filename;
mod handlers;
mod models;
mod state;

use state::AppState;

/// Command-line arguments for the pdfsign server
#[derive(Parser, Debug)]
#[command(name = "pdfsign-api")]
#[command(about = "Stamp signature images onto PDF pages over HTTP")]
struct Args {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Directory where incoming files are kept
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory where signed documents are written
    #[arg(long, env = "SIGNED_DIR", default_value = "signed")]
    signed_dir: PathBuf,

    /// Maximum request body size in MiB
    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "32")]
    max_upload_mb: usize,

    /// Signature width in points when the form does not send one
    #[arg(long, env = "DEFAULT_WIDTH", default_value = "150")]
    default_width: f64,

    /// Signature height in points when the form does not send one
    #[arg(long, env = "DEFAULT_HEIGHT", default_value = "50")]
    default_height: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Build the application router
pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pdfsign_api={level},pdfsign_core={level},tower_http={level}"
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Initializing pdfsign API...");
    let state = AppState::new(
        args.upload_dir,
        args.signed_dir,
        (args.default_width, args.default_height),
    )
    .await?;
    let state = Arc::new(state);

    let app = app(state, args.max_upload_mb * 1024 * 1024);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MiB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
