//! Weavewiki Server
//!
//! Credential-holding proxy in front of the generative-language API, plus
//! the embedded browser UI and a terminal explorer.

mod api;
mod assets;
mod config;
mod explore;
mod upstream;

use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::upstream::UpstreamClient;

/// Application state
pub struct AppState {
    pub config: ServerConfig,
    pub upstream: UpstreamClient,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(&config)?;
        Ok(Self { config, upstream })
    }
}

#[derive(Parser)]
#[command(name = "weavewiki", version, about = "AI encyclopedia gateway and explorer")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the gateway server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Interface to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: std::net::IpAddr,
    },
    /// Explore a topic in the terminal through a running gateway
    Explore(explore::ExploreArgs),
}

/// Routes and fallback, without binding
pub fn app(state: SharedState) -> Router {
    Router::new()
        .nest("/api", api::api_routes())
        .fallback(get(assets::serve_static))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr) -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    tracing::info!(?config, "Loaded server configuration");
    if !config.has_credential() {
        tracing::warn!("No API key configured; /api/generate will answer missing_credential");
    }

    let state: SharedState = Arc::new(AppState::new(config)?);
    let app = app(state);

    println!("🧵 Weavewiki Server running at http://{}", addr);
    println!("   API Routes:");
    println!("   Generate: /api/generate (POST)");
    println!("   Health:   /api/health");
    println!("   OpenAPI:  /api/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    match args.command {
        Some(CliCommand::Explore(explore_args)) => {
            init_tracing("weavewiki=warn,weavewiki_core=warn");
            explore::run(explore_args).await
        }
        Some(CliCommand::Serve { port, host }) => {
            init_tracing("weavewiki=info,weavewiki_core=info");
            print_banner();
            run_server(SocketAddr::new(host, port)).await
        }
        None => {
            init_tracing("weavewiki=info,weavewiki_core=info");
            print_banner();
            run_server(SocketAddr::from(([127, 0, 0, 1], 8080))).await
        }
    }
}

fn print_banner() {
    println!("╔══════════════════════════════════════╗");
    println!("║         WEAVEWIKI SERVER             ║");
    println!("╚══════════════════════════════════════╝");
}
