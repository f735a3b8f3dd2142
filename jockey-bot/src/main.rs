//! Playback controller (jockey-bot) - Main entry point
//!
//! Wires the audio node adapter, session registry, command router, and
//! HTTP surface together, then serves until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jockey_bot::api;
use jockey_bot::node::RestNode;
use jockey_bot::notify::{run_presence_loop, LogNotifier, Notifier, WebhookNotifier};
use jockey_bot::router::CommandRouter;
use jockey_bot::session::registry::SessionRegistry;
use jockey_common::config::Config;

/// Command-line arguments for jockey-bot
#[derive(Parser, Debug)]
#[command(name = "jockey-bot")]
#[command(about = "Chat-driven playback controller")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "JOCKEY_PORT")]
    port: Option<u16>,

    /// Base URL of the audio node's control API
    #[arg(long, env = "JOCKEY_NODE_URL")]
    node_url: Option<String>,

    /// Password for the audio node, if it requires one
    #[arg(long, env = "JOCKEY_NODE_PASSWORD")]
    node_password: Option<String>,

    /// Base URL of the gateway's callback endpoint
    #[arg(long, env = "JOCKEY_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jockey_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // File/default layer first, CLI/env layer on top
    let mut config = Config::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(node_url) = args.node_url {
        config.node_url = node_url;
    }
    if args.node_password.is_some() {
        config.node_password = args.node_password;
    }
    if args.gateway_url.is_some() {
        config.gateway_url = args.gateway_url;
    }

    info!("Starting jockey playback controller on port {}", config.port);
    info!("Audio node: {}", config.node_url);

    // Audio node adapter
    let node = Arc::new(
        RestNode::new(
            config.node_url.clone(),
            config.node_password.clone(),
            Duration::from_secs(config.connect_timeout_secs),
        )
        .context("Failed to create audio node client")?,
    );

    // Notifier: gateway webhook when configured, log-only otherwise
    let notifier: Arc<dyn Notifier> = match &config.gateway_url {
        Some(url) => {
            info!("Gateway callbacks: {}", url);
            Arc::new(
                WebhookNotifier::new(url.clone())
                    .context("Failed to create gateway notifier")?,
            )
        }
        None => {
            info!("No gateway callback URL configured; notifications are logged");
            Arc::new(LogNotifier)
        }
    };

    let registry = Arc::new(SessionRegistry::new(node.clone(), Arc::clone(&notifier)));

    // Node completion events: pump off the SSE stream, route into sessions
    let (event_tx, mut event_rx) = mpsc::channel(256);
    {
        let node = Arc::clone(&node);
        tokio::spawn(async move {
            node.run_event_pump(event_tx).await;
        });
    }
    {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                registry.dispatch_event(event);
            }
        });
    }

    // Periodic presence updates
    tokio::spawn(run_presence_loop(
        Arc::clone(&notifier),
        Duration::from_secs(config.presence_interval_secs),
    ));

    // HTTP surface
    let router = Arc::new(CommandRouter::new(Arc::clone(&registry)));
    let ctx = api::AppContext {
        router,
        registry,
        started_at: Instant::now(),
        port: config.port,
    };
    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
