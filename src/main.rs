//! IPSphere - backend for the IP valuation and tokenization marketplace

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ipsphere::{
    chain::{ChainConfig, EthRegistry, IpRegistry, MockRegistry},
    config::Args,
    db::MongoClient,
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ipsphere={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  IPSphere backend");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!(
        "Chain RPC: {}",
        args.rpc_url.as_deref().unwrap_or("(not configured)")
    );
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing without): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Build the chain registry client. Fully configured -> JSON-RPC
    // client; dev mode without config -> in-memory mock so the tokenize
    // flow stays exercisable locally.
    let chain: Option<Arc<dyn IpRegistry>> = match ChainConfig::from_args(&args) {
        Some(config) => match EthRegistry::new(config) {
            Ok(registry) => {
                info!("Chain registry client ready (sender {})", registry.sender());
                Some(Arc::new(registry))
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("Chain client setup failed (dev mode, using mock): {}", e);
                    Some(Arc::new(MockRegistry::new()))
                } else {
                    error!("Chain client setup failed: {}", e);
                    std::process::exit(1);
                }
            }
        },
        None => {
            if args.dev_mode {
                info!("Chain RPC not configured, using mock registry (dev mode)");
                Some(Arc::new(MockRegistry::new()))
            } else {
                warn!("Chain RPC not configured; tokenization endpoints will return 503");
                None
            }
        }
    };

    let state = Arc::new(server::AppState::new(args, mongo, chain));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
