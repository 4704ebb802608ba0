//! Coffee Shop - drink menu API

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coffeeshop::{
    auth::{HttpKeySource, TokenAuthorizer},
    config::{Args, LogFormat, StoreBackend},
    db::MongoClient,
    server::{self, AppState},
    store::{DrinkStore, MemoryDrinkStore, MongoDrinkStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Coffee Shop - drink menu API");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Issuer: {}", args.issuer());
    info!("Audience: {}", args.api_audience);
    info!("JWKS: {}", args.jwks_url());
    if args.jwks_cache_ttl_secs == 0 {
        info!("JWKS cache: disabled (fetch per request)");
    } else {
        info!(
            "JWKS cache TTL: {}s (unknown key refresh at most every {}s)",
            args.jwks_cache_ttl_secs, args.jwks_min_refresh_secs
        );
    }
    info!("Store: {}", args.store_backend);
    info!("======================================");

    let store = build_store(&args).await?;

    if args.reset_db {
        warn!("RESET_DB set - dropping all drinks");
        store
            .reset_with_seed()
            .await
            .context("failed to reset drink store")?;
    }

    let key_source = HttpKeySource::new(args.jwks_url(), args.jwks_timeout())
        .context("failed to build key set client")?;
    let authorizer = Arc::new(TokenAuthorizer::new(
        args.auth_settings(),
        Arc::new(key_source),
    ));

    let state = Arc::new(AppState::new(args, authorizer, store));
    server::run(state).await?;

    info!("Coffee Shop stopped");
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("coffeeshop={},info", args.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn build_store(args: &Args) -> anyhow::Result<Arc<dyn DrinkStore>> {
    match args.store_backend {
        StoreBackend::Memory => {
            if !args.reset_db {
                info!("In-memory store starts empty; set RESET_DB to seed the sample menu");
            }
            Ok(Arc::new(MemoryDrinkStore::new()))
        }
        StoreBackend::Mongo => {
            let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db)
                .await
                .context("MongoDB connection failed")?;
            let store = MongoDrinkStore::new(&client)
                .await
                .context("failed to prepare drink collections")?;
            info!("MongoDB store ready (database '{}')", client.db_name());
            Ok(Arc::new(store))
        }
    }
}
