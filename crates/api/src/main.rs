//! API server entry point.

use std::sync::Arc;

use api::Capabilities;
use api::config::Config;
use fulfillment::clients::{
    DEFAULT_TIMEOUT, HttpOfferClient, ShopifyCommerceClient, StaticStoreCredentials,
    StoreCredentials, StripePaymentClient,
};
use status_store::PostgresStatusStore;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Replaces in-memory collaborators with live ones where configured.
async fn capabilities(config: &Config) -> Capabilities {
    let mut capabilities = Capabilities::in_memory();

    if let Some(url) = &config.database_url {
        let store = PostgresStatusStore::connect(url)
            .await
            .expect("failed to connect to Postgres");
        store
            .run_migrations()
            .await
            .expect("failed to run migrations");
        tracing::info!("using Postgres status store");
        capabilities.store = Arc::new(store);
    }

    if let Some(key) = &config.stripe_secret_key {
        let client = StripePaymentClient::new(key.as_str(), DEFAULT_TIMEOUT)
            .expect("failed to build Stripe client");
        tracing::info!("using Stripe payment client");
        capabilities.payments = Arc::new(client);
    }

    if let (Some(base_url), Some(token)) = (&config.offers_base_url, &config.offers_api_token) {
        let client = HttpOfferClient::new(base_url.as_str(), token.as_str(), DEFAULT_TIMEOUT)
            .expect("failed to build offer client");
        tracing::info!(%base_url, "using campaign API offer client");
        capabilities.offers = Arc::new(client);
    }

    if !config.storefronts.is_empty() {
        let credentials = config
            .storefronts
            .iter()
            .fold(StaticStoreCredentials::new(), |creds, store| {
                creds.with_store(
                    store.advertiser_id.as_str(),
                    StoreCredentials::new(store.store_name.as_str(), store.access_token.as_str()),
                )
            });
        let client = ShopifyCommerceClient::new(Arc::new(credentials), DEFAULT_TIMEOUT)
            .expect("failed to build Shopify client");
        tracing::info!(stores = config.storefronts.len(), "using Shopify storefront client");
        capabilities.commerce = Arc::new(client);
    }

    capabilities
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire collaborators and application state
    tracing::info!(?config, "loaded configuration");
    let state = api::build_state(capabilities(&config).await, &config);

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
