//! HTTP API server with observability for checkout fulfillment.
//!
//! Provides REST endpoints for checkout submission, status polling, carts,
//! addresses, purchases and remote order lookups, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use domain::{AccountGateway, InMemoryAccountGateway};
use fulfillment::{
    BatchRunner, FulfillmentSaga, InMemoryOfferService, InMemoryOrderLookupCache,
    InMemoryPaymentService, InMemoryRemoteCommerceService, OfferService, OrderLookup,
    PaymentService, Poller, RemoteCommerceService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use status_store::{InMemoryStatusStore, StatusStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// The collaborators the server is wired with.
#[derive(Clone)]
pub struct Capabilities {
    pub store: Arc<dyn StatusStore>,
    pub accounts: Arc<dyn AccountGateway>,
    pub payments: Arc<dyn PaymentService>,
    pub commerce: Arc<dyn RemoteCommerceService>,
    pub offers: Arc<dyn OfferService>,
}

impl Capabilities {
    /// In-memory implementations of every collaborator.
    pub fn in_memory() -> Self {
        let accounts = Arc::new(InMemoryAccountGateway::new());
        Self {
            store: Arc::new(InMemoryStatusStore::new()),
            offers: Arc::new(InMemoryOfferService::with_accounts(accounts.clone())),
            accounts,
            payments: Arc::new(InMemoryPaymentService::new()),
            commerce: Arc::new(InMemoryRemoteCommerceService::new()),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::scrape))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route("/checkout", post(routes::checkout::submit))
        .route("/checkout/{handle}", get(routes::checkout::poll))
        .route("/checkout/{handle}/orders", get(routes::checkout::poll_batch))
        .route(
            "/accounts/{id}/cart",
            get(routes::accounts::get_cart).post(routes::accounts::add_to_cart),
        )
        .route(
            "/accounts/{id}/cart/{uuid}",
            delete(routes::accounts::remove_from_cart),
        )
        .route(
            "/accounts/{id}/addresses",
            get(routes::accounts::list_addresses).post(routes::accounts::add_address),
        )
        .route(
            "/accounts/{id}/addresses/{address_id}",
            delete(routes::accounts::remove_address),
        )
        .route("/accounts/{id}/purchases", get(routes::accounts::list_purchases))
        .route("/accounts/{id}/refunds", post(routes::accounts::refund_charge))
        .route(
            "/accounts/{id}/purchases/{order_id}",
            get(routes::accounts::get_purchase),
        )
        .route("/orders/lookup", post(routes::lookup::lookup))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the saga, runner, poller and lookup cache over a set of
/// collaborators.
pub fn build_state(capabilities: Capabilities, config: &Config) -> Arc<AppState> {
    let Capabilities {
        store,
        accounts,
        payments,
        commerce,
        offers,
    } = capabilities;

    let saga = FulfillmentSaga::new(
        accounts.clone(),
        payments.clone(),
        commerce.clone(),
        offers,
        store.clone(),
    );
    let lookup = OrderLookup::new(
        commerce,
        Arc::new(InMemoryOrderLookupCache::new()),
        config.order_cache_ttl,
    );

    Arc::new(AppState {
        runner: BatchRunner::new(store.clone(), Arc::new(saga)),
        poller: Poller::new(store),
        accounts,
        payments,
        lookup,
        concurrency_limit: config.concurrency_limit,
    })
}

/// Creates the default application state with in-memory collaborators.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    build_state(Capabilities::in_memory(), config)
}
