//! HTTP implementations of the external capabilities.
//!
//! Request builders and response parsers are plain functions so they can
//! be tested without a network.

pub mod offers;
pub mod shopify;
pub mod stripe;

pub use offers::HttpOfferClient;
pub use shopify::{
    ShopifyCommerceClient, StaticStoreCredentials, StoreCredentials, StoreCredentialsProvider,
};
pub use stripe::StripePaymentClient;

use std::time::Duration;

use reqwest::Client;

/// Default timeout of every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}
