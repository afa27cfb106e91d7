//! Offer acceptance service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::AccountGateway;
use serde::{Deserialize, Serialize};

use super::{read, write};
use crate::error::FulfillmentError;

/// Reason reported when the offer system refuses an acceptance.
pub const FAILED_ACCEPTING_OFFER: &str = "FAILED_ACCEPTING_OFFER";

/// Contact details sent with an offer acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAcceptance {
    pub account_id: String,
    pub offer_id: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "first_name")]
    pub first_name: String,
    #[serde(rename = "last_name")]
    pub last_name: String,
    pub user_agent: String,
}

/// Trait for the offer system.
#[async_trait]
pub trait OfferService: Send + Sync {
    /// Marks an offer as accepted for the account.
    async fn accept_offer(&self, acceptance: &OfferAcceptance) -> Result<(), FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryOfferState {
    accepted: Vec<OfferAcceptance>,
    fail_on_accept: bool,
}

/// In-memory offer system for testing.
///
/// When constructed with an account gateway, accepted offers are also
/// recorded on the account, as the live offer system does.
#[derive(Clone, Default)]
pub struct InMemoryOfferService {
    state: Arc<RwLock<InMemoryOfferState>>,
    accounts: Option<Arc<dyn AccountGateway>>,
}

impl InMemoryOfferService {
    /// Creates a new in-memory offer system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an offer system that records acceptances on accounts.
    pub fn with_accounts(accounts: Arc<dyn AccountGateway>) -> Self {
        Self {
            state: Arc::default(),
            accounts: Some(accounts),
        }
    }

    /// Configures the service to refuse acceptances.
    pub fn set_fail_on_accept(&self, fail: bool) {
        write(&self.state).fail_on_accept = fail;
    }

    /// Returns the acceptances received, in order.
    pub fn acceptances(&self) -> Vec<OfferAcceptance> {
        read(&self.state).accepted.clone()
    }
}

#[async_trait]
impl OfferService for InMemoryOfferService {
    async fn accept_offer(&self, acceptance: &OfferAcceptance) -> Result<(), FulfillmentError> {
        {
            let mut state = write(&self.state);
            if state.fail_on_accept {
                return Err(FulfillmentError::OfferAcceptance(
                    FAILED_ACCEPTING_OFFER.to_string(),
                ));
            }
            state.accepted.push(acceptance.clone());
        }

        if let Some(accounts) = &self.accounts {
            accounts
                .record_accepted_offer(&acceptance.account_id, &acceptance.offer_id)
                .await?;
        }
        Ok(())
    }
}
