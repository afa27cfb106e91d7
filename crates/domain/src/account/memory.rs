use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{HandleGenerator, RandomHandleGenerator};
use tokio::sync::RwLock;

use super::{Account, AccountGateway};
use crate::cart::CartLineItem;
use crate::error::{DomainError, Result};
use crate::order::{Address, Purchase};

/// In-memory account gateway.
///
/// Each operation holds the lock for exactly one unit of work and releases
/// it on every exit path.
#[derive(Clone)]
pub struct InMemoryAccountGateway {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    handles: Arc<dyn HandleGenerator>,
    unavailable: Arc<AtomicBool>,
}

impl Default for InMemoryAccountGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountGateway {
    /// Creates an empty gateway using random instance ids.
    pub fn new() -> Self {
        Self::with_handles(Arc::new(RandomHandleGenerator::new()))
    }

    /// Creates an empty gateway with a specific id generator.
    pub fn with_handles(handles: Arc<dyn HandleGenerator>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            handles,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Inserts or replaces an account.
    pub async fn insert_account(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account);
    }

    /// Simulates the backing store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Unavailable("account store offline".to_string()));
        }
        Ok(())
    }

    async fn read<T>(&self, account_id: &str, f: impl FnOnce(&Account) -> T) -> Result<T> {
        self.check_available()?;
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(account_id)
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;
        Ok(f(account))
    }

    async fn write<T>(
        &self,
        account_id: &str,
        f: impl FnOnce(&mut Account) -> Result<T>,
    ) -> Result<T> {
        self.check_available()?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;
        f(account)
    }
}

#[async_trait]
impl AccountGateway for InMemoryAccountGateway {
    async fn load_account(&self, account_id: &str) -> Result<Option<Account>> {
        self.check_available()?;
        Ok(self.accounts.read().await.get(account_id).cloned())
    }

    async fn add_line_item(&self, account_id: &str, mut item: CartLineItem) -> Result<CartLineItem> {
        item.uuid = Some(self.handles.token());
        let result = self
            .write(account_id, |account| {
                account.add_to_cart(item.clone())?;
                Ok(item)
            })
            .await;

        if let Err(DomainError::Cart(ref err)) = result {
            metrics::counter!("cart_items_rejected_total", "reason" => err.code()).increment(1);
            tracing::info!(account_id, reason = err.code(), "cart item rejected");
        }
        result
    }

    async fn remove_line_item(
        &self,
        account_id: &str,
        item_uuid: &str,
    ) -> Result<Vec<CartLineItem>> {
        self.write(account_id, |account| {
            account.remove_from_cart(item_uuid)?;
            Ok(account.cart.clone())
        })
        .await
    }

    async fn get_cart(&self, account_id: &str) -> Result<Vec<CartLineItem>> {
        self.read(account_id, |account| account.cart.clone()).await
    }

    async fn clear_cart(&self, account_id: &str) -> Result<()> {
        self.write(account_id, |account| {
            account.cart.clear();
            Ok(())
        })
        .await
    }

    async fn list_addresses(&self, account_id: &str) -> Result<Vec<Address>> {
        self.read(account_id, |account| account.addresses.clone())
            .await
    }

    async fn add_address(&self, account_id: &str, mut address: Address) -> Result<Vec<Address>> {
        address.address_id = Some(self.handles.token());
        self.write(account_id, |account| {
            account.addresses.push(address);
            Ok(account.addresses.clone())
        })
        .await
    }

    async fn remove_address(&self, account_id: &str, address_id: &str) -> Result<Vec<Address>> {
        self.write(account_id, |account| {
            let before = account.addresses.len();
            account
                .addresses
                .retain(|a| a.address_id.as_deref() != Some(address_id));
            if account.addresses.len() == before {
                return Err(DomainError::AddressNotFound(address_id.to_string()));
            }
            Ok(account.addresses.clone())
        })
        .await
    }

    async fn list_purchases(&self, account_id: &str) -> Result<Vec<Purchase>> {
        self.read(account_id, |account| account.purchases.clone())
            .await
    }

    async fn get_purchase(&self, account_id: &str, order_id: &str) -> Result<Option<Purchase>> {
        self.read(account_id, |account| account.find_purchase(order_id).cloned())
            .await
    }

    async fn store_purchase(&self, account_id: &str, purchase: Purchase) -> Result<()> {
        self.write(account_id, |account| {
            account.purchases.push(purchase);
            Ok(())
        })
        .await
    }

    async fn record_accepted_offer(&self, account_id: &str, offer_id: &str) -> Result<()> {
        self.write(account_id, |account| {
            account.accept_offer(offer_id);
            Ok(())
        })
        .await
    }
}
