use async_trait::async_trait;

use super::Account;
use crate::cart::CartLineItem;
use crate::error::Result;
use crate::order::{Address, Purchase};

/// Reads and mutates a shopper's cart, address book, purchases and
/// accepted offers.
///
/// Cart additions are validated here, before any order can be built from
/// the cart. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Loads an account snapshot, or `None` if the id is unknown.
    async fn load_account(&self, account_id: &str) -> Result<Option<Account>>;

    /// Adds a line item after enforcing the cart invariants and returns it
    /// with a freshly stamped instance id.
    async fn add_line_item(&self, account_id: &str, item: CartLineItem) -> Result<CartLineItem>;

    /// Removes a line item by instance id and returns the remaining cart.
    async fn remove_line_item(&self, account_id: &str, item_uuid: &str)
    -> Result<Vec<CartLineItem>>;

    /// Returns the current cart.
    async fn get_cart(&self, account_id: &str) -> Result<Vec<CartLineItem>>;

    /// Empties the cart.
    async fn clear_cart(&self, account_id: &str) -> Result<()>;

    /// Lists saved addresses.
    async fn list_addresses(&self, account_id: &str) -> Result<Vec<Address>>;

    /// Saves an address under a fresh address id and returns the address book.
    async fn add_address(&self, account_id: &str, address: Address) -> Result<Vec<Address>>;

    /// Deletes an address and returns the remaining address book.
    async fn remove_address(&self, account_id: &str, address_id: &str) -> Result<Vec<Address>>;

    /// Lists completed purchases.
    async fn list_purchases(&self, account_id: &str) -> Result<Vec<Purchase>>;

    /// Finds a purchase by remote order id.
    async fn get_purchase(&self, account_id: &str, order_id: &str) -> Result<Option<Purchase>>;

    /// Appends a completed purchase.
    async fn store_purchase(&self, account_id: &str, purchase: Purchase) -> Result<()>;

    /// Marks an offer as accepted by the account.
    async fn record_accepted_offer(&self, account_id: &str, offer_id: &str) -> Result<()>;
}
