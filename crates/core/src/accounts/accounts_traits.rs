use async_trait::async_trait;

use super::accounts_model::{Account, NewAccount};
use crate::errors::Result;

/// Trait defining the contract for Account repository operations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    async fn create(&self, new_account: NewAccount) -> Result<Account>;
    fn get_by_id(&self, account_id: &str) -> Result<Account>;
    fn list(&self) -> Result<Vec<Account>>;
    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Account>>;
}

/// Trait defining the contract for Account service operations.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;
    fn get_account(&self, account_id: &str) -> Result<Account>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn list_portfolio_accounts(&self, portfolio_id: &str) -> Result<Vec<Account>>;
}
