use log::debug;
use std::sync::Arc;

use super::accounts_model::{Account, NewAccount};
use super::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
use crate::errors::Result;

/// Service for managing accounts
pub struct AccountService {
    repository: Arc<dyn AccountRepositoryTrait>,
}

impl AccountService {
    /// Creates a new AccountService instance
    pub fn new(repository: Arc<dyn AccountRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl AccountServiceTrait for AccountService {
    async fn create_account(&self, mut new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;
        new_account.currency = new_account.currency.trim().to_uppercase();
        debug!(
            "Creating account '{}' in portfolio {}",
            new_account.name, new_account.portfolio_id
        );
        self.repository.create(new_account).await
    }

    fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.repository.list()
    }

    fn list_portfolio_accounts(&self, portfolio_id: &str) -> Result<Vec<Account>> {
        self.repository.list_by_portfolio(portfolio_id)
    }
}
