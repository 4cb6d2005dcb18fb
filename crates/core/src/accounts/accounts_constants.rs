/// Default account type for new accounts
pub const DEFAULT_ACCOUNT_TYPE: &str = "BROKERAGE";

/// Account type constants
pub mod account_types {
    pub const BROKERAGE: &str = "BROKERAGE";
    pub const BANK: &str = "BANK";
}

/// Returns true if the given account type is valid.
pub fn is_valid_account_type(account_type: &str) -> bool {
    matches!(
        account_type,
        account_types::BROKERAGE | account_types::BANK
    )
}
