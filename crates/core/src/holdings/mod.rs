//! Holdings - per (account, symbol) positions derived by replaying the ledger.

mod asset_type;
mod holdings_model;
mod holdings_service;
mod holdings_traits;
mod replay;


pub use asset_type::{infer_asset_type, is_forex_pair};
pub use holdings_model::{AssetType, Holding, HoldingPosition, NewHolding};
pub use holdings_service::HoldingsService;
pub use holdings_traits::{HoldingRepositoryTrait, HoldingsServiceTrait};
pub use replay::{cash_balances, replay_position};
