//! FIFO tax lots - acquisition lots, sale matching and realized gains.

mod fifo;
mod tax_lots_model;
mod tax_lots_service;
mod tax_lots_traits;


pub use fifo::{lot_from_acquisition, match_lots_fifo, FifoMatch};
pub use tax_lots_model::{
    BackfillSummary, ConsistencyReport, HoldingLotComparison, LotConsumption, NewTaxLot,
    SaleShortfall, TaxLot,
};
pub use tax_lots_service::TaxLotService;
pub use tax_lots_traits::{TaxLotRepositoryTrait, TaxLotServiceTrait};
