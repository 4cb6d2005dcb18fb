//! SQLite storage implementation for FIFO tax lots.

mod model;
mod repository;

pub use model::TaxLotDB;
pub use repository::TaxLotRepository;
