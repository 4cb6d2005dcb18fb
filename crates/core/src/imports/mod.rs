//! Statement imports - parse, deduplicate, persist as a tagged batch, and
//! roll a batch back.

mod dedup;
mod imports_model;
mod imports_service;
mod imports_traits;


pub use dedup::{DedupOutcome, DuplicateDetector};
pub use imports_model::{ImportOptions, ImportSummary, RollbackSummary, RowResult, RowStatus};
pub use imports_service::ImportService;
pub use imports_traits::ImportServiceTrait;
