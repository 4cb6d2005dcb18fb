//! Statement import formats: detection, parsing and row normalization.
//!
//! Each supported export has a parser implementing [`StatementParser`]. The
//! [`StatementDispatcher`] owns them in priority order and picks one from the
//! header line alone.

mod chase;
mod decoding;
mod dispatcher;
mod enrichment;
mod fidelity;
mod generic;
mod kind_mapping;
mod monzo;
mod opening_balance;
mod parser_traits;
mod revolut;
mod schwab;
mod statement_model;
mod table;
mod values;

pub use chase::ChaseParser;
pub use decoding::decode_statement;
pub use dispatcher::StatementDispatcher;
pub use enrichment::{categorize, clean_merchant, mark_recurring};
pub use fidelity::FidelityParser;
pub use generic::GenericParser;
pub use kind_mapping::infer_kind;
pub use monzo::MonzoParser;
pub use opening_balance::{opening_balance_epsilon, ClosingBalances};
pub use parser_traits::{headers_in_order, StatementParser};
pub use revolut::RevolutParser;
pub use schwab::SchwabParser;
pub use statement_model::{
    ImportError, ImportTemplate, ParseWarning, ParsedStatement, StatementFormat, StatementKind,
};
