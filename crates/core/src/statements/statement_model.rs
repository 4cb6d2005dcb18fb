use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transactions::{assign_occurrence_suffixes, CanonicalTransaction};

/// Supported statement exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    Schwab,
    Fidelity,
    Chase,
    Revolut,
    Monzo,
    Generic,
}

/// Whether a format carries securities trades or only cash movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    Brokerage,
    Bank,
}

impl StatementFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementFormat::Schwab => "schwab",
            StatementFormat::Fidelity => "fidelity",
            StatementFormat::Chase => "chase",
            StatementFormat::Revolut => "revolut",
            StatementFormat::Monzo => "monzo",
            StatementFormat::Generic => "generic",
        }
    }

    pub fn statement_kind(&self) -> StatementKind {
        match self {
            StatementFormat::Schwab | StatementFormat::Fidelity | StatementFormat::Generic => {
                StatementKind::Brokerage
            }
            StatementFormat::Chase | StatementFormat::Revolut | StatementFormat::Monzo => {
                StatementKind::Bank
            }
        }
    }
}

impl fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "schwab" => Ok(StatementFormat::Schwab),
            "fidelity" => Ok(StatementFormat::Fidelity),
            "chase" => Ok(StatementFormat::Chase),
            "revolut" => Ok(StatementFormat::Revolut),
            "monzo" => Ok(StatementFormat::Monzo),
            "generic" => Ok(StatementFormat::Generic),
            other => Err(ImportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors specific to statement import.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Statement format not recognized")]
    UnrecognizedFormat,

    #[error("Unknown statement format '{0}'")]
    UnknownFormat(String),

    #[error("Statement is empty")]
    EmptyStatement,

    #[error("Malformed statement: {0}")]
    Malformed(String),
}

/// A row-level anomaly that did not stop the row from being emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    /// 1-based data row index (the header line is row 0).
    pub row: usize,
    pub message: String,
}

/// Output of a single parser run.
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub format: StatementFormat,
    pub transactions: Vec<CanonicalTransaction>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedStatement {
    /// Seals a parser's output. Repeated fingerprints get occurrence suffixes.
    pub fn new(
        format: StatementFormat,
        mut transactions: Vec<CanonicalTransaction>,
        warnings: Vec<ParseWarning>,
    ) -> Self {
        assign_occurrence_suffixes(&mut transactions);
        Self {
            format,
            transactions,
            warnings,
        }
    }
}

/// Describes the columns a format expects, for building import files by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTemplate {
    pub format: StatementFormat,
    pub kind: StatementKind,
    pub columns: Vec<String>,
    pub date_format: String,
}
