//! CSV splitting shared by every parser.

use std::collections::BTreeMap;

use csv::{ReaderBuilder, Trim};
use log::warn;

use super::statement_model::{ImportError, ParseWarning};
use crate::errors::Result;

/// Header plus data rows of a statement export.
#[derive(Debug)]
pub(crate) struct StatementTable {
    pub headers: Vec<String>,
    pub rows: Vec<StatementRow>,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug)]
pub(crate) struct StatementRow {
    /// 1-based position among data rows.
    pub index: usize,
    fields: Vec<String>,
}

impl StatementRow {
    /// Field at a resolved column, empty when the column or field is missing.
    pub fn get(&self, column: Option<usize>) -> &str {
        column
            .and_then(|idx| self.fields.get(idx))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Like [`get`](Self::get) but `None` for blank fields.
    pub fn non_empty(&self, column: Option<usize>) -> Option<&str> {
        let value = self.get(column);
        (!value.is_empty()).then_some(value)
    }

    pub fn raw_fields(&self, headers: &[String]) -> BTreeMap<String, String> {
        headers
            .iter()
            .zip(self.fields.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.clone(), value.clone()))
            .collect()
    }
}

impl StatementTable {
    /// Index of the column whose trimmed header equals `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Splits a statement into header and rows. Leading blank lines and a BOM are
/// ignored; rows the CSV reader rejects become warnings.
pub(crate) fn read_table(text: &str) -> Result<StatementTable> {
    let body = text.trim_start_matches('\u{feff}').trim_start();
    if body.is_empty() {
        return Err(ImportError::EmptyStatement.into());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(Ok(record)) => record
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect(),
        Some(Err(e)) => return Err(ImportError::Malformed(e.to_string()).into()),
        None => return Err(ImportError::EmptyStatement.into()),
    };

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    for (offset, record) in records.enumerate() {
        let index = offset + 1;
        match record {
            Ok(record) => rows.push(StatementRow {
                index,
                fields: record.iter().map(str::to_string).collect(),
            }),
            Err(e) => {
                warn!("Unreadable statement row {}: {}", index, e);
                warnings.push(ParseWarning {
                    row: index,
                    message: format!("unreadable row: {}", e),
                });
            }
        }
    }

    Ok(StatementTable {
        headers,
        rows,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quoted_fields_and_ragged_rows() {
        let table = read_table("\"Date\",\"Amount\"\n\"01/02/2024\",\"$1,000.00\"\nTotal\n").unwrap();
        assert_eq!(table.headers, vec!["Date", "Amount"]);
        assert_eq!(table.rows.len(), 2);
        let amount = table.column("Amount");
        assert_eq!(table.rows[0].get(amount), "$1,000.00");
        assert_eq!(table.rows[1].get(amount), "");
        assert_eq!(table.rows[1].index, 2);
    }

    #[test]
    fn empty_text_is_an_error() {
        assert!(read_table("  \n").is_err());
    }
}
