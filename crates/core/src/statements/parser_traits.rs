use super::statement_model::{ImportTemplate, ParsedStatement, StatementFormat};
use crate::errors::Result;

/// One statement export format.
pub trait StatementParser: Send + Sync {
    fn format(&self) -> StatementFormat;

    /// Column headers that must appear, in this order, on the header line.
    fn header_signature(&self) -> &'static [&'static str];

    /// `chrono` pattern of the date column.
    fn date_format(&self) -> &'static str;

    /// Header-only detection; never looks at row content.
    fn detect(&self, text: &str) -> bool {
        headers_in_order(header_line(text), self.header_signature())
    }

    /// Converts the statement into canonical transactions in emission order.
    /// `currency` is used for rows that carry no currency of their own.
    fn parse(&self, text: &str, currency: &str) -> Result<ParsedStatement>;

    fn template(&self) -> ImportTemplate {
        ImportTemplate {
            format: self.format(),
            kind: self.format().statement_kind(),
            columns: self
                .header_signature()
                .iter()
                .map(|h| h.to_string())
                .collect(),
            date_format: self.date_format().to_string(),
        }
    }
}

/// First non-blank line of the statement, without a UTF-8 BOM.
pub(crate) fn header_line(text: &str) -> &str {
    text.trim_start_matches('\u{feff}')
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
}

/// True when every needle occurs in `line`, each after the previous match.
pub fn headers_in_order(line: &str, needles: &[&str]) -> bool {
    let mut rest = line;
    for needle in needles {
        match rest.find(needle) {
            Some(pos) => rest = &rest[pos + needle.len()..],
            None => return false,
        }
    }
    !needles.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needles_must_appear_in_order() {
        let line = "\"Date\",\"Action\",\"Symbol\"";
        assert!(headers_in_order(line, &["Date", "Action", "Symbol"]));
        assert!(!headers_in_order(line, &["Symbol", "Date"]));
        assert!(!headers_in_order(line, &["Date", "Quantity"]));
    }

    #[test]
    fn header_line_skips_bom_and_blank_lines() {
        let text = "\u{feff}\n\n  \nRun Date,Action\n01/02/2024,X";
        assert_eq!(header_line(text), "Run Date,Action");
        assert_eq!(header_line(""), "");
    }
}
