use log::{debug, info};

use super::chase::ChaseParser;
use super::fidelity::FidelityParser;
use super::generic::GenericParser;
use super::monzo::MonzoParser;
use super::parser_traits::StatementParser;
use super::revolut::RevolutParser;
use super::schwab::SchwabParser;
use super::statement_model::{
    ImportError, ImportTemplate, ParsedStatement, StatementFormat, StatementKind,
};
use crate::errors::Result;

/// Registry of statement parsers in detection priority order.
pub struct StatementDispatcher {
    parsers: Vec<Box<dyn StatementParser>>,
}

impl Default for StatementDispatcher {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SchwabParser),
            Box::new(FidelityParser),
            Box::new(RevolutParser),
            Box::new(ChaseParser),
            Box::new(MonzoParser),
            Box::new(GenericParser),
        ])
    }
}

impl StatementDispatcher {
    pub fn new(parsers: Vec<Box<dyn StatementParser>>) -> Self {
        Self { parsers }
    }

    /// First parser whose header signature matches, in priority order.
    pub fn detect_format(&self, text: &str) -> Option<StatementFormat> {
        self.parsers
            .iter()
            .find(|p| p.detect(text))
            .map(|p| p.format())
    }

    /// Detection restricted to brokerage formats.
    pub fn detect_broker_format(&self, text: &str) -> Option<StatementFormat> {
        self.parsers
            .iter()
            .filter(|p| p.format().statement_kind() == StatementKind::Brokerage)
            .find(|p| p.detect(text))
            .map(|p| p.format())
    }

    fn parser_for(&self, format: StatementFormat) -> Result<&dyn StatementParser> {
        self.parsers
            .iter()
            .find(|p| p.format() == format)
            .map(|p| p.as_ref())
            .ok_or_else(|| ImportError::UnknownFormat(format.to_string()).into())
    }

    /// Parses with an explicit format, or detects one when `format` is `None`.
    pub fn parse(
        &self,
        text: &str,
        format: Option<StatementFormat>,
        currency: &str,
    ) -> Result<ParsedStatement> {
        let format = match format {
            Some(format) => format,
            None => self
                .detect_format(text)
                .ok_or(ImportError::UnrecognizedFormat)?,
        };
        debug!("Parsing statement as {}", format);
        let parsed = self.parser_for(format)?.parse(text, currency)?;
        info!(
            "Parsed {} {} rows ({} warnings)",
            parsed.transactions.len(),
            format,
            parsed.warnings.len()
        );
        Ok(parsed)
    }

    pub fn templates(&self) -> Vec<ImportTemplate> {
        self.parsers.iter().map(|p| p.template()).collect()
    }
}
