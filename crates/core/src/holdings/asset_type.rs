use std::sync::OnceLock;

use regex::Regex;

use super::holdings_model::AssetType;
use crate::constants::CASH_SYMBOL_PREFIX;

const CRYPTO_SYMBOLS: [&str; 28] = [
    "BTC", "ETH", "XRP", "LTC", "BCH", "ADA", "DOT", "LINK", "XLM", "DOGE", "UNI", "SOL", "AVAX",
    "MATIC", "ATOM", "ALGO", "VET", "FIL", "TRX", "ETC", "XMR", "AAVE", "MKR", "COMP", "SNX",
    "YFI", "SUSHI", "CRV",
];

const CRYPTO_QUOTE_SUFFIXES: [&str; 4] = ["-USD", "-EUR", "-USDT", "-GBP"];

const ETF_TICKERS: &[&str] = &[
    "SPY", "IVV", "VOO", "VTI", "QQQ", "QQQM", "DIA", "IWM", "VEA", "VWO", "VXUS", "VT", "VNQ",
    "BND", "BNDX", "AGG", "IEFA", "IEMG", "IJH", "IJR", "EFA", "EEM", "GLD", "SLV", "TLT", "SHY",
    "LQD", "HYG", "XLK", "XLF", "XLE", "XLV", "XLY", "XLP", "XLI", "XLU", "XLB", "XLRE", "XLC",
    "ARKK", "SCHD", "SCHX", "SCHB", "SCHF", "VIG", "VYM", "VUG", "VTV", "VB", "VO", "VGT", "SPLG",
    "JEPI", "JEPQ",
];

/// ISO codes that make up forex-pair pseudo symbols.
const FOREX_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "SEK", "NOK", "DKK", "HKD", "SGD",
    "CNY", "CNH", "INR", "MXN", "BRL", "ZAR", "PLN", "CZK", "HUF", "TRY", "KRW", "ILS",
];

fn forex_pattern() -> &'static Regex {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| {
        Regex::new(r"^([A-Z]{3})[/.\-]?([A-Z]{3})(=X)?$").expect("valid forex pair regex")
    })
}

fn equity_pattern() -> &'static Regex {
    static TICKER: OnceLock<Regex> = OnceLock::new();
    TICKER.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").expect("valid ticker regex"))
}

/// True for currency-pair symbols (`EUR/USD`, `EURUSD=X`, `GBP.USD`) that
/// some exports list as if they were positions.
pub fn is_forex_pair(symbol: &str) -> bool {
    let upper = symbol.trim().to_uppercase();
    forex_pattern().captures(&upper).is_some_and(|c| {
        let (base, quote) = (&c[1], &c[2]);
        base != quote && FOREX_CURRENCIES.contains(&base) && FOREX_CURRENCIES.contains(&quote)
    })
}

/// Best-effort asset class from the ticker alone.
pub fn infer_asset_type(symbol: &str) -> AssetType {
    let upper = symbol.trim().to_uppercase();

    if upper.starts_with(CASH_SYMBOL_PREFIX) {
        return AssetType::Cash;
    }
    if CRYPTO_SYMBOLS.contains(&upper.as_str())
        || CRYPTO_QUOTE_SUFFIXES.iter().any(|s| upper.ends_with(s))
    {
        return AssetType::Crypto;
    }
    if ETF_TICKERS.contains(&upper.as_str()) {
        return AssetType::Etf;
    }
    if upper.len() == 5 && upper.ends_with('X') && upper.chars().all(|c| c.is_ascii_uppercase()) {
        return AssetType::MutualFund;
    }
    if equity_pattern().is_match(&upper) {
        AssetType::Stock
    } else {
        AssetType::Other
    }
}
