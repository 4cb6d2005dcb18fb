//! Bank-row enrichment: merchant names, categories and recurring payments.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;
use rust_decimal::Decimal;

use crate::transactions::CanonicalTransaction;

/// Ordered keyword rules; the first rule with a matching keyword wins.
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Income", &["payroll", "salary", "direct dep", "wages"]),
    (
        "Dining",
        &["restaurant", "cafe", "coffee", "starbucks", "mcdonald", "pizza", "deliveroo", "uber eats", "doordash", "just eat"],
    ),
    (
        "Groceries",
        &["grocery", "supermarket", "whole foods", "trader joe", "tesco", "sainsbury", "aldi", "lidl", "kroger", "safeway", "waitrose"],
    ),
    (
        "Transport",
        &["uber", "lyft", "tfl", "shell", "chevron", "exxon", "parking", "railway", "trainline", "airline"],
    ),
    (
        "Subscriptions",
        &["netflix", "spotify", "hulu", "disney+", "apple.com/bill", "youtube premium", "patreon"],
    ),
    (
        "Utilities",
        &["electric", "water bill", "gas bill", "comcast", "verizon", "at&t", "vodafone", "broadband", "internet"],
    ),
    ("Housing", &["rent", "mortgage", "letting"]),
    ("Shopping", &["amazon", "ebay", "target", "walmart", "ikea", "argos"]),
    ("Cash", &["atm", "cash withdrawal"]),
    ("Fees", &["overdraft", "service fee", "monthly fee", "foreign transaction fee"]),
    ("Transfers", &["transfer", "zelle", "venmo", "paypal", "wise"]),
];

/// Category for a bank description, if any keyword rule matches.
pub fn categorize(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| category.to_string())
}

fn merchant_noise() -> &'static [Regex; 3] {
    static NOISE: OnceLock<[Regex; 3]> = OnceLock::new();
    NOISE.get_or_init(|| {
        [
            Regex::new(r"(?i)^(pos|debit card purchase|card purchase|purchase authorized on \d{2}/\d{2}|recurring payment)\s+")
                .expect("valid merchant prefix regex"),
            Regex::new(r"\b\d{2}/\d{2}(/\d{2,4})?\b").expect("valid date regex"),
            Regex::new(r"(#\s*)?\b[0-9]{3,}\b").expect("valid reference regex"),
        ]
    })
}

/// Payee name stripped of card-network prefixes, dates and reference numbers.
pub fn clean_merchant(description: &str) -> Option<String> {
    let head = description.split('*').next().unwrap_or_default();
    let [prefix, dates, references] = merchant_noise();
    let stripped = prefix.replace(head.trim(), "");
    let stripped = dates.replace_all(&stripped, " ");
    let stripped = references.replace_all(&stripped, " ");

    let words: Vec<String> = stripped
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect();

    (!words.is_empty()).then(|| words.join(" "))
}

/// Flags rows from the same merchant for the same amount that recur in two
/// or more distinct calendar months of the statement.
pub fn mark_recurring(transactions: &mut [CanonicalTransaction]) {
    let mut months: HashMap<(String, Decimal), HashSet<(i32, u32)>> = HashMap::new();
    for tx in transactions.iter() {
        if let Some(merchant) = &tx.merchant {
            months
                .entry((merchant.to_lowercase(), tx.amount))
                .or_default()
                .insert((tx.date.year(), tx.date.month()));
        }
    }

    for tx in transactions.iter_mut() {
        if let Some(merchant) = &tx.merchant {
            let key = (merchant.to_lowercase(), tx.amount);
            if months.get(&key).is_some_and(|m| m.len() >= 2) {
                tx.is_recurring = true;
            }
        }
    }
}
