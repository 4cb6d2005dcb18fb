use log::warn;

/// Decodes uploaded statement bytes into text.
///
/// UTF-8 (with or without BOM) is taken as is. Anything else goes through
/// charset detection, which covers the Windows-1252 and Latin-1 exports some
/// banks still produce.
pub fn decode_statement(content: &[u8]) -> String {
    let without_bom = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);

    if let Ok(text) = std::str::from_utf8(without_bom) {
        return text.to_string();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(without_bom, true);
    let encoding: &'static encoding_rs::Encoding = detector.guess(None, true);
    let (decoded, _, had_errors) = encoding.decode(without_bom);
    if had_errors {
        warn!(
            "Statement decoded as {} with replacement characters",
            encoding.name()
        );
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(decode_statement(b"\xEF\xBB\xBFDate,Amount"), "Date,Amount");
    }

    #[test]
    fn decodes_non_utf8_without_losing_ascii_columns() {
        let text = decode_statement(b"Name,Amount\nCaf\xE9 Rouge,1.00\n");
        assert!(text.starts_with("Name,Amount\nCaf"));
        assert!(text.ends_with("Rouge,1.00\n"));
        assert!(!text.contains('\u{fffd}'));
    }
}
