// Canonicalization used for header matching, identifiers and search.

/// Lowercases and strips everything but ASCII letters and digits.
/// "Unit Sell Price ($)" and "unit_sell_price" both become "unitsellprice".
pub fn normalize_key(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Lowercases and trims. Search blobs are built from these; non-alphanumeric
/// stripping happens at match time, not here.
pub fn normalize_token(s: &str) -> String {
    s.trim().to_lowercase()
}
