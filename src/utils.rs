// Utility functions
use chrono::Utc;

/// Extracts a numeric value from arbitrary price-like text. Currency symbols
/// and thousands separators are discarded as non-numeric noise; anything that
/// still fails to parse yields 0.
pub fn parse_money(s: &str) -> f64 {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Formats a value as "₹ 12,34,567.89": two decimals, Indian-system grouping
/// (last three digits, then groups of two).
pub fn format_inr(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let rupees = (cents / 100).to_string();
    let paise = cents % 100;

    let grouped = if rupees.len() > 3 {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut idx = head.len();
        while idx > 2 {
            parts.push(&head[idx - 2..idx]);
            idx -= 2;
        }
        parts.push(&head[..idx]);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    } else {
        rupees
    };

    format!("{}₹ {}.{:02}", if negative { "-" } else { "" }, grouped, paise)
}

/// Session-unique id: millisecond timestamp plus a random hex suffix.
pub fn generate_id() -> String {
    format!("{}-{:08x}", Utc::now().timestamp_millis(), rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_money_discards_noise() {
        assert_eq!(parse_money(""), 0.0);
        assert_eq!(parse_money("₹1,234.50"), 1234.50);
        assert_eq!(parse_money("N/A"), 0.0);
        assert_eq!(parse_money("  89 "), 89.0);
        assert_eq!(parse_money("-42.5"), -42.5);
        assert_eq!(parse_money("$ 7,00,000"), 700000.0);
    }

    #[test]
    fn format_inr_groups_indian_style() {
        assert_eq!(format_inr(212.4), "₹ 212.40");
        assert_eq!(format_inr(0.0), "₹ 0.00");
        assert_eq!(format_inr(1234.5), "₹ 1,234.50");
        assert_eq!(format_inr(1234567.89), "₹ 12,34,567.89");
        assert_eq!(format_inr(100000.0), "₹ 1,00,000.00");
        assert_eq!(format_inr(-500.0), "-₹ 500.00");
    }

    #[test]
    fn ids_are_unique_within_a_session() {
        let ids: HashSet<String> = (0..100).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
