// Parser module: header classification + CSV rate-card parsing.

pub mod classify;
pub mod rate_card;

pub use rate_card::{CsvParser, ParsedRateCard, Parser};
