// CSV rate-card parsing: raw text in, classified entry drafts out.
use crate::model::{EntryDraft, ParserError};
use crate::parser::classify::{self, RawRow};
use tracing::warn;

/// Row failures are logged individually up to this count per file; counting
/// continues past it.
const ROW_WARN_LIMIT: usize = 10;

pub trait Parser {
    /// Parses a master rate card into entry drafts, counting rows that have
    /// no resolvable name or price.
    fn parse_rate_card(&self, text: &str, source_file: &str) -> Result<ParsedRateCard, ParserError>;

    /// Parses a no-rebate list into one normalized identifier set per row.
    fn parse_identifier_rows(&self, text: &str) -> Result<Vec<Vec<String>>, ParserError>;
}

pub struct ParsedRateCard {
    pub drafts: Vec<EntryDraft>,
    pub failed_rows: usize,
}

pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }

    /// Header-delimited CSV text to ordered rows. Ragged records are padded
    /// against the header, blank lines are skipped, a leading BOM is dropped.
    fn read_rows(text: &str) -> Result<Vec<RawRow>, ParserError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let row: RawRow = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}

impl Parser for CsvParser {
    fn parse_rate_card(&self, text: &str, source_file: &str) -> Result<ParsedRateCard, ParserError> {
        let rows = Self::read_rows(text)?;
        let mut drafts = Vec::new();
        let mut failed_rows = 0;
        for (row_num, row) in rows.iter().enumerate() {
            match classify::build_draft(row, source_file) {
                Some(draft) => drafts.push(draft),
                None => {
                    failed_rows += 1;
                    if failed_rows < ROW_WARN_LIMIT {
                        // +2: one for the header line, one for 1-based numbering
                        warn!("{}: row {} failed, missing name or valid price", source_file, row_num + 2);
                    }
                }
            }
        }
        Ok(ParsedRateCard { drafts, failed_rows })
    }

    fn parse_identifier_rows(&self, text: &str) -> Result<Vec<Vec<String>>, ParserError> {
        let rows = Self::read_rows(text)?;
        Ok(rows.iter().map(classify::identifier_set).collect())
    }
}
