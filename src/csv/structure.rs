//! Intermediate row structure used during CSV import.

use csv::StringRecord;

use super::{CsvConfig, MIN_COLUMNS};
use crate::utils::{is_valid_date, parse_year, today, truncate_chars};
use crate::{PaperRecord, Priority, Rating, Result, Status, TrackerError};

/// Column positions, matching [`super::HEADER`].
mod column {
    pub(super) const TITLE: usize = 0;
    pub(super) const AUTHORS: usize = 1;
    pub(super) const YEAR: usize = 2;
    pub(super) const JOURNAL: usize = 3;
    pub(super) const KEYWORDS: usize = 4;
    pub(super) const STATUS: usize = 5;
    pub(super) const PRIORITY: usize = 6;
    pub(super) const RATING: usize = 7;
    pub(super) const DATE_ADDED: usize = 8;
    pub(super) const KEY_POINTS: usize = 9;
    pub(super) const NOTES: usize = 10;
    pub(super) const CITATION: usize = 11;
    pub(super) const DOI: usize = 12;
    pub(super) const CHAPTER: usize = 13;
}

/// One CSV row with its fields capped in length.
///
/// Free-text fields are kept verbatim; only the coded columns are trimmed
/// when the row becomes a [`PaperRecord`].
#[derive(Debug, Clone)]
pub(crate) struct RawCsvRow {
    pub(crate) fields: Vec<String>,
    /// Line number for error reporting
    pub(crate) line: u64,
}

impl RawCsvRow {
    /// Builds a row from a CSV record that starts on `line`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Parse`] for rows with too few columns.
    pub(crate) fn from_record(record: &StringRecord, line: u64, config: &CsvConfig) -> Result<Self> {
        if record.len() < MIN_COLUMNS {
            return Err(TrackerError::Parse {
                line,
                message: format!(
                    "expected at least {} columns, found {}",
                    MIN_COLUMNS,
                    record.len()
                ),
            });
        }

        let fields = record
            .iter()
            .map(|value| {
                let kept = truncate_chars(value, config.max_field_len);
                if kept.len() < value.len() {
                    tracing::debug!(line, max = config.max_field_len, "truncating long CSV field");
                }
                kept.to_string()
            })
            .collect();

        Ok(Self { fields, line })
    }

    /// Field at the given column, empty when the row is shorter.
    pub(crate) fn get(&self, column: usize) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    fn take(&mut self, column: usize) -> String {
        self.fields
            .get_mut(column)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

impl From<RawCsvRow> for PaperRecord {
    fn from(mut row: RawCsvRow) -> Self {
        let line = row.line;

        let year = parse_year(row.get(column::YEAR)).unwrap_or_else(|e| {
            tracing::warn!(line, error = %e, "dropping implausible year");
            String::new()
        });

        let date_added = match row.get(column::DATE_ADDED).trim() {
            date if is_valid_date(date) => date.to_string(),
            date => {
                if !date.is_empty() {
                    tracing::debug!(line, date, "replacing unparsable date with today");
                }
                today()
            }
        };

        PaperRecord {
            status: Status::coerce(row.get(column::STATUS)),
            priority: Priority::coerce(row.get(column::PRIORITY)),
            rating: Rating::coerce(row.get(column::RATING)),
            year,
            date_added,
            title: row.take(column::TITLE),
            authors: row.take(column::AUTHORS),
            journal: row.take(column::JOURNAL),
            keywords: row.take(column::KEYWORDS),
            key_points: row.take(column::KEY_POINTS),
            notes: row.take(column::NOTES),
            citation: row.take(column::CITATION),
            doi: row.take(column::DOI),
            chapter: row.take(column::CHAPTER),
            ..Default::default()
        }
    }
}

/// Returns `true` if every field of a raw CSV row is either unquoted with no
/// `"` in it, or wrapped in quotes with inner quotes doubled.
///
/// The `csv` reader accepts stray and unterminated quotes and silently
/// merges what follows into the field, so rows are checked before parsing.
pub(crate) fn is_well_quoted(raw: &str) -> bool {
    let mut chars = raw.chars().peekable();
    let mut field_start = true;
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c != '"' {
                continue;
            }
            if chars.peek() == Some(&'"') {
                chars.next();
                continue;
            }
            in_quotes = false;
            match chars.next() {
                None | Some(',') => field_start = true,
                Some(_) => return false,
            }
        } else {
            match c {
                '"' if field_start => {
                    in_quotes = true;
                    field_start = false;
                }
                '"' => return false,
                ',' => field_start = true,
                _ => field_start = false,
            }
        }
    }

    !in_quotes
}
