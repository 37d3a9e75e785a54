//! CSV import and export of the paper collection.
//!
//! The column layout is fixed (see [`HEADER`]). Export quotes every value and
//! doubles embedded quotes; import maps columns by position, so files written
//! by older exports with fewer trailing columns still load.
//!
//! # Example
//!
//! ```
//! use papertrack::PaperRecord;
//! use papertrack::csv::{CsvImporter, export_csv};
//!
//! let papers = vec![PaperRecord {
//!     title: "Deep learning".to_string(),
//!     authors: "LeCun, Y., Bengio, Y., & Hinton, G.".to_string(),
//!     year: "2015".to_string(),
//!     ..Default::default()
//! }];
//!
//! let csv = export_csv(&papers).unwrap();
//! let report = CsvImporter::new().import_str(&csv).unwrap();
//! assert_eq!(report.records[0].title, "Deep learning");
//! ```

mod structure;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::io::{Read, Write};
use std::path::Path;

use crate::utils::today;
use crate::{PaperRecord, Result, TrackerError};
use structure::{RawCsvRow, is_well_quoted};

/// Column titles, in file order.
pub const HEADER: [&str; 14] = [
    "Title",
    "Authors",
    "Year",
    "Journal/Venue",
    "Keywords",
    "Status",
    "Priority",
    "Rating",
    "Date Added",
    "Key Points",
    "Notes",
    "Citation",
    "DOI/URL",
    "Chapter/Topic",
];

/// Rows with fewer columns than this are skipped.
pub(crate) const MIN_COLUMNS: usize = 3;

pub const DEFAULT_MAX_ROWS: usize = 1_000;
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MAX_FIELD_LEN: usize = 10_000;

/// Limits applied to CSV imports.
///
/// # Examples
///
/// ```
/// use papertrack::csv::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_max_rows(50).set_max_field_len(500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    /// Rows read before the import stops
    pub(crate) max_rows: usize,
    /// Largest accepted input, in bytes
    pub(crate) max_bytes: usize,
    /// Longest kept field, in characters; longer fields are truncated
    pub(crate) max_field_len: usize,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a new CSV configuration with default limits
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_bytes: DEFAULT_MAX_BYTES,
            max_field_len: DEFAULT_MAX_FIELD_LEN,
        }
    }

    pub fn set_max_rows(&mut self, max_rows: usize) -> &mut Self {
        self.max_rows = max_rows;
        self
    }

    pub fn set_max_bytes(&mut self, max_bytes: usize) -> &mut Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn set_max_field_len(&mut self, max_field_len: usize) -> &mut Self {
        self.max_field_len = max_field_len;
        self
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn max_field_len(&self) -> usize {
        self.max_field_len
    }
}

/// Prefix of the suggested export file name.
const EXPORT_FILE_PREFIX: &str = "dissertation_papers_";

/// Suggested name for an export made today, e.g. `dissertation_papers_2024-03-01.csv`.
pub fn default_export_file_name() -> String {
    format!("{}{}.csv", EXPORT_FILE_PREFIX, today())
}

/// Writes the collection as CSV, header first.
///
/// The header line is written bare; every value in the data rows is
/// double-quoted. Ratings are written as their number, or empty.
///
/// # Errors
///
/// Returns [`TrackerError::Io`] if the writer fails.
pub fn write_csv<W: Write>(papers: &[PaperRecord], mut out: W) -> Result<()> {
    out.write_all(HEADER.join(",").as_bytes())?;
    out.write_all(b"\n")?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(out);

    for paper in papers {
        let rating = paper.rating.map(|r| r.to_string()).unwrap_or_default();
        writer.write_record([
            paper.title.as_str(),
            paper.authors.as_str(),
            paper.year.as_str(),
            paper.journal.as_str(),
            paper.keywords.as_str(),
            paper.status.as_str(),
            paper.priority.as_str(),
            rating.as_str(),
            paper.date_added.as_str(),
            paper.key_points.as_str(),
            paper.notes.as_str(),
            paper.citation.as_str(),
            paper.doi.as_str(),
            paper.chapter.as_str(),
        ])?;
    }
    writer.flush()?;

    tracing::info!(rows = papers.len(), "exported papers to CSV");
    Ok(())
}

/// Writes the collection as a CSV string.
///
/// # Errors
///
/// Same as [`write_csv`], which does not fail for an in-memory buffer in
/// practice.
pub fn export_csv(papers: &[PaperRecord]) -> Result<String> {
    let mut bytes = Vec::new();
    write_csv(papers, &mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| TrackerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Writes the collection to a CSV file, replacing it if it exists.
pub fn export_csv_file<P: AsRef<Path>>(papers: &[PaperRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "exporting CSV file");
    let file = std::fs::File::create(path)?;
    write_csv(papers, std::io::BufWriter::new(file))
}

/// Outcome of an import: the accepted rows and the rows that were skipped.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Records ready to hand to [`PaperStore::import`](crate::PaperStore::import)
    pub records: Vec<PaperRecord>,
    /// One error per skipped row
    pub skipped: Vec<TrackerError>,
    /// `true` if reading stopped at the row cap
    pub row_limit_reached: bool,
}

/// Reads CSV files written by [`export_csv`] or by hand.
///
/// Malformed rows are skipped and recorded in the [`ImportReport`]; only an
/// unreadable or oversized input aborts the whole import.
#[derive(Debug, Clone, Default)]
pub struct CsvImporter {
    config: CsvConfig,
}

impl CsvImporter {
    /// Creates a new importer with default limits
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CsvConfig::new(),
        }
    }

    /// Creates a new importer with custom limits
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Imports CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if the input exceeds the byte cap.
    pub fn import_str(&self, input: &str) -> Result<ImportReport> {
        if input.len() > self.config.max_bytes {
            return Err(TrackerError::Validation(format!(
                "CSV input is {} bytes, the limit is {}",
                input.len(),
                self.config.max_bytes
            )));
        }

        let mut report = ImportReport::default();
        let mut header_pending = true;
        // Where the current reader starts, as a byte offset and a line number.
        let mut offset = 0;
        let mut first_line = 1;

        'segments: while offset < input.len() {
            let segment = &input[offset..];
            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(segment.as_bytes());
            let mut record = StringRecord::new();
            let mut line = first_line;
            let mut counted = 0;

            loop {
                let start = byte_offset(reader.position().byte());
                match reader.read_record(&mut record) {
                    Ok(true) => {}
                    Ok(false) => break 'segments,
                    Err(e) => {
                        let e = TrackerError::from(e);
                        tracing::warn!(error = %e, "skipping unreadable CSV row");
                        report.skipped.push(e);
                        continue;
                    }
                }
                let end = byte_offset(reader.position().byte()).min(segment.len());

                // Blank lines before the record belong to its span.
                let raw = &segment[start..end];
                let body_start = start + (raw.len() - raw.trim_start_matches(['\r', '\n']).len());
                let body = segment[body_start..end].trim_end_matches(['\r', '\n']);
                line += segment[counted..body_start].matches('\n').count() as u64;
                counted = body_start;

                if header_pending {
                    header_pending = false;
                    continue;
                }

                if report.records.len() >= self.config.max_rows {
                    tracing::warn!(max_rows = self.config.max_rows, "CSV row limit reached, ignoring the rest");
                    report.row_limit_reached = true;
                    break 'segments;
                }

                if !is_well_quoted(body) {
                    let e = TrackerError::Parse {
                        line,
                        message: "unbalanced quotes".to_string(),
                    };
                    tracing::warn!(error = %e, "skipping CSV row");
                    report.skipped.push(e);

                    // An unterminated quote swallows the lines after it, so
                    // reading resumes on the line after the broken one.
                    if let Some(newline) = body.find('\n') {
                        offset += body_start + newline + 1;
                        first_line = line + 1;
                        continue 'segments;
                    }
                    continue;
                }

                match RawCsvRow::from_record(&record, line, &self.config) {
                    Ok(row) => report.records.push(row.into()),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping CSV row");
                        report.skipped.push(e);
                    }
                }
            }
        }

        tracing::info!(
            imported = report.records.len(),
            skipped = report.skipped.len(),
            "read CSV"
        );
        Ok(report)
    }

    /// Imports CSV from a reader, enforcing the byte cap while reading.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Io`] if reading fails or the data is not
    /// UTF-8, and [`TrackerError::Validation`] if it exceeds the byte cap.
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<ImportReport> {
        let limit = u64::try_from(self.config.max_bytes)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        let mut bytes = Vec::new();
        reader.take(limit).read_to_end(&mut bytes)?;
        if bytes.len() > self.config.max_bytes {
            return Err(TrackerError::Validation(format!(
                "CSV input exceeds the limit of {} bytes",
                self.config.max_bytes
            )));
        }
        let input = String::from_utf8(bytes)
            .map_err(|e| TrackerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        self.import_str(&input)
    }

    /// Imports a CSV file.
    ///
    /// # Errors
    ///
    /// Same as [`CsvImporter::import_reader`].
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "importing CSV file");
        let file = std::fs::File::open(path)?;
        self.import_reader(std::io::BufReader::new(file))
    }
}

fn byte_offset(byte: u64) -> usize {
    usize::try_from(byte).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Priority, Rating, Status};
    use pretty_assertions::assert_eq;

    fn sample() -> PaperRecord {
        PaperRecord {
            title: "Attention Is All You Need".to_string(),
            authors: "Vaswani, A., Shazeer, N., & Parmar, N.".to_string(),
            year: "2017".to_string(),
            journal: "Advances in Neural Information Processing Systems".to_string(),
            keywords: "transformer, attention".to_string(),
            status: Status::Read,
            priority: Priority::High,
            rating: Rating::new(5),
            date_added: "2024-01-15".to_string(),
            key_points: "Introduced the \"Transformer\"".to_string(),
            notes: "Chapter 2,\nline two".to_string(),
            citation: "Vaswani, A. (2017). Attention".to_string(),
            doi: "https://arxiv.org/abs/1706.03762".to_string(),
            chapter: "Chapter 2: Literature Review".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_layout() {
        let csv = export_csv(&[sample()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(HEADER.join(",").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Attention Is All You Need\",\"Vaswani, A., Shazeer, N., & Parmar, N.\",\"2017\""));
        assert!(csv.contains("\"Introduced the \"\"Transformer\"\"\""));
    }

    #[test]
    fn test_round_trip_preserves_displayed_fields() {
        let mut second = sample();
        second.title = "Second".to_string();
        second.rating = None;
        second.status = Status::Skimmed;
        let papers = vec![sample(), second];

        let csv = export_csv(&papers).unwrap();
        let report = CsvImporter::new().import_str(&csv).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.records, papers);
    }

    #[test]
    fn test_invalid_enums_are_coerced() {
        let input = "\
Title,Authors,Year,Journal/Venue,Keywords,Status,Priority,Rating
\"A\",\"Smith, J.\",2020,\"J\",\"k\",finished,urgent,11";
        let report = CsvImporter::new().import_str(input).unwrap();
        let record = &report.records[0];
        assert_eq!(record.status, Status::ToRead);
        assert_eq!(record.priority, Priority::Medium);
        assert_eq!(record.rating, None);
    }

    #[test]
    fn test_short_rows_are_skipped_and_reported() {
        let input = "\
Title,Authors,Year
only,two

\"Kept\",\"Doe, A.\",1999
";
        let report = CsvImporter::new().import_str(input).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "Kept");
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], TrackerError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_stray_quote_row_is_skipped() {
        let input = "\
Title,Authors,Year
Broken \"title\",Smith,2020
Second,\"Doe, A.\",2021
Third,\"Roe, R.\",2022
";
        let report = CsvImporter::new().import_str(input).unwrap();
        let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Second", "Third"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], TrackerError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_quote_does_not_swallow_following_rows() {
        let input = "\
Title,Authors,Year
\"Broken title,Smith,2020
Second,\"Doe, A.\",2021
Third,\"Roe, R.\",2022
";
        let report = CsvImporter::new().import_str(input).unwrap();
        let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Second", "Third"]);
        assert_eq!(report.records[1].authors, "Roe, R.");
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], TrackerError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_round_trip_keeps_surrounding_whitespace() {
        let mut paper = sample();
        paper.key_points = "  - point one\n  - point two\n".to_string();
        paper.notes = "\tindented ".to_string();

        let csv = export_csv(std::slice::from_ref(&paper)).unwrap();
        let report = CsvImporter::new().import_str(&csv).unwrap();
        assert_eq!(report.records, vec![paper]);
    }

    #[test]
    fn test_row_cap() {
        let mut input = HEADER.join(",");
        for i in 0..5 {
            input.push_str(&format!("\n\"Paper {}\",\"A, B.\",2001", i));
        }
        let mut config = CsvConfig::new();
        config.set_max_rows(3);

        let report = CsvImporter::new().with_config(config).import_str(&input).unwrap();
        assert_eq!(report.records.len(), 3);
        assert!(report.row_limit_reached);
    }

    #[test]
    fn test_byte_cap_aborts_import() {
        let mut config = CsvConfig::new();
        config.set_max_bytes(10);
        let importer = CsvImporter::new().with_config(config);

        let result = importer.import_str("Title,Authors,Year\nA,B,2001");
        assert!(result.unwrap_err().is_validation());

        let result = importer.import_reader("Title,Authors,Year\nA,B,2001".as_bytes());
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = CsvImporter::new().import_file("/nonexistent/papers.csv");
        assert!(matches!(result, Err(TrackerError::Io(_))));
    }

    #[test]
    fn test_write_csv_matches_export() {
        let papers = vec![sample()];
        let mut bytes = Vec::new();
        write_csv(&papers, &mut bytes).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), export_csv(&papers).unwrap());
    }

    #[test]
    fn test_export_file_round_trip() {
        let path = std::env::temp_dir().join(format!("papertrack-export-{}.csv", std::process::id()));
        let papers = vec![sample()];

        export_csv_file(&papers, &path).unwrap();
        let report = CsvImporter::new().import_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report.unwrap().records, papers);
    }

    #[test]
    fn test_default_export_file_name() {
        let name = default_export_file_name();
        assert_eq!(name, format!("dissertation_papers_{}.csv", today()));
        assert!(crate::utils::is_valid_date(&name["dissertation_papers_".len()..name.len() - 4]));
    }
}
