//! The in-memory paper collection.
//!
//! [`PaperStore`] owns the records and the id counter. All mutations go
//! through it so the collection invariants hold after every call:
//!
//! - ids are unique and never reused, not even after [`PaperStore::clear`]
//! - status, priority and rating always hold values from their domains
//! - the citation matches title, authors, year and journal right after any
//!   of them is edited
//!
//! Each mutation either applies completely or returns an error without
//! changing anything. Subscribers are notified after every applied change.
//!
//! # Example
//!
//! ```
//! use papertrack::{PaperField, PaperStore, Status};
//!
//! let mut store = PaperStore::new();
//! let id = store.add_blank();
//! store.update(id, PaperField::Title, "Deep learning").unwrap();
//! store.update(id, PaperField::Authors, "LeCun, Y., Bengio, Y., Hinton, G.").unwrap();
//! store.update(id, PaperField::Status, "finished").unwrap();
//!
//! let paper = store.get(id).unwrap();
//! assert_eq!(paper.status, Status::ToRead);
//! assert_eq!(paper.citation, "LeCun, Y., Bengio, Y., & Hinton, G. (n.d.). Deep learning");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::citation::format_citation;
use crate::extract::KNOWN_PAPERS;
use crate::utils::{is_valid_date, parse_year, today};
use crate::{PaperId, PaperInfo, PaperRecord, Priority, Rating, Result, Status, TrackerError};

const SAMPLE_NOTES: &str = "Seminal paper for understanding modern language models, highly relevant to Chapter 2. \
This architecture became the foundation for GPT, BERT, and other transformer-based models.";
const SAMPLE_CHAPTER: &str = "Chapter 2: Literature Review";

/// An editable field of a [`PaperRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperField {
    Title,
    Authors,
    Year,
    Journal,
    Keywords,
    Status,
    Priority,
    Rating,
    DateAdded,
    KeyPoints,
    Notes,
    Citation,
    Doi,
    Chapter,
    Volume,
    Issue,
    Pages,
}

impl PaperField {
    pub const ALL: [PaperField; 17] = [
        PaperField::Title,
        PaperField::Authors,
        PaperField::Year,
        PaperField::Journal,
        PaperField::Keywords,
        PaperField::Status,
        PaperField::Priority,
        PaperField::Rating,
        PaperField::DateAdded,
        PaperField::KeyPoints,
        PaperField::Notes,
        PaperField::Citation,
        PaperField::Doi,
        PaperField::Chapter,
        PaperField::Volume,
        PaperField::Issue,
        PaperField::Pages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperField::Title => "title",
            PaperField::Authors => "authors",
            PaperField::Year => "year",
            PaperField::Journal => "journal",
            PaperField::Keywords => "keywords",
            PaperField::Status => "status",
            PaperField::Priority => "priority",
            PaperField::Rating => "rating",
            PaperField::DateAdded => "dateAdded",
            PaperField::KeyPoints => "keyPoints",
            PaperField::Notes => "notes",
            PaperField::Citation => "citation",
            PaperField::Doi => "doi",
            PaperField::Chapter => "chapter",
            PaperField::Volume => "volume",
            PaperField::Issue => "issue",
            PaperField::Pages => "pages",
        }
    }

    /// Whether editing this field regenerates the citation.
    pub fn drives_citation(&self) -> bool {
        matches!(
            self,
            PaperField::Title | PaperField::Authors | PaperField::Year | PaperField::Journal
        )
    }
}

impl FromStr for PaperField {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        PaperField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| TrackerError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for PaperField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change applied to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added(PaperId),
    Updated { id: PaperId, field: PaperField },
    Deleted(PaperId),
    Cleared,
    Imported(Vec<PaperId>),
}

/// Reading progress counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub read: usize,
    pub reading: usize,
    pub to_read: usize,
    pub skimmed: usize,
}

type Listener = Box<dyn FnMut(&StoreEvent, &[PaperRecord])>;

/// Owns the paper collection and the next-id counter.
pub struct PaperStore {
    papers: Vec<PaperRecord>,
    next_id: u64,
    listeners: Vec<Listener>,
}

impl fmt::Debug for PaperStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaperStore")
            .field("papers", &self.papers)
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for PaperStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            papers: Vec::new(),
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    /// Creates a store holding one read, highly rated example paper.
    #[must_use]
    pub fn with_sample_data() -> Self {
        let mut store = Self::new();
        store.add_sample_paper();
        store
    }

    /// Registers a callback invoked after every applied change with the event
    /// and the current collection.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&StoreEvent, &[PaperRecord]) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: StoreEvent) {
        for listener in &mut self.listeners {
            listener(&event, &self.papers);
        }
    }

    fn allocate_id(&mut self) -> PaperId {
        let id = PaperId(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: PaperId) -> Result<usize> {
        self.papers
            .iter()
            .position(|paper| paper.id == id)
            .ok_or(TrackerError::NotFound(id))
    }

    /// Brings a record into the collection's domain and gives it a fresh id.
    fn admit(&mut self, mut record: PaperRecord) -> PaperId {
        record.id = self.allocate_id();
        if let Err(e) = parse_year(&record.year) {
            tracing::warn!(id = %record.id, error = %e, "dropping implausible year");
            record.year.clear();
        } else {
            record.year = record.year.trim().to_string();
        }
        if !is_valid_date(&record.date_added) {
            record.date_added = today();
        }
        let id = record.id;
        self.papers.push(record);
        id
    }

    /// Adds an empty paper dated today.
    pub fn add_blank(&mut self) -> PaperId {
        let id = self.admit(PaperRecord::default());
        tracing::info!(%id, "added blank paper");
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Adds the example paper "Attention Is All You Need", marked as read.
    pub fn add_sample_paper(&mut self) -> PaperId {
        let info = KNOWN_PAPERS[0].to_info();
        let mut record = PaperRecord {
            title: info.title,
            authors: info.authors,
            year: info.year,
            journal: info.journal,
            keywords: info.keywords,
            status: Status::Read,
            priority: Priority::High,
            rating: Rating::new(5),
            key_points: info.abstract_text,
            notes: SAMPLE_NOTES.to_string(),
            doi: info.url,
            chapter: SAMPLE_CHAPTER.to_string(),
            volume: "30".to_string(),
            ..Default::default()
        };
        record.citation = format_citation(&record);

        let id = self.admit(record);
        tracing::info!(%id, "added sample paper");
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Adds a confirmed extraction result and generates its citation.
    ///
    /// The abstract becomes the key points, the relevance becomes the notes
    /// and the URL becomes the DOI/URL field.
    pub fn add_from_info(&mut self, info: PaperInfo) -> PaperId {
        let mut record = PaperRecord {
            title: info.title,
            authors: info.authors,
            year: info.year,
            journal: info.journal,
            keywords: info.keywords,
            key_points: info.abstract_text,
            notes: info.relevance,
            doi: info.url,
            ..Default::default()
        };
        record.citation = format_citation(&record);

        let id = self.admit(record);
        if let Some(paper) = self.papers.last_mut() {
            // The year may have been dropped while admitting the record.
            paper.citation = format_citation(paper);
        }
        tracing::info!(%id, "added paper from extracted data");
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Adds a complete record as-is, keeping its citation. The record's id is
    /// replaced with a fresh one.
    pub fn add(&mut self, record: PaperRecord) -> PaperId {
        let id = self.admit(record);
        tracing::info!(%id, "added paper");
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Appends a batch of records in one step, e.g. from a CSV import.
    pub fn import(&mut self, records: Vec<PaperRecord>) -> Vec<PaperId> {
        let ids: Vec<PaperId> = records.into_iter().map(|r| self.admit(r)).collect();
        tracing::info!(count = ids.len(), "imported papers");
        self.notify(StoreEvent::Imported(ids.clone()));
        ids
    }

    /// Edits one field of a paper.
    ///
    /// Status, priority and rating outside their domains are coerced to their
    /// defaults. Editing title, authors, year or journal regenerates the
    /// citation; editing the citation directly overrides it until then.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown id and
    /// [`TrackerError::Validation`] for an implausible year or a malformed
    /// date. Nothing changes in either case.
    pub fn update(&mut self, id: PaperId, field: PaperField, value: &str) -> Result<()> {
        let index = self.position(id)?;

        // Validate before touching the record.
        let year = match field {
            PaperField::Year => Some(parse_year(value)?),
            _ => None,
        };
        if field == PaperField::DateAdded && !is_valid_date(value) {
            return Err(TrackerError::Validation(format!(
                "date '{}' is not in YYYY-MM-DD form",
                value
            )));
        }

        let paper = &mut self.papers[index];
        match field {
            PaperField::Title => paper.title = value.to_string(),
            PaperField::Authors => paper.authors = value.to_string(),
            PaperField::Year => paper.year = year.unwrap_or_default(),
            PaperField::Journal => paper.journal = value.to_string(),
            PaperField::Keywords => paper.keywords = value.to_string(),
            PaperField::Status => paper.status = Status::coerce(value),
            PaperField::Priority => paper.priority = Priority::coerce(value),
            PaperField::Rating => paper.rating = Rating::coerce(value),
            PaperField::DateAdded => paper.date_added = value.trim().to_string(),
            PaperField::KeyPoints => paper.key_points = value.to_string(),
            PaperField::Notes => paper.notes = value.to_string(),
            PaperField::Citation => paper.citation = value.to_string(),
            PaperField::Doi => paper.doi = value.trim().to_string(),
            PaperField::Chapter => paper.chapter = value.to_string(),
            PaperField::Volume => paper.volume = value.trim().to_string(),
            PaperField::Issue => paper.issue = value.trim().to_string(),
            PaperField::Pages => paper.pages = value.trim().to_string(),
        }

        if field.drives_citation() {
            paper.citation = format_citation(paper);
        }

        tracing::debug!(%id, %field, "updated paper");
        self.notify(StoreEvent::Updated { id, field });
        Ok(())
    }

    /// Edits a field given by its name (`title`, `dateAdded`, `keyPoints`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::UnknownField`] for an unknown name, otherwise
    /// the same errors as [`PaperStore::update`].
    pub fn update_by_name(&mut self, id: PaperId, field: &str, value: &str) -> Result<()> {
        let field = field.parse()?;
        self.update(id, field, value)
    }

    /// Recomputes a paper's citation, discarding any manual override.
    pub fn regenerate_citation(&mut self, id: PaperId) -> Result<&str> {
        let index = self.position(id)?;
        let paper = &mut self.papers[index];
        paper.citation = format_citation(paper);
        self.notify(StoreEvent::Updated {
            id,
            field: PaperField::Citation,
        });
        Ok(&self.papers[index].citation)
    }

    /// Removes a paper and returns it.
    pub fn delete(&mut self, id: PaperId) -> Result<PaperRecord> {
        let index = self.position(id)?;
        let removed = self.papers.remove(index);
        tracing::info!(%id, title = %removed.title, "deleted paper");
        self.notify(StoreEvent::Deleted(id));
        Ok(removed)
    }

    /// Removes every paper. Ids handed out before stay retired.
    pub fn clear(&mut self) {
        let count = self.papers.len();
        self.papers.clear();
        tracing::info!(count, "cleared all papers");
        self.notify(StoreEvent::Cleared);
    }

    pub fn get(&self, id: PaperId) -> Option<&PaperRecord> {
        self.papers.iter().find(|paper| paper.id == id)
    }

    /// The papers in insertion order.
    pub fn papers(&self) -> &[PaperRecord] {
        &self.papers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaperRecord> {
        self.papers.iter()
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        self.papers.iter().fold(
            StoreStats {
                total: self.papers.len(),
                ..Default::default()
            },
            |mut stats, paper| {
                match paper.status {
                    Status::Read => stats.read += 1,
                    Status::Reading => stats.reading += 1,
                    Status::ToRead => stats.to_read += 1,
                    Status::Skimmed => stats.skimmed += 1,
                }
                stats
            },
        )
    }
}

impl<'a> IntoIterator for &'a PaperStore {
    type Item = &'a PaperRecord;
    type IntoIter = std::slice::Iter<'a, PaperRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.papers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn info() -> PaperInfo {
        PaperInfo {
            title: "Attention Is All You Need".to_string(),
            authors: "Vaswani, A., Shazeer, N.".to_string(),
            year: "2017".to_string(),
            journal: "arXiv preprint".to_string(),
            keywords: "transformer".to_string(),
            abstract_text: "Self-attention only.".to_string(),
            url: "https://arxiv.org/abs/1706.03762".to_string(),
            relevance: "Background chapter.".to_string(),
        }
    }

    #[test]
    fn test_with_sample_data() {
        let store = PaperStore::with_sample_data();
        assert_eq!(store.len(), 1);

        let paper = &store.papers()[0];
        assert_eq!(paper.id, PaperId(1));
        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.status, Status::Read);
        assert_eq!(paper.priority, Priority::High);
        assert_eq!(paper.rating, Rating::new(5));
        assert_eq!(paper.chapter, "Chapter 2: Literature Review");
        assert!(is_valid_date(&paper.date_added));
        assert!(paper.citation.contains(
            "(2017). Attention Is All You Need. Advances in Neural Information Processing Systems, 30."
        ));
        assert_eq!(store.stats().read, 1);
    }

    #[test]
    fn test_add_sample_paper_notifies() {
        let mut store = PaperStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&events);
        store.subscribe(move |event, _| seen.borrow_mut().push(event.clone()));

        store.add_blank();
        let id = store.add_sample_paper();
        assert_eq!(id, PaperId(2));
        assert_eq!(events.borrow().last(), Some(&StoreEvent::Added(id)));
    }

    #[test]
    fn test_add_blank_defaults() {
        let mut store = PaperStore::new();
        let id = store.add_blank();
        let paper = store.get(id).unwrap();
        assert_eq!(paper.id, PaperId(1));
        assert_eq!(paper.status, Status::ToRead);
        assert_eq!(paper.priority, Priority::Medium);
        assert_eq!(paper.rating, None);
        assert!(is_valid_date(&paper.date_added));
        assert_eq!(paper.citation, "");
    }

    #[test]
    fn test_add_from_info_maps_fields_and_formats_citation() {
        let mut store = PaperStore::new();
        let id = store.add_from_info(info());
        let paper = store.get(id).unwrap();
        assert_eq!(paper.key_points, "Self-attention only.");
        assert_eq!(paper.notes, "Background chapter.");
        assert_eq!(paper.doi, "https://arxiv.org/abs/1706.03762");
        assert!(paper.citation.contains("arXiv:1706.03762"));
        assert!(paper.citation.starts_with("Vaswani, A., & Shazeer, N. (2017)."));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = PaperStore::new();
        let first = store.add_blank();
        let second = store.add_blank();
        store.delete(second).unwrap();
        let third = store.add_blank();
        store.clear();
        let fourth = store.add_blank();
        assert_eq!(
            [first, second, third, fourth],
            [PaperId(1), PaperId(2), PaperId(3), PaperId(4)]
        );
    }

    #[test]
    fn test_driving_field_edit_regenerates_citation() {
        let mut store = PaperStore::new();
        let id = store.add_from_info(info());
        store.update(id, PaperField::Citation, "my own citation").unwrap();
        store.update(id, PaperField::Notes, "still mine").unwrap();
        assert_eq!(store.get(id).unwrap().citation, "my own citation");

        store.update(id, PaperField::Year, "2018").unwrap();
        let paper = store.get(id).unwrap();
        assert!(paper.citation.contains("(2018)"));

        store.update(id, PaperField::Authors, "").unwrap();
        assert_eq!(store.get(id).unwrap().citation, "");
    }

    #[test]
    fn test_enum_fields_are_coerced() {
        let mut store = PaperStore::new();
        let id = store.add_blank();
        store.update(id, PaperField::Status, "read").unwrap();
        store.update(id, PaperField::Priority, "critical").unwrap();
        store.update(id, PaperField::Rating, "9").unwrap();
        let paper = store.get(id).unwrap();
        assert_eq!(paper.status, Status::Read);
        assert_eq!(paper.priority, Priority::Medium);
        assert_eq!(paper.rating, None);

        store.update(id, PaperField::Status, "bogus").unwrap();
        store.update(id, PaperField::Rating, "4").unwrap();
        let paper = store.get(id).unwrap();
        assert_eq!(paper.status, Status::ToRead);
        assert_eq!(paper.rating, Rating::new(4));
    }

    #[test]
    fn test_invalid_edits_change_nothing() {
        let mut store = PaperStore::new();
        let id = store.add_from_info(info());
        let before = store.get(id).unwrap().clone();

        assert!(store.update(id, PaperField::Year, "17").unwrap_err().is_validation());
        assert!(store.update(id, PaperField::DateAdded, "tomorrow").is_err());
        assert!(matches!(
            store.update(PaperId(99), PaperField::Title, "x"),
            Err(TrackerError::NotFound(PaperId(99)))
        ));
        assert!(matches!(
            store.update_by_name(id, "colour", "red"),
            Err(TrackerError::UnknownField(_))
        ));

        assert_eq!(store.get(id).unwrap(), &before);
    }

    #[test]
    fn test_update_by_name() {
        let mut store = PaperStore::new();
        let id = store.add_blank();
        store.update_by_name(id, "keyPoints", "one, two").unwrap();
        store.update_by_name(id, "dateAdded", "2024-03-01").unwrap();
        let paper = store.get(id).unwrap();
        assert_eq!(paper.key_points, "one, two");
        assert_eq!(paper.date_added, "2024-03-01");
    }

    #[test]
    fn test_regenerate_citation_discards_override() {
        let mut store = PaperStore::new();
        let id = store.add_from_info(info());
        let generated = store.get(id).unwrap().citation.clone();
        store.update(id, PaperField::Citation, "override").unwrap();
        assert_eq!(store.regenerate_citation(id).unwrap(), generated);
    }

    #[test]
    fn test_import_assigns_fresh_ids_and_normalizes() {
        let mut store = PaperStore::new();
        store.add_blank();
        let records = vec![
            PaperRecord {
                id: PaperId(1),
                title: "A".to_string(),
                year: "99999".to_string(),
                citation: "kept".to_string(),
                ..Default::default()
            },
            PaperRecord {
                title: "B".to_string(),
                date_added: "2020-05-05".to_string(),
                ..Default::default()
            },
        ];
        let ids = store.import(records);
        assert_eq!(ids, vec![PaperId(2), PaperId(3)]);
        let a = store.get(PaperId(2)).unwrap();
        assert_eq!(a.year, "");
        assert_eq!(a.citation, "kept");
        assert!(is_valid_date(&a.date_added));
        assert_eq!(store.get(PaperId(3)).unwrap().date_added, "2020-05-05");
    }

    #[test]
    fn test_stats() {
        let mut store = PaperStore::new();
        for status in ["read", "read", "reading", "to-read", "skimmed"] {
            let id = store.add_blank();
            store.update(id, PaperField::Status, status).unwrap();
        }
        assert_eq!(
            store.stats(),
            StoreStats {
                total: 5,
                read: 2,
                reading: 1,
                to_read: 1,
                skimmed: 1,
            }
        );
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut store = PaperStore::new();
        store.subscribe(move |event, papers| {
            sink.borrow_mut().push((event.clone(), papers.len()));
        });

        let id = store.add_blank();
        store.update(id, PaperField::Title, "T").unwrap();
        let _ = store.update(id, PaperField::Year, "bad");
        store.delete(id).unwrap();
        store.clear();

        assert_eq!(
            *events.borrow(),
            vec![
                (StoreEvent::Added(id), 1),
                (
                    StoreEvent::Updated {
                        id,
                        field: PaperField::Title
                    },
                    1
                ),
                (StoreEvent::Deleted(id), 0),
                (StoreEvent::Cleared, 0),
            ]
        );
    }
}
