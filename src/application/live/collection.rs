use crate::application::ports::realtime::ChangeEvent;
use crate::domain::entities::Record;
use crate::domain::value_objects::RecordId;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// The reconciled view of one table: a bulk-fetched snapshot with a stream of
/// change notifications folded in. Always sorted by creation timestamp
/// descending and deduplicated by id. Owned by a single `LiveQuery`; never
/// shared between subscriptions.
#[derive(Debug, Clone)]
pub struct LiveCollection<T> {
    records: Vec<T>,
    page_size: usize,
}

impl<T: Record> Default for LiveCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> LiveCollection<T> {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    /// Replaces the collection with a fresh snapshot. Empty input yields an
    /// empty collection.
    pub fn seed(&mut self, records: Vec<T>) {
        self.records = records;
        self.sort();
    }

    pub fn apply(&mut self, event: ChangeEvent<T>) {
        match event {
            ChangeEvent::Created(record) => self.apply_created(record),
            ChangeEvent::Updated(record) => self.apply_updated(record),
            ChangeEvent::Deleted(id) => self.apply_deleted(&id),
        }
    }

    /// Inserts a newly created row. Any entry already carrying the same id is
    /// dropped first, so duplicate delivery of the same insert is idempotent.
    pub fn apply_created(&mut self, record: T) {
        let id = record.record_id().clone();
        self.records.retain(|existing| *existing.record_id() != id);
        self.records.insert(0, record);
        self.sort();
    }

    /// Replaces the matching row in place. An unknown id is a deliberate
    /// no-op: the row may belong to a page that was never fetched.
    pub fn apply_updated(&mut self, record: T) {
        let id = record.record_id().clone();
        match self
            .records
            .iter_mut()
            .find(|existing| *existing.record_id() == id)
        {
            Some(slot) => {
                *slot = record;
                self.sort();
            }
            None => debug!(id = %id, "update for a row not in the collection, ignoring"),
        }
    }

    /// Removes the matching row; absent ids are a silent no-op.
    pub fn apply_deleted(&mut self, id: &RecordId) {
        self.records.retain(|existing| existing.record_id() != id);
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.iter().any(|record| record.record_id() == id)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.records.len().div_ceil(self.page_size).max(1)
    }

    /// Clamps a requested 1-based page into range, as the view does when the
    /// collection shrinks under it.
    pub fn clamp_page(&self, requested: usize) -> usize {
        requested.max(1).min(self.total_pages())
    }

    /// One page of rows, 1-based. Out-of-range requests are clamped.
    pub fn page(&self, requested: usize) -> &[T] {
        let page = self.clamp_page(requested);
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.records.len());
        &self.records[start..end.max(start)]
    }

    // Stable, so rows with identical timestamps keep their relative order.
    fn sort(&mut self) {
        self.records
            .sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    }
}
