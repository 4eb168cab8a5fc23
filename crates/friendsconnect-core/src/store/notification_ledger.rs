use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::constants::LEDGER_CAPACITY;
use crate::models::{NotificationKind, NotificationRecord};

/// The notification currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub record_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub shown_at: Instant,
    /// Zero means the toast stays until hidden explicitly
    pub duration: Duration,
}

impl Toast {
    fn for_record(record: &NotificationRecord, duration: Duration) -> Self {
        Self {
            record_id: record.id.clone(),
            title: record.title.clone(),
            message: record.message.clone(),
            kind: record.kind,
            shown_at: Instant::now(),
            duration,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        if self.duration.is_zero() {
            None
        } else {
            Some(self.shown_at + self.duration)
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.deadline().map(|deadline| now >= deadline).unwrap_or(false)
    }
}

/// Ordered, capped notification history.
///
/// Front of the deque is the most recently inserted record. Eviction always
/// drops from the back, so insertion order decides what goes, never
/// `created_at`.
#[derive(Debug)]
pub struct NotificationLedger {
    records: VecDeque<NotificationRecord>,
    capacity: usize,
    toast: Option<Toast>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            toast: None,
        }
    }

    /// Rebuild from a persisted snapshot (most recent first). Anything past
    /// the capacity is the oldest and is dropped.
    pub fn from_records(records: Vec<NotificationRecord>, capacity: usize) -> Self {
        let mut ledger = Self::with_capacity(capacity);
        ledger.records = records.into_iter().take(ledger.capacity).collect();
        ledger
    }

    // ===== Mutations =====

    /// Create a record, show it as the current toast, and append it.
    pub fn record(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        auto_hide: Duration,
    ) -> NotificationRecord {
        let record = NotificationRecord::new(title, message, kind);
        self.toast = Some(Toast::for_record(&record, auto_hide));
        self.insert(record.clone());
        record
    }

    /// Append a fully formed record. Returns the evicted record, if any.
    pub fn insert(&mut self, record: NotificationRecord) -> Option<NotificationRecord> {
        self.records.push_front(record);
        if self.records.len() > self.capacity {
            self.records.pop_back()
        } else {
            None
        }
    }

    /// Flip one record to read. No-op when absent or already read.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) if !record.read => {
                record.read = true;
                true
            }
            _ => false,
        }
    }

    /// Returns how many records changed.
    pub fn mark_all_as_read(&mut self) -> usize {
        let mut changed = 0;
        for record in self.records.iter_mut().filter(|r| !r.read) {
            record.read = true;
            changed += 1;
        }
        changed
    }

    /// Returns how many records were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.toast = None;
        removed
    }

    // ===== Toast =====

    pub fn current_toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn hide_toast(&mut self) -> Option<Toast> {
        self.toast.take()
    }

    /// Hide the toast if its deadline has passed. Returns whether it was hidden.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|t| t.is_expired_at(now)) {
            self.toast = None;
            true
        } else {
            false
        }
    }

    // ===== Queries =====

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// All records, most recent first
    pub fn records(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    pub fn recent(&self, n: usize) -> Vec<&NotificationRecord> {
        self.records.iter().take(n).collect()
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&NotificationRecord>
    where
        P: Fn(&NotificationRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(*r)).collect()
    }

    pub fn unread(&self) -> Vec<&NotificationRecord> {
        self.filter(NotificationRecord::is_unread)
    }

    pub fn mentions(&self) -> Vec<&NotificationRecord> {
        self.filter(|r| r.kind == NotificationKind::Mention)
    }

    /// Snapshot for persistence, most recent first
    pub fn snapshot(&self) -> Vec<NotificationRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for NotificationLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn info(id: &str) -> NotificationRecord {
        NotificationRecord::new("title", "message", NotificationKind::Info).with_id(id)
    }

    #[test]
    fn test_record_success_does_not_count() {
        let mut ledger = NotificationLedger::new();
        ledger.record("Saved", "ok", NotificationKind::Success, Duration::ZERO);
        ledger.record("Oops", "failed", NotificationKind::Error, Duration::ZERO);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.unread_count(), 1);
    }

    #[test]
    fn test_most_recent_first() {
        let mut ledger = NotificationLedger::new();
        ledger.insert(info("a"));
        ledger.insert(info("b"));
        let ids: Vec<&str> = ledger.records().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_eviction_is_by_insertion_not_timestamp() {
        let mut ledger = NotificationLedger::with_capacity(3);
        let now = Utc::now();
        // First-inserted record carries the newest timestamp
        ledger.insert(info("first").with_created_at(now + ChronoDuration::days(365)));
        ledger.insert(info("second").with_created_at(now - ChronoDuration::days(365)));
        ledger.insert(info("third").with_created_at(now));

        let evicted = ledger.insert(info("fourth")).expect("should evict");
        assert_eq!(evicted.id, "first");
        assert_eq!(ledger.len(), 3);
        assert!(ledger.get("second").is_some());
    }

    #[test]
    fn test_mark_as_read_is_noop_when_absent_or_read() {
        let mut ledger = NotificationLedger::new();
        ledger.insert(info("a"));
        assert!(ledger.mark_as_read("a"));
        assert!(!ledger.mark_as_read("a"));
        assert!(!ledger.mark_as_read("missing"));
        assert_eq!(ledger.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_as_read_is_idempotent() {
        let mut ledger = NotificationLedger::new();
        for id in ["a", "b", "c"] {
            ledger.insert(info(id));
        }
        assert_eq!(ledger.mark_all_as_read(), 3);
        let once = ledger.snapshot();
        assert_eq!(ledger.mark_all_as_read(), 0);
        assert_eq!(ledger.snapshot(), once);
    }

    #[test]
    fn test_clear_all() {
        let mut ledger = NotificationLedger::new();
        ledger.record("t", "m", NotificationKind::Info, Duration::from_secs(4));
        assert_eq!(ledger.clear_all(), 1);
        assert!(ledger.is_empty());
        assert_eq!(ledger.unread_count(), 0);
        assert!(ledger.current_toast().is_none());
    }

    #[test]
    fn test_unread_count_matches_flags_under_mixed_operations() {
        let mut ledger = NotificationLedger::with_capacity(10);
        let kinds = [
            NotificationKind::Info,
            NotificationKind::Success,
            NotificationKind::Like,
            NotificationKind::Mention,
        ];
        for i in 0..40 {
            let kind = kinds[i % kinds.len()];
            ledger.insert(NotificationRecord::new("t", "m", kind).with_id(i.to_string()));
            if i % 3 == 0 {
                ledger.mark_as_read(&(i - i % 6).to_string());
            }
            if i == 25 {
                ledger.mark_all_as_read();
            }
            if i == 33 {
                ledger.clear_all();
            }
            let expected = ledger.records().filter(|r| !r.read).count();
            assert_eq!(ledger.unread_count(), expected);
            assert!(ledger.len() <= 10);
        }
    }

    #[test]
    fn test_from_records_truncates_oldest() {
        let records: Vec<_> = (0..5).map(|i| info(&i.to_string())).collect();
        let ledger = NotificationLedger::from_records(records, 3);
        let ids: Vec<&str> = ledger.records().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_filters() {
        let mut ledger = NotificationLedger::new();
        ledger.insert(NotificationRecord::new("t", "m", NotificationKind::Mention).with_id("m1"));
        ledger.insert(info("i1"));
        ledger.mark_as_read("i1");
        assert_eq!(ledger.mentions().len(), 1);
        assert_eq!(ledger.unread().len(), 1);
        assert_eq!(ledger.recent(1)[0].id, "i1");
        assert_eq!(ledger.filter(|r| r.id.starts_with('i')).len(), 1);
    }

    #[test]
    fn test_toast_expires_after_duration() {
        let mut ledger = NotificationLedger::new();
        let record = ledger.record("t", "m", NotificationKind::Info, Duration::from_secs(4));
        let toast = ledger.current_toast().cloned().unwrap();
        assert_eq!(toast.record_id, record.id);

        assert!(!ledger.expire_toast(toast.shown_at + Duration::from_secs(3)));
        assert!(ledger.current_toast().is_some());
        assert!(ledger.expire_toast(toast.shown_at + Duration::from_secs(4)));
        assert!(ledger.current_toast().is_none());
        // Hiding the toast never touches the history
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.unread_count(), 1);
    }

    #[test]
    fn test_zero_duration_toast_never_expires() {
        let mut ledger = NotificationLedger::new();
        ledger.record("t", "m", NotificationKind::Info, Duration::ZERO);
        let shown_at = ledger.current_toast().unwrap().shown_at;
        assert!(!ledger.expire_toast(shown_at + Duration::from_secs(3600)));
        assert!(ledger.hide_toast().is_some());
    }
}
