use crate::{
    import::{ImportBatch, ImportSource},
    recalc::recalculate,
    record::{Record, RecordId},
    registry::KeyRegistry,
    store::{MemoryStore, RecordStore},
};
use anyhow::Result;
use tracing::{debug, info, warn};

/// Yes/no gate consulted before a destructive key deletion.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// A key deletion waiting for the caller's decision.
///
/// Resolve it with [`Ledger::confirm_delete_key`] or
/// [`Ledger::cancel_delete_key`]. Dropping it is the same as cancelling.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct PendingKeyDeletion {
    key: String,
}

impl PendingKeyDeletion {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn message(&self) -> String {
        format!(
            "Are you sure you want to delete the column \"{0}\"? This will remove \"{0}\" data from ALL records.",
            self.key
        )
    }
}

/// Owned copy of the ledger for read-only consumers.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerSnapshot {
    pub records: Vec<Record>,
    pub asset_keys: Vec<String>,
}

/// Dated records plus the registry of account keys they may use.
///
/// Records are kept in date order with gains recalculated after every
/// change to the set, and each such change is handed to the store.
pub struct Ledger<S: RecordStore = MemoryStore> {
    records: Vec<Record>,
    keys: KeyRegistry,
    store: S,
}

impl Ledger<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for Ledger<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RecordStore> Ledger<S> {
    /// Empty ledger writing to `store`. Nothing is read from it.
    pub fn with_store(store: S) -> Self {
        Ledger {
            records: Vec::new(),
            keys: KeyRegistry::new(),
            store,
        }
    }

    /// Ledger initialised from whatever `store` holds. Stored keys come
    /// first in the registry, followed by any other key the stored records
    /// use.
    pub fn load(store: S) -> Result<Self> {
        let records = recalculate(store.load_records()?);
        let mut keys = KeyRegistry::new();
        keys.merge(store.load_keys()?);
        keys.merge(KeyRegistry::from_records(&records).iter());
        info!(records = records.len(), keys = keys.len(), "ledger loaded");
        Ok(Ledger {
            records,
            keys,
            store,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total of the chronologically last record.
    pub fn latest_total(&self) -> Option<f64> {
        self.records.last().map(Record::total)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            records: self.records.clone(),
            asset_keys: self.keys.to_vec(),
        }
    }

    pub fn add_record(&mut self, record: Record) {
        let added = self.keys.merge(record.assets().keys());
        debug!(id = %record.id(), new_keys = added, "add record");

        let mut records = std::mem::take(&mut self.records);
        records.push(record);
        self.replace_records(records);
        if added > 0 {
            self.persist_keys();
        }
    }

    /// Replaces the record sharing `record`'s id. Keys it uses are merged
    /// into the registry even when no such record exists. Returns whether a
    /// record was replaced.
    pub fn update_record(&mut self, record: Record) -> bool {
        let added = self.keys.merge(record.assets().keys());

        let mut records = std::mem::take(&mut self.records);
        let found = match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => {
                debug!(id = %record.id(), "update of unknown record ignored");
                false
            }
        };
        self.replace_records(records);
        if added > 0 {
            self.persist_keys();
        }
        found
    }

    /// Removes the record with `id`. The key registry is left as is.
    pub fn delete_record(&mut self, id: &RecordId) -> bool {
        let mut records = std::mem::take(&mut self.records);
        let before = records.len();
        records.retain(|r| r.id() != id);
        let found = records.len() != before;
        debug!(id = %id, found, "delete record");
        self.replace_records(records);
        found
    }

    /// Registers `key` without touching any record.
    pub fn add_key(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        let added = self.keys.insert(key.clone());
        debug!(key = %key, added, "add key");
        if added {
            self.persist_keys();
        }
        added
    }

    /// First half of a key deletion. Nothing changes until the returned
    /// intent is passed to [`Ledger::confirm_delete_key`].
    pub fn request_delete_key(&self, key: impl Into<String>) -> PendingKeyDeletion {
        PendingKeyDeletion { key: key.into() }
    }

    /// Removes the key from the registry and from every record, then
    /// recalculates totals and gains.
    pub fn confirm_delete_key(&mut self, pending: PendingKeyDeletion) {
        let key = pending.key;
        self.keys.remove(&key);

        let mut records = std::mem::take(&mut self.records);
        let mut touched = 0;
        for record in records.iter_mut() {
            if record.remove_asset(&key).is_some() {
                touched += 1;
            }
        }
        info!(key = %key, records = touched, "key deleted");
        self.replace_records(records);
        self.persist_keys();
    }

    pub fn cancel_delete_key(&self, pending: PendingKeyDeletion) {
        debug!(key = %pending.key, "key deletion cancelled");
    }

    /// Deletes `key` if `confirm` agrees. Returns whether it did.
    pub fn delete_key_with<C: Confirm>(&mut self, key: impl Into<String>, confirm: &mut C) -> bool {
        let pending = self.request_delete_key(key);
        if confirm.confirm(&pending.message()) {
            self.confirm_delete_key(pending);
            true
        } else {
            self.cancel_delete_key(pending);
            false
        }
    }

    /// Appends `records` as they are, with no deduplication. `detected_keys`
    /// are merged into the registry first, then any key the records use
    /// that the source did not report.
    pub fn import_records<I, K>(&mut self, records: Vec<Record>, detected_keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut added = self.keys.merge(detected_keys);
        for record in &records {
            added += self.keys.merge(record.assets().keys());
        }
        info!(records = records.len(), new_keys = added, "import");

        let mut merged = std::mem::take(&mut self.records);
        merged.extend(records);
        self.replace_records(merged);
        if added > 0 {
            self.persist_keys();
        }
    }

    /// Runs `source` and imports its batch. A failing source leaves the
    /// ledger untouched.
    pub fn import_from<I: ImportSource>(&mut self, source: &I) -> Result<usize> {
        let ImportBatch {
            records,
            detected_keys,
        } = source.import()?;
        let count = records.len();
        self.import_records(records, detected_keys);
        Ok(count)
    }

    fn replace_records(&mut self, records: Vec<Record>) {
        self.records = recalculate(records);
        if let Err(e) = self.store.save_records(&self.records) {
            warn!(error = %e, "failed to persist records");
        }
    }

    fn persist_keys(&mut self) {
        if let Err(e) = self.store.save_keys(&self.keys.to_vec()) {
            warn!(error = %e, "failed to persist account keys");
        }
    }
}
