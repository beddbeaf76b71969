use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Balances per account key, iterated in insertion order.
pub type Assets = IndexMap<String, f64>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for a record created in this process.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One dated snapshot of account balances.
///
/// `total` always equals the sum of `assets`; every mutator that touches
/// `assets` recomputes it. `gain` is owned by [`recalculate`][crate::recalc::recalculate]
/// and cannot be set from outside the crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRecord")]
pub struct Record {
    id: RecordId,
    date: NaiveDate,
    assets: Assets,
    total: f64,
    gain: f64,
    income: f64,
    mpf: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

/// Shape accepted from persisted data. Derived figures in the input are
/// ignored so a stale `total` never survives a reload.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    id: RecordId,
    date: NaiveDate,
    #[serde(default)]
    assets: Assets,
    #[serde(default)]
    income: f64,
    #[serde(default)]
    mpf: f64,
    #[serde(default)]
    note: Option<String>,
}

impl From<StoredRecord> for Record {
    fn from(stored: StoredRecord) -> Self {
        let mut record = Record::with_id(stored.id, stored.date, stored.assets);
        record.income = stored.income;
        record.mpf = stored.mpf;
        record.note = stored.note;
        record
    }
}

impl Record {
    /// New record with a freshly generated id.
    pub fn new(date: NaiveDate, assets: Assets) -> Self {
        Self::with_id(RecordId::generate(), date, assets)
    }

    /// Record carrying a known id, e.g. the replacement passed to
    /// [`Ledger::update_record`][crate::ledger::Ledger::update_record].
    pub fn with_id(id: RecordId, date: NaiveDate, assets: Assets) -> Self {
        let total = sum(&assets);
        Self {
            id,
            date,
            assets,
            total,
            gain: 0f64,
            income: 0f64,
            mpf: 0f64,
            note: None,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn asset(&self, key: &str) -> Option<f64> {
        self.assets.get(key).copied()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn mpf(&self) -> f64 {
        self.mpf
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_income(&mut self, income: f64) {
        self.income = income;
    }

    pub fn set_mpf(&mut self, mpf: f64) {
        self.mpf = mpf;
    }

    pub fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }

    /// Insert or overwrite one balance. A new key goes to the end.
    pub fn set_asset(&mut self, key: impl Into<String>, value: f64) {
        self.assets.insert(key.into(), value);
        self.total = sum(&self.assets);
    }

    /// Drop a key from this record, returning its previous balance.
    pub fn remove_asset(&mut self, key: &str) -> Option<f64> {
        let removed = self.assets.shift_remove(key);
        if removed.is_some() {
            self.total = sum(&self.assets);
        }
        removed
    }

    pub(crate) fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }
}

fn sum(assets: &Assets) -> f64 {
    assets.values().sum()
}
