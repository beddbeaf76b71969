use crate::record::Record;
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Where the ledger loads its records and account keys from and writes
/// them back to.
///
/// Both loads must return an empty list when nothing has been stored yet.
/// The ledger treats saves as fire-and-forget: a failure is logged and never
/// rolls back the in-memory state. A store that does not keep the key
/// registry can rely on the default key methods; the ledger then rebuilds
/// it from record keys alone.
pub trait RecordStore {
    fn load_records(&self) -> Result<Vec<Record>>;
    fn save_records(&mut self, records: &[Record]) -> Result<()>;

    fn load_keys(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn save_keys(&mut self, _keys: &[String]) -> Result<()> {
        Ok(())
    }
}

/// Keeps the last saved record set and key list in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
    keys: Vec<String>,
    saves: usize,
    key_saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of times `save_records` has been called.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Number of times `save_keys` has been called.
    pub fn key_saves(&self) -> usize {
        self.key_saves
    }
}

impl RecordStore for MemoryStore {
    fn load_records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn save_records(&mut self, records: &[Record]) -> Result<()> {
        self.records = records.to_vec();
        self.saves += 1;
        Ok(())
    }

    fn load_keys(&self) -> Result<Vec<String>> {
        Ok(self.keys.clone())
    }

    fn save_keys(&mut self, keys: &[String]) -> Result<()> {
        self.keys = keys.to_vec();
        self.key_saves += 1;
        Ok(())
    }
}

/// Records stored as one JSON array in a file, with the account keys in a
/// sibling `<stem>.keys.json` file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    keys_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let keys_path = path.with_extension("keys.json");
        Self { path, keys_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys_path(&self) -> &Path {
        &self.keys_path
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("reading `{}'", path.display())),
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content)
        .with_context(|| format!("decoding {} from `{}'", what, path.display()))
}

fn write_json<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let content = serde_json::to_string_pretty(items)?;
    fs::write(path, content).with_context(|| format!("writing `{}'", path.display()))
}

impl RecordStore for JsonFileStore {
    fn load_records(&self) -> Result<Vec<Record>> {
        read_json(&self.path, "records")
    }

    fn save_records(&mut self, records: &[Record]) -> Result<()> {
        write_json(&self.path, records)
    }

    fn load_keys(&self) -> Result<Vec<String>> {
        read_json(&self.keys_path, "account keys")
    }

    fn save_keys(&mut self, keys: &[String]) -> Result<()> {
        write_json(&self.keys_path, keys)
    }
}

#[cfg(test)]
mod tests {
    use crate::record::tests::record;
    use crate::store::{JsonFileStore, MemoryStore, RecordStore};

    use anyhow::Result;
    use std::fs;

    #[test]
    fn memory_store_roundtrip() -> Result<()> {
        let mut store = MemoryStore::new();
        assert!(store.load_records()?.is_empty());

        store.save_records(&[record("1", "2024-01-01", &[("A", 1f64)])])?;

        assert_eq!(store.saves(), 1);
        assert_eq!(store.load_records()?.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_loads_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load_records()?.is_empty());
        Ok(())
    }

    #[test]
    fn blank_file_loads_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("blank.json");
        fs::write(&path, "  \n")?;
        assert!(JsonFileStore::new(path).load_records()?.is_empty());
        Ok(())
    }

    #[test]
    fn json_file_persists_records() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("records.json");
        let mut store = JsonFileStore::new(&path);
        let mut rec = record("abc", "2024-01-31", &[("HSBC", 120f64), ("Cash", 8f64)]);
        rec.set_note(Some("year end".to_string()));

        store.save_records(&[rec.clone()])?;
        let loaded = JsonFileStore::new(&path).load_records()?;

        assert_eq!(loaded, vec![rec]);
        Ok(())
    }

    #[test]
    fn json_file_persists_keys() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("records.json");
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.keys_path(), dir.path().join("records.keys.json"));
        assert!(store.load_keys()?.is_empty());

        store.save_keys(&["HSBC".to_string(), "Cash".to_string()])?;

        assert_eq!(JsonFileStore::new(&path).load_keys()?, vec!["HSBC", "Cash"]);
        assert!(JsonFileStore::new(&path).load_records()?.is_empty());
        Ok(())
    }

    #[test]
    fn memory_store_keeps_keys() -> Result<()> {
        let mut store = MemoryStore::new().with_keys(vec!["A".to_string()]);
        assert_eq!(store.load_keys()?, vec!["A"]);

        store.save_keys(&["B".to_string()])?;

        assert_eq!(store.keys(), ["B".to_string()]);
        assert_eq!(store.key_saves(), 1);
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json")?;

        let err = JsonFileStore::new(&path).load_records().unwrap_err();

        assert!(format!("{}", err).starts_with("decoding records from"));
        Ok(())
    }
}
