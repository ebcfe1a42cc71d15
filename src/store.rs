// 🗄️ Admin Store - key-value blob persistence for raw intake data
// One canonical key holds the whole RawAdminData blob; the four legacy
// per-entity keys from the first-generation intake page are still readable
// as a fallback so old installs keep their data.

use crate::entities::{RawDoctor, RawPayment, RawPerson, RawTreatment};
use crate::report::RawAdminData;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Key under which the whole blob is stored.
pub const CANONICAL_KEY: &str = "admin_data";

const LEGACY_PERSONS_KEY: &str = "persons";
const LEGACY_PAYMENTS_KEY: &str = "paymentTypes";
const LEGACY_TREATMENTS_KEY: &str = "treatments";
const LEGACY_DOCTORS_KEY: &str = "doctors";

/// Where a loaded blob came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// The canonical blob key.
    Canonical,
    /// Assembled from the legacy per-entity keys.
    LegacyKeys,
    /// A file handed to the CLI.
    ManualImport,
    /// Nothing stored yet.
    None,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Canonical => "store",
            DataSource::LegacyKeys => "legacy-keys",
            DataSource::ManualImport => "manual-import",
            DataSource::None => "none",
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

pub struct AdminStore {
    conn: Connection,
}

impl AdminStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open store at {:?}", path.as_ref()))?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests and one-shot runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("Failed to initialize kv table")?;
        Ok(AdminStore { conn })
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }

    /// Save the blob under the canonical key.
    pub fn save(&self, data: &RawAdminData) -> Result<()> {
        let json = serde_json::to_string(data).context("Failed to serialize admin data")?;
        self.put_raw(CANONICAL_KEY, &json)
    }

    /// Load the blob: canonical key first, then the legacy per-entity keys.
    /// A corrupt value under any key degrades to empty instead of failing
    /// the whole load.
    pub fn load(&self) -> Result<(Option<RawAdminData>, DataSource)> {
        if let Some(json) = self.get_raw(CANONICAL_KEY)? {
            match serde_json::from_str::<RawAdminData>(&json) {
                Ok(data) => return Ok((Some(data), DataSource::Canonical)),
                Err(e) => eprintln!("Corrupt '{}' blob, trying legacy keys: {}", CANONICAL_KEY, e),
            }
        }

        let persons: Option<Vec<RawPerson>> = self.load_legacy_list(LEGACY_PERSONS_KEY)?;
        let payments: Option<Vec<RawPayment>> = self.load_legacy_list(LEGACY_PAYMENTS_KEY)?;
        let treatments: Option<Vec<RawTreatment>> = self.load_legacy_list(LEGACY_TREATMENTS_KEY)?;
        let doctors: Option<Vec<RawDoctor>> = self.load_legacy_list(LEGACY_DOCTORS_KEY)?;

        if persons.is_some() || payments.is_some() || treatments.is_some() || doctors.is_some() {
            let data = RawAdminData {
                persons,
                payment_types: payments,
                treatments,
                doctors,
                ..Default::default()
            };
            return Ok((Some(data), DataSource::LegacyKeys));
        }

        Ok((None, DataSource::None))
    }

    fn load_legacy_list<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<Vec<T>>> {
        let Some(json) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(list) => Ok(Some(list)),
            Err(e) => {
                eprintln!("Corrupt legacy key '{}', treating as empty: {}", key, e);
                Ok(Some(Vec::new()))
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RawPerson;

    fn sample_data() -> RawAdminData {
        RawAdminData {
            persons: Some(vec![RawPerson {
                name: Some("علی رضایی".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let store = AdminStore::open_in_memory().unwrap();
        let (data, source) = store.load().unwrap();
        assert!(data.is_none());
        assert_eq!(source, DataSource::None);
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = AdminStore::open_in_memory().unwrap();
        let data = sample_data();
        store.save(&data).unwrap();

        let (loaded, source) = store.load().unwrap();
        assert_eq!(loaded, Some(data));
        assert_eq!(source, DataSource::Canonical);
    }

    #[test]
    fn test_legacy_keys_fallback() {
        let store = AdminStore::open_in_memory().unwrap();
        store
            .put_raw(LEGACY_PERSONS_KEY, r#"[{"name": "علی"}]"#)
            .unwrap();
        store
            .put_raw(LEGACY_PAYMENTS_KEY, r#"[{"type": "نقدی", "score": 9}]"#)
            .unwrap();

        let (loaded, source) = store.load().unwrap();
        assert_eq!(source, DataSource::LegacyKeys);
        let data = loaded.unwrap();
        assert_eq!(data.persons().len(), 1);
        assert_eq!(data.payments().len(), 1);
        assert!(data.treatments().is_empty());
    }

    #[test]
    fn test_canonical_key_wins_over_legacy() {
        let store = AdminStore::open_in_memory().unwrap();
        store
            .put_raw(LEGACY_PERSONS_KEY, r#"[{"name": "قدیمی"}]"#)
            .unwrap();
        store.save(&sample_data()).unwrap();

        let (loaded, source) = store.load().unwrap();
        assert_eq!(source, DataSource::Canonical);
        assert_eq!(loaded.unwrap().persons()[0].name.as_deref(), Some("علی رضایی"));
    }

    #[test]
    fn test_corrupt_canonical_falls_back_to_legacy() {
        let store = AdminStore::open_in_memory().unwrap();
        store.put_raw(CANONICAL_KEY, "{not json").unwrap();
        store
            .put_raw(LEGACY_PERSONS_KEY, r#"[{"name": "علی"}]"#)
            .unwrap();

        let (loaded, source) = store.load().unwrap();
        assert_eq!(source, DataSource::LegacyKeys);
        assert_eq!(loaded.unwrap().persons().len(), 1);
    }

    #[test]
    fn test_corrupt_legacy_key_degrades_to_empty() {
        let store = AdminStore::open_in_memory().unwrap();
        store.put_raw(LEGACY_PERSONS_KEY, "oops").unwrap();
        store
            .put_raw(LEGACY_DOCTORS_KEY, r#"[{"name": "دکتر احمدی"}]"#)
            .unwrap();

        let (loaded, source) = store.load().unwrap();
        assert_eq!(source, DataSource::LegacyKeys);
        let data = loaded.unwrap();
        assert!(data.persons().is_empty());
        assert_eq!(data.doctors().len(), 1);
    }

    #[test]
    fn test_save_overwrites_previous_blob() {
        let store = AdminStore::open_in_memory().unwrap();
        store.save(&sample_data()).unwrap();
        store.save(&RawAdminData::default()).unwrap();

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, Some(RawAdminData::default()));
    }
}
