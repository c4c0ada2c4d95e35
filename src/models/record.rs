//! Shared behaviour of the three append-only record collections.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::Patient;

/// The logical collections kept on-device and mirrored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Vitals,
    Medicines,
    Reports,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Vitals, Collection::Medicines, Collection::Reports];

    /// Namespaced key the collection is persisted under.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Vitals => "cuidapadres_vitals_v3",
            Collection::Medicines => "cuidapadres_medicine_v3",
            Collection::Reports => "cuidapadres_reports_v3",
        }
    }

    /// Returns the filename for this collection inside the data directory.
    pub fn filename(&self) -> String {
        format!("{}.json", self.storage_key())
    }

    /// Remote table name.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Vitals => "vital_records",
            Collection::Medicines => "medicine_records",
            Collection::Reports => "nurse_reports",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Collection::Vitals => "vitals",
            Collection::Medicines => "medicines",
            Collection::Reports => "reports",
        }
    }
}

/// A record stored newest-first in one collection.
///
/// Records never change after creation except for the `synced` flag,
/// which only ever moves from `false` to `true`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn patient(&self) -> Patient;
    /// Creation time in epoch milliseconds.
    fn timestamp(&self) -> i64;
    fn is_synced(&self) -> bool;
    fn mark_synced(&mut self);
}

/// Generates a client-side record id.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
