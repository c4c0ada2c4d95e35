//! Local-first write path.
//!
//! A record is always persisted locally before the remote is tried, so a
//! failed or skipped push never loses data. Records that do not reach the
//! remote stay unsynced and are picked up by the next reconcile.

use super::client::RemoteStore;
use crate::db::{LocalStore, StoreError};
use crate::models::Record;

/// Persists a record locally then pushes it best-effort.
///
/// Returns the record as stored, with `synced` set when the remote accepted
/// it. Only a local persistence failure is an error.
pub async fn save_record<T, R>(
    store: &LocalStore,
    remote: Option<&R>,
    mut record: T,
) -> Result<T, StoreError>
where
    T: Record,
    R: RemoteStore,
{
    store.append(&record)?;

    let Some(remote) = remote else {
        tracing::debug!("No remote configured, {} kept local", record.id());
        return Ok(record);
    };

    if remote.push(&record).await {
        match store.update_sync_flag::<T>(record.id()) {
            Ok(_) => record.mark_synced(),
            Err(e) => tracing::warn!("Pushed {} but could not flag it: {}", record.id(), e),
        }
    }

    Ok(record)
}
