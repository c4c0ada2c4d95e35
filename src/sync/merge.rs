use std::collections::HashSet;

use crate::models::Record;

/// Result of merging a remote snapshot into a local collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<T> {
    /// Newest-first. Every unsynced record plus the newest synced ones.
    pub records: Vec<T>,
    /// Records kept from the remote snapshot.
    pub remote: usize,
    /// Kept local records the remote did not know about.
    pub local_only: usize,
}

/// Merges remote records with local ones by id.
///
/// The remote copy wins when both sides hold the same id. Local-only
/// records are kept so unconfirmed writes are never lost to a pull. The
/// result is sorted by timestamp descending (stable, so equal timestamps
/// keep remote-then-local order) and trimmed to `cap`. Records still waiting
/// to be pushed are never trimmed: they take their slots first and synced
/// history fills the rest, so the cap is only exceeded when the unsynced
/// records alone outnumber it.
pub fn merge_records<T: Record>(remote: Vec<T>, local: Vec<T>, cap: usize) -> Merged<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(remote.len() + local.len());
    let mut tagged: Vec<(T, bool)> = Vec::with_capacity(remote.len() + local.len());

    for record in remote {
        if seen.insert(record.id().to_string()) {
            tagged.push((record, true));
        }
    }
    for record in local {
        if seen.insert(record.id().to_string()) {
            tagged.push((record, false));
        }
    }

    tagged.sort_by(|(a, _), (b, _)| b.timestamp().cmp(&a.timestamp()));

    let unsynced = tagged.iter().filter(|(record, _)| !record.is_synced()).count();
    let mut synced_room = cap.saturating_sub(unsynced);
    tagged.retain(|(record, _)| {
        if !record.is_synced() {
            return true;
        }
        if synced_room == 0 {
            return false;
        }
        synced_room -= 1;
        true
    });

    let remote_count = tagged.iter().filter(|(_, from_remote)| *from_remote).count();
    let local_only = tagged.len() - remote_count;

    Merged {
        records: tagged.into_iter().map(|(record, _)| record).collect(),
        remote: remote_count,
        local_only,
    }
}
