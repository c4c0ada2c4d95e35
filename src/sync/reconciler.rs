//! Two-phase reconciliation between the local store and the remote.
//!
//! Push phase: every unsynced record of every collection is sent once and
//! flagged as synced when the remote accepts it. Pull phase: each
//! collection is fetched for the lookback window and merged into the local
//! file. An empty or failed pull never touches the local file.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::client::RemoteStore;
use super::merge::merge_records;
use crate::db::LocalStore;
use crate::models::{Collection, MedicineRecord, NurseReport, Record, VitalRecord};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 60;
pub const DEFAULT_RETENTION: usize = 100;

/// Optional observer for human-readable progress lines.
pub type Progress<'a> = Option<&'a (dyn Fn(&str) + Sync)>;

/// Tunables for a reconcile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// How far back the pull phase looks.
    pub lookback_days: u32,
    /// Maximum records kept per collection after a merge. Unsynced records
    /// are never trimmed.
    pub retention: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// What the pull phase did for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote records were merged and the collection rewritten.
    Merged {
        remote: usize,
        local_only: usize,
        stored: usize,
    },
    /// The remote returned nothing; local data kept as is.
    RemoteEmpty,
    /// The remote could not be read or the merge could not be stored.
    Failed(String),
    /// The pull phase did not run.
    NotRun,
}

/// Per-collection outcome of a reconcile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: Collection,
    pub pushed: usize,
    pub push_failed: usize,
    pub pull: PullOutcome,
}

impl CollectionReport {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            pushed: 0,
            push_failed: 0,
            pull: PullOutcome::NotRun,
        }
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: pushed {}", self.collection.label(), self.pushed)?;
        if self.push_failed > 0 {
            write!(f, " ({} failed)", self.push_failed)?;
        }
        match &self.pull {
            PullOutcome::Merged {
                remote,
                local_only,
                stored,
            } => write!(
                f,
                ", merged {} remote + {} local, {} stored",
                remote, local_only, stored
            ),
            PullOutcome::RemoteEmpty => write!(f, ", remote empty, local kept"),
            PullOutcome::Failed(e) => write!(f, ", pull failed: {}", e),
            PullOutcome::NotRun => Ok(()),
        }
    }
}

/// Outcome of one reconcile call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Another reconcile was already running; nothing was done.
    pub skipped: bool,
    pub collections: Vec<CollectionReport>,
}

impl ReconcileReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            collections: Vec::new(),
        }
    }

    /// Whether any push or pull failed.
    pub fn has_errors(&self) -> bool {
        self.collections
            .iter()
            .any(|c| c.push_failed > 0 || matches!(c.pull, PullOutcome::Failed(_)))
    }

    pub fn total_pushed(&self) -> usize {
        self.collections.iter().map(|c| c.pushed).sum()
    }

    pub fn collection(&self, collection: Collection) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.collection == collection)
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut CollectionReport {
        if let Some(index) = self
            .collections
            .iter()
            .position(|c| c.collection == collection)
        {
            return &mut self.collections[index];
        }
        self.collections.push(CollectionReport::new(collection));
        let last = self.collections.len() - 1;
        &mut self.collections[last]
    }
}

/// Clears the in-flight flag when a run ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reconciles the local store with a remote store.
pub struct Reconciler<R> {
    store: Arc<LocalStore>,
    remote: R,
    settings: SyncSettings,
    in_flight: AtomicBool,
}

impl<R: RemoteStore> Reconciler<R> {
    pub fn new(store: Arc<LocalStore>, remote: R, settings: SyncSettings) -> Self {
        Self {
            store,
            remote,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Runs one push-then-pull cycle over every collection.
    ///
    /// Failures are recorded in the report and never abort the run. A call
    /// made while another is in progress returns [`ReconcileReport::skipped`].
    pub async fn reconcile(&self, progress: Progress<'_>) -> ReconcileReport {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            tracing::info!("Reconcile already in progress, skipping");
            notify(progress, "Sync already in progress");
            return ReconcileReport::skipped();
        };

        tracing::info!("Starting reconcile");
        let mut report = ReconcileReport::default();

        self.push_pending::<VitalRecord>(&mut report, progress).await;
        self.push_pending::<MedicineRecord>(&mut report, progress).await;
        self.push_pending::<NurseReport>(&mut report, progress).await;

        self.pull_and_merge::<VitalRecord>(&mut report, progress).await;
        self.pull_and_merge::<MedicineRecord>(&mut report, progress).await;
        self.pull_and_merge::<NurseReport>(&mut report, progress).await;

        tracing::info!(
            "Reconcile finished: {} pushed, errors: {}",
            report.total_pushed(),
            report.has_errors()
        );
        report
    }

    async fn push_pending<T: Record>(&self, report: &mut ReconcileReport, progress: Progress<'_>) {
        let label = T::COLLECTION.label();
        let pending = self.store.pending::<T>();
        let entry = report.collection_mut(T::COLLECTION);
        if pending.is_empty() {
            return;
        }

        notify(progress, &format!("Pushing {} pending {}", pending.len(), label));
        for record in &pending {
            if !self.remote.push(record).await {
                entry.push_failed += 1;
                continue;
            }
            entry.pushed += 1;
            if let Err(e) = self.store.update_sync_flag::<T>(record.id()) {
                tracing::warn!("Pushed {} {} but could not flag it: {}", label, record.id(), e);
            }
        }
    }

    async fn pull_and_merge<T: Record>(&self, report: &mut ReconcileReport, progress: Progress<'_>) {
        let label = T::COLLECTION.label();
        notify(progress, &format!("Pulling {}", label));

        let outcome = match self.remote.pull::<T>(self.settings.lookback_days).await {
            Err(e) => {
                tracing::warn!("Pull of {} failed, keeping local data: {}", label, e);
                PullOutcome::Failed(e.to_string())
            }
            Ok(remote) if remote.is_empty() => {
                tracing::debug!("Remote {} empty, keeping local data", label);
                PullOutcome::RemoteEmpty
            }
            Ok(remote) => self.merge_into_store(remote),
        };

        notify(progress, &format!("{}: {}", label, describe(&outcome)));
        report.collection_mut(T::COLLECTION).pull = outcome;
    }

    fn merge_into_store<T: Record>(&self, remote: Vec<T>) -> PullOutcome {
        let retention = self.settings.retention;
        let mut outcome = PullOutcome::NotRun;

        let result = self.store.update(|local: Vec<T>| {
            let merged = merge_records(remote, local, retention);
            outcome = PullOutcome::Merged {
                remote: merged.remote,
                local_only: merged.local_only,
                stored: merged.records.len(),
            };
            merged.records
        });

        match result {
            Ok(()) => outcome,
            Err(e) => {
                tracing::warn!("Could not store merged {}: {}", T::COLLECTION.label(), e);
                PullOutcome::Failed(e.to_string())
            }
        }
    }
}

fn notify(progress: Progress<'_>, message: &str) {
    if let Some(progress) = progress {
        progress(message);
    }
}

fn describe(outcome: &PullOutcome) -> String {
    match outcome {
        PullOutcome::Merged {
            remote, local_only, ..
        } => format!("merged {} remote + {} local", remote, local_only),
        PullOutcome::RemoteEmpty => "remote empty, keeping local".to_string(),
        PullOutcome::Failed(_) => "sync error, keeping local".to_string(),
        PullOutcome::NotRun => "skipped".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Nurse, Patient};
    use crate::sync::error::RemoteError;
    use crate::sync::mapping;
    use serde_json::Value;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// In-memory remote holding mapped rows per collection.
    #[derive(Default)]
    struct FakeRemote {
        rows: Mutex<HashMap<Collection, Vec<Value>>>,
        rejected: Mutex<HashSet<String>>,
        pushes: Mutex<Vec<String>>,
        pull_days: Mutex<Vec<u32>>,
        offline: AtomicBool,
        delay: Option<Duration>,
    }

    impl FakeRemote {
        fn seed<T: Record>(&self, record: &T) {
            self.rows
                .lock()
                .unwrap()
                .entry(T::COLLECTION)
                .or_default()
                .push(mapping::encode(record).unwrap());
        }

        fn reject(&self, id: &str) {
            self.rejected.lock().unwrap().insert(id.to_string());
        }

        fn pushes(&self) -> Vec<String> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl RemoteStore for FakeRemote {
        async fn push<T: Record>(&self, record: &T) -> bool {
            self.pushes.lock().unwrap().push(record.id().to_string());
            if self.offline.load(Ordering::SeqCst)
                || self.rejected.lock().unwrap().contains(record.id())
            {
                return false;
            }
            self.seed(record);
            true
        }

        async fn pull<T: Record>(&self, since_days: u32) -> Result<Vec<T>, RemoteError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.pull_days.lock().unwrap().push(since_days);
            if self.offline.load(Ordering::SeqCst) {
                return Err(RemoteError::Http("connection refused".to_string()));
            }
            let rows = self
                .rows
                .lock()
                .unwrap()
                .get(&T::COLLECTION)
                .cloned()
                .unwrap_or_default();
            let mut records = rows
                .into_iter()
                .map(mapping::decode::<T>)
                .collect::<Result<Vec<T>, _>>()?;
            records.sort_by_key(|r| std::cmp::Reverse(r.timestamp()));
            Ok(records)
        }
    }

    fn setup(remote: FakeRemote, settings: SyncSettings) -> (Reconciler<FakeRemote>, Arc<LocalStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::new(temp_dir.path().to_path_buf()));
        let reconciler = Reconciler::new(store.clone(), remote, settings);
        (reconciler, store, temp_dir)
    }

    fn vital(timestamp: i64) -> VitalRecord {
        VitalRecord::new(Patient::Jorge, Nurse::Monica, 72, 16, 97).with_timestamp(timestamp)
    }

    #[tokio::test]
    async fn test_reconcile_pushes_pending_and_flags_them() {
        let (reconciler, store, _temp) = setup(FakeRemote::default(), SyncSettings::default());
        let a = vital(1);
        let b = vital(2);
        store.append(&a).unwrap();
        store.append(&b).unwrap();

        let report = reconciler.reconcile(None).await;

        assert!(!report.skipped);
        assert!(!report.has_errors());
        assert_eq!(report.collection(Collection::Vitals).unwrap().pushed, 2);
        assert!(store.pending::<VitalRecord>().is_empty());
        assert_eq!(store.get_all::<VitalRecord>().len(), 2);
    }

    #[tokio::test]
    async fn test_synced_records_are_not_pushed_again() {
        let (reconciler, store, _temp) = setup(FakeRemote::default(), SyncSettings::default());
        store.append(&vital(1)).unwrap();

        reconciler.reconcile(None).await;
        let second = reconciler.reconcile(None).await;

        assert_eq!(reconciler.remote().pushes().len(), 1);
        assert_eq!(second.total_pushed(), 0);
    }

    #[tokio::test]
    async fn test_push_failure_does_not_stop_others() {
        let remote = FakeRemote::default();
        let bad = vital(1);
        let good = vital(2);
        remote.reject(&bad.id);
        let (reconciler, store, _temp) = setup(remote, SyncSettings::default());
        store.append(&bad).unwrap();
        store.append(&good).unwrap();
        store
            .append(&MedicineRecord::new(Patient::Teresa, Nurse::Yesse, "Zirtec", "1 dosis"))
            .unwrap();

        let report = reconciler.reconcile(None).await;

        let vitals = report.collection(Collection::Vitals).unwrap();
        assert_eq!(vitals.pushed, 1);
        assert_eq!(vitals.push_failed, 1);
        assert_eq!(report.collection(Collection::Medicines).unwrap().pushed, 1);
        assert!(report.has_errors());

        let pending = store.pending::<VitalRecord>();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, bad.id);
    }

    #[tokio::test]
    async fn test_failed_push_is_retried_next_cycle() {
        let (reconciler, store, _temp) = setup(FakeRemote::default(), SyncSettings::default());
        let record = vital(1);
        store.append(&record).unwrap();

        reconciler.remote().offline.store(true, Ordering::SeqCst);
        reconciler.reconcile(None).await;
        assert_eq!(store.pending::<VitalRecord>().len(), 1);

        reconciler.remote().offline.store(false, Ordering::SeqCst);
        let report = reconciler.reconcile(None).await;
        assert_eq!(report.collection(Collection::Vitals).unwrap().pushed, 1);
        assert!(store.pending::<VitalRecord>().is_empty());
    }

    #[tokio::test]
    async fn test_pull_merges_remote_and_local_only() {
        let remote = FakeRemote::default();
        let from_other_device = vital(300);
        remote.seed(&from_other_device);
        let (reconciler, store, _temp) = setup(remote, SyncSettings::default());

        let local = vital(200);
        store.append(&local).unwrap();
        reconciler.remote().reject(&local.id);

        let report = reconciler.reconcile(None).await;

        assert_eq!(
            report.collection(Collection::Vitals).unwrap().pull,
            PullOutcome::Merged {
                remote: 1,
                local_only: 1,
                stored: 2
            }
        );
        let all = store.get_all::<VitalRecord>();
        assert_eq!(all[0].id, from_other_device.id);
        assert!(all[0].synced);
        assert_eq!(all[1].id, local.id);
        assert!(!all[1].synced);
    }

    #[tokio::test]
    async fn test_pull_respects_retention() {
        let remote = FakeRemote::default();
        for i in 0..8 {
            remote.seed(&vital(1_000 + i));
        }
        let settings = SyncSettings {
            retention: 5,
            ..SyncSettings::default()
        };
        let (reconciler, store, _temp) = setup(remote, settings);

        reconciler.reconcile(None).await;

        let all = store.get_all::<VitalRecord>();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].timestamp, 1_007);
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_unsynced_record_older_than_retention_survives_merge() {
        let remote = FakeRemote::default();
        for i in 0..3 {
            remote.seed(&vital(1_000 + i));
        }
        let offline = vital(10);
        remote.reject(&offline.id);
        let settings = SyncSettings {
            retention: 3,
            ..SyncSettings::default()
        };
        let (reconciler, store, _temp) = setup(remote, settings);
        store.append(&offline).unwrap();

        let report = reconciler.reconcile(None).await;

        let vitals = report.collection(Collection::Vitals).unwrap();
        assert_eq!(vitals.push_failed, 1);
        assert_eq!(
            vitals.pull,
            PullOutcome::Merged {
                remote: 2,
                local_only: 1,
                stored: 3
            }
        );
        let pending = store.pending::<VitalRecord>();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, offline.id);

        reconciler.remote().rejected.lock().unwrap().clear();
        let retry = reconciler.reconcile(None).await;
        assert_eq!(retry.collection(Collection::Vitals).unwrap().pushed, 1);
        assert!(store.pending::<VitalRecord>().is_empty());
    }

    #[tokio::test]
    async fn test_merge_report_counts_only_kept_records() {
        let remote = FakeRemote::default();
        remote.seed(&vital(500));
        let settings = SyncSettings {
            retention: 1,
            ..SyncSettings::default()
        };
        let (reconciler, store, _temp) = setup(remote, settings);
        let mut old = vital(5);
        old.mark_synced();
        store.append(&old).unwrap();

        let report = reconciler.reconcile(None).await;

        assert_eq!(
            report.collection(Collection::Vitals).unwrap().pull,
            PullOutcome::Merged {
                remote: 1,
                local_only: 0,
                stored: 1
            }
        );
        assert_eq!(store.get_all::<VitalRecord>().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_pull_leaves_local_file_untouched() {
        let (reconciler, store, _temp) = setup(FakeRemote::default(), SyncSettings::default());
        let mut record = vital(1);
        record.mark_synced();
        store.append(&record).unwrap();
        let before = fs::read(store.path(Collection::Vitals)).unwrap();

        reconciler.remote().offline.store(true, Ordering::SeqCst);
        let report = reconciler.reconcile(None).await;

        assert!(matches!(
            report.collection(Collection::Vitals).unwrap().pull,
            PullOutcome::Failed(_)
        ));
        assert_eq!(fs::read(store.path(Collection::Vitals)).unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_remote_leaves_local_file_untouched() {
        let (reconciler, store, _temp) = setup(FakeRemote::default(), SyncSettings::default());
        let mut record = vital(1);
        record.mark_synced();
        store.append(&record).unwrap();
        let before = fs::read(store.path(Collection::Vitals)).unwrap();

        let report = reconciler.reconcile(None).await;

        assert_eq!(
            report.collection(Collection::Vitals).unwrap().pull,
            PullOutcome::RemoteEmpty
        );
        assert!(!report.has_errors());
        assert_eq!(fs::read(store.path(Collection::Vitals)).unwrap(), before);
        assert!(!store.path(Collection::Reports).exists());
    }

    #[tokio::test]
    async fn test_pull_uses_lookback_setting() {
        let settings = SyncSettings {
            lookback_days: 7,
            ..SyncSettings::default()
        };
        let (reconciler, _store, _temp) = setup(FakeRemote::default(), settings);

        reconciler.reconcile(None).await;

        assert_eq!(*reconciler.remote().pull_days.lock().unwrap(), vec![7, 7, 7]);
    }

    #[tokio::test]
    async fn test_concurrent_reconcile_is_skipped() {
        let remote = FakeRemote {
            delay: Some(Duration::from_millis(50)),
            ..FakeRemote::default()
        };
        let (reconciler, _store, _temp) = setup(remote, SyncSettings::default());

        let (first, second) = tokio::join!(reconciler.reconcile(None), reconciler.reconcile(None));

        assert!(!first.skipped);
        assert!(second.skipped);
        assert!(second.collections.is_empty());

        let third = reconciler.reconcile(None).await;
        assert!(!third.skipped);
    }

    #[tokio::test]
    async fn test_progress_messages_are_reported() {
        let (reconciler, store, _temp) = setup(FakeRemote::default(), SyncSettings::default());
        store.append(&vital(1)).unwrap();
        let messages = Mutex::new(Vec::new());
        let observer: &(dyn Fn(&str) + Sync) = &|m: &str| messages.lock().unwrap().push(m.to_string());

        reconciler.reconcile(Some(observer)).await;

        let messages = messages.into_inner().unwrap();
        assert!(messages.iter().any(|m| m == "Pushing 1 pending vitals"));
        assert!(messages.iter().any(|m| m == "Pulling reports"));
    }

    #[test]
    fn test_report_display() {
        let report = CollectionReport {
            collection: Collection::Medicines,
            pushed: 2,
            push_failed: 1,
            pull: PullOutcome::RemoteEmpty,
        };
        assert_eq!(
            report.to_string(),
            "medicines: pushed 2 (1 failed), remote empty, local kept"
        );
    }
}
