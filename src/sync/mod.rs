//! Offline-first synchronization with the hosted record tables.
//!
//! Every write lands in the [`LocalStore`](crate::db::LocalStore) first and
//! carries a `synced` flag. The [`Reconciler`] pushes whatever is still
//! unsynced and then pulls a lookback window from the remote, merging it by
//! id so records that never reached the remote are kept.
//!
//! # Remote layout
//!
//! One table per collection, addressed as `{base_url}/rest/v1/{table}`:
//! - `vital_records`
//! - `medicine_records`
//! - `nurse_reports`
//!
//! Column names are mapped from the local camelCase fields by [`mapping`].

pub mod auto_sync;
pub mod client;
pub mod error;
pub mod mapping;
pub mod merge;
pub mod reconciler;
pub mod writer;

pub use auto_sync::try_auto_sync;
pub use client::{RemoteClient, RemoteStore};
pub use error::RemoteError;
pub use merge::{merge_records, Merged};
pub use reconciler::{
    CollectionReport, Progress, PullOutcome, ReconcileReport, Reconciler, SyncSettings,
};
pub use writer::save_record;
