//! Family caregiving tracker.
//!
//! Records vital signs, medicines given and end-of-shift reports for two
//! patients, keeps them in a local store first and reconciles them with a
//! hosted REST backend when it is reachable.

pub mod checklist;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod schedule;
pub mod sync;

pub use config::{Config, ConfigError, ConfigSource, ConfigValue, RemoteConfig, SyncConfig};
pub use db::{LocalStore, StoreError};
pub use sync::{Reconciler, RemoteClient, RemoteError, RemoteStore};
