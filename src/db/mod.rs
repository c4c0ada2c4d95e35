//! On-device persistence for the record collections.
//!
//! Each collection is one JSON array file in the data directory:
//! ```text
//! <DATA_DIR>/
//!   cuidapadres_vitals_v3.json
//!   cuidapadres_medicine_v3.json
//!   cuidapadres_reports_v3.json
//! ```

mod local_store;

pub use local_store::{LocalStore, StoreError};
