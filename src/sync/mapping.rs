//! Declarative field mapping between local records and remote rows.
//!
//! Local records serialize with camelCase names (`nurseName`, `taSys`);
//! the remote tables use snake_case columns (`nurse_name`, `ta_sys`).
//! Each collection has one table of [`FieldMapping`]s and a single generic
//! [`encode`]/[`decode`] pair walks it. The `synced` flag is local-only and
//! never leaves the device.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Collection, Record};

/// One domain field and the remote column it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub domain: &'static str,
    pub wire: &'static str,
    /// Absent values are sent as `null` instead of failing.
    pub nullable: bool,
}

const fn required(domain: &'static str, wire: &'static str) -> FieldMapping {
    FieldMapping {
        domain,
        wire,
        nullable: false,
    }
}

const fn nullable(domain: &'static str, wire: &'static str) -> FieldMapping {
    FieldMapping {
        domain,
        wire,
        nullable: true,
    }
}

pub static VITAL_FIELDS: &[FieldMapping] = &[
    required("id", "id"),
    required("patient", "patient"),
    required("nurseName", "nurse_name"),
    nullable("taSys", "ta_sys"),
    nullable("taDia", "ta_dia"),
    required("fc", "fc"),
    required("fr", "fr"),
    required("spo2", "spo2"),
    nullable("glucose", "glucose"),
    required("timestamp", "timestamp"),
];

pub static MEDICINE_FIELDS: &[FieldMapping] = &[
    required("id", "id"),
    required("patient", "patient"),
    required("nurseName", "nurse_name"),
    required("medicineName", "medicine_name"),
    required("dose", "dose"),
    required("timestamp", "timestamp"),
];

pub static REPORT_FIELDS: &[FieldMapping] = &[
    required("id", "id"),
    required("patient", "patient"),
    required("nurseName", "nurse_name"),
    required("content", "content"),
    nullable("observations", "observations"),
    required("timestamp", "timestamp"),
];

/// Mapping table for a collection.
pub fn fields(collection: Collection) -> &'static [FieldMapping] {
    match collection {
        Collection::Vitals => VITAL_FIELDS,
        Collection::Medicines => MEDICINE_FIELDS,
        Collection::Reports => REPORT_FIELDS,
    }
}

/// Errors converting between record and row shape.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Expected a JSON object for {0}")]
    NotAnObject(&'static str),
    #[error("Record for {table} is missing required field '{field}'")]
    MissingField {
        table: &'static str,
        field: &'static str,
    },
    #[error("Invalid {table} row: {source}")]
    Json {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Converts a record into the remote row shape.
pub fn encode<T: Record>(record: &T) -> Result<Value, MappingError> {
    let table = T::COLLECTION.table();
    let value = serde_json::to_value(record).map_err(|source| MappingError::Json { table, source })?;
    let Value::Object(domain) = value else {
        return Err(MappingError::NotAnObject(table));
    };

    let mut row = Map::new();
    for field in fields(T::COLLECTION) {
        match domain.get(field.domain) {
            Some(v) if !v.is_null() => {
                row.insert(field.wire.to_string(), v.clone());
            }
            _ if field.nullable => {
                row.insert(field.wire.to_string(), Value::Null);
            }
            _ => {
                return Err(MappingError::MissingField {
                    table,
                    field: field.domain,
                })
            }
        }
    }

    Ok(Value::Object(row))
}

/// Converts a remote row back into a record tagged as synced.
///
/// `null` columns become absent fields; unmapped columns are ignored.
pub fn decode<T: Record>(row: Value) -> Result<T, MappingError> {
    let table = T::COLLECTION.table();
    let Value::Object(mut wire) = row else {
        return Err(MappingError::NotAnObject(table));
    };

    let mut domain = Map::new();
    for field in fields(T::COLLECTION) {
        match wire.remove(field.wire) {
            Some(Value::Null) | None => {}
            Some(v) => {
                domain.insert(field.domain.to_string(), v);
            }
        }
    }
    domain.insert("synced".to_string(), Value::Bool(true));

    serde_json::from_value(Value::Object(domain)).map_err(|source| MappingError::Json { table, source })
}
