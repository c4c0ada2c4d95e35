//! REST client for the hosted record tables.
//!
//! Talks to a PostgREST-style endpoint at `{base_url}/rest/v1/{table}`.
//! Every request carries the project key twice: as `apikey` and as a
//! bearer token.

use std::future::Future;
use std::time::Duration;

use reqwest::RequestBuilder;
use serde_json::Value;

use super::error::RemoteError;
use super::mapping;
use crate::config::RemoteConfig;
use crate::models::{now_millis, Record};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// The remote side of reconciliation.
///
/// `push` reports failure as `false` and never errors; `pull` keeps
/// "the remote has nothing" (`Ok(vec![])`) apart from "the remote could not
/// be read" (`Err`).
pub trait RemoteStore: Send + Sync {
    /// Inserts one record. Returns whether the remote accepted it.
    fn push<T: Record>(&self, record: &T) -> impl Future<Output = bool> + Send;

    /// Records with a timestamp in the last `since_days` days, newest first.
    fn pull<T: Record>(
        &self,
        since_days: u32,
    ) -> impl Future<Output = Result<Vec<T>, RemoteError>> + Send;
}

/// HTTP client for the remote record store.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl RemoteClient {
    /// Creates a client from config.
    ///
    /// Returns an error if the base URL or API key is missing.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url = config
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or(RemoteError::NotConfigured)?;
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(RemoteError::NotConfigured)?;

        Ok(Self::new(base_url, api_key))
    }

    /// Creates a client with explicit parameters.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Inserts one record, surfacing the failure reason.
    pub async fn insert<T: Record>(&self, record: &T) -> Result<(), RemoteError> {
        let table = T::COLLECTION.table();
        let row = mapping::encode(record)?;

        let response = self
            .authorized(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                table,
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Inserted {} into {}", record.id(), table);
        Ok(())
    }

    /// Fetches records with `timestamp >= cutoff_ms`, newest first.
    pub async fn select_since<T: Record>(&self, cutoff_ms: i64) -> Result<Vec<T>, RemoteError> {
        let table = T::COLLECTION.table();
        let cutoff = format!("gte.{}", cutoff_ms);

        let response = self
            .authorized(self.http.get(self.table_url(table)))
            .query(&[
                ("select", "*"),
                ("timestamp", cutoff.as_str()),
                ("order", "timestamp.desc"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                table,
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Value> = response.json().await?;
        let records = rows
            .into_iter()
            .map(mapping::decode)
            .collect::<Result<Vec<T>, _>>()?;

        tracing::debug!("Fetched {} row(s) from {}", records.len(), table);
        Ok(records)
    }

    /// Checks that the remote is reachable and the key is accepted.
    pub async fn check_connection(&self) -> Result<(), RemoteError> {
        let table = crate::models::Collection::Vitals.table();
        let response = self
            .authorized(self.http.get(self.table_url(table)))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status {
                table,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

impl RemoteStore for RemoteClient {
    async fn push<T: Record>(&self, record: &T) -> bool {
        match self.insert(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Push of {} {} failed: {}", T::COLLECTION.label(), record.id(), e);
                false
            }
        }
    }

    async fn pull<T: Record>(&self, since_days: u32) -> Result<Vec<T>, RemoteError> {
        let cutoff = now_millis() - i64::from(since_days) * MS_PER_DAY;
        self.select_since(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedicineRecord, Nurse, NurseReport, Patient, VitalRecord};
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const KEY: &str = "test-key";

    #[derive(Clone, Default)]
    struct FakeRest {
        rows: Arc<Mutex<HashMap<String, Vec<Value>>>>,
        broken: bool,
    }

    impl FakeRest {
        fn seed(&self, table: &str, row: Value) {
            self.rows
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .push(row);
        }

        fn table(&self, table: &str) -> Vec<Value> {
            self.rows
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default()
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
        let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
        apikey == Some(KEY) && bearer == Some("Bearer test-key")
    }

    async fn insert_row(
        State(state): State<FakeRest>,
        Path(table): Path<String>,
        headers: HeaderMap,
        Json(row): Json<Value>,
    ) -> StatusCode {
        if state.broken {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED;
        }
        state.seed(&table, row);
        StatusCode::CREATED
    }

    async fn select_rows(
        State(state): State<FakeRest>,
        Path(table): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Value>>, StatusCode> {
        if state.broken {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let cutoff = params
            .get("timestamp")
            .and_then(|v| v.strip_prefix("gte."))
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(i64::MIN);
        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        let mut rows: Vec<Value> = state
            .table(&table)
            .into_iter()
            .filter(|row| row["timestamp"].as_i64().unwrap_or(i64::MIN) >= cutoff)
            .collect();
        if params.get("order").map(String::as_str) == Some("timestamp.desc") {
            rows.sort_by_key(|row| std::cmp::Reverse(row["timestamp"].as_i64()));
        }
        rows.truncate(limit);

        Ok(Json(rows))
    }

    async fn spawn_server(state: FakeRest) -> String {
        let app = Router::new()
            .route("/rest/v1/{table}", get(select_rows).post(insert_row))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn vital(timestamp: i64) -> VitalRecord {
        VitalRecord::new(Patient::Jorge, Nurse::Monica, 72, 16, 97)
            .with_pressure(120, 80)
            .with_timestamp(timestamp)
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let missing_key = RemoteConfig {
            base_url: Some("https://example.test".to_string()),
            api_key: None,
        };
        assert!(matches!(
            RemoteClient::from_config(&missing_key),
            Err(RemoteError::NotConfigured)
        ));

        let blank_url = RemoteConfig {
            base_url: Some("  ".to_string()),
            api_key: Some(KEY.to_string()),
        };
        assert!(RemoteClient::from_config(&blank_url).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = RemoteClient::new("https://example.test/", KEY);
        assert_eq!(client.base_url(), "https://example.test");
        assert_eq!(
            client.table_url("vital_records"),
            "https://example.test/rest/v1/vital_records"
        );
    }

    #[tokio::test]
    async fn test_push_sends_mapped_row() {
        let state = FakeRest::default();
        let client = RemoteClient::new(spawn_server(state.clone()).await, KEY);
        let record = vital(now_millis());

        assert!(client.push(&record).await);

        let rows = state.table("vital_records");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], record.id.as_str());
        assert_eq!(rows[0]["nurse_name"], "Mónica");
        assert_eq!(rows[0]["ta_sys"], 120);
        assert_eq!(rows[0]["glucose"], Value::Null);
        assert!(rows[0].get("synced").is_none());
    }

    #[tokio::test]
    async fn test_push_then_pull_round_trip() {
        let state = FakeRest::default();
        let client = RemoteClient::new(spawn_server(state).await, KEY);
        let record = vital(now_millis());

        assert!(client.push(&record).await);
        let pulled: Vec<VitalRecord> = client.pull(60).await.unwrap();

        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].id, record.id);
        assert_eq!(pulled[0].ta_sys, Some(120));
        assert_eq!(pulled[0].ta_dia, Some(80));
        assert!(pulled[0].synced);
    }

    #[tokio::test]
    async fn test_pull_applies_lookback_and_order() {
        let state = FakeRest::default();
        let now = now_millis();
        let old = vital(now - 90 * MS_PER_DAY);
        let older = vital(now - 2 * MS_PER_DAY);
        let newer = vital(now - MS_PER_DAY);
        for record in [&old, &older, &newer] {
            state.seed("vital_records", mapping::encode(record).unwrap());
        }
        let client = RemoteClient::new(spawn_server(state).await, KEY);

        let pulled: Vec<VitalRecord> = client.pull(60).await.unwrap();

        let ids: Vec<&str> = pulled.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
    }

    #[tokio::test]
    async fn test_pull_empty_table_is_ok_empty() {
        let client = RemoteClient::new(spawn_server(FakeRest::default()).await, KEY);
        let pulled: Vec<MedicineRecord> = client.pull(60).await.unwrap();
        assert!(pulled.is_empty());
    }

    #[tokio::test]
    async fn test_pull_server_error_is_err() {
        let state = FakeRest {
            broken: true,
            ..Default::default()
        };
        let client = RemoteClient::new(spawn_server(state).await, KEY);

        let result: Result<Vec<NurseReport>, _> = client.pull(60).await;
        assert!(matches!(result, Err(RemoteError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_pull_malformed_row_is_err() {
        let state = FakeRest::default();
        state.seed(
            "medicine_records",
            json!({ "id": "m1", "patient": "Jorge", "timestamp": now_millis() }),
        );
        let client = RemoteClient::new(spawn_server(state).await, KEY);

        let result: Result<Vec<MedicineRecord>, _> = client.pull(60).await;
        assert!(matches!(result, Err(RemoteError::Mapping(_))));
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected() {
        let state = FakeRest::default();
        let client = RemoteClient::new(spawn_server(state.clone()).await, "wrong");

        assert!(!client.push(&vital(now_millis())).await);
        assert!(state.table("vital_records").is_empty());
        assert!(client.check_connection().await.is_err());
    }

    #[tokio::test]
    async fn test_push_to_unreachable_server_is_false() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = RemoteClient::new(format!("http://{}", addr), KEY);

        assert!(!client.push(&vital(now_millis())).await);
        let pulled: Result<Vec<VitalRecord>, _> = client.pull(60).await;
        assert!(matches!(pulled, Err(RemoteError::Http(_))));
    }

    #[tokio::test]
    async fn test_check_connection_ok() {
        let client = RemoteClient::new(spawn_server(FakeRest::default()).await, KEY);
        assert!(client.check_connection().await.is_ok());
    }
}
