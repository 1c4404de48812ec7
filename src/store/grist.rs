use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::record::{Record, RecordUpdate};
use super::traits::{RecordFilter, RecordStore};

/// Client for a single Grist document's REST API.
pub struct GristClient {
    client: Client,
    server: String,
    document: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct SqlRow {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SqlResponse {
    records: Vec<SqlRow>,
}

impl GristClient {
    pub fn new(server: String, document: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            server: server.trim_end_matches('/').to_string(),
            document,
            api_key,
        }
    }

    fn records_url(&self, table: &str) -> String {
        format!(
            "{}/api/docs/{}/tables/{}/records",
            self.server, self.document, table
        )
    }

    fn sql_url(&self) -> String {
        format!("{}/api/docs/{}/sql", self.server, self.document)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.api_key)
    }

    /// Map a non-success response to an error, reporting auth rejections distinctly.
    fn check_status(resp: &reqwest::Response, what: &str) -> Result<()> {
        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            warn!("grist {} auth rejected status={}", what, status.as_u16());
            return Err(anyhow!("auth_rejected: HTTP {}", status.as_u16()));
        }
        if !status.is_success() {
            warn!("grist {} failed status={}", what, status.as_u16());
            return Err(anyhow!("{} failed: HTTP {}", what, status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for GristClient {
    async fn fetch_table(
        &self,
        table: &str,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<Record>> {
        let mut req = self.authed(self.client.get(self.records_url(table)));
        if let Some(filter) = filter {
            req = req.query(&[("filter", serde_json::to_string(filter)?)]);
        }

        let resp = req.send().await?;
        Self::check_status(&resp, "fetch_table")?;

        let body: RecordsResponse = resp.json().await?;
        debug!("grist fetch_table table={} rows={}", table, body.records.len());
        Ok(body.records)
    }

    async fn update_records(&self, table: &str, updates: &[RecordUpdate]) -> Result<()> {
        let resp = self
            .authed(self.client.patch(self.records_url(table)))
            .json(&serde_json::json!({ "records": updates }))
            .send()
            .await?;
        Self::check_status(&resp, "update_records")?;

        debug!("grist update_records table={} rows={}", table, updates.len());
        Ok(())
    }

    async fn run_sql(&self, statement: &str) -> Result<Vec<Map<String, Value>>> {
        let resp = self
            .authed(self.client.get(self.sql_url()))
            .query(&[("q", statement)])
            .send()
            .await?;
        Self::check_status(&resp, "run_sql")?;

        let body: SqlResponse = resp.json().await?;
        debug!("grist run_sql rows={}", body.records.len());
        Ok(body.records.into_iter().map(|r| r.fields).collect())
    }
}
