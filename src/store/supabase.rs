use super::{Query, Store, StoreError, StoreResult, Table};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

/// PostgREST client for the hosted database
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.base_url, table.name())
    }

    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// PostgREST query parameters for a `Query`
fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for (column, value) in &query.eq {
        params.push((column.clone(), format!("eq.{}", value)));
    }
    if let Some(column) = &query.order_desc {
        params.push(("order".to_string(), format!("{}.desc", column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl Store for SupabaseStore {
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        debug!(table = table.name(), "insert");
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        Ok(rows.into_iter().next().unwrap_or(row))
    }

    async fn exists(&self, table: Table, column: &str, value: &str) -> StoreResult<bool> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[
                ("select", "id".to_string()),
                (column, format!("eq.{}", value)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        Ok(!rows.is_empty())
    }

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&query_params(query))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> StoreResult<()> {
        debug!(table = table.name(), id, "update");
        let response = self
            .authorized(self.client.patch(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> StoreResult<Value> {
        let response = self
            .authorized(self.client.post(format!("{}/rpc/{}", self.base_url, function)))
            .json(&args)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
