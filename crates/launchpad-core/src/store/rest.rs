use super::{not_found, Fields, Record, RemoteStore};
use crate::error::{LaunchpadError, Result};
use crate::types::{Collection, Filters, Scalar};
use chrono::Utc;
use reqwest::{Method, RequestBuilder};

/// Client for a PostgREST-compatible endpoint (`{base}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.table_url(collection))
            .header("Prefer", "return=representation");
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    /// Send a request and decode the row array PostgREST answers with.
    async fn rows(&self, req: RequestBuilder) -> Result<Vec<Record>> {
        let resp = req
            .send()
            .await
            .map_err(|e| LaunchpadError::Persistence(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LaunchpadError::Persistence(format!("{status}: {body}")));
        }
        resp.json::<Vec<Record>>()
            .await
            .map_err(|e| LaunchpadError::Persistence(format!("unreadable response: {e}")))
    }

    async fn single(
        &self,
        req: RequestBuilder,
        collection: Collection,
        id: &str,
    ) -> Result<Record> {
        self.rows(req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(collection, id))
    }
}

/// Rows come back in insertion order; `id` breaks ties between rows
/// created in the same instant.
const INSERTION_ORDER: &str = "created_at.asc,id.asc";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// PostgREST filter operand for one column.
fn filter_operand(value: &Scalar) -> String {
    match value {
        Scalar::Null => "is.null".to_string(),
        other => eq(other),
    }
}

impl RemoteStore for RestStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Record> {
        let req = self
            .request(Method::GET, collection)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        self.single(req, collection, id).await
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record> {
        let req = self.request(Method::POST, collection).json(&record);
        self.rows(req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                LaunchpadError::Persistence(format!("insert into {collection} returned no row"))
            })
    }

    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<Record> {
        tracing::info!(%collection, id, columns = fields.len(), "PATCH");
        let req = self
            .request(Method::PATCH, collection)
            .query(&[("id", eq(id))])
            .json(&fields);
        self.single(req, collection, id).await
    }

    async fn toggle(&self, item_id: &str, completed: bool) -> Result<Record> {
        let collection = Collection::ChecklistItems;
        let body = serde_json::json!({
            "is_completed": completed,
            "completed_at": if completed { Some(Utc::now().to_rfc3339()) } else { None },
        });
        let req = self
            .request(Method::PATCH, collection)
            .query(&[("id", eq(item_id))])
            .json(&body);
        self.single(req, collection, item_id).await
    }

    async fn list(&self, collection: Collection, filters: &Filters) -> Result<Vec<Record>> {
        let mut params: Vec<(String, String)> = vec![("select".into(), "*".into())];
        params.extend(
            filters
                .iter()
                .map(|(col, v)| (col.clone(), filter_operand(v))),
        );
        params.push(("order".into(), INSERTION_ORDER.into()));
        let req = self.request(Method::GET, collection).query(&params);
        self.rows(req).await
    }
}
