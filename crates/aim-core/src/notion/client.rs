//! Destination API client
//!
//! Typed client for the four operations the pipeline consumes: schema
//! fetch, paginated record query, archive mutation, record create. Every
//! request carries the integration bearer token and the pinned protocol
//! version header.

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::NotionConfig;
use crate::error::{Result, SyncError};

/// Protocol version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Database metadata returned by the schema fetch
#[derive(Debug, Deserialize)]
pub struct Database {
    /// Property definitions keyed by field name as declared
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// One page of a record query
#[derive(Debug, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<PageRef>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A record reference returned by a query
#[derive(Debug, Deserialize)]
pub struct PageRef {
    pub id: String,
}

/// Client bound to one destination database
pub struct NotionClient {
    client: Client,
    config: NotionConfig,
}

impl NotionClient {
    /// Create a new client for the configured database
    pub fn new(client: Client, config: NotionConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the database with its field schema.
    ///
    /// A non-success response is fatal for the run; there is no cached or
    /// fallback schema.
    pub async fn database(&self) -> Result<Database> {
        debug!("Fetching schema for database {}", self.config.database_id);

        let response = self
            .request(
                Method::GET,
                &format!("/v1/databases/{}", self.config.database_id),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("notion", response).await);
        }

        Ok(response.json().await?)
    }

    /// Fetch one page of records, resuming from `cursor` when given
    pub async fn query_page(&self, cursor: Option<&str>) -> Result<QueryPage> {
        let body = match cursor {
            Some(cursor) => json!({ "start_cursor": cursor }),
            None => json!({}),
        };

        let response = self
            .request(
                Method::POST,
                &format!("/v1/databases/{}/query", self.config.database_id),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("notion", response).await);
        }

        Ok(response.json().await?)
    }

    /// Archive (soft-delete) one record
    pub async fn archive_page(&self, page_id: &str) -> Result<()> {
        let response = self
            .request(Method::PATCH, &format!("/v1/pages/{}", page_id))
            .json(&json!({ "archived": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("notion", response).await);
        }

        Ok(())
    }

    /// Create one record under the database with the given property payload
    pub async fn create_page(&self, properties: &Map<String, Value>) -> Result<()> {
        let body = json!({
            "parent": { "database_id": self.config.database_id },
            "properties": properties,
        });

        let response = self
            .request(Method::POST, "/v1/pages")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("notion", response).await);
        }

        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.config.api_base, path))
            .bearer_auth(&self.config.token)
            .header("Notion-Version", NOTION_VERSION)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base: &str) -> NotionClient {
        NotionClient::new(
            Client::new(),
            NotionConfig {
                token: "secret_t".to_string(),
                database_id: "db-1".to_string(),
                api_base: base.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_database_sends_auth_and_version_headers() {
        let server = MockServer::start().await;

        Mock::given(http_method("GET"))
            .and(path("/v1/databases/db-1"))
            .and(header("Authorization", "Bearer secret_t"))
            .and(header("Notion-Version", NOTION_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": { "Name": { "type": "title" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let database = test_client(&server.uri()).database().await.unwrap();
        assert_eq!(database.properties.len(), 1);
    }

    #[tokio::test]
    async fn test_database_failure_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(http_method("GET"))
            .and(path("/v1/databases/db-1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("object_not_found"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).database().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Api {
                service: "notion",
                status: 404,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_query_page_resumes_from_cursor() {
        let server = MockServer::start().await;

        Mock::given(http_method("POST"))
            .and(path("/v1/databases/db-1/query"))
            .and(body_json(json!({ "start_cursor": "c1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "id": "p1" }],
                "has_more": false,
                "next_cursor": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server.uri())
            .query_page(Some("c1"))
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_create_page_scopes_to_parent_database() {
        let server = MockServer::start().await;

        Mock::given(http_method("POST"))
            .and(path("/v1/pages"))
            .and(body_json(json!({
                "parent": { "database_id": "db-1" },
                "properties": {
                    "Name": { "title": [{ "text": { "content": "vm-1" } }] }
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut properties = Map::new();
        properties.insert(
            "Name".to_string(),
            json!({ "title": [{ "text": { "content": "vm-1" } }] }),
        );

        test_client(&server.uri())
            .create_page(&properties)
            .await
            .unwrap();
    }
}
