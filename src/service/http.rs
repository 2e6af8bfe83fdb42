//! JSON-over-HTTP client for the catalog and assistant services

use super::types::{ChatRequest, ChatResponse, CATALOG_PATH, CHAT_PATH};
use super::ServiceError;
use crate::markup::single_line;
use crate::runtime::{AssistantClient, CatalogClient};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
/// Cap on how much of an error body ends up in a banner
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Production client for both collaborator services
pub struct HttpServiceClient {
    client: Client,
    catalog_url: String,
    chat_url: String,
}

impl HttpServiceClient {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::network(format!("Failed to create HTTP client: {e}")))?;

        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            catalog_url: format!("{base}{CATALOG_PATH}"),
            chat_url: format!("{base}{CHAT_PATH}"),
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ServiceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::from_transport(&e))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_status(status, &body))
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> ServiceError {
    let detail: String = single_line(body.trim())
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();
    let message = if detail.is_empty() {
        format!("Service returned {status}")
    } else {
        format!("Service returned {status}: {detail}")
    };
    ServiceError::server_status(status.as_u16(), message)
}

/// Parse the catalog body: a JSON array of titles
fn parse_titles(body: &str) -> Result<Vec<String>, ServiceError> {
    serde_json::from_str::<Vec<String>>(body)
        .map_err(|e| ServiceError::malformed(format!("Catalog is not a list of titles: {e}")))
}

/// Parse the chat body and pull out the reply text
fn parse_reply(body: &str) -> Result<String, ServiceError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::malformed(format!("Reply is missing or malformed: {e}")))?;
    if response.reply.trim().is_empty() {
        return Err(ServiceError::malformed("Assistant sent an empty reply"));
    }
    Ok(response.reply)
}

#[async_trait]
impl CatalogClient for HttpServiceClient {
    async fn fetch_titles(&self) -> Result<Vec<String>, ServiceError> {
        let response = self
            .client
            .get(&self.catalog_url)
            .send()
            .await
            .map_err(|e| ServiceError::from_transport(&e))?;
        let body = Self::read_body(response).await?;
        parse_titles(&body)
    }
}

#[async_trait]
impl AssistantClient for HttpServiceClient {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::from_transport(&e))?;
        let body = Self::read_body(response).await?;
        parse_reply(&body)
    }
}
