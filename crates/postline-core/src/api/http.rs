//! HTTP transport over `reqwest`.

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ApiError, ApiResult, INBOX_PATH, InboxResponse, MessagesApi, SEND_PATH, SendReceipt,
    SendRequest,
};
use crate::config::Config;
use crate::model::Message;

/// Messaging backend client.
#[derive(Debug, Clone)]
pub struct HttpApi {
    inbox_url: String,
    send_url: String,
    http_client: Client,
}

impl HttpApi {
    /// Creates a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            inbox_url: config.api_url(INBOX_PATH),
            send_url: config.api_url(SEND_PATH),
            http_client,
        })
    }

    /// Decodes a response body, mapping non-success statuses and bad JSON.
    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::malformed(e.to_string()))
    }
}

impl MessagesApi for HttpApi {
    async fn fetch_messages(&self, token: &str) -> ApiResult<Vec<Message>> {
        debug!("GET {}", self.inbox_url);

        let response = self
            .http_client
            .get(&self.inbox_url)
            .bearer_auth(token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let inbox: InboxResponse = Self::decode(response).await?;
        Ok(inbox.data)
    }

    async fn send_message(&self, token: &str, request: &SendRequest) -> ApiResult<SendReceipt> {
        debug!("POST {}", self.send_url);

        let response = self
            .http_client
            .post(&self.send_url)
            .bearer_auth(token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await?;

        Self::decode(response).await
    }
}
