use std::{fmt, time::Duration};

use async_trait::async_trait;
use common::model::{
    game::Ply,
    messages::{BoardResponse, MoveResponse, SessionId, StartResponse},
};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Why a remote call produced no usable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // The request never completed: refused connection, timeout, dropped socket
    Unreachable(String),
    // The engine answered, but not with success (e.g. 404 for an unknown game)
    Status { code: u16, body: String },
    // The engine answered 2xx with a body that does not fit the contract
    Decode(String),
    // The request URL could not be built
    Endpoint(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unreachable(reason) => write!(f, "engine unreachable: {}", reason),
            ApiError::Status { code, body } => write!(f, "engine returned {}: {}", code, body),
            ApiError::Decode(reason) => write!(f, "unexpected engine response: {}", reason),
            ApiError::Endpoint(reason) => write!(f, "bad engine address: {}", reason),
        }
    }
}

impl std::error::Error for ApiError {}

/// The four operations of the remote checkers engine. No retries, no caching.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Always creates a new session.
    async fn start_session(&self) -> Result<StartResponse, ApiError>;

    async fn fetch_board(&self, id: &SessionId) -> Result<BoardResponse, ApiError>;

    /// A rejected move is still `Ok`, with `success == false`.
    async fn submit_move(&self, id: &SessionId, ply: Ply) -> Result<MoveResponse, ApiError>;

    /// Resets the board in place, the id stays valid.
    async fn reset_session(&self, id: &SessionId) -> Result<(), ApiError>;
}

pub struct HttpGameClient {
    client: Client,
    base_url: Url,
}

impl HttpGameClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        // Url::join replaces the last path segment unless the base ends in a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| ApiError::Endpoint(e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Endpoint(e.to_string()))?;
        Ok(HttpGameClient { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Endpoint(e.to_string()))
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        let status = response.status();
        debug!("Status: {:?}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Engine returned {}: {}", status, body);
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GameApi for HttpGameClient {
    async fn start_session(&self) -> Result<StartResponse, ApiError> {
        let url = self.endpoint("start")?;
        debug!("POSTing {}", url);
        Self::send_json(self.client.post(url)).await
    }

    async fn fetch_board(&self, id: &SessionId) -> Result<BoardResponse, ApiError> {
        let url = self.endpoint(&format!("board/{}", id))?;
        debug!("GETting {}", url);
        Self::send_json(self.client.get(url)).await
    }

    async fn submit_move(&self, id: &SessionId, ply: Ply) -> Result<MoveResponse, ApiError> {
        let url = self.endpoint(&format!("move/{}", id))?;
        debug!("POSTing {:?} to {}", ply, url);
        Self::send_json(self.client.post(url).json(&ply)).await
    }

    async fn reset_session(&self, id: &SessionId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("reset/{}", id))?;
        debug!("POSTing {}", url);
        Self::send(self.client.post(url)).await.map(|_| ())
    }
}
