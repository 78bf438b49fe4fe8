use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Payload for creating or replacing a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// A user record as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Error body returned by the service on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a structured error.
    #[error("service returned {status} (code {code}): {message}")]
    Api {
        status: StatusCode,
        code: u16,
        message: String,
    },

    /// Non-success status without a structured body.
    #[error("service returned {status}: {body}")]
    Unexpected { status: StatusCode, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Application error code, when the service sent one.
    pub fn code(&self) -> Option<u16> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub struct UserClient {
    client: Client,
    base_url: String,
}

impl UserClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`; returns the reported status string.
    pub async fn health(&self) -> Result<String, ClientError> {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }

        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let health: Health = decode(resp).await?;
        Ok(health.status)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        let resp = self
            .client
            .post(format!("{}/user", self.base_url))
            .json(user)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ClientError> {
        let resp = self
            .client
            .get(format!("{}/user/{}", self.base_url, id))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn update_user(&self, id: i64, user: &NewUser) -> Result<User, ClientError> {
        let resp = self
            .client
            .put(format!("{}/user/{}", self.base_url, id))
            .json(user)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(format!("{}/user/{}", self.base_url, id))
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    /// Raw Prometheus exposition text.
    pub async fn metrics(&self) -> Result<String, ClientError> {
        let resp = self
            .client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await?;
        Ok(check(resp).await?.text().await?)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await?;
    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => Err(ClientError::Api {
            status,
            code: body.code,
            message: body.message,
        }),
        Err(_) => Err(ClientError::Unexpected { status, body: text }),
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let text = check(resp).await?.text().await?;
    Ok(serde_json::from_str(&text)?)
}
