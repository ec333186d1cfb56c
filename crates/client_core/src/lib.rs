use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Employee, EmployeeFields, EmployeeId},
    protocol::ApiResponse,
};
use tracing::{debug, warn};
use url::Url;

pub mod error;

pub use error::DirectoryError;

use error::classify_reqwest_error;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One request per call: no retries, no caching.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<Employee>, DirectoryError>;
    async fn create(&self, fields: &EmployeeFields) -> Result<Employee, DirectoryError>;
    async fn replace(
        &self,
        id: &EmployeeId,
        fields: &EmployeeFields,
    ) -> Result<Employee, DirectoryError>;
    async fn remove(&self, id: &EmployeeId) -> Result<(), DirectoryError>;
}

pub struct HttpEmployeeDirectory {
    http: Client,
    base_url: Url,
}

impl HttpEmployeeDirectory {
    pub fn new(base_url: &str) -> Result<Self, DirectoryError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DirectoryError::transport(format!("failed to build http client: {err}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn collection_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("employees");
        }
        url
    }

    fn record_url(&self, id: &EmployeeId) -> Url {
        let mut url = self.collection_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id.as_str());
        }
        url
    }
}

#[async_trait]
impl EmployeeDirectory for HttpEmployeeDirectory {
    async fn list(&self) -> Result<Vec<Employee>, DirectoryError> {
        let url = self.collection_url();
        debug!(%url, "listing employees");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| classify_reqwest_error(&err))?;
        read_envelope(response, None).await
    }

    async fn create(&self, fields: &EmployeeFields) -> Result<Employee, DirectoryError> {
        let url = self.collection_url();
        debug!(%url, "creating employee");
        let response = self
            .http
            .post(url)
            .json(fields)
            .send()
            .await
            .map_err(|err| classify_reqwest_error(&err))?;
        read_envelope(response, None).await
    }

    async fn replace(
        &self,
        id: &EmployeeId,
        fields: &EmployeeFields,
    ) -> Result<Employee, DirectoryError> {
        let url = self.record_url(id);
        debug!(%url, "replacing employee");
        let response = self
            .http
            .put(url)
            .json(fields)
            .send()
            .await
            .map_err(|err| classify_reqwest_error(&err))?;
        read_envelope(response, Some(id)).await
    }

    async fn remove(&self, id: &EmployeeId) -> Result<(), DirectoryError> {
        let url = self.record_url(id);
        debug!(%url, "removing employee");
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|err| classify_reqwest_error(&err))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound { id: id.clone() });
        }
        if !status.is_success() {
            let message = rejection_message(response).await;
            warn!(status = status.as_u16(), %message, "remove rejected");
            return Err(DirectoryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: Response,
    id: Option<&EmployeeId>,
) -> Result<T, DirectoryError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(DirectoryError::NotFound { id: id.clone() });
        }
    }
    if !status.is_success() {
        let message = rejection_message(response).await;
        warn!(status = status.as_u16(), %message, "request rejected");
        return Err(DirectoryError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| classify_reqwest_error(&err))?;
    let envelope: ApiResponse<T> =
        serde_json::from_slice(&bytes).map_err(|err| DirectoryError::Malformed {
            message: err.to_string(),
        })?;
    if !envelope.success {
        return Err(DirectoryError::Rejected {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| "request reported success: false".to_string()),
        });
    }
    envelope.data.ok_or_else(|| DirectoryError::Malformed {
        message: "response envelope has no data".to_string(),
    })
}

async fn rejection_message(response: Response) -> String {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string();
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
