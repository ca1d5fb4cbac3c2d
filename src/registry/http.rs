use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::RegistryError;

/// Builds the HTTP client shared by the registry adapters.
///
/// Every request carries the static user agent and is bounded by `timeout`.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// Sends a GET request and decodes a JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RegistryError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegistryError::Status(status.as_u16()));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Sends a GET request and reports whether the resource exists.
///
/// 404 and 410 mean the identifier is absent; any other failure status is
/// an error.
pub(crate) async fn probe(request: RequestBuilder) -> Result<bool, RegistryError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Ok(false)
    } else {
        Err(RegistryError::Status(status.as_u16()))
    }
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
