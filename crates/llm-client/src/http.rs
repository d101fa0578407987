//! Shared request helper for the reqwest-based adapters.

use serde::de::DeserializeOwned;

use crate::ProviderError;

/// Sends the request and decodes a JSON body. Non-2xx responses become
/// [`ProviderError::Status`] carrying the body text; decode failures become
/// [`ProviderError::Payload`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| ProviderError::Payload(format!("{}: {}", e, body)))
}

/// Builds the shared client with the provider timeout applied.
pub(crate) fn client(timeout: std::time::Duration) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
