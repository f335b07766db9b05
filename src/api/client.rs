use crate::api::RequestBody;
use crate::error::{FaqError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// POST a chat-completions request. Non-success statuses become
/// `FaqError::ApiError` carrying the response body.
pub async fn make_api_request(
    api_key: &str,
    api_endpoint: &str,
    request_body: &RequestBody,
) -> Result<reqwest::Response> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| FaqError::ConfigError(format!("Invalid authorization header: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    // One client per request: each exchange runs on its own short-lived runtime
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    let response = client.post(api_endpoint).json(&request_body).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(FaqError::ApiError { status, message });
    }

    Ok(response)
}
