//! Request helpers shared by the provider clients. Every failure leaves here
//! already classified as a [`FailureKind`].

use crate::error::MonitorError;
use crate::fallback::error::FailureKind;
use log::debug;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

/// Query parameters that carry credentials and must not be logged.
const SECRET_PARAMS: [&str; 2] = ["appid", "api_key"];

/// Sends `request` and returns the response if its status is 2xx.
pub async fn send(request: RequestBuilder) -> Result<Response, FailureKind> {
    let response = request
        .send()
        .await
        .map_err(|e| FailureKind::from_reqwest(&e))?;
    debug!("{} -> {}", redacted(response.url()), response.status());

    let status = response.status();
    if !status.is_success() {
        return Err(FailureKind::from_status(status));
    }
    Ok(response)
}

/// Like [`send`], then reads the body as text.
pub async fn text(request: RequestBuilder) -> Result<String, FailureKind> {
    send(request)
        .await?
        .text()
        .await
        .map_err(|e| FailureKind::from_reqwest(&e))
}

/// Decodes a JSON body into the provider's typed schema.
pub fn decode<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, MonitorError> {
    serde_json::from_str(body).map_err(|source| MonitorError::MalformedPayload {
        provider: provider.to_string(),
        source,
    })
}

/// Wraps the failure of a provider called without a credential list.
pub fn upstream(provider: &str) -> impl FnOnce(FailureKind) -> MonitorError + '_ {
    move |failure| MonitorError::Upstream {
        provider: provider.to_string(),
        failure,
    }
}

/// The URL with credential query parameters masked.
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if SECRET_PARAMS.contains(&key.as_ref()) {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    if pairs.is_empty() {
        return masked.to_string();
    }
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_api_keys() {
        let url = Url::parse("https://example.org/data?lat=1.5&appid=secret-key").unwrap();
        let shown = redacted(&url);
        assert!(!shown.contains("secret-key"));
        assert!(shown.contains("lat=1.5"));
    }

    #[test]
    fn test_decode_error_is_malformed_payload() {
        let result: Result<Vec<u32>, _> = decode("demo", "{\"not\": \"a list\"}");
        assert!(matches!(
            result,
            Err(MonitorError::MalformedPayload { provider, .. }) if provider == "demo"
        ));
    }
}
