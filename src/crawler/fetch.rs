use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("fetch failed with status {0}")]
    Status(StatusCode),
}

/// Client used for all page requests. Wikipedia wants a browser-looking
/// user agent; gzip responses are decompressed by reqwest.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().user_agent("Mozilla/5.0").build()
}

/// Fetch a page's raw document text. Transport compression and redirects
/// (Special:Random is one big redirect) are the client's business.
pub async fn fetch_document(
    url: &Url,
    client: &Client,
    timeout_sec: u64,
) -> Result<String, FetchError> {
    let response = client
        .get(url.clone())
        .timeout(Duration::from_secs(timeout_sec))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    Ok(response.text().await?)
}
