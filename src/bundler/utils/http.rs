//! HTTP utilities for fetching settings snapshots.

use crate::bundler::error::{Error, Result};

/// Downloads `url`, failing on any non-success status.
///
/// Returns the body as a byte vector.
pub async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);

    let response = client.get(url).send().await.map_err(|e| Error::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::FetchFailed {
            url: url.to_string(),
            reason: format!("server responded with {status}"),
        });
    }

    let bytes = response.bytes().await.map_err(|e| Error::FetchFailed {
        url: url.to_string(),
        reason: format!("failed to read response: {e}"),
    })?;

    Ok(bytes.to_vec())
}
