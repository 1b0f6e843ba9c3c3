use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use freshcut_core::scrape::{FetchError, PageFetcher};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Plain HTTP fetcher for wiki pages. A page that does not exist comes back
/// as a non-success status, which the lookup layer surfaces as a
/// user-facing "could not find" notice.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "fetching wiki page");
        let response = self.client.get(url).send().await.map_err(|error| {
            FetchError::Unreachable { url: url.to_owned(), reason: error.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Unreachable {
                url: url.to_owned(),
                reason: status.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|error| FetchError::Unreachable {
            url: url.to_owned(),
            reason: error.to_string(),
        })?;
        Ok(body.to_vec())
    }
}
