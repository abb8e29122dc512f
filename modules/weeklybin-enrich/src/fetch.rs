//! Plain (non-browser) fetch for metadata extraction (spec.md §4.7 step 2).

use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[must_use]
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build metadata-fetch HTTP client")
}

/// Fetches `url`'s HTML body. `None` on any transport or non-2xx failure —
/// callers fall back to minimal metadata rather than surfacing the error.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Option<String> {
    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.text().await.ok()
}
