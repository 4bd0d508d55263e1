/// Serves warp `routes` on an ephemeral local port and yields its address.
#[cfg(test)]
macro_rules! serve_locally {
    ($routes:expr) => {{
        let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }};
}

#[cfg(test)]
pub(crate) use serve_locally;

pub mod geolocation;
pub mod position;

use isscore::{TrackerError, TrackerResult};
use std::time::Duration;

pub use geolocation::GeolocationClient;
pub use position::HttpPositionSource;

/// Shared HTTP client with the per-request timeout applied.
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("iss-tracker/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// GETs `url` and returns the body of a 2xx response.
pub(crate) async fn fetch_body(client: &reqwest::Client, url: &str) -> TrackerResult<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TrackerError::Transport(format!("{url}: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(TrackerError::Upstream(format!("{url}: HTTP {status}")));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| TrackerError::Transport(format!("{url}: {e}")))?;
    Ok(body.to_vec())
}
