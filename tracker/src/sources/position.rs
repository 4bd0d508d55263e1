use crate::sources::fetch_body;
use isscore::scheduler::PositionSource;
use isscore::upstream::PositionFeed;
use isscore::{GeoCoordinate, TrackerResult};

/// Polls a satellite position endpoint and decodes it as the pinned feed.
pub struct HttpPositionSource {
    client: reqwest::Client,
    feed: PositionFeed,
    url: String,
}

impl HttpPositionSource {
    pub fn new(client: reqwest::Client, feed: PositionFeed, url: impl Into<String>) -> Self {
        Self {
            client,
            feed,
            url: url.into(),
        }
    }
}

impl PositionSource for HttpPositionSource {
    async fn fetch_position(&self) -> TrackerResult<GeoCoordinate> {
        let body = fetch_body(&self.client, &self.url).await?;
        self.feed.decode(&body)
    }
}
