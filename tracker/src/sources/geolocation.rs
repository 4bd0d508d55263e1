use crate::service::config::TrackerConfig;
use crate::sources::fetch_body;
use isscore::scheduler::{ChainedGeolocation, GeolocationSource, IpGeolocator, IpLookup};
use isscore::tracking::ResolvedLocation;
use isscore::upstream::geolocation::{IPAPI_CO_BASE_URL, IPIFY_URL, IP_API_URL};
use isscore::upstream::{GeolocationProvider, IpApiResponse, IpapiCoResponse, IpifyResponse};
use isscore::TrackerResult;

/// Single-request lookup against ip-api.com.
pub struct IpApiClient {
    client: reqwest::Client,
    url: String,
}

impl IpApiClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl GeolocationSource for IpApiClient {
    async fn locate(&self) -> TrackerResult<ResolvedLocation> {
        let body = fetch_body(&self.client, &self.url).await?;
        IpApiResponse::decode(&body)?.into_location()
    }
}

pub struct IpifyClient {
    client: reqwest::Client,
    url: String,
}

impl IpifyClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl IpLookup for IpifyClient {
    async fn public_ip(&self) -> TrackerResult<String> {
        let body = fetch_body(&self.client, &self.url).await?;
        IpifyResponse::decode(&body)
    }
}

pub struct IpapiCoClient {
    client: reqwest::Client,
    base_url: String,
}

impl IpapiCoClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl IpGeolocator for IpapiCoClient {
    async fn locate_ip(&self, ip: &str) -> TrackerResult<ResolvedLocation> {
        let url = IpapiCoResponse::url_for(&self.base_url, ip);
        let body = fetch_body(&self.client, &url).await?;
        IpapiCoResponse::decode(&body)?.into_location(ip)
    }
}

/// The geolocation integration selected by configuration.
pub enum GeolocationClient {
    IpApi(IpApiClient),
    IpifyChain(ChainedGeolocation<IpifyClient, IpapiCoClient>),
}

impl GeolocationClient {
    pub fn from_config(client: reqwest::Client, config: &TrackerConfig) -> Self {
        match config.geolocation {
            GeolocationProvider::IpApi => GeolocationClient::IpApi(IpApiClient::new(
                client,
                config.ip_api_url.as_deref().unwrap_or(IP_API_URL),
            )),
            GeolocationProvider::IpifyChain => GeolocationClient::IpifyChain(ChainedGeolocation::new(
                IpifyClient::new(
                    client.clone(),
                    config.ipify_url.as_deref().unwrap_or(IPIFY_URL),
                ),
                IpapiCoClient::new(
                    client,
                    config.ipapi_co_url.as_deref().unwrap_or(IPAPI_CO_BASE_URL),
                ),
            )),
        }
    }
}

impl GeolocationSource for GeolocationClient {
    async fn locate(&self) -> TrackerResult<ResolvedLocation> {
        match self {
            GeolocationClient::IpApi(client) => client.locate().await,
            GeolocationClient::IpifyChain(chain) => chain.locate().await,
        }
    }
}
