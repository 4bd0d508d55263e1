pub mod geolocation;
pub mod position;

pub use geolocation::{GeolocationProvider, IpApiResponse, IpapiCoResponse, IpifyResponse};
pub use position::{OpenNotifyResponse, PositionFeed, WhereTheIssResponse};
