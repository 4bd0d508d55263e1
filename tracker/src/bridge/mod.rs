pub mod model;
pub mod server;

pub use model::RenderMode;
pub use server::{BridgeState, HttpBridge};
