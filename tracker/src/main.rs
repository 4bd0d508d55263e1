use anyhow::Context;
use bridge::{BridgeState, HttpBridge, RenderMode};
use clap::{Parser, ValueEnum};
use isscore::upstream::{GeolocationProvider, PositionFeed};
use service::config::TrackerConfig;
use service::runner::TrackerService;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod bridge;
mod fallback;
mod service;
mod sources;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FeedArg {
    OpenNotify,
    WhereTheIss,
}

impl From<FeedArg> for PositionFeed {
    fn from(arg: FeedArg) -> Self {
        match arg {
            FeedArg::OpenNotify => PositionFeed::OpenNotify,
            FeedArg::WhereTheIss => PositionFeed::WhereTheIss,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GeolocationArg {
    IpApi,
    IpifyChain,
}

impl From<GeolocationArg> for GeolocationProvider {
    fn from(arg: GeolocationArg) -> Self {
        match arg {
            GeolocationArg::IpApi => GeolocationProvider::IpApi,
            GeolocationArg::IpifyChain => GeolocationProvider::IpifyChain,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Live ISS position tracker and dashboard bridge")]
struct Args {
    /// Load tracker settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    position_interval_ms: Option<u64>,
    #[arg(long)]
    trail_capacity: Option<usize>,
    /// Satellite position API to poll
    #[arg(long, value_enum)]
    feed: Option<FeedArg>,
    /// Viewer geolocation lookup
    #[arg(long, value_enum)]
    geolocation: Option<GeolocationArg>,
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Serve globe textures from a local directory
    #[arg(long)]
    local_textures: Option<String>,
    /// No globe: print status cards to the console instead
    #[arg(long, default_value_t = false)]
    text_only: bool,
}

impl Args {
    fn apply(&self, config: &mut TrackerConfig) {
        if let Some(interval) = self.position_interval_ms {
            config.position_interval_ms = interval;
        }
        if let Some(capacity) = self.trail_capacity {
            config.trail_capacity = capacity;
        }
        if let Some(feed) = self.feed {
            config.position_feed = feed.into();
        }
        if let Some(provider) = self.geolocation {
            config.geolocation = provider.into();
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(textures) = &self.local_textures {
            config.local_textures = Some(textures.clone());
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        TrackerConfig::load(path)?
    } else {
        TrackerConfig::default()
    };
    args.apply(&mut config);

    let mode = if args.text_only {
        RenderMode::TextOnly
    } else {
        RenderMode::Scene
    };

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tracker runtime")?;
    runtime.block_on(run(config, mode))
}

async fn run(config: TrackerConfig, mode: RenderMode) -> anyhow::Result<()> {
    let service = TrackerService::new(config);
    let tasks = service.start()?;

    let bridge = HttpBridge::start(
        BridgeState::new(service.session(), service.metrics(), service.textures(), mode),
        service.config().bind,
    )?;

    let report = match mode {
        RenderMode::TextOnly => {
            bridge.publish_status("3D visualization not available, printing status to the console.");
            Some(fallback::spawn_console_report(
                service.session(),
                service.config().report_interval(),
            ))
        }
        RenderMode::Scene => {
            bridge.publish_status(&format!(
                "Serving tracker state on http://{}/state (Ctrl+C to stop)...",
                bridge.addr()
            ));
            None
        }
    };

    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;

    if let Some(report) = report {
        report.shutdown().await;
    }
    tasks.shutdown().await;
    bridge.stop().await;
    Ok(())
}
