//! rcpanel - web control panel for an rclone engine.

use anyhow::Result;
use clap::Parser;
use rcpanel_core::{RcClient, RcConfig, TransportConfig};
use rcpanel_server::{start_server, AppState, ServerConfig};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "rcpanel")]
#[command(about = "Web control panel for rclone")]
struct Args {
    /// Address to serve the panel on (port 0 = auto-assign)
    #[arg(long, default_value = ServerConfig::DEFAULT_ADDR)]
    addr: String,

    /// URL of a running `rclone rcd`
    #[arg(long, env = "RCLONE_URL", default_value = RcConfig::DEFAULT_URL)]
    rclone: String,

    /// RC basic-auth user
    #[arg(long, env = "RCLONE_USER")]
    user: Option<String>,

    /// RC basic-auth password
    #[arg(long, env = "RCLONE_PASS")]
    pass: Option<String>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Engine selection; `--embedded` exists only in builds that link librclone.
#[cfg(feature = "librclone")]
#[derive(clap::Args, Debug)]
struct EngineArgs {
    /// Run the engine in-process instead of connecting over HTTP
    #[arg(long)]
    embedded: bool,
}

#[cfg(not(feature = "librclone"))]
#[derive(clap::Args, Debug)]
struct EngineArgs {}

impl EngineArgs {
    #[cfg(feature = "librclone")]
    fn embedded(&self) -> bool {
        self.embedded
    }

    #[cfg(not(feature = "librclone"))]
    fn embedded(&self) -> bool {
        false
    }
}

impl Args {
    fn transport_config(&self) -> TransportConfig {
        if self.engine.embedded() {
            TransportConfig::Embedded
        } else {
            TransportConfig::http(self.rclone.clone(), self.user.clone(), self.pass.clone())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides the level flag
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting rcpanel");

    let transport = rcpanel_core::transport::from_config(&args.transport_config())?;
    let client = RcClient::new(transport);

    let addr = start_server(AppState::new(client.clone()), &args.addr).await?;

    // Intentional stdout so wrappers can find the panel
    println!("RCPANEL_URL=http://{}", addr);

    info!("Panel running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, closing engine");
    client.close().await;

    Ok(())
}
