use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use upcachet::config::{ConfigFile, DEFAULT_CONFIG_FILE};
use upcachet::{liveness, signals};
use upcachet_adapters::cachet::CachetClient;
use upcachet_adapters::uptimerobot::UptimeRobotClient;
use upcachet_core::{discover, Scheduler, EXAMPLE_COMPONENTS, EXAMPLE_MONITOR};

#[derive(Parser, Debug)]
#[command(name = "upcachet")]
#[command(about = "Mirror Uptime Robot monitors onto a Cachet status page")]
#[command(version)]
struct Args {
    /// Path to the JSON config file (created with defaults if missing)
    #[arg(
        short,
        long = "config",
        env = "UPCACHET_CONFIG_FILE",
        default_value = DEFAULT_CONFIG_FILE
    )]
    config: PathBuf,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    info!("Upcachet - Uptime Robot -> Cachet bridge");
    info!("Version {}", env!("CARGO_PKG_VERSION"));
    info!(path = %args.config.display(), "Using config file");

    let mut config = ConfigFile::load(&args.config)?;
    if config.created {
        info!(path = %config.path().display(), "wrote default config file");
    }
    let settings = config.effective.clone();

    let cachet = CachetClient::builder()
        .endpoint(settings.cachet_endpoint()?)
        .api_key(settings.cachet_apikey()?)
        .build()?;
    cachet
        .ping()
        .await
        .context("could not reach the Cachet API")?;
    info!("Ping success");

    let uptimerobot = UptimeRobotClient::builder()
        .api_key(settings.uptimerobot_apikey()?)
        .build()?;

    let _liveness = match settings.bind_address()? {
        Some(addr) => Some(liveness::spawn(addr).await?),
        None => None,
    };

    let bindings = settings.bindings()?;

    if bindings.has_no_components() {
        discover(&uptimerobot, &cachet).await?;

        config.stored.monitor_components.insert(
            EXAMPLE_MONITOR.to_string(),
            EXAMPLE_COMPONENTS.to_vec(),
        );
        config.save()?;
        warn!(
            path = %config.path().display(),
            "please edit the config file to bind monitors to components, then restart"
        );
        return Ok(());
    }

    let mut builder = Scheduler::builder(Arc::new(uptimerobot), Arc::new(cachet)).bindings(bindings);
    if let Some(interval) = settings.check_interval()? {
        builder = builder.interval(interval);
    }

    let scheduler = builder.build().start();
    let _signals = signals::forward(scheduler.control())?;

    scheduler.join().await?;
    info!("Cleanly exiting");

    Ok(())
}
