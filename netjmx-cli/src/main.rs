use anyhow::{Context, Result};
use clap::Parser;
use netjmx_core::logging::error_chain;
use netjmx_core::{Collector, JolokiaConnection, MBeanServerCollector, PluginConfig, Printer, ServerConfig};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JMX collector for netdata.
#[derive(Parser)]
#[command(name = "netjmx", version, about)]
struct Cli {
    /// Seconds between two collections. netdata passes this as the first argument.
    update_every: Option<u64>,

    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "jmx.yaml")]
    config: PathBuf,

    /// Logging verbosity level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the plugin protocol.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut printer = Printer::stdout();

    let mut config = match PluginConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "Could not load configuration");
            printer.disable()?;
            return Err(e).context("Failed to load configuration");
        }
    };
    if let Some(update_every) = cli.update_every.filter(|u| *u > 0) {
        config.update_every = update_every;
    }

    info!(
        servers = config.servers.len(),
        update_every = config.update_every,
        "netjmx starting"
    );

    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
    for server in config.effective_servers() {
        let name = server.name.clone();
        let mut collector = match build_collector(server) {
            Ok(collector) => collector,
            Err(e) => {
                warn!(server = %name, error = %format!("{:#}", e), "Skipping server");
                continue;
            }
        };

        match collector.get_runtime_name().await {
            Ok(runtime) => info!(server = %name, runtime = %runtime, "Connected to JVM"),
            Err(e) => warn!(server = %name, error = %error_chain(&e), "Could not identify JVM"),
        }

        let charts = collector.initialize().await;
        if charts.iter().all(|chart| chart.dimensions.is_empty()) {
            warn!(server = %name, "No dimension could be collected. Skipping server");
            collector.cleanup().await;
            continue;
        }
        for chart in charts {
            printer.define_chart(chart)?;
        }

        collectors.push(Box::new(collector));
    }

    if collectors.is_empty() {
        warn!("Nothing to collect. Disabling plugin");
        printer.disable()?;
        return Ok(());
    }

    let mut tick = interval(Duration::from_secs(config.update_every));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = report(&mut printer, &mut collectors).await {
                    warn!(error = %e, "Lost the connection to netdata");
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    for collector in &mut collectors {
        collector.cleanup().await;
    }

    Ok(())
}

fn build_collector(server: ServerConfig) -> Result<MBeanServerCollector> {
    let mut connection = JolokiaConnection::new(&server.url, Duration::from_millis(server.timeout_ms))
        .with_context(|| format!("Failed to create connection to {}", server.url))?;
    if let (Some(username), Some(password)) = (&server.username, &server.password) {
        connection = connection.with_credentials(username, password);
    }

    Ok(MBeanServerCollector::new(server, Arc::new(connection)))
}

/// One collection cycle over every collector, in order.
async fn report(printer: &mut Printer<Stdout>, collectors: &mut [Box<dyn Collector>]) -> io::Result<()> {
    for collector in collectors.iter_mut() {
        for chart in collector.collect().await {
            printer.collect(chart)?;
        }
    }
    Ok(())
}
