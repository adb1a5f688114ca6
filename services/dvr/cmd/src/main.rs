//! Distance-vector routing node binary.
//!
//! Connects to the relay, runs one routing session and prints the resulting
//! forwarding table when the relay sends QUIT.

use anyhow::Context;
use clap::Parser;
use dvr_routing::ForwardingTable;
use dvr_session::{HandlerConfig, ProtocolHandler, SessionEnd, TcpChannel};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod logging;

use config::{OutputFormat, RouterSettings, SettingsOverrides};
use logging::DvrLogFormatter;

/// Distance-vector routing node
#[derive(Parser, Debug)]
#[command(name = "dvr", version, about = "Distance-vector routing node")]
struct Args {
    /// Node ID, below the relay's ID
    #[arg(long)]
    node_id: Option<u32>,

    /// Relay host name or address
    #[arg(long)]
    relay_host: Option<String>,

    /// Relay TCP port
    #[arg(long)]
    relay_port: Option<u16>,

    /// Periodic advertisement interval, e.g. 1s or 250ms
    #[arg(long)]
    update_interval: Option<humantime::Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Forwarding table output format
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,

    /// Configuration file path (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            node_id: self.node_id,
            relay_host: self.relay_host.clone(),
            relay_port: self.relay_port,
            update_interval: self.update_interval.map(Into::into),
            output: self.output,
        }
    }
}

/// Install the subscriber and return the formatter's node-id slot
fn init_tracing(args: &Args) -> anyhow::Result<Arc<OnceLock<u32>>> {
    let env_filter = EnvFilter::new("warn")
        .add_directive(format!("dvr={}", args.log_level).parse()?)
        .add_directive(format!("dvr_session={}", args.log_level).parse()?)
        .add_directive(format!("dvr_routing={}", args.log_level).parse()?)
        .add_directive(format!("dvr_wire={}", args.log_level).parse()?);

    let formatter = DvrLogFormatter::new("dvr".to_string());
    let node_id_slot = formatter.node_id_slot();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(formatter)
        .init();
    Ok(node_id_slot)
}

fn render_table(table: &ForwardingTable, output: OutputFormat) -> anyhow::Result<String> {
    match output {
        OutputFormat::Text => Ok(table.to_string()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(table)
                .context("Failed to serialize forwarding table")?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let node_id_slot = init_tracing(&args)?;

    info!("Starting distance-vector router v{}", env!("CARGO_PKG_VERSION"));

    let settings = RouterSettings::load(args.config.as_deref(), &args.overrides())?;
    let _ = node_id_slot.set(settings.node_id);

    let channel = TcpChannel::connect(&settings.relay_host, settings.relay_port)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to relay at {}:{}",
                settings.relay_host, settings.relay_port
            )
        })?;
    info!("Connected to relay at {}", channel.peer_addr());

    let handler_config = HandlerConfig {
        node_id: settings.node_id,
        update_interval: settings.update_interval(),
    };
    let outcome = ProtocolHandler::new(handler_config, channel)
        .run()
        .await
        .with_context(|| format!("Session for node {} aborted", settings.node_id))?;

    print!("{}", render_table(&outcome.table, settings.output)?);

    match outcome.end {
        SessionEnd::Quit => {
            info!("Router for node {} shut down", settings.node_id);
            Ok(())
        }
        SessionEnd::ChannelFailed(e) => {
            error!("Connection to relay lost, table above is the last one computed");
            Err(e).context("Relay connection failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvr_wire::INFINITY;

    fn sample() -> ForwardingTable {
        ForwardingTable::new(1, vec![0, 1, 0], vec![2, 0, INFINITY])
    }

    #[test]
    fn test_render_text() {
        let text = render_table(&sample(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Forwarding table at node 1"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_render_json() {
        let json = render_table(&sample(), OutputFormat::Json).unwrap();
        let parsed: ForwardingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }
}
