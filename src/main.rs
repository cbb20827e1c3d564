// MIT License - Copyright (c) 2026 Peter Wright
// Receiver monitor

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use pioneer_avr::{
    AvrConfig, AvrConnection, AvrDisconnectionEvent, AvrStatusUpdateEvent, DisplayInformation,
    Response, ResponseType, TcpTransport, volume,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "avr-monitor")]
#[command(about = "Connect to a Pioneer receiver and log everything it reports")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "avr.toml")]
    config: String,

    /// Do not query power, volume, mute and input after connecting
    #[arg(long)]
    no_query: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    avr: AvrToml,
}

#[derive(Debug, Deserialize)]
struct AvrToml {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_zones")]
    zones: u8,
    #[serde(default = "default_connect_timeout")]
    connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout")]
    read_timeout_ms: u64,
    #[serde(default = "default_write_timeout")]
    write_timeout_ms: u64,
    #[serde(default = "default_close_timeout")]
    close_timeout_ms: u64,
    #[serde(default = "default_power_on_delay")]
    power_on_delay_ms: u64,
    #[serde(default = "default_reconnect_delay")]
    reconnect_delay_ms: u64,
}

fn default_port() -> u16 {
    23
}
fn default_zones() -> u8 {
    1
}
fn default_connect_timeout() -> u64 {
    5000
}
fn default_read_timeout() -> u64 {
    1000
}
fn default_write_timeout() -> u64 {
    5000
}
fn default_close_timeout() -> u64 {
    5000
}
fn default_power_on_delay() -> u64 {
    100
}
fn default_reconnect_delay() -> u64 {
    10000
}

fn build_avr_config(toml: &AvrToml) -> Result<AvrConfig> {
    if !(1..=pioneer_avr::MAX_ZONES).contains(&toml.zones) {
        anyhow::bail!(
            "zones must be between 1 and {}, got {}",
            pioneer_avr::MAX_ZONES,
            toml.zones
        );
    }
    let mut builder = AvrConfig::builder()
        .host(&toml.host)
        .port(toml.port)
        .zone_count(toml.zones)
        .connect_timeout_ms(toml.connect_timeout_ms)
        .read_timeout_ms(toml.read_timeout_ms)
        .write_timeout_ms(toml.write_timeout_ms)
        .close_timeout_ms(toml.close_timeout_ms)
        .power_on_delay_ms(toml.power_on_delay_ms)
        .reconnect_delay_ms(toml.reconnect_delay_ms);
    if let Some(name) = &toml.name {
        builder = builder.connection_name(name);
    }
    Ok(builder.build())
}

fn load_config(path: &str) -> Result<AvrConfig> {
    let text = std::fs::read_to_string(path).context("Failed to read config file")?;
    let config: Config = toml::from_str(&text).context("Failed to parse config file")?;
    build_avr_config(&config.avr)
}

// ---------------------------------------------------------------------------
// Line rendering
// ---------------------------------------------------------------------------

fn describe_line(line: &str) -> String {
    let response = match Response::parse(line) {
        Ok(response) => response,
        Err(e) => return format!("unclassified line {line:?} ({e})"),
    };
    match response.response_type() {
        ResponseType::DisplayInformation => match DisplayInformation::from_response(&response) {
            Some(info) => format!(
                "display {:?}{}{}",
                info.info_text().trim_matches(|c: char| c.is_control() || c == ' '),
                if info.is_volume_display() { " [volume]" } else { "" },
                if info.is_guide_icon() { " [guide]" } else { "" },
            ),
            None => response.to_string(),
        },
        ResponseType::VolumeLevel => {
            match response.parameter().and_then(|p| p.parse::<u32>().ok()) {
                Some(level) => format!(
                    "{response} ({:.1} dB, {}%)",
                    volume::device_to_db(level, response.zone()),
                    volume::device_to_percent(level, response.zone())
                ),
                None => response.to_string(),
            }
        }
        _ => response.to_string(),
    }
}

async fn query_zones(avr: &AvrConnection<TcpTransport>, config: &AvrConfig) {
    for zone in config.zones() {
        let results = [
            avr.send_power_query(zone).await,
            avr.send_volume_query(zone).await,
            avr.send_mute_query(zone).await,
            avr.send_input_source_query(zone).await,
        ];
        for result in results {
            match result {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Query for zone {zone} not sent, connection lost");
                    return;
                }
                Err(e) => warn!("Query for zone {zone} rejected: {e}"),
            }
        }
    }
    if let Err(e) = avr.send_listening_mode_query().await {
        warn!("Listening mode query rejected: {e}");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=pioneer_avr=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let mut avr_config = load_config(&cli.config)?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    'session: loop {
        let avr = AvrConnection::from_config(&avr_config);
        let disconnected = Arc::new(Notify::new());

        avr.add_update_listener(|event: &AvrStatusUpdateEvent| {
            info!("{}: {}", event.source, describe_line(&event.data));
        });
        {
            let disconnected = disconnected.clone();
            avr.add_disconnection_listener(move |event: &AvrDisconnectionEvent| {
                warn!("{}: disconnected ({})", event.source, event.cause);
                disconnected.notify_one();
            });
        }

        info!("Monitoring {}. Send SIGHUP to reload, SIGINT/SIGTERM to stop.", avr.name());
        let restart = loop {
            if avr.connect().await {
                if !cli.no_query {
                    query_zones(&avr, &avr_config).await;
                }
                tokio::select! {
                    _ = disconnected.notified() => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received SIGINT, shutting down...");
                        break false;
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                        break false;
                    }
                    _ = sighup.recv() => break true,
                }
            }

            // Retry policy lives here, not in the connection.
            info!("Reconnecting in {:?}", avr_config.reconnect_delay());
            tokio::select! {
                _ = sleep(avr_config.reconnect_delay()) => {}
                _ = tokio::signal::ctrl_c() => break false,
                _ = sigterm.recv() => break false,
                _ = sighup.recv() => break true,
            }
        };

        avr.close().await;

        if !restart {
            break 'session;
        }

        info!("Reloading config from {}", cli.config);
        match load_config(&cli.config) {
            Ok(new_config) => {
                avr_config = new_config;
                debug!("Config reloaded: {:?}", avr_config);
            }
            Err(e) => warn!("Failed to reload config, keeping previous: {e:#}"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}
