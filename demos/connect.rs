//! Example: Connect to a receiver, query the main zone and print what it reports.

use pioneer_avr::{AvrConfig, AvrConnection, AvrDisconnectionEvent, AvrStatusUpdateEvent, Response};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AvrConfig::builder()
        .host("192.168.0.50")
        .port(23)
        .connection_name("living-room")
        .build();

    let avr = AvrConnection::from_config(&config);
    avr.add_update_listener(|event: &AvrStatusUpdateEvent| match Response::parse(&event.data) {
        Ok(response) => println!("  {response}"),
        Err(e) => println!("  ? {e}"),
    });
    avr.add_disconnection_listener(|event: &AvrDisconnectionEvent| {
        println!("Disconnected from {}: {}", event.source, event.cause);
    });

    println!("Connecting to {}...", config.address());
    if !avr.connect().await {
        anyhow::bail!("could not connect to {}", config.address());
    }

    avr.send_power_query(1).await?;
    avr.send_volume_query(1).await?;
    avr.send_mute_query(1).await?;
    avr.send_input_source_query(1).await?;
    avr.send_listening_mode_query().await?;

    println!("\nPress Ctrl+C to disconnect...");
    tokio::signal::ctrl_c().await?;
    avr.close().await;
    println!("Disconnected.");

    Ok(())
}
