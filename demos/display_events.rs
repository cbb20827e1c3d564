//! Example: Mirror the receiver's front-panel display.

use pioneer_avr::{AvrConfig, AvrConnection, AvrStatusUpdateEvent, DisplayInformation, Response};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AvrConfig::builder().host("192.168.0.50").build();
    let avr = AvrConnection::from_config(&config);

    avr.add_update_listener(|event: &AvrStatusUpdateEvent| {
        let Ok(response) = Response::parse(&event.data) else {
            return;
        };
        if let Some(info) = DisplayInformation::from_response(&response) {
            let marker = if info.is_volume_display() { "VOL" } else { "   " };
            println!("[{marker}] {}", info.info_text().trim());
        }
    });

    if !avr.connect().await {
        anyhow::bail!("could not connect to {}", config.address());
    }

    println!("Watching display, press Ctrl+C to stop...");
    tokio::signal::ctrl_c().await?;
    avr.close().await;
    Ok(())
}
