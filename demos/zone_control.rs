//! Example: Power on Zone 2, set its volume and input, then switch it off.

use std::time::Duration;

use pioneer_avr::{AvrConfig, AvrConnection, DeviceCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AvrConfig::builder().host("192.168.0.50").zone_count(2).build();
    let avr = AvrConnection::from_config(&config);
    let zone = 2;

    if !avr.send_power_command(&DeviceCommand::On, zone).await? {
        anyhow::bail!("receiver unreachable");
    }
    // Give the zone time to come up before changing its settings
    tokio::time::sleep(Duration::from_secs(2)).await;

    avr.send_volume_command(&DeviceCommand::Decimal(-35.0), zone).await?;
    avr.send_input_source_command(&DeviceCommand::Text("01".to_string()), zone)
        .await?;
    avr.send_mute_command(&DeviceCommand::Off, zone).await?;

    println!("Zone {zone} on for 10 seconds...");
    tokio::time::sleep(Duration::from_secs(10)).await;

    avr.send_power_command(&DeviceCommand::Off, zone).await?;
    avr.close().await;
    Ok(())
}
