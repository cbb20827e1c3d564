// MIT License - Copyright (c) 2026 Peter Wright
// Pioneer AVR IP control
//
//! # pioneer-avr
//!
//! Zone-aware client for the line-based IP control protocol of Pioneer AV
//! receivers.
//!
//! Commands are short text tokens terminated by `\r` (`PO`, `?V`, `050VL`);
//! the receiver answers, and also reports changes made on the front panel or
//! remote, with text lines such as `PWR0` or `VOL050`. The client does not
//! pair requests with responses: it writes commands and hands every received
//! line to the registered listeners, which classify it with
//! [`Response::parse`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use pioneer_avr::{AvrConfig, AvrConnection, AvrStatusUpdateEvent, DeviceCommand, Response};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AvrConfig::builder()
//!         .host("192.168.0.50")
//!         .port(23)
//!         .build();
//!
//!     let avr = AvrConnection::from_config(&config);
//!     avr.add_update_listener(|event: &AvrStatusUpdateEvent| {
//!         match Response::parse(&event.data) {
//!             Ok(response) => println!("{response}"),
//!             Err(e) => println!("ignored: {e}"),
//!         }
//!     });
//!
//!     avr.send_power_command(&DeviceCommand::On, 1).await?;
//!     avr.send_volume_command(&DeviceCommand::Percent(25), 1).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     avr.close().await;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod display;
pub mod error;
pub mod event;
pub mod factory;
pub mod response;
pub mod transport;
pub mod volume;

// Re-exports for convenience
pub use command::{
    AvrCommand, DeviceCommand, ParameterizedCommand, ParameterizedCommandType, SimpleCommand,
    SimpleCommandType, MAX_ZONES,
};
pub use config::{AvrConfig, AvrConfigBuilder};
pub use connection::{AvrConnection, ConnectionState};
pub use display::{DisplayFlags, DisplayInformation};
pub use error::{ProtocolError, Result};
pub use event::{
    AvrDisconnectionEvent, AvrDisconnectionListener, AvrStatusUpdateEvent, AvrUpdateListener,
};
pub use response::{Response, ResponseClassifier, ResponseType};
pub use transport::{TcpTransport, Transport};
