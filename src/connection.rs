// MIT License - Copyright (c) 2026 Peter Wright
// Receiver session: command writer and line reader

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::command::{
    AvrCommand, DeviceCommand, ParameterizedCommandType, SimpleCommandType,
};
use crate::config::AvrConfig;
use crate::error::{ProtocolError, Result};
use crate::event::{
    AvrDisconnectionEvent, AvrDisconnectionListener, AvrStatusUpdateEvent, AvrUpdateListener,
    ListenerRegistry,
};
use crate::factory;
use crate::transport::{TcpTransport, Transport};
use crate::volume;

/// Lifecycle of a connection. A lost connection stays `Disconnected` until
/// the next `connect()` or `send_command()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Per-session resources, replaced on every successful open.
struct Session<W> {
    writer: Option<W>,
    reader_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl<W> Default for Session<W> {
    fn default() -> Self {
        Self {
            writer: None,
            reader_handle: None,
            shutdown_tx: None,
        }
    }
}

/// Connection to a receiver's IP control port.
///
/// Outbound commands are written by the caller under a lock, one whole
/// command at a time. Inbound lines are read by a dedicated task and fanned
/// out to the registered update listeners. Losing the stream is reported
/// once to the disconnection listeners; nothing reconnects until the caller
/// sends again.
///
/// ```no_run
/// use pioneer_avr::{AvrConfig, AvrConnection, DeviceCommand};
///
/// # async fn run() -> pioneer_avr::Result<()> {
/// let config = AvrConfig::builder().host("192.168.0.50").build();
/// let avr = AvrConnection::from_config(&config);
/// avr.add_update_listener(|event: &pioneer_avr::AvrStatusUpdateEvent| {
///     println!("{}", event.data);
/// });
/// if avr.send_power_command(&DeviceCommand::On, 1).await? {
///     avr.send_volume_command(&DeviceCommand::Percent(30), 1).await?;
/// }
/// avr.close().await;
/// # Ok(())
/// # }
/// ```
pub struct AvrConnection<T: Transport> {
    name: String,
    transport: T,
    session: Mutex<Session<T::Writer>>,
    state: Arc<RwLock<ConnectionState>>,
    listeners: Arc<ListenerRegistry>,
    read_timeout: Duration,
    write_timeout: Duration,
    close_timeout: Duration,
    power_on_delay: Duration,
}

impl AvrConnection<TcpTransport> {
    /// TCP connection built from the config. Nothing is opened yet.
    pub fn from_config(config: &AvrConfig) -> Self {
        Self::with_config(TcpTransport::from_config(config), config)
    }
}

impl<T: Transport> AvrConnection<T> {
    /// Connection over `transport` with default timings.
    pub fn new(name: impl Into<String>, transport: T) -> Self {
        let defaults = AvrConfig::default();
        let mut connection = Self::with_config(transport, &defaults);
        connection.name = name.into();
        connection
    }

    pub fn with_config(transport: T, config: &AvrConfig) -> Self {
        Self {
            name: config.name(),
            transport,
            session: Mutex::new(Session::default()),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            listeners: Arc::new(ListenerRegistry::new()),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            close_timeout: config.close_timeout(),
            power_on_delay: config.power_on_delay(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    pub fn add_update_listener(&self, listener: impl AvrUpdateListener + 'static) {
        self.listeners.add_update_listener(Arc::new(listener));
    }

    pub fn add_disconnection_listener(&self, listener: impl AvrDisconnectionListener + 'static) {
        self.listeners.add_disconnection_listener(Arc::new(listener));
    }

    /// Open the transport and start the reader, unless already connected.
    ///
    /// Returns whether the connection is established. Open failures are
    /// logged, not returned.
    pub async fn connect(&self) -> bool {
        let mut session = self.session.lock().await;
        self.connect_locked(&mut session).await
    }

    async fn connect_locked(&self, session: &mut Session<T::Writer>) -> bool {
        if *self.state.read().await == ConnectionState::Connected {
            return true;
        }
        *self.state.write().await = ConnectionState::Connecting;

        // The reader may have given up on the previous session; drop what is left of it.
        self.shutdown_session(session).await;

        info!("{}: connecting to {}", self.name, self.transport.description());
        match self.transport.open().await {
            Ok((reader, writer)) => {
                *self.state.write().await = ConnectionState::Connected;
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                session.reader_handle = Some(spawn_reader_task(
                    reader,
                    self.name.clone(),
                    self.state.clone(),
                    self.listeners.clone(),
                    self.read_timeout,
                    shutdown_rx,
                ));
                session.shutdown_tx = Some(shutdown_tx);
                session.writer = Some(writer);
                info!("{}: connected", self.name);
                true
            }
            Err(e) => {
                warn!(
                    "{}: unable to connect to {}: {}",
                    self.name,
                    self.transport.description(),
                    e
                );
                *self.state.write().await = ConnectionState::Disconnected;
                false
            }
        }
    }

    /// Write one command.
    ///
    /// Validation errors are returned before anything touches the transport.
    /// Transport trouble, including a write still blocked after the write
    /// timeout, gives `Ok(false)`: the connection is closed and the caller
    /// decides whether to retry.
    pub async fn send_command(&self, command: &AvrCommand) -> Result<bool> {
        let wire = command.wire_form()?;

        let mut session = self.session.lock().await;
        if !self.connect_locked(&mut session).await {
            return Ok(false);
        }
        let Some(writer) = session.writer.as_mut() else {
            return Ok(false);
        };

        debug!("{}: sending {} as {:?}", self.name, command, wire);
        let written = timeout(self.write_timeout, write_command(writer, wire.as_bytes()))
            .await
            .unwrap_or_else(|_| {
                Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("write blocked for {:?}", self.write_timeout),
                ))
            });
        match written {
            Ok(()) => Ok(true),
            Err(e) => {
                error!("{}: failed to send {}: {}", self.name, command, e);
                self.shutdown_session(&mut session).await;
                *self.state.write().await = ConnectionState::Disconnected;
                Ok(false)
            }
        }
    }

    /// Stop the reader and release the transport. Safe to call repeatedly and
    /// in any state; never reported as a disconnection.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        self.shutdown_session(&mut session).await;
        let mut state = self.state.write().await;
        if *state != ConnectionState::Disconnected {
            info!("{}: closed", self.name);
        }
        *state = ConnectionState::Disconnected;
    }

    async fn shutdown_session(&self, session: &mut Session<T::Writer>) {
        if let Some(shutdown_tx) = session.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
        if let Some(mut handle) = session.reader_handle.take() {
            if timeout(self.close_timeout, &mut handle).await.is_err() {
                warn!(
                    "{}: reader did not stop within {:?}, abandoning it",
                    self.name, self.close_timeout
                );
                handle.abort();
            }
        }
        if let Some(mut writer) = session.writer.take() {
            match timeout(self.close_timeout, writer.shutdown()).await {
                Ok(Err(e)) => debug!("{}: writer shutdown: {}", self.name, e),
                Err(_) => debug!("{}: writer shutdown timed out", self.name),
                Ok(Ok(())) => {}
            }
        }
    }

    pub async fn send_power_query(&self, zone: u8) -> Result<bool> {
        self.send_simple(SimpleCommandType::PowerQuery, zone).await
    }

    pub async fn send_volume_query(&self, zone: u8) -> Result<bool> {
        self.send_simple(SimpleCommandType::VolumeQuery, zone).await
    }

    pub async fn send_mute_query(&self, zone: u8) -> Result<bool> {
        self.send_simple(SimpleCommandType::MuteQuery, zone).await
    }

    pub async fn send_input_source_query(&self, zone: u8) -> Result<bool> {
        self.send_simple(SimpleCommandType::InputQuery, zone).await
    }

    pub async fn send_listening_mode_query(&self) -> Result<bool> {
        self.send_simple(SimpleCommandType::ListeningModeQuery, 1).await
    }

    pub async fn send_mcacc_memory_query(&self) -> Result<bool> {
        self.send_simple(SimpleCommandType::McaccMemoryQuery, 1).await
    }

    /// ON sends the power-on request twice: the first only wakes the
    /// receiver's network interface, the second is acted on after the
    /// settle delay.
    pub async fn send_power_command(&self, command: &DeviceCommand, zone: u8) -> Result<bool> {
        match command {
            DeviceCommand::On => {
                let power_on = factory::simple_command(SimpleCommandType::PowerOn, zone);
                self.send_command(&power_on).await?;
                sleep(self.power_on_delay).await;
                self.send_command(&power_on).await
            }
            DeviceCommand::Off => self.send_simple(SimpleCommandType::PowerOff, zone).await,
            other => Err(unsupported("power", other)),
        }
    }

    /// ON/INCREASE and OFF/DECREASE step the volume; PERCENT and DECIMAL (dB)
    /// set it.
    pub async fn send_volume_command(&self, command: &DeviceCommand, zone: u8) -> Result<bool> {
        let request = match command {
            DeviceCommand::On | DeviceCommand::Increase => {
                factory::simple_command(SimpleCommandType::VolumeUp, zone)
            }
            DeviceCommand::Off | DeviceCommand::Decrease => {
                factory::simple_command(SimpleCommandType::VolumeDown, zone)
            }
            DeviceCommand::Percent(percent) => {
                let level = volume::percent_to_device(*percent, zone);
                factory::parameterized_command_with(
                    ParameterizedCommandType::VolumeSet,
                    zone,
                    volume::format_device_volume(level, zone),
                )
            }
            DeviceCommand::Decimal(db) => {
                let level = volume::db_to_device(*db, zone);
                factory::parameterized_command_with(
                    ParameterizedCommandType::VolumeSet,
                    zone,
                    volume::format_device_volume(level, zone),
                )
            }
            other => return Err(unsupported("volume", other)),
        };
        self.send_command(&request).await
    }

    pub async fn send_mute_command(&self, command: &DeviceCommand, zone: u8) -> Result<bool> {
        match command {
            DeviceCommand::On => self.send_simple(SimpleCommandType::MuteOn, zone).await,
            DeviceCommand::Off => self.send_simple(SimpleCommandType::MuteOff, zone).await,
            other => Err(unsupported("mute", other)),
        }
    }

    /// TEXT selects an input by its two-digit code; UP/DOWN cycle the main
    /// zone's inputs.
    pub async fn send_input_source_command(&self, command: &DeviceCommand, zone: u8) -> Result<bool> {
        let request = match command {
            DeviceCommand::Text(input) => factory::parameterized_command_with(
                ParameterizedCommandType::InputChannelSet,
                zone,
                input.as_str(),
            ),
            DeviceCommand::Up => factory::simple_command(SimpleCommandType::InputChangeCyclic, zone),
            DeviceCommand::Down => {
                factory::simple_command(SimpleCommandType::InputChangeReverse, zone)
            }
            other => return Err(unsupported("input source", other)),
        };
        self.send_command(&request).await
    }

    pub async fn send_listening_mode_command(&self, command: &DeviceCommand) -> Result<bool> {
        match command {
            DeviceCommand::Text(mode) => {
                let request = factory::parameterized_command_with(
                    ParameterizedCommandType::ListeningModeSet,
                    1,
                    mode.as_str(),
                );
                self.send_command(&request).await
            }
            other => Err(unsupported("listening mode", other)),
        }
    }

    pub async fn send_mcacc_memory_command(&self, command: &DeviceCommand) -> Result<bool> {
        let request = match command {
            DeviceCommand::Text(memory) => factory::parameterized_command_with(
                ParameterizedCommandType::McaccMemorySet,
                1,
                memory.as_str(),
            ),
            DeviceCommand::Up | DeviceCommand::Increase => {
                factory::simple_command(SimpleCommandType::McaccMemoryChangeCyclic, 1)
            }
            other => return Err(unsupported("MCACC memory", other)),
        };
        self.send_command(&request).await
    }

    async fn send_simple(&self, command_type: SimpleCommandType, zone: u8) -> Result<bool> {
        self.send_command(&factory::simple_command(command_type, zone))
            .await
    }
}

impl<T: Transport> Drop for AvrConnection<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.session.get_mut().reader_handle.take() {
            handle.abort();
        }
    }
}

fn unsupported(channel: &'static str, command: &DeviceCommand) -> ProtocolError {
    ProtocolError::UnsupportedCommand {
        channel,
        command: command.to_string(),
    }
}

/// Write and flush one full command.
async fn write_command<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

/// Strip the `\n` or `\r\n` ending from a raw line.
fn trim_line_ending(raw: &[u8]) -> &[u8] {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Spawn the reader task for one session.
///
/// Lines are delivered to every update listener before the next read; bytes
/// that are not UTF-8 are replaced, never fatal. A read that times out keeps
/// the partial line and only re-checks the stop signal. End of stream or a
/// read error marks the connection disconnected and notifies the
/// disconnection listeners once; a stop request ends the task silently.
fn spawn_reader_task<R>(
    reader: R,
    name: String,
    state: Arc<RwLock<ConnectionState>>,
    listeners: Arc<ListenerRegistry>,
    read_timeout: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        debug!("{}: reader started", name);

        let cause = loop {
            if *shutdown_rx.borrow() {
                debug!("{}: reader stopped", name);
                return;
            }
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    debug!("{}: reader stopped", name);
                    return;
                }
                // Bytes read before a timeout stay in `buf` for the next call
                read = timeout(read_timeout, reader.read_until(b'\n', &mut buf)) => match read {
                    Err(_) => continue,
                    Ok(Ok(_)) if !buf.is_empty() => {
                        let text = String::from_utf8_lossy(trim_line_ending(&buf));
                        if let Cow::Owned(_) = text {
                            warn!("{}: line is not valid UTF-8: {:?}", name, text);
                        }
                        let line = text.into_owned();
                        buf.clear();
                        debug!("{}: received {:?}", name, line);
                        listeners.notify_update(&AvrStatusUpdateEvent {
                            source: name.clone(),
                            data: line,
                        });
                    }
                    Ok(Ok(_)) => {
                        break std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "connection closed by the receiver",
                        );
                    }
                    Ok(Err(e)) => break e,
                }
            }
        };

        warn!("{}: connection lost: {}", name, cause);
        *state.write().await = ConnectionState::Disconnected;
        listeners.notify_disconnection(&AvrDisconnectionEvent {
            source: name,
            cause: Arc::new(cause),
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::DuplexStream;

    /// Counts open attempts and always refuses.
    #[derive(Default)]
    struct RefusingTransport {
        opens: AtomicUsize,
    }

    impl Transport for RefusingTransport {
        type Reader = DuplexStream;
        type Writer = DuplexStream;

        async fn open(&self) -> std::io::Result<(DuplexStream, DuplexStream)> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused))
        }

        fn description(&self) -> String {
            "nowhere".to_string()
        }
    }

    #[tokio::test]
    async fn test_open_failure_is_reported_as_false() {
        let avr = AvrConnection::new("test", RefusingTransport::default());
        assert!(!avr.connect().await);
        assert_eq!(avr.state().await, ConnectionState::Disconnected);
        assert!(!avr.send_power_query(1).await.unwrap());
        assert_eq!(avr.transport.opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsupported_commands_never_touch_transport() {
        let avr = AvrConnection::new("test", RefusingTransport::default());
        let cases = [
            avr.send_volume_command(&DeviceCommand::Text("loud".into()), 1).await,
            avr.send_volume_command(&DeviceCommand::Up, 1).await,
            avr.send_power_command(&DeviceCommand::Percent(10), 1).await,
            avr.send_mute_command(&DeviceCommand::Increase, 2).await,
            avr.send_input_source_command(&DeviceCommand::Percent(1), 1).await,
            avr.send_listening_mode_command(&DeviceCommand::On).await,
            avr.send_mcacc_memory_command(&DeviceCommand::Off).await,
        ];
        for result in cases {
            assert!(matches!(
                result,
                Err(ProtocolError::UnsupportedCommand { .. })
            ));
        }
        assert_eq!(avr.transport.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_parameter_never_touches_transport() {
        let avr = AvrConnection::new("test", RefusingTransport::default());
        let result = avr
            .send_input_source_command(&DeviceCommand::Text("tuner".into()), 1)
            .await;
        assert!(matches!(result, Err(ProtocolError::InvalidParameter { .. })));
        let result = avr.send_power_command(&DeviceCommand::On, 7).await;
        assert!(matches!(result, Err(ProtocolError::InvalidZone { .. })));
        assert_eq!(avr.transport.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"PWR0\r\n"), b"PWR0");
        assert_eq!(trim_line_ending(b"PWR0\n"), b"PWR0");
        assert_eq!(trim_line_ending(b"PWR0"), b"PWR0");
        assert_eq!(trim_line_ending(b"\r\n"), b"");
        // Only one ending is removed
        assert_eq!(trim_line_ending(b"VOL050\r\r\n"), b"VOL050\r");
    }

    #[tokio::test]
    async fn test_close_when_never_connected() {
        let avr = AvrConnection::new("test", RefusingTransport::default());
        avr.close().await;
        avr.close().await;
        assert_eq!(avr.state().await, ConnectionState::Disconnected);
    }
}
