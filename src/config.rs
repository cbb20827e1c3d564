// MIT License - Copyright (c) 2026 Peter Wright
// Connection settings

use std::time::Duration;

use crate::command::MAX_ZONES;

/// Configuration for connecting to a receiver.
#[derive(Debug, Clone)]
pub struct AvrConfig {
    /// Receiver host name or IP address
    pub host: String,
    /// IP control port (default: 23, some models use 8102)
    pub port: u16,
    /// Name used in logs and in emitted events (default: `host:port`)
    pub connection_name: Option<String>,
    /// Number of zones the receiver has (1-4)
    pub zone_count: u8,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// How long one line read may block before the reader re-checks its stop
    /// signal. Not a protocol timeout.
    pub read_timeout_ms: u64,
    /// How long one command write may block before the session is dropped
    pub write_timeout_ms: u64,
    /// How long `close()` waits for the reader before abandoning it
    pub close_timeout_ms: u64,
    /// Delay between the wake-up and the actual power-on request
    pub power_on_delay_ms: u64,
    /// Delay before a caller reconnects after a disconnection
    pub reconnect_delay_ms: u64,
}

impl Default for AvrConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.50".to_string(),
            port: 23,
            connection_name: None,
            zone_count: 1,
            connect_timeout_ms: 5000,
            read_timeout_ms: 1000,
            write_timeout_ms: 5000,
            close_timeout_ms: 5000,
            power_on_delay_ms: 100,
            reconnect_delay_ms: 10000,
        }
    }
}

impl AvrConfig {
    pub fn builder() -> AvrConfigBuilder {
        AvrConfigBuilder::default()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn name(&self) -> String {
        self.connection_name.clone().unwrap_or_else(|| self.address())
    }

    /// Zones to address, 1-based.
    pub fn zones(&self) -> impl Iterator<Item = u8> {
        1..=self.zone_count.clamp(1, MAX_ZONES)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn power_on_delay(&self) -> Duration {
        Duration::from_millis(self.power_on_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Builder for AvrConfig.
#[derive(Debug, Clone, Default)]
pub struct AvrConfigBuilder {
    config: AvrConfig,
}

impl AvrConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.config.connection_name = Some(name.into());
        self
    }

    pub fn zone_count(mut self, zones: u8) -> Self {
        self.config.zone_count = zones;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn close_timeout_ms(mut self, ms: u64) -> Self {
        self.config.close_timeout_ms = ms;
        self
    }

    pub fn power_on_delay_ms(mut self, ms: u64) -> Self {
        self.config.power_on_delay_ms = ms;
        self
    }

    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.config.reconnect_delay_ms = ms;
        self
    }

    pub fn build(self) -> AvrConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = AvrConfig::builder()
            .host("10.0.0.7")
            .port(8102)
            .zone_count(3)
            .power_on_delay_ms(250)
            .build();

        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 8102);
        assert_eq!(config.address(), "10.0.0.7:8102");
        assert_eq!(config.name(), "10.0.0.7:8102");
        assert_eq!(config.zones().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(config.power_on_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_defaults() {
        let config = AvrConfig::builder().build();
        assert_eq!(config.port, 23);
        assert_eq!(config.power_on_delay_ms, 100);
        assert_eq!(config.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.write_timeout(), Duration::from_secs(5));
        assert_eq!(config.zones().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_connection_name_and_zone_clamp() {
        let config = AvrConfig::builder()
            .connection_name("living-room")
            .zone_count(9)
            .build();
        assert_eq!(config.name(), "living-room");
        assert_eq!(config.zones().count(), 4);

        let config = AvrConfig::builder().zone_count(0).build();
        assert_eq!(config.zones().collect::<Vec<_>>(), vec![1]);
    }
}
