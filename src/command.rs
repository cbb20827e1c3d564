// MIT License - Copyright (c) 2026 Peter Wright
// Command catalog and wire encoding

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{ProtocolError, Result};

/// Highest zone index any command or response type can address
/// (1 = main, 2 = Zone 2, 3 = Zone 3, 4 = HDZone).
pub const MAX_ZONES: u8 = 4;

/// Terminator appended to every outbound command.
pub const COMMAND_TERMINATOR: &str = "\r";

/// Resolve the token for a zone. Zone 0 means "no explicit zone" and maps to
/// the zone 1 token.
pub(crate) fn zone_token(name: &'static str, tokens: &'static [&'static str], zone: u8) -> Result<&'static str> {
    let index = if zone == 0 { 0 } else { usize::from(zone) - 1 };
    tokens.get(index).copied().ok_or(ProtocolError::InvalidZone {
        name,
        zone,
        max: tokens.len() as u8,
    })
}

/// Commands without a parameter. Each entry carries one literal token per
/// supported zone.
///
/// ```text
/// POWER_ON     PO   APO   BPO   ZEO
/// VOLUME_QUERY ?V   ?ZV   ?YV   ?HZV
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleCommandType {
    PowerOn,
    PowerOff,
    PowerQuery,
    VolumeUp,
    VolumeDown,
    VolumeQuery,
    MuteOn,
    MuteOff,
    MuteQuery,
    /// Main zone only.
    InputChangeCyclic,
    /// Main zone only.
    InputChangeReverse,
    InputQuery,
    /// Main zone only.
    ListeningModeQuery,
    /// Main zone only. Steps to the next MCACC memory.
    McaccMemoryChangeCyclic,
    /// Main zone only.
    McaccMemoryQuery,
}

impl SimpleCommandType {
    pub const ALL: [Self; 15] = [
        Self::PowerOn,
        Self::PowerOff,
        Self::PowerQuery,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::VolumeQuery,
        Self::MuteOn,
        Self::MuteOff,
        Self::MuteQuery,
        Self::InputChangeCyclic,
        Self::InputChangeReverse,
        Self::InputQuery,
        Self::ListeningModeQuery,
        Self::McaccMemoryChangeCyclic,
        Self::McaccMemoryQuery,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerOn => "POWER_ON",
            Self::PowerOff => "POWER_OFF",
            Self::PowerQuery => "POWER_QUERY",
            Self::VolumeUp => "VOLUME_UP",
            Self::VolumeDown => "VOLUME_DOWN",
            Self::VolumeQuery => "VOLUME_QUERY",
            Self::MuteOn => "MUTE_ON",
            Self::MuteOff => "MUTE_OFF",
            Self::MuteQuery => "MUTE_QUERY",
            Self::InputChangeCyclic => "INPUT_CHANGE_CYCLIC",
            Self::InputChangeReverse => "INPUT_CHANGE_REVERSE",
            Self::InputQuery => "INPUT_QUERY",
            Self::ListeningModeQuery => "LISTENING_MODE_QUERY",
            Self::McaccMemoryChangeCyclic => "MCACC_MEMORY_CHANGE_CYCLIC",
            Self::McaccMemoryQuery => "MCACC_MEMORY_QUERY",
        }
    }

    /// Wire tokens indexed by zone - 1.
    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            Self::PowerOn => &["PO", "APO", "BPO", "ZEO"],
            Self::PowerOff => &["PF", "APF", "BPF", "ZEF"],
            Self::PowerQuery => &["?P", "?AP", "?BP", "?ZEP"],
            Self::VolumeUp => &["VU", "ZU", "YU", "HZU"],
            Self::VolumeDown => &["VD", "ZD", "YD", "HZD"],
            Self::VolumeQuery => &["?V", "?ZV", "?YV", "?HZV"],
            Self::MuteOn => &["MO", "Z2MO", "Z3MO", "HZMO"],
            Self::MuteOff => &["MF", "Z2MF", "Z3MF", "HZMF"],
            Self::MuteQuery => &["?M", "?Z2M", "?Z3M", "?HZM"],
            Self::InputChangeCyclic => &["FU"],
            Self::InputChangeReverse => &["FD"],
            Self::InputQuery => &["?F", "?ZS", "?ZT", "?ZEA"],
            Self::ListeningModeQuery => &["?S"],
            Self::McaccMemoryChangeCyclic => &["MC0"],
            Self::McaccMemoryQuery => &["?MC"],
        }
    }

    /// Token for the given zone; zone 0 resolves to the zone 1 token.
    pub fn token(&self, zone: u8) -> Result<&'static str> {
        zone_token(self.name(), self.tokens(), zone)
    }

    pub fn zone_count(&self) -> u8 {
        self.tokens().len() as u8
    }
}

impl fmt::Display for SimpleCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Commands whose parameter text is prepended to the token on the wire,
/// e.g. `050VL` sets the main zone volume to step 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterizedCommandType {
    VolumeSet,
    InputChannelSet,
    /// Main zone only.
    ListeningModeSet,
    /// Main zone only.
    McaccMemorySet,
}

impl ParameterizedCommandType {
    pub const ALL: [Self; 4] = [
        Self::VolumeSet,
        Self::InputChannelSet,
        Self::ListeningModeSet,
        Self::McaccMemorySet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::VolumeSet => "VOLUME_SET",
            Self::InputChannelSet => "INPUT_CHANNEL_SET",
            Self::ListeningModeSet => "LISTENING_MODE_SET",
            Self::McaccMemorySet => "MCACC_MEMORY_SET",
        }
    }

    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            Self::VolumeSet => &["VL", "ZV", "YV", "HZV"],
            Self::InputChannelSet => &["FN", "ZS", "ZT", "ZEA"],
            Self::ListeningModeSet => &["SR"],
            Self::McaccMemorySet => &["MC"],
        }
    }

    /// Pattern the whole parameter must match. Empty means any text.
    pub fn parameter_pattern(&self) -> &'static str {
        match self {
            Self::VolumeSet => "[0-9]{2,3}",
            Self::InputChannelSet => "[0-9]{2}",
            Self::ListeningModeSet => "[0-9]{4}",
            Self::McaccMemorySet => "[1-6]",
        }
    }

    pub fn token(&self, zone: u8) -> Result<&'static str> {
        zone_token(self.name(), self.tokens(), zone)
    }

    pub fn zone_count(&self) -> u8 {
        self.tokens().len() as u8
    }

    /// Whether `parameter` satisfies the declared pattern over its full length.
    pub fn accepts(&self, parameter: &str) -> bool {
        match &PARAMETER_MATCHERS[*self as usize] {
            Some(re) => re.is_match(parameter),
            None => true,
        }
    }
}

/// Anchored parameter patterns, indexed by `ParameterizedCommandType as usize`.
static PARAMETER_MATCHERS: LazyLock<[Option<Regex>; 4]> = LazyLock::new(|| {
    ParameterizedCommandType::ALL.map(|command_type| {
        let pattern = command_type.parameter_pattern();
        (!pattern.is_empty()).then(|| {
            Regex::new(&format!("^(?:{pattern})$")).expect("built-in parameter patterns are valid")
        })
    })
});

impl fmt::Display for ParameterizedCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parameterless command bound to a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    command_type: SimpleCommandType,
    zone: u8,
}

impl SimpleCommand {
    pub fn new(command_type: SimpleCommandType, zone: u8) -> Self {
        Self { command_type, zone }
    }

    pub fn command_type(&self) -> SimpleCommandType {
        self.command_type
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// `token + "\r"`. Only fails when the type has no token for the zone.
    pub fn wire_form(&self) -> Result<String> {
        let token = self.command_type.token(self.zone)?;
        Ok(format!("{token}{COMMAND_TERMINATOR}"))
    }
}

/// A command carrying a parameter. The parameter is stored as given and only
/// checked when the wire form is built, so a command can be created first and
/// filled in later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedCommand {
    command_type: ParameterizedCommandType,
    zone: u8,
    parameter: Option<String>,
}

impl ParameterizedCommand {
    pub fn new(command_type: ParameterizedCommandType, zone: u8) -> Self {
        Self {
            command_type,
            zone,
            parameter: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.set_parameter(parameter);
        self
    }

    pub fn set_parameter(&mut self, parameter: impl Into<String>) {
        self.parameter = Some(parameter.into());
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    pub fn command_type(&self) -> ParameterizedCommandType {
        self.command_type
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// `parameter + token + "\r"`.
    pub fn wire_form(&self) -> Result<String> {
        let Some(parameter) = self.parameter.as_deref() else {
            return Err(ProtocolError::MissingParameter {
                command: self.command_type.name(),
            });
        };
        if !self.command_type.accepts(parameter) {
            return Err(ProtocolError::InvalidParameter {
                command: self.command_type.name(),
                parameter: parameter.to_string(),
                pattern: self.command_type.parameter_pattern(),
            });
        }
        let token = self.command_type.token(self.zone)?;
        Ok(format!("{parameter}{token}{COMMAND_TERMINATOR}"))
    }
}

/// Any command that can be written to the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvrCommand {
    Simple(SimpleCommand),
    Parameterized(ParameterizedCommand),
}

impl AvrCommand {
    pub fn wire_form(&self) -> Result<String> {
        match self {
            AvrCommand::Simple(cmd) => cmd.wire_form(),
            AvrCommand::Parameterized(cmd) => cmd.wire_form(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AvrCommand::Simple(cmd) => cmd.command_type.name(),
            AvrCommand::Parameterized(cmd) => cmd.command_type.name(),
        }
    }

    pub fn zone(&self) -> u8 {
        match self {
            AvrCommand::Simple(cmd) => cmd.zone,
            AvrCommand::Parameterized(cmd) => cmd.zone,
        }
    }
}

impl From<SimpleCommand> for AvrCommand {
    fn from(cmd: SimpleCommand) -> Self {
        AvrCommand::Simple(cmd)
    }
}

impl From<ParameterizedCommand> for AvrCommand {
    fn from(cmd: ParameterizedCommand) -> Self {
        AvrCommand::Parameterized(cmd)
    }
}

impl fmt::Display for AvrCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvrCommand::Simple(cmd) => write!(f, "{} (zone {})", cmd.command_type, cmd.zone),
            AvrCommand::Parameterized(cmd) => write!(
                f,
                "{}={} (zone {})",
                cmd.command_type,
                cmd.parameter.as_deref().unwrap_or("<unset>"),
                cmd.zone
            ),
        }
    }
}

/// A high-level instruction coming from the caller (a UI switch, a slider,
/// a text field). The convenience senders on
/// [`AvrConnection`](crate::connection::AvrConnection) translate it into
/// protocol commands, or reject it with `UnsupportedCommand`.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    On,
    Off,
    Increase,
    Decrease,
    Up,
    Down,
    /// 0-100
    Percent(u8),
    /// Volume in dB, or a raw number for other channels.
    Decimal(f64),
    Text(String),
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::On => f.write_str("ON"),
            DeviceCommand::Off => f.write_str("OFF"),
            DeviceCommand::Increase => f.write_str("INCREASE"),
            DeviceCommand::Decrease => f.write_str("DECREASE"),
            DeviceCommand::Up => f.write_str("UP"),
            DeviceCommand::Down => f.write_str("DOWN"),
            DeviceCommand::Percent(p) => write!(f, "{p}%"),
            DeviceCommand::Decimal(d) => write!(f, "{d}"),
            DeviceCommand::Text(s) => write!(f, "{s:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_wire_form_per_zone() {
        let main = SimpleCommand::new(SimpleCommandType::PowerOn, 1);
        assert_eq!(main.wire_form().unwrap(), "PO\r");
        let zone2 = SimpleCommand::new(SimpleCommandType::PowerOn, 2);
        assert_eq!(zone2.wire_form().unwrap(), "APO\r");
        let hd_zone = SimpleCommand::new(SimpleCommandType::PowerOn, 4);
        assert_eq!(hd_zone.wire_form().unwrap(), "ZEO\r");
    }

    #[test]
    fn test_zone_zero_uses_default_token() {
        for command_type in SimpleCommandType::ALL {
            assert_eq!(command_type.token(0).unwrap(), command_type.tokens()[0]);
        }
        for command_type in ParameterizedCommandType::ALL {
            assert_eq!(command_type.token(0).unwrap(), command_type.tokens()[0]);
        }
    }

    #[test]
    fn test_tokens_for_every_declared_zone() {
        for command_type in SimpleCommandType::ALL {
            for zone in 1..=command_type.zone_count() {
                assert_eq!(
                    command_type.token(zone).unwrap(),
                    command_type.tokens()[usize::from(zone) - 1]
                );
            }
        }
        assert_eq!(SimpleCommandType::VolumeQuery.token(3).unwrap(), "?YV");
        assert_eq!(SimpleCommandType::MuteOff.token(2).unwrap(), "Z2MF");
        assert_eq!(ParameterizedCommandType::InputChannelSet.token(4).unwrap(), "ZEA");
    }

    #[test]
    fn test_zone_beyond_catalog_is_rejected() {
        let err = SimpleCommandType::ListeningModeQuery.token(2).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidZone { zone: 2, max: 1, .. }
        ));
        let cmd = SimpleCommand::new(SimpleCommandType::PowerOn, MAX_ZONES + 1);
        assert!(cmd.wire_form().is_err());
    }

    #[test]
    fn test_parameterized_missing_parameter() {
        let cmd = ParameterizedCommand::new(ParameterizedCommandType::VolumeSet, 1);
        assert!(matches!(
            cmd.wire_form(),
            Err(ProtocolError::MissingParameter { command: "VOLUME_SET" })
        ));
    }

    #[test]
    fn test_parameterized_invalid_parameter() {
        let cases = [
            (ParameterizedCommandType::VolumeSet, "5"),
            (ParameterizedCommandType::VolumeSet, "1850"),
            (ParameterizedCommandType::VolumeSet, "5a"),
            (ParameterizedCommandType::InputChannelSet, "123"),
            (ParameterizedCommandType::ListeningModeSet, "12"),
            (ParameterizedCommandType::McaccMemorySet, "7"),
            (ParameterizedCommandType::McaccMemorySet, "0"),
        ];
        for (command_type, parameter) in cases {
            let cmd = ParameterizedCommand::new(command_type, 1).with_parameter(parameter);
            match cmd.wire_form() {
                Err(ProtocolError::InvalidParameter { parameter: p, .. }) => assert_eq!(p, parameter),
                other => panic!("{command_type} with {parameter:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_parameterized_valid_parameter() {
        let cmd = ParameterizedCommand::new(ParameterizedCommandType::VolumeSet, 1).with_parameter("50");
        assert_eq!(cmd.wire_form().unwrap(), "50VL\r");
        let cmd = ParameterizedCommand::new(ParameterizedCommandType::VolumeSet, 2).with_parameter("081");
        assert_eq!(cmd.wire_form().unwrap(), "081ZV\r");
        let cmd = ParameterizedCommand::new(ParameterizedCommandType::InputChannelSet, 3).with_parameter("25");
        assert_eq!(cmd.wire_form().unwrap(), "25ZT\r");
        let cmd = ParameterizedCommand::new(ParameterizedCommandType::ListeningModeSet, 0).with_parameter("0006");
        assert_eq!(cmd.wire_form().unwrap(), "0006SR\r");
        let cmd = ParameterizedCommand::new(ParameterizedCommandType::McaccMemorySet, 1).with_parameter("3");
        assert_eq!(cmd.wire_form().unwrap(), "3MC\r");
    }

    #[test]
    fn test_accepts_matches_whole_parameter() {
        for command_type in ParameterizedCommandType::ALL {
            assert!(PARAMETER_MATCHERS[command_type as usize].is_some());
        }
        let volume = ParameterizedCommandType::VolumeSet;
        assert!(volume.accepts("50"));
        assert!(volume.accepts("185"));
        assert!(!volume.accepts("x50"));
        assert!(!volume.accepts("50\r"));
        // Repeated checks reuse the compiled matcher
        for _ in 0..3 {
            assert!(ParameterizedCommandType::ListeningModeSet.accepts("0112"));
            assert!(!ParameterizedCommandType::McaccMemorySet.accepts("12"));
        }
    }

    #[test]
    fn test_parameter_can_be_set_after_creation() {
        let mut cmd = ParameterizedCommand::new(ParameterizedCommandType::InputChannelSet, 1);
        assert!(cmd.parameter().is_none());
        cmd.set_parameter("19");
        assert_eq!(cmd.parameter(), Some("19"));
        assert_eq!(AvrCommand::from(cmd).wire_form().unwrap(), "19FN\r");
    }

    #[test]
    fn test_avr_command_display() {
        let cmd: AvrCommand = SimpleCommand::new(SimpleCommandType::MuteQuery, 2).into();
        assert_eq!(cmd.to_string(), "MUTE_QUERY (zone 2)");
        assert_eq!(cmd.name(), "MUTE_QUERY");
        let cmd: AvrCommand = ParameterizedCommand::new(ParameterizedCommandType::VolumeSet, 1).into();
        assert_eq!(cmd.to_string(), "VOLUME_SET=<unset> (zone 1)");
    }
}
