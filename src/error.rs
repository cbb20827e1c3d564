// MIT License - Copyright (c) 2026 Peter Wright
// Error types

/// All errors that can occur in the pioneer-avr library.
///
/// Validation variants are raised while building the wire form of a command,
/// before anything touches the transport. Transport failures are not errors
/// here: `send_command` reports them as `Ok(false)` and the reader reports
/// them through the disconnection listeners.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Parameter not set for command {command}")]
    MissingParameter { command: &'static str },

    #[error("Invalid parameter for command {command}: {parameter:?} does not match {pattern}")]
    InvalidParameter {
        command: &'static str,
        parameter: String,
        pattern: &'static str,
    },

    #[error("Zone {zone} is not available for {name} (max: {max})")]
    InvalidZone {
        name: &'static str,
        zone: u8,
        max: u8,
    },

    #[error("Command {command} not supported by {channel}")]
    UnsupportedCommand {
        channel: &'static str,
        command: String,
    },

    #[error("Empty response line")]
    EmptyLine,

    #[error("Unrecognized response: {line:?}")]
    UnrecognizedResponse { line: String },

    #[error("Invalid response pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ProtocolError {
    /// Whether the error was raised before any network effect took place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProtocolError::MissingParameter { .. }
                | ProtocolError::InvalidParameter { .. }
                | ProtocolError::InvalidZone { .. }
                | ProtocolError::UnsupportedCommand { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(ProtocolError::MissingParameter { command: "VOLUME_SET" }.is_validation());
        assert!(
            ProtocolError::UnsupportedCommand {
                channel: "volume",
                command: "Text(\"loud\")".to_string()
            }
            .is_validation()
        );
        assert!(!ProtocolError::EmptyLine.is_validation());
        assert!(
            !ProtocolError::UnrecognizedResponse {
                line: "R".to_string()
            }
            .is_validation()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ProtocolError::InvalidParameter {
            command: "VOLUME_SET",
            parameter: "5".to_string(),
            pattern: "[0-9]{2,3}",
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter for command VOLUME_SET: \"5\" does not match [0-9]{2,3}"
        );
        let err = ProtocolError::UnrecognizedResponse {
            line: "XYZ".to_string(),
        };
        assert_eq!(err.to_string(), "Unrecognized response: \"XYZ\"");
    }
}
