// MIT License - Copyright (c) 2026 Peter Wright
// Command and response constructors
//
//! Constructors for requests and responses. Nothing here validates: commands
//! are checked when their wire form is built.

use crate::command::{
    AvrCommand, ParameterizedCommand, ParameterizedCommandType, SimpleCommand, SimpleCommandType,
};
use crate::error::Result;
use crate::response::Response;

pub fn simple_command(command_type: SimpleCommandType, zone: u8) -> AvrCommand {
    SimpleCommand::new(command_type, zone).into()
}

/// A parameterized command with no parameter yet.
pub fn parameterized_command(command_type: ParameterizedCommandType, zone: u8) -> ParameterizedCommand {
    ParameterizedCommand::new(command_type, zone)
}

pub fn parameterized_command_with(
    command_type: ParameterizedCommandType,
    zone: u8,
    parameter: impl Into<String>,
) -> AvrCommand {
    ParameterizedCommand::new(command_type, zone)
        .with_parameter(parameter)
        .into()
}

/// Classify a received line.
pub fn response(line: &str) -> Result<Response> {
    Response::parse(line)
}
