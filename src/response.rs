// MIT License - Copyright (c) 2026 Peter Wright
// Classification of receiver status lines

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{ProtocolError, Result};

/// Kinds of line the receiver emits, in classification order.
///
/// Each entry carries one literal prefix per zone it reports for and, if the
/// line carries a value, the pattern of that value. `VOL185` is a
/// `VolumeLevel` for zone 1 with parameter `185`; `Z2MUT0` is a `MuteState`
/// for zone 2 with parameter `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    PowerState,
    VolumeLevel,
    MuteState,
    InputSourceChannel,
    ListeningMode,
    PlayingListeningMode,
    DisplayInformation,
    McaccMemory,
}

impl ResponseType {
    /// Declaration order is the classification order.
    pub const ALL: [Self; 8] = [
        Self::PowerState,
        Self::VolumeLevel,
        Self::MuteState,
        Self::InputSourceChannel,
        Self::ListeningMode,
        Self::PlayingListeningMode,
        Self::DisplayInformation,
        Self::McaccMemory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerState => "POWER_STATE",
            Self::VolumeLevel => "VOLUME_LEVEL",
            Self::MuteState => "MUTE_STATE",
            Self::InputSourceChannel => "INPUT_SOURCE_CHANNEL",
            Self::ListeningMode => "LISTENING_MODE",
            Self::PlayingListeningMode => "PLAYING_LISTENING_MODE",
            Self::DisplayInformation => "DISPLAY_INFORMATION",
            Self::McaccMemory => "MCACC_MEMORY",
        }
    }

    /// Line prefixes indexed by zone - 1.
    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::PowerState => &["PWR", "APR", "BPR", "ZEP"],
            Self::VolumeLevel => &["VOL", "ZV", "YV", "XV"],
            Self::MuteState => &["MUT", "Z2MUT", "Z3MUT", "HZMUT"],
            Self::InputSourceChannel => &["FN", "Z2F", "Z3F", "ZEA"],
            Self::ListeningMode => &["SR"],
            Self::PlayingListeningMode => &["LM"],
            Self::DisplayInformation => &["FL"],
            Self::McaccMemory => &["MC"],
        }
    }

    pub fn parameter_pattern(&self) -> Option<&'static str> {
        match self {
            Self::PowerState => Some("[0-2]"),
            Self::VolumeLevel => Some("[0-9]{2,3}"),
            Self::MuteState => Some("[0-1]"),
            Self::InputSourceChannel => Some("[0-9]{2}"),
            Self::ListeningMode => Some("[0-9]{4}"),
            Self::PlayingListeningMode => Some("[0-9a-f]{4}"),
            Self::DisplayInformation => Some("[0-9a-fA-F]{30}"),
            Self::McaccMemory => Some("[1-6]"),
        }
    }

    pub fn has_parameter(&self) -> bool {
        self.parameter_pattern().is_some_and(|p| !p.is_empty())
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One catalog row: type, per-zone prefixes, optional parameter pattern.
pub(crate) type ResponseEntry = (ResponseType, &'static [&'static str], Option<&'static str>);

/// Precompiled matchers for one zone of one response type.
#[derive(Debug)]
struct ZoneMatcher {
    zone: u8,
    /// `^(?:prefix(pattern))$`, used to pick the type and zone.
    full: Regex,
    /// `prefix(pattern)`, used to pull the parameter out of a line that
    /// already matched `full`.
    partial: Option<Regex>,
}

#[derive(Debug)]
struct TypeMatchers {
    response_type: ResponseType,
    zones: Vec<ZoneMatcher>,
}

/// Classifies received lines against the response catalog.
///
/// Types are tried in declaration order and zones in ascending order; the
/// first pattern matching the whole line wins. The built-in catalog is
/// compiled once and shared through [`ResponseClassifier::global`].
#[derive(Debug)]
pub struct ResponseClassifier {
    entries: Vec<TypeMatchers>,
}

static CLASSIFIER: LazyLock<ResponseClassifier> = LazyLock::new(|| {
    ResponseClassifier::new().expect("built-in response patterns are valid")
});

impl ResponseClassifier {
    /// Compile the built-in catalog.
    pub fn new() -> Result<Self> {
        let entries: Vec<ResponseEntry> = ResponseType::ALL
            .iter()
            .map(|t| (*t, t.prefixes(), t.parameter_pattern()))
            .collect();
        Self::from_entries(&entries)
    }

    pub fn global() -> &'static ResponseClassifier {
        &CLASSIFIER
    }

    pub(crate) fn from_entries(entries: &[ResponseEntry]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(entries.len());
        for (response_type, prefixes, pattern) in entries {
            let mut zones = Vec::with_capacity(prefixes.len());
            for (index, prefix) in prefixes.iter().enumerate() {
                let prefix = regex_lite::escape(prefix);
                let (full, partial) = match pattern.filter(|p| !p.is_empty()) {
                    Some(pattern) => {
                        let unanchored = format!("{prefix}({pattern})");
                        (
                            compile(&format!("^(?:{unanchored})$"))?,
                            Some(compile(&unanchored)?),
                        )
                    }
                    None => (compile(&format!("^(?:{prefix})$"))?, None),
                };
                zones.push(ZoneMatcher {
                    zone: index as u8 + 1,
                    full,
                    partial,
                });
            }
            compiled.push(TypeMatchers {
                response_type: *response_type,
                zones,
            });
        }
        Ok(Self { entries: compiled })
    }

    /// Parse one received line.
    pub fn parse(&self, line: &str) -> Result<Response> {
        if line.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let Some((response_type, matcher)) = self.select(line) else {
            return Err(ProtocolError::UnrecognizedResponse {
                line: line.to_string(),
            });
        };

        let parameter = match &matcher.partial {
            Some(partial) => {
                let captured = partial
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string());
                if captured.is_none() {
                    return Err(ProtocolError::UnrecognizedResponse {
                        line: line.to_string(),
                    });
                }
                captured
            }
            None => None,
        };

        Ok(Response {
            response_type,
            zone: matcher.zone,
            parameter,
        })
    }

    fn select(&self, line: &str) -> Option<(ResponseType, &ZoneMatcher)> {
        self.entries.iter().find_map(|entry| {
            entry
                .zones
                .iter()
                .find(|zone| zone.full.is_match(line))
                .map(|zone| (entry.response_type, zone))
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ProtocolError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// A classified line from the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    response_type: ResponseType,
    zone: u8,
    parameter: Option<String>,
}

impl Response {
    /// Classify a line with the built-in catalog.
    pub fn parse(line: &str) -> Result<Self> {
        ResponseClassifier::global().parse(line)
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// 1-based zone whose prefix matched.
    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    pub fn has_parameter(&self) -> bool {
        self.response_type.has_parameter()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(p) => write!(f, "{} zone {} = {}", self.response_type, self.zone, p),
            None => write!(f, "{} zone {}", self.response_type, self.zone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_level_main_zone() {
        let response = Response::parse("VOL185").unwrap();
        assert_eq!(response.response_type(), ResponseType::VolumeLevel);
        assert_eq!(response.zone(), 1);
        assert_eq!(response.parameter(), Some("185"));
        assert!(response.has_parameter());
    }

    #[test]
    fn test_zone_prefixes() {
        let cases = [
            ("PWR0", ResponseType::PowerState, 1, "0"),
            ("APR1", ResponseType::PowerState, 2, "1"),
            ("BPR2", ResponseType::PowerState, 3, "2"),
            ("ZEP0", ResponseType::PowerState, 4, "0"),
            ("ZV45", ResponseType::VolumeLevel, 2, "45"),
            ("YV081", ResponseType::VolumeLevel, 3, "081"),
            ("XV100", ResponseType::VolumeLevel, 4, "100"),
            ("Z2MUT1", ResponseType::MuteState, 2, "1"),
            ("HZMUT0", ResponseType::MuteState, 4, "0"),
            ("FN19", ResponseType::InputSourceChannel, 1, "19"),
            ("Z3F04", ResponseType::InputSourceChannel, 3, "04"),
            ("ZEA25", ResponseType::InputSourceChannel, 4, "25"),
            ("SR0006", ResponseType::ListeningMode, 1, "0006"),
            ("LM0a01", ResponseType::PlayingListeningMode, 1, "0a01"),
            ("MC3", ResponseType::McaccMemory, 1, "3"),
        ];
        for (line, response_type, zone, parameter) in cases {
            let response = Response::parse(line).unwrap();
            assert_eq!(response.response_type(), response_type, "{line}");
            assert_eq!(response.zone(), zone, "{line}");
            assert_eq!(response.parameter(), Some(parameter), "{line}");
        }
    }

    #[test]
    fn test_display_information_line() {
        let response = Response::parse("FL000005064449474954414C00455800").unwrap();
        assert_eq!(response.response_type(), ResponseType::DisplayInformation);
        assert_eq!(
            response.parameter(),
            Some("000005064449474954414C00455800")
        );
    }

    #[test]
    fn test_empty_line() {
        assert!(matches!(Response::parse(""), Err(ProtocolError::EmptyLine)));
    }

    #[test]
    fn test_unrecognized_line_keeps_raw_text() {
        match Response::parse("R") {
            Err(ProtocolError::UnrecognizedResponse { line }) => assert_eq!(line, "R"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_match_must_cover_whole_line() {
        // A valid prefix followed by trailing text is not a match.
        assert!(Response::parse("PWR0X").is_err());
        assert!(Response::parse("VOL1850").is_err());
        assert!(Response::parse("XPWR0").is_err());
        assert!(Response::parse("MUT2").is_err());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = Response::parse("ZV050").unwrap();
        for _ in 0..10 {
            assert_eq!(Response::parse("ZV050").unwrap(), first);
        }
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        // Two types and two zones that all accept the same line.
        let entries: [ResponseEntry; 2] = [
            (ResponseType::MuteState, &["AA", "A"], Some("[0-9]A1")),
            (ResponseType::PowerState, &["A"], Some("A[0-9]A1")),
        ];
        let classifier = ResponseClassifier::from_entries(&entries).unwrap();
        let response = classifier.parse("AA5A1").unwrap();
        assert_eq!(response.response_type(), ResponseType::MuteState);
        assert_eq!(response.zone(), 1);
        assert_eq!(response.parameter(), Some("5A1"));

        let reversed: [ResponseEntry; 2] = [entries[1], entries[0]];
        let classifier = ResponseClassifier::from_entries(&reversed).unwrap();
        let response = classifier.parse("AA5A1").unwrap();
        assert_eq!(response.response_type(), ResponseType::PowerState);
        assert_eq!(response.parameter(), Some("A5A1"));
    }

    #[test]
    fn test_lowest_zone_wins_within_type() {
        let entries: [ResponseEntry; 1] =
            [(ResponseType::VolumeLevel, &["V", "VV"], Some("V?[0-9]{2}"))];
        let classifier = ResponseClassifier::from_entries(&entries).unwrap();
        let response = classifier.parse("VV12").unwrap();
        assert_eq!(response.zone(), 1);
        assert_eq!(response.parameter(), Some("V12"));
    }

    #[test]
    fn test_parameter_comes_from_selected_zone() {
        // Zone 1 matches the whole line; zone 2's pattern would also find a
        // (different) substring, which must not be used.
        let entries: [ResponseEntry; 1] =
            [(ResponseType::InputSourceChannel, &["F", "FN"], Some("N?[0-9]{2}"))];
        let classifier = ResponseClassifier::from_entries(&entries).unwrap();
        let response = classifier.parse("FN12").unwrap();
        assert_eq!(response.zone(), 1);
        assert_eq!(response.parameter(), Some("N12"));
    }

    #[test]
    fn test_type_without_pattern() {
        let entries: [ResponseEntry; 1] = [(ResponseType::PowerState, &["OK"], None)];
        let classifier = ResponseClassifier::from_entries(&entries).unwrap();
        let response = classifier.parse("OK").unwrap();
        assert_eq!(response.parameter(), None);
        assert!(classifier.parse("OK1").is_err());
    }

    #[test]
    fn test_prefix_is_literal() {
        // '?' in a prefix must not act as a regex quantifier.
        let entries: [ResponseEntry; 1] = [(ResponseType::PowerState, &["?P"], Some("[0-2]"))];
        let classifier = ResponseClassifier::from_entries(&entries).unwrap();
        assert!(classifier.parse("?P1").is_ok());
        assert!(classifier.parse("P1").is_err());
    }

    #[test]
    fn test_volume_round_trip_with_command() {
        use crate::command::{ParameterizedCommand, ParameterizedCommandType};

        let command = ParameterizedCommand::new(ParameterizedCommandType::VolumeSet, 1).with_parameter("50");
        assert_eq!(command.wire_form().unwrap(), "50VL\r");

        let response = Response::parse("VOL050").unwrap();
        assert_eq!(response.zone(), command.zone());
        let sent: u32 = command.parameter().unwrap().parse().unwrap();
        let reported: u32 = response.parameter().unwrap().parse().unwrap();
        assert_eq!(sent, reported);
    }
}
