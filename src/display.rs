// MIT License - Copyright (c) 2026 Peter Wright
// Front panel display (FL) decoding

use bitflags::bitflags;
use tracing::warn;

use crate::response::{Response, ResponseType};

bitflags! {
    /// Flags carried in the first hex digit of an `FL` display line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayFlags: u8 {
        /// Bit 0 - guide icon lit
        const ICON           = 0b01;
        /// Bit 1 - the display is showing the volume level
        const VOLUME_DISPLAY = 0b10;
    }
}

/// Decoded front-panel display line.
///
/// Payload layout: one hex digit of flags, one unused digit, then the display
/// text as two hex digits per ASCII byte:
///
/// ```text
/// 0 0 05 06 44 49 47 49 54 41 4C 00 45 58 00
/// ^   ^---------- "\x05\x06DIGITAL\0EX\0" ----
/// flags
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInformation {
    flags: DisplayFlags,
    info_text: String,
}

impl DisplayInformation {
    /// Decode a payload. Never fails: an unparseable flag digit yields no
    /// flags, and malformed byte pairs are skipped.
    pub fn decode(payload: &str) -> Self {
        let flags = payload
            .get(0..1)
            .and_then(|digit| u8::from_str_radix(digit, 16).ok())
            .map(DisplayFlags::from_bits_truncate)
            .unwrap_or_else(|| {
                if !payload.is_empty() {
                    warn!("Invalid display flag digit in {:?}", payload);
                }
                DisplayFlags::empty()
            });

        let bytes = payload.as_bytes();
        let mut info_text = String::new();
        let mut offset = 2;
        while offset + 2 <= bytes.len() {
            let pair = &bytes[offset..offset + 2];
            match std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
            {
                Some(byte) => info_text.push(char::from(byte)),
                None => warn!(
                    "Skipping malformed display byte {:?} at offset {}",
                    String::from_utf8_lossy(pair),
                    offset
                ),
            }
            offset += 2;
        }

        Self { flags, info_text }
    }

    /// Decode the parameter of a `DISPLAY_INFORMATION` response.
    pub fn from_response(response: &Response) -> Option<Self> {
        if response.response_type() != ResponseType::DisplayInformation {
            return None;
        }
        response.parameter().map(Self::decode)
    }

    pub fn flags(&self) -> DisplayFlags {
        self.flags
    }

    pub fn is_guide_icon(&self) -> bool {
        self.flags.contains(DisplayFlags::ICON)
    }

    pub fn is_volume_display(&self) -> bool {
        self.flags.contains(DisplayFlags::VOLUME_DISPLAY)
    }

    pub fn info_text(&self) -> &str {
        &self.info_text
    }
}
