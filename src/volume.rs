// MIT License - Copyright (c) 2026 Peter Wright
// Volume scale conversions
//
//! Conversion between user-facing volume (percent, dB) and the receiver's
//! volume steps.
//!
//! The main zone and HDZone use 0.5 dB steps from `000` (mute) through
//! `001` (-80.0 dB) up to `185` (+12.0 dB). Zones 2 and 3 use 1 dB steps from
//! `00` (mute) through `01` (-80 dB) up to `81` (0 dB).

/// Highest volume step for a zone. Zone 0 is the main zone.
pub fn max_volume(zone: u8) -> u32 {
    match zone {
        2 | 3 => 81,
        _ => 185,
    }
}

fn is_half_db_zone(zone: u8) -> bool {
    !matches!(zone, 2 | 3)
}

/// Percent (0-100, clamped) to the nearest volume step.
pub fn percent_to_device(percent: u8, zone: u8) -> u32 {
    let percent = u32::from(percent.min(100));
    (percent * max_volume(zone) + 50) / 100
}

/// Volume step to percent, rounded.
pub fn device_to_percent(level: u32, zone: u8) -> u8 {
    let max = max_volume(zone);
    let level = level.min(max);
    ((level * 100 + max / 2) / max) as u8
}

/// dB to the nearest volume step, clamped to the zone's range.
pub fn db_to_device(db: f64, zone: u8) -> u32 {
    let steps = if is_half_db_zone(zone) {
        ((db + 80.5) * 2.0).round()
    } else {
        (db + 81.0).round()
    };
    steps.clamp(0.0, f64::from(max_volume(zone))) as u32
}

/// Volume step to dB. Step 0 means muted and maps to the floor of the scale.
pub fn device_to_db(level: u32, zone: u8) -> f64 {
    let level = f64::from(level.min(max_volume(zone)));
    if is_half_db_zone(zone) {
        level / 2.0 - 80.5
    } else {
        level - 81.0
    }
}

/// Format a step the way the zone's `VOLUME_SET` expects it: three digits for
/// the main zone and HDZone, two for zones 2 and 3.
pub fn format_device_volume(level: u32, zone: u8) -> String {
    let level = level.min(max_volume(zone));
    if is_half_db_zone(zone) {
        format!("{level:03}")
    } else {
        format!("{level:02}")
    }
}
