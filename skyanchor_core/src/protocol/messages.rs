// skyanchor_core/src/protocol/messages.rs

//! Wire layouts of the three consumed message kinds and their conversion into
//! SI-unit reports.
//!
//! Fields are little-endian and ordered the way they appear on the wire
//! (largest type first, extensions appended).

// =========================================================================
// == Message Identifiers ==
// =========================================================================

pub const MSG_ID_ATTITUDE: u32 = 30;
pub const MSG_ID_GLOBAL_POSITION_INT: u32 = 33;
pub const MSG_ID_STATUSTEXT: u32 = 253;

/// Length of the NUL-padded text buffer in STATUSTEXT.
pub const STATUSTEXT_TEXT_LEN: usize = 50;

/// Sentinel for "heading unknown" in GLOBAL_POSITION_INT.
const HEADING_UNKNOWN: u16 = u16::MAX;

/// Static per-message facts needed to validate and unpack a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpec {
    pub id: u32,
    pub crc_extra: u8,
    /// Payload length without extension fields. Minimum accepted for v1 frames.
    pub base_len: usize,
    /// Payload length including extension fields.
    pub full_len: usize,
}

pub const ATTITUDE_SPEC: MessageSpec = MessageSpec {
    id: MSG_ID_ATTITUDE,
    crc_extra: 39,
    base_len: 28,
    full_len: 28,
};

pub const GLOBAL_POSITION_INT_SPEC: MessageSpec = MessageSpec {
    id: MSG_ID_GLOBAL_POSITION_INT,
    crc_extra: 104,
    base_len: 28,
    full_len: 28,
};

pub const STATUSTEXT_SPEC: MessageSpec = MessageSpec {
    id: MSG_ID_STATUSTEXT,
    crc_extra: 83,
    base_len: 51,
    full_len: 54,
};

/// Looks up the layout of a consumed message. `None` means "not ours to decode".
pub fn message_spec(id: u32) -> Option<MessageSpec> {
    match id {
        MSG_ID_ATTITUDE => Some(ATTITUDE_SPEC),
        MSG_ID_GLOBAL_POSITION_INT => Some(GLOBAL_POSITION_INT_SPEC),
        MSG_ID_STATUSTEXT => Some(STATUSTEXT_SPEC),
        _ => None,
    }
}

// --- Little-endian field readers over a zero-extended payload ---

fn read_u16(p: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([p[at], p[at + 1]])
}
fn read_i16(p: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([p[at], p[at + 1]])
}
fn read_u32(p: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}
fn read_i32(p: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}
fn read_f32(p: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(p, at))
}

// =========================================================================
// == GLOBAL_POSITION_INT ==
// =========================================================================

/// Raw GLOBAL_POSITION_INT payload, integer-scaled exactly as transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalPositionInt {
    pub time_boot_ms: u32,
    /// Latitude, degrees * 1e7.
    pub lat: i32,
    /// Longitude, degrees * 1e7.
    pub lon: i32,
    /// Altitude above mean sea level, millimetres.
    pub alt: i32,
    /// Altitude above home, millimetres.
    pub relative_alt: i32,
    /// Ground velocity (north, east, down), cm/s.
    pub vx: i16,
    pub vy: i16,
    pub vz: i16,
    /// Heading, centidegrees. `u16::MAX` when unknown.
    pub hdg: u16,
}

impl GlobalPositionInt {
    /// Builds a raw report from SI values. Used by the emitter and tests.
    pub fn from_degrees(
        time_boot_ms: u32,
        latitude: f64,
        longitude: f64,
        relative_altitude: f64,
    ) -> Self {
        Self {
            time_boot_ms,
            lat: (latitude * 1e7).round() as i32,
            lon: (longitude * 1e7).round() as i32,
            alt: (relative_altitude * 1000.0).round() as i32,
            relative_alt: (relative_altitude * 1000.0).round() as i32,
            vx: 0,
            vy: 0,
            vz: 0,
            hdg: HEADING_UNKNOWN,
        }
    }

    pub(crate) fn parse(p: &[u8]) -> Self {
        Self {
            time_boot_ms: read_u32(p, 0),
            lat: read_i32(p, 4),
            lon: read_i32(p, 8),
            alt: read_i32(p, 12),
            relative_alt: read_i32(p, 16),
            vx: read_i16(p, 20),
            vy: read_i16(p, 22),
            vz: read_i16(p, 24),
            hdg: read_u16(p, 26),
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.time_boot_ms.to_le_bytes());
        out.extend_from_slice(&self.lat.to_le_bytes());
        out.extend_from_slice(&self.lon.to_le_bytes());
        out.extend_from_slice(&self.alt.to_le_bytes());
        out.extend_from_slice(&self.relative_alt.to_le_bytes());
        out.extend_from_slice(&self.vx.to_le_bytes());
        out.extend_from_slice(&self.vy.to_le_bytes());
        out.extend_from_slice(&self.vz.to_le_bytes());
        out.extend_from_slice(&self.hdg.to_le_bytes());
    }

    /// Converts the integer-scaled fields into degrees, metres and m/s.
    pub fn to_report(&self) -> GlobalPosition {
        GlobalPosition {
            time_boot_ms: self.time_boot_ms,
            latitude: self.lat as f64 / 1e7,
            longitude: self.lon as f64 / 1e7,
            altitude_msl: self.alt as f64 / 1000.0,
            relative_altitude: self.relative_alt as f64 / 1000.0,
            velocity_ned: [
                self.vx as f32 / 100.0,
                self.vy as f32 / 100.0,
                self.vz as f32 / 100.0,
            ],
            heading_deg: (self.hdg != HEADING_UNKNOWN).then(|| self.hdg as f32 / 100.0),
        }
    }
}

/// A decoded global position report in SI units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalPosition {
    pub time_boot_ms: u32,
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Metres above mean sea level.
    pub altitude_msl: f64,
    /// Metres above the home position.
    pub relative_altitude: f64,
    /// North, east, down in m/s.
    pub velocity_ned: [f32; 3],
    /// Degrees, `None` when the vehicle does not know its heading.
    pub heading_deg: Option<f32>,
}

// =========================================================================
// == ATTITUDE ==
// =========================================================================

/// ATTITUDE payload. Angles are already radians in the body frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attitude {
    pub time_boot_ms: u32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub rollspeed: f32,
    pub pitchspeed: f32,
    pub yawspeed: f32,
}

impl Attitude {
    pub(crate) fn parse(p: &[u8]) -> Self {
        Self {
            time_boot_ms: read_u32(p, 0),
            roll: read_f32(p, 4),
            pitch: read_f32(p, 8),
            yaw: read_f32(p, 12),
            rollspeed: read_f32(p, 16),
            pitchspeed: read_f32(p, 20),
            yawspeed: read_f32(p, 24),
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.time_boot_ms.to_le_bytes());
        for v in [
            self.roll,
            self.pitch,
            self.yaw,
            self.rollspeed,
            self.pitchspeed,
            self.yawspeed,
        ] {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

// =========================================================================
// == STATUSTEXT ==
// =========================================================================

/// MAV_SEVERITY, lowest number is most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            // Out-of-range values are treated as the least severe.
            _ => Severity::Debug,
        }
    }

    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

/// A decoded status text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    pub severity: Severity,
    /// ASCII text, cut at the first NUL.
    pub text: String,
    /// Multi-chunk message id (v2 extension). 0 for single-chunk messages.
    pub id: u16,
    pub chunk_seq: u8,
}

impl StatusText {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            id: 0,
            chunk_seq: 0,
        }
    }

    pub(crate) fn parse(p: &[u8]) -> Self {
        let raw_text = &p[1..1 + STATUSTEXT_TEXT_LEN];
        Self {
            severity: Severity::from_raw(p[0]),
            text: trim_at_nul(raw_text),
            id: read_u16(p, 51),
            chunk_seq: p[53],
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push(self.severity.as_raw());
        let mut text = [0u8; STATUSTEXT_TEXT_LEN];
        let bytes = self.text.as_bytes();
        let n = bytes.len().min(STATUSTEXT_TEXT_LEN);
        text[..n].copy_from_slice(&bytes[..n]);
        out.extend_from_slice(&text);
        out.extend_from_slice(&self.id.to_le_bytes());
        out.push(self.chunk_seq);
    }
}

/// Decodes a NUL-padded ASCII buffer, dropping everything from the first NUL on.
/// Non-ASCII bytes are replaced rather than rejected.
pub fn trim_at_nul(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    raw[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn trims_everything_after_the_first_nul() {
        assert_eq!(trim_at_nul(b"ARM\0\0\0"), "ARM");
        assert_eq!(trim_at_nul(b"ARM\0junk"), "ARM");
        assert_eq!(trim_at_nul(b"\0ARM"), "");
        assert_eq!(trim_at_nul(b"NO NUL"), "NO NUL");
    }

    #[test]
    fn position_scaling_uses_1e7_and_millimetres() {
        let raw = GlobalPositionInt {
            lat: 473_977_418,
            lon: 85_455_939,
            relative_alt: 12_345,
            alt: 500_000,
            hdg: 9_000,
            vx: 150,
            ..Default::default()
        };
        let report = raw.to_report();
        assert_abs_diff_eq!(report.latitude, 47.3977418, epsilon = 1e-12);
        assert_abs_diff_eq!(report.longitude, 8.5455939, epsilon = 1e-12);
        assert_abs_diff_eq!(report.relative_altitude, 12.345, epsilon = 1e-12);
        assert_abs_diff_eq!(report.altitude_msl, 500.0, epsilon = 1e-12);
        assert_eq!(report.heading_deg, Some(90.0));
        assert_abs_diff_eq!(report.velocity_ned[0], 1.5, epsilon = 1e-6);
    }

    #[test]
    fn unknown_heading_maps_to_none() {
        let raw = GlobalPositionInt::from_degrees(0, 1.0, 2.0, 3.0);
        assert_eq!(raw.to_report().heading_deg, None);
    }

    #[test]
    fn out_of_range_severity_is_debug() {
        assert_eq!(Severity::from_raw(3), Severity::Error);
        assert_eq!(Severity::from_raw(42), Severity::Debug);
    }
}
