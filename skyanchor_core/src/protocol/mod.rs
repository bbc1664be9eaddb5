// skyanchor_core/src/protocol/mod.rs

//! Stateless decoding of MAVLink-framed telemetry datagrams.
//!
//! Only three message kinds are unpacked (global position, attitude and status
//! text). Every other message id is structurally validated and then reported as
//! [`TelemetryMessage::Ignored`], which is not an error.
//!
//! # Wire Format
//!
//! ```text
//! v1: ┌──────┬─────┬─────┬───────┬────────┬───────┬─────────┬────────┐
//!     │ 0xFE │ len │ seq │ sysid │ compid │ msgid │ payload │ crc16  │
//!     └──────┴─────┴─────┴───────┴────────┴───────┴─────────┴────────┘
//! v2: ┌──────┬─────┬────────┬────────┬─────┬───────┬────────┬──────────┬─────────┬───────┬────────────┐
//!     │ 0xFD │ len │ incomp │ compat │ seq │ sysid │ compid │ msgid:3  │ payload │ crc16 │ [sig: 13]  │
//!     └──────┴─────┴────────┴────────┴─────┴───────┴────────┴──────────┴─────────┴───────┴────────────┘
//! ```

pub mod crc;
pub mod encode;
pub mod messages;

use thiserror::Error;

pub use encode::{encode_v1, encode_v2, OutgoingMessage};
pub use messages::{
    Attitude, GlobalPosition, GlobalPositionInt, Severity, StatusText, MSG_ID_ATTITUDE,
    MSG_ID_GLOBAL_POSITION_INT, MSG_ID_STATUSTEXT,
};

use messages::{message_spec, MessageSpec};

pub const MAGIC_V1: u8 = 0xFE;
pub const MAGIC_V2: u8 = 0xFD;

const HEADER_LEN_V1: usize = 6;
const HEADER_LEN_V2: usize = 10;
const CHECKSUM_LEN: usize = 2;
const SIGNATURE_LEN: usize = 13;

/// The only incompatibility flag we understand: the frame carries a signature.
const INCOMPAT_FLAG_SIGNED: u8 = 0x01;

/// Largest payload the length byte can describe.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Structural problems with a datagram. Wrong-kind messages never end up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty datagram")]
    Empty,

    #[error("unknown start-of-frame marker 0x{0:02X}")]
    UnknownMagic(u8),

    #[error("frame truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("message {message_id} payload is {actual} bytes, expected at least {expected}")]
    LengthMismatch {
        message_id: u32,
        expected: usize,
        actual: usize,
    },

    #[error("checksum mismatch on message {message_id}: got 0x{received:04X}, computed 0x{computed:04X}")]
    BadChecksum {
        message_id: u32,
        received: u16,
        computed: u16,
    },

    #[error("unsupported incompatibility flags 0x{0:02X}")]
    IncompatibleFlags(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V1,
    V2,
}

/// Routing information common to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: ProtocolVersion,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u32,
}

/// A decoded message of one of the consumed kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    GlobalPosition(GlobalPosition),
    Attitude(Attitude),
    StatusText(StatusText),
    /// A structurally valid frame carrying a message we do not consume.
    Ignored { message_id: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: FrameHeader,
    pub message: TelemetryMessage,
}

/// Decodes the first frame in `buffer`. Bytes after that frame are ignored.
pub fn decode(buffer: &[u8]) -> Result<Frame, DecodeError> {
    decode_one(buffer).map(|(frame, _)| frame)
}

/// Iterates over every frame packed into one datagram.
///
/// Iteration stops after the first error: without a valid length byte there is
/// no reliable way to find the next frame boundary.
pub fn frames(buffer: &[u8]) -> Frames<'_> {
    Frames {
        remaining: buffer,
        failed: false,
    }
}

pub struct Frames<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }
        match decode_one(self.remaining) {
            Ok((frame, consumed)) => {
                self.remaining = &self.remaining[consumed..];
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Decodes one frame and returns it with the number of bytes it occupied.
fn decode_one(buffer: &[u8]) -> Result<(Frame, usize), DecodeError> {
    let magic = *buffer.first().ok_or(DecodeError::Empty)?;

    // --- 1. Parse the version-specific header ---
    let (header, header_len, payload_len, signed) = match magic {
        MAGIC_V1 => {
            require(buffer, HEADER_LEN_V1)?;
            let header = FrameHeader {
                version: ProtocolVersion::V1,
                sequence: buffer[2],
                system_id: buffer[3],
                component_id: buffer[4],
                message_id: buffer[5] as u32,
            };
            (header, HEADER_LEN_V1, buffer[1] as usize, false)
        }
        MAGIC_V2 => {
            require(buffer, HEADER_LEN_V2)?;
            let incompat_flags = buffer[2];
            if incompat_flags & !INCOMPAT_FLAG_SIGNED != 0 {
                return Err(DecodeError::IncompatibleFlags(incompat_flags));
            }
            let header = FrameHeader {
                version: ProtocolVersion::V2,
                sequence: buffer[4],
                system_id: buffer[5],
                component_id: buffer[6],
                message_id: u32::from_le_bytes([buffer[7], buffer[8], buffer[9], 0]),
            };
            let signed = incompat_flags & INCOMPAT_FLAG_SIGNED != 0;
            (header, HEADER_LEN_V2, buffer[1] as usize, signed)
        }
        other => return Err(DecodeError::UnknownMagic(other)),
    };

    // --- 2. Make sure the whole frame is present ---
    let checksum_at = header_len + payload_len;
    let frame_len =
        checksum_at + CHECKSUM_LEN + if signed { SIGNATURE_LEN } else { 0 };
    require(buffer, frame_len)?;

    let payload = &buffer[header_len..checksum_at];

    // --- 3. Unknown messages: structure is fine, checksum seed is unknown ---
    let spec = match message_spec(header.message_id) {
        Some(spec) => spec,
        None => {
            let frame = Frame {
                header,
                message: TelemetryMessage::Ignored {
                    message_id: header.message_id,
                },
            };
            return Ok((frame, frame_len));
        }
    };

    // --- 4. Validate length and checksum of consumed messages ---
    if header.version == ProtocolVersion::V1 && payload_len < spec.base_len {
        return Err(DecodeError::LengthMismatch {
            message_id: spec.id,
            expected: spec.base_len,
            actual: payload_len,
        });
    }

    let received = u16::from_le_bytes([buffer[checksum_at], buffer[checksum_at + 1]]);
    let computed = crc::frame_checksum(&buffer[1..checksum_at], spec.crc_extra);
    if received != computed {
        return Err(DecodeError::BadChecksum {
            message_id: spec.id,
            received,
            computed,
        });
    }

    let frame = Frame {
        header,
        message: unpack(spec, payload),
    };
    Ok((frame, frame_len))
}

/// Zero-extends the payload to its full length (v2 drops trailing zeros) and
/// unpacks it. Bytes beyond the known layout are ignored.
fn unpack(spec: MessageSpec, payload: &[u8]) -> TelemetryMessage {
    let mut full = [0u8; MAX_PAYLOAD_LEN];
    let n = payload.len().min(spec.full_len);
    full[..n].copy_from_slice(&payload[..n]);
    let p = &full[..spec.full_len];

    match spec.id {
        MSG_ID_GLOBAL_POSITION_INT => {
            TelemetryMessage::GlobalPosition(GlobalPositionInt::parse(p).to_report())
        }
        MSG_ID_ATTITUDE => TelemetryMessage::Attitude(Attitude::parse(p)),
        MSG_ID_STATUSTEXT => TelemetryMessage::StatusText(StatusText::parse(p)),
        other => TelemetryMessage::Ignored { message_id: other },
    }
}

fn require(buffer: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buffer.len() < needed {
        Err(DecodeError::Truncated {
            needed,
            available: buffer.len(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::encode::{encode_v1, encode_v2, OutgoingMessage};
    use super::*;
    use approx::assert_abs_diff_eq;

    fn position_frame() -> Vec<u8> {
        let raw = GlobalPositionInt {
            time_boot_ms: 1_000,
            lat: -337_654_321,
            lon: 1_512_345_678,
            alt: 120_500,
            relative_alt: 45_250,
            vx: -20,
            vy: 35,
            vz: 1,
            hdg: 27_000,
        };
        encode_v2(7, 1, 1, &OutgoingMessage::GlobalPosition(raw))
    }

    #[test]
    fn decodes_global_position_in_degrees_and_metres() {
        let frame = decode(&position_frame()).expect("valid frame");
        assert_eq!(frame.header.version, ProtocolVersion::V2);
        assert_eq!(frame.header.sequence, 7);
        match frame.message {
            TelemetryMessage::GlobalPosition(p) => {
                assert_abs_diff_eq!(p.latitude, -33.7654321, epsilon = 1e-12);
                assert_abs_diff_eq!(p.longitude, 151.2345678, epsilon = 1e-12);
                assert_abs_diff_eq!(p.relative_altitude, 45.25, epsilon = 1e-12);
                assert_abs_diff_eq!(p.altitude_msl, 120.5, epsilon = 1e-12);
                assert_eq!(p.heading_deg, Some(270.0));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn attitude_angles_pass_through_unscaled() {
        let attitude = Attitude {
            time_boot_ms: 5,
            roll: 0.1,
            pitch: -0.25,
            yaw: 3.0,
            ..Default::default()
        };
        let bytes = encode_v1(0, 1, 1, &OutgoingMessage::Attitude(attitude));
        match decode(&bytes).expect("valid frame").message {
            TelemetryMessage::Attitude(a) => {
                assert_eq!(a.roll, 0.1);
                assert_eq!(a.pitch, -0.25);
                assert_eq!(a.yaw, 3.0);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn status_text_is_trimmed_at_first_nul() {
        let status = StatusText::new(Severity::Notice, "ARM\0\0\0");
        let bytes = encode_v2(0, 1, 1, &OutgoingMessage::StatusText(status));
        match decode(&bytes).expect("valid frame").message {
            TelemetryMessage::StatusText(s) => {
                assert_eq!(s.text, "ARM");
                assert_eq!(s.severity, Severity::Notice);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn v2_truncated_trailing_zeros_are_restored() {
        // A STATUSTEXT with short text loses most of its payload to truncation.
        let status = StatusText::new(Severity::Info, "GO");
        let bytes = encode_v2(0, 1, 1, &OutgoingMessage::StatusText(status));
        assert!(bytes[1] < 54, "payload should have been truncated");
        match decode(&bytes).expect("valid frame").message {
            TelemetryMessage::StatusText(s) => assert_eq!(s.text, "GO"),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn unknown_message_ids_are_ignored_not_errors() {
        // HEARTBEAT (id 0) with a 9 byte payload; checksum content is irrelevant.
        let mut bytes = vec![MAGIC_V2, 9, 0, 0, 3, 1, 1, 0, 0, 0];
        bytes.extend_from_slice(&[0u8; 9]);
        bytes.extend_from_slice(&[0xAB, 0xCD]);
        let frame = decode(&bytes).expect("structurally valid");
        assert_eq!(frame.message, TelemetryMessage::Ignored { message_id: 0 });
    }

    #[test]
    fn corrupted_payload_fails_the_checksum() {
        let mut bytes = position_frame();
        bytes[12] ^= 0xFF;
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::BadChecksum {
                message_id: MSG_ID_GLOBAL_POSITION_INT,
                ..
            })
        ));
    }

    #[test]
    fn truncated_frames_are_rejected() {
        let bytes = position_frame();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            decode(&bytes[..4]),
            Err(DecodeError::Truncated { .. })
        ));
        assert_eq!(decode(&[]), Err(DecodeError::Empty));
        assert_eq!(decode(&[0x55, 1, 2]), Err(DecodeError::UnknownMagic(0x55)));
    }

    #[test]
    fn short_v1_payload_is_a_length_mismatch() {
        let mut bytes = vec![MAGIC_V1, 4, 0, 1, 1, MSG_ID_ATTITUDE as u8];
        bytes.extend_from_slice(&[0u8; 4]);
        bytes.extend_from_slice(&[0, 0]);
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::LengthMismatch { expected: 28, .. })
        ));
    }

    #[test]
    fn signed_frames_require_the_signature_bytes() {
        let mut bytes = position_frame();
        bytes[2] = INCOMPAT_FLAG_SIGNED;
        // Flag set but no signature appended.
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::Truncated { .. })
        ));
        bytes.extend_from_slice(&[0u8; SIGNATURE_LEN]);
        // The incompat byte is covered by the checksum, so fix it up.
        let checksum_at = bytes.len() - SIGNATURE_LEN - 2;
        let crc = crc::frame_checksum(&bytes[1..checksum_at], 104);
        bytes[checksum_at..checksum_at + 2].copy_from_slice(&crc.to_le_bytes());
        assert!(decode(&bytes).is_ok());
    }

    #[test]
    fn unknown_incompat_flags_are_refused() {
        let mut bytes = position_frame();
        bytes[2] = 0x02;
        assert_eq!(decode(&bytes), Err(DecodeError::IncompatibleFlags(0x02)));
    }

    #[test]
    fn iterates_over_packed_frames() {
        let mut datagram = position_frame();
        datagram.extend(encode_v2(
            8,
            1,
            1,
            &OutgoingMessage::StatusText(StatusText::new(Severity::Info, "OK")),
        ));
        let decoded: Vec<_> = frames(&datagram).collect();
        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(Result::is_ok));
    }
}
