// skyanchor_core/src/protocol/encode.rs

//! Frame construction for the consumed message kinds.
//!
//! The receive path never sends anything; this exists for the synthetic
//! telemetry emitter and for building test datagrams.

use super::crc::frame_checksum;
use super::messages::{
    Attitude, GlobalPositionInt, MessageSpec, StatusText, ATTITUDE_SPEC,
    GLOBAL_POSITION_INT_SPEC, STATUSTEXT_SPEC,
};
use super::{MAGIC_V1, MAGIC_V2};

/// A message ready to be framed.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingMessage {
    GlobalPosition(GlobalPositionInt),
    Attitude(Attitude),
    StatusText(StatusText),
}

impl OutgoingMessage {
    fn spec(&self) -> MessageSpec {
        match self {
            OutgoingMessage::GlobalPosition(_) => GLOBAL_POSITION_INT_SPEC,
            OutgoingMessage::Attitude(_) => ATTITUDE_SPEC,
            OutgoingMessage::StatusText(_) => STATUSTEXT_SPEC,
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.spec().full_len);
        match self {
            OutgoingMessage::GlobalPosition(m) => m.write(&mut out),
            OutgoingMessage::Attitude(m) => m.write(&mut out),
            OutgoingMessage::StatusText(m) => m.write(&mut out),
        }
        out
    }
}

/// Builds a v1 frame. Extension fields are not representable in v1 and are dropped.
pub fn encode_v1(sequence: u8, system_id: u8, component_id: u8, msg: &OutgoingMessage) -> Vec<u8> {
    let spec = msg.spec();
    let mut payload = msg.payload();
    payload.truncate(spec.base_len);

    let mut frame = Vec::with_capacity(6 + payload.len() + 2);
    frame.extend_from_slice(&[
        MAGIC_V1,
        payload.len() as u8,
        sequence,
        system_id,
        component_id,
        spec.id as u8,
    ]);
    frame.extend_from_slice(&payload);
    let crc = frame_checksum(&frame[1..], spec.crc_extra);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

/// Builds an unsigned v2 frame with trailing zero bytes of the payload removed.
pub fn encode_v2(sequence: u8, system_id: u8, component_id: u8, msg: &OutgoingMessage) -> Vec<u8> {
    let spec = msg.spec();
    let mut payload = msg.payload();
    // At least one payload byte always remains on the wire.
    while payload.len() > 1 && payload.last() == Some(&0) {
        payload.pop();
    }

    let id = spec.id.to_le_bytes();
    let mut frame = Vec::with_capacity(10 + payload.len() + 2);
    frame.extend_from_slice(&[
        MAGIC_V2,
        payload.len() as u8,
        0, // incompat flags
        0, // compat flags
        sequence,
        system_id,
        component_id,
        id[0],
        id[1],
        id[2],
    ]);
    frame.extend_from_slice(&payload);
    let crc = frame_checksum(&frame[1..], spec.crc_extra);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::Severity;

    #[test]
    fn v1_frames_have_fixed_length() {
        let msg = OutgoingMessage::Attitude(Attitude::default());
        let frame = encode_v1(3, 1, 1, &msg);
        assert_eq!(frame.len(), 6 + 28 + 2);
        assert_eq!(frame[1], 28);
        assert_eq!(frame[5], 30);
    }

    #[test]
    fn v1_status_text_drops_extensions() {
        let msg = OutgoingMessage::StatusText(StatusText::new(Severity::Info, "hello"));
        assert_eq!(encode_v1(0, 1, 1, &msg)[1], 51);
    }

    #[test]
    fn v2_keeps_at_least_one_payload_byte() {
        let frame = encode_v2(0, 1, 1, &OutgoingMessage::Attitude(Attitude::default()));
        assert_eq!(frame[1], 1);
        assert_eq!(frame.len(), 10 + 1 + 2);
    }
}
