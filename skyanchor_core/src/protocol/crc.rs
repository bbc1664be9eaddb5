// skyanchor_core/src/protocol/crc.rs

//! CRC-16/MCRF4XX (the "X.25" checksum used by MAVLink frames).

/// Initial accumulator value.
pub const CRC_INIT: u16 = 0xFFFF;

/// Folds one byte into the running checksum.
#[inline]
pub fn accumulate(byte: u8, crc: u16) -> u16 {
    let mut tmp = byte ^ (crc & 0xFF) as u8;
    tmp ^= tmp << 4;
    let tmp = tmp as u16;
    (crc >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4)
}

/// Checksum over `bytes`, followed by the message-specific `crc_extra` seed byte.
pub fn frame_checksum(bytes: &[u8], crc_extra: u8) -> u16 {
    let crc = bytes.iter().fold(CRC_INIT, |crc, &b| accumulate(b, crc));
    accumulate(crc_extra, crc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_mcrf4xx_check_value() {
        // Standard check input for CRC catalogues.
        let crc = b"123456789"
            .iter()
            .fold(CRC_INIT, |crc, &b| accumulate(b, crc));
        assert_eq!(crc, 0x6F91);
    }

    #[test]
    fn crc_extra_changes_the_result() {
        let body = [0x1C, 0x00, 0x01, 0x01, 0x21];
        assert_ne!(frame_checksum(&body, 104), frame_checksum(&body, 39));
    }
}
