//! Outer frame type tags.
//!
//! Uplink tags (gateway to host) live in 0xA0-0xAF, downlink tags (host to
//! gateway) in 0xB0-0xBF.

/// Node HELLO relayed by the gateway.
pub const UP_HELLO: u8 = 0xA1;

/// Node TELEMETRY relayed by the gateway, stamped with the gateway clock.
pub const UP_TELEMETRY: u8 = 0xA2;

/// Node CONFIG_ACK relayed by the gateway.
pub const UP_CONFIG_ACK: u8 = 0xA3;

/// Configuration to forward to a node.
pub const DOWN_CONFIG: u8 = 0xB1;

/// Handshake to forward to a node (pulls it out of pairing).
pub const DOWN_HANDSHAKE: u8 = 0xB2;

/// Returns a human-readable name for a frame tag.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        UP_HELLO => "UP_HELLO",
        UP_TELEMETRY => "UP_TELEMETRY",
        UP_CONFIG_ACK => "UP_CONFIG_ACK",
        DOWN_CONFIG => "DOWN_CONFIG",
        DOWN_HANDSHAKE => "DOWN_HANDSHAKE",
        0xA0..=0xAF => "UP_RESERVED",
        0xB0..=0xBF => "DOWN_RESERVED",
        _ => "UNKNOWN",
    }
}

/// Returns true if the tag is in the uplink range.
pub fn is_uplink(tag: u8) -> bool {
    (0xA0..=0xAF).contains(&tag)
}

/// Returns true if the tag is in the downlink range.
pub fn is_downlink(tag: u8) -> bool {
    (0xB0..=0xBF).contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_ranges() {
        assert_eq!(tag_name(UP_TELEMETRY), "UP_TELEMETRY");
        assert_eq!(tag_name(0xA7), "UP_RESERVED");
        assert_eq!(tag_name(0x10), "UNKNOWN");
        assert!(is_uplink(UP_CONFIG_ACK));
        assert!(!is_uplink(DOWN_CONFIG));
        assert!(is_downlink(DOWN_HANDSHAKE));
    }
}
