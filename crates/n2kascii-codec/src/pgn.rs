//! Well-known Parameter Group Numbers.
//!
//! Only the handful that show up in gateway logs. The codec itself treats
//! every PGN the same.

/// ISO Request.
pub const ISO_REQUEST: u32 = 59904;

/// ISO Address Claim.
pub const ISO_ADDRESS_CLAIM: u32 = 60928;

/// Product Information.
pub const PRODUCT_INFORMATION: u32 = 126996;

/// System Time.
pub const SYSTEM_TIME: u32 = 126992;

/// Vessel Heading.
pub const VESSEL_HEADING: u32 = 127250;

/// Rudder.
pub const RUDDER: u32 = 127245;

/// Engine Parameters, Rapid Update.
pub const ENGINE_RAPID: u32 = 127488;

/// Transmission Parameters, Dynamic.
pub const TRANSMISSION: u32 = 127493;

/// Position, Rapid Update.
pub const POSITION_RAPID: u32 = 129025;

/// COG & SOG, Rapid Update.
pub const COG_SOG_RAPID: u32 = 129026;

/// Wind Data.
pub const WIND: u32 = 130306;

/// PDU format values below this carry a destination address (PDU1).
const PDU1_PF_LIMIT: u32 = 0xF0;

/// Returns a human-readable name for a PGN.
pub fn pgn_name(pgn: u32) -> &'static str {
    match pgn {
        ISO_REQUEST => "ISO Request",
        ISO_ADDRESS_CLAIM => "ISO Address Claim",
        PRODUCT_INFORMATION => "Product Information",
        SYSTEM_TIME => "System Time",
        VESSEL_HEADING => "Vessel Heading",
        RUDDER => "Rudder",
        ENGINE_RAPID => "Engine Parameters, Rapid Update",
        TRANSMISSION => "Transmission Parameters, Dynamic",
        POSITION_RAPID => "Position, Rapid Update",
        COG_SOG_RAPID => "COG & SOG, Rapid Update",
        WIND => "Wind Data",
        _ if is_proprietary(pgn) => "PROPRIETARY",
        _ => "UNKNOWN",
    }
}

/// Returns true if the PGN is addressed to a single destination (PDU1 format).
pub fn is_pdu1(pgn: u32) -> bool {
    ((pgn >> 8) & 0xFF) < PDU1_PF_LIMIT
}

/// Returns true if the PGN is in one of the manufacturer-proprietary ranges.
pub fn is_proprietary(pgn: u32) -> bool {
    matches!(pgn, 0xEF00 | 0xFF00..=0xFFFF | 0x1EF00 | 0x1FF00..=0x1FFFF)
}
