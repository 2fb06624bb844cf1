//! Fixed-layout V2X telemetry packet.
//!
//! All multi-byte fields are little-endian. Receivers parse this layout
//! byte-for-byte, so offsets must not move.
//!
//! ```text
//! offset size field
//!  0     8    latitude        f64
//!  8     8    longitude       f64
//! 16     8    speed (km/h)    f64
//! 24     8    heading (deg)   f64
//! 32     8    timestamp (ms)  f64, epoch milliseconds at encode time
//! 40     2    flags           u16, see `flags`
//! 42     1    wiper level     u8
//! 43     1    left signal     u8 (0/1)
//! 44     1    right signal    u8 (0/1)
//! 45    27    reserved        zero
//! ```

use super::types::{Tick, V2xState};

/// Total encoded size in bytes.
pub const PACKET_SIZE: usize = 72;

pub type Packet = [u8; PACKET_SIZE];

/// Indicator bits of the flag field (bit 0 = least significant).
pub mod flags {
    pub const EEBL: u16 = 1 << 0;
    pub const LIGHT_BAR: u16 = 1 << 1;
    pub const SIREN: u16 = 1 << 2;
    pub const FLASHER: u16 = 1 << 3;
    pub const FOGLIGHT: u16 = 1 << 4;
    pub const DRL: u16 = 1 << 5;
}

const LAT_OFFSET: usize = 0;
const LNG_OFFSET: usize = 8;
const SPEED_OFFSET: usize = 16;
const HEADING_OFFSET: usize = 24;
const TIMESTAMP_OFFSET: usize = 32;
const FLAGS_OFFSET: usize = 40;
const WIPER_OFFSET: usize = 42;
const LEFT_SIGNAL_OFFSET: usize = 43;
const RIGHT_SIGNAL_OFFSET: usize = 44;

/// Bitwise OR of the set indicator flags.
pub fn flag_bits(v2x: &V2xState) -> u16 {
    [
        (v2x.eebl, flags::EEBL),
        (v2x.light_bar, flags::LIGHT_BAR),
        (v2x.siren, flags::SIREN),
        (v2x.flasher, flags::FLASHER),
        (v2x.foglight, flags::FOGLIGHT),
        (v2x.drl, flags::DRL),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .fold(0, |acc, (_, bit)| acc | bit)
}

/// Encode a tick, stamping it with the current wall-clock time.
pub fn encode(tick: &Tick) -> Packet {
    encode_at(tick, chrono::Utc::now().timestamp_millis() as f64)
}

/// Encode a tick with an explicit epoch-millisecond timestamp.
pub fn encode_at(tick: &Tick, timestamp_ms: f64) -> Packet {
    let mut buf = [0u8; PACKET_SIZE];
    put_f64(&mut buf, LAT_OFFSET, tick.position.lat);
    put_f64(&mut buf, LNG_OFFSET, tick.position.lng);
    put_f64(&mut buf, SPEED_OFFSET, tick.speed_kmh);
    put_f64(&mut buf, HEADING_OFFSET, tick.heading_deg);
    put_f64(&mut buf, TIMESTAMP_OFFSET, timestamp_ms);
    buf[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&flag_bits(&tick.v2x).to_le_bytes());
    buf[WIPER_OFFSET] = tick.v2x.wiper;
    buf[LEFT_SIGNAL_OFFSET] = tick.v2x.left_signal as u8;
    buf[RIGHT_SIGNAL_OFFSET] = tick.v2x.right_signal as u8;
    buf
}

#[inline]
fn put_f64(buf: &mut Packet, offset: usize, value: f64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
