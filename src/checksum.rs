//! The three checksum engines.
//!
//! These must stay bit-identical to what field devices compute.

use crc::{Crc, CRC_16_XMODEM};

use crate::types::BusVariant;

const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CCITT XMODEM CRC over a BSB frame.
///
/// Over a frame without its trailer this yields the trailer (big-endian);
/// over a complete frame it yields zero.
pub fn bsb_crc(data: &[u8]) -> u16 {
    XMODEM.checksum(data)
}

/// Weighted sum over an LPB frame without its two trailer bytes.
///
/// With `L` the value of the length field (`body.len() + 1`):
/// `(257 - L) * 256 + (L - 2) + sum(body)`, all modulo 2^16.
pub fn lpb_checksum(body: &[u8]) -> u16 {
    let len = (body.len() as u16).wrapping_add(1);
    let seed = 257u16
        .wrapping_sub(len)
        .wrapping_mul(256)
        .wrapping_add(len.wrapping_sub(2));
    body.iter()
        .fold(seed, |acc, byte| acc.wrapping_add(u16::from(*byte)))
}

/// Two's complement of the byte sum over a PPS frame without its checksum byte.
pub fn pps_checksum(body: &[u8]) -> u8 {
    let sum = body.iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    0u8.wrapping_sub(sum)
}

/// Compute the checksum of `frame` and store it in its trailing byte(s).
///
/// `frame` must be exactly one complete frame including room for the trailer.
pub fn seal(variant: BusVariant, frame: &mut [u8]) {
    let trailer = frame.len() - variant.layout().checksum_len;
    match variant {
        BusVariant::Bsb => {
            let crc = bsb_crc(&frame[..trailer]);
            frame[trailer..].copy_from_slice(&crc.to_be_bytes());
        }
        BusVariant::Lpb => {
            let crc = lpb_checksum(&frame[..trailer]);
            frame[trailer..].copy_from_slice(&crc.to_be_bytes());
        }
        BusVariant::Pps => frame[trailer] = pps_checksum(&frame[..trailer]),
    }
}

/// Check the trailer of a complete frame.
pub fn verify(variant: BusVariant, frame: &[u8]) -> bool {
    let checksum_len = variant.layout().checksum_len;
    if frame.len() <= checksum_len {
        return false;
    }
    let trailer = frame.len() - checksum_len;
    match variant {
        BusVariant::Bsb => bsb_crc(frame) == 0,
        BusVariant::Lpb => {
            let stored = u16::from_be_bytes([frame[trailer], frame[trailer + 1]]);
            lpb_checksum(&frame[..trailer]).wrapping_sub(stored) == 0
        }
        BusVariant::Pps => pps_checksum(&frame[..trailer]) == frame[trailer],
    }
}
