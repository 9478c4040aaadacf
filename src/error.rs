//! Error type shared by every bus operation.

use snafu::Snafu;

use crate::layout::MAX_DECLARED_LEN;
use crate::types::BusVariant;

/// Everything that can make a bus operation fail.
///
/// Collisions are not listed: they are retried internally and only show up
/// as [`Error::BusBusy`] once the acquisition deadline has passed as well.
#[derive(Debug, Snafu, PartialEq, Eq, Clone, Copy)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The transport ran dry before a start-of-frame byte was seen.
    #[snafu(display("No frame received"))]
    NoFrame,
    /// The length field of a received or outgoing frame is out of range.
    #[snafu(display("Declared frame length {} is outside 1..={}", declared, MAX_DECLARED_LEN))]
    InvalidLength { declared: usize },
    /// The number of captured bytes doesn't match the length field.
    #[snafu(display("Expected {} bytes, received {}", expected, received))]
    LengthMismatch { expected: usize, received: usize },
    /// The frame checksum doesn't verify.
    #[snafu(display("Checksum mismatch"))]
    ChecksumMismatch,
    /// A write would go past the end of the frame buffer.
    #[snafu(display("Frame buffer capacity of {} bytes exceeded", capacity))]
    BufferOverflow { capacity: usize },
    /// A caller-built frame is too short to be sealed and sent.
    #[snafu(display("Frame has {} bytes, at least {} are required", len, required))]
    FrameTooShort { len: usize, required: usize },
    /// The bus never went quiet before the acquisition deadline.
    #[snafu(display("Timed out waiting for a free bus"))]
    BusBusy,
    /// No matching reply arrived within the reply budget.
    #[snafu(display("Timed out waiting for a reply"))]
    ReplyTimeout,
    /// The peer answered with an error telegram.
    #[snafu(display("Error telegram received"))]
    ErrorReply,
    /// The value isn't a valid station address.
    #[snafu(display("Invalid address"))]
    InvalidAddress,
    /// The value doesn't name a bus variant.
    #[snafu(display("Invalid bus variant {}", id))]
    InvalidVariant { id: u8 },
    /// A validated frame doesn't decode into a telegram.
    #[snafu(display("Malformed telegram"))]
    InvalidTelegram,
    /// The variant has no address/command-id telegram layer.
    #[snafu(display("{:?} frames carry no telegram header", variant))]
    NoTelegramLayer { variant: BusVariant },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
