//! Addressed telegrams carried in BSB and LPB frames.

use snafu::ensure;

use crate::checksum;
use crate::error::{ChecksumMismatchSnafu, Error, NoTelegramLayerSnafu};
use crate::nom_parser;
use crate::types::BusVariant;

/// 32-bit identifier of the value or operation a telegram refers to.
///
/// Requests put the two most significant bytes on the wire in swapped
/// order; replies from field devices carry the id in plain big-endian order.
///
/// ```
/// use bsb_proto::CommandId;
/// let id = CommandId(0x3D2D_0215);
/// assert_eq!(id.request_bytes(), [0x2D, 0x3D, 0x02, 0x15]);
/// assert_eq!(id.reply_bytes(), [0x3D, 0x2D, 0x02, 0x15]);
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
pub struct CommandId(pub u32);

impl CommandId {
    pub const fn request_bytes(self) -> [u8; 4] {
        let [a1, a2, a3, a4] = self.0.to_be_bytes();
        [a2, a1, a3, a4]
    }

    pub const fn reply_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub const fn from_request_bytes(bytes: [u8; 4]) -> Self {
        let [a2, a1, a3, a4] = bytes;
        Self(u32::from_be_bytes([a1, a2, a3, a4]))
    }

    pub const fn from_reply_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }
}

impl From<u32> for CommandId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A logical request to be encoded by [`Bus::send`](crate::Bus::send).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    /// Telegram type, e.g. `0x06` for a query.
    pub msg_type: u8,
    pub command_id: CommandId,
    /// Parameter bytes appended after the command-id.
    pub params: &'a [u8],
    /// Wait for a reply carrying the same command-id.
    pub expect_reply: bool,
}

impl<'a> Request<'a> {
    /// A request without parameters that waits for the reply.
    pub fn query(msg_type: u8, command_id: impl Into<CommandId>) -> Self {
        Self {
            msg_type,
            command_id: command_id.into(),
            params: &[],
            expect_reply: true,
        }
    }
}

/// Field view of a validated BSB or LPB frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Telegram<'a> {
    /// Sending station, without the BSB source flag.
    pub source: u8,
    pub dest: u8,
    pub msg_type: u8,
    /// Command-id bytes as they appear on the wire.
    pub command: [u8; 4],
    pub payload: &'a [u8],
}

impl<'a> Telegram<'a> {
    /// Decode a complete frame, checksum included.
    /// # Errors
    /// [`Error::NoTelegramLayer`] for PPS, [`Error::ChecksumMismatch`] or
    /// [`Error::InvalidTelegram`] if the bytes don't form a valid telegram.
    pub fn decode(variant: BusVariant, frame: &'a [u8]) -> Result<Self, Error> {
        let parsed = match variant {
            BusVariant::Bsb => nom_parser::bsb::telegram(frame),
            BusVariant::Lpb => nom_parser::lpb::telegram(frame),
            BusVariant::Pps => return NoTelegramLayerSnafu { variant }.fail(),
        };
        let (_, telegram) = parsed.map_err(|_| Error::InvalidTelegram)?;
        ensure!(checksum::verify(variant, frame), ChecksumMismatchSnafu);
        Ok(telegram)
    }

    /// The command-id, read in request byte order.
    pub const fn request_command_id(&self) -> CommandId {
        CommandId::from_request_bytes(self.command)
    }

    /// The command-id, read in reply byte order.
    pub const fn reply_command_id(&self) -> CommandId {
        CommandId::from_reply_bytes(self.command)
    }
}
