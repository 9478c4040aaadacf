//! Byte offsets and sizes of the three wire formats.
//!
//! Parser, checksum engines and sender all consult these descriptors
//! instead of spelling out offsets per variant.

/// Largest value the length field of a BSB or LPB frame may hold.
pub const MAX_DECLARED_LEN: usize = 32;

/// Largest frame any variant produces on the wire (an LPB frame declaring
/// [`MAX_DECLARED_LEN`] is one byte longer than its length field).
pub const MAX_FRAME_LEN: usize = MAX_DECLARED_LEN + 1;

/// PPS request byte sent by the controller to poll a room unit.
pub const PPS_REQUEST: u8 = 0x17;

/// Length field index used for a PPS frame following a [`PPS_REQUEST`] byte.
pub const PPS_LONG_LENGTH_INDEX: usize = 9;

/// Station address that makes this node the write-enabled PPS room unit.
pub const PPS_WRITE_ENABLED: u8 = 1;

/// Telegram type of an error reply.
pub const TYPE_ERROR: u8 = 0x08;

/// Where things live in a frame of one bus variant.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameLayout {
    /// Bytes that start a frame.
    pub sof: &'static [u8],
    /// The transport delivers inverted logic levels for this variant.
    pub inverted: bool,
    /// Offset of the length field. For PPS this is also the offset of the
    /// checksum byte, since PPS frames have a fixed size.
    pub length_index: usize,
    /// Difference between the total frame length and the length field.
    pub length_bias: usize,
    /// Number of checksum bytes at the end of the frame.
    pub checksum_len: usize,
    /// Several stations share the line, so a sender listens for a quiet
    /// line before transmitting.
    pub shared_line: bool,
    /// Frames have a fixed size and the length field index only marks their end.
    pub fixed_length: bool,
    /// Addressing and command fields, absent for PPS.
    pub header: Option<HeaderLayout>,
}

/// Offsets of the addressed telegram header used by BSB and LPB.
#[derive(Debug, PartialEq, Eq)]
pub struct HeaderLayout {
    /// Start-of-frame byte emitted when sending.
    pub sof: u8,
    pub source_index: usize,
    /// Bits set on the own address in the source field.
    pub source_flag: u8,
    pub dest_index: usize,
    pub control_index: usize,
    /// Fixed protocol control bytes written at `control_index`.
    pub control: &'static [u8],
    pub type_index: usize,
    /// Offset of the four command-id bytes.
    pub command_index: usize,
    pub payload_index: usize,
}

impl FrameLayout {
    pub const BSB: Self = Self {
        sof: &[0xDC, 0xDE],
        inverted: true,
        length_index: 3,
        length_bias: 0,
        checksum_len: 2,
        shared_line: true,
        fixed_length: false,
        header: Some(HeaderLayout {
            sof: 0xDC,
            source_index: 1,
            source_flag: 0x80,
            dest_index: 2,
            control_index: 4,
            control: &[],
            type_index: 4,
            command_index: 5,
            payload_index: 9,
        }),
    };

    pub const LPB: Self = Self {
        sof: &[0x78],
        inverted: true,
        length_index: 1,
        length_bias: 1,
        checksum_len: 2,
        shared_line: true,
        fixed_length: false,
        header: Some(HeaderLayout {
            sof: 0x78,
            source_index: 3,
            source_flag: 0,
            dest_index: 2,
            control_index: 4,
            control: &[0xC0, 0x02, 0x00, 0x14],
            type_index: 8,
            command_index: 9,
            payload_index: 13,
        }),
    };

    pub const PPS: Self = Self {
        sof: &[PPS_REQUEST, 0x1D, 0x1E],
        inverted: false,
        length_index: 8,
        length_bias: 0,
        checksum_len: 1,
        shared_line: false,
        fixed_length: true,
        header: None,
    };

    pub fn is_sof(&self, byte: u8) -> bool {
        self.sof.contains(&byte)
    }

    /// Total number of bytes on the wire for a frame with the given length field.
    pub const fn frame_len(&self, declared: usize) -> usize {
        declared + self.length_bias
    }

    /// Minimal number of bytes a frame needs before its length field can be read.
    pub const fn min_len(&self) -> usize {
        self.length_index + 1
    }

    /// Length field value for a telegram carrying `payload_len` parameter bytes.
    pub fn declared_len(&self, payload_len: usize) -> Option<usize> {
        let header = self.header.as_ref()?;
        Some(header.payload_index + payload_len + self.checksum_len - self.length_bias)
    }
}
