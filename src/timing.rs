/// Delays and deadlines of the bus engine.
///
/// The defaults match what existing BSB/LPB/PPS stations expect; override
/// individual fields with struct update syntax:
///
/// ```
/// use bsb_proto::Timing;
/// let timing = Timing {
///     reply_timeout_ms: 500,
///     ..Timing::default()
/// };
/// assert_eq!(timing.reply_attempts, 15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Shortest random wait for a quiet line before sending.
    pub backoff_min_ms: u32,
    /// Longest random wait for a quiet line before sending.
    pub backoff_max_ms: u32,
    /// Give up sending when the line hasn't been free for this long.
    pub acquire_timeout_ms: u32,
    /// Interval between line samples while backing off.
    pub line_sample_us: u32,
    /// Pause after a start-of-frame byte, letting the rest of the frame arrive.
    pub settle_us: u32,
    /// Number of polls for the next byte before a frame is considered complete.
    pub byte_polls: u32,
    /// Interval between those polls.
    pub byte_poll_us: u32,
    /// Deadline for a matching reply.
    pub reply_timeout_ms: u32,
    /// Number of received frames examined before giving up on a reply.
    pub reply_attempts: u32,
    /// Pause after a receive attempt that yielded no frame.
    pub reply_retry_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            backoff_min_ms: 26,
            backoff_max_ms: 85,
            acquire_timeout_ms: 1000,
            line_sample_us: 15,
            settle_us: 1000,
            byte_polls: 30,
            byte_poll_us: 15,
            reply_timeout_ms: 3000,
            reply_attempts: 15,
            reply_retry_us: 205,
        }
    }
}
