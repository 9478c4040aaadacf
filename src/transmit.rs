//! Sending with listen-before-talk, random backoff and collision retry.

use log::{debug, trace, warn};
use rand_core::RngCore;
use snafu::{ensure, OptionExt};

use crate::bus::Bus;
use crate::checksum;
use crate::error::{BusBusySnafu, Error, FrameTooShortSnafu, InvalidLengthSnafu};
use crate::frame::Frame;
use crate::layout::MAX_DECLARED_LEN;
use crate::transport::{Clock, Transport};

impl<T, C, R> Bus<T, C, R>
where
    T: Transport,
    C: Clock,
    R: RngCore,
{
    /// Fill in the header, checksum it and put `frame` on the line.
    ///
    /// For BSB and LPB the length field must already be set; start marker,
    /// addresses and checksum are written here and the frame is resized to
    /// the declared length. A PPS frame needs its first eight bytes, the
    /// checksum byte is appended.
    ///
    /// Before sending, the line has to stay quiet for a random 26..85 ms.
    /// A collision while sending restarts the whole frame. Gives up with
    /// [`Error::BusBusy`] after one second without success.
    pub fn send_frame<const N: usize>(&mut self, frame: &mut Frame<N>) -> Result<(), Error> {
        let len = self.seal(frame)?;
        let deadline = self.clock.now_ms() + u64::from(self.timing.acquire_timeout_ms);
        loop {
            self.acquire_line(deadline)?;
            if self.transmit(&frame[..len]) {
                debug!("Sent {:02X?}", &frame[..len]);
                return Ok(());
            }
            debug!("Collision, retrying");
        }
    }

    /// Complete `frame` for sending and return its length on the wire.
    fn seal<const N: usize>(&self, frame: &mut Frame<N>) -> Result<usize, Error> {
        let variant = self.config.variant();
        let layout = variant.layout();
        let len = match &layout.header {
            Some(header) => {
                let declared = frame
                    .get(layout.length_index)
                    .map(|len| usize::from(*len))
                    .context(FrameTooShortSnafu {
                        len: frame.len(),
                        required: layout.min_len(),
                    })?;
                let min = header.payload_index + layout.checksum_len - layout.length_bias;
                ensure!(
                    (min..=MAX_DECLARED_LEN).contains(&declared),
                    InvalidLengthSnafu { declared }
                );
                let len = layout.frame_len(declared);
                frame.resize(len)?;
                frame.set(0, header.sof)?;
                frame.set(
                    header.source_index,
                    *self.config.own_address() | header.source_flag,
                )?;
                frame.set(header.dest_index, *self.config.dest_address())?;
                len
            }
            None => {
                ensure!(
                    frame.len() >= layout.length_index,
                    FrameTooShortSnafu {
                        len: frame.len(),
                        required: layout.length_index,
                    }
                );
                let len = layout.min_len();
                frame.resize(len)?;
                len
            }
        };
        checksum::seal(variant, frame.as_mut_slice());
        Ok(len)
    }

    /// Wait for the line to stay quiet for a random backoff period.
    fn acquire_line(&mut self, deadline: u64) -> Result<(), Error> {
        'backoff: loop {
            let backoff = self.backoff_ms();
            if self.clock.now_ms() > deadline {
                warn!("Bus busy, giving up");
                return BusBusySnafu.fail();
            }
            if !self.config.layout().shared_line {
                return Ok(());
            }

            let quiet_until = self.clock.now_ms() + u64::from(backoff);
            while self.clock.now_ms() < quiet_until {
                self.clock.delay_us(self.timing.line_sample_us);
                if self.transport.line_busy() {
                    trace!("Line busy, backing off");
                    continue 'backoff;
                }
            }
            return Ok(());
        }
    }

    fn backoff_ms(&mut self) -> u32 {
        let min = self.timing.backoff_min_ms;
        let span = self
            .timing
            .backoff_max_ms
            .saturating_sub(min)
            .saturating_add(1);
        min.saturating_add(self.rng.next_u32() % span)
    }

    /// Write `bytes` one at a time, each inside a critical section.
    /// Returns false as soon as the line doesn't take a byte.
    fn transmit(&mut self, bytes: &[u8]) -> bool {
        let inverted = self.config.layout().inverted;
        for &byte in bytes {
            let wire = if inverted { !byte } else { byte };
            if self.transport.critical_section(|line| line.write_byte(wire)) != 1 {
                return false;
            }
        }
        true
    }
}
