//! Frame capture: start-of-frame hunting, length tracking and validation.

use log::{debug, trace};
use rand_core::RngCore;
use snafu::ensure;

use crate::bus::Bus;
use crate::checksum;
use crate::error::{
    ChecksumMismatchSnafu, Error, InvalidLengthSnafu, LengthMismatchSnafu, NoFrameSnafu,
};
use crate::frame::Frame;
use crate::layout::{
    FrameLayout, MAX_DECLARED_LEN, PPS_LONG_LENGTH_INDEX, PPS_REQUEST, PPS_WRITE_ENABLED,
};
use crate::transport::{Clock, Transport};

impl<T, C, R> Bus<T, C, R>
where
    T: Transport,
    C: Clock,
    R: RngCore,
{
    /// Receive one complete, validated frame into `frame`.
    ///
    /// Bytes preceding a start-of-frame marker are dropped. Once a marker is
    /// seen the rest of the frame is collected until the length field is
    /// satisfied or the line stays quiet for a few hundred microseconds.
    /// `frame` never holds a partial frame on success; on error its content
    /// is unspecified.
    ///
    /// # Errors
    /// * [`Error::NoFrame`] if the transport ran dry before a marker.
    /// * [`Error::InvalidLength`] if the length field exceeds 32.
    /// * [`Error::LengthMismatch`] if fewer (or more) bytes than declared arrived.
    /// * [`Error::ChecksumMismatch`] if the trailer doesn't verify.
    /// * [`Error::BufferOverflow`] if the frame doesn't fit into `frame`.
    pub fn receive<const N: usize>(&mut self, frame: &mut Frame<N>) -> Result<(), Error> {
        frame.clear();
        let layout = self.config.layout();
        let sof = self.find_sof(layout)?;
        frame.push(sof)?;

        // The PPS long form only applies to this one frame.
        let mut length_index = layout.length_index;
        if layout.fixed_length && sof == PPS_REQUEST {
            if self.config.own_address() == PPS_WRITE_ENABLED {
                trace!("PPS request byte");
                return Ok(());
            }
            length_index = PPS_LONG_LENGTH_INDEX;
        }

        self.clock.delay_us(self.timing.settle_us);
        self.capture(layout, length_index, frame)?;
        self.check_frame(layout, length_index, frame)?;
        debug!("Received {:02X?}", frame.as_slice());
        Ok(())
    }

    fn find_sof(&mut self, layout: &FrameLayout) -> Result<u8, Error> {
        while self.transport.available() > 0 {
            match self.read_wire_byte() {
                Some(byte) if layout.is_sof(byte) => return Ok(byte),
                Some(byte) => trace!("Dropping {:#04x}", byte),
                None => break,
            }
        }
        NoFrameSnafu.fail()
    }

    fn capture<const N: usize>(
        &mut self,
        layout: &FrameLayout,
        length_index: usize,
        frame: &mut Frame<N>,
    ) -> Result<(), Error> {
        while self.transport.available() > 0 {
            let byte = match self.read_wire_byte() {
                Some(byte) => byte,
                None => break,
            };
            frame.push(byte)?;

            if frame.len() > length_index {
                if layout.fixed_length {
                    break;
                }
                let declared = usize::from(frame[length_index]);
                ensure!(declared <= MAX_DECLARED_LEN, InvalidLengthSnafu { declared });
                if frame.len() >= layout.frame_len(declared) {
                    break;
                }
            }

            if !self.wait_for_byte() {
                // quiet line, take what we have
                break;
            }
        }
        Ok(())
    }

    fn wait_for_byte(&mut self) -> bool {
        for _ in 0..self.timing.byte_polls {
            if self.transport.available() > 0 {
                return true;
            }
            self.clock.delay_us(self.timing.byte_poll_us);
        }
        self.transport.available() > 0
    }

    fn check_frame<const N: usize>(
        &self,
        layout: &FrameLayout,
        length_index: usize,
        frame: &Frame<N>,
    ) -> Result<(), Error> {
        let received = frame.len();
        if layout.fixed_length {
            let expected = length_index + 1;
            ensure!(received == expected, LengthMismatchSnafu { expected, received });
            // a long frame starts with the request byte, which isn't checksummed
            let telegram = &frame[length_index - layout.length_index..];
            ensure!(
                checksum::verify(self.config.variant(), telegram),
                ChecksumMismatchSnafu
            );
        } else {
            let expected = frame
                .get(length_index)
                .map_or(layout.min_len(), |declared| {
                    layout.frame_len(usize::from(*declared))
                });
            ensure!(received == expected, LengthMismatchSnafu { expected, received });
            ensure!(
                checksum::verify(self.config.variant(), frame),
                ChecksumMismatchSnafu
            );
        }
        Ok(())
    }
}
