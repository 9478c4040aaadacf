//! Encoding requests and matching their replies.

use log::{debug, trace, warn};
use rand_core::RngCore;
use snafu::ensure;

use crate::bus::Bus;
use crate::error::{Error, ErrorReplySnafu, InvalidLengthSnafu, ReplyTimeoutSnafu};
use crate::frame::Frame;
use crate::layout::{FrameLayout, HeaderLayout, MAX_DECLARED_LEN, TYPE_ERROR};
use crate::telegram::{CommandId, Request};
use crate::transport::{Clock, Transport};
use crate::types::BusVariant;

impl<T, C, R> Bus<T, C, R>
where
    T: Transport,
    C: Clock,
    R: RngCore,
{
    /// Send a request and, if it asks for one, wait for the matching reply.
    ///
    /// `tx` receives the encoded request, `rx` the reply. A reply matches
    /// when it is addressed to this node and carries the request's
    /// command-id. Up to 15 received frames are examined within 3 seconds.
    ///
    /// On PPS there is no telegram layer: `tx` is expected to hold a
    /// prepared frame and is sent as is, without waiting for anything.
    ///
    /// # Errors
    /// * [`Error::InvalidLength`] if the parameters don't fit a frame.
    /// * [`Error::BusBusy`] if the request couldn't be sent.
    /// * [`Error::ReplyTimeout`] if no matching reply arrived.
    /// * [`Error::ErrorReply`] if an LPB error telegram arrived and
    ///   [`truncated_error_replies`](crate::BusConfig::truncated_error_replies) is set.
    pub fn send<const N: usize, const M: usize>(
        &mut self,
        request: &Request<'_>,
        tx: &mut Frame<N>,
        rx: &mut Frame<M>,
    ) -> Result<(), Error> {
        let layout = self.config.layout();
        let header = match &layout.header {
            Some(header) => header,
            None => return self.send_frame(tx),
        };

        encode(layout, header, request, tx)?;
        self.send_frame(tx)?;
        if !request.expect_reply {
            return Ok(());
        }
        self.await_reply(header, request.command_id, rx)
    }

    fn await_reply<const M: usize>(
        &mut self,
        header: &HeaderLayout,
        command_id: CommandId,
        rx: &mut Frame<M>,
    ) -> Result<(), Error> {
        let started = self.clock.now_ms();
        let deadline = started + u64::from(self.timing.reply_timeout_ms);
        let expected = command_id.reply_bytes();
        let own = *self.config.own_address();
        let stop_on_error =
            self.config.truncated_error_replies && self.config.variant() == BusVariant::Lpb;

        let mut attempts = self.timing.reply_attempts;
        while attempts > 0 && self.clock.now_ms() < deadline {
            if let Err(err) = self.receive(rx) {
                trace!("No reply yet: {}", err);
                self.clock.delay_us(self.timing.reply_retry_us);
                continue;
            }
            attempts -= 1;

            if rx.get(header.dest_index) != Some(&own) {
                continue;
            }
            if stop_on_error && rx.get(header.type_index) == Some(&TYPE_ERROR) {
                warn!("Error telegram for {:08X}", command_id.0);
                return ErrorReplySnafu.fail();
            }
            let command = header.command_index..header.command_index + expected.len();
            if rx.get(command) == Some(&expected[..]) {
                debug!("Duration: {} ms", self.clock.now_ms() - started);
                return Ok(());
            }
        }
        warn!("Timeout waiting for answer to {:08X}", command_id.0);
        ReplyTimeoutSnafu.fail()
    }
}

/// Lay out type, command-id and parameters of `request` in `tx`.
/// Start marker, addresses and checksum are filled in when sending.
fn encode<const N: usize>(
    layout: &FrameLayout,
    header: &HeaderLayout,
    request: &Request<'_>,
    tx: &mut Frame<N>,
) -> Result<(), Error> {
    let declared =
        header.payload_index + request.params.len() + layout.checksum_len - layout.length_bias;
    ensure!(declared <= MAX_DECLARED_LEN, InvalidLengthSnafu { declared });

    tx.clear();
    tx.resize(layout.frame_len(declared))?;
    tx.set(layout.length_index, declared as u8)?;
    tx.set_slice(header.control_index, header.control)?;
    tx.set(header.type_index, request.msg_type)?;
    tx.set_slice(header.command_index, &request.command_id.request_bytes())?;
    tx.set_slice(header.payload_index, request.params)?;
    Ok(())
}
