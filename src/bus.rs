//! See [`Bus`] for more details.

use rand_core::RngCore;

use crate::timing::Timing;
use crate::transport::{Clock, Transport};
use crate::types::{Address, BusConfig, BusVariant};

/// Protocol engine for one node on a BSB, LPB or PPS bus.
///
/// A `Bus` owns the line ([`Transport`]), the time source ([`Clock`]) and the
/// random generator used for collision backoff. All state lives in the
/// instance, so any number of buses can be driven side by side.
///
/// # Example
///
/// ```no_run
/// use bsb_proto::{Bus, BusConfig, BusVariant, Frame, Request, StdClock, Transport};
/// # struct Uart;
/// # impl Transport for Uart {
/// #     fn available(&mut self) -> usize { 0 }
/// #     fn read_byte(&mut self) -> Option<u8> { None }
/// #     fn write_byte(&mut self, _: u8) -> usize { 1 }
/// #     fn line_busy(&mut self) -> bool { false }
/// # }
/// # fn rng() -> impl rand_core::RngCore { rand::rngs::mock::StepRng::new(0, 1) }
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BusConfig::new(BusVariant::Bsb, 0x42, 0x00)?;
/// let mut bus = Bus::new(Uart, StdClock::new(), rng(), config);
///
/// let mut tx: Frame = Frame::new();
/// let mut rx: Frame = Frame::new();
/// bus.send(&Request::query(0x06, 0x3D2D_0215u32), &mut tx, &mut rx)?;
/// println!("reply: {:02X?}", rx.as_slice());
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Bus<T, C, R> {
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) rng: R,
    pub(crate) config: BusConfig,
    pub(crate) timing: Timing,
}

impl<T, C, R> Bus<T, C, R>
where
    T: Transport,
    C: Clock,
    R: RngCore,
{
    /// Create a new engine with default [`Timing`].
    pub fn new(transport: T, clock: C, rng: R, config: BusConfig) -> Self {
        Self::with_timing(transport, clock, rng, config, Timing::default())
    }

    pub fn with_timing(transport: T, clock: C, rng: R, config: BusConfig, timing: Timing) -> Self {
        Self {
            transport,
            clock,
            rng,
            config,
            timing,
        }
    }

    /// Select the bus variant and optionally new addresses; `None` leaves an
    /// address as it is. Returns the variant now in effect.
    pub fn configure(
        &mut self,
        variant: BusVariant,
        own_address: Option<Address>,
        dest_address: Option<Address>,
    ) -> BusVariant {
        let variant = self.config.reconfigure(variant, own_address, dest_address);
        log::debug!(
            "Bus {:?}, own address {:#04x}, destination {:#04x}",
            variant,
            *self.config.own_address(),
            *self.config.dest_address()
        );
        variant
    }

    pub fn variant(&self) -> BusVariant {
        self.config.variant()
    }

    pub fn own_address(&self) -> Address {
        self.config.own_address()
    }

    pub fn dest_address(&self) -> Address {
        self.config.dest_address()
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BusConfig {
        &mut self.config
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take the engine apart, returning transport, clock and random generator.
    pub fn into_parts(self) -> (T, C, R) {
        (self.transport, self.clock, self.rng)
    }

    /// Read one byte off the line, undoing the bus polarity.
    pub(crate) fn read_wire_byte(&mut self) -> Option<u8> {
        let byte = self.transport.read_byte()?;
        if self.config.layout().inverted {
            Some(!byte)
        } else {
            Some(byte)
        }
    }
}
