//! Seams to the hardware: the half-duplex line and the time source.
//!
//! The protocol engine never touches a UART, a pin or a timer directly.
//! Implement [`Transport`] and [`Clock`] for the target, and hand them to
//! [`Bus::new`](crate::Bus::new).

/// Byte-level access to the shared two-wire bus.
///
/// Bytes are passed as they appear on the line; the engine takes care of
/// the inverted logic of BSB and LPB.
pub trait Transport {
    /// Number of received bytes waiting to be read.
    fn available(&mut self) -> usize;

    /// Take one received byte, or `None` if nothing is buffered. Must not block.
    fn read_byte(&mut self) -> Option<u8>;

    /// Transmit one byte and return how many bytes the line accepted.
    /// Anything but 1 is treated as a collision with another station.
    fn write_byte(&mut self, byte: u8) -> usize;

    /// Sample the receive line right now; `true` while another station drives it.
    fn line_busy(&mut self) -> bool;

    /// Run `f` with exclusive access to the line, keeping the receive path
    /// from interleaving with it. On bare metal this masks interrupts.
    fn critical_section<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
        Self: Sized,
    {
        f(self)
    }
}

/// Monotonic time source with microsecond delays.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed epoch.
    fn now_ms(&self) -> u64;

    /// Wait for (at least) `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

#[cfg(feature = "std")]
pub use self::std_clock::StdClock;

#[cfg(feature = "std")]
mod std_clock {
    use std::time::{Duration, Instant};

    /// [`Clock`](super::Clock) backed by `std::time::Instant` and thread sleeps.
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        epoch: Instant,
    }

    impl StdClock {
        pub fn new() -> Self {
            Self {
                epoch: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::Clock for StdClock {
        fn now_ms(&self) -> u64 {
            self.epoch.elapsed().as_millis() as u64
        }

        fn delay_us(&mut self, us: u32) {
            std::thread::sleep(Duration::from_micros(us.into()));
        }
    }

}
