//! Driver for the field buses of heating controllers: BSB, LPB and PPS.
//!
//! The crate implements the link layer a node needs to take part in the
//! bus: recognising and validating frames on the shared line, sending frames
//! without trampling on other stations, and pairing requests with their
//! replies.
//!
//! All hardware access goes through the [`Transport`] and [`Clock`] traits,
//! so the same engine runs on a microcontroller or behind a USB adapter.
//! Every [`Bus`] instance carries its own configuration, there is no global
//! state.
//!
//! ```no_run
//! use bsb_proto::{Bus, BusConfig, BusVariant, Frame, StdClock, Transport};
//! # struct Uart;
//! # impl Transport for Uart {
//! #     fn available(&mut self) -> usize { 0 }
//! #     fn read_byte(&mut self) -> Option<u8> { None }
//! #     fn write_byte(&mut self, _: u8) -> usize { 1 }
//! #     fn line_busy(&mut self) -> bool { false }
//! # }
//! # use rand::SeedableRng;
//! let config = BusConfig::new(BusVariant::Lpb, 0x06, 0x00).unwrap();
//! let rng = rand::rngs::StdRng::from_entropy();
//! let mut bus = Bus::new(Uart, StdClock::new(), rng, config);
//!
//! let mut frame: Frame = Frame::new();
//! loop {
//!     if bus.receive(&mut frame).is_ok() {
//!         println!("{:02X?}", frame.as_slice());
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

mod bus;
pub mod checksum;
mod command;
mod error;
mod frame;
pub mod layout;
mod nom_parser;
mod receive;
mod telegram;
mod timing;
mod transmit;
pub mod transport;
pub mod types;

pub use crate::bus::Bus;
pub use crate::error::{Error, Result};
pub use crate::frame::Frame;
pub use crate::layout::{FrameLayout, HeaderLayout};
pub use crate::telegram::{CommandId, Request, Telegram};
pub use crate::timing::Timing;
#[cfg(feature = "std")]
pub use crate::transport::StdClock;
pub use crate::transport::{Clock, Transport};
pub use crate::types::{addr, Address, BusConfig, BusVariant, IntoAddress};
