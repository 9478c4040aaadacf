//! This module defines the bus variant selector, range-checked station
//! addresses and the per-instance bus configuration.

use snafu::{ensure, OptionExt};

use core::convert::{TryFrom, TryInto};
use core::ops::Deref;

use crate::error::{Error, InvalidAddressSnafu, InvalidVariantSnafu};
use crate::layout::FrameLayout;

const fn invalid_address() -> InvalidAddressSnafu {
    InvalidAddressSnafu
}

/// One of the three supported heating-system field buses.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(u8)]
pub enum BusVariant {
    /// Boiler system bus, used by room units and service tools.
    Bsb = 0,
    /// Local process bus, connecting controllers to each other.
    Lpb = 1,
    /// Point-to-point interface of older controllers.
    Pps = 2,
}

impl BusVariant {
    /// Numeric identifier of the variant, 0 (BSB), 1 (LPB) or 2 (PPS).
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Wire format description for this variant.
    pub const fn layout(self) -> &'static FrameLayout {
        match self {
            Self::Bsb => &FrameLayout::BSB,
            Self::Lpb => &FrameLayout::LPB,
            Self::Pps => &FrameLayout::PPS,
        }
    }
}

impl TryFrom<u8> for BusVariant {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::Bsb),
            1 => Ok(Self::Lpb),
            2 => Ok(Self::Pps),
            _ => InvalidVariantSnafu { id }.fail(),
        }
    }
}

/// Address is a station identifier in \[0x00, 0xFE\].
///
/// `0xFF` is reserved: on reconfiguration it means "leave the address
/// unchanged", so `Address::new(0xFF).ok()` yields that `None`.
///
/// ## Example
/// ```
/// use bsb_proto::Address;
/// let addr = Address::new(0x42).unwrap();
/// assert_eq!(*addr, 0x42);
/// assert!(Address::new(0xFF).is_err());
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct Address(u8);

/// Raw value standing for "keep the current address".
pub const ADDRESS_UNCHANGED: u8 = 0xFF;

/// Create a new [`Address`], panics if it is the reserved sentinel.
pub const fn addr(a: u8) -> Address {
    if a != ADDRESS_UNCHANGED {
        return Address(a);
    }
    panic!("Invalid address.")
}

impl Address {
    /// Create a new address, rejecting the reserved value `0xFF`.
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if `address` doesn't fit a byte or is `0xFF`.
    pub fn new(address: impl TryInto<u8>) -> Result<Self, Error> {
        let address = address.try_into().ok().with_context(invalid_address)?;
        ensure!(address != ADDRESS_UNCHANGED, invalid_address());
        Ok(Self(address))
    }
}

impl Deref for Address {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<u8> for Address {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

/// Trait to convert `T: TryInto<u8>` into an [`Address`].
pub trait IntoAddress {
    /// Convert self to an Address.
    /// # Errors
    /// Returns `Error::InvalidAddress` if self isn't a valid address.
    fn into_address(self) -> Result<Address, Error>;
}

impl IntoAddress for Address {
    fn into_address(self) -> Result<Address, Error> {
        Ok(self)
    }
}

impl<T> IntoAddress for T
where
    T: TryInto<u8>,
{
    fn into_address(self) -> Result<Address, Error> {
        Address::new(self)
    }
}

/// Per-node bus settings, owned by one [`Bus`](crate::Bus) instance.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct BusConfig {
    variant: BusVariant,
    own_address: Address,
    dest_address: Address,
    /// Stop waiting as soon as an LPB error telegram addressed to us arrives,
    /// even though it carries no command-id. Needed for LPB controllers that
    /// answer failed requests with truncated error telegrams.
    pub truncated_error_replies: bool,
}

impl BusConfig {
    /// Create a configuration for the given variant and station addresses.
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if either address is invalid.
    pub fn new(
        variant: BusVariant,
        own_address: impl IntoAddress,
        dest_address: impl IntoAddress,
    ) -> Result<Self, Error> {
        Ok(Self {
            variant,
            own_address: own_address.into_address()?,
            dest_address: dest_address.into_address()?,
            truncated_error_replies: false,
        })
    }

    /// Switch variant and optionally addresses; `None` keeps the current one.
    /// Returns the variant now in effect.
    pub fn reconfigure(
        &mut self,
        variant: BusVariant,
        own_address: Option<Address>,
        dest_address: Option<Address>,
    ) -> BusVariant {
        self.variant = variant;
        if let Some(own) = own_address {
            self.own_address = own;
        }
        if let Some(dest) = dest_address {
            self.dest_address = dest;
        }
        self.variant
    }

    pub const fn variant(&self) -> BusVariant {
        self.variant
    }

    pub const fn own_address(&self) -> Address {
        self.own_address
    }

    pub const fn dest_address(&self) -> Address {
        self.dest_address
    }

    /// Offset of the length field, derived from the variant.
    pub const fn length_field_index(&self) -> usize {
        self.variant.layout().length_index
    }

    pub const fn layout(&self) -> &'static FrameLayout {
        self.variant.layout()
    }
}
