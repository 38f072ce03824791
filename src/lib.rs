//! Driver crate for the IPS2200 inductive position sensor
//!
//! The recommended way to use this driver is the [high-level interface]. If
//! you require a higher degree of flexibility, you can use the
//! [register-level interface] instead.
//!
//! This driver is built on top of [`embedded-hal`], which means it is portable
//! and can be used on any platform that implements the `embedded-hal` API.
//!
//! [high-level interface]: hl/index.html
//! [register-level interface]: ll/index.html
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod fields;
pub mod hl;
pub mod ll;

pub use crate::{
    fields::{Field, OutputMode, SpiDataOrder, SpiPhase},
    hl::{BatchResult, Error, Ips2200, MAX_OPERATIONS},
    ll::AddressSpace,
};

/// IPS2200 I2C device address
pub const I2C_ADDRESS: u8 = 0x18;
