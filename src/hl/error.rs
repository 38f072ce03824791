use core::fmt;
use core::fmt::{Display, Formatter};

use embedded_hal::i2c;

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::ll;

/// An error that can occur when building or executing a batch of operations
pub enum Error<I2C>
where
    I2C: i2c::ErrorType,
{
    /// Error occured while using the I2C bus
    I2c(ll::Error<I2C>),

    /// An address was outside its documented range
    Address(ll::AddressError),

    /// `execute` was called, but no bus was ever attached
    NoBus,

    /// More operations were queued than the pending queue can hold
    QueueFull,
}

impl<I2C> From<ll::Error<I2C>> for Error<I2C>
where
    I2C: i2c::ErrorType,
{
    fn from(error: ll::Error<I2C>) -> Self {
        Error::I2c(error)
    }
}

impl<I2C> From<ll::AddressError> for Error<I2C>
where
    I2C: i2c::ErrorType,
{
    fn from(error: ll::AddressError) -> Self {
        Error::Address(error)
    }
}

impl<I2C> Display for Error<I2C>
where
    I2C: i2c::ErrorType,
    I2C::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl<I2C> std::error::Error for Error<I2C>
where
    I2C: i2c::ErrorType,
    I2C::Error: fmt::Debug,
{
}

// We can't derive this implementation, as `Debug` is only implemented
// conditionally for `ll::Error`.
impl<I2C> fmt::Debug for Error<I2C>
where
    I2C: i2c::ErrorType,
    I2C::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::I2c(error) => write!(f, "I2c({:?})", error),
            Error::Address(error) => write!(f, "Address({:?})", error),
            Error::NoBus => write!(f, "NoBus"),
            Error::QueueFull => write!(f, "QueueFull"),
        }
    }
}

#[cfg(feature = "defmt")]

// We can't derive this implementation, as `Debug` is only implemented
// conditionally for `ll::Error`.
impl<I2C> Format for Error<I2C>
where
    I2C: i2c::ErrorType,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::I2c(error) => defmt::write!(f, "I2c({:?})", error),
            Error::Address(error) => defmt::write!(f, "Address({:?})", error),
            Error::NoBus => defmt::write!(f, "NoBus"),
            Error::QueueFull => defmt::write!(f, "QueueFull"),
        }
    }
}
