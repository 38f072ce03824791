//! Low-level interface to the IPS2200
//!
//! This module implements a register-level interface to the IPS2200. Users of
//! this library should typically not need to use this. Please consider using
//! the [high-level interface] instead.
//!
//! **NOTE**: The word codec and the register write methods accept values that
//! may have a larger number of bits than the target actually consists of. If
//! you pass a value that is too large, it will be silently truncated.
//!
//! [high-level interface]: ../hl/index.html

use core::fmt;

use embedded_hal::i2c;

/// System Configuration 1
pub const SYS_CFG1: u8 = 0x00;

/// System Configuration 2
pub const SYS_CFG2: u8 = 0x01;

/// System Configuration 3
pub const SYS_CFG3: u8 = 0x02;

/// Receiver 1/2 gain
pub const RX_GAIN: u8 = 0x03;

/// Register address space selector
///
/// The IPS2200 exposes its register file twice: once in non-volatile memory
/// and once in the volatile SRB/SFR shadow. The physical bus address encodes
/// the selection in bit 5.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressSpace {
    /// Non-volatile memory
    Nvm,
    /// Volatile SRB/SFR shadow registers
    Srb,
}

/// Translates a documented register index into the physical bus address
///
/// Addresses on the bus carry more than the 5-bit register index:
///
/// - bits 0-4: the register index
/// - bit 5: set for SRB/SFR access, clear for NVM access
/// - bits 6-7: always set
///
/// Fails if `logical` uses more than 5 bits.
pub fn physical_address(logical: u8, space: AddressSpace) -> Result<u8, AddressError> {
    if logical > 0b11111 {
        return Err(AddressError::LogicalOutOfRange(logical));
    }

    match space {
        AddressSpace::Nvm => Ok(logical | 0b1100_0000),
        AddressSpace::Srb => Ok(logical | 0b1110_0000),
    }
}

/// Recovers the documented register index from a physical bus address
///
/// The XOR with `0b1100_0000` clears the two fixed marker bits and nothing
/// else. The address-space flag in bit 5 rides through, so an SRB/SFR address
/// comes back as `0x20 | index`; mask bit 5 off to get the bare index.
///
/// Fails if `physical` is larger than a single byte.
pub fn logical_address(physical: u16) -> Result<u8, AddressError> {
    if physical > 0xFF {
        return Err(AddressError::PhysicalOutOfRange(physical));
    }

    Ok(physical as u8 ^ 0b1100_0000)
}

/// Encodes a register value into its 16-bit wire representation
///
/// The five low bits of every wire word are padding and always read as ones;
/// they carry no data. Values wider than 11 bits are silently truncated.
pub fn to_wire(value: u16) -> u16 {
    (value << 5) | 0b11111
}

/// Decodes a 16-bit wire word into the register value it carries
pub fn from_wire(word: u16) -> u16 {
    word >> 5
}

/// Splits a wire word into the byte pair sent over the bus, low byte first
pub fn split_word(word: u16) -> [u8; 2] {
    [(word & 0xFF) as u8, (word >> 8) as u8]
}

/// Joins two bus bytes back into a wire word
///
/// The bus fills transaction buffers low byte first, so a buffer read back
/// from the device is joined as `join_bytes(buffer[1], buffer[0])`.
pub fn join_bytes(high: u8, low: u8) -> u16 {
    (high as u16) << 8 | low as u16
}

/// Entry point to the IPS2200 driver's low-level API
///
/// Please consider using [hl::Ips2200] instead.
///
/// [hl::Ips2200]: ../hl/struct.Ips2200.html
pub struct Ips2200<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> Ips2200<I2C> {
    /// Create a new instance of `Ips2200`
    ///
    /// Requires the I2C peripheral the IPS2200 is connected to and the
    /// device's bus address.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Ips2200 { i2c, address }
    }

    /// The device address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Allow access to the I2C bus
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Consume the driver and release the I2C bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Ips2200<I2C>
where
    I2C: i2c::I2c,
{
    /// Read the register at the given physical address
    ///
    /// Issues a pointer write followed by a two-byte read, then unpacks the
    /// wire word into the register value.
    pub fn read_register(&mut self, physical: u8) -> Result<u16, Error<I2C>> {
        let mut buffer = [0; 2];
        self.i2c
            .write_read(self.address, &[physical], &mut buffer)
            .map_err(Error::WriteRead)?;

        Ok(from_wire(join_bytes(buffer[1], buffer[0])))
    }

    /// Write the register at the given physical address
    ///
    /// Packs the value into a wire word and sends it behind the register
    /// pointer, low byte first.
    pub fn write_register(&mut self, physical: u8, value: u16) -> Result<(), Error<I2C>> {
        let [low, high] = split_word(to_wire(value));
        self.i2c
            .write(self.address, &[physical, low, high])
            .map_err(Error::Write)
    }
}

/// An address that does not fit its documented range
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressError {
    /// A register index that uses more than 5 bits
    LogicalOutOfRange(u8),
    /// A physical address that is larger than a single byte
    PhysicalOutOfRange(u16),
}

/// An I2C error that can occur when communicating with the IPS2200
pub enum Error<I2C>
where
    I2C: i2c::ErrorType,
{
    /// I2C error occured during a write transaction
    Write(I2C::Error),

    /// I2C error occured during a write-then-read transaction
    WriteRead(I2C::Error),
}

// We can't derive this implementation, as the compiler will complain that the
// associated error type doesn't implement `Debug`.
impl<I2C> fmt::Debug for Error<I2C>
where
    I2C: i2c::ErrorType,
    I2C::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Write(error) => write!(f, "Write({:?})", error),
            Error::WriteRead(error) => write!(f, "WriteRead({:?})", error),
        }
    }
}

#[cfg(feature = "defmt")]
impl<I2C> defmt::Format for Error<I2C>
where
    I2C: i2c::ErrorType,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Write(_) => defmt::write!(f, "Write()"),
            Error::WriteRead(_) => defmt::write!(f, "WriteRead()"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn physical_address_srb_sets_marker_and_space_bits() {
        for logical in 0..=0b11111 {
            let physical = physical_address(logical, AddressSpace::Srb).unwrap();
            assert_eq!(physical & 0b1110_0000, 0b1110_0000);
            assert_eq!(physical & 0b0001_1111, logical);
        }
    }

    #[test]
    fn physical_address_nvm_clears_space_bit() {
        for logical in 0..=0b11111 {
            let physical = physical_address(logical, AddressSpace::Nvm).unwrap();
            assert_eq!(physical & 0b1110_0000, 0b1100_0000);
            assert_eq!(physical & 0b0001_1111, logical);
        }
    }

    #[test]
    fn physical_address_rejects_wide_index() {
        assert_eq!(
            physical_address(0b10_0000, AddressSpace::Srb),
            Err(AddressError::LogicalOutOfRange(0b10_0000))
        );
        assert_eq!(
            physical_address(0b10_0000, AddressSpace::Nvm),
            Err(AddressError::LogicalOutOfRange(0b10_0000))
        );
    }

    #[test]
    fn logical_address_known_values() {
        assert_eq!(logical_address(0xE0), Ok(0x20));
        assert_eq!(logical_address(0xC0), Ok(0x00));
        assert_eq!(logical_address(0xE3), Ok(0x23));
        assert_eq!(logical_address(0xC3), Ok(0x03));
    }

    #[test]
    fn logical_address_rejects_wide_address() {
        assert_eq!(
            logical_address(0xFF1),
            Err(AddressError::PhysicalOutOfRange(0xFF1))
        );
    }

    #[test]
    fn wire_word_padding() {
        assert_eq!(to_wire(0b111), 0xFF);
        assert_eq!(from_wire(0b1111_1111), 0b111);
    }

    #[test]
    fn split_and_join_round_trip() {
        assert_eq!(split_word(0xDEAD), [0xAD, 0xDE]);
        assert_eq!(join_bytes(0xDE, 0xAD), 0xDEAD);

        for word in 0..=u16::MAX {
            let [low, high] = split_word(word);
            assert_eq!(join_bytes(high, low), word);
        }
    }

    #[test]
    fn read_register_unpacks_wire_word() {
        let i2c = I2cMock::new(&[I2cTransaction::write_read(
            0x18,
            vec![0xE0],
            vec![0x7F, 0x64],
        )]);

        let mut ips2200 = Ips2200::new(i2c, 0x18);
        assert_eq!(ips2200.read_register(0xE0).unwrap(), 0x323);

        ips2200.release().done();
    }

    #[test]
    fn write_register_packs_wire_word() {
        let i2c = I2cMock::new(&[I2cTransaction::write(0x18, vec![0xE0, 0x7F, 0x64])]);

        let mut ips2200 = Ips2200::new(i2c, 0x18);
        ips2200.write_register(0xE0, 0x323).unwrap();

        ips2200.release().done();
    }
}
