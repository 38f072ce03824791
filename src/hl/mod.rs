//! High-level interface to the IPS2200
//!
//! The entry point to this API is the [Ips2200] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements a deferred operation builder on top of the
//! [register-level interface]: reads, writes and field sets are queued by
//! fluent calls and run against the bus in a single pass when
//! [`Ips2200::execute`] is called. A per-session cache of register values
//! avoids redundant bus reads within and across batches.
//!
//! [register-level interface]: ../ll/index.html

use embedded_hal::i2c;

pub use error::*;

use cache::RegisterCache;

use crate::{
    fields::{self, Field, OutputMode, SpiDataOrder, SpiPhase},
    ll::{self, AddressSpace},
    I2C_ADDRESS,
};

mod cache;
mod error;

/// Capacity of the pending-operation queue
pub const MAX_OPERATIONS: usize = 16;

/// Results of one executed batch: one entry per operation, in enqueue order
///
/// Reads contribute `Some(value)`; writes and field sets contribute `None`.
pub type BatchResult = heapless::Vec<Option<u16>, MAX_OPERATIONS>;

/// One deferred bus operation
///
/// The address-space mode is not part of the record; every operation reads it
/// from the builder when the batch runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Operation {
    Read { register: u8 },
    Write { register: u8, value: u16 },
    SetField { field: Field, bits: u16 },
}

/// Entry point to the IPS2200 driver API
///
/// One `Ips2200` instance represents one session against the device: it is
/// bound to a device address, optionally owns the bus, and accumulates
/// deferred operations that [`execute`] runs in enqueue order.
///
/// [`execute`]: Self::execute
pub struct Ips2200<I2C> {
    ll: Option<ll::Ips2200<I2C>>,
    address: u8,
    space: AddressSpace,
    cache: RegisterCache,
    operations: heapless::Vec<Operation, MAX_OPERATIONS>,
    overflowed: bool,
}

impl<I2C> Ips2200<I2C> {
    /// Create a new instance of `Ips2200` at the default device address
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, I2C_ADDRESS)
    }

    /// Create a new instance of `Ips2200` at a non-default device address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Ips2200 {
            ll: Some(ll::Ips2200::new(i2c, address)),
            address,
            space: AddressSpace::Srb,
            cache: RegisterCache::new(),
            operations: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Create a builder with no bus attached yet
    ///
    /// Operations can be queued immediately; [`attach`] must be called before
    /// [`execute`], which otherwise fails with [`Error::NoBus`].
    ///
    /// [`attach`]: Self::attach
    /// [`execute`]: Self::execute
    pub fn detached(address: u8) -> Self {
        Ips2200 {
            ll: None,
            address,
            space: AddressSpace::Srb,
            cache: RegisterCache::new(),
            operations: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Attach a bus, returning the previously attached one, if any
    pub fn attach(&mut self, i2c: I2C) -> Option<I2C> {
        self.ll
            .replace(ll::Ips2200::new(i2c, self.address))
            .map(ll::Ips2200::release)
    }

    /// Consume the builder and release the bus, if one was attached
    pub fn release(self) -> Option<I2C> {
        self.ll.map(ll::Ips2200::release)
    }

    /// Provides direct access to the register-level API
    ///
    /// Be aware that by using the register-level API, you can invalidate
    /// assumptions the high-level API makes about the device, in particular
    /// the freshness of cached register values.
    pub fn ll(&mut self) -> Option<&mut ll::Ips2200<I2C>> {
        self.ll.as_mut()
    }

    /// Number of operations currently queued
    pub fn pending_operations(&self) -> usize {
        self.operations.len()
    }

    /// Address operations to the non-volatile register space
    ///
    /// The mode is consulted when the batch runs, not when operations are
    /// queued, so calling this also retargets operations that are already
    /// pending.
    pub fn use_nvm(&mut self) -> &mut Self {
        self.space = AddressSpace::Nvm;
        self
    }

    /// Address operations to the SRB/SFR shadow space
    ///
    /// This is the default. See [`use_nvm`] for the interaction with
    /// already-queued operations.
    ///
    /// [`use_nvm`]: Self::use_nvm
    pub fn use_srb(&mut self) -> &mut Self {
        self.space = AddressSpace::Srb;
        self
    }

    /// Queue a read of the given register
    ///
    /// The result appears as `Some(value)` in the batch results.
    pub fn read_register(&mut self, register: u8) -> &mut Self {
        self.push(Operation::Read { register })
    }

    /// Queue a full write of the given register
    pub fn write_register(&mut self, register: u8, value: u16) -> &mut Self {
        self.push(Operation::Write { register, value })
    }

    /// Queue a write of exactly the bits of `field`, leaving the rest alone
    ///
    /// Bits of `bits` beyond the field's width are silently discarded.
    pub fn set_field(&mut self, field: Field, bits: u16) -> &mut Self {
        self.push(Operation::SetField { field, bits })
    }

    /// Queue an output mode change
    pub fn set_output_mode(&mut self, mode: OutputMode) -> &mut Self {
        self.set_field(fields::OUTPUT_MODE, mode as u16)
    }

    /// Queue an SPI clock phase change
    pub fn set_spi_phase(&mut self, phase: SpiPhase) -> &mut Self {
        self.set_field(fields::SPI_PHASE, phase as u16)
    }

    /// Queue an SPI bit order change
    pub fn set_spi_data_order(&mut self, order: SpiDataOrder) -> &mut Self {
        self.set_field(fields::SPI_DATA_ORDER, order as u16)
    }

    /// Queue a receiver 1 gain change
    ///
    /// The gain field is 5 bits wide; higher bits are silently discarded.
    pub fn set_rx1_gain(&mut self, gain: u8) -> &mut Self {
        self.set_field(fields::RX1_GAIN, gain as u16)
    }

    /// Queue a receiver 2 gain change
    ///
    /// The gain field is 5 bits wide; higher bits are silently discarded.
    pub fn set_rx2_gain(&mut self, gain: u8) -> &mut Self {
        self.set_field(fields::RX2_GAIN, gain as u16)
    }

    /// Discard all pending operations without executing them
    pub fn clear_operations(&mut self) -> &mut Self {
        self.operations.clear();
        self.overflowed = false;
        self
    }

    fn push(&mut self, operation: Operation) -> &mut Self {
        if self.operations.push(operation).is_err() {
            self.overflowed = true;
        }
        self
    }
}

impl<I2C> Ips2200<I2C>
where
    I2C: i2c::I2c,
{
    /// Run every pending operation against the bus, in enqueue order
    ///
    /// The queue is cleared when this returns, whether or not the batch ran
    /// to completion. Returns one entry per operation: `Some(value)` for
    /// reads, `None` for writes and field sets.
    ///
    /// Fails with [`Error::NoBus`] if no bus was supplied at construction or
    /// via [`attach`], and with [`Error::QueueFull`] if more than
    /// [`MAX_OPERATIONS`] operations were queued since the last execution;
    /// both are detected before any bus traffic. A transport error aborts the
    /// remaining operations but leaves the side effects of completed ones in
    /// place, so a failed batch must be treated as partially applied.
    ///
    /// [`attach`]: Self::attach
    pub fn execute(&mut self) -> Result<BatchResult, Error<I2C>> {
        let operations = core::mem::take(&mut self.operations);

        if core::mem::take(&mut self.overflowed) {
            return Err(Error::QueueFull);
        }
        let ll = self.ll.as_mut().ok_or(Error::NoBus)?;

        let mut results = BatchResult::new();
        for operation in &operations {
            let result = match *operation {
                Operation::Read { register } => {
                    let physical = ll::physical_address(register, self.space)?;
                    Some(read_cached(ll, &mut self.cache, physical)?)
                }
                Operation::Write { register, value } => {
                    let physical = ll::physical_address(register, self.space)?;
                    self.cache.invalidate(physical);
                    ll.write_register(physical, value)?;
                    None
                }
                Operation::SetField { field, bits } => {
                    let physical = ll::physical_address(field.register(), self.space)?;
                    let current = read_cached(ll, &mut self.cache, physical)?;
                    let value =
                        splice_field(current, bits, field.first_bit(), field.last_bit());
                    self.cache.invalidate(physical);
                    ll.write_register(physical, value)?;
                    None
                }
            };

            // Same capacity as the queue, so the push cannot fail.
            let _ = results.push(result);
        }

        Ok(results)
    }
}

/// Obtain a register's current value through the cache
///
/// Reads the bus only on a cache miss and stores what it read.
fn read_cached<I2C>(
    ll: &mut ll::Ips2200<I2C>,
    cache: &mut RegisterCache,
    physical: u8,
) -> Result<u16, ll::Error<I2C>>
where
    I2C: i2c::I2c,
{
    match cache.get(physical) {
        Some(value) => Ok(value),
        None => {
            let value = ll.read_register(physical)?;
            cache.put(physical, value);
            Ok(value)
        }
    }
}

/// Overwrite the bits `first_bit..=last_bit` of `value` with `bits`
///
/// Bits are consumed from `bits` lowest-first and written ascending; every
/// bit in the range is replaced and no bit outside it is touched. Bits of
/// `bits` beyond the range's width are discarded.
fn splice_field(value: u16, bits: u16, first_bit: u8, last_bit: u8) -> u16 {
    let mut value = value;
    let mut bits = bits;

    for i in first_bit..=last_bit {
        if bits & 1 == 1 {
            value |= 1 << i;
        } else {
            value &= !(1 << i);
        }
        bits >>= 1;
    }

    value
}
