//! In-memory register file standing in for the IPS2200 on the bus

use std::collections::HashMap;

use embedded_hal::i2c::{ErrorKind, I2c, NoAcknowledgeSource, Operation};

use ips2200::ll;

/// A fake bus backed by a register file
///
/// Stores the byte pair for each physical address, low byte first, exactly as
/// the device would return them. Reads of unseeded addresses fail like a
/// device that never acknowledges. Transaction counters and the `fail_reads`
/// knob let tests observe and disturb the traffic.
pub struct FakeBus {
    registers: HashMap<u8, [u8; 2]>,
    pointer: Option<u8>,
    pub reads: usize,
    pub writes: usize,
    pub fail_reads: bool,
}

impl FakeBus {
    pub fn new() -> Self {
        FakeBus {
            registers: HashMap::new(),
            pointer: None,
            reads: 0,
            writes: 0,
            fail_reads: false,
        }
    }

    /// Seed a register with a value, stored in its wire encoding
    pub fn seed(&mut self, physical: u8, value: u16) {
        self.registers
            .insert(physical, ll::split_word(ll::to_wire(value)));
    }

    /// The value currently stored at an address, decoded
    pub fn value(&self, physical: u8) -> Option<u16> {
        self.registers
            .get(&physical)
            .map(|bytes| ll::from_wire(ll::join_bytes(bytes[1], bytes[0])))
    }
}

impl Default for FakeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_hal::i2c::ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, ips2200::I2C_ADDRESS, "unexpected device address");

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let bytes: &[u8] = bytes;
                    match *bytes {
                        [physical] => self.pointer = Some(physical),
                        [physical, low, high] => {
                            self.writes += 1;
                            self.registers.insert(physical, [low, high]);
                        }
                        _ => panic!("unexpected write payload: {:?}", bytes),
                    }
                }
                Operation::Read(buffer) => {
                    if self.fail_reads {
                        return Err(ErrorKind::Other);
                    }
                    self.reads += 1;

                    let physical = self
                        .pointer
                        .take()
                        .expect("read without a preceding register pointer");
                    let bytes = self
                        .registers
                        .get(&physical)
                        .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))?;
                    buffer.copy_from_slice(bytes);
                }
            }
        }

        Ok(())
    }
}
