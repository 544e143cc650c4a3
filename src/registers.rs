use crate::memory::{MemoryError, TypeAddr, MEMORY_SIZE, PROGRAM_START};

#[derive(Debug, Default)]
pub struct Registers {
    registers: [u8; 16],
}

impl Registers {
    pub fn new() -> Self {
        Self { registers: [0; 16] }
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[(reg_num & 0xF) as usize] = value;
    }

    // wraps without touching VF
    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let reg = &mut self.registers[(reg_num & 0xF) as usize];
        *reg = reg.wrapping_add(value);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[(reg_num & 0xF) as usize]
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl Default for ProgramCounter {
    fn default() -> Self {
        Self(PROGRAM_START)
    }
}

impl ProgramCounter {
    /// Moves to the next instruction, or over it when `skip` holds.
    pub fn advance(&mut self, skip: bool) -> Result<(), MemoryError> {
        let step = if skip { 4 } else { 2 };
        self.set_addr(self.0 as usize + step)
    }

    pub fn set_addr(&mut self, addr: usize) -> Result<(), MemoryError> {
        if addr >= MEMORY_SIZE {
            return Err(MemoryError::OutOfBounds(addr));
        }
        self.0 = addr as TypeAddr;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}
