use std::{fs, io, path::Path};

use log::{debug, warn};
use thiserror::Error;

pub type TypeAddr = u16; // in reality u12

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const STACK_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("address 0x{0:04X} is outside of memory")]
    OutOfBounds(usize),
    #[error("stack overflow: more than 16 nested calls")]
    StackOverflow,
    #[error("stack underflow: return without a matching call")]
    StackUnderflow,
    #[error("program image is empty")]
    EmptyProgram,
    #[error("could not read program '{path}'")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl MemoryError {
    /// True for the failures that can only happen while loading a program image.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::EmptyProgram | Self::Io { .. })
    }
}

pub struct Memory {
    // 4k bytes, programs live from 0x200 up
    bytes: [u8; MEMORY_SIZE],
    pub stack: Stack,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: [0; MEMORY_SIZE],
            stack: Stack::new(),
        }
    }

    fn next(addr: usize) -> Result<usize, MemoryError> {
        addr.checked_add(1).ok_or(MemoryError::OutOfBounds(addr))
    }

    fn check(addr: usize) -> Result<usize, MemoryError> {
        if addr < MEMORY_SIZE {
            Ok(addr)
        } else {
            Err(MemoryError::OutOfBounds(addr))
        }
    }

    pub fn set(&mut self, addr: usize, val: u8) -> Result<(), MemoryError> {
        self.bytes[Self::check(addr)?] = val;
        Ok(())
    }

    pub fn get(&self, addr: usize) -> Result<u8, MemoryError> {
        Ok(self.bytes[Self::check(addr)?])
    }

    // high byte first
    pub fn get_word(&self, addr: usize) -> Result<u16, MemoryError> {
        let (l, r) = (self.get(addr)?, self.get(Self::next(addr)?)?);
        Ok(u16::from_be_bytes([l, r]))
    }

    pub fn set_word(&mut self, addr: usize, val: u16) -> Result<(), MemoryError> {
        let low = Self::check(Self::next(addr)?)?;
        let [l, r] = val.to_be_bytes();
        self.set(addr, l)?;
        self.set(low, r)
    }

    /// Copies a program image to `PROGRAM_START`, returning how many bytes were placed.
    /// Anything that does not fit below the top of memory is dropped.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<usize, MemoryError> {
        if bytes.is_empty() {
            return Err(MemoryError::EmptyProgram);
        }
        let start_index = PROGRAM_START as usize;
        let len = bytes.len().min(MEMORY_SIZE - start_index);
        if len < bytes.len() {
            warn!(
                "program is {} bytes, truncated to the {} bytes available",
                bytes.len(),
                len
            );
        }
        self.bytes[start_index..start_index + len].copy_from_slice(&bytes[..len]);
        debug!("loaded {} bytes at 0x{:03X}", len, start_index);
        Ok(len)
    }

    pub fn load_rom_by_file(&mut self, path: impl AsRef<Path>) -> Result<usize, MemoryError> {
        let path = path.as_ref();
        debug!("opening '{}'", path.display());
        let program = fs::read(path).map_err(|source| MemoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.load_rom(&program)
    }
}

pub struct Stack {
    addresses: Vec<TypeAddr>,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: Vec::with_capacity(STACK_SIZE),
        }
    }

    pub fn push(&mut self, addr: TypeAddr) -> Result<(), MemoryError> {
        if self.addresses.len() >= STACK_SIZE {
            return Err(MemoryError::StackOverflow);
        }
        self.addresses.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypeAddr, MemoryError> {
        self.addresses.pop().ok_or(MemoryError::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.addresses.len()
    }
}
