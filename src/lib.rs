// 16 8-bit data registers named V0 to VF
// I -> address register (12 bits)
//
// Stack of up to 16 return addresses
//
// Display res: 64 width, 32 height
//
// Opcodes are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier
//
// No timers, keypad or sound: 0xE and 0xF instructions are rejected as unknown.

pub mod decode;
pub mod display;
pub mod emulator;
pub mod memory;
pub mod registers;

pub use emulator::{Emulator, EmulatorError};
