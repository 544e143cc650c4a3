use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::{
    decode::OpCodes,
    display::FrameBuffer,
    memory::{Memory, MemoryError, TypeAddr},
    registers::{IndexRegister, ProgramCounter, Registers},
};

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("unknown instruction 0x{opcode:04X} at PC=0x{pc:04X}")]
    UnknownInstruction { opcode: u16, pc: TypeAddr },
    #[error("processor is halted after a fatal error")]
    Halted,
}

/// One virtual machine instance: memory, registers and the pixel grid it draws to.
pub struct Emulator {
    pub fb: FrameBuffer,
    pub regs: Registers,
    pub mem: Memory,
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    halted: bool,
    rng: StdRng,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Same as [`Emulator::new`] but `RND` yields a reproducible sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(),
            pc: ProgramCounter::default(),
            index: IndexRegister::default(),
            halted: false,
            rng,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn fetch_decode(&self) -> Result<OpCodes, EmulatorError> {
        let pc = self.pc.0;
        let ins = self.mem.get_word(pc as usize)?;
        OpCodes::decode_raw(ins).ok_or(EmulatorError::UnknownInstruction { opcode: ins, pc })
    }

    /// Runs one fetch-decode-execute step. Any error halts the processor for good.
    pub fn execute_next(&mut self) -> Result<(), EmulatorError> {
        if self.halted {
            return Err(EmulatorError::Halted);
        }
        let result = self
            .fetch_decode()
            .and_then(|operation| self.execute_ins(operation));
        if result.is_err() {
            self.halted = true;
        }
        result
    }

    fn execute_ins(&mut self, ins: OpCodes) -> Result<(), EmulatorError> {
        trace!("0x{:03X}: {}", self.pc.0, ins);
        match ins {
            OpCodes::ClearScreen => {
                self.fb.clear_buffer();
                self.pc.advance(false)?;
            }
            OpCodes::PopSubroutine => {
                let addr = self.mem.stack.pop()?;
                self.pc.set_addr(addr as usize)?;
            }
            OpCodes::Jump(addr) => {
                self.pc.set_addr(addr as usize)?;
            }
            OpCodes::PushSubroutine(addr) => {
                // return to the instruction after the call
                self.mem.stack.push(self.pc.0 + 2)?;
                self.pc.set_addr(addr as usize)?;
            }
            OpCodes::SkipEqualConstant(vx, nn) => {
                self.pc.advance(self.regs.get(vx) == nn)?;
            }
            OpCodes::SkipNotEqualConstant(vx, nn) => {
                self.pc.advance(self.regs.get(vx) != nn)?;
            }
            OpCodes::SkipEqualRegister(vx, vy) => {
                self.pc.advance(self.regs.get(vx) == self.regs.get(vy))?;
            }
            OpCodes::SkipNotEqualRegister(vx, vy) => {
                self.pc.advance(self.regs.get(vx) != self.regs.get(vy))?;
            }
            OpCodes::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
                self.pc.advance(false)?;
            }
            OpCodes::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
                self.pc.advance(false)?;
            }
            OpCodes::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
                self.pc.advance(false)?;
            }
            OpCodes::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) | self.regs.get(vx));
                self.pc.advance(false)?;
            }
            OpCodes::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) & self.regs.get(vx));
                self.pc.advance(false)?;
            }
            OpCodes::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) ^ self.regs.get(vx));
                self.pc.advance(false)?;
            }
            OpCodes::SetIndexRegister(addr) => {
                self.index.set_addr(addr);
                self.pc.advance(false)?;
            }
            OpCodes::JumpWithOffset(addr) => {
                self.pc
                    .set_addr(addr as usize + self.regs.get(0) as usize)?;
            }
            OpCodes::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, nn & ransuu);
                self.pc.advance(false)?;
            }
            OpCodes::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                let collision = self
                    .fb
                    .paint(&self.mem, x, y, self.index.0 as usize, height)?;
                self.regs.set_register(0xF, collision as u8);
                self.pc.advance(false)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PROGRAM_START;

    fn emu_with(program: &[u16]) -> Emulator {
        let mut emu = Emulator::with_seed(7);
        let bytes: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
        emu.mem.load_rom(&bytes).unwrap();
        emu
    }

    fn step(emu: &mut Emulator, n: usize) {
        for _ in 0..n {
            emu.execute_next().unwrap();
        }
    }

    #[test]
    fn skip_equal_constant() {
        let mut emu = emu_with(&[0x6005, 0x3005, 0x0000, 0x3006]);
        step(&mut emu, 1);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, PROGRAM_START + 6);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, PROGRAM_START + 8);
    }

    #[test]
    fn skip_not_equal_constant() {
        let mut emu = emu_with(&[0x4105, 0x0000, 0x4100]);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, PROGRAM_START + 4);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, PROGRAM_START + 6);
    }

    #[test]
    fn register_skips_compare_register_values() {
        // V1 and V3 both hold 5, which differs from the register number 3
        let mut emu = emu_with(&[0x6105, 0x6305, 0x5130, 0x0000, 0x9130, 0x6207, 0x9120]);
        step(&mut emu, 3);
        assert_eq!(emu.pc.0, PROGRAM_START + 8);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, PROGRAM_START + 10);
        step(&mut emu, 2);
        assert_eq!(emu.pc.0, PROGRAM_START + 16);
    }

    #[test]
    fn add_wraps_without_carry() {
        let mut emu = emu_with(&[0x64FA, 0x740A]);
        step(&mut emu, 2);
        assert_eq!(emu.regs.get(4), 4);
        assert_eq!(emu.regs.get(0xF), 0);
    }

    #[test]
    fn alu_ops() {
        let mut emu = emu_with(&[
            0x60F0, 0x610F, 0x8200, 0x8211, // V2 = V0 | V1
            0x6366, 0x8302, // V3 = 0x66 & 0xF0
            0x643C, 0x8403, // V4 = 0x3C ^ 0xF0
            0x6000,
        ]);
        step(&mut emu, 9);
        assert_eq!(emu.regs.get(2), 0xFF);
        assert_eq!(emu.regs.get(3), 0x60);
        assert_eq!(emu.regs.get(4), 0xCC);
        // no fallthrough into the 9XY0 handler after 8XY_
        assert_eq!(emu.pc.0, PROGRAM_START + 18);
    }

    #[test]
    fn jump_skips_following_words() {
        let mut emu = emu_with(&[0x1204, 0xFFFF, 0x6A01]);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, 0x204);
        step(&mut emu, 1);
        assert_eq!(emu.regs.get(0xA), 1);
    }

    #[test]
    fn call_and_return() {
        // 0x200: CALL 0x206; 0x202: LD V1, 1; 0x204: JP 0x204; 0x206: LD V2, 2; 0x208: RET
        let mut emu = emu_with(&[0x2206, 0x6101, 0x1204, 0x6202, 0x00EE]);
        step(&mut emu, 1);
        assert_eq!(emu.pc.0, 0x206);
        assert_eq!(emu.mem.stack.depth(), 1);
        step(&mut emu, 2);
        assert_eq!(emu.pc.0, 0x202);
        assert_eq!(emu.mem.stack.depth(), 0);
        step(&mut emu, 1);
        assert_eq!((emu.regs.get(1), emu.regs.get(2)), (1, 2));
    }

    #[test]
    fn return_on_empty_stack_halts() {
        let mut emu = emu_with(&[0x00EE]);
        assert!(matches!(
            emu.execute_next(),
            Err(EmulatorError::Memory(MemoryError::StackUnderflow))
        ));
        assert!(emu.is_halted());
    }

    #[test]
    fn runaway_recursion_overflows() {
        let mut emu = emu_with(&[0x2200]);
        step(&mut emu, 16);
        assert!(matches!(
            emu.execute_next(),
            Err(EmulatorError::Memory(MemoryError::StackOverflow))
        ));
    }

    #[test]
    fn index_and_offset_jump() {
        let mut emu = emu_with(&[0xA3C0, 0x6004, 0xB300]);
        step(&mut emu, 3);
        assert_eq!(emu.index.0, 0x3C0);
        assert_eq!(emu.pc.0, 0x304);
    }

    #[test]
    fn offset_jump_past_memory_fails() {
        let mut emu = emu_with(&[0x60FF, 0xBFFF]);
        step(&mut emu, 1);
        assert!(matches!(
            emu.execute_next(),
            Err(EmulatorError::Memory(MemoryError::OutOfBounds(0x10FE)))
        ));
    }

    #[test]
    fn random_is_masked() {
        let mut emu = emu_with(&[0xC50F, 0xC600]);
        step(&mut emu, 2);
        assert_eq!(emu.regs.get(5) & 0xF0, 0);
        assert_eq!(emu.regs.get(6), 0);
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let mut a = emu_with(&[0xC1FF, 0xC2FF, 0xC3FF]);
        let mut b = emu_with(&[0xC1FF, 0xC2FF, 0xC3FF]);
        step(&mut a, 3);
        step(&mut b, 3);
        for reg in 1..=3 {
            assert_eq!(a.regs.get(reg), b.regs.get(reg));
        }
    }

    #[test]
    fn draw_sets_collision_flag() {
        // I = 0x20A (the sprite byte 0x80 stored after the code), draw twice, clear, draw again
        let mut emu = emu_with(&[0xA20A, 0xD011, 0xD011, 0x00E0, 0xD011, 0x8000]);
        step(&mut emu, 2);
        assert!(emu.fb.pixel(0, 0));
        assert_eq!(emu.regs.get(0xF), 0);
        step(&mut emu, 1);
        assert_eq!(emu.regs.get(0xF), 1);
        step(&mut emu, 1);
        assert!(!emu.fb.pixel(0, 0));
        step(&mut emu, 1);
        assert_eq!(emu.regs.get(0xF), 0);
        assert_eq!(emu.pc.0, 0x20A);
    }

    #[test]
    fn draw_uses_register_coordinates() {
        let mut emu = emu_with(&[0xA20A, 0x6A05, 0x6B07, 0xDAB1, 0x1208, 0xFF00]);
        step(&mut emu, 4);
        assert!((5..13).all(|x| emu.fb.pixel(x, 7)));
    }

    #[test]
    fn unknown_instruction_reports_opcode_and_pc() {
        let mut emu = emu_with(&[0x6000, 0xF0A0]);
        step(&mut emu, 1);
        let err = emu.execute_next().unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::UnknownInstruction {
                opcode: 0xF0A0,
                pc: 0x202
            }
        ));
        let msg = err.to_string();
        assert!(msg.contains("0xF0A0"), "{msg}");
        assert!(msg.contains("0x0202"), "{msg}");
        assert!(emu.is_halted());
        assert!(matches!(emu.execute_next(), Err(EmulatorError::Halted)));
    }

    #[test]
    fn unsupported_alu_op_is_unknown() {
        let mut emu = emu_with(&[0x8124]);
        assert!(matches!(
            emu.execute_next(),
            Err(EmulatorError::UnknownInstruction { opcode: 0x8124, .. })
        ));
    }

    #[test]
    fn instances_are_independent() {
        let mut a = emu_with(&[0x6142]);
        let b = emu_with(&[0x6142]);
        step(&mut a, 1);
        assert_eq!(a.regs.get(1), 0x42);
        assert_eq!(b.regs.get(1), 0);
        assert_eq!(b.pc.0, PROGRAM_START);
    }
}
