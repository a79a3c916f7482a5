//! # machine
//!
//! The complete CHIP-8 state record: memory, register file, call stack,
//! timers, keypad latch and framebuffer. It is owned by whoever drives it;
//! nothing in here is global and nothing runs unless the driver calls in:
//!
//!  - `step()` runs exactly one fetch/decode/execute cycle
//!  - `tick_timers()` counts both timers down (conventionally at 60Hz)
//!  - `set_key()` updates the keypad latch
//!  - `get_pixel()`, `is_dirty()` and `clear_dirty()` are for the renderer
//!
//! `step()` never fails. Unknown opcodes are no-ops; out-of-range memory and
//! stack accesses follow the wrapping rules in `memory` and `stack`.

use crate::error::RomLoadError;
use crate::framebuffer::Framebuffer;
use crate::instruction::{AluOp, Instruction};
use crate::keypad::Keypad;
use crate::memory::{Chip8Memory, MemoryMap};
use crate::registers::{Registers, VF};
use crate::rng::RandomByte;
use crate::stack::CallStack;
use crate::timer::Timer;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct Machine<R = StdRng> {
    memory: Chip8Memory,
    registers: Registers,
    stack: CallStack,
    delay_timer: Timer,
    sound_timer: Timer,
    keypad: Keypad,
    framebuffer: Framebuffer,
    rng: R,
}

impl Machine<StdRng> {
    /// fresh machine with an entropy-seeded random source
    pub fn new() -> Self {
        Machine::with_rng(StdRng::from_entropy())
    }

    /// fresh machine whose `Cxkk` sequence is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Machine::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Machine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomByte> Machine<R> {
    pub fn with_rng(rng: R) -> Self {
        Machine {
            memory: Chip8Memory::new(),
            registers: Registers::new(),
            stack: CallStack::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            keypad: Keypad::new(),
            framebuffer: Framebuffer::new(),
            rng,
        }
    }

    /// reset everything except the random source back to power-on state
    pub fn initialize(&mut self) {
        self.memory = Chip8Memory::new();
        self.registers = Registers::new();
        self.stack = CallStack::new();
        self.delay_timer = Timer::new();
        self.sound_timer = Timer::new();
        self.keypad = Keypad::new();
        self.framebuffer = Framebuffer::new();
    }

    /// copy a raw program image to 0x200
    pub fn load(&mut self, program: &[u8]) -> Result<(), RomLoadError> {
        self.memory.load_program(program)
    }

    /// fetch, decode and execute one instruction
    pub fn step(&mut self) {
        let pc = self.registers.pc;
        let opcode = self.memory.get_word(pc);
        self.registers.pc = pc.wrapping_add(2);
        let instruction = Instruction::decode(opcode);
        trace!("{:03x}: {:04x}  {}", pc, opcode, instruction);
        self.execute(instruction);
    }

    /// execute an already-decoded instruction; pc must already point past it
    pub fn execute(&mut self, instruction: Instruction) {
        let r = &mut self.registers;
        match instruction {
            Instruction::Clear => self.framebuffer.clear(),
            Instruction::Return => r.pc = self.stack.pop(),
            Instruction::Jump(nnn) => r.pc = nnn,
            Instruction::Call(nnn) => {
                self.stack.push(r.pc);
                r.pc = nnn;
            }
            Instruction::SkipEqByte { x, kk } => {
                if r.v[x as usize] == kk {
                    r.skip();
                }
            }
            Instruction::SkipNeByte { x, kk } => {
                if r.v[x as usize] != kk {
                    r.skip();
                }
            }
            Instruction::SkipEqReg { x, y } => {
                if r.v[x as usize] == r.v[y as usize] {
                    r.skip();
                }
            }
            Instruction::SkipNeReg { x, y } => {
                if r.v[x as usize] != r.v[y as usize] {
                    r.skip();
                }
            }
            Instruction::LoadByte { x, kk } => r.v[x as usize] = kk,
            Instruction::AddByte { x, kk } => {
                r.v[x as usize] = r.v[x as usize].wrapping_add(kk);
            }
            Instruction::Alu { op, x, y } => self.alu(op, x as usize, y as usize),
            Instruction::LoadIndex(nnn) => r.i = nnn,
            Instruction::JumpOffset(nnn) => {
                r.pc = (nnn + r.v[0] as u16) & 0x0fff;
            }
            Instruction::Random { x, kk } => {
                r.v[x as usize] = self.rng.random_byte() & kk;
            }
            Instruction::Draw { x, y, n } => self.draw(x as usize, y as usize, n),
            Instruction::SkipKeyHeld { x } => {
                if self.keypad.is_held(r.v[x as usize]) {
                    r.skip();
                }
            }
            Instruction::SkipKeyNotHeld { x } => {
                if !self.keypad.is_held(r.v[x as usize]) {
                    r.skip();
                }
            }
            Instruction::LoadDelay { x } => r.v[x as usize] = self.delay_timer.get(),
            Instruction::WaitKey { x } => match self.keypad.first_held() {
                Some(key) => r.v[x as usize] = key,
                // go round again until something is held
                None => r.pc = r.pc.wrapping_sub(2),
            },
            Instruction::SetDelay { x } => self.delay_timer.set(r.v[x as usize]),
            Instruction::SetSound { x } => self.sound_timer.set(r.v[x as usize]),
            Instruction::AddIndex { x } => r.i = r.i.wrapping_add(r.v[x as usize] as u16),
            Instruction::LoadGlyph { x } => r.i = Chip8Memory::glyph_addr(r.v[x as usize]),
            Instruction::StoreBcd { x } => {
                let value = r.v[x as usize];
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.memory.write(&digits, r.i);
            }
            Instruction::StoreRegs { x } => {
                let count = x as usize + 1;
                self.memory.write(&r.v[..count], r.i);
            }
            Instruction::LoadRegs { x } => {
                for n in 0..=x as usize {
                    r.v[n] = self.memory.read_byte(r.i.wrapping_add(n as u16));
                }
            }
            Instruction::Unknown(opcode) => debug!("ignoring unknown opcode {:04x}", opcode),
        }
    }

    /// 8xy_: the flag is written before the result, so the result wins when
    /// x is VF, and later operand reads see the new flag
    fn alu(&mut self, op: AluOp, x: usize, y: usize) {
        let v = &mut self.registers.v;
        match op {
            AluOp::Copy => v[x] = v[y],
            AluOp::Or => v[x] |= v[y],
            AluOp::And => v[x] &= v[y],
            AluOp::Xor => v[x] ^= v[y],
            AluOp::Add => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                v[VF] = carry as u8;
                v[x] = sum;
            }
            AluOp::Sub => {
                v[VF] = (v[x] >= v[y]) as u8;
                v[x] = v[x].wrapping_sub(v[y]);
            }
            AluOp::ShiftRight => {
                v[VF] = v[x] & 0x01;
                v[x] >>= 1;
            }
            AluOp::SubReverse => {
                v[VF] = (v[y] >= v[x]) as u8;
                v[x] = v[y].wrapping_sub(v[x]);
            }
            AluOp::ShiftLeft => {
                v[VF] = (v[x] & 0x80) >> 7;
                v[x] <<= 1;
            }
        }
    }

    /// Dxyn: sprite rows are read from I onwards
    fn draw(&mut self, x: usize, y: usize, n: u8) {
        let i = self.registers.i;
        let sprite: Vec<u8> = (0..n as u16)
            .map(|row| self.memory.read_byte(i.wrapping_add(row)))
            .collect();
        let collision = self
            .framebuffer
            .draw_sprite(self.registers.v[x], self.registers.v[y], &sprite);
        self.registers.set_flag(collision);
    }

    /// count both timers down by one
    pub fn tick_timers(&mut self) {
        self.delay_timer.tick();
        self.sound_timer.tick();
    }

    /// out-of-range keys are ignored
    pub fn set_key(&mut self, index: usize, held: bool) {
        self.keypad.set_key(index, held);
    }

    /// off-screen coordinates read as unset
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer.get_pixel(x, y)
    }

    /// has the framebuffer changed since the renderer last cleared this?
    pub fn is_dirty(&self) -> bool {
        self.framebuffer.is_dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.framebuffer.clear_dirty();
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// should the buzzer be sounding?
    pub fn sound_active(&self) -> bool {
        self.sound_timer.is_running()
    }

    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    pub fn i(&self) -> u16 {
        self.registers.i
    }

    /// general purpose register; only the low nibble of `x` is used
    pub fn v(&self, x: u8) -> u8 {
        self.registers.v[(x & 0x0f) as usize]
    }

    pub fn sp(&self) -> u8 {
        self.stack.sp()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.get()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.get()
    }

    pub fn read_memory(&self, addr: u16) -> u8 {
        self.memory.read_byte(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    /// machine with a fixed random byte and `program` loaded at 0x200
    fn machine(program: &[u16]) -> Machine<StepRng> {
        let mut m = Machine::with_rng(StepRng::new(0xa5, 0));
        let bytes: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        m.load(&bytes).unwrap();
        m
    }

    fn run(m: &mut Machine<StepRng>, steps: usize) {
        for _ in 0..steps {
            m.step();
        }
    }

    #[test]
    fn test_initial_state() {
        let m = Machine::new();
        assert_eq!(m.pc(), 0x200);
        assert_eq!(m.i(), 0);
        assert_eq!(m.sp(), 0);
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
        assert!(!m.is_dirty());
        assert_eq!(m.read_memory(0x000), 0xf0);
    }

    #[test]
    fn test_load_byte() {
        let mut m = machine(&[0x6a05]);
        m.step();
        assert_eq!(m.v(0xa), 0x05);
        assert_eq!(m.pc(), 0x202);
    }

    #[test]
    fn test_load_index() {
        let mut m = machine(&[0xa2f0]);
        m.step();
        assert_eq!(m.i(), 0x2f0);
    }

    #[test]
    fn test_add_byte_wraps_without_flag() {
        let mut m = machine(&[0x60ff, 0x6f07, 0x7002]);
        run(&mut m, 3);
        assert_eq!(m.v(0), 0x01);
        assert_eq!(m.v(0xf), 0x07);
    }

    #[test]
    fn test_jump() {
        let mut m = machine(&[0x1300]);
        m.step();
        assert_eq!(m.pc(), 0x300);
    }

    #[test]
    fn test_jump_offset() {
        let mut m = machine(&[0x6010, 0xb300]);
        run(&mut m, 2);
        assert_eq!(m.pc(), 0x310);
    }

    #[test]
    fn test_call_and_return() {
        // 0x200 CALL 0x206; 0x202 LD V1, 1; 0x204 JP 0x204
        // 0x206 LD V0, 5; 0x208 RET
        let mut m = machine(&[0x2206, 0x6101, 0x1204, 0x6005, 0x00ee]);
        m.step();
        assert_eq!(m.pc(), 0x206);
        assert_eq!(m.sp(), 1);
        run(&mut m, 2);
        assert_eq!(m.pc(), 0x202);
        assert_eq!(m.sp(), 0);
        m.step();
        assert_eq!((m.v(0), m.v(1)), (5, 1));
    }

    #[test]
    fn test_skips() {
        // (program, steps, expected pc)
        let cases: [(&[u16], usize, u16); 8] = [
            (&[0x6007, 0x3007], 2, 0x206),
            (&[0x6007, 0x3008], 2, 0x204),
            (&[0x6007, 0x4008], 2, 0x206),
            (&[0x6007, 0x4007], 2, 0x204),
            (&[0x6007, 0x6107, 0x5010], 3, 0x208),
            (&[0x6007, 0x6108, 0x5010], 3, 0x206),
            (&[0x6007, 0x6108, 0x9010], 3, 0x208),
            (&[0x6007, 0x6107, 0x9010], 3, 0x206),
        ];
        for (program, steps, pc) in cases {
            let mut m = machine(program);
            run(&mut m, steps);
            assert_eq!(m.pc(), pc, "program {:04x?}", program);
        }
    }

    #[test]
    fn test_logic_ops() {
        let mut m = machine(&[0x613c, 0x8211, 0x8312, 0x8413, 0x8510]);
        m.registers.v[2] = 0xf0;
        m.registers.v[3] = 0xf0;
        m.registers.v[4] = 0xf0;
        m.registers.v[0xf] = 0x42;
        run(&mut m, 5);
        assert_eq!(m.v(2), 0xfc);
        assert_eq!(m.v(3), 0x30);
        assert_eq!(m.v(4), 0xcc);
        assert_eq!(m.v(5), 0x3c);
        // logic ops leave VF alone
        assert_eq!(m.v(0xf), 0x42);
    }

    #[test]
    fn test_add_with_carry() {
        for (a, b) in [(0u8, 0u8), (1, 2), (0x80, 0x7f), (0x80, 0x80), (0xff, 0xff), (0xff, 1)] {
            let mut m = machine(&[0x8014]);
            m.registers.v[0] = a;
            m.registers.v[1] = b;
            m.step();
            let sum = a as u16 + b as u16;
            assert_eq!(m.v(0) as u16, sum % 256);
            assert_eq!(m.v(0xf), (sum > 255) as u8);
        }
    }

    #[test]
    fn test_sub_and_subn_not_borrow() {
        for (a, b) in [(5u8, 3u8), (3, 5), (7, 7), (0, 0xff), (0xff, 0)] {
            let mut m = machine(&[0x8015]);
            m.registers.v[0] = a;
            m.registers.v[1] = b;
            m.step();
            assert_eq!(m.v(0), a.wrapping_sub(b));
            assert_eq!(m.v(0xf), (a >= b) as u8);

            let mut m = machine(&[0x8017]);
            m.registers.v[0] = a;
            m.registers.v[1] = b;
            m.step();
            assert_eq!(m.v(0), b.wrapping_sub(a));
            assert_eq!(m.v(0xf), (b >= a) as u8);
        }
    }

    #[test]
    fn test_shifts() {
        let mut m = machine(&[0x8016, 0x811e]);
        m.registers.v[0] = 0x05;
        m.registers.v[1] = 0x81;
        m.step();
        assert_eq!((m.v(0), m.v(0xf)), (0x02, 1));
        m.step();
        assert_eq!((m.v(1), m.v(0xf)), (0x02, 1));
    }

    #[test]
    fn test_flag_register_as_operand() {
        // (opcode, VF, V1, expected VF, expected V1)
        let cases: [(u16, u8, u8, u8, u8); 7] = [
            // ADD VF, V1: the sum overwrites the carry
            (0x8f14, 0x10, 0x20, 0x30, 0x20),
            // SHL VF: the shifted value overwrites the shifted-out bit
            (0x8f0e, 0x81, 0x00, 0x02, 0x00),
            // SHR VF
            (0x8f06, 0x03, 0x00, 0x00, 0x00),
            // SUB VF, V1: subtracts from the freshly written flag
            (0x8f15, 0x05, 0x03, 0xfe, 0x03),
            // SUBN VF, V1: 3 - flag(0)
            (0x8f17, 0x05, 0x03, 0x03, 0x03),
            // SUB V1, VF: the flag is the subtrahend once written
            (0x81f5, 0x09, 0x05, 0x00, 0x05),
            // ADD V1, VF: operands are read before the carry lands
            (0x81f4, 0x01, 0xff, 0x01, 0x00),
        ];
        for (opcode, vf, v1, want_vf, want_v1) in cases {
            let mut m = machine(&[opcode]);
            m.registers.v[0xf] = vf;
            m.registers.v[1] = v1;
            m.step();
            assert_eq!(m.v(0xf), want_vf, "opcode {:04x} VF", opcode);
            assert_eq!(m.v(1), want_v1, "opcode {:04x} V1", opcode);
        }
    }

    #[test]
    fn test_random_is_masked() {
        let mut m = machine(&[0xc30f]);
        m.step();
        assert_eq!(m.v(3), 0xa5 & 0x0f);
    }

    #[test]
    fn test_seeded_machines_agree() {
        let program: Vec<u8> = [0xc0ffu16, 0xc1ff, 0xc2ff]
            .iter()
            .flat_map(|op| op.to_be_bytes())
            .collect();
        let mut a = Machine::with_seed(99);
        let mut b = Machine::with_seed(99);
        a.load(&program).unwrap();
        b.load(&program).unwrap();
        for _ in 0..3 {
            a.step();
            b.step();
        }
        assert_eq!(a.registers, b.registers);
    }

    #[test]
    fn test_clear_screen() {
        let mut m = machine(&[0xa000, 0xd005, 0x00e0]);
        run(&mut m, 2);
        m.clear_dirty();
        m.step();
        assert!(m.is_dirty());
        assert_eq!(m.framebuffer().to_bytes(), [0; 256]);
    }

    #[test]
    fn test_draw_glyph_zero() {
        let mut m = machine(&[0xa000, 0xd005]);
        run(&mut m, 2);
        assert_eq!(m.v(0xf), 0);
        assert!(m.is_dirty());
        // "0" is F0 90 90 90 F0
        for x in 0..4 {
            assert!(m.get_pixel(x, 0));
            assert!(m.get_pixel(x, 4));
        }
        for y in 1..4 {
            assert!(m.get_pixel(0, y));
            assert!(!m.get_pixel(1, y));
            assert!(!m.get_pixel(2, y));
            assert!(m.get_pixel(3, y));
        }
        assert!(!m.get_pixel(4, 0));
        assert!(!m.get_pixel(0, 5));
    }

    #[test]
    fn test_draw_twice_collides_and_restores() {
        let mut m = machine(&[0x6005, 0x6103, 0xa000, 0xd015, 0xd015]);
        run(&mut m, 4);
        assert_eq!(m.v(0xf), 0);
        m.step();
        assert_eq!(m.v(0xf), 1);
        assert_eq!(m.framebuffer().to_bytes(), [0; 256]);
    }

    #[test]
    fn test_draw_resets_flag() {
        let mut m = machine(&[0x6f09, 0xa000, 0xd000]);
        run(&mut m, 3);
        assert_eq!(m.v(0xf), 0);
        assert!(m.is_dirty());
    }

    #[test]
    fn test_key_skips() {
        let mut m = machine(&[0x6004, 0xe09e]);
        m.set_key(4, true);
        run(&mut m, 2);
        assert_eq!(m.pc(), 0x206);

        let mut m = machine(&[0x6004, 0xe0a1]);
        run(&mut m, 2);
        assert_eq!(m.pc(), 0x206);

        let mut m = machine(&[0x6014, 0xe09e]);
        m.set_key(4, true);
        run(&mut m, 2);
        // only the low nibble of Vx picks the key
        assert_eq!(m.pc(), 0x206);
    }

    #[test]
    fn test_wait_for_key() {
        let mut m = machine(&[0xf30a]);
        m.step();
        assert_eq!(m.pc(), 0x200);
        m.step();
        assert_eq!(m.pc(), 0x200);
        m.set_key(0xb, true);
        m.set_key(0x7, true);
        m.step();
        assert_eq!(m.pc(), 0x202);
        assert_eq!(m.v(3), 0x7);
    }

    #[test]
    fn test_timers() {
        let mut m = machine(&[0x6003, 0xf015, 0xf018, 0xf107]);
        run(&mut m, 3);
        assert_eq!(m.delay_timer(), 3);
        assert!(m.sound_active());
        // executing instructions never moves the timers
        m.step();
        assert_eq!(m.v(1), 3);
        for _ in 0..10 {
            m.tick_timers();
        }
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
        assert!(!m.sound_active());
    }

    #[test]
    fn test_add_index() {
        let mut m = machine(&[0xaffe, 0x6005, 0xf01e]);
        run(&mut m, 3);
        assert_eq!(m.i(), 0x1003);
    }

    #[test]
    fn test_load_glyph() {
        let mut m = machine(&[0x601a, 0xf029]);
        run(&mut m, 2);
        assert_eq!(m.i(), 50);
    }

    #[test]
    fn test_bcd() {
        let mut m = machine(&[0x60fe, 0xa300, 0xf033]);
        run(&mut m, 3);
        assert_eq!(m.read_memory(0x300), 2);
        assert_eq!(m.read_memory(0x301), 5);
        assert_eq!(m.read_memory(0x302), 4);
    }

    #[test]
    fn test_store_and_load_registers() {
        let mut m = machine(&[0x6011, 0x6122, 0x6233, 0xa400, 0xf155, 0xa400, 0xf265]);
        run(&mut m, 5);
        assert_eq!(m.read_memory(0x400), 0x11);
        assert_eq!(m.read_memory(0x401), 0x22);
        assert_eq!(m.read_memory(0x402), 0x00);
        assert_eq!(m.i(), 0x400);
        run(&mut m, 2);
        assert_eq!((m.v(0), m.v(1), m.v(2)), (0x11, 0x22, 0x00));
    }

    #[test]
    fn test_store_into_glyphs_dropped() {
        let mut m = machine(&[0x6000, 0xa000, 0xf055]);
        run(&mut m, 3);
        assert_eq!(m.read_memory(0x000), 0xf0);
    }

    #[test]
    fn test_unknown_opcodes_are_noops() {
        let mut m = machine(&[0x6042, 0x0123, 0x80f8, 0xe0ff, 0xf0ff]);
        m.step();
        let before = m.registers.clone();
        run(&mut m, 4);
        assert_eq!(m.pc(), 0x20a);
        assert_eq!(m.registers.v, before.v);
        assert_eq!(m.registers.i, before.i);
    }

    #[test]
    fn test_load_limits() {
        let mut m = Machine::new();
        assert!(m.load(&[0; 3584]).is_ok());
        assert!(matches!(
            m.load(&[0; 3585]),
            Err(RomLoadError::TooLarge { size: 3585, max: 3584 })
        ));
    }

    #[test]
    fn test_initialize_resets() {
        let mut m = machine(&[0x6a05, 0xa000, 0xd005]);
        run(&mut m, 3);
        m.initialize();
        assert_eq!(m.pc(), 0x200);
        assert_eq!(m.v(0xa), 0);
        assert!(!m.get_pixel(0, 0));
        assert_eq!(m.read_memory(0x200), 0);
    }
}
