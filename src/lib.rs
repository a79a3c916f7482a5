//! # chip8-vm
//!
//! A CHIP-8 virtual machine core, plus a terminal front end to drive it.
//!
//! ## Design
//!
//! * the machine is one owned state record (`machine::Machine`); no globals
//! * the machine only moves when its driver calls in: `step()` for one
//!   instruction, `tick_timers()` for the 60Hz timers, `set_key()` for input
//! * opcodes are decoded into `instruction::Instruction` before execution
//! * `step()` never fails; only loading a ROM can
//! * the random source behind `Cxkk` is injected, so runs can be replayed
//! * abstract display, input and sound so the host side can be swapped;
//!   starting with TUI in-console
//!
//! Model
//!
//! main
//!  |-- config, display, input, sound
//!  |-- rom::read_rom(path)
//!  `-- interpreter(display, input, sound, config)
//!       |-- machine
//!       |    |-- memory (glyphs + program), registers, stack
//!       |    |-- framebuffer, timers, keypad
//!       |    `-- rng
//!       `-- main loop
//!            |-- machine.step(), paced to the instruction rate
//!            |-- interrupt() at the timer rate: poll keys, tick timers, redraw, beep
//!            `-- sleep until emulated time catches up with the wall clock

pub mod config;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod machine;
pub mod memory;
pub mod registers;
pub mod rng;
pub mod rom;
pub mod sound;
pub mod stack;
pub mod timer;

pub use error::RomLoadError;
pub use instruction::Instruction;
pub use machine::Machine;
