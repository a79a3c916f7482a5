//! # interpreter
//!
//! The driver around a `Machine`. It owns the machine and borrows the
//! host-side collaborators, then runs two loops interleaved on one thread:
//!
//!  - instruction steps at `Config::instructions_per_second`
//!  - timer interrupts at `Config::timer_hz`
//!
//! Both rates are kept in emulated time: every step advances the clock by
//! 1/ips, and an interrupt fires whenever another 1/timer_hz has gone by, so
//! a step can be followed by zero, one or several interrupts. Each interrupt
//! polls the keyboard into the keypad latch, counts the timers down, redraws
//! the screen if the framebuffer changed and turns the buzzer on or off.
//! After any step that raised an interrupt the driver sleeps until the wall
//! clock catches up with emulated time.

use crate::config::Config;
use crate::display::Display;
use crate::error::RomLoadError;
use crate::input::Input;
use crate::machine::Machine;
use crate::sound::Sound;
use log::{debug, info};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

/// how far behind the wall clock we let emulated time fall before giving up
/// on catching up
const MAX_LAG: Duration = Duration::from_millis(100);

pub struct Chip8Interpreter<'a> {
    machine: Machine,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: Config,
}

impl<'a> Chip8Interpreter<'a> {
    pub fn new(
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: Config,
    ) -> Chip8Interpreter<'a> {
        let machine = match config.seed {
            Some(seed) => Machine::with_seed(seed),
            None => Machine::new(),
        };
        Chip8Interpreter {
            machine,
            display,
            input,
            sound,
            config,
        }
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), RomLoadError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.machine.load(&buf)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// run until the cycle limit or the user quits; returns the number of
    /// instructions executed
    pub fn main_loop(&mut self) -> Result<u64, Box<dyn Error>> {
        let ips = self.config.instructions_per_second.max(1) as u64;
        let timer_hz = self.config.timer_hz as u64;
        let mut timer_accum: u64 = 0;
        let mut epoch = Instant::now();
        let mut epoch_cycles: u64 = 0;
        let mut cycles: u64 = 0;

        info!("running at {} instructions/s, {} timer ticks/s", ips, timer_hz);
        loop {
            if self.config.max_cycles.map_or(false, |max| cycles >= max) {
                break;
            }
            if self.input.quit_requested() {
                info!("quit requested");
                break;
            }

            self.machine.step();
            cycles += 1;

            // timer_accum / (ips * timer_hz) seconds since the last tick
            timer_accum += timer_hz;
            let mut ticked = false;
            while timer_accum >= ips {
                timer_accum -= ips;
                self.interrupt()?;
                ticked = true;
            }

            if ticked || timer_hz == 0 {
                let emulated = (cycles - epoch_cycles) as f64 / ips as f64;
                let due = epoch + Duration::from_secs_f64(emulated);
                let now = Instant::now();
                if due > now {
                    spin_sleep::sleep(due - now);
                } else if now - due > MAX_LAG {
                    // running slow; don't try to catch up
                    epoch = now;
                    epoch_cycles = cycles;
                }
            }
        }
        // whatever the last batch drew should still make it to the screen
        self.render()?;
        self.sound.set_active(false)?;
        debug!("stopped after {} cycles at pc 0x{:03x}", cycles, self.machine.pc());
        Ok(cycles)
    }

    /// timer interrupt
    pub fn interrupt(&mut self) -> Result<(), Box<dyn Error>> {
        let keys = self.input.poll_keys()?;
        for (index, held) in keys.iter().enumerate() {
            self.machine.set_key(index, *held);
        }
        self.machine.tick_timers();
        self.render()?;
        self.sound.set_active(self.machine.sound_active())?;
        Ok(())
    }

    fn render(&mut self) -> Result<(), io::Error> {
        if self.machine.is_dirty() {
            let frame = self.machine.framebuffer().to_bytes();
            if frame.len() != self.display.get_display_size_bytes() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "display expects {} bytes per frame, machine produces {}",
                        self.display.get_display_size_bytes(),
                        frame.len()
                    ),
                ));
            }
            self.display.draw(&frame)?;
            self.machine.clear_dirty();
        }
        Ok(())
    }
}
