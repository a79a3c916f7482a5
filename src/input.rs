use crate::keypad::CHIP8_KEY_COUNT;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// map of keyboard characters to the COSMAC hex keypad, using the left-hand
/// side of a qwerty keyboard:
///
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals only report presses (and autorepeats), never releases, so a key
/// counts as held for this long after the last event we saw for it
const KEY_HOLD_WINDOW: Duration = Duration::from_millis(200);

/// Reads the host keyboard and reports the hex keypad as currently held keys.
pub trait Input {
    /// which of the 16 keys are down right now
    fn poll_keys(&mut self) -> Result<[bool; CHIP8_KEY_COUNT], io::Error>;

    /// has the user asked to stop the emulator?
    fn quit_requested(&self) -> bool;
}

/// keyboard input from the terminal, read with crossterm in raw mode
pub struct TermInput {
    keymap: HashMap<char, u8>,
    last_seen: [Option<Instant>; CHIP8_KEY_COUNT],
    quit: bool,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_seen: [None; CHIP8_KEY_COUNT],
            quit: false,
        })
    }

    fn read_events(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => self.quit = true,
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.quit = true
                    }
                    KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                        Some(mapped_key) => {
                            self.last_seen[*mapped_key as usize] = Some(Instant::now())
                        }
                        None => debug!("can't map {:?} to a COSMAC key", key),
                    },
                    other => debug!("ignoring key event {:?}", other),
                }
            }
        }
        Ok(())
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("couldn't leave raw mode: {}", e);
        }
    }
}

impl Input for TermInput {
    fn poll_keys(&mut self) -> Result<[bool; CHIP8_KEY_COUNT], io::Error> {
        self.read_events()?;
        let now = Instant::now();
        let mut held = [false; CHIP8_KEY_COUNT];
        for (key, seen) in held.iter_mut().zip(self.last_seen.iter()) {
            *key = matches!(seen, Some(t) if now.duration_since(*t) < KEY_HOLD_WINDOW);
        }
        Ok(held)
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing and headless runs: the given keys
/// are held forever
pub struct DummyInput {
    held: [bool; CHIP8_KEY_COUNT],
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        let mut held = [false; CHIP8_KEY_COUNT];
        for key in keys {
            if let Some(k) = held.get_mut(*key as usize) {
                *k = true;
            }
        }
        DummyInput { held }
    }
}

impl Input for DummyInput {
    fn poll_keys(&mut self) -> Result<[bool; CHIP8_KEY_COUNT], io::Error> {
        Ok(self.held)
    }

    fn quit_requested(&self) -> bool {
        false
    }
}
