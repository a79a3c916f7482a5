use clap::Parser;
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use chip8_vm::config::Config;
use chip8_vm::display::{Display, DummyDisplay, MonoTermDisplay};
use chip8_vm::framebuffer::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};
use chip8_vm::input::{DummyInput, Input, TermInput};
use chip8_vm::interpreter::Chip8Interpreter;
use chip8_vm::rom::read_rom;
use chip8_vm::sound::{Mute, SimpleBeep, Sound};

#[derive(Parser)]
#[command(name = "chip8-vm")]
#[command(about = "CHIP-8 virtual machine")]
struct Cli {
    /// Raw CHIP-8 program image, loaded at 0x200
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = 700)]
    ips: u32,

    /// Timer ticks per second
    #[arg(long, default_value_t = 60)]
    timer_hz: u32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many instructions
    #[arg(long)]
    cycles: Option<u64>,

    /// No terminal display, keyboard or sound
    #[arg(long)]
    headless: bool,

    /// Don't make any noise
    #[arg(long)]
    mute: bool,
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let rom = read_rom(&cli.rom)?;
    let config = Config {
        instructions_per_second: cli.ips,
        timer_hz: cli.timer_hz,
        seed: cli.seed,
        max_cycles: cli.cycles,
    };

    // initialise
    let (mut display, mut input): (Box<dyn Display>, Box<dyn Input>) = if cli.headless {
        (Box::new(DummyDisplay::new()), Box::new(DummyInput::new(&[])))
    } else {
        (
            Box::new(MonoTermDisplay::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT)?),
            Box::new(TermInput::new()?),
        )
    };
    let mut sound: Box<dyn Sound> = if cli.headless || cli.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let mut interpreter =
        Chip8Interpreter::new(&mut *display, &mut *input, &mut *sound, config);
    interpreter.load_program(&mut rom.as_slice())?;
    let cycles = interpreter.main_loop()?;
    log::info!("executed {} instructions", cycles);
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
