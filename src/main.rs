use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use chipvm::{memory::MemoryError, Emulator};
use clap::Parser;
use log::{error, info};
use screen::Screen;

mod screen;

// CPU: ~700 instructions per second
// Display: 60 times per second
const STEPS_PER_FRAME: usize = 11;

/// Run a Chip-8 program image
#[derive(Parser, Debug)]
#[command(name = "chipvm")]
struct Args {
    /// Path to the raw program image, loaded at 0x200
    rom: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MemoryError>() {
                Some(load) if load.is_load_error() => error!("cannot start: {e:#}"),
                _ => error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut emu = Emulator::new();
    let len = emu.mem.load_rom_by_file(&args.rom)?;
    info!("loaded '{}' ({} bytes)", args.rom.display(), len);

    let mut screen = Screen::new()?;
    while screen.is_open() {
        for _ in 0..STEPS_PER_FRAME {
            emu.execute_next()?;
        }
        screen.present(&emu.fb)?;
    }
    info!("window closed");
    Ok(())
}
