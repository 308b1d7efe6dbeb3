use std::path::PathBuf;

use clap::Parser;

use chip8vm::constants::DEFAULT_FRAME_RATE;
use chip8vm::{Config, MachineCodePolicy};

mod keymap;
mod run;

#[derive(Parser, Debug)]
#[command(version, about = "Runs a Chip-8 ROM in an SDL2 window", long_about = None)]
struct Args {
    /// Path to the ROM file to run
    rom: PathBuf,

    /// Cycles per second; each cycle runs one instruction and ticks the timers
    #[arg(short, long, default_value_t = DEFAULT_FRAME_RATE)]
    fps: u32,

    /// Size multiplier for each pixel
    #[arg(short, long, default_value_t = 10)]
    scale: u32,

    /// Fail on `0nnn` machine code calls instead of skipping them
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let machine_code = if args.strict {
        MachineCodePolicy::Reject
    } else {
        MachineCodePolicy::Ignore
    };
    run::run(run::Options {
        rom: args.rom,
        config: Config {
            frame_rate: args.fps,
            machine_code,
        },
        scale: args.scale,
    })
}
