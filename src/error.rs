use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading or running a ROM.
///
/// None of these are transient: a failing cycle commits no state and the error is handed
/// to the host, which decides what happens next.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ROM is {size} bytes but at most {max_size} bytes fit in program memory")]
    InvalidRom { size: usize, max_size: usize },

    #[error("memory access of {len} byte(s) at {address:#06X} is out of bounds")]
    OutOfBounds { address: usize, len: usize },

    #[error("stack overflow calling a subroutine from {pc:#06X}")]
    StackOverflow { pc: u16 },

    #[error("stack underflow returning from {pc:#06X}")]
    StackUnderflow { pc: u16 },

    #[error("unknown opcode {opcode:#06X} in segment {segment:#X} at {pc:#06X}")]
    UnknownOpcode { opcode: u16, segment: u8, pc: u16 },

    #[error("machine code routine {opcode:#06X} at {pc:#06X} is not supported")]
    Unsupported { opcode: u16, pc: u16 },

    #[error("program counter overflowed past {pc:#06X}")]
    ProgramCounterOverflow { pc: u16 },

    #[error("program counter underflowed below {pc:#06X}")]
    ProgramCounterUnderflow { pc: u16 },

    #[error("key {0:#X} is not on the keypad")]
    InvalidKey(u8),

    #[error("emulator already running")]
    AlreadyRunning,

    #[error("emulator already stopped")]
    AlreadyStopped,

    #[error("failed to spawn the emulation thread: {0}")]
    Spawn(#[from] io::Error),
}
