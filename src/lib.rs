pub use chip8::Chip8;
pub use config::{Config, MachineCodePolicy};
pub use context::{Context, FrameBuffer, Keys};
pub use error::{Error, Result};
pub use host::{Keypad, NoKeys, Observer};
pub use instruction::{Instruction, InstructionKind};

mod chip8;
mod config;
pub mod constants;
mod context;
mod error;
mod host;
mod instruction;
mod opcode;
mod operations;
