use std::time::Duration;

use crate::constants::DEFAULT_FRAME_RATE;

/// What to do with `0nnn`, which would call a routine written for the host CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineCodePolicy {
    /// Log it and carry on with the next instruction
    #[default]
    Ignore,
    /// Fail the cycle with `Error::Unsupported`
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Cycles per second; each cycle executes one instruction and ticks both timers once
    pub frame_rate: u32,
    pub machine_code: MachineCodePolicy,
}

impl Config {
    /// The wall-clock budget of a single cycle.
    /// A frame rate of 0 is treated as 1.
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frame_rate: DEFAULT_FRAME_RATE,
            machine_code: MachineCodePolicy::default(),
        }
    }
}
