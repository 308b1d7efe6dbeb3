//! The seams between the emulator and whatever is hosting it.
//!
//! Both traits are moved onto the emulation thread while the machine runs, so they must be
//! `Send`. Every callback is invoked synchronously from that thread, in order.

use crate::context::{Context, Keys};
use crate::error::Error;

/// Supplies the held status of keys 0..F.
/// Polled once at the start of every cycle; the snapshot is copied into the machine.
pub trait Keypad: Send {
    fn keys(&mut self) -> Keys;
}

/// A keypad with nothing held down
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKeys;

impl Keypad for NoKeys {
    fn keys(&mut self) -> Keys {
        Keys::default()
    }
}

/// Receives lifecycle notifications from the cycle scheduler.
///
/// The context handed to each callback is a read-only view that is only valid for the
/// duration of the call. Observers must not try to start or stop the machine from inside a
/// callback.
pub trait Observer: Send {
    /// The machine has started running
    fn on_start(&mut self, _context: &Context) {}

    /// An instruction has executed; fires every cycle
    fn on_update(&mut self, _context: &Context) {}

    /// The frame buffer changed and should be redrawn
    fn on_frame(&mut self, _context: &Context) {}

    /// The sound timer is still running after this cycle's tick
    fn on_sound(&mut self, _context: &Context) {}

    /// A cycle failed; the machine halts after this
    fn on_fault(&mut self, _error: &Error) {}

    /// The machine has stopped running
    fn on_stop(&mut self, _context: &Context) {}
}
