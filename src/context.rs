use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT, MEMORY_SIZE, OPCODE_STEP, REGISTER_COUNT, STACK_SIZE,
};
use crate::error::{Error, Result};

/// The FrameBuffer is indexed as [y][x]; every pixel is 0 or 1
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// The held status of keys 0..F
pub type Keys = [bool; KEY_COUNT];

/// # Context
/// The complete mutable state of a Chip-8 machine.
///
/// ## CPU
/// Registers
/// - (v) 16 8-bit registers (V0..VF)
///     - VF doubles as the carry, borrow and collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter, stepped two bytes at a time
///
/// Stack
/// - (stack) 16 return addresses
/// - (sp) points at the most recent push; 0 means the stack is empty
///
/// Timers
/// - 2 8-bit timers (delay & sound), each decremented once per cycle while above 0
///
/// ## Memory
/// - 4096 bytes of addressable memory
///     - 0x000..0x200 holds the font
///     - programs are loaded at 0x200
/// - 64x32 frame buffer with a flag signalling that it should be redrawn
///
/// ## Input
/// - the held status of each key, refreshed once per cycle
#[derive(Copy, Clone)]
pub struct Context {
    pub memory: [u8; MEMORY_SIZE],
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub stack: [u16; STACK_SIZE],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub frame_buffer: FrameBuffer,
    pub keys: Keys,
    pub draw_flag: bool,
}

impl Context {
    pub fn new() -> Self {
        Context {
            memory: [0; MEMORY_SIZE],
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: 0,
            sp: 0,
            stack: [0; STACK_SIZE],
            delay_timer: 0,
            sound_timer: 0,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            keys: [false; KEY_COUNT],
            draw_flag: false,
        }
    }

    /// Zeroes everything; nothing survives a reset
    pub fn reset(&mut self) {
        *self = Context::new();
    }

    /// Copies `bytes` into memory starting at `offset`
    pub fn load(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        self.slice_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn read(&self, address: usize) -> Result<u8> {
        Ok(self.slice(address, 1)?[0])
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<()> {
        self.slice_mut(address, 1)?[0] = value;
        Ok(())
    }

    /// A bounds checked view of `len` bytes of memory starting at `address`
    pub fn slice(&self, address: usize, len: usize) -> Result<&[u8]> {
        let end = Self::end(address, len)?;
        Ok(&self.memory[address..end])
    }

    pub fn slice_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8]> {
        let end = Self::end(address, len)?;
        Ok(&mut self.memory[address..end])
    }

    fn end(address: usize, len: usize) -> Result<usize> {
        match address.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(end),
            _ => Err(Error::OutOfBounds { address, len }),
        }
    }

    /// Sets the held status of a single key.
    /// The draw flag is raised too so that hosts showing key state get a redraw.
    pub fn set_key_state(&mut self, key: u8, pressed: bool) -> Result<()> {
        let held = self
            .keys
            .get_mut(key as usize)
            .ok_or(Error::InvalidKey(key))?;
        *held = pressed;
        self.draw_flag = true;
        Ok(())
    }

    /// Replaces the whole key state with a fresh snapshot
    pub fn refresh_keys(&mut self, keys: Keys) {
        self.keys = keys;
    }

    /// Reads the opcode at the pc and moves the pc past it.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&mut self) -> Result<u16> {
        let word = self.slice(self.pc as usize, OPCODE_STEP as usize)?;
        let op = u16::from(word[0]) << 8 | u16::from(word[1]);
        self.advance()?;
        Ok(op)
    }

    /// Moves the pc forward by one instruction.
    /// The pc may rest one past the end of memory after the last word; the next fetch rejects it.
    pub fn advance(&mut self) -> Result<()> {
        match self.pc.checked_add(OPCODE_STEP) {
            Some(pc) if (pc as usize) <= MEMORY_SIZE => {
                self.pc = pc;
                Ok(())
            }
            _ => Err(Error::ProgramCounterOverflow { pc: self.pc }),
        }
    }

    /// Moves the pc back by one instruction, never onto address 0
    pub fn rewind(&mut self) -> Result<()> {
        match self.pc.checked_sub(OPCODE_STEP) {
            Some(pc) if pc > 0 => {
                self.pc = pc;
                Ok(())
            }
            _ => Err(Error::ProgramCounterUnderflow { pc: self.pc }),
        }
    }

    /// Decrements both timers, stopping at 0
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
