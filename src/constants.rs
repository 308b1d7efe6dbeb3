/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// 0x000 - 0x1FF is reserved for the interpreter; the font lives at its start
pub const FONT_START: u16 = 0x000;

/// ROMs are loaded into memory here and execution begins here
pub const PROGRAM_START: u16 = 0x200;

/// The largest ROM that fits between `PROGRAM_START` and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

pub const REGISTER_COUNT: usize = 16;
pub const STACK_SIZE: usize = 16;
pub const KEY_COUNT: usize = 16;

/// Every opcode is two bytes wide
pub const OPCODE_STEP: u16 = 2;

/// Sprites are always 8 pixels wide
pub const SPRITE_WIDTH: usize = 8;

/// Each glyph in `FONT_SET` is 5 rows tall
pub const FONT_GLYPH_SIZE: u16 = 5;

pub const DEFAULT_FRAME_RATE: u32 = 60;

/// # Font
/// Hexadecimal glyphs 0..F, 4 pixels wide and 5 rows tall.
/// Only the high nibble of each row is drawn.
///
/// ```text
/// 0xF0 -> ****
/// 0x90 -> *  *
/// 0x90 -> *  *
/// 0x90 -> *  *
/// 0xF0 -> ****
/// ```
pub const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
