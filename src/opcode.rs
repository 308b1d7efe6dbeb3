/// # Opcodes
///
/// Chip-8 opcodes are 16 bit big-endian words. Fields sit at fixed nibble positions:
/// - `[s___]` the segment; broad categorization that applies to all opcodes
/// - `[_x__]` the register Vx, or the last register of the range V0..=Vx
/// - `[__y_]` the register Vy
/// - `[___n]` a 4-bit value; a sprite height or the operation within segment 0x8
/// - `[__nn]` an 8-bit immediate value, or the operation within segments 0x0, 0xE and 0xF
/// - `[_nnn]` a 12-bit address
pub trait Opcode {
    /// `(segment, x, y, n)`
    fn nibbles(&self) -> (u8, u8, u8, u8);

    fn segment(&self) -> u8;

    fn x(&self) -> u8;

    fn y(&self) -> u8;

    fn n(&self) -> u8;

    fn nn(&self) -> u8;

    fn nnn(&self) -> u16;
}

impl Opcode for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        (self.segment(), self.x(), self.y(), self.n())
    }

    fn segment(&self) -> u8 {
        (self >> 12) as u8
    }

    fn x(&self) -> u8 {
        ((self & 0x0F00) >> 8) as u8
    }

    fn y(&self) -> u8 {
        ((self & 0x00F0) >> 4) as u8
    }

    fn n(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn nn(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn nnn(&self) -> u16 {
        self & 0x0FFF
    }
}
