use log::trace;

use crate::config::MachineCodePolicy;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::opcode::Opcode;
use crate::operations::{self, Operation};

/// Every instruction the interpreter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    /// `0nnn`
    CallMachineCode,
    /// `00E0`
    ClearScreen,
    /// `00EE`
    Return,
    /// `1nnn`
    Jump,
    /// `2nnn`
    CallSubroutine,
    /// `3xnn`
    SkipIfEqualValue,
    /// `4xnn`
    SkipIfNotEqualValue,
    /// `5xy0`
    SkipIfEqualRegister,
    /// `6xnn`
    LoadValue,
    /// `7xnn`
    AddValue,
    /// `8xy0`
    LoadRegister,
    /// `8xy1`
    OrRegisters,
    /// `8xy2`
    AndRegisters,
    /// `8xy3`
    XorRegisters,
    /// `8xy4`
    AddRegisters,
    /// `8xy5`
    SubtractRegisters,
    /// `8xy6`
    ShiftRight,
    /// `8xy7`
    ReverseSubtract,
    /// `8xyE`
    ShiftLeft,
    /// `9xy0`
    SkipIfNotEqualRegister,
    /// `Annn`
    LoadIndex,
    /// `Bnnn`
    JumpPlusV0,
    /// `Cxnn`
    RandomAnd,
    /// `Dxyn`
    DrawSprite,
    /// `Ex9E`
    SkipIfKeyPressed,
    /// `ExA1`
    SkipIfKeyNotPressed,
    /// `Fx07`
    LoadDelayTimer,
    /// `Fx0A`
    WaitForKey,
    /// `Fx15`
    SetDelayTimer,
    /// `Fx18`
    SetSoundTimer,
    /// `Fx1E`
    AddToIndex,
    /// `Fx29`
    LoadSpriteLocation,
    /// `Fx33`
    StoreBcd,
    /// `Fx55`
    StoreRegisters,
    /// `Fx65`
    LoadRegisters,
}

impl InstructionKind {
    /// Selects the Operation that carries out this kind of instruction
    pub fn operation(self) -> Operation {
        use InstructionKind::*;
        match self {
            CallMachineCode => operations::call_machine_code,
            ClearScreen => operations::clear_screen,
            Return => operations::ret,
            Jump => operations::jump,
            CallSubroutine => operations::call,
            SkipIfEqualValue => operations::skip_eq,
            SkipIfNotEqualValue => operations::skip_ne,
            SkipIfEqualRegister => operations::skip_eq_reg,
            LoadValue => operations::load,
            AddValue => operations::add,
            LoadRegister => operations::mv,
            OrRegisters => operations::or,
            AndRegisters => operations::and,
            XorRegisters => operations::xor,
            AddRegisters => operations::add_reg,
            SubtractRegisters => operations::sub,
            ShiftRight => operations::shr,
            ReverseSubtract => operations::subn,
            ShiftLeft => operations::shl,
            SkipIfNotEqualRegister => operations::skip_ne_reg,
            LoadIndex => operations::load_i,
            JumpPlusV0 => operations::jump_v0,
            RandomAnd => operations::rand,
            DrawSprite => operations::draw,
            SkipIfKeyPressed => operations::skip_pressed,
            SkipIfKeyNotPressed => operations::skip_not_pressed,
            LoadDelayTimer => operations::load_delay,
            WaitForKey => operations::wait_key,
            SetDelayTimer => operations::set_delay,
            SetSoundTimer => operations::set_sound,
            AddToIndex => operations::add_i,
            LoadSpriteLocation => operations::load_glyph,
            StoreBcd => operations::bcd,
            StoreRegisters => operations::store,
            LoadRegisters => operations::read,
        }
    }
}

/// # Instruction
/// A decoded opcode: its fields pulled apart and its kind resolved.
/// Rebuilt from scratch every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u16,
    /// Address the opcode was fetched from
    pub pc: u16,
    pub segment: u8,
    pub x: usize,
    pub y: usize,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
    pub kind: InstructionKind,
}

impl Instruction {
    /// Decodes `opcode`, fetched from `pc`.
    ///
    /// The segment picks the instruction, except for segments 0x0, 0xE and 0xF (cased on the
    /// low byte) and 0x8 (cased on the low nibble).
    pub fn decode(opcode: u16, pc: u16) -> Result<Self> {
        use InstructionKind::*;
        let kind = match opcode.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Return,
            (0x0, ..) => CallMachineCode,
            (0x1, ..) => Jump,
            (0x2, ..) => CallSubroutine,
            (0x3, ..) => SkipIfEqualValue,
            (0x4, ..) => SkipIfNotEqualValue,
            (0x5, ..) => SkipIfEqualRegister,
            (0x6, ..) => LoadValue,
            (0x7, ..) => AddValue,
            (0x8, .., 0x0) => LoadRegister,
            (0x8, .., 0x1) => OrRegisters,
            (0x8, .., 0x2) => AndRegisters,
            (0x8, .., 0x3) => XorRegisters,
            (0x8, .., 0x4) => AddRegisters,
            (0x8, .., 0x5) => SubtractRegisters,
            (0x8, .., 0x6) => ShiftRight,
            (0x8, .., 0x7) => ReverseSubtract,
            (0x8, .., 0xE) => ShiftLeft,
            (0x9, ..) => SkipIfNotEqualRegister,
            (0xA, ..) => LoadIndex,
            (0xB, ..) => JumpPlusV0,
            (0xC, ..) => RandomAnd,
            (0xD, ..) => DrawSprite,
            (0xE, _, 0x9, 0xE) => SkipIfKeyPressed,
            (0xE, _, 0xA, 0x1) => SkipIfKeyNotPressed,
            (0xF, _, 0x0, 0x7) => LoadDelayTimer,
            (0xF, _, 0x0, 0xA) => WaitForKey,
            (0xF, _, 0x1, 0x5) => SetDelayTimer,
            (0xF, _, 0x1, 0x8) => SetSoundTimer,
            (0xF, _, 0x1, 0xE) => AddToIndex,
            (0xF, _, 0x2, 0x9) => LoadSpriteLocation,
            (0xF, _, 0x3, 0x3) => StoreBcd,
            (0xF, _, 0x5, 0x5) => StoreRegisters,
            (0xF, _, 0x6, 0x5) => LoadRegisters,
            (segment, ..) => {
                return Err(Error::UnknownOpcode {
                    opcode,
                    segment,
                    pc,
                })
            }
        };

        Ok(Instruction {
            opcode,
            pc,
            segment: opcode.segment(),
            x: opcode.x() as usize,
            y: opcode.y() as usize,
            n: opcode.n(),
            nn: opcode.nn(),
            nnn: opcode.nnn(),
            kind,
        })
    }

    /// Applies this instruction to `context`, which must already have its pc moved past the
    /// opcode. Nothing is committed on failure: the caller keeps its original context.
    pub fn execute(&self, context: &Context, machine_code: MachineCodePolicy) -> Result<Context> {
        trace!(
            "{:04X} {:?} v{:02X?} i{:04X} pc{:04X}",
            self.opcode,
            self.kind,
            context.v,
            context.i,
            self.pc
        );
        if self.kind == InstructionKind::CallMachineCode && machine_code == MachineCodePolicy::Reject
        {
            return Err(Error::Unsupported {
                opcode: self.opcode,
                pc: self.pc,
            });
        }
        (self.kind.operation())(self, context)
    }
}

#[cfg(test)]
mod test_instruction {
    use super::*;
    use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_SET, PROGRAM_START};

    /// A fresh context with the font loaded and the pc at the program start
    fn context() -> Context {
        let mut context = Context::new();
        context.load(&FONT_SET, 0x0).unwrap();
        context.pc = PROGRAM_START;
        context
    }

    /// Runs `op` as if it had just been fetched from the context's pc
    fn run(op: u16, context: &Context) -> Result<Context> {
        let mut fetched = *context;
        fetched.advance()?;
        Instruction::decode(op, context.pc)?.execute(&fetched, MachineCodePolicy::Ignore)
    }

    #[test]
    fn test_decode_fields() {
        let ins = Instruction::decode(0xD12F, 0x204).unwrap();
        assert_eq!(ins.kind, InstructionKind::DrawSprite);
        assert_eq!((ins.segment, ins.x, ins.y, ins.n), (0xD, 0x1, 0x2, 0xF));
        assert_eq!((ins.nn, ins.nnn, ins.pc), (0x2F, 0x12F, 0x204));
    }

    #[test]
    fn test_decode_overloaded_segments() {
        let cases = [
            (0x00E0, InstructionKind::ClearScreen),
            (0x00EE, InstructionKind::Return),
            (0x0123, InstructionKind::CallMachineCode),
            (0x812E, InstructionKind::ShiftLeft),
            (0x8127, InstructionKind::ReverseSubtract),
            (0xE39E, InstructionKind::SkipIfKeyPressed),
            (0xE3A1, InstructionKind::SkipIfKeyNotPressed),
            (0xF30A, InstructionKind::WaitForKey),
            (0xF365, InstructionKind::LoadRegisters),
        ];
        for (op, kind) in cases.iter() {
            assert_eq!(Instruction::decode(*op, 0x200).unwrap().kind, *kind);
        }
    }

    #[test]
    fn test_decode_ignores_low_nibble_of_register_skips() {
        assert_eq!(
            Instruction::decode(0x5121, 0x200).unwrap().kind,
            InstructionKind::SkipIfEqualRegister
        );
        assert_eq!(
            Instruction::decode(0x912F, 0x200).unwrap().kind,
            InstructionKind::SkipIfNotEqualRegister
        );
    }

    #[test]
    fn test_decode_unknown_opcodes() {
        for op in [0x8008_u16, 0x800F, 0xE19F, 0xEAA2, 0xF000, 0xF1FF, 0xF256].iter() {
            match Instruction::decode(*op, 0x2AE) {
                Err(Error::UnknownOpcode {
                    opcode,
                    segment,
                    pc,
                }) => {
                    assert_eq!(opcode, *op);
                    assert_eq!(segment, (*op >> 12) as u8);
                    assert_eq!(pc, 0x2AE);
                }
                other => panic!("{:04X} decoded to {:?}", op, other),
            }
        }
    }

    #[test]
    fn test_0nnn_sys_is_ignored() {
        let state = run(0x0123, &context()).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_0nnn_sys_rejected() {
        let context = context();
        let mut fetched = context;
        fetched.advance().unwrap();
        let ins = Instruction::decode(0x0123, context.pc).unwrap();
        assert!(matches!(
            ins.execute(&fetched, MachineCodePolicy::Reject),
            Err(Error::Unsupported {
                opcode: 0x0123,
                pc: 0x200
            })
        ));
    }

    #[test]
    fn test_00e0_cls() {
        let mut state = context();
        state.frame_buffer[0][0] = 1;
        state.frame_buffer[31][63] = 1;
        let state = run(0x00E0, &state).unwrap();
        assert!(state.frame_buffer.iter().flatten().all(|&px| px == 0));
        assert!(state.draw_flag);
    }

    #[test]
    fn test_00ee_ret() {
        let mut state = context();
        state.sp = 0x1;
        state.stack[state.sp as usize] = 0x0ABC;
        let state = run(0x00EE, &state).unwrap();
        assert_eq!(state.sp, 0x0);
        assert_eq!(state.pc, 0x0ABC);
    }

    #[test]
    fn test_00ee_ret_underflows() {
        assert!(matches!(
            run(0x00EE, &context()),
            Err(Error::StackUnderflow { pc: 0x200 })
        ));
    }

    #[test]
    fn test_1nnn_jp() {
        let state = run(0x1ABC, &context()).unwrap();
        assert_eq!(state.pc, 0x0ABC);
    }

    #[test]
    fn test_2nnn_call() {
        let mut state = context();
        state.pc = 0x0ABC;
        let state = run(0x2123, &state).unwrap();
        assert_eq!(state.sp, 0x1);
        // The return address is the instruction after the call
        assert_eq!(state.stack[state.sp as usize], 0x0ABE);
        assert_eq!(state.pc, 0x0123);
    }

    #[test]
    fn test_2nnn_call_then_ret() {
        let state = run(0x2400, &context()).unwrap();
        let state = run(0x00EE, &state).unwrap();
        assert_eq!(state.pc, 0x0202);
        assert_eq!(state.sp, 0x0);
    }

    #[test]
    fn test_2nnn_call_overflows() {
        let mut state = context();
        for _ in 0..15 {
            state = run(0x2200, &state).unwrap();
        }
        assert_eq!(state.sp, 15);
        assert!(matches!(
            run(0x2200, &state),
            Err(Error::StackOverflow { pc: 0x200 })
        ));
    }

    #[test]
    fn test_3xnn_se_skips() {
        let mut state = context();
        state.v[0x1] = 0x11;
        let state = run(0x3111, &state).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_3xnn_se_doesntskip() {
        let state = run(0x3111, &context()).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_4xnn_sne_skips() {
        let state = run(0x4111, &context()).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_4xnn_sne_doesntskip() {
        let mut state = context();
        state.v[0x1] = 0x11;
        let state = run(0x4111, &state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_5xy0_se_skips() {
        let mut state = context();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = run(0x5120, &state).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_5xy0_se_doesntskip() {
        let mut state = context();
        state.v[0x1] = 0x11;
        let state = run(0x5120, &state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_skip_past_end_of_memory_overflows() {
        let mut state = context();
        state.pc = 0xFFE;
        assert!(matches!(
            run(0x3000, &state),
            Err(Error::ProgramCounterOverflow { pc: 0x1000 })
        ));
    }

    #[test]
    fn test_6xnn_ld() {
        let state = run(0x6A3C, &context()).unwrap();
        assert_eq!(state.v[0xA], 0x3C);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_7xnn_add_wraps_without_flag() {
        let mut state = context();
        state.v[0x1] = 0xFF;
        state.v[0xF] = 0x7;
        let state = run(0x7102, &state).unwrap();
        assert_eq!(state.v[0x1], 0x01);
        assert_eq!(state.v[0xF], 0x7);
    }

    #[test]
    fn test_8xy0_ld() {
        let mut state = context();
        state.v[0x2] = 0x1;
        let state = run(0x8120, &state).unwrap();
        assert_eq!(state.v[0x1], 0x1);
    }

    #[test]
    fn test_8xy1_8xy2_8xy3_bitwise() {
        let mut state = context();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        assert_eq!(run(0x8121, &state).unwrap().v[0x1], 0x7);
        assert_eq!(run(0x8122, &state).unwrap().v[0x1], 0x2);
        assert_eq!(run(0x8123, &state).unwrap().v[0x1], 0x5);
    }

    #[test]
    fn test_8xy4_add_nocarry() {
        let mut state = context();
        state.v[0x1] = 0xEE;
        state.v[0x2] = 0x11;
        let state = run(0x8124, &state).unwrap();
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy4_add_carry() {
        let mut state = context();
        state.v[0x1] = 0xFF;
        state.v[0x2] = 0x11;
        let state = run(0x8124, &state).unwrap();
        assert_eq!(state.v[0x1], 0x10);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy5_sub_noborrow() {
        let mut state = context();
        state.v[0x1] = 0x33;
        state.v[0x2] = 0x11;
        let state = run(0x8125, &state).unwrap();
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy5_sub_equal_is_noborrow() {
        let mut state = context();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = run(0x8125, &state).unwrap();
        assert_eq!(state.v[0x1], 0x00);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy5_sub_borrow() {
        let mut state = context();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x12;
        let state = run(0x8125, &state).unwrap();
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy6_shr_lsb() {
        let mut state = context();
        state.v[0x1] = 0x5;
        let state = run(0x8106, &state).unwrap();
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy6_shr_nolsb() {
        let mut state = context();
        state.v[0x1] = 0x4;
        let state = run(0x8106, &state).unwrap();
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy7_subn_noborrow() {
        let mut state = context();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x33;
        let state = run(0x8127, &state).unwrap();
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_borrow() {
        let mut state = context();
        state.v[0x1] = 0x12;
        state.v[0x2] = 0x11;
        let state = run(0x8127, &state).unwrap();
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_msb() {
        let mut state = context();
        state.v[0x1] = 0xFF;
        let state = run(0x810E, &state).unwrap();
        assert_eq!(state.v[0x1], 0xFE);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xye_shl_nomsb() {
        let mut state = context();
        state.v[0x1] = 0x4;
        let state = run(0x810E, &state).unwrap();
        assert_eq!(state.v[0x1], 0x8);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy_flag_computed_from_operands_before_write() {
        // VF as the source operand: the flag must come from the old VF value
        let mut state = context();
        state.v[0x1] = 0x01;
        state.v[0xF] = 0x02;
        let state = run(0x81F5, &state).unwrap();
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy_result_overwrites_flag_when_x_is_f() {
        let mut state = context();
        state.v[0xF] = 0x81;
        let state = run(0x8F06, &state).unwrap();
        assert_eq!(state.v[0xF], 0x40);
    }

    #[test]
    fn test_9xy0_sne_skips() {
        let mut state = context();
        state.v[0x1] = 0x11;
        let state = run(0x9120, &state).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_9xy0_sne_doesntskip() {
        let mut state = context();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = run(0x9120, &state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_annn_ld() {
        let state = run(0xAABC, &context()).unwrap();
        assert_eq!(state.i, 0xABC);
    }

    #[test]
    fn test_bnnn_jp() {
        let mut state = context();
        state.v[0x0] = 0x2;
        let state = run(0xBABC, &state).unwrap();
        assert_eq!(state.pc, 0xABE);
    }

    #[test]
    fn test_cxnn_rnd_masks() {
        let state = run(0xC100, &context()).unwrap();
        assert_eq!(state.v[0x1], 0x0);
        for _ in 0..32 {
            let state = run(0xC10F, &context()).unwrap();
            assert!(state.v[0x1] <= 0x0F);
        }
    }

    #[test]
    fn test_dxyn_drw_draws() {
        let mut state = context();
        state.v[0x0] = 0x1;
        // Draw the 0x0 glyph with a 1x 1y offset
        let state = run(0xD005, &state).unwrap();
        let mut expected = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        expected[1][1..5].copy_from_slice(&[1, 1, 1, 1]);
        expected[2][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[3][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[4][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[5][1..5].copy_from_slice(&[1, 1, 1, 1]);
        assert_eq!(state.frame_buffer, expected);
        assert_eq!(state.v[0xF], 0x0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_dxyn_drw_collides() {
        let mut state = context();
        state.frame_buffer[0][0] = 1;
        let state = run(0xD001, &state).unwrap();
        assert_eq!(state.v[0xF], 0x1);
        assert_eq!(state.frame_buffer[0][0], 0);
    }

    #[test]
    fn test_dxyn_drw_xors() {
        let mut state = context();
        state.v[0x0] = 0x2;
        state.memory[0x300] = 0b1100_0000;
        state.i = 0x300;
        state.frame_buffer[0][2..6].copy_from_slice(&[0, 1, 0, 1]);
        let state = run(0xD011, &state).unwrap();
        assert_eq!(state.frame_buffer[0][2..6], [1, 0, 0, 1]);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_dxyn_drw_twice_restores() {
        let mut state = context();
        state.v[0x3] = 0x3C;
        state.v[0x4] = 0x1E;
        state.i = 0x1E; // the 0x6 glyph
        let before = state.frame_buffer;
        let state = run(0xD345, &state).unwrap();
        assert_ne!(state.frame_buffer, before);
        let state = run(0xD345, &state).unwrap();
        assert_eq!(state.frame_buffer, before);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_dxyn_drw_wraps() {
        let mut state = context();
        state.v[0x0] = 62;
        state.v[0x1] = 31;
        state.memory[0x300..0x302].copy_from_slice(&[0xFF, 0x80]);
        state.i = 0x300;
        let state = run(0xD012, &state).unwrap();
        assert_eq!(state.frame_buffer[31][62..64], [1, 1]);
        assert_eq!(state.frame_buffer[31][0..6], [1, 1, 1, 1, 1, 1]);
        assert_eq!(state.frame_buffer[0][62], 1);
        assert_eq!(state.frame_buffer[0][63], 0);
    }

    #[test]
    fn test_dxyn_drw_coordinates_wrap_modulo_screen() {
        let mut state = context();
        state.v[0x0] = 64 + 3;
        state.v[0x1] = 32 + 2;
        state.memory[0x300] = 0x80;
        state.i = 0x300;
        let state = run(0xD011, &state).unwrap();
        assert_eq!(state.frame_buffer[2][3], 1);
    }

    #[test]
    fn test_dxyn_drw_reads_out_of_bounds() {
        let mut state = context();
        state.i = 0xFFE;
        assert!(matches!(
            run(0xD003, &state),
            Err(Error::OutOfBounds { address: 0xFFE, len: 3 })
        ));
    }

    #[test]
    fn test_annn_then_dxyn_toggles_memory_byte() {
        let mut state = context();
        state.memory[0x123] = 0b1010_0101;
        state.v[0x0] = 0x8;
        state.v[0x1] = 0x4;
        let state = run(0xA123, &state).unwrap();
        let state = run(0xD015, &state).unwrap();
        assert_eq!(state.frame_buffer[4][8..16], [1, 0, 1, 0, 0, 1, 0, 1]);
        let lit: usize = state
            .frame_buffer
            .iter()
            .flatten()
            .map(|&px| px as usize)
            .sum();
        assert_eq!(lit, 4);
    }

    #[test]
    fn test_ex9e_skp_skips() {
        let mut state = context();
        state.keys[0xE] = true;
        state.v[0x1] = 0xE;
        let state = run(0xE19E, &state).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_ex9e_skp_doesntskip() {
        let state = run(0xE19E, &context()).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_exa1_sknp_skips() {
        let state = run(0xE1A1, &context()).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_exa1_sknp_doesntskip() {
        let mut state = context();
        state.keys[0xE] = true;
        state.v[0x1] = 0xE;
        let state = run(0xE1A1, &state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx07_ld() {
        let mut state = context();
        state.delay_timer = 0xF;
        let state = run(0xF107, &state).unwrap();
        assert_eq!(state.v[0x1], 0xF);
    }

    #[test]
    fn test_fx0a_waits_without_key() {
        let state = run(0xF10A, &context()).unwrap();
        assert_eq!(state.pc, 0x0200);
        let state = run(0xF10A, &state).unwrap();
        assert_eq!(state.pc, 0x0200);
    }

    #[test]
    fn test_fx0a_takes_lowest_key() {
        let mut state = context();
        state.keys[0x9] = true;
        state.keys[0x4] = true;
        let state = run(0xF10A, &state).unwrap();
        assert_eq!(state.v[0x1], 0x4);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx15_ld() {
        let mut state = context();
        state.v[0x1] = 0xF;
        let state = run(0xF115, &state).unwrap();
        assert_eq!(state.delay_timer, 0xF);
    }

    #[test]
    fn test_fx18_ld() {
        let mut state = context();
        state.v[0x1] = 0xF;
        let state = run(0xF118, &state).unwrap();
        assert_eq!(state.sound_timer, 0xF);
    }

    #[test]
    fn test_fx1e_add() {
        let mut state = context();
        state.i = 0x1;
        state.v[0x1] = 0x1;
        let state = run(0xF11E, &state).unwrap();
        assert_eq!(state.i, 0x2);
    }

    #[test]
    fn test_fx1e_add_leaves_flag() {
        let mut state = context();
        state.i = 0x0FFF;
        state.v[0x1] = 0x2;
        let state = run(0xF11E, &state).unwrap();
        assert_eq!(state.i, 0x1001);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_fx29_ld() {
        let mut state = context();
        state.v[0x1] = 0x2;
        let state = run(0xF129, &state).unwrap();
        assert_eq!(state.i, 0xA);
    }

    #[test]
    fn test_fx29_ld_masks_high_nibble() {
        let mut state = context();
        state.v[0x1] = 0xAF;
        let state = run(0xF129, &state).unwrap();
        assert_eq!(state.i, 0x4B);
    }

    #[test]
    fn test_fx33_ld() {
        let mut state = context();
        // 0x7B -> 123
        state.v[0x1] = 0x7B;
        state.i = 0x300;
        let state = run(0xF133, &state).unwrap();
        assert_eq!(state.memory[0x300..0x303], [0x1, 0x2, 0x3]);
    }

    #[test]
    fn test_fx33_ld_out_of_bounds() {
        let mut state = context();
        state.i = 0xFFE;
        assert!(matches!(
            run(0xF133, &state),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_fx55_ld() {
        let mut state = context();
        state.i = 0x300;
        state.v[0x0..0x5].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5]);
        let state = run(0xF455, &state).unwrap();
        assert_eq!(state.memory[0x300..0x306], [0x1, 0x2, 0x3, 0x4, 0x5, 0x0]);
        assert_eq!(state.i, 0x300);
    }

    #[test]
    fn test_fx65_ld() {
        let mut state = context();
        state.i = 0x300;
        state.memory[0x300..0x306].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5, 0x6]);
        let state = run(0xF465, &state).unwrap();
        assert_eq!(state.v[0x0..0x6], [0x1, 0x2, 0x3, 0x4, 0x5, 0x0]);
        assert_eq!(state.i, 0x300);
    }

    #[test]
    fn test_fx65_ld_out_of_bounds() {
        let mut state = context();
        state.i = 0xFFF;
        assert!(matches!(
            run(0xF165, &state),
            Err(Error::OutOfBounds {
                address: 0xFFF,
                len: 2
            })
        ));
    }
}
