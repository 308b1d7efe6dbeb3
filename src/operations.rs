use log::warn;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_GLYPH_SIZE, FONT_START, SPRITE_WIDTH, STACK_SIZE,
};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::instruction::Instruction;

/// Every operation receives the context with its pc already moved past the current opcode
pub type Operation = fn(ins: &Instruction, context: &Context) -> Result<Context>;

/// Moves the pc past the next instruction when `condition` holds
fn skip_if(condition: bool, context: &Context) -> Result<Context> {
    let mut next = *context;
    if condition {
        next.advance()?;
    }
    Ok(next)
}

/// Vx = value
fn with_vx(ins: &Instruction, context: &Context, value: u8) -> Result<Context> {
    let mut v = context.v;
    v[ins.x] = value;
    Ok(Context { v, ..*context })
}

/// VF = flag; Vx = value
/// VF is written first so the result wins when x is F
fn with_vx_flag(ins: &Instruction, context: &Context, value: u8, flag: bool) -> Result<Context> {
    let mut v = context.v;
    v[0xF] = u8::from(flag);
    v[ins.x] = value;
    Ok(Context { v, ..*context })
}

/// sys addr
/// Routines for the host CPU can't run here, so this only moves on
pub fn call_machine_code(ins: &Instruction, context: &Context) -> Result<Context> {
    warn!(
        "ignoring machine code routine {:#05X} at {:#06X}",
        ins.nnn, ins.pc
    );
    Ok(*context)
}

/// clear
pub fn clear_screen(_ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*context
    })
}

/// PC = STACK.pop()
pub fn ret(ins: &Instruction, context: &Context) -> Result<Context> {
    if context.sp == 0 {
        return Err(Error::StackUnderflow { pc: ins.pc });
    }
    Ok(Context {
        pc: context.stack[context.sp as usize],
        sp: context.sp - 1,
        ..*context
    })
}

/// PC = addr
pub fn jump(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        pc: ins.nnn,
        ..*context
    })
}

/// STACK.push(PC); PC = addr
/// Slot 0 is never written; the stack holds at most 15 return addresses
pub fn call(ins: &Instruction, context: &Context) -> Result<Context> {
    if context.sp as usize >= STACK_SIZE - 1 {
        return Err(Error::StackOverflow { pc: ins.pc });
    }
    let sp = context.sp + 1;
    let mut stack = context.stack;
    stack[sp as usize] = context.pc;
    Ok(Context {
        pc: ins.nnn,
        sp,
        stack,
        ..*context
    })
}

/// if Vx == nn then skip
pub fn skip_eq(ins: &Instruction, context: &Context) -> Result<Context> {
    skip_if(context.v[ins.x] == ins.nn, context)
}

/// if Vx != nn then skip
pub fn skip_ne(ins: &Instruction, context: &Context) -> Result<Context> {
    skip_if(context.v[ins.x] != ins.nn, context)
}

/// if Vx == Vy then skip
pub fn skip_eq_reg(ins: &Instruction, context: &Context) -> Result<Context> {
    skip_if(context.v[ins.x] == context.v[ins.y], context)
}

/// if Vx != Vy then skip
pub fn skip_ne_reg(ins: &Instruction, context: &Context) -> Result<Context> {
    skip_if(context.v[ins.x] != context.v[ins.y], context)
}

/// Vx = nn
pub fn load(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, ins.nn)
}

/// Vx += nn
/// Overflow wraps and VF is left alone
pub fn add(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, context.v[ins.x].wrapping_add(ins.nn))
}

/// Vx = Vy
pub fn mv(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, context.v[ins.y])
}

/// Vx |= Vy
pub fn or(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, context.v[ins.x] | context.v[ins.y])
}

/// Vx &= Vy
pub fn and(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, context.v[ins.x] & context.v[ins.y])
}

/// Vx ^= Vy
pub fn xor(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, context.v[ins.x] ^ context.v[ins.y])
}

/// Vx += Vy; VF = carry
pub fn add_reg(ins: &Instruction, context: &Context) -> Result<Context> {
    let (res, carry) = context.v[ins.x].overflowing_add(context.v[ins.y]);
    with_vx_flag(ins, context, res, carry)
}

/// Vx -= Vy; VF = !borrow
pub fn sub(ins: &Instruction, context: &Context) -> Result<Context> {
    let (vx, vy) = (context.v[ins.x], context.v[ins.y]);
    with_vx_flag(ins, context, vx.wrapping_sub(vy), vx >= vy)
}

/// Vx >>= 1; VF = lsb
pub fn shr(ins: &Instruction, context: &Context) -> Result<Context> {
    let vx = context.v[ins.x];
    with_vx_flag(ins, context, vx >> 1, vx & 0x1 == 0x1)
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(ins: &Instruction, context: &Context) -> Result<Context> {
    let (vx, vy) = (context.v[ins.x], context.v[ins.y]);
    with_vx_flag(ins, context, vy.wrapping_sub(vx), vy >= vx)
}

/// Vx <<= 1; VF = msb
pub fn shl(ins: &Instruction, context: &Context) -> Result<Context> {
    let vx = context.v[ins.x];
    with_vx_flag(ins, context, vx << 1, vx & 0x80 == 0x80)
}

/// I = addr
pub fn load_i(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        i: ins.nnn,
        ..*context
    })
}

/// PC = V0 + addr
pub fn jump_v0(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        pc: u16::from(context.v[0x0]) + ins.nnn,
        ..*context
    })
}

/// Vx = rand_byte & nn
pub fn rand(ins: &Instruction, context: &Context) -> Result<Context> {
    let rand_byte: u8 = rand::random();
    with_vx(ins, context, rand_byte & ins.nn)
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite at memory i..i+n onto the FrameBuffer at (Vx, Vy), wrapping at the edges.
/// VF is set if any lit pixel gets erased.
pub fn draw(ins: &Instruction, context: &Context) -> Result<Context> {
    let origin_x = context.v[ins.x] as usize % DISPLAY_WIDTH;
    let origin_y = context.v[ins.y] as usize % DISPLAY_HEIGHT;
    let sprite = context.slice(context.i as usize, ins.n as usize)?;

    let mut frame_buffer = context.frame_buffer;
    let mut collision = 0x0;
    for (row, byte) in sprite.iter().enumerate() {
        let y = (origin_y + row) % DISPLAY_HEIGHT;
        for bit in 0..SPRITE_WIDTH {
            let x = (origin_x + bit) % DISPLAY_WIDTH;
            let pixel = (byte >> (7 - bit)) & 0x1;
            collision |= pixel & frame_buffer[y][x];
            frame_buffer[y][x] ^= pixel;
        }
    }

    let mut v = context.v;
    v[0xF] = collision;
    Ok(Context {
        v,
        frame_buffer,
        draw_flag: true,
        ..*context
    })
}

/// if Vx.pressed then skip
pub fn skip_pressed(ins: &Instruction, context: &Context) -> Result<Context> {
    skip_if(context.keys[(context.v[ins.x] & 0xF) as usize], context)
}

/// if !Vx.pressed then skip
pub fn skip_not_pressed(ins: &Instruction, context: &Context) -> Result<Context> {
    skip_if(!context.keys[(context.v[ins.x] & 0xF) as usize], context)
}

/// Vx = DT
pub fn load_delay(ins: &Instruction, context: &Context) -> Result<Context> {
    with_vx(ins, context, context.delay_timer)
}

/// Vx = first held key, or retry this instruction next cycle
pub fn wait_key(ins: &Instruction, context: &Context) -> Result<Context> {
    match context.keys.iter().position(|&held| held) {
        Some(key) => with_vx(ins, context, key as u8),
        None => {
            let mut next = *context;
            next.rewind()?;
            Ok(next)
        }
    }
}

/// DT = Vx
pub fn set_delay(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        delay_timer: context.v[ins.x],
        ..*context
    })
}

/// ST = Vx
pub fn set_sound(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        sound_timer: context.v[ins.x],
        ..*context
    })
}

/// I += Vx
/// Unlike some interpreters VF is never touched here
pub fn add_i(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        i: context.i.wrapping_add(u16::from(context.v[ins.x])),
        ..*context
    })
}

/// I = address of the font glyph for the low nibble of Vx
pub fn load_glyph(ins: &Instruction, context: &Context) -> Result<Context> {
    Ok(Context {
        i: FONT_START + FONT_GLYPH_SIZE * u16::from(context.v[ins.x] & 0xF),
        ..*context
    })
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(ins: &Instruction, context: &Context) -> Result<Context> {
    let value = context.v[ins.x];
    let mut next = *context;
    next.slice_mut(context.i as usize, 3)?
        .copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
    Ok(next)
}

/// mem[I..=I+x] = V0..=Vx
pub fn store(ins: &Instruction, context: &Context) -> Result<Context> {
    let mut next = *context;
    next.slice_mut(context.i as usize, ins.x + 1)?
        .copy_from_slice(&context.v[..=ins.x]);
    Ok(next)
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(ins: &Instruction, context: &Context) -> Result<Context> {
    let mut v = context.v;
    v[..=ins.x].copy_from_slice(context.slice(context.i as usize, ins.x + 1)?);
    Ok(Context { v, ..*context })
}
