use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context as _};
use log::{debug, info, warn};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chip8vm::{Chip8, Config, Context, Error, FrameBuffer, Keypad, Keys, Observer};
use display::Display;

use crate::keymap::keymap;

/// Key state shared between the SDL event loop and the emulation thread
#[derive(Clone, Default)]
struct SharedKeys(Arc<Mutex<Keys>>);

impl SharedKeys {
    fn set(&self, key: usize, pressed: bool) {
        let mut keys = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        keys[key] = pressed;
    }
}

impl Keypad for SharedKeys {
    fn keys(&mut self) -> Keys {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Forwards frames to the SDL thread, which owns the window
struct FrameForwarder {
    frames: Sender<FrameBuffer>,
}

impl Observer for FrameForwarder {
    fn on_start(&mut self, _context: &Context) {
        info!("ROM running");
    }

    fn on_frame(&mut self, context: &Context) {
        // The receiver only goes away once the window has closed
        let _ = self.frames.send(context.frame_buffer);
    }

    fn on_sound(&mut self, context: &Context) {
        debug!("beep [sound timer: {}]", context.sound_timer);
    }

    fn on_fault(&mut self, error: &Error) {
        warn!("emulation halted: {}", error);
    }
}

pub struct Options {
    pub rom: PathBuf,
    pub config: Config,
    pub scale: u32,
}

pub fn run(options: Options) -> anyhow::Result<()> {
    let rom = std::fs::read(&options.rom)
        .with_context(|| format!("unable to read ROM {}", options.rom.display()))?;

    let keys = SharedKeys::default();
    let (frames, received): (Sender<FrameBuffer>, Receiver<FrameBuffer>) = mpsc::channel();
    let mut chip8 = Chip8::new(options.config, keys.clone());
    chip8.subscribe(FrameForwarder { frames })?;
    chip8.initialize(&rom)?;
    info!("successfully loaded ROM {}", options.rom.display());

    // Get SDL2 context
    let sdl = sdl2::init().map_err(|e| anyhow!(e))?;
    let mut display = Display::new(&sdl, "Emu-8", options.scale)?;
    let mut events = sdl.event_pump().map_err(|e| anyhow!(e))?;

    chip8.start()?;
    let frame_time = options.config.frame_time();

    'event: loop {
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(index) = keymap(key) {
                        keys.set(index, true);
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(index) = keymap(key) {
                        keys.set(index, false);
                    }
                }
                _ => continue,
            }
        }

        if chip8.is_halted() {
            break 'event;
        }

        // Only the most recent frame is worth drawing
        if let Ok(frame) = received.recv_timeout(frame_time) {
            let latest = received.try_iter().last().unwrap_or(frame);
            display.render(&latest)?;
        }
    }

    // Covers both a clean stop and whatever halted the machine
    match chip8.stop() {
        Ok(()) | Err(Error::AlreadyStopped) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
