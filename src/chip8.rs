use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{error, info};

use crate::config::Config;
use crate::constants::{FONT_SET, FONT_START, MAX_ROM_SIZE, PROGRAM_START};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::host::{Keypad, Observer};
use crate::instruction::Instruction;

/// Everything the emulation thread owns while the machine runs.
/// Handed to the thread on `start` and handed back on `stop`.
struct Machine {
    context: Context,
    keypad: Box<dyn Keypad>,
    observers: Vec<Box<dyn Observer>>,
    config: Config,
    /// Whether the pc has been sent to the program start since the last ROM was loaded
    started: bool,
}

impl Machine {
    fn begin(&mut self) {
        if !self.started {
            self.context.pc = PROGRAM_START;
            self.started = true;
        }
    }

    /// A single cycle:
    /// - refresh the keys
    /// - fetch, decode and execute one instruction
    /// - notify observers of the update, and of a new frame if one was drawn
    /// - tick the timers, signalling sound while the sound timer runs
    ///
    /// If the instruction fails nothing but the key refresh is committed.
    fn cycle(&mut self) -> Result<()> {
        self.context.refresh_keys(self.keypad.keys());

        let mut fetched = self.context;
        let pc = fetched.pc;
        let opcode = fetched.fetch()?;
        let instruction = Instruction::decode(opcode, pc)?;
        self.context = instruction.execute(&fetched, self.config.machine_code)?;

        for observer in self.observers.iter_mut() {
            observer.on_update(&self.context);
        }
        if self.context.draw_flag {
            for observer in self.observers.iter_mut() {
                observer.on_frame(&self.context);
            }
            self.context.draw_flag = false;
        }

        self.context.tick_timers();
        if self.context.sound_timer > 0 {
            for observer in self.observers.iter_mut() {
                observer.on_sound(&self.context);
            }
        }
        Ok(())
    }

    /// Cycles until `running` is cleared or a cycle fails, pacing each cycle to the frame time.
    /// Slow cycles aren't made up for; the next one simply starts late.
    fn run(mut self, running: &AtomicBool) -> (Self, Result<()>) {
        self.begin();
        for observer in self.observers.iter_mut() {
            observer.on_start(&self.context);
        }

        let frame_time = self.config.frame_time();
        let mut result = Ok(());
        while running.load(Ordering::Acquire) {
            let cycle_start = Instant::now();
            if let Err(e) = self.cycle() {
                error!("halting: {}", e);
                for observer in self.observers.iter_mut() {
                    observer.on_fault(&e);
                }
                result = Err(e);
                break;
            }
            let elapsed = cycle_start.elapsed();
            if frame_time > elapsed {
                thread::sleep(frame_time - elapsed);
            }
        }

        for observer in self.observers.iter_mut() {
            observer.on_stop(&self.context);
        }
        (self, result)
    }
}

type Worker = JoinHandle<Option<(Machine, Result<()>)>>;

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Runs the fetch/decode/execute cycle on a dedicated thread at a fixed frame rate.
/// While running that thread exclusively owns the machine state, the keypad and the
/// observers; they come back when the machine is stopped.
///
/// Supplies interfaces for:
/// - loading roms
/// - subscribing observers for frames, sound and lifecycle events
/// - starting and stopping the cycle thread
/// - stepping single cycles while stopped
/// - inspecting the machine state while stopped
pub struct Chip8 {
    /// `None` while the cycle thread owns the machine
    machine: Option<Machine>,
    running: Arc<AtomicBool>,
    worker: Option<Worker>,
}

impl Chip8 {
    pub fn new(config: Config, keypad: impl Keypad + 'static) -> Self {
        Chip8 {
            machine: Some(Machine {
                context: Context::new(),
                keypad: Box::new(keypad),
                observers: Vec::new(),
                config,
                started: false,
            }),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    fn machine_mut(&mut self) -> Result<&mut Machine> {
        self.machine.as_mut().ok_or(Error::AlreadyRunning)
    }

    /// Adds an observer; observers are notified in the order they subscribed
    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> Result<()> {
        self.machine_mut()?.observers.push(Box::new(observer));
        Ok(())
    }

    /// Resets the machine and loads the font and `rom`.
    /// The next start (or step) begins execution at the program start.
    pub fn initialize(&mut self, rom: &[u8]) -> Result<()> {
        let machine = self.machine_mut()?;
        if rom.len() > MAX_ROM_SIZE {
            return Err(Error::InvalidRom {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        machine.context.reset();
        machine.context.load(&FONT_SET, FONT_START as usize)?;
        machine.context.load(rom, PROGRAM_START as usize)?;
        machine.started = false;
        info!("loaded ROM [size: {}]", rom.len());
        Ok(())
    }

    /// Spawns the cycle thread
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() || self.machine.is_none() {
            return Err(Error::AlreadyRunning);
        }

        // The machine only leaves once the thread exists, so a failed spawn loses nothing
        let (handoff, receiver) = mpsc::channel::<Machine>();
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);
        let worker = thread::Builder::new()
            .name("chip8".to_string())
            .spawn(move || {
                receiver
                    .recv()
                    .ok()
                    .map(|machine| machine.run(&running))
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                Error::from(e)
            })?;

        if let Some(machine) = self.machine.take() {
            if let Err(mpsc::SendError(machine)) = handoff.send(machine) {
                self.machine = Some(machine);
                self.running.store(false, Ordering::Release);
                return Err(Error::AlreadyStopped);
            }
        }
        self.worker = Some(worker);
        info!("started");
        Ok(())
    }

    /// Signals the cycle thread to stop and waits for it to finish its current cycle.
    /// No instruction executes after this returns.
    ///
    /// Returns the error that halted the machine, if one did.
    pub fn stop(&mut self) -> Result<()> {
        let worker = self.worker.take().ok_or(Error::AlreadyStopped)?;
        self.running.store(false, Ordering::Release);
        match worker.join() {
            Ok(Some((machine, result))) => {
                self.machine = Some(machine);
                info!("stopped");
                result
            }
            Ok(None) => Err(Error::AlreadyStopped),
            Err(cause) => panic::resume_unwind(cause),
        }
    }

    /// Runs exactly one cycle on the calling thread, without pacing.
    /// Only possible while stopped.
    pub fn step(&mut self) -> Result<()> {
        let machine = self.machine_mut()?;
        machine.begin();
        machine.cycle()
    }

    /// Whether the cycle thread is running or has halted without being stopped yet
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the cycle thread has exited on its own after a fault; `stop` reports the fault
    pub fn is_halted(&self) -> bool {
        self.worker.as_ref().map_or(false, JoinHandle::is_finished)
    }

    /// The machine state, only available while stopped
    pub fn context(&self) -> Option<&Context> {
        self.machine.as_ref().map(|machine| &machine.context)
    }
}

impl Drop for Chip8 {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.running.store(false, Ordering::Release);
            let _ = worker.join();
        }
    }
}
