/// # interpreter
///
/// The machine state a CHIP-8 program can observe, and the engine that
/// advances it one instruction at a time:
///
///  * 16 8-bit registers V0-VF (VF doubles as the carry/borrow/erasure
///    flag by convention)
///  * 16-bit I pointer and program counter (programs start at 0x200)
///  * 16-deep return stack
///  * 64x32 monochrome framebuffer with a host-consumed dirty flag
///  * 16-key input latch, written by the host, read by the key opcodes
///  * delay and sound timers decaying at wall-clock 60Hz, however fast or
///    slow the host drives `step`
///
/// The host owns the cadence: each `step` call is one fetch/decode/execute
/// plus one timer-decay check, nothing blocks, and "wait for key" is a
/// polling retry across steps rather than a suspension within one.
use crate::display::{FrameBuffer, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};
use crate::error::Chip8Error;
use crate::memory::Chip8MemoryMap;
use rand::rngs::ThreadRng;
use rand::Rng;
use std::time::{Duration, Instant};

/// how many return addresses fit on the stack
const CHIP8_STACK_DEPTH: usize = 16;

/// how many keys the hex pad has
const CHIP8_KEY_COUNT: usize = 16;

/// one 60Hz timer tick, rounded up to whole milliseconds
const CHIP8_TIMER_TICK: Duration = Duration::from_millis(17);

/// each glyph in the font table is this many bytes tall
const CHIP8_GLYPH_SIZE: u16 = 5;

/// source of bytes for the RND instruction. injectable so tests can supply
/// a scripted sequence instead of real entropy.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

/// default RandomSource, seeded non-deterministically per thread
pub struct ThreadRandom {
    rng: ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        ThreadRandom {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

/// the engine's two observable modes. only Fx0A enters WaitingForKey; the
/// payload is the register the key index lands in once one is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Running,
    WaitingForKey(u8),
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    v: [u8; 16],
    i: u16,
    program_counter: u16,
    stack: [u16; CHIP8_STACK_DEPTH],
    stack_pointer: u8,
    framebuffer: FrameBuffer,
    draw_pending: bool,
    key: [bool; CHIP8_KEY_COUNT],
    delay_timer: u8,
    sound_timer: u8,
    mode: Mode,
    random: Box<dyn RandomSource>,
    last_timer_update: Instant,
}

impl Chip8Interpreter {
    pub fn new() -> Self {
        Self::with_random(Box::new(ThreadRandom::new()))
    }

    /// build an interpreter around a specific random source
    pub fn with_random(random: Box<dyn RandomSource>) -> Self {
        let memory = Chip8MemoryMap::new();
        let program_counter = memory.program_addr;
        Chip8Interpreter {
            memory,
            v: [0; 16],
            i: 0,
            program_counter,
            stack: [0; CHIP8_STACK_DEPTH],
            stack_pointer: 0,
            framebuffer: FrameBuffer::new(),
            draw_pending: false,
            key: [false; CHIP8_KEY_COUNT],
            delay_timer: 0,
            sound_timer: 0,
            mode: Mode::Running,
            random,
            last_timer_update: Instant::now(),
        }
    }

    /// back to power-on state: RAM rezeroed (glyph table reloaded),
    /// registers, stack, screen, keys and timers cleared, PC at 0x200
    pub fn reset(&mut self) {
        self.memory.reset();
        self.v = [0; 16];
        self.i = 0;
        self.program_counter = self.memory.program_addr;
        self.stack = [0; CHIP8_STACK_DEPTH];
        self.stack_pointer = 0;
        self.framebuffer.clear();
        self.draw_pending = false;
        self.key = [false; CHIP8_KEY_COUNT];
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.mode = Mode::Running;
        self.last_timer_update = Instant::now();
    }

    /// load a chip-8 program image at 0x200
    pub fn load(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_program(program)
    }

    /// one unit of work: execute one instruction (or re-poll the key latch
    /// if a wait-for-key is pending), then decay the timers if a 60Hz tick
    /// of wall-clock time has passed
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        match self.mode {
            Mode::Running => self.execute_instruction()?,
            Mode::WaitingForKey(x) => {
                if let Some(key) = self.first_pressed_key() {
                    self.v[x as usize] = key;
                    self.mode = Mode::Running;
                    self.program_counter += 2;
                }
            }
        }
        let elapsed = self.last_timer_update.elapsed();
        if self.advance_timers(elapsed) {
            self.last_timer_update = Instant::now();
        }
        Ok(())
    }

    /// decrement both timers by one if `elapsed` covers a 60Hz tick.
    /// returns whether a tick was consumed. `step` feeds this real elapsed
    /// time; tests can feed synthetic durations.
    pub fn advance_timers(&mut self, elapsed: Duration) -> bool {
        if elapsed < CHIP8_TIMER_TICK {
            return false;
        }
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
        true
    }

    /// press a key on the hex pad
    pub fn set_key_down(&mut self, index: u8) -> Result<(), Chip8Error> {
        match self.key.get_mut(index as usize) {
            Some(state) => {
                *state = true;
                Ok(())
            }
            None => Err(Chip8Error::OutOfRange {
                addr: index as usize,
            }),
        }
    }

    /// release a key on the hex pad
    pub fn set_key_up(&mut self, index: u8) -> Result<(), Chip8Error> {
        match self.key.get_mut(index as usize) {
            Some(state) => {
                *state = false;
                Ok(())
            }
            None => Err(Chip8Error::OutOfRange {
                addr: index as usize,
            }),
        }
    }

    /// has the screen changed since the host last consumed a frame?
    pub fn is_draw_pending(&self) -> bool {
        self.draw_pending
    }

    /// the host calls this after copying out a frame; the core never
    /// clears the flag itself
    pub fn clear_draw_pending(&mut self) {
        self.draw_pending = false;
    }

    /// read-only view of the screen
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// the host polls this to drive the beeper; reaching zero raises no event
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    fn key_state(&self, index: u8) -> Result<bool, Chip8Error> {
        self.key
            .get(index as usize)
            .copied()
            .ok_or(Chip8Error::OutOfRange {
                addr: index as usize,
            })
    }

    fn first_pressed_key(&self) -> Option<u8> {
        self.key.iter().position(|&pressed| pressed).map(|i| i as u8)
    }

    /// fetch the big-endian word at PC, decode, dispatch. every arm either
    /// sets PC itself (jumps, calls, returns, skips) or advances it by 2.
    /// an arm that fails leaves PC on the offending instruction.
    fn execute_instruction(&mut self) -> Result<(), Chip8Error> {
        let word = self.memory.read_word(self.program_counter)?;

        let nnn = word & 0x0fff;
        let nn = (word & 0x00ff) as u8;
        let x = ((word & 0x0f00) >> 8) as usize;
        let y = ((word & 0x00f0) >> 4) as usize;
        let n = word & 0x000f;

        match word & 0xf000 {
            0x0000 => match word {
                // CLS
                0x00e0 => {
                    self.framebuffer.clear();
                    self.draw_pending = true;
                    self.program_counter += 2;
                }
                // RET -- the pushed address already points past the CALL
                0x00ee => {
                    if self.stack_pointer == 0 {
                        return Err(Chip8Error::StackUnderflow);
                    }
                    self.stack_pointer -= 1;
                    self.program_counter = self.stack[self.stack_pointer as usize];
                }
                _ => return Err(Chip8Error::UnknownInstruction { word }),
            },

            // JP nnn
            0x1000 => self.program_counter = nnn,

            // CALL nnn
            0x2000 => {
                if self.stack_pointer as usize == CHIP8_STACK_DEPTH {
                    return Err(Chip8Error::StackOverflow);
                }
                self.stack[self.stack_pointer as usize] = self.program_counter + 2;
                self.stack_pointer += 1;
                self.program_counter = nnn;
            }

            // SE Vx, nn
            0x3000 => {
                self.program_counter += if self.v[x] == nn { 4 } else { 2 };
            }

            // SNE Vx, nn
            0x4000 => {
                self.program_counter += if self.v[x] != nn { 4 } else { 2 };
            }

            // SE Vx, Vy
            0x5000 => {
                self.program_counter += if self.v[x] == self.v[y] { 4 } else { 2 };
            }

            // LD Vx, nn
            0x6000 => {
                self.v[x] = nn;
                self.program_counter += 2;
            }

            // ADD Vx, nn -- no carry flag
            0x7000 => {
                self.v[x] = self.v[x].wrapping_add(nn);
                self.program_counter += 2;
            }

            0x8000 => {
                self.alu_op(x, y, word)?;
                self.program_counter += 2;
            }

            // SNE Vx, Vy
            0x9000 => {
                self.program_counter += if self.v[x] != self.v[y] { 4 } else { 2 };
            }

            // LD I, nnn
            0xa000 => {
                self.i = nnn;
                self.program_counter += 2;
            }

            // JP V0, nnn
            0xb000 => self.program_counter = nnn + self.v[0] as u16,

            // RND Vx, nn
            0xc000 => {
                self.v[x] = self.random.next_byte() & nn;
                self.program_counter += 2;
            }

            // DRW Vx, Vy, n
            0xd000 => {
                self.draw_sprite(x, y, n)?;
                self.program_counter += 2;
            }

            0xe000 => match word & 0x00ff {
                // SKP Vx
                0x009e => {
                    if self.key_state(self.v[x])? {
                        self.program_counter += 2;
                    }
                    self.program_counter += 2;
                }
                // SKNP Vx
                0x00a1 => {
                    if !self.key_state(self.v[x])? {
                        self.program_counter += 2;
                    }
                    self.program_counter += 2;
                }
                _ => return Err(Chip8Error::UnknownInstruction { word }),
            },

            0xf000 => {
                match word & 0x00ff {
                    // LD Vx, DT
                    0x0007 => self.v[x] = self.delay_timer,

                    // LD Vx, K -- retried on every step until a key lands
                    0x000a => match self.first_pressed_key() {
                        Some(key) => self.v[x] = key,
                        None => {
                            self.mode = Mode::WaitingForKey(x as u8);
                            return Ok(());
                        }
                    },

                    // LD DT, Vx
                    0x0015 => self.delay_timer = self.v[x],

                    // LD ST, Vx
                    0x0018 => self.sound_timer = self.v[x],

                    // ADD I, Vx
                    0x001e => {
                        let sum = self.i as u32 + self.v[x] as u32;
                        self.v[0xf] = (sum > 0xfff) as u8;
                        self.i = self.i.wrapping_add(self.v[x] as u16);
                    }

                    // LD F, Vx
                    0x0029 => self.i = CHIP8_GLYPH_SIZE * self.v[x] as u16,

                    // LD B, Vx -- BCD digits at I, I+1, I+2
                    0x0033 => {
                        let value = self.v[x];
                        self.memory.write_byte(self.i, value / 100)?;
                        self.memory.write_byte(self.i + 1, value / 10 % 10)?;
                        self.memory.write_byte(self.i + 2, value % 10)?;
                    }

                    // LD [I], Vx -- I deliberately left unmodified, unlike
                    // interpreters that finish with I = I + x + 1
                    0x0055 => {
                        for r in 0..=x {
                            self.memory.write_byte(self.i + r as u16, self.v[r])?;
                        }
                    }

                    // LD Vx, [I] -- I deliberately left unmodified
                    0x0065 => {
                        for r in 0..=x {
                            self.v[r] = self.memory.read_byte(self.i + r as u16)?;
                        }
                    }

                    _ => return Err(Chip8Error::UnknownInstruction { word }),
                }
                self.program_counter += 2;
            }

            _ => return Err(Chip8Error::UnknownInstruction { word }),
        }
        Ok(())
    }

    /// the 8xy_ register-register family. flag writes happen before the
    /// result lands, so an operation targeting VF itself sees the flag as
    /// its operand -- contemporary interpreters behave the same way.
    fn alu_op(&mut self, x: usize, y: usize, word: u16) -> Result<(), Chip8Error> {
        match word & 0x000f {
            // LD Vx, Vy
            0x0 => self.v[x] = self.v[y],

            // OR Vx, Vy
            0x1 => self.v[x] |= self.v[y],

            // AND Vx, Vy
            0x2 => self.v[x] &= self.v[y],

            // XOR Vx, Vy
            0x3 => self.v[x] ^= self.v[y],

            // ADD Vx, Vy -- VF = 1 iff the unsigned sum exceeds 255
            0x4 => {
                let carry = self.v[x] as u16 + self.v[y] as u16 > 0xff;
                self.v[0xf] = carry as u8;
                self.v[x] = self.v[x].wrapping_add(self.v[y]);
            }

            // SUB Vx, Vy -- VF = 1 iff no borrow (Vx > Vy)
            0x5 => {
                self.v[0xf] = (self.v[x] > self.v[y]) as u8;
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
            }

            // SHR Vx -- VF captures the bit shifted out
            0x6 => {
                self.v[0xf] = self.v[x] & 1;
                self.v[x] >>= 1;
            }

            // SUBN Vx, Vy -- mirror of SUB: Vx = Vy - Vx
            0x7 => {
                self.v[0xf] = (self.v[y] > self.v[x]) as u8;
                self.v[x] = self.v[y].wrapping_sub(self.v[x]);
            }

            // SHL Vx -- VF captures the bit shifted out
            0xe => {
                self.v[0xf] = (self.v[x] >> 7) & 1;
                self.v[x] <<= 1;
            }

            _ => return Err(Chip8Error::UnknownInstruction { word }),
        }
        Ok(())
    }

    /// XOR an n-row sprite from memory[I..] onto the screen at (Vx, Vy).
    /// coordinates wrap modulo the display size; VF reports whether any lit
    /// pixel was erased (set -> unset), never mere overlap with blank ones.
    fn draw_sprite(&mut self, x: usize, y: usize, n: u16) -> Result<(), Chip8Error> {
        let base_x = self.v[x] as usize;
        let base_y = self.v[y] as usize;
        self.v[0xf] = 0;
        for row in 0..n {
            let sprite = self.memory.read_byte(self.i + row)?;
            for col in 0..8usize {
                if sprite & (0x80 >> col) == 0 {
                    continue;
                }
                let draw_x = (base_x + col) % CHIP8_DISPLAY_WIDTH;
                let draw_y = (base_y + row as usize) % CHIP8_DISPLAY_HEIGHT;
                let now_lit = self.framebuffer.flip(draw_x, draw_y);
                if !now_lit {
                    self.v[0xf] = 1;
                }
            }
        }
        self.draw_pending = true;
        Ok(())
    }
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
