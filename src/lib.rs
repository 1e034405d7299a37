///
/// ## Design
///
/// * the interpreter core owns all machine state (RAM + glyph table,
///   registers, stack, framebuffer + dirty flag, key latch, timers) and
///   nothing else; it never touches the terminal, speaker or filesystem
/// * pub .step() -- exactly one fetch/decode/execute, then decay the
///   timers if a 60Hz tick of wall-clock time has passed. timer decay is
///   decoupled from how fast the host drives .step()
/// * "wait for key" is a two-state machine (Running / WaitingForKey)
///   revisited on each .step(), not a blocking call
/// * errors (out-of-range access, unknown instruction, stack over/under
///   flow) come back synchronously from the call that hit them; the host
///   decides whether they kill the session
/// * display, input and sound sit behind traits so alternatives can be
///   plugged in; the defaults are a TUI canvas in-console, crossterm
///   keyboard polling and the PC-speaker beep
/// * the RND source is a trait too, so tests can script the bytes
///
/// Model
///
/// main loop
///  |-- display, input, sound
///  |-- interpreter (owns memory, registers, stack, screen, keys, timers)
///  `-- per cycle:
///       |-- interpreter.step()
///       |-- pump input events into the key latch
///       |-- if a frame is pending, draw it and clear the flag
///       |-- beep while the sound timer is nonzero
///       `-- sleep ~2ms (so roughly 500 instructions/sec)
pub mod display;
pub mod error;
pub mod input;
pub mod interpreter;
pub mod memory;
pub mod sound;
