use std::env;
use std::error::Error;
use std::fs;
use std::time::Duration;

use cosmac8::display::{Display, MonoTermDisplay};
use cosmac8::input::{Input, InputEvent, StdinInput};
use cosmac8::interpreter::Chip8Interpreter;
use cosmac8::sound::{Mute, Sound};

/// pause between steps; roughly 500 instructions per second
const STEP_PERIOD: Duration = Duration::from_millis(2);

fn main() -> Result<(), Box<dyn Error>> {
    let rom_path = env::args()
        .nth(1)
        .ok_or("usage: cosmac8 <program.ch8>")?;
    let rom = fs::read(&rom_path)?;

    // initialise
    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new()?;
    // TODO: SimpleBeep once there's a way to probe for a PC speaker
    let mut sound = Mute::new();
    let mut interpreter = Chip8Interpreter::new();
    interpreter.load(&rom)?;

    let sleeper = spin_sleep::SpinSleeper::default();
    'emulation: loop {
        interpreter.step()?;

        for event in input.poll_events()? {
            match event {
                InputEvent::KeyDown(key) => interpreter.set_key_down(key)?,
                InputEvent::KeyUp(key) => interpreter.set_key_up(key)?,
                InputEvent::Quit => break 'emulation,
            }
        }

        if interpreter.is_draw_pending() {
            display.draw(interpreter.framebuffer())?;
            interpreter.clear_draw_pending();
        }

        if interpreter.sound_timer() > 0 {
            sound.beep()?;
        } else {
            sound.stop()?;
        }

        sleeper.sleep(STEP_PERIOD);
    }

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    Ok(())
}
