use beep::beep;
use std::error::Error;

/// makes (or doesn't make) the monotone chip-8 beep. the interpreter only
/// exposes the sound timer; the host switches this on while it's nonzero.
pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        // called every step while the timer runs; only poke the speaker on
        // the off-to-on edge
        if !self.is_beeping {
            beep(SIMPLEBEEP_PITCH)?;
            self.is_beeping = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_beeping {
            beep(0)?;
            self.is_beeping = false;
        }
        Ok(())
    }
}

pub struct Mute {}
impl Mute {
    pub fn new() -> Self {
        Mute {}
    }
}
impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}
