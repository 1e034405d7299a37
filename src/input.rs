use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// map of keyboard characters to chip-8 key indices, using the left-hand
/// side of a qwerty keyboard laid out like the COSMAC hex pad
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals report key presses but not releases, so a held key is expired
/// after this long and a release synthesised
const KEY_HOLD: Duration = Duration::from_millis(150);

/// something that happened on the keyboard, translated to chip-8 terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(u8),
    KeyUp(u8),
    Quit,
}

/// reads keypresses
pub trait Input {
    /// drain everything that has happened since the last poll
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// simple implementation of Input, using STDIN
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    held: HashMap<u8, Instant>,
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            held: HashMap::new(),
        })
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(key) => match self.keymap.get(&key) {
                        Some(&mapped_key) => {
                            // repeats refresh the hold without re-reporting
                            if self.held.insert(mapped_key, Instant::now()).is_none() {
                                events.push(InputEvent::KeyDown(mapped_key));
                            }
                        }
                        None => {
                            eprintln!("Warning: can't map {:?} to a COSMAC key", key);
                        }
                    },
                    KeyCode::Esc => events.push(InputEvent::Quit),
                    _ => {}
                },
                _ => {}
            }
        }
        self.held.retain(|&key, pressed_at| {
            if pressed_at.elapsed() >= KEY_HOLD {
                events.push(InputEvent::KeyUp(key));
                false
            } else {
                true
            }
        });
        Ok(events)
    }
}

/// dummy Input implementation for testing: hands out one scripted batch of
/// events per poll
pub struct DummyInput {
    batches: Vec<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(mut batches: Vec<Vec<InputEvent>>) -> Self {
        batches.reverse();
        DummyInput { batches }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.batches.pop().unwrap_or_default())
    }
}
