use crate::error::Chip8Error;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where programs are loaded
const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the glyph table lives. `LD F, VX` computes `I = 5 * VX`, so the
/// glyphs must sit at the very bottom of RAM.
const CHIP8_FONT_ADDR: usize = 0x0000;

/// Flat 4K memory map. Programs *should* only touch 0x200 upward, but the
/// instruction set gives them the whole address space, so every access is
/// bounds-checked rather than trusted.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
}

impl Chip8MemoryMap {
    /// fresh RAM with the glyph table baked in at the bottom
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
            program_addr: CHIP8_PROGRAM_ADDR,
        };
        mm.reset();
        mm
    }

    /// zero all of RAM, then re-copy the glyph table
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        self.bytes[CHIP8_FONT_ADDR..CHIP8_FONT_ADDR + CHIP8_FONT.len()]
            .copy_from_slice(&CHIP8_FONT);
    }

    /// read one byte
    pub fn read_byte(&self, addr: u16) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Chip8Error::OutOfRange { addr: addr as usize })
    }

    /// write one byte
    pub fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), Chip8Error> {
        match self.bytes.get_mut(addr as usize) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Chip8Error::OutOfRange { addr: addr as usize }),
        }
    }

    /// read a two-byte big-endian word (instruction fetch)
    pub fn read_word(&self, addr: u16) -> Result<u16, Chip8Error> {
        let hi = self.read_byte(addr)?;
        let lo = self.read_byte(addr.wrapping_add(1))?;
        Ok(((hi as u16) << 8) | lo as u16)
    }

    /// copy a program image in at 0x200. an image that would run past the
    /// end of RAM is rejected whole; nothing is copied.
    pub fn load_program(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        let start = self.program_addr as usize;
        let end = start + data.len();
        if end > self.bytes.len() {
            return Err(Chip8Error::OutOfRange { addr: end - 1 });
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// 5-byte hex glyphs 0-F, as shipped with contemporary interpreters
const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed_above_font() {
        let m = Chip8MemoryMap::new();
        // NB. the first 80 bytes hold the glyph table
        assert_eq!(m.bytes[CHIP8_FONT.len()..], [0; 4096 - 80]);
    }

    #[test]
    fn test_font_at_bottom() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.bytes[..5], [0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(m.bytes[75..80], [0xF0, 0x80, 0xF0, 0x80, 0x80]);
    }

    #[test]
    fn test_reset_restores_font_and_zeroes_program() {
        let mut m = Chip8MemoryMap::new();
        m.write_byte(0x200, 0xaa).unwrap();
        m.write_byte(0x000, 0x00).unwrap();
        m.reset();
        assert_eq!(m.read_byte(0x200).unwrap(), 0);
        assert_eq!(m.read_byte(0x000).unwrap(), 0xF0);
    }

    #[test]
    fn test_read_write_byte() -> Result<(), Chip8Error> {
        let mut m = Chip8MemoryMap::new();
        m.write_byte(0x345, 0x42)?;
        assert_eq!(m.read_byte(0x345)?, 0x42);
        Ok(())
    }

    #[test]
    fn test_read_word_big_endian() -> Result<(), Chip8Error> {
        let mut m = Chip8MemoryMap::new();
        m.write_byte(0x200, 0x60)?;
        m.write_byte(0x201, 0x05)?;
        assert_eq!(m.read_word(0x200)?, 0x6005);
        Ok(())
    }

    #[test]
    fn test_read_past_end_fails() {
        let m = Chip8MemoryMap::new();
        assert_eq!(
            m.read_byte(0x1000),
            Err(Chip8Error::OutOfRange { addr: 0x1000 })
        );
        // word fetch straddling the end fails on the second byte
        assert_eq!(
            m.read_word(0x0fff),
            Err(Chip8Error::OutOfRange { addr: 0x1000 })
        );
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut m = Chip8MemoryMap::new();
        m.load_program(&[0x00, 0xe0])?; // clear screen
        assert_eq!(m.read_word(0x200)?, 0x00e0);
        Ok(())
    }

    #[test]
    fn test_program_load_fills_to_last_byte() -> Result<(), Chip8Error> {
        let mut m = Chip8MemoryMap::new();
        let prog = vec![0xab; 4096 - 0x200];
        m.load_program(&prog)?;
        assert_eq!(m.read_byte(0x0fff)?, 0xab);
        Ok(())
    }

    #[test]
    fn test_program_load_too_big_copies_nothing() {
        let mut m = Chip8MemoryMap::new();
        let prog = vec![0xab; 4096 - 0x200 + 1];
        assert_eq!(
            m.load_program(&prog),
            Err(Chip8Error::OutOfRange { addr: 0x1000 })
        );
        // reject-whole: not even the in-range prefix lands
        assert_eq!(m.read_byte(0x200).unwrap(), 0);
        assert_eq!(m.read_byte(0x0fff).unwrap(), 0);
    }
}
