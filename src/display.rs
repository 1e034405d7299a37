use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// display width in pixels
pub const CHIP8_DISPLAY_WIDTH: usize = 64;
/// display height in pixels
pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

/// The interpreter's own 64x32 monochrome pixel matrix. Storage is a plain
/// 2-D grid with direct indexing; the coordinate-wrap rule belongs to the
/// draw instruction, not here, so callers wrap before they index.
pub struct FrameBuffer {
    pixels: [[bool; CHIP8_DISPLAY_WIDTH]; CHIP8_DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [[false; CHIP8_DISPLAY_WIDTH]; CHIP8_DISPLAY_HEIGHT],
        }
    }

    /// unset every pixel
    pub fn clear(&mut self) {
        self.pixels = [[false; CHIP8_DISPLAY_WIDTH]; CHIP8_DISPLAY_HEIGHT];
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[y][x]
    }

    /// toggle one pixel, returning its new state
    pub fn flip(&mut self, x: usize, y: usize) -> bool {
        self.pixels[y][x] = !self.pixels[y][x];
        self.pixels[y][x]
    }

    /// iterate over the (x, y) coordinates of every lit pixel
    pub fn iter_lit(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pixels.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &px)| px)
                .map(move |(x, _)| (x, y))
        })
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Display is used by the host to put a framebuffer snapshot on the
/// screen. It abstracts the implementation details, so a variety of kinds
/// of screen would work.
pub trait Display {
    /// render one full frame
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error>;
}

/// monochrome display in a terminal, rendered using TUI over crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(MonoTermDisplay { terminal })
    }

    // canvas coordinates run bottom-up, pixel rows top-down
    fn x_bounds() -> [f64; 2] {
        [0.0, (CHIP8_DISPLAY_WIDTH - 1) as f64]
    }

    fn y_bounds() -> [f64; 2] {
        [-1.0 * (CHIP8_DISPLAY_HEIGHT - 1) as f64, 0.0]
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        // for now this assumes a 1:1 ratio between terminal cells and
        // chip-8 pixels
        let lit: Vec<(f64, f64)> = frame
            .iter_lit()
            .map(|(x, y)| (x as f64, -1.0 * y as f64))
            .collect();
        self.terminal.draw(|f| {
            let size = Rect::new(
                0,
                0,
                2 + CHIP8_DISPLAY_WIDTH as u16,
                2 + CHIP8_DISPLAY_HEIGHT as u16,
            );
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("COSMAC-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(Self::x_bounds())
                .y_bounds(Self::y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    pub frames_drawn: usize,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay { frames_drawn: 0 }
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, _frame: &FrameBuffer) -> Result<(), io::Error> {
        self.frames_drawn += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_framebuffer_is_blank() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.iter_lit().count(), 0);
    }

    #[test]
    fn test_flip_toggles_and_reports_new_state() {
        let mut fb = FrameBuffer::new();
        assert!(fb.flip(3, 7));
        assert!(fb.get(3, 7));
        assert!(!fb.flip(3, 7));
        assert!(!fb.get(3, 7));
    }

    #[test]
    fn test_clear_unsets_everything() {
        let mut fb = FrameBuffer::new();
        fb.flip(0, 0);
        fb.flip(63, 31);
        fb.clear();
        assert_eq!(fb.iter_lit().count(), 0);
    }

    #[test]
    fn test_iter_lit_yields_coordinates() {
        let mut fb = FrameBuffer::new();
        fb.flip(5, 2);
        fb.flip(63, 31);
        let lit: Vec<_> = fb.iter_lit().collect();
        assert_eq!(lit, vec![(5, 2), (63, 31)]);
    }

    #[test]
    fn test_canvas_bounds() {
        assert_eq!(MonoTermDisplay::x_bounds(), [0.0, 63.0]);
        assert_eq!(MonoTermDisplay::y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_dummy_display_counts_frames() {
        let mut d = DummyDisplay::new();
        d.draw(&FrameBuffer::new()).unwrap();
        d.draw(&FrameBuffer::new()).unwrap();
        assert_eq!(d.frames_drawn, 2);
    }
}
