use super::{ByteSink, Controller, MessageWriter};
use crate::error::DeviceError;
use crate::game_state::{GameState, Key};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::thread;
use std::time::Duration;

pub const NUM_COLORS: u8 = 8;
pub const NUM_PIXELS: usize = 144;

/// The strip firmware garbles serial input while it is drawing
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_millis(10);

/// LED strip that lights one pixel per key press and changes color on every
/// full run.
///
/// Protocol is `index,color;` to light a pixel, or `index,e;` to clear the strip.
pub struct StripController {
    writer: MessageWriter,
    rng: StdRng,
    colors: Vec<u8>,
    color: u8,
    index: usize,
    write_delay: Duration,
}

impl StripController {
    pub fn new(sink: Box<dyn ByteSink>) -> Self {
        let mut controller = Self {
            writer: MessageWriter::new(sink),
            rng: StdRng::from_entropy(),
            colors: Vec::new(),
            color: 0,
            index: 0,
            write_delay: DEFAULT_WRITE_DELAY,
        };
        controller.reset_colors();
        controller
    }

    pub fn with_write_delay(mut self, write_delay: Duration) -> Self {
        self.write_delay = write_delay;
        self
    }

    /// Deterministic color order, for tests
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.reset_colors();
        self
    }

    pub fn color(&self) -> u8 {
        self.color
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn write_msg(&mut self, mode_param: &str) -> Result<(), DeviceError> {
        let message = format!("{},{};", self.index, mode_param);
        if self.writer.send(message)? && !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }
        Ok(())
    }

    fn change_color(&mut self) {
        if self.colors.is_empty() {
            self.reset_colors();
        }
        self.index = 0;
        if let Some(color) = self.colors.pop() {
            self.color = color;
        }
    }

    /// Refill the bag so the next color popped differs from the current one
    fn reset_colors(&mut self) {
        self.colors = (0..NUM_COLORS).collect();
        self.colors.shuffle(&mut self.rng);
        if self.colors.last() == Some(&self.color) {
            self.colors.rotate_right(1);
        }
    }
}

impl Controller for StripController {
    fn name(&self) -> &str {
        "strip"
    }

    fn tick(&mut self, state: GameState) -> Result<(), DeviceError> {
        if state.current_combo == 0 {
            self.color = 0;
            self.index = 0;
            self.write_msg("e")?;
        }
        Ok(())
    }

    fn key_down(&mut self, _key: Key, _state: GameState) -> Result<(), DeviceError> {
        let color = self.color.to_string();
        self.write_msg(&color)?;
        self.index += 1;
        if self.index >= NUM_PIXELS {
            self.change_color();
        }
        Ok(())
    }
}
