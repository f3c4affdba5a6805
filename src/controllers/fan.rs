use super::{ByteSink, Controller, MessageWriter};
use crate::error::DeviceError;
use crate::game_state::{GameState, Key};

pub const DEFAULT_FAN_THRESHOLD: u32 = 50;

/// Two relays: one on while any combo runs, one once the combo reaches the threshold.
///
/// Protocol is `active,over_threshold;`, e.g. `1,0;`.
pub struct FanController {
    writer: MessageWriter,
    threshold: u32,
}

impl FanController {
    pub fn new(sink: Box<dyn ByteSink>) -> Self {
        Self::with_threshold(sink, DEFAULT_FAN_THRESHOLD)
    }

    pub fn with_threshold(sink: Box<dyn ByteSink>, threshold: u32) -> Self {
        Self {
            writer: MessageWriter::new(sink),
            threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn encode(&self, state: &GameState) -> String {
        let active = state.current_combo > 0;
        let over_threshold = active && state.current_combo >= self.threshold;
        format!("{},{};", u8::from(active), u8::from(over_threshold))
    }
}

impl Controller for FanController {
    fn name(&self) -> &str {
        "fan"
    }

    fn tick(&mut self, state: GameState) -> Result<(), DeviceError> {
        let message = self.encode(&state);
        self.writer.send(message)?;
        Ok(())
    }

    fn key_down(&mut self, _key: Key, _state: GameState) -> Result<(), DeviceError> {
        Ok(())
    }
}
