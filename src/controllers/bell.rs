use super::{ByteSink, Controller, MessageWriter};
use crate::clock::Clock;
use crate::error::DeviceError;
use crate::game_state::{GameState, Key};
use crate::util::secs_between;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub const NUM_BELLS: usize = 4;

/// A bell relay stays closed this long after being struck
pub const BELL_ON_TIME: Duration = Duration::from_millis(100);

/// Bell relays, struck one after another on each key press.
///
/// Protocol is one `0`/`1` per relay, e.g. `1010`.
pub struct BellController {
    writer: MessageWriter,
    clock: Arc<dyn Clock>,
    bell_click_times: [Option<SystemTime>; NUM_BELLS],
    current_index: usize,
}

impl BellController {
    pub fn new(sink: Box<dyn ByteSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            writer: MessageWriter::new(sink),
            clock,
            bell_click_times: [None; NUM_BELLS],
            current_index: 0,
        }
    }

    fn increment_index(&mut self) {
        self.current_index = (self.current_index + 1) % NUM_BELLS;
    }

    pub fn encode(&self, now: SystemTime) -> String {
        let on_time = BELL_ON_TIME.as_secs_f64();
        self.bell_click_times
            .iter()
            .map(|clicked| match clicked {
                Some(at) if secs_between(*at, now) < on_time => '1',
                _ => '0',
            })
            .collect()
    }

    fn send(&mut self) -> Result<(), DeviceError> {
        let message = self.encode(self.clock.now());
        self.writer.send(message)?;
        Ok(())
    }
}

impl Controller for BellController {
    fn name(&self) -> &str {
        "bell"
    }

    fn tick(&mut self, _state: GameState) -> Result<(), DeviceError> {
        self.send()
    }

    fn key_down(&mut self, _key: Key, _state: GameState) -> Result<(), DeviceError> {
        self.bell_click_times[self.current_index] = Some(self.clock.now());
        self.increment_index();
        self.send()
    }
}
