use super::{ByteSink, Controller, MessageWriter};
use crate::clock::Clock;
use crate::error::DeviceError;
use crate::game_state::{GameState, Key};
use crate::util::secs_between;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// How long the screen shows combo before flipping to WPM and back
pub const MODE_CHANGE_TIME: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ScreenMode {
    #[strum(serialize = "c")]
    Combo,
    #[strum(serialize = "w")]
    Wpm,
    #[strum(serialize = "e")]
    Empty,
}

/// Small status screen.
///
/// Protocol is `mode,timeleft,value;` where mode is one of `c`, `w`, `e`,
/// timeleft is the fraction of the combo timeout left with one decimal, and
/// value is whatever fits in about eight characters. Example: `c,0.5,1039;`
pub struct ScreenController {
    writer: MessageWriter,
    clock: Arc<dyn Clock>,
    last_mode_change: SystemTime,
    display_combo: bool,
}

impl ScreenController {
    pub fn new(sink: Box<dyn ByteSink>, clock: Arc<dyn Clock>) -> Self {
        let last_mode_change = clock.now();
        Self {
            writer: MessageWriter::new(sink),
            clock,
            last_mode_change,
            display_combo: true,
        }
    }

    pub fn display_combo(&self) -> bool {
        self.display_combo
    }

    fn check_for_mode_change(&mut self, now: SystemTime) {
        if secs_between(self.last_mode_change, now) > MODE_CHANGE_TIME.as_secs_f64() {
            self.display_combo = !self.display_combo;
            self.last_mode_change = now;
        }
    }

    pub fn encode(&self, state: &GameState, now: SystemTime) -> String {
        let (mode, value) = if state.current_combo > 0 {
            let median_wpm = state.median_wpm();
            if self.display_combo || median_wpm == 0 {
                (ScreenMode::Combo, state.current_combo.to_string())
            } else {
                (ScreenMode::Wpm, median_wpm.to_string())
            }
        } else {
            (
                ScreenMode::Empty,
                format!("{}  {}", state.max_combo, state.max_median_wpm),
            )
        };
        format!("{},{:.1},{};", mode, state.percent_time_left(now), value)
    }
}

impl Controller for ScreenController {
    fn name(&self) -> &str {
        "screen"
    }

    fn tick(&mut self, state: GameState) -> Result<(), DeviceError> {
        let now = self.clock.now();
        self.check_for_mode_change(now);
        let message = self.encode(&state, now);
        self.writer.send(message)?;
        Ok(())
    }

    fn key_down(&mut self, _key: Key, _state: GameState) -> Result<(), DeviceError> {
        Ok(())
    }
}
