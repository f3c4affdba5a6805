use crate::clock::Clock;
use crate::controllers::Controller;
use crate::game_state::{GameState, Key};
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns the authoritative game state and fans snapshots out to controllers.
///
/// Controllers run in registration order on the caller's thread. A failing
/// controller is logged and skipped; the others still get the event.
pub struct GameManager {
    game_state: GameState,
    controllers: Vec<Box<dyn Controller>>,
    clock: Arc<dyn Clock>,
}

impl GameManager {
    pub fn new(controllers: Vec<Box<dyn Controller>>, clock: Arc<dyn Clock>) -> Self {
        let game_state = GameState::start(clock.now());
        Self::with_state(game_state, controllers, clock)
    }

    pub fn with_state(
        game_state: GameState,
        controllers: Vec<Box<dyn Controller>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            game_state,
            controllers,
            clock,
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn controller_names(&self) -> Vec<String> {
        self.controllers
            .iter()
            .map(|controller| controller.name().to_string())
            .collect()
    }

    pub fn trigger_tick(&mut self) {
        let now = self.clock.now();
        if self.game_state.is_timed_out(now) {
            if self.game_state.current_combo > 0 {
                debug!(
                    combo = self.game_state.current_combo,
                    median_wpm = self.game_state.median_wpm(),
                    "combo timed out"
                );
            }
            self.game_state = self.game_state.combo_stopped(now);
        }

        for controller in self.controllers.iter_mut() {
            if let Err(e) = controller.tick(self.game_state.clone()) {
                warn!(controller = controller.name(), error = %e, "tick failed");
            }
        }
    }

    pub fn trigger_key_down(&mut self, key: Key) {
        let now = self.clock.now();
        self.game_state = self.game_state.increment_combo(&key, now);
        if self.game_state.at_word_boundary(now) {
            self.game_state = self.game_state.record_wpm(now);
            debug!(
                combo = self.game_state.current_combo,
                median_wpm = self.game_state.median_wpm(),
                "recorded wpm"
            );
        }

        for controller in self.controllers.iter_mut() {
            if let Err(e) = controller.key_down(key.clone(), self.game_state.clone()) {
                warn!(controller = controller.name(), error = %e, "key down failed");
            }
        }
    }
}
