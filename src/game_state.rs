use crate::util::{median, secs_between};
use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const CHARS_IN_WORD: u32 = 5;
pub const MIN_WORDS_FOR_WPM: f64 = 5.0;
pub const MAX_RECORDED_WPMS: usize = 100;
pub const DEFAULT_COMBO_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity of a pressed key, as far as the game cares
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Tab,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Press,
    Release,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: KeyKind,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            kind: KeyKind::Press,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            key,
            kind: KeyKind::Release,
        }
    }
}

/// Combo and WPM metrics at one point in time.
///
/// Transforms never mutate in place: each returns the next state, so a clone
/// handed to a controller is a snapshot nobody else can touch.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub current_combo: u32,
    pub max_combo: u32,
    pub max_median_wpm: u32,
    pub combo_at_last_timeout: u32,
    pub median_wpm_at_last_timeout: u32,
    pub combo_timeout: Duration,
    pub time_of_last_key: SystemTime,
    pub combo_start: SystemTime,
    pub recorded_wpms: VecDeque<u32>,
    pub num_backspaces: u32,
}

impl GameState {
    pub fn start(now: SystemTime) -> Self {
        Self::start_with_timeout(now, DEFAULT_COMBO_TIMEOUT)
    }

    /// Fresh state that is already timed out, so the first tick reports idle.
    pub fn start_with_timeout(now: SystemTime, combo_timeout: Duration) -> Self {
        Self {
            current_combo: 0,
            max_combo: 0,
            max_median_wpm: 0,
            combo_at_last_timeout: 0,
            median_wpm_at_last_timeout: 0,
            combo_timeout,
            time_of_last_key: now.checked_sub(combo_timeout).unwrap_or(UNIX_EPOCH),
            combo_start: now,
            recorded_wpms: VecDeque::new(),
            num_backspaces: 0,
        }
    }

    pub fn percent_time_left(&self, now: SystemTime) -> f64 {
        let timeout = self.combo_timeout.as_secs_f64();
        if timeout <= 0.0 {
            return 0.0;
        }
        let seconds_past = secs_between(self.time_of_last_key, now);
        ((timeout - seconds_past) / timeout).clamp(0.0, 1.0)
    }

    pub fn is_timed_out(&self, now: SystemTime) -> bool {
        self.percent_time_left(now) == 0.0
    }

    pub fn current_wpm(&self, now: SystemTime) -> u32 {
        let typed = self.current_combo.saturating_sub(self.num_backspaces);
        let words_typed = typed as f64 / CHARS_IN_WORD as f64;
        if words_typed < MIN_WORDS_FOR_WPM {
            return 0;
        }
        let minutes_passed = secs_between(self.combo_start, now) / 60.0;
        if minutes_passed <= 0.0 {
            return 0;
        }
        (words_typed / minutes_passed).floor() as u32
    }

    pub fn median_wpm(&self) -> u32 {
        let samples = self.recorded_wpms.iter().copied().collect::<Vec<u32>>();
        median(&samples).unwrap_or(0)
    }

    /// True once a full word has been typed and there is a WPM worth sampling.
    pub fn at_word_boundary(&self, now: SystemTime) -> bool {
        self.current_combo % CHARS_IN_WORD == 0 && self.current_wpm(now) > 0
    }

    pub fn increment_combo(&self, key: &Key, now: SystemTime) -> Self {
        let new_combo = self.current_combo + 1;
        let recorded_wpms = if self.current_combo == 0 {
            VecDeque::new()
        } else {
            self.recorded_wpms.clone()
        };
        let num_backspaces = if *key == Key::Backspace {
            self.num_backspaces + 1
        } else {
            self.num_backspaces
        };

        Self {
            current_combo: new_combo,
            max_combo: self.max_combo.max(new_combo),
            time_of_last_key: now,
            recorded_wpms,
            num_backspaces,
            ..self.clone()
        }
    }

    /// Ends the running combo. Frozen display values only move when there is
    /// something non-zero to freeze, so repeated timeouts keep the last result.
    pub fn combo_stopped(&self, now: SystemTime) -> Self {
        let median_wpm = self.median_wpm();
        Self {
            current_combo: 0,
            num_backspaces: 0,
            combo_start: now,
            combo_at_last_timeout: if self.current_combo > 0 {
                self.current_combo
            } else {
                self.combo_at_last_timeout
            },
            median_wpm_at_last_timeout: if median_wpm > 0 {
                median_wpm
            } else {
                self.median_wpm_at_last_timeout
            },
            recorded_wpms: VecDeque::new(),
            ..self.clone()
        }
    }

    pub fn record_wpm(&self, now: SystemTime) -> Self {
        let current_wpm = self.current_wpm(now);
        let mut next = self.clone();
        if current_wpm > 0 {
            next.recorded_wpms.push_back(current_wpm);
            while next.recorded_wpms.len() > MAX_RECORDED_WPMS {
                next.recorded_wpms.pop_front();
            }
        }
        next.max_median_wpm = next.max_median_wpm.max(next.median_wpm());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen() -> SystemTime {
        // 2020-05-17 10:12:34 UTC
        UNIX_EPOCH + Duration::from_secs(1_589_710_354)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_create_gamestate() {
        let now = frozen();
        assert_eq!(
            GameState::start(now),
            GameState {
                current_combo: 0,
                max_combo: 0,
                max_median_wpm: 0,
                combo_at_last_timeout: 0,
                median_wpm_at_last_timeout: 0,
                combo_timeout: secs(10),
                time_of_last_key: UNIX_EPOCH + secs(1_589_710_344),
                combo_start: now,
                recorded_wpms: VecDeque::new(),
                num_backspaces: 0,
            }
        );
    }

    #[test]
    fn test_start_is_timed_out() {
        let state = GameState::start(frozen());
        assert_eq!(state.percent_time_left(frozen()), 0.0);
        assert!(state.is_timed_out(frozen()));
    }

    #[test]
    fn test_percent_time_left() {
        let t0 = frozen();
        let state = GameState::start(t0).increment_combo(&Key::Char('a'), t0);
        assert_eq!(state.percent_time_left(t0), 1.0);
        assert_eq!(state.percent_time_left(t0 + secs(5)), 0.5);
        assert_eq!(state.percent_time_left(t0 + secs(10)), 0.0);
        assert_eq!(state.percent_time_left(t0 + secs(11)), 0.0);
    }

    #[test]
    fn test_percent_time_left_clamps_clock_skew() {
        let t0 = frozen();
        let state = GameState::start(t0).increment_combo(&Key::Char('a'), t0);
        assert_eq!(state.percent_time_left(t0 - secs(3)), 1.0);
    }

    #[test]
    fn test_current_wpm() {
        let t0 = frozen();
        assert_eq!(GameState::start(t0).current_wpm(t0), 0);
        let short = GameState {
            current_combo: 24,
            ..GameState::start(t0)
        };
        assert_eq!(short.current_wpm(t0 + secs(60)), 0);

        let state = GameState::start(t0);
        let later = t0 + secs(60);
        let hundred = GameState {
            current_combo: 100,
            ..state.clone()
        };
        assert_eq!(hundred.current_wpm(later), 20);
        let ninety_nine = GameState {
            current_combo: 99,
            ..state
        };
        // floored
        assert_eq!(ninety_nine.current_wpm(later), 19);
    }

    #[test]
    fn test_current_wpm_excludes_backspaces() {
        let t0 = frozen();
        let state = GameState {
            current_combo: 100,
            num_backspaces: 50,
            ..GameState::start(t0)
        };
        assert_eq!(state.current_wpm(t0 + secs(60)), 10);
    }

    #[test]
    fn test_current_wpm_without_elapsed_time() {
        let t0 = frozen();
        let state = GameState {
            current_combo: 100,
            ..GameState::start(t0)
        };
        assert_eq!(state.current_wpm(t0), 0);
    }

    #[test]
    fn test_median_wpm() {
        let state = GameState {
            recorded_wpms: VecDeque::from(vec![10, 20, 30]),
            ..GameState::start(frozen())
        };
        assert_eq!(state.median_wpm(), 20);
        assert_eq!(GameState::start(frozen()).median_wpm(), 0);
    }

    #[test]
    fn test_increment_combo() {
        let t0 = frozen();
        let state = GameState::start(t0).increment_combo(&Key::Char('a'), t0);
        assert_eq!(state.current_combo, 1);
        assert_eq!(state.num_backspaces, 0);

        let state = state.increment_combo(&Key::Backspace, t0);
        assert_eq!(state.current_combo, 2);
        assert_eq!(state.num_backspaces, 1);
        assert_eq!(state.time_of_last_key, t0);

        let state = state.increment_combo(&Key::Char('b'), t0 + secs(1));
        assert_eq!(state.current_combo, 3);
        assert_eq!(state.num_backspaces, 1);
        assert_eq!(state.time_of_last_key, t0 + secs(1));
        assert_eq!(state.max_combo, 3);
    }

    #[test]
    fn test_increment_combo_from_zero_resets_recorded_wpm() {
        let t0 = frozen();
        let state = GameState {
            recorded_wpms: VecDeque::from(vec![1, 2, 3]),
            ..GameState::start(t0)
        };
        assert!(state
            .increment_combo(&Key::Char('a'), t0)
            .recorded_wpms
            .is_empty());
    }

    #[test]
    fn test_increment_mid_combo_keeps_recorded_wpm() {
        let t0 = frozen();
        let state = GameState {
            current_combo: 7,
            recorded_wpms: VecDeque::from(vec![1, 2, 3]),
            ..GameState::start(t0)
        };
        assert_eq!(
            state.increment_combo(&Key::Char('a'), t0).recorded_wpms,
            VecDeque::from(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_combo_stopped() {
        let t0 = frozen();
        let state = GameState {
            current_combo: 1000,
            time_of_last_key: t0,
            num_backspaces: 100,
            max_combo: 100,
            recorded_wpms: VecDeque::from(vec![1, 2, 3]),
            ..GameState::start(t0)
        };
        let later = t0 + secs(100);
        let state = state
            .increment_combo(&Key::Char('a'), later)
            .record_wpm(later)
            .combo_stopped(later);

        assert_eq!(
            state,
            GameState {
                current_combo: 0,
                max_combo: 1001,
                max_median_wpm: 2,
                combo_at_last_timeout: 1001,
                median_wpm_at_last_timeout: 2,
                combo_timeout: secs(10),
                time_of_last_key: later,
                combo_start: later,
                recorded_wpms: VecDeque::new(),
                num_backspaces: 0,
            }
        );
        // stopping again changes nothing
        assert_eq!(state.combo_stopped(later), state.combo_stopped(later).combo_stopped(later));
        assert_eq!(state.combo_stopped(later), state);
    }

    #[test]
    fn test_second_timeout_keeps_frozen_values() {
        let t0 = frozen();
        let state = GameState {
            current_combo: 42,
            recorded_wpms: VecDeque::from(vec![60, 70, 80]),
            ..GameState::start(t0)
        };
        let stopped = state.combo_stopped(t0).combo_stopped(t0 + secs(30));
        assert_eq!(stopped.combo_at_last_timeout, 42);
        assert_eq!(stopped.median_wpm_at_last_timeout, 70);
        assert_eq!(stopped.combo_start, t0 + secs(30));
    }

    #[test]
    fn test_record_wpm() {
        let t0 = frozen();
        let later = t0 + secs(60);
        let state = GameState {
            current_combo: 100,
            ..GameState::start(t0)
        };
        assert_eq!(state.current_wpm(later), 20);
        assert_eq!(state.record_wpm(later).recorded_wpms, VecDeque::from(vec![20]));
        assert_eq!(state.record_wpm(later).max_median_wpm, 20);

        let full = GameState {
            recorded_wpms: std::iter::repeat(100).take(100).collect(),
            ..state
        }
        .record_wpm(later);
        assert_eq!(full.recorded_wpms.len(), MAX_RECORDED_WPMS);
        assert_eq!(full.recorded_wpms.back(), Some(&20));
        assert_eq!(full.recorded_wpms.front(), Some(&100));
    }

    #[test]
    fn test_record_wpm_skips_zero_samples() {
        let t0 = frozen();
        let state = GameState {
            current_combo: 10,
            ..GameState::start(t0)
        };
        assert!(state.record_wpm(t0 + secs(60)).recorded_wpms.is_empty());
    }

    #[test]
    fn test_maxima_never_decrease() {
        let t0 = frozen();
        let mut state = GameState::start(t0);
        let mut now = t0;
        let mut last_max_combo = 0;
        let mut last_max_median = 0;

        for round in 0..3u64 {
            for _ in 0..(40 + round * 10) {
                now += Duration::from_millis(150);
                state = state.increment_combo(&Key::Char('x'), now);
                if state.at_word_boundary(now) {
                    state = state.record_wpm(now);
                }
                assert!(state.max_combo >= last_max_combo);
                assert!(state.max_median_wpm >= last_max_median);
                assert!(state.max_combo >= state.current_combo);
                assert!(state.max_median_wpm >= state.median_wpm());
                assert!(state.recorded_wpms.len() <= MAX_RECORDED_WPMS);
                last_max_combo = state.max_combo;
                last_max_median = state.max_median_wpm;
            }
            now += secs(11);
            state = state.combo_stopped(now);
            assert!(state.max_combo >= last_max_combo);
            assert!(state.max_median_wpm >= last_max_median);
        }
    }
}
