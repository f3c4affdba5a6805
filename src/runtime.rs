use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use crate::game_state::{Key, KeyEvent, KeyKind};
use crate::manager::GameManager;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Shortest tick interval; a zero interval would never leave time to read keys
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Unified event type consumed by the runner
#[derive(Clone, Debug, PartialEq)]
pub enum PowerEvent {
    Key(KeyEvent),
    Tick,
    Shutdown,
}

/// Source of key events
pub trait PowerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PowerEvent, RecvTimeoutError>;
}

/// Production event source reading the terminal keyboard through crossterm.
/// The terminal must be in raw mode; Ctrl-C ends the session.
pub struct CrosstermEventSource {
    rx: Receiver<PowerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        let _ = tx.send(PowerEvent::Shutdown);
                        break;
                    }
                    if tx.send(PowerEvent::Key(translate_key(key))).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PowerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Auto-repeat counts as a press, like a held key on a hardware hook.
pub fn translate_key(key: event::KeyEvent) -> KeyEvent {
    let kind = match key.kind {
        KeyEventKind::Release => KeyKind::Release,
        KeyEventKind::Press | KeyEventKind::Repeat => KeyKind::Press,
    };
    let key = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        _ => Key::Other,
    };
    KeyEvent { key, kind }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_TICK_INTERVAL),
        }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<PowerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PowerEvent>) -> Self {
        Self { rx }
    }
}

impl PowerEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PowerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Single consumer for key events and ticks. Everything that touches the
/// game state goes through here, one event at a time.
pub struct Runner<E: PowerEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: PowerEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    fn schedule_next_tick(&mut self, now: Instant) {
        self.next_tick += self.ticker.interval();
        // fell more than a whole interval behind, don't try to catch up
        if self.next_tick <= now {
            self.next_tick = now + self.ticker.interval();
        }
    }

    /// Blocks until the next key event or the tick deadline, whichever is first
    pub fn step(&mut self) -> PowerEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            self.schedule_next_tick(now);
            return PowerEvent::Tick;
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                self.schedule_next_tick(Instant::now());
                PowerEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => PowerEvent::Shutdown,
        }
    }

    /// Drive the manager until the event source shuts down
    pub fn run(&mut self, manager: &mut GameManager) {
        info!(
            interval_ms = self.ticker.interval().as_millis() as u64,
            "running"
        );
        loop {
            match self.step() {
                PowerEvent::Tick => manager.trigger_tick(),
                PowerEvent::Key(KeyEvent {
                    key,
                    kind: KeyKind::Press,
                }) => manager.trigger_key_down(key),
                PowerEvent::Key(_) => {}
                PowerEvent::Shutdown => {
                    debug!("event source closed");
                    break;
                }
            }
        }
    }
}
