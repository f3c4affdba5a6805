//! Device controllers.
//!
//! Each controller turns game state snapshots into short ASCII messages for
//! one serial device:
//!
//! - [`screen`] - combo / WPM readout with a countdown bar
//! - [`bell`] - four bell relays struck in rotation
//! - [`strip`] - LED strip filled one pixel per keystroke
//! - [`fan`] - relay that switches on with the combo
//!
//! Every controller writes through a [`MessageWriter`], which never sends the
//! same message twice in a row.

pub mod bell;
pub mod fan;
pub mod screen;
pub mod strip;

pub use bell::BellController;
pub use fan::FanController;
pub use screen::ScreenController;
pub use strip::StripController;

use crate::error::DeviceError;
use crate::game_state::{GameState, Key};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Destination for protocol messages; one message per call
pub trait ByteSink: Send {
    fn write_message(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Something that reacts to game ticks and key presses.
///
/// Both calls receive their own copy of the state.
pub trait Controller: Send {
    fn name(&self) -> &str;

    fn tick(&mut self, state: GameState) -> Result<(), DeviceError>;

    fn key_down(&mut self, key: Key, state: GameState) -> Result<(), DeviceError>;
}

/// Wraps a sink and drops writes identical to the last one that went through
pub struct MessageWriter {
    sink: Box<dyn ByteSink>,
    last_message: Option<String>,
}

impl MessageWriter {
    pub fn new(sink: Box<dyn ByteSink>) -> Self {
        Self {
            sink,
            last_message: None,
        }
    }

    /// Returns `Ok(true)` if the message was written, `Ok(false)` if it was a repeat.
    pub fn send(&mut self, message: String) -> Result<bool, DeviceError> {
        if self.last_message.as_deref() == Some(message.as_str()) {
            return Ok(false);
        }
        self.sink.write_message(message.as_bytes())?;
        debug!(msg = %message, "sent");
        self.last_message = Some(message);
        Ok(true)
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }
}

/// In-memory sink that records every message; clones share the recording
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<String>>>,
    disconnected: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }

    /// Make subsequent writes fail as if the cable was pulled
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.disconnected.store(false, Ordering::SeqCst);
    }
}

impl ByteSink for MemorySink {
    fn write_message(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device disconnected",
            ));
        }
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink lock poisoned"))?;
        messages.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }
}

/// Sink for `--dry-run`: logs what would have gone over the wire
#[derive(Clone, Debug)]
pub struct LogSink {
    device: String,
}

impl LogSink {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl ByteSink for LogSink {
    fn write_message(&mut self, bytes: &[u8]) -> io::Result<()> {
        info!(device = %self.device, msg = %String::from_utf8_lossy(bytes), "write");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn writer_skips_repeated_messages() {
        let sink = MemorySink::new();
        let mut writer = MessageWriter::new(Box::new(sink.clone()));

        assert!(writer.send("1,0;".to_string()).unwrap());
        assert!(!writer.send("1,0;".to_string()).unwrap());
        assert!(writer.send("1,1;".to_string()).unwrap());
        assert!(writer.send("1,0;".to_string()).unwrap());

        assert_eq!(sink.messages(), vec!["1,0;", "1,1;", "1,0;"]);
        assert_eq!(writer.last_message(), Some("1,0;"));
    }

    #[test]
    fn failed_write_is_retried() {
        let sink = MemorySink::new();
        let mut writer = MessageWriter::new(Box::new(sink.clone()));

        sink.disconnect();
        assert_matches!(
            writer.send("0000".to_string()),
            Err(DeviceError::WriteFailure(_))
        );
        assert_eq!(writer.last_message(), None);

        sink.reconnect();
        assert!(writer.send("0000".to_string()).unwrap());
        assert_eq!(sink.messages(), vec!["0000"]);
    }

    #[test]
    fn memory_sink_clear() {
        let mut sink = MemorySink::new();
        sink.write_message(b"abc").unwrap();
        sink.clear();
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn log_sink_accepts_everything() {
        let mut sink = LogSink::new("screen");
        assert!(sink.write_message(b"e,0.0,0  0;").is_ok());
    }
}
