// Library surface for the binary and the integration tests.
pub mod clock;
pub mod config;
pub mod controllers;
pub mod devices;
pub mod error;
pub mod game_state;
pub mod logging;
pub mod manager;
pub mod runtime;
pub mod setup;
pub mod util;

pub use error::DeviceError;
pub use game_state::{GameState, Key, KeyEvent, KeyKind};
pub use manager::GameManager;
