use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode},
    tty::IsTty,
};
use power_mode::{
    clock::{Clock, SystemClock},
    config::{ConfigStore, FileConfigStore},
    controllers::ByteSink,
    devices::{PortResolver, SerialPortResolver, SerialSink},
    logging::setup_logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    setup::{build_controllers, dry_run_controllers},
    GameManager, GameState,
};
use std::{error::Error, io::stdin, path::PathBuf, sync::Arc};
use tracing::{info, warn};

/// drive led strips, bell relays and a combo screen from your typing
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Watches your keystrokes, tracks your typing combo and words per minute, and drives serial devices (status screen, bell relays, LED strip, fan relay) to match. Press Ctrl-C to stop."
)]
pub struct Cli {
    /// config file to use instead of the one in the user config directory
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// list the serial ports that can be matched against and exit
    #[clap(long)]
    list_ports: bool,

    /// log every message instead of writing to serial devices
    #[clap(long)]
    dry_run: bool,

    /// tick interval in milliseconds
    #[clap(long)]
    tick_ms: Option<u64>,

    /// write the effective configuration back to the config file
    #[clap(long)]
    save_config: bool,

    /// enable debug logging (RUST_LOG takes precedence)
    #[clap(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if cli.list_ports {
        for port in SerialPortResolver.list()? {
            println!("{}\t{}", port.path, port.description);
        }
        return Ok(());
    }

    let store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let mut config = store.load();
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "saved config");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let controllers = if cli.dry_run {
        dry_run_controllers(&config, clock.clone())
    } else {
        build_controllers(&config, &SerialPortResolver, clock.clone(), |port| {
            let sink = SerialSink::open(&port.path, config.baud_rate)?;
            Ok(Box::new(sink) as Box<dyn ByteSink>)
        })
    };
    if controllers.is_empty() {
        warn!("no devices found, only tracking the combo");
    }

    let game_state = GameState::start_with_timeout(clock.now(), config.combo_timeout());
    let mut manager = GameManager::with_state(game_state, controllers, clock);
    info!(controllers = ?manager.controller_names(), "starting game");

    enable_raw_mode()?;
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(config.tick_interval()),
    );
    runner.run(&mut manager);
    disable_raw_mode()?;

    let state = manager.game_state();
    info!(
        max_combo = state.max_combo,
        max_median_wpm = state.max_median_wpm,
        "game over"
    );
    Ok(())
}
