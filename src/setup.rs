use crate::clock::Clock;
use crate::config::Config;
use crate::controllers::{
    BellController, ByteSink, Controller, FanController, LogSink, ScreenController,
    StripController,
};
use crate::devices::{find_device, PortInfo, PortResolver};
use crate::error::DeviceError;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Screen,
    Bell,
    Strip,
    Fan,
}

impl DeviceKind {
    /// Registration order, which is also dispatch order
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::Screen,
        DeviceKind::Bell,
        DeviceKind::Strip,
        DeviceKind::Fan,
    ];

    pub fn identifier(self, config: &Config) -> &str {
        match self {
            DeviceKind::Screen => &config.devices.screen,
            DeviceKind::Bell => &config.devices.bell,
            DeviceKind::Strip => &config.devices.strip,
            DeviceKind::Fan => &config.devices.fan,
        }
    }
}

pub fn make_controller(
    kind: DeviceKind,
    sink: Box<dyn ByteSink>,
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Box<dyn Controller> {
    match kind {
        DeviceKind::Screen => Box::new(ScreenController::new(sink, clock)),
        DeviceKind::Bell => Box::new(BellController::new(sink, clock)),
        DeviceKind::Strip => {
            Box::new(StripController::new(sink).with_write_delay(config.strip_write_delay()))
        }
        DeviceKind::Fan => Box::new(FanController::with_threshold(sink, config.fan_threshold)),
    }
}

/// Look up every configured device and build a controller for each one found.
///
/// Missing devices and ports that fail to open are skipped with a warning.
pub fn build_controllers<R, F>(
    config: &Config,
    resolver: &R,
    clock: Arc<dyn Clock>,
    mut open_sink: F,
) -> Vec<Box<dyn Controller>>
where
    R: PortResolver + ?Sized,
    F: FnMut(&PortInfo) -> Result<Box<dyn ByteSink>, DeviceError>,
{
    let mut controllers = Vec::new();
    for kind in DeviceKind::ALL {
        let identifier = kind.identifier(config);
        if identifier.is_empty() {
            info!(device = %kind, "disabled");
            continue;
        }

        let found = match find_device(resolver, identifier) {
            Ok(found) => found,
            Err(e) => {
                warn!(device = %kind, error = %e, "skipping controller");
                continue;
            }
        };
        if let Some(warning) = &found.warning {
            warn!(
                device = %kind,
                path = %found.port.path,
                description = %found.port.description,
                "{warning}, going with the first"
            );
        }

        match open_sink(&found.port) {
            Ok(sink) => {
                info!(device = %kind, path = %found.port.path, "controller ready");
                controllers.push(make_controller(kind, sink, config, clock.clone()));
            }
            Err(e) => warn!(device = %kind, path = %found.port.path, error = %e, "could not open"),
        }
    }
    controllers
}

/// Controllers that log their messages instead of touching hardware
pub fn dry_run_controllers(config: &Config, clock: Arc<dyn Clock>) -> Vec<Box<dyn Controller>> {
    DeviceKind::ALL
        .into_iter()
        .filter(|kind| !kind.identifier(config).is_empty())
        .map(|kind| {
            make_controller(
                kind,
                Box::new(LogSink::new(kind.to_string())),
                config,
                clock.clone(),
            )
        })
        .collect()
}
