use crate::controllers::ByteSink;
use crate::error::DeviceError;
use serialport::{SerialPort, SerialPortType};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BAUD_RATE: u32 = 9600;
const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// A serial port as seen during discovery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortInfo {
    pub path: String,
    pub description: String,
}

impl PortInfo {
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }

    fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.path.to_lowercase().contains(&pattern)
            || self.description.to_lowercase().contains(&pattern)
    }
}

/// Lists the serial ports currently attached
pub trait PortResolver {
    fn list(&self) -> Result<Vec<PortInfo>, DeviceError>;
}

/// Enumerates real ports through the `serialport` crate
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialPortResolver;

impl PortResolver for SerialPortResolver {
    fn list(&self) -> Result<Vec<PortInfo>, DeviceError> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(|port| {
                let description = match &port.port_type {
                    SerialPortType::UsbPort(usb) => [
                        usb.product.clone(),
                        usb.manufacturer.clone(),
                        usb.serial_number.clone(),
                        Some(format!("{:04x}:{:04x}", usb.vid, usb.pid)),
                    ]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<String>>()
                    .join(" "),
                    SerialPortType::PciPort => "PCI".to_string(),
                    SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                    SerialPortType::Unknown => String::new(),
                };
                PortInfo::new(port.port_name, description)
            })
            .collect())
    }
}

/// Fixed port list, for tests and offline runs
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    ports: Vec<PortInfo>,
}

impl StaticResolver {
    pub fn new(ports: Vec<PortInfo>) -> Self {
        Self { ports }
    }
}

impl PortResolver for StaticResolver {
    fn list(&self) -> Result<Vec<PortInfo>, DeviceError> {
        Ok(self.ports.clone())
    }
}

/// Result of a lookup; `warning` is set when several ports matched
#[derive(Debug)]
pub struct DeviceMatch {
    pub port: PortInfo,
    pub warning: Option<DeviceError>,
}

/// Case-insensitive substring match on path and description.
/// Several matches resolve to the first by path.
pub fn find_device<R: PortResolver + ?Sized>(
    resolver: &R,
    pattern: &str,
) -> Result<DeviceMatch, DeviceError> {
    let mut matches = resolver
        .list()?
        .into_iter()
        .filter(|port| port.matches(pattern))
        .collect::<Vec<PortInfo>>();
    matches.sort_by(|a, b| a.path.cmp(&b.path));

    let count = matches.len();
    let port = matches
        .into_iter()
        .next()
        .ok_or_else(|| DeviceError::NotFound(pattern.to_string()))?;
    let warning = (count > 1).then(|| DeviceError::Ambiguous {
        pattern: pattern.to_string(),
        count,
    });
    Ok(DeviceMatch { port, warning })
}

/// Serial connection that reopens itself after the device comes back
pub struct SerialSink {
    path: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialSink {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, DeviceError> {
        let port = Self::connect(path, baud_rate)?;
        info!(path, baud_rate, "opened serial port");
        Ok(Self {
            path: path.to_string(),
            baud_rate,
            port: Some(port),
        })
    }

    fn connect(path: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, serialport::Error> {
        serialport::new(path, baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
    }
}

impl ByteSink for SerialSink {
    fn write_message(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut port = match self.port.take() {
            Some(port) => port,
            None => {
                let port = Self::connect(&self.path, self.baud_rate)
                    .map_err(|e| io::Error::new(io::ErrorKind::NotConnected, e))?;
                info!(path = %self.path, "reconnected serial port");
                port
            }
        };

        match port.write_all(bytes).and_then(|_| port.flush()) {
            Ok(()) => {
                self.port = Some(port);
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "dropping serial connection");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn resolver() -> StaticResolver {
        StaticResolver::new(vec![
            PortInfo::new("/dev/ttyACM1", "Arduino Uno 2341:0043"),
            PortInfo::new("/dev/ttyACM0", "Arduino Uno 2341:0043"),
            PortInfo::new("/dev/ttyUSB0", "Adafruit Metro M0 239a:8013"),
            PortInfo::new("/dev/ttyS0", "PCI"),
        ])
    }

    #[test]
    fn single_match() {
        let found = find_device(&resolver(), "adafruit metro").unwrap();
        assert_eq!(found.port.path, "/dev/ttyUSB0");
        assert!(found.warning.is_none());
    }

    #[test]
    fn path_match() {
        let found = find_device(&resolver(), "ttyS0").unwrap();
        assert_eq!(found.port.description, "PCI");
    }

    #[test]
    fn several_matches_pick_first_by_path() {
        let found = find_device(&resolver(), "Arduino Uno").unwrap();
        assert_eq!(found.port.path, "/dev/ttyACM0");
        assert_matches!(
            found.warning,
            Some(DeviceError::Ambiguous { count: 2, .. })
        );
    }

    #[test]
    fn no_match() {
        assert_matches!(
            find_device(&resolver(), "IOUSBHostDevice"),
            Err(DeviceError::NotFound(pattern)) if pattern == "IOUSBHostDevice"
        );
    }

    #[test]
    fn missing_port_fails_to_open() {
        assert!(SerialSink::open("/dev/power-mode-does-not-exist", DEFAULT_BAUD_RATE).is_err());
    }
}
