use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use tracing::debug;

use crate::codec::LinkConfig;
use crate::link::{Link, LinkOpener};

/// Opens the gateway's UART as 8N1 without flow control.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialOpener {
    pub fn new(port: impl Into<String>, config: &LinkConfig) -> Self {
        Self {
            port: port.into(),
            baud_rate: config.baud_rate,
            read_timeout: config.read_timeout,
        }
    }

    /// Device path this opener targets.
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl LinkOpener for SerialOpener {
    fn open(&mut self) -> io::Result<Box<dyn Link>> {
        let port = serialport::new(&self.port, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open()?;
        debug!(port = %self.port, baud = self.baud_rate, "serial port opened");
        Ok(Box::new(SerialLink { port }))
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.port, self.baud_rate)
    }
}

struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Link for SerialLink {
    fn try_clone_link(&self) -> io::Result<Box<dyn Link>> {
        let port = self.port.try_clone()?;
        Ok(Box::new(SerialLink { port }))
    }
}

/// A serial device visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    pub description: Option<String>,
}

/// List serial ports visible to the host.
pub fn available_ports() -> io::Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| {
            let (kind, description) = match info.port_type {
                SerialPortType::UsbPort(usb) => (
                    "usb",
                    Some(format!(
                        "{:04x}:{:04x} {}",
                        usb.vid,
                        usb.pid,
                        usb.product.unwrap_or_default()
                    )),
                ),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: info.port_name,
                kind,
                description,
            }
        })
        .collect())
}

/// First serial port found on the host, if any.
pub fn auto_detect_port() -> Option<String> {
    match available_ports() {
        Ok(ports) => ports.into_iter().next().map(|p| p.name),
        Err(err) => {
            debug!(err = %err, "serial port enumeration failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_includes_port_and_baud() {
        let opener = SerialOpener::new("/dev/ttyUSB0", &LinkConfig::default());
        assert_eq!(opener.describe(), "/dev/ttyUSB0@115200");
        assert_eq!(opener.port(), "/dev/ttyUSB0");
    }

    #[test]
    fn missing_device_fails_to_open() {
        let mut opener = SerialOpener::new(
            format!("/dev/rsnlink-missing-{}", std::process::id()),
            &LinkConfig::default(),
        );
        assert!(opener.open().is_err());
    }
}
