use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use serialport::SerialPortInfo;
use std::io::{ErrorKind, Read};
use std::time::Duration;

use crate::error::Result;

/// Read timeout on the port, so the reader thread notices `close()`.
const READ_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, serial_number, manufacturer, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.serial_number.clone(),
                usb.manufacturer.clone(),
                usb.product.clone(),
            ),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None, None, None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            serial_number,
            manufacturer,
            product,
        }
    }
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => write!(f, "{} ({:04X}:{:04X})", self.port_name, vid, pid)?,
            _ => write!(f, "{} [{}]", self.port_name, self.port_type)?,
        }
        let label: Vec<&str> = [&self.manufacturer, &self.product]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .collect();
        if !label.is_empty() {
            write!(f, " {}", label.join(" "))?;
        }
        if let Some(sn) = &self.serial_number {
            write!(f, " s/n {sn}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(p: Parity) -> Self {
        match p {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Bits per character. Anything outside 5..=8 is rejected when loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl TryFrom<u8> for DataBits {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            _ => Err(format!("data bits must be 5 to 8, got {n}")),
        }
    }
}

impl From<DataBits> for u8 {
    fn from(d: DataBits) -> u8 {
        match d {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(d: DataBits) -> Self {
        match d {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StopBits {
    One,
    Two,
}

impl TryFrom<u8> for StopBits {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            _ => Err(format!("stop bits must be 1 or 2, got {n}")),
        }
    }
}

impl From<StopBits> for u8 {
    fn from(s: StopBits) -> u8 {
        match s {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(s: StopBits) -> Self {
        match s {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: "COM13".to_string(),
            baud_rate: 9_600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
        }
    }
}

impl SerialConfig {
    fn flow_control(&self) -> serialport::FlowControl {
        if self.flow_control {
            serialport::FlowControl::Hardware
        } else {
            serialport::FlowControl::None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SerialEvent {
    Opened(String),
    Rx(Vec<u8>),
    Error(String),
    Closed,
}

enum Command {
    Close,
}

pub struct SerialService {
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<SerialEvent>,
}

impl SerialService {
    pub fn list_ports() -> Vec<PortInfo> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(PortInfo::from)
            .collect()
    }

    /// Opens the port on the caller's thread so a missing device fails here,
    /// then hands it to a reader thread that streams `SerialEvent`s.
    pub fn open(cfg: SerialConfig) -> Result<Self> {
        let port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits.into())
            .parity(cfg.parity.into())
            .stop_bits(cfg.stop_bits.into())
            .flow_control(cfg.flow_control())
            .timeout(READ_POLL)
            .open()?;
        log::info!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);
        Ok(Self::from_reader(port, cfg.port_name))
    }

    /// Runs the reader thread over any byte stream. `open` uses it with the
    /// real port; tests feed it in-memory readers.
    pub fn from_reader<R>(mut port: R, port_name: impl Into<String>) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<SerialEvent>();
        let port_name = port_name.into();

        std::thread::spawn(move || {
            let _ = tx_evt.send(SerialEvent::Opened(port_name));
            let mut buf = [0u8; 64];
            loop {
                if let Ok(Command::Close) = rx_cmd.try_recv() {
                    let _ = tx_evt.send(SerialEvent::Closed);
                    return;
                }
                match port.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx_evt.send(SerialEvent::Closed);
                        return;
                    }
                    Ok(n) => {
                        if tx_evt.send(SerialEvent::Rx(buf[..n].to_vec())).is_err() {
                            return;
                        }
                    }
                    Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
                    Err(e) => {
                        let _ = tx_evt.send(SerialEvent::Error(e.to_string()));
                        let _ = tx_evt.send(SerialEvent::Closed);
                        return;
                    }
                }
            }
        });

        Self { tx_cmd, rx_evt }
    }

    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Close);
    }

    pub fn events(&self) -> &Receiver<SerialEvent> {
        &self.rx_evt
    }
}

impl Drop for SerialService {
    fn drop(&mut self) {
        self.close();
    }
}
