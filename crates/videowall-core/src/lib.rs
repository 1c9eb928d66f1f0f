//! Core functionalities: serial I/O, automation seam, preset navigation, event loop, settings.

pub mod automation;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod locator;
pub mod navigator;
pub mod serial_service;

pub use automation::{Automation, AutomationCall, RecordingAutomation, Target};
pub use config::{Config, PlayerConfig, SwitcherConfig};
pub use error::{Error, Result};
pub use event_loop::{EventLoop, RunSummary};
pub use locator::{AppLocator, ControlLocator, ControlTypeRef, WindowLocator};
pub use navigator::PresetNavigator;
pub use serial_service::{DataBits, Parity, PortInfo, SerialConfig, SerialEvent, SerialService, StopBits};
