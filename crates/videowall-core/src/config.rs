//! Operator configuration.
//!
//! Process ids and window handles change every time the player is started,
//! so the file is expected to be edited before each run. Defaults are the
//! values from the original video wall install.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use videowall_nav::{default_bindings, Binding};

use crate::error::{Error, Result};
use crate::locator::{AppLocator, ControlLocator, ControlTypeRef, WindowLocator};
use crate::serial_service::SerialConfig;

pub const SWITCHER_TITLE: &str =
    "Extron's MATRIX SWITCHERS Control Program    ver 8.4   ©1996-2014 Extron Electronics";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub app: AppLocator,
    /// Effects and filters dialog.
    pub window: WindowLocator,
    pub negate_colors: ControlLocator,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            app: AppLocator::ProcessId(24280),
            window: WindowLocator::Handle(0xA406DC),
            negate_colors: ControlLocator::ControlType(ControlTypeRef::new("CheckBox", 2)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitcherConfig {
    pub app: AppLocator,
    pub window: WindowLocator,
    pub go_button: ControlLocator,
    /// Presets combo box, searched within the window.
    pub presets: ControlLocator,
    /// Drop-down arrow, searched within the presets combo box.
    pub dropdown: ControlLocator,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            app: AppLocator::ExePath("MTRX.exe".to_string()),
            window: WindowLocator::Title(SWITCHER_TITLE.to_string()),
            go_button: ControlLocator::Name("GO".to_string()),
            presets: ControlLocator::AutomationId("23".to_string()),
            dropdown: ControlLocator::AutomationId("DropDown".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub player: PlayerConfig,
    pub switcher: SwitcherConfig,
    pub bindings: Vec<Binding>,
    /// Upper bound on waiting for the switcher window to accept input.
    pub ready_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            player: PlayerConfig::default(),
            switcher: SwitcherConfig::default(),
            bindings: default_bindings(),
            ready_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// `<config dir>/videowall-io/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("videowall-io").join("config.json"))
    }

    /// Reads `path`, or returns the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("{} not found, using built-in defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use videowall_nav::{Action, PresetIndex};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("does-not-exist.json")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.serial.port_name, "COM13");
        assert_eq!(cfg.ready_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("saved.json");
        let mut cfg = Config::default();
        cfg.serial.port_name = "/dev/ttyACM0".into();
        cfg.player.app = AppLocator::ProcessId(4242);
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(
            &path,
            r#"{
                "serial": { "port_name": "COM8" },
                "bindings": [
                    { "byte": "1", "action": "toggle_colors" },
                    { "byte": "3", "action": "select_preset", "preset": 15 }
                ]
            }"#,
        )
        .unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.serial.port_name, "COM8");
        assert_eq!(cfg.serial.baud_rate, 9_600);
        assert_eq!(cfg.switcher, SwitcherConfig::default());
        assert_eq!(
            cfg.bindings[1].action,
            Action::SelectPreset { preset: PresetIndex::new(15).unwrap() }
        );
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn unsupported_framing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("data.json", r#"{"serial":{"data_bits":9}}"#),
            ("stop.json", r#"{"serial":{"stop_bits":3}}"#),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            let err = Config::load(&path).unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "{body}");
        }
    }

    #[test]
    fn out_of_range_preset_binding_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        std::fs::write(
            &path,
            r#"{"bindings":[{"byte":"2","action":"select_preset","preset":17}]}"#,
        )
        .unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config { .. })));
    }
}
