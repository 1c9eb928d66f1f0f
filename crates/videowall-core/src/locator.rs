//! Where a backend finds the applications, windows and controls it drives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which running application to attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppLocator {
    ProcessId(u32),
    /// Executable file name or full path, e.g. `MTRX.exe`.
    ExePath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowLocator {
    /// Exact window title.
    Title(String),
    /// Native window handle.
    Handle(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlLocator {
    AutomationId(String),
    /// Caption or label text.
    Name(String),
    ControlType(ControlTypeRef),
}

/// The n-th control of a kind in tree order, written like `CheckBox2`.
///
/// Index 0 and 1 both mean the first match and a bare `CheckBox` is the
/// first as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlTypeRef {
    pub kind: String,
    pub index: usize,
}

impl ControlTypeRef {
    pub fn new(kind: impl Into<String>, index: usize) -> Self {
        Self { kind: kind.into(), index }
    }

    /// Zero-based position among controls of this kind.
    pub fn position(&self) -> usize {
        self.index.max(1) - 1
    }
}

impl std::str::FromStr for ControlTypeRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(s.len());
        let (kind, digits) = s.split_at(split);
        if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("bad control reference {s:?}"));
        }
        let index = if digits.is_empty() {
            0
        } else {
            digits
                .parse()
                .map_err(|_| format!("bad control index in {s:?}"))?
        };
        Ok(Self::new(kind, index))
    }
}

impl TryFrom<String> for ControlTypeRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ControlTypeRef> for String {
    fn from(r: ControlTypeRef) -> String {
        r.to_string()
    }
}

impl fmt::Display for ControlTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}{}", self.kind, self.index)
        }
    }
}

impl fmt::Display for ControlLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlLocator::AutomationId(id) => write!(f, "automation id {id:?}"),
            ControlLocator::Name(name) => write!(f, "control {name:?}"),
            ControlLocator::ControlType(r) => write!(f, "{r}"),
        }
    }
}

impl fmt::Display for WindowLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowLocator::Title(t) => write!(f, "window {t:?}"),
            WindowLocator::Handle(h) => write!(f, "window {h:#X}"),
        }
    }
}

impl fmt::Display for AppLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppLocator::ProcessId(pid) => write!(f, "process {pid}"),
            AppLocator::ExePath(path) => write!(f, "{path}"),
        }
    }
}
