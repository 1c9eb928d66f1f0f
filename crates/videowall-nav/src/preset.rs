//! Dropdown navigation plans for the switcher's preset list.
//!
//! The presets combo box only moves its highlight relative to the current
//! entry, so selecting preset `n` means opening the list from the top and
//! stepping to it with arrow and page keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entries the list jumps per `{PGDN}`. Measured on the switcher's combo box.
pub const PAGE_SIZE: u32 = 7;
/// Number of saved presets in the switcher.
pub const PRESET_COUNT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PresetIndex(u32);

impl PresetIndex {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = PRESET_COUNT;

    pub const fn new(n: u32) -> Option<Self> {
        if n >= Self::MIN && n <= Self::MAX {
            Some(Self(n))
        } else {
            None
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for PresetIndex {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n).ok_or_else(|| {
            format!("preset {n} out of range {}..={}", Self::MIN, Self::MAX)
        })
    }
}

impl From<PresetIndex> for u32 {
    fn from(p: PresetIndex) -> u32 {
        p.0
    }
}

impl fmt::Display for PresetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Down,
    Up,
    PageDown,
}

impl Key {
    /// Special-key token understood by keystroke senders.
    pub fn token(&self) -> &'static str {
        match self {
            Key::Down => "{DOWN}",
            Key::Up => "{UP}",
            Key::PageDown => "{PGDN}",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One step of driving the dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    OpenDropdown,
    WaitReady,
    Send(Key),
    Confirm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationPlan {
    keys: Vec<Key>,
    confirm: bool,
}

impl NavigationPlan {
    fn build(page_downs: usize, step: Key, steps: u32) -> Self {
        let mut keys = vec![Key::PageDown; page_downs];
        keys.extend(std::iter::repeat(step).take(steps as usize));
        Self { keys, confirm: true }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && !self.confirm
    }

    /// Expands the plan into the command stream. The list is clicked open and
    /// waited on before every key, then confirmed once at the end.
    pub fn commands(&self) -> Vec<NavCommand> {
        let mut out = Vec::with_capacity(self.keys.len() * 3 + 1);
        for key in &self.keys {
            out.push(NavCommand::OpenDropdown);
            out.push(NavCommand::WaitReady);
            out.push(NavCommand::Send(*key));
        }
        if self.confirm {
            out.push(NavCommand::Confirm);
        }
        out
    }
}

/// Plan for reaching preset `n` from the top of a freshly opened list.
/// Anything outside `1..=16` gets the empty plan.
pub fn navigation_plan(n: i64) -> NavigationPlan {
    let page = PAGE_SIZE as i64;
    match n {
        1..=4 => NavigationPlan::build(0, Key::Down, n as u32),
        5..=7 => NavigationPlan::build(1, Key::Up, (page - n) as u32),
        8..=11 => NavigationPlan::build(1, Key::Down, (n - page) as u32),
        12..=14 => NavigationPlan::build(2, Key::Up, (2 * page - n) as u32),
        15..=16 => NavigationPlan::build(2, Key::Down, (n - 2 * page) as u32),
        _ => NavigationPlan::default(),
    }
}
