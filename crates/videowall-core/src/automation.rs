//! The GUI automation capabilities the bridge drives.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use videowall_nav::Key;

use crate::error::{Error, Result};

/// Controls bound once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Arrow button that drops the presets list open.
    Dropdown,
    /// Switcher button that recalls the highlighted preset.
    GoButton,
    /// Switcher main window.
    SwitcherWindow,
    /// Player effects dialog "negate colors" checkbox.
    NegateColors,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::Dropdown => "presets dropdown",
            Target::GoButton => "GO button",
            Target::SwitcherWindow => "switcher window",
            Target::NegateColors => "negate colors checkbox",
        })
    }
}

pub trait Automation {
    /// Invoke-style click, no pointer movement.
    fn click(&mut self, target: Target) -> Result<()>;

    /// Moves the pointer onto the control and clicks it.
    fn click_input(&mut self, target: Target) -> Result<()>;

    /// Sends a keystroke to whatever has focus.
    fn send_keys(&mut self, key: Key) -> Result<()>;

    /// Blocks until the window is visible and accepting input.
    fn wait_ready(&mut self, target: Target) -> Result<()>;
}

impl<A: Automation + ?Sized> Automation for &mut A {
    fn click(&mut self, target: Target) -> Result<()> {
        (**self).click(target)
    }

    fn click_input(&mut self, target: Target) -> Result<()> {
        (**self).click_input(target)
    }

    fn send_keys(&mut self, key: Key) -> Result<()> {
        (**self).send_keys(key)
    }

    fn wait_ready(&mut self, target: Target) -> Result<()> {
        (**self).wait_ready(target)
    }
}

impl<A: Automation + ?Sized> Automation for Box<A> {
    fn click(&mut self, target: Target) -> Result<()> {
        (**self).click(target)
    }

    fn click_input(&mut self, target: Target) -> Result<()> {
        (**self).click_input(target)
    }

    fn send_keys(&mut self, key: Key) -> Result<()> {
        (**self).send_keys(key)
    }

    fn wait_ready(&mut self, target: Target) -> Result<()> {
        (**self).wait_ready(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationCall {
    Click(Target),
    ClickInput(Target),
    SendKeys(Key),
    WaitReady(Target),
}

impl fmt::Display for AutomationCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationCall::Click(t) => write!(f, "click {t}"),
            AutomationCall::ClickInput(t) => write!(f, "pointer click {t}"),
            AutomationCall::SendKeys(k) => write!(f, "send {k}"),
            AutomationCall::WaitReady(t) => write!(f, "wait for {t}"),
        }
    }
}

/// Backend that performs nothing and remembers every call. Clones share the
/// same call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAutomation {
    calls: Arc<Mutex<Vec<AutomationCall>>>,
    fail_on: Option<AutomationCall>,
}

impl RecordingAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given call return an error instead of being recorded.
    pub fn failing_on(mut self, call: AutomationCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<AutomationCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: AutomationCall) -> Result<()> {
        if self.fail_on == Some(call) {
            return Err(Error::Automation(format!("{call} rejected")));
        }
        log::info!("automation: {call}");
        self.calls.lock().push(call);
        Ok(())
    }
}

impl Automation for RecordingAutomation {
    fn click(&mut self, target: Target) -> Result<()> {
        self.record(AutomationCall::Click(target))
    }

    fn click_input(&mut self, target: Target) -> Result<()> {
        self.record(AutomationCall::ClickInput(target))
    }

    fn send_keys(&mut self, key: Key) -> Result<()> {
        self.record(AutomationCall::SendKeys(key))
    }

    fn wait_ready(&mut self, target: Target) -> Result<()> {
        self.record(AutomationCall::WaitReady(target))
    }
}
