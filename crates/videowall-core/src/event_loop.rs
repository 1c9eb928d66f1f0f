//! Serial byte dispatch.

use crossbeam_channel::{select, Receiver};
use videowall_nav::{actions_for, Action, Binding};

use crate::automation::{Automation, Target};
use crate::error::{Error, Result};
use crate::navigator::PresetNavigator;
use crate::serial_service::SerialEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub bytes: u64,
    pub actions: u64,
    pub ignored: u64,
}

pub struct EventLoop<A> {
    automation: A,
    bindings: Vec<Binding>,
    summary: RunSummary,
}

impl<A: Automation> EventLoop<A> {
    pub fn new(automation: A, bindings: Vec<Binding>) -> Self {
        Self {
            automation,
            bindings,
            summary: RunSummary::default(),
        }
    }

    /// Handles serial events until `stop` fires or is dropped. Each byte runs
    /// to completion before the next is looked at; later bytes wait in the
    /// channel.
    pub fn run(&mut self, events: &Receiver<SerialEvent>, stop: &Receiver<()>) -> Result<RunSummary> {
        loop {
            select! {
                recv(stop) -> _ => {
                    log::info!("stop requested");
                    return Ok(self.summary);
                }
                recv(events) -> evt => match evt {
                    Ok(SerialEvent::Opened(port)) => log::info!("listening on {port}"),
                    Ok(SerialEvent::Rx(data)) => {
                        for byte in data {
                            self.handle_byte(byte)?;
                        }
                    }
                    Ok(SerialEvent::Error(e)) => return Err(Error::Transport(e)),
                    Ok(SerialEvent::Closed) | Err(_) => return Err(Error::TransportClosed),
                },
            }
        }
    }

    /// Fires every action bound to `byte` and returns how many ran.
    pub fn handle_byte(&mut self, byte: u8) -> Result<usize> {
        self.summary.bytes += 1;
        let actions = actions_for(&self.bindings, byte);
        if actions.is_empty() {
            log::debug!("ignoring byte {byte:#04x}");
            self.summary.ignored += 1;
            return Ok(0);
        }

        for action in &actions {
            self.perform(*action)?;
            self.summary.actions += 1;
            log::info!("Button {} event detected", byte.escape_ascii());
        }
        Ok(actions.len())
    }

    fn perform(&mut self, action: Action) -> Result<()> {
        match action {
            Action::ToggleColors => self.automation.click_input(Target::NegateColors),
            Action::SelectPreset { preset } => {
                log::debug!("recalling preset {preset}");
                PresetNavigator::new(&mut self.automation).select_preset(i64::from(preset.get()))?;
                Ok(())
            }
        }
    }

    fn summary(&self) -> RunSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{AutomationCall as Call, RecordingAutomation};
    use crossbeam_channel::{bounded, unbounded};
    use std::time::Duration;
    use videowall_nav::{default_bindings, Key, PresetIndex};

    fn toggles(calls: &[Call]) -> usize {
        calls.iter().filter(|c| **c == Call::ClickInput(Target::NegateColors)).count()
    }

    fn nav_calls(calls: &[Call]) -> usize {
        calls.len() - toggles(calls)
    }

    #[test]
    fn button_one_toggles_colors_only() {
        let rec = RecordingAutomation::new();
        let mut el = EventLoop::new(rec.clone(), default_bindings());
        assert_eq!(el.handle_byte(0x31).unwrap(), 1);
        let calls = rec.calls();
        assert_eq!(toggles(&calls), 1);
        assert_eq!(nav_calls(&calls), 0);
    }

    #[test]
    fn button_two_selects_preset_two() {
        let rec = RecordingAutomation::new();
        let mut el = EventLoop::new(rec.clone(), default_bindings());
        assert_eq!(el.handle_byte(0x32).unwrap(), 1);
        let calls = rec.calls();
        assert_eq!(toggles(&calls), 0);
        let downs = calls.iter().filter(|c| **c == Call::SendKeys(Key::Down)).count();
        assert_eq!(downs, 2);
        assert_eq!(calls.last(), Some(&Call::Click(Target::GoButton)));
    }

    #[test]
    fn other_bytes_do_nothing() {
        let rec = RecordingAutomation::new();
        let mut el = EventLoop::new(rec.clone(), default_bindings());
        for byte in [b'0', b'3', b'\r', b'\n', 0x00, 0xFF] {
            assert_eq!(el.handle_byte(byte).unwrap(), 0);
        }
        assert!(rec.calls().is_empty());
        assert_eq!(el.summary(), RunSummary { bytes: 6, actions: 0, ignored: 6 });
    }

    #[test]
    fn overlapping_bindings_both_fire() {
        let rec = RecordingAutomation::new();
        let bindings = vec![
            Binding::new(b'1', Action::ToggleColors),
            Binding::new(b'1', Action::SelectPreset { preset: PresetIndex::new(7).unwrap() }),
        ];
        let mut el = EventLoop::new(rec.clone(), bindings);
        assert_eq!(el.handle_byte(b'1').unwrap(), 2);
        let calls = rec.calls();
        assert_eq!(calls.first(), Some(&Call::ClickInput(Target::NegateColors)));
        assert!(calls.contains(&Call::SendKeys(Key::PageDown)));
    }

    #[test]
    fn run_stops_on_signal() {
        let rec = RecordingAutomation::new();
        let (evt_tx, evt_rx) = unbounded();
        let (stop_tx, stop_rx) = bounded(1);

        evt_tx.send(SerialEvent::Opened("COM13".into())).unwrap();
        evt_tx.send(SerialEvent::Rx(b"12x".to_vec())).unwrap();

        let handle = {
            let rec = rec.clone();
            std::thread::spawn(move || {
                let mut el = EventLoop::new(rec, default_bindings());
                el.run(&evt_rx, &stop_rx)
            })
        };

        // wait for both buttons to be handled before stopping
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while rec.calls().last() != Some(&Call::Click(Target::GoButton)) {
            assert!(std::time::Instant::now() < deadline, "bytes not handled");
            std::thread::sleep(Duration::from_millis(5));
        }
        stop_tx.send(()).unwrap();

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary, RunSummary { bytes: 3, actions: 2, ignored: 1 });
        drop(evt_tx);
    }

    #[test]
    fn closed_transport_is_fatal() {
        let (evt_tx, evt_rx) = unbounded();
        let (_stop_tx, stop_rx) = bounded::<()>(1);
        evt_tx.send(SerialEvent::Closed).unwrap();
        let mut el = EventLoop::new(RecordingAutomation::new(), default_bindings());
        assert!(matches!(el.run(&evt_rx, &stop_rx), Err(Error::TransportClosed)));
    }

    #[test]
    fn transport_error_is_fatal() {
        let (evt_tx, evt_rx) = unbounded();
        let (_stop_tx, stop_rx) = bounded::<()>(1);
        evt_tx.send(SerialEvent::Error("unplugged".into())).unwrap();
        let mut el = EventLoop::new(RecordingAutomation::new(), default_bindings());
        assert!(matches!(el.run(&evt_rx, &stop_rx), Err(Error::Transport(msg)) if msg == "unplugged"));
    }

    #[test]
    fn automation_failure_stops_the_loop() {
        let rec = RecordingAutomation::new().failing_on(Call::ClickInput(Target::NegateColors));
        let (evt_tx, evt_rx) = unbounded();
        let (_stop_tx, stop_rx) = bounded::<()>(1);
        evt_tx.send(SerialEvent::Rx(b"12".to_vec())).unwrap();
        let mut el = EventLoop::new(rec.clone(), default_bindings());
        assert!(matches!(el.run(&evt_rx, &stop_rx), Err(Error::Automation(_))));
        // byte '2' never got its turn
        assert!(rec.calls().is_empty());
    }
}
