use videowall_nav::{navigation_plan, NavCommand, NavigationPlan};

use crate::automation::{Automation, Target};
use crate::error::Result;

/// Drives the switcher's presets dropdown to a preset and presses GO.
pub struct PresetNavigator<A> {
    automation: A,
}

impl<A: Automation> PresetNavigator<A> {
    pub fn new(automation: A) -> Self {
        Self { automation }
    }

    /// Runs the plan for `preset` step by step. Presets outside `1..=16` do
    /// nothing. The first failed call aborts the plan; nothing is retried and
    /// the resulting selection is not read back.
    pub fn select_preset(&mut self, preset: i64) -> Result<NavigationPlan> {
        let plan = navigation_plan(preset);
        if plan.is_empty() {
            log::warn!("no navigation plan for preset {preset}, ignoring");
            return Ok(plan);
        }
        log::debug!("preset {preset}: {:?}", plan.keys());

        for cmd in plan.commands() {
            self.execute(cmd)?;
        }
        Ok(plan)
    }

    fn execute(&mut self, cmd: NavCommand) -> Result<()> {
        match cmd {
            NavCommand::OpenDropdown => self.automation.click(Target::Dropdown),
            NavCommand::WaitReady => self.automation.wait_ready(Target::SwitcherWindow),
            NavCommand::Send(key) => self.automation.send_keys(key),
            NavCommand::Confirm => self.automation.click(Target::GoButton),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{AutomationCall as Call, RecordingAutomation};
    use crate::error::Error;
    use videowall_nav::Key;

    fn run(preset: i64) -> Vec<Call> {
        let rec = RecordingAutomation::new();
        PresetNavigator::new(rec.clone()).select_preset(preset).unwrap();
        rec.calls()
    }

    fn keys(calls: &[Call]) -> Vec<Key> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::SendKeys(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn preset_two_opens_dropdown_before_each_key() {
        assert_eq!(
            run(2),
            vec![
                Call::Click(Target::Dropdown),
                Call::WaitReady(Target::SwitcherWindow),
                Call::SendKeys(Key::Down),
                Call::Click(Target::Dropdown),
                Call::WaitReady(Target::SwitcherWindow),
                Call::SendKeys(Key::Down),
                Call::Click(Target::GoButton),
            ]
        );
    }

    #[test]
    fn keys_follow_the_table() {
        use Key::*;
        assert_eq!(keys(&run(5)), vec![PageDown, Up, Up]);
        assert_eq!(keys(&run(11)), vec![PageDown, Down, Down, Down, Down]);
        assert_eq!(keys(&run(13)), vec![PageDown, PageDown, Up]);
        assert_eq!(keys(&run(16)), vec![PageDown, PageDown, Down, Down]);
    }

    #[test]
    fn each_preset_confirms_once_at_the_end() {
        for n in 1..=16 {
            let calls = run(n);
            let opens = calls.iter().filter(|c| **c == Call::Click(Target::Dropdown)).count();
            assert_eq!(opens, keys(&calls).len(), "preset {n}");
            assert_eq!(calls.last(), Some(&Call::Click(Target::GoButton)));
            let gos = calls.iter().filter(|c| **c == Call::Click(Target::GoButton)).count();
            assert_eq!(gos, 1);
        }
    }

    #[test]
    fn out_of_range_presets_touch_nothing() {
        for n in [0, -3, 17, 40] {
            assert!(run(n).is_empty(), "preset {n}");
        }
    }

    #[test]
    fn failure_aborts_before_confirm() {
        let rec = RecordingAutomation::new().failing_on(Call::SendKeys(Key::PageDown));
        let err = PresetNavigator::new(rec.clone()).select_preset(9).unwrap_err();
        assert!(matches!(err, Error::Automation(_)));
        assert_eq!(
            rec.calls(),
            vec![Call::Click(Target::Dropdown), Call::WaitReady(Target::SwitcherWindow)]
        );
    }
}
