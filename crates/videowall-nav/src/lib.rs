//! Pure navigation logic: preset plans and button bindings.

pub mod binding;
pub mod preset;

pub use binding::{actions_for, default_bindings, Action, Binding};
pub use preset::{navigation_plan, Key, NavCommand, NavigationPlan, PresetIndex, PAGE_SIZE, PRESET_COUNT};
