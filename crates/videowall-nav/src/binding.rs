//! Button byte to action bindings.
//!
//! The panel sends one ASCII byte per button press. Every binding whose byte
//! matches fires, in table order, so two bindings on the same byte both run.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::preset::PresetIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Toggle the player's negate-colors effect.
    ToggleColors,
    /// Recall a switcher preset by number. Numbers outside `1..=16` are
    /// rejected when the table is loaded.
    SelectPreset { preset: PresetIndex },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(serialize_with = "serialize_byte", deserialize_with = "deserialize_byte")]
    pub byte: u8,
    #[serde(flatten)]
    pub action: Action,
}

impl Binding {
    pub const fn new(byte: u8, action: Action) -> Self {
        Self { byte, action }
    }
}

const BUTTON_2_PRESET: PresetIndex = match PresetIndex::new(2) {
    Some(p) => p,
    None => panic!("preset 2 out of range"),
};

/// Button 1 toggles colors, button 2 recalls preset 2.
pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new(b'1', Action::ToggleColors),
        Binding::new(b'2', Action::SelectPreset { preset: BUTTON_2_PRESET }),
    ]
}

/// Actions bound to `byte`, each binding checked on its own.
pub fn actions_for(bindings: &[Binding], byte: u8) -> Vec<Action> {
    bindings
        .iter()
        .filter(|b| b.byte == byte)
        .map(|b| b.action)
        .collect()
}

/// Printable bytes are written as one-character strings, others as numbers.
fn serialize_byte<S: Serializer>(byte: &u8, s: S) -> Result<S::Ok, S::Error> {
    if byte.is_ascii_graphic() {
        s.serialize_str(&(*byte as char).to_string())
    } else {
        s.serialize_u8(*byte)
    }
}

fn deserialize_byte<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ByteRepr {
        Number(u8),
        Char(String),
    }

    match ByteRepr::deserialize(d)? {
        ByteRepr::Number(n) => Ok(n),
        ByteRepr::Char(s) => match s.as_bytes() {
            [b] => Ok(*b),
            _ => Err(serde::de::Error::custom(format!(
                "binding byte must be a single ASCII character, got {s:?}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(n: u32) -> Action {
        Action::SelectPreset { preset: PresetIndex::new(n).unwrap() }
    }

    #[test]
    fn default_dispatch() {
        let bindings = default_bindings();
        assert_eq!(actions_for(&bindings, 0x31), vec![Action::ToggleColors]);
        assert_eq!(
            actions_for(&bindings, 0x32),
            vec![preset(2)]
        );
        for byte in [0u8, b'0', b'3', b'\n', 0xFF] {
            assert!(actions_for(&bindings, byte).is_empty());
        }
    }

    #[test]
    fn matching_bindings_all_fire() {
        let bindings = vec![
            Binding::new(b'5', preset(5)),
            Binding::new(b'5', Action::ToggleColors),
        ];
        assert_eq!(
            actions_for(&bindings, b'5'),
            vec![preset(5), Action::ToggleColors]
        );
    }

    #[test]
    fn binding_json_forms() {
        let b: Binding =
            serde_json::from_str(r#"{"byte":"3","action":"select_preset","preset":12}"#).unwrap();
        assert_eq!(b, Binding::new(b'3', preset(12)));

        let b: Binding = serde_json::from_str(r#"{"byte":7,"action":"toggle_colors"}"#).unwrap();
        assert_eq!(b, Binding::new(7, Action::ToggleColors));

        assert!(serde_json::from_str::<Binding>(r#"{"byte":"12","action":"toggle_colors"}"#).is_err());
        assert!(
            serde_json::from_str::<Binding>(r#"{"byte":"4","action":"select_preset","preset":17}"#).is_err()
        );

        let text = serde_json::to_string(&Binding::new(b'1', Action::ToggleColors)).unwrap();
        assert_eq!(text, r#"{"byte":"1","action":"toggle_colors"}"#);
    }
}
