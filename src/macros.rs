//! Macro definitions: named, ordered sequences of timed key/mouse actions.
//!
//! A macro is declared by a `[Macro(Name,delay,repeat,count,trailing)]`
//! header and filled in by action lines:
//!
//! ```text
//! press: A+B        — expands to A↓ B↓ A↑ B↑
//! down: LCtrl       — explicit key down (modifier flag, no code)
//! up: LCtrl : 50    — explicit key up with a per-line delay override
//! ```
//!
//! Only the last action generated by a line carries the line's delay; all
//! earlier actions get zero.

use crate::driver_value::{self, DriverValueKind};

/// How the keyboard repeats a running macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroRepeatType {
    RepeatXTimes = 1,
    ReleaseKeyToStop = 2,
    PressKeyToStop = 3,
}

impl MacroRepeatType {
    /// Case-insensitive name parse; unknown names fall back to `RepeatXTimes`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "releasekeytostop" => Self::ReleaseKeyToStop,
            "presskeytostop" => Self::PressKeyToStop,
            _ => Self::RepeatXTimes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKeyState {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKeyType {
    Key,
    Mouse,
}

/// One timed step of a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroAction {
    pub state: MacroKeyState,
    pub kind: MacroKeyType,
    /// Short key code (key actions) or mouse button code (mouse actions).
    pub key_code: u8,
    /// Modifier bitmask bit when the token named one of the eight modifiers.
    pub modifier: Option<u8>,
    /// Delay in milliseconds after this action.
    pub delay: u16,
}

/// A named macro with its repeat settings and expanded action list.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    /// Assigned on first reference from a layer binding; one byte wide.
    pub id: Option<u8>,
    pub repeat_type: MacroRepeatType,
    pub repeat_count: u8,
    pub default_delay: u16,
    /// Apply the delay to the trailing action too; useful when the macro
    /// repeats and a constant cadence is wanted.
    pub use_trailing_delay: bool,
    pub actions: Vec<MacroAction>,
}

impl Macro {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            repeat_type: MacroRepeatType::RepeatXTimes,
            repeat_count: 1,
            default_delay: 0,
            use_trailing_delay: false,
            actions: Vec::new(),
        }
    }

    /// Expand one `press|down|up: key[+key...]` line into actions.
    ///
    /// `delay` lands on the last action the line generates; every other
    /// action gets zero. Unknown key tokens append nothing; an unknown
    /// action keyword drops the whole line.
    pub fn push_action_line(&mut self, keyword: &str, keys: &str, delay: u16) {
        let states: &[MacroKeyState] = match keyword.trim().to_ascii_lowercase().as_str() {
            "press" => &[MacroKeyState::Down, MacroKeyState::Up],
            "down" => &[MacroKeyState::Down],
            "up" => &[MacroKeyState::Up],
            _ => return,
        };

        let first_new = self.actions.len();
        for &state in states {
            for token in keys.split('+').map(str::trim).filter(|t| !t.is_empty()) {
                let Some(value) = driver_value::from_name(token) else {
                    continue;
                };
                let (kind, key_code, modifier) = match driver_value::kind(value) {
                    DriverValueKind::Modifier => {
                        (MacroKeyType::Key, 0, Some(driver_value::modifier_bits(value)))
                    }
                    DriverValueKind::Mouse => {
                        (MacroKeyType::Mouse, driver_value::mouse_button(value), None)
                    }
                    _ => (MacroKeyType::Key, driver_value::short_code(value), None),
                };
                self.actions.push(MacroAction {
                    state,
                    kind,
                    key_code,
                    modifier,
                    delay: 0,
                });
            }
        }
        if self.actions.len() > first_new {
            if let Some(last) = self.actions.last_mut() {
                last.delay = delay;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver_value::mods;

    #[test]
    fn repeat_type_names() {
        assert_eq!(
            MacroRepeatType::from_name("ReleaseKeyToStop"),
            MacroRepeatType::ReleaseKeyToStop
        );
        assert_eq!(
            MacroRepeatType::from_name("presskeytostop"),
            MacroRepeatType::PressKeyToStop
        );
        // Unknown names fall back.
        assert_eq!(
            MacroRepeatType::from_name("Forever"),
            MacroRepeatType::RepeatXTimes
        );
    }

    #[test]
    fn press_expands_to_down_then_up() {
        let mut m = Macro::new("copy");
        m.push_action_line("press", "A+B", 50);

        // A↓ B↓ A↑ B↑, delay only on the final action.
        assert_eq!(m.actions.len(), 4);
        assert_eq!(m.actions[0].state, MacroKeyState::Down);
        assert_eq!(m.actions[0].key_code, 0x04);
        assert_eq!(m.actions[1].state, MacroKeyState::Down);
        assert_eq!(m.actions[1].key_code, 0x05);
        assert_eq!(m.actions[2].state, MacroKeyState::Up);
        assert_eq!(m.actions[2].key_code, 0x04);
        assert_eq!(m.actions[3].state, MacroKeyState::Up);
        assert_eq!(m.actions[3].key_code, 0x05);
        assert_eq!(
            m.actions.iter().map(|a| a.delay).collect::<Vec<_>>(),
            vec![0, 0, 0, 50]
        );
    }

    #[test]
    fn modifier_token_sets_flag_not_code() {
        let mut m = Macro::new("ctrl");
        m.push_action_line("down", "LCtrl", 10);
        assert_eq!(m.actions.len(), 1);
        assert_eq!(m.actions[0].kind, MacroKeyType::Key);
        assert_eq!(m.actions[0].key_code, 0);
        assert_eq!(m.actions[0].modifier, Some(mods::LCTRL));
    }

    #[test]
    fn mouse_token_becomes_mouse_action() {
        let mut m = Macro::new("click");
        m.push_action_line("press", "MouseLClick", 0);
        assert_eq!(m.actions.len(), 2);
        assert_eq!(m.actions[0].kind, MacroKeyType::Mouse);
        assert_eq!(m.actions[0].key_code, 1);
        assert_eq!(m.actions[0].modifier, None);
    }

    #[test]
    fn unknown_tokens_append_nothing() {
        let mut m = Macro::new("x");
        m.push_action_line("press", "NotAKey", 25);
        assert!(m.actions.is_empty());

        // Delay still lands on the last real action when a trailing token
        // fails to resolve.
        m.push_action_line("down", "A+NotAKey", 25);
        assert_eq!(m.actions.len(), 1);
        assert_eq!(m.actions[0].delay, 25);
    }

    #[test]
    fn unknown_keyword_drops_the_line() {
        let mut m = Macro::new("x");
        m.push_action_line("tap", "A", 10);
        assert!(m.actions.is_empty());
    }
}
