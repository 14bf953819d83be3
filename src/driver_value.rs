//! Packed 32-bit driver values.
//!
//! Every key identity and every key action in a compiled profile is a single
//! 32-bit "driver value", laid out as:
//!
//! ```text
//! bits 31..24  type tag      0x01 = mouse, 0x02 = key, 0x0A = macro
//! bits 23..16  modifier bitmask (key values) / 0x01 (part of the macro tag)
//! bits 15..8   HID key code (key values)
//! bits  7..0   mouse button (mouse values) / macro id (macro values)
//! ```
//!
//! Both input formats (the text profile and the lighting JSON) address keys
//! through this encoding. The codec is total: a bit pattern with an unknown
//! type tag reads back as a raw key value instead of failing.

use std::fmt::Write as _;

/// HID modifier bitmask constants (USB HID report modifier byte).
pub mod mods {
    pub const LCTRL: u8 = 0x01;
    pub const LSHIFT: u8 = 0x02;
    pub const LALT: u8 = 0x04;
    pub const LWIN: u8 = 0x08;
    pub const RCTRL: u8 = 0x10;
    pub const RSHIFT: u8 = 0x20;
    pub const RALT: u8 = 0x40;
    pub const RWIN: u8 = 0x80;
}

/// Mouse button codes carried in the low byte of mouse driver values.
pub mod mouse {
    pub const LEFT: u8 = 1;
    pub const RIGHT: u8 = 2;
    pub const MIDDLE: u8 = 3;
    pub const BACK: u8 = 4;
    pub const ADVANCE: u8 = 5;
}

/// Type tags carried in the top byte.
mod tag {
    pub const MOUSE: u32 = 0x01;
    pub const KEY: u32 = 0x02;
    pub const MACRO: u32 = 0x0A;
}

/// Sentinel for "no binding": a key driver value with an empty payload.
pub const UNUSED_KEY_VALUE: u32 = 0x0200_0000;

/// Macro driver values are `MACRO_TAG | id`, id in the low byte.
pub const MACRO_TAG: u32 = 0x0A01_0000;

/// Largest macro id that still decodes as a macro value.
pub const MAX_MACRO_ID: u32 = 0xFF;

/// What a driver value addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverValueKind {
    Key,
    Modifier,
    Mouse,
    Macro,
    Unused,
}

/// Classify a driver value. Total; unknown tags classify as raw [`DriverValueKind::Key`].
pub fn kind(value: u32) -> DriverValueKind {
    if value == UNUSED_KEY_VALUE {
        return DriverValueKind::Unused;
    }
    match value >> 24 {
        t if t == tag::MOUSE => DriverValueKind::Mouse,
        t if t == tag::MACRO && macro_id(value).is_some() => DriverValueKind::Macro,
        t if t == tag::KEY && short_code(value) == 0 && modifier_bits(value) != 0 => {
            DriverValueKind::Modifier
        }
        _ => DriverValueKind::Key,
    }
}

/// Build a key driver value from a HID key code.
pub fn key(code: u8) -> u32 {
    (tag::KEY << 24) | ((code as u32) << 8)
}

/// Build a modifier driver value from a [`mods`] bitmask.
pub fn modifier(bits: u8) -> u32 {
    (tag::KEY << 24) | ((bits as u32) << 16)
}

/// Build a mouse driver value from a [`mouse`] button code.
pub fn mouse_button_value(button: u8) -> u32 {
    (tag::MOUSE << 24) | button as u32
}

/// Build the driver value for a macro id.
pub fn macro_value(id: u8) -> u32 {
    MACRO_TAG | id as u32
}

/// Decode the macro id, rejecting values outside the reserved macro range.
pub fn macro_id(value: u32) -> Option<u8> {
    (MACRO_TAG..=MACRO_TAG + MAX_MACRO_ID)
        .contains(&value)
        .then(|| (value & 0xFF) as u8)
}

/// 16-bit short form of a driver value (modifier bits + HID code).
pub fn short_value(value: u32) -> u16 {
    ((value >> 8) & 0xFFFF) as u16
}

/// One-byte short key code (the HID code byte), used in macro actions.
pub fn short_code(value: u32) -> u8 {
    (value >> 8) as u8
}

/// Modifier bitmask byte of a key driver value.
pub fn modifier_bits(value: u32) -> u8 {
    (value >> 16) as u8
}

/// Mouse button code of a mouse driver value.
pub fn mouse_button(value: u32) -> u8 {
    value as u8
}

const MOD_NAMES: &[(u8, &str)] = &[
    (mods::LCTRL, "LCtrl"),
    (mods::LSHIFT, "LShift"),
    (mods::LALT, "LAlt"),
    (mods::LWIN, "LWin"),
    (mods::RCTRL, "RCtrl"),
    (mods::RSHIFT, "RShift"),
    (mods::RALT, "RAlt"),
    (mods::RWIN, "RWin"),
];

/// Resolve a symbolic key name (case-insensitive) to its driver value.
///
/// Covers the eight modifiers, the five named mouse buttons, letters, digits,
/// function keys and the common named keys. Unknown names return `None`.
pub fn from_name(name: &str) -> Option<u32> {
    let n = name.trim().to_ascii_lowercase();

    let modifier_bit = match n.as_str() {
        "lctrl" | "lcontrol" | "ctrl" | "control" => Some(mods::LCTRL),
        "lshift" | "shift" => Some(mods::LSHIFT),
        "lalt" | "alt" => Some(mods::LALT),
        "lwin" | "lgui" | "win" | "super" | "cmd" => Some(mods::LWIN),
        "rctrl" | "rcontrol" => Some(mods::RCTRL),
        "rshift" => Some(mods::RSHIFT),
        "ralt" | "altgr" => Some(mods::RALT),
        "rwin" | "rgui" => Some(mods::RWIN),
        _ => None,
    };
    if let Some(bit) = modifier_bit {
        return Some(modifier(bit));
    }

    let button = match n.as_str() {
        "mouselclick" => Some(mouse::LEFT),
        "mouserclick" => Some(mouse::RIGHT),
        "mousemclick" => Some(mouse::MIDDLE),
        "mouseback" => Some(mouse::BACK),
        "mouseadvance" => Some(mouse::ADVANCE),
        _ => None,
    };
    if let Some(b) = button {
        return Some(mouse_button_value(b));
    }

    hid_code_from_name(&n).map(key)
}

/// HID keyboard-page usage code for a (pre-lowercased) key name.
fn hid_code_from_name(n: &str) -> Option<u8> {
    if n.len() == 1 {
        let c = n.as_bytes()[0];
        match c {
            b'a'..=b'z' => return Some(0x04 + (c - b'a')),
            b'1'..=b'9' => return Some(0x1E + (c - b'1')),
            b'0' => return Some(0x27),
            _ => {}
        }
    }

    // F1-F24 (F13-F24 sit in a separate HID range)
    if let Some(num) = n.strip_prefix('f') {
        if let Ok(i) = num.parse::<u8>() {
            return match i {
                1..=12 => Some(0x3A + (i - 1)),
                13..=24 => Some(0x68 + (i - 13)),
                _ => None,
            };
        }
    }

    let code = match n {
        "enter" | "return" => 0x28,
        "escape" | "esc" => 0x29,
        "backspace" => 0x2A,
        "tab" => 0x2B,
        "space" | "spacebar" => 0x2C,
        "minus" | "-" => 0x2D,
        "equals" | "=" => 0x2E,
        "lbracket" | "[" => 0x2F,
        "rbracket" | "]" => 0x30,
        "backslash" | "\\" => 0x31,
        "semicolon" | ";" => 0x33,
        "quote" | "'" => 0x34,
        "tilde" | "grave" | "`" => 0x35,
        "comma" | "," => 0x36,
        "period" | "." => 0x37,
        "slash" | "/" => 0x38,
        "capslock" | "caps" => 0x39,
        "printscreen" | "printscr" => 0x46,
        "scrolllock" => 0x47,
        "pause" => 0x48,
        "insert" => 0x49,
        "home" => 0x4A,
        "pageup" => 0x4B,
        "delete" | "del" => 0x4C,
        "end" => 0x4D,
        "pagedown" => 0x4E,
        "right" => 0x4F,
        "left" => 0x50,
        "down" => 0x51,
        "up" => 0x52,
        "numlock" => 0x53,
        "kpdivide" | "kp/" => 0x54,
        "kpmultiply" | "kp*" => 0x55,
        "kpminus" | "kp-" => 0x56,
        "kpplus" | "kp+" => 0x57,
        "kpenter" => 0x58,
        "kp1" => 0x59,
        "kp2" => 0x5A,
        "kp3" => 0x5B,
        "kp4" => 0x5C,
        "kp5" => 0x5D,
        "kp6" => 0x5E,
        "kp7" => 0x5F,
        "kp8" => 0x60,
        "kp9" => 0x61,
        "kp0" => 0x62,
        "kpperiod" | "kp." => 0x63,
        "app" | "menu" => 0x65,
        _ => return None,
    };
    Some(code)
}

/// Display name of a HID keyboard usage code.
fn hid_key_name(code: u8) -> Option<&'static str> {
    let name = match code {
        0x04 => "A", 0x05 => "B", 0x06 => "C", 0x07 => "D", 0x08 => "E",
        0x09 => "F", 0x0A => "G", 0x0B => "H", 0x0C => "I", 0x0D => "J",
        0x0E => "K", 0x0F => "L", 0x10 => "M", 0x11 => "N", 0x12 => "O",
        0x13 => "P", 0x14 => "Q", 0x15 => "R", 0x16 => "S", 0x17 => "T",
        0x18 => "U", 0x19 => "V", 0x1A => "W", 0x1B => "X", 0x1C => "Y",
        0x1D => "Z",
        0x1E => "1", 0x1F => "2", 0x20 => "3", 0x21 => "4", 0x22 => "5",
        0x23 => "6", 0x24 => "7", 0x25 => "8", 0x26 => "9", 0x27 => "0",
        0x28 => "Enter", 0x29 => "Escape", 0x2A => "Backspace", 0x2B => "Tab",
        0x2C => "Space", 0x2D => "Minus", 0x2E => "Equals", 0x2F => "LBracket",
        0x30 => "RBracket", 0x31 => "Backslash", 0x33 => "Semicolon",
        0x34 => "Quote", 0x35 => "Tilde", 0x36 => "Comma", 0x37 => "Period",
        0x38 => "Slash", 0x39 => "CapsLock",
        0x3A => "F1", 0x3B => "F2", 0x3C => "F3", 0x3D => "F4", 0x3E => "F5",
        0x3F => "F6", 0x40 => "F7", 0x41 => "F8", 0x42 => "F9", 0x43 => "F10",
        0x44 => "F11", 0x45 => "F12",
        0x46 => "PrintScreen", 0x47 => "ScrollLock", 0x48 => "Pause",
        0x49 => "Insert", 0x4A => "Home", 0x4B => "PageUp", 0x4C => "Delete",
        0x4D => "End", 0x4E => "PageDown",
        0x4F => "Right", 0x50 => "Left", 0x51 => "Down", 0x52 => "Up",
        0x53 => "NumLock", 0x54 => "KP/", 0x55 => "KP*", 0x56 => "KP-",
        0x57 => "KP+", 0x58 => "KPEnter", 0x59 => "KP1", 0x5A => "KP2",
        0x5B => "KP3", 0x5C => "KP4", 0x5D => "KP5", 0x5E => "KP6",
        0x5F => "KP7", 0x60 => "KP8", 0x61 => "KP9", 0x62 => "KP0",
        0x63 => "KP.", 0x65 => "App",
        _ => return None,
    };
    Some(name)
}

/// Human-readable form of a driver value, for log messages.
pub fn name(value: u32) -> String {
    match kind(value) {
        DriverValueKind::Unused => "Unused".to_string(),
        DriverValueKind::Macro => format!("Macro({})", value & 0xFF),
        DriverValueKind::Mouse => {
            let btn = mouse_button(value);
            match btn {
                mouse::LEFT => "MouseLClick".to_string(),
                mouse::RIGHT => "MouseRClick".to_string(),
                mouse::MIDDLE => "MouseMClick".to_string(),
                mouse::BACK => "MouseBack".to_string(),
                mouse::ADVANCE => "MouseAdvance".to_string(),
                _ => format!("Mouse({btn})"),
            }
        }
        DriverValueKind::Key | DriverValueKind::Modifier => {
            let bits = modifier_bits(value);
            let mut out = String::new();
            for &(bit, mod_name) in MOD_NAMES {
                if bits & bit != 0 {
                    if !out.is_empty() {
                        out.push('+');
                    }
                    out.push_str(mod_name);
                }
            }
            let code = short_code(value);
            if code != 0 || out.is_empty() {
                if !out.is_empty() {
                    out.push('+');
                }
                match hid_key_name(code) {
                    Some(key_name) => out.push_str(key_name),
                    None => {
                        let _ = write!(out, "0x{value:08X}");
                    }
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_key_values() {
        assert_eq!(kind(key(0x04)), DriverValueKind::Key);
        assert_eq!(kind(modifier(mods::LCTRL)), DriverValueKind::Modifier);
        assert_eq!(kind(mouse_button_value(mouse::LEFT)), DriverValueKind::Mouse);
        assert_eq!(kind(macro_value(3)), DriverValueKind::Macro);
        assert_eq!(kind(UNUSED_KEY_VALUE), DriverValueKind::Unused);
    }

    #[test]
    fn classify_is_total() {
        // Unknown type tags read back as raw key values.
        assert_eq!(kind(0xDE00_0001), DriverValueKind::Key);
        assert_eq!(kind(0x0000_0000), DriverValueKind::Key);
    }

    #[test]
    fn modifier_combo_is_key_kind() {
        // Modifier bits plus a key code is a chorded key, not a bare modifier.
        let combo = modifier(mods::LCTRL) | key(0x04);
        assert_eq!(kind(combo), DriverValueKind::Key);
        assert_eq!(modifier_bits(combo), mods::LCTRL);
        assert_eq!(short_code(combo), 0x04);
    }

    #[test]
    fn macro_packing_roundtrip() {
        assert_eq!(macro_value(0), 0x0A01_0000);
        assert_eq!(macro_value(7), 0x0A01_0007);
        assert_eq!(macro_id(macro_value(0)), Some(0));
        assert_eq!(macro_id(macro_value(255)), Some(255));
    }

    #[test]
    fn macro_decode_rejects_out_of_range() {
        // Bits outside the reserved id byte mean "not a macro value".
        assert_eq!(macro_id(MACRO_TAG + 0x100), None);
        assert_eq!(macro_id(0x0A02_0000), None);
        assert_eq!(macro_id(key(0x04)), None);
        assert_eq!(kind(MACRO_TAG + 0x100), DriverValueKind::Key);
    }

    #[test]
    fn short_forms() {
        assert_eq!(short_code(key(0x39)), 0x39);
        assert_eq!(short_value(modifier(mods::LCTRL) | key(0x04)), 0x0104);
    }

    #[test]
    fn name_lookup() {
        assert_eq!(from_name("A"), Some(key(0x04)));
        assert_eq!(from_name("a"), Some(key(0x04)));
        assert_eq!(from_name("CapsLock"), Some(key(0x39)));
        assert_eq!(from_name("F12"), Some(key(0x45)));
        assert_eq!(from_name("F24"), Some(key(0x73)));
        assert_eq!(from_name("LCtrl"), Some(modifier(mods::LCTRL)));
        assert_eq!(from_name("RWin"), Some(modifier(mods::RWIN)));
        assert_eq!(from_name("MouseLClick"), Some(mouse_button_value(mouse::LEFT)));
        assert_eq!(from_name("NotAKey"), None);
        assert_eq!(from_name(""), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(name(key(0x04)), "A");
        assert_eq!(name(modifier(mods::LCTRL) | key(0x05)), "LCtrl+B");
        assert_eq!(name(modifier(mods::LCTRL | mods::LSHIFT)), "LCtrl+LShift");
        assert_eq!(name(macro_value(2)), "Macro(2)");
        assert_eq!(name(mouse_button_value(mouse::BACK)), "MouseBack");
        assert_eq!(name(UNUSED_KEY_VALUE), "Unused");
    }
}
