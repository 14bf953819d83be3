//! Key resolution: symbolic key references → location codes.
//!
//! Both the lighting JSON and parts of the text profile address keys by
//! token. Resolution order, first match wins: `0x` hex literal (a raw driver
//! value, looked up in the key table), plain integer (used directly as a
//! location code), known symbolic name (its driver value looked up in the
//! key table). Failure is non-fatal; callers drop the entry and continue.

use serde_json::Value;

use crate::driver_value;
use crate::keyboard::KeyboardState;

/// Resolve a key token to a location code.
pub fn location_code_for_token(keyboard: &KeyboardState, token: &str) -> Option<i32> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        let value = u32::from_str_radix(hex, 16).ok()?;
        return keyboard.location_code(value);
    }
    if let Ok(code) = token.parse::<i32>() {
        return Some(code);
    }
    let value = driver_value::from_name(token)?;
    keyboard.location_code(value)
}

/// Resolve a JSON key reference. Integers are taken directly as location
/// codes; strings go through the token path.
pub fn location_code_for_json(keyboard: &KeyboardState, value: &Value) -> Option<i32> {
    match value {
        Value::String(s) => location_code_for_token(keyboard, s),
        Value::Number(n) => n.as_i64().map(|v| v as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyboard() -> KeyboardState {
        KeyboardState::new([
            (driver_value::key(0x04), 14), // A
            (driver_value::key(0x39), 30), // CapsLock
        ])
    }

    #[test]
    fn hex_token_goes_through_key_table() {
        let kb = keyboard();
        let hex = format!("0x{:08X}", driver_value::key(0x04));
        assert_eq!(location_code_for_token(&kb, &hex), Some(14));
        // Valid hex but not a key on this model.
        assert_eq!(location_code_for_token(&kb, "0x02009900"), None);
    }

    #[test]
    fn plain_integer_is_a_location_code() {
        // No table consultation for bare integers.
        assert_eq!(location_code_for_token(&keyboard(), "77"), Some(77));
    }

    #[test]
    fn named_key_goes_through_key_table() {
        let kb = keyboard();
        assert_eq!(location_code_for_token(&kb, "CapsLock"), Some(30));
        assert_eq!(location_code_for_token(&kb, " capslock "), Some(30));
        // Known name, but this model has no such key.
        assert_eq!(location_code_for_token(&kb, "F5"), None);
    }

    #[test]
    fn unknown_token_fails() {
        assert_eq!(location_code_for_token(&keyboard(), "NotAKey"), None);
        assert_eq!(location_code_for_token(&keyboard(), "0xZZ"), None);
    }

    #[test]
    fn json_values() {
        let kb = keyboard();
        assert_eq!(location_code_for_json(&kb, &json!(42)), Some(42));
        assert_eq!(location_code_for_json(&kb, &json!("CapsLock")), Some(30));
        assert_eq!(location_code_for_json(&kb, &json!(null)), None);
        assert_eq!(location_code_for_json(&kb, &json!([1, 2])), None);
    }
}
