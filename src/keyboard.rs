//! Key-table provider boundary.
//!
//! The device layer knows, per keyboard model, which physical key position
//! (location code) each driver value maps to. The compiler only ever reads
//! that table; it must be fully populated before a compile starts.

use std::collections::HashMap;

/// Device-specific key table: driver value → location code.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    driver_value_to_location_code: HashMap<u32, i32>,
}

impl KeyboardState {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, i32)>,
    {
        Self {
            driver_value_to_location_code: entries.into_iter().collect(),
        }
    }

    /// Location code for a driver value, if the model has that key.
    pub fn location_code(&self, driver_value: u32) -> Option<i32> {
        self.driver_value_to_location_code.get(&driver_value).copied()
    }

    pub fn len(&self) -> usize {
        self.driver_value_to_location_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.driver_value_to_location_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver_value;

    #[test]
    fn lookup() {
        let kb = KeyboardState::new([(driver_value::key(0x04), 10)]);
        assert_eq!(kb.location_code(driver_value::key(0x04)), Some(10));
        assert_eq!(kb.location_code(driver_value::key(0x05)), None);
        assert_eq!(kb.len(), 1);
    }
}
