//! Lighting-effect files.
//!
//! Each named effect lives in `<data-root>/lighting/<name>.le`, a JSON
//! document describing either a static per-key color map or a multi-frame
//! animation with parameterized sub-effects. The format is schema-less
//! (fields come as string-or-integer, object-or-array), so loading walks
//! [`serde_json::Value`] and drops whatever fails to resolve instead of
//! aborting.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::color::parse_color;
use crate::keyboard::KeyboardState;
use crate::profile::KeyboardLayer;
use crate::resolve;

/// Number of keys the lighting system addresses.
pub const NUM_KEYS: usize = 132;
/// Most effects a single profile can carry.
pub const MAX_EFFECTS: usize = 32;
/// Bytes of static lighting data (one 32-bit color slot per key).
pub const NUM_STATIC_LIGHTING_BYTES: usize = 704;

/// Why an effect file failed to load. Advisory: the compiler logs the
/// failure and compiles on without the effect.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("lighting effect file not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("effect document is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingEffectType {
    Static = 0,
    #[default]
    Dynamic = 1,
}

impl LightingEffectType {
    /// `Type` field: enum name (case-insensitive) or ordinal; anything else
    /// means `Dynamic`.
    fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "static" => Self::Static,
                _ => Self::Dynamic,
            },
            Some(Value::Number(n)) => match n.as_i64() {
                Some(0) => Self::Static,
                _ => Self::Dynamic,
            },
            _ => Self::Dynamic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingEffectColorType {
    #[default]
    Monochrome = 0,
    Rgb = 1,
    Breathing = 2,
}

impl LightingEffectColorType {
    fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "rgb" | "rainbow" => Self::Rgb,
                "breathing" => Self::Breathing,
                _ => Self::Monochrome,
            },
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => Self::Rgb,
                Some(2) => Self::Breathing,
                _ => Self::Monochrome,
            },
            _ => Self::Monochrome,
        }
    }
}

/// One animation frame: which keys are lit, held for `count` frame ticks.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub count: i32,
    pub key_codes: HashSet<i32>,
}

/// A parameter block governing a set of keys within a dynamic effect.
#[derive(Debug, Clone, Default)]
pub struct Param {
    pub color: u32,
    pub color_type: LightingEffectColorType,
    pub keys: HashSet<i32>,
    /// "Count" — cycle length for RGB / breathing.
    pub val1: i32,
    /// "StayCount" — hold time for breathing.
    pub val2: i32,
    /// Send `val1`/`val2` to the keyboard unmodified instead of the usual
    /// 360/val (RGB) and 100/val (breathing) scaling.
    pub use_raw_values: bool,
}

/// A named lighting effect, loaded from disk on first reference.
#[derive(Debug, Clone)]
pub struct LightingEffect {
    pub name: String,
    /// Assigned on first committed reference; independent of macro ids.
    pub id: Option<u8>,
    pub effect_type: LightingEffectType,
    /// Static lighting: key location code → packed RGBA.
    pub key_colors: HashMap<i32, u32>,
    pub frames: Vec<Frame>,
    /// Sum of all frame counts; what the device layer will consume.
    pub total_frames: i32,
    pub params: Vec<Param>,
    /// Layers this effect is attached to.
    pub layers: HashSet<KeyboardLayer>,
}

impl LightingEffect {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            effect_type: LightingEffectType::default(),
            key_colors: HashMap::new(),
            frames: Vec::new(),
            total_frames: 0,
            params: Vec::new(),
            layers: HashSet::new(),
        }
    }

    /// Load `<data_root>/lighting/<name>.le`.
    pub fn load(
        name: &str,
        keyboard: &KeyboardState,
        data_root: &Path,
    ) -> Result<Self, LoadError> {
        let path = data_root.join("lighting").join(format!("{name}.le"));
        if name.is_empty() || !path.is_file() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(&path)?;
        Self::load_from_json(name, keyboard, &text)
    }

    /// Load an effect from JSON text (split out for tests and callers that
    /// already hold the document).
    pub fn load_from_json(
        name: &str,
        keyboard: &KeyboardState,
        json: &str,
    ) -> Result<Self, LoadError> {
        let doc: Value = serde_json::from_str(json)?;
        let obj = doc.as_object().ok_or(LoadError::NotAnObject)?;

        let mut effect = Self::new(name);
        effect.effect_type = LightingEffectType::from_json(obj.get("Type"));
        match effect.effect_type {
            LightingEffectType::Static => effect.load_static(keyboard, obj),
            LightingEffectType::Dynamic => effect.load_dynamic(keyboard, obj),
        }
        Ok(effect)
    }

    /// Static form: `Data` is a flat key-token → color-string object.
    fn load_static(&mut self, keyboard: &KeyboardState, obj: &Map<String, Value>) {
        let Some(data) = obj.get("Data").and_then(Value::as_object) else {
            return;
        };
        for (key_token, color_value) in data {
            let Some(key) = resolve::location_code_for_token(keyboard, key_token) else {
                continue;
            };
            let Some(color) = color_value.as_str().and_then(|s| parse_color(s, true)) else {
                continue;
            };
            self.key_colors.insert(key, color);
        }
    }

    /// Dynamic form: a `Frames` array plus a parallel `LEConfigs` array.
    fn load_dynamic(&mut self, keyboard: &KeyboardState, obj: &Map<String, Value>) {
        if let Some(frames) = obj.get("Frames").and_then(Value::as_array) {
            for frame_value in frames {
                let Some(frame_obj) = frame_value.as_object() else {
                    continue;
                };
                let count = frame_obj
                    .get("Count")
                    .and_then(Value::as_i64)
                    .filter(|c| *c > 0)
                    .unwrap_or(1) as i32;
                let mut frame = Frame {
                    count,
                    key_codes: HashSet::new(),
                };
                match frame_obj.get("Data") {
                    Some(Value::Object(map)) => {
                        // The object form carries a color per key that
                        // nothing downstream consumes (possibly a DIY-
                        // lighting leftover); only the keys are kept.
                        for key_token in map.keys() {
                            if let Some(code) =
                                resolve::location_code_for_token(keyboard, key_token)
                            {
                                frame.key_codes.insert(code);
                            }
                        }
                    }
                    Some(Value::Array(items)) => {
                        for item in items {
                            if let Some(code) = resolve::location_code_for_json(keyboard, item) {
                                frame.key_codes.insert(code);
                            }
                        }
                    }
                    _ => {}
                }
                self.total_frames += frame.count;
                self.frames.push(frame);
            }
        }

        if let Some(configs) = obj.get("LEConfigs").and_then(Value::as_array) {
            for config_value in configs {
                let Some(config) = config_value.as_object() else {
                    continue;
                };
                let mut param = Param {
                    color_type: LightingEffectColorType::from_json(config.get("Type")),
                    ..Param::default()
                };
                if let Some(color) = config
                    .get("Color")
                    .and_then(Value::as_str)
                    .and_then(|s| parse_color(s, false))
                {
                    param.color = color;
                }
                param.val1 = config
                    .get("Count")
                    .and_then(Value::as_i64)
                    .or_else(|| config.get("Val1").and_then(Value::as_i64))
                    .unwrap_or(0) as i32;
                param.val2 = config
                    .get("StayCount")
                    .and_then(Value::as_i64)
                    .or_else(|| config.get("Val2").and_then(Value::as_i64))
                    .unwrap_or(0) as i32;
                param.use_raw_values = match config.get("UseRawValues") {
                    Some(Value::Bool(b)) => *b,
                    // Legacy files carry 0/1 instead of a bool.
                    Some(Value::Number(n)) => n.as_i64() == Some(1),
                    _ => false,
                };
                if let Some(keys) = config.get("Keys").and_then(Value::as_array) {
                    for key in keys {
                        if let Some(code) = resolve::location_code_for_json(keyboard, key) {
                            param.keys.insert(code);
                        }
                    }
                }
                // A param that governs no keys does nothing.
                if !param.keys.is_empty() {
                    self.params.push(param);
                }
            }
        }
    }
}
