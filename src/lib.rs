//! Keyboard profile compiler.
//!
//! Compiles a user's text profile (key remaps per layer, macro definitions,
//! lighting-effect references) plus its JSON lighting-effect files into a
//! [`CompiledProfile`] the device layer can push to the keyboard. The
//! on-wire unit is the packed 32-bit driver value ([`driver_value`]); the
//! per-model key table ([`KeyboardState`]) comes from the device layer and
//! is only ever read here.

pub mod color;
pub mod driver_value;
pub mod keyboard;
pub mod lighting;
pub mod macros;
pub mod profile;
pub mod resolve;

pub use keyboard::KeyboardState;
pub use lighting::{LightingEffect, LightingEffectColorType, LightingEffectType, LoadError};
pub use macros::{Macro, MacroAction, MacroKeyState, MacroKeyType, MacroRepeatType};
pub use profile::{CompiledProfile, KeyboardLayer, Layer};
