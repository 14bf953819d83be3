//! Text-profile compiler.
//!
//! A profile is a line-oriented text file of bracketed group headers and
//! data lines:
//!
//! ```text
//! # comment
//! [Base,Layer1]            # subsequent remaps land in both layers
//! CapsLock: LCtrl
//! A: macro(hello)
//!
//! [Macro(hello,50)]
//! press: H+I
//!
//! [Lighting(rainbow,Base)]
//! [NoLighting(Layer3)]
//! ```
//!
//! Compilation runs two passes over the same text: pass one handles macro
//! and lighting sections, pass two handles layer sections. Layer bindings
//! can therefore reference macros and effects declared anywhere in the
//! file. No line can abort a compile; bad tokens are dropped where they
//! stand and logged when a reference goes unfulfilled.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::driver_value::{self, DriverValueKind, UNUSED_KEY_VALUE};
use crate::keyboard::KeyboardState;
use crate::lighting::LightingEffect;
use crate::macros::{Macro, MacroRepeatType};

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// Layer identifiers. Each exists twice: a base key table and an Fn key
/// table, selected by the `fn` prefix in headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyboardLayer {
    Base,
    Layer1,
    Layer2,
    Layer3,
}

impl KeyboardLayer {
    pub const ALL: [KeyboardLayer; 4] = [
        KeyboardLayer::Base,
        KeyboardLayer::Layer1,
        KeyboardLayer::Layer2,
        KeyboardLayer::Layer3,
    ];

    /// Case-insensitive name parse (`base`, `layer1`..`layer3`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "base" => Some(Self::Base),
            "layer1" => Some(Self::Layer1),
            "layer2" => Some(Self::Layer2),
            "layer3" => Some(Self::Layer3),
            _ => None,
        }
    }
}

impl fmt::Display for KeyboardLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Base => "Base",
            Self::Layer1 => "Layer1",
            Self::Layer2 => "Layer2",
            Self::Layer3 => "Layer3",
        };
        f.write_str(name)
    }
}

/// `fnbase` selects the Fn table of Base, `base` the base table, etc.
fn layer_target(token: &str) -> Option<(bool, KeyboardLayer)> {
    let lower = token.trim().to_ascii_lowercase();
    match lower.strip_prefix("fn") {
        Some(rest) => KeyboardLayer::from_name(rest).map(|l| (true, l)),
        None => KeyboardLayer::from_name(&lower).map(|l| (false, l)),
    }
}

/// One key-remap table: source driver value → destination driver value.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    keys: HashMap<u32, u32>,
}

impl Layer {
    /// Remapped value for a source key; unbound keys read back as
    /// [`UNUSED_KEY_VALUE`].
    pub fn key(&self, src: u32) -> u32 {
        self.keys.get(&src).copied().unwrap_or(UNUSED_KEY_VALUE)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.keys.iter().map(|(&src, &dst)| (src, dst))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn set_key(&mut self, src: u32, dst: u32) {
        self.keys.insert(src, dst);
    }
}

// ---------------------------------------------------------------------------
// Compiled output
// ---------------------------------------------------------------------------

/// Everything the device layer needs from one profile file.
#[derive(Debug, Default)]
pub struct CompiledProfile {
    layers: HashMap<KeyboardLayer, Layer>,
    fn_layers: HashMap<KeyboardLayer, Layer>,
    macros: HashMap<String, Macro>,
    lighting_effects: HashMap<String, LightingEffect>,
    no_lighting: bool,
    no_lighting_layers: HashSet<KeyboardLayer>,
}

impl CompiledProfile {
    /// Compile `<file>`, reading lighting effects relative to `data_root`.
    /// A missing or unreadable profile file means there is nothing to
    /// compile.
    pub fn load(
        keyboard: &KeyboardState,
        file: &Path,
        data_root: &Path,
    ) -> Option<CompiledProfile> {
        if !file.is_file() {
            return None;
        }
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                warn!(file = %file.display(), %err, "failed to read profile");
                return None;
            }
        };
        Some(Self::from_text(keyboard, &text, data_root))
    }

    /// Compile profile text directly.
    pub fn from_text(keyboard: &KeyboardState, text: &str, data_root: &Path) -> CompiledProfile {
        let mut compiler = Compiler {
            keyboard,
            data_root,
            profile: CompiledProfile::default(),
            next_macro_id: 0,
            next_lighting_id: 0,
            group: Group::None,
        };
        compiler.run(text);
        compiler.profile
    }

    pub fn layer(&self, layer: KeyboardLayer) -> Option<&Layer> {
        self.layers.get(&layer)
    }

    pub fn fn_layer(&self, layer: KeyboardLayer) -> Option<&Layer> {
        self.fn_layers.get(&layer)
    }

    pub fn macro_by_name(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn macros(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    pub fn lighting_effect(&self, name: &str) -> Option<&LightingEffect> {
        self.lighting_effects.get(name)
    }

    /// Effects attached to a layer, in id order.
    pub fn lighting_effects_for(&self, layer: KeyboardLayer) -> Vec<&LightingEffect> {
        let mut effects: Vec<&LightingEffect> = self
            .lighting_effects
            .values()
            .filter(|e| e.layers.contains(&layer))
            .collect();
        effects.sort_by_key(|e| e.id);
        effects
    }

    /// Distinct macros referenced by a layer's base and Fn key tables.
    /// Callers use this to size device macro-slot storage.
    pub fn num_macros(&self, layer: KeyboardLayer) -> usize {
        let mut ids = HashSet::new();
        let tables = [self.layers.get(&layer), self.fn_layers.get(&layer)];
        for table in tables.into_iter().flatten() {
            for (_, dst) in table.bindings() {
                if let Some(id) = driver_value::macro_id(dst) {
                    ids.insert(id);
                }
            }
        }
        ids.len()
    }

    /// Whether lighting is suppressed on a layer, globally or individually.
    pub fn no_lighting(&self, layer: KeyboardLayer) -> bool {
        self.no_lighting || self.no_lighting_layers.contains(&layer)
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Layer,
    Macro,
    Lighting,
}

/// The active group while scanning lines. Layer headers accumulate every
/// recognized token so one remap line can target several tables at once.
#[derive(Debug, Clone)]
enum Group {
    None,
    Layers(Vec<(bool, KeyboardLayer)>),
    Macro(String),
    Lighting,
}

struct Compiler<'a> {
    keyboard: &'a KeyboardState,
    data_root: &'a Path,
    profile: CompiledProfile,
    next_macro_id: u16,
    next_lighting_id: u16,
    group: Group,
}

impl Compiler<'_> {
    fn run(&mut self, text: &str) {
        const PASSES: [&[GroupKind]; 2] = [
            &[GroupKind::Lighting, GroupKind::Macro],
            &[GroupKind::Layer],
        ];
        for allowed in PASSES {
            self.group = Group::None;
            for raw in text.lines() {
                let line = raw.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if line.starts_with('[') {
                    self.open_group(line, allowed);
                } else {
                    self.data_line(line);
                }
            }
        }
    }

    // ---- headers ----------------------------------------------------------

    fn open_group(&mut self, line: &str, allowed: &[GroupKind]) {
        // An unrecognized or malformed header closes the current group so
        // its data lines cannot leak into the previous one.
        self.group = Group::None;

        let Some(close) = line.find(']') else {
            return;
        };
        let content = line[1..close].trim();

        if let Some(paren) = content.find('(') {
            let kind = content[..paren].trim().to_ascii_lowercase();
            let inner_end = match content.rfind(')') {
                Some(end) if end > paren => end,
                _ => content.len(),
            };
            let inner: Vec<&str> = content[paren + 1..inner_end]
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            match kind.as_str() {
                "macro" if allowed.contains(&GroupKind::Macro) => self.open_macro(&inner),
                "lighting" if allowed.contains(&GroupKind::Lighting) => self.open_lighting(&inner),
                // Suppression applies regardless of pass; re-running it is
                // harmless.
                "nolighting" => {
                    for token in &inner {
                        if let Some(layer) = KeyboardLayer::from_name(token) {
                            self.profile.no_lighting_layers.insert(layer);
                        }
                    }
                }
                _ => {}
            }
            return;
        }

        if content.eq_ignore_ascii_case("nolighting") {
            self.profile.no_lighting = true;
            return;
        }

        let targets: Vec<(bool, KeyboardLayer)> = content
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter_map(layer_target)
            .collect();
        if !targets.is_empty() && allowed.contains(&GroupKind::Layer) {
            self.group = Group::Layers(targets);
        }
    }

    /// `[Macro(name,delay,repeat,count,trailing)]`; only the name is
    /// required. A repeated name merges into the existing macro: settings
    /// update, id and already-collected actions stay.
    fn open_macro(&mut self, inner: &[&str]) {
        let Some(&name) = inner.first() else {
            return;
        };
        let m = self
            .profile
            .macros
            .entry(name.to_string())
            .or_insert_with(|| Macro::new(name));
        if let Some(arg) = inner.get(1) {
            m.default_delay = arg.parse().unwrap_or(0);
        }
        if let Some(arg) = inner.get(2) {
            m.repeat_type = MacroRepeatType::from_name(arg);
        }
        if let Some(arg) = inner.get(3) {
            let count: u8 = arg.parse().unwrap_or(0);
            m.repeat_count = if count == 0 { 1 } else { count };
        }
        if let Some(arg) = inner.get(4) {
            m.use_trailing_delay = arg.eq_ignore_ascii_case("true");
        }
        self.group = Group::Macro(name.to_string());
    }

    /// `[Lighting(name,layer,...)]`. The effect is loaded once; a failed
    /// load is retried on the next reference, a committed one only gains
    /// layer attachments.
    fn open_lighting(&mut self, inner: &[&str]) {
        let Some(&name) = inner.first() else {
            return;
        };
        if !self.profile.lighting_effects.contains_key(name) {
            match LightingEffect::load(name, self.keyboard, self.data_root) {
                Ok(mut effect) => {
                    debug_assert!(self.next_lighting_id <= 0xFF);
                    effect.id = Some(self.next_lighting_id as u8);
                    self.next_lighting_id += 1;
                    self.profile.lighting_effects.insert(name.to_string(), effect);
                }
                Err(err) => {
                    warn!(effect = name, %err, "failed to load lighting effect");
                    return;
                }
            }
        }
        if let Some(effect) = self.profile.lighting_effects.get_mut(name) {
            for token in &inner[1..] {
                if let Some(layer) = KeyboardLayer::from_name(token) {
                    effect.layers.insert(layer);
                }
            }
        }
        self.group = Group::Lighting;
    }

    // ---- data lines -------------------------------------------------------

    fn data_line(&mut self, line: &str) {
        match &self.group {
            Group::Layers(targets) => {
                let targets = targets.clone();
                self.layer_line(&targets, line);
            }
            Group::Macro(name) => {
                let name = name.clone();
                self.macro_line(&name, line);
            }
            Group::Lighting | Group::None => {}
        }
    }

    /// `src[+src...]: dst[+dst...]` — write one remap into every current
    /// layer table.
    fn layer_line(&mut self, targets: &[(bool, KeyboardLayer)], line: &str) {
        let parts: Vec<&str> = line
            .split(':')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            return;
        }

        // Source: last successfully parsed token wins.
        let mut src = 0u32;
        for token in split_tokens(parts[0]) {
            if let Some(value) = driver_value_token(token) {
                src = value;
            }
        }
        if src == 0 {
            warn!(line, "no resolvable source key, line dropped");
            return;
        }

        // Destination: hex and non-Key constants replace, Key-class
        // constants OR-combine so modifier chords build up.
        let mut dst = 0u32;
        for token in split_tokens(parts[1]) {
            if let Some(hex) = strip_hex_prefix(token) {
                if let Ok(value) = u32::from_str_radix(hex, 16) {
                    dst = value;
                }
                continue;
            }
            if let Some(macro_name) = macro_reference(token) {
                match self.reference_macro(macro_name) {
                    Some(id) => dst = driver_value::macro_value(id),
                    None => warn!(
                        macro_name,
                        key = %driver_value::name(src),
                        "macro not defined, binding left unchanged"
                    ),
                }
                continue;
            }
            if let Some(value) = driver_value::from_name(token) {
                match driver_value::kind(value) {
                    DriverValueKind::Key | DriverValueKind::Modifier => dst |= value,
                    _ => dst = value,
                }
            }
        }

        for &(is_fn, layer) in targets {
            let tables = if is_fn {
                &mut self.profile.fn_layers
            } else {
                &mut self.profile.layers
            };
            tables.entry(layer).or_default().set_key(src, dst);
        }
    }

    /// `press|down|up: keys [: delay]`.
    fn macro_line(&mut self, name: &str, line: &str) {
        let parts: Vec<&str> = line
            .split(':')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            return;
        }
        let Some(m) = self.profile.macros.get_mut(name) else {
            return;
        };
        let delay = parts
            .get(2)
            .and_then(|p| p.parse().ok())
            .unwrap_or(m.default_delay);
        m.push_action_line(parts[0], parts[1], delay);
    }

    /// Look up a macro by name, assigning its id on first reference.
    /// Ids count up from zero in reference order, separate from lighting
    /// ids.
    fn reference_macro(&mut self, name: &str) -> Option<u8> {
        let m = self.profile.macros.get_mut(name)?;
        if m.id.is_none() {
            debug_assert!(u32::from(self.next_macro_id) <= driver_value::MAX_MACRO_ID);
            m.id = Some(self.next_macro_id as u8);
            self.next_macro_id += 1;
        }
        m.id
    }
}

fn split_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split('+').map(str::trim).filter(|t| !t.is_empty())
}

fn strip_hex_prefix(token: &str) -> Option<&str> {
    token.strip_prefix("0x").or_else(|| token.strip_prefix("0X"))
}

/// Source-side token: hex driver value or symbolic name.
fn driver_value_token(token: &str) -> Option<u32> {
    if let Some(hex) = strip_hex_prefix(token) {
        return u32::from_str_radix(hex, 16).ok();
    }
    driver_value::from_name(token)
}

/// `macro(name)` destination reference (keyword case-insensitive).
fn macro_reference(token: &str) -> Option<&str> {
    let keyword = token.get(..5)?;
    if !keyword.eq_ignore_ascii_case("macro") {
        return None;
    }
    let rest = &token[5..];
    let open = rest.find('(')?;
    let close = rest.rfind(')')?;
    (close > open).then(|| rest[open + 1..close].trim())
}
