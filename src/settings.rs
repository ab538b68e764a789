//! Collision rule configuration
//!
//! Snapshotted by the driver once per tick and handed to the simulation by
//! reference. Persisted separately in LocalStorage so the controls survive a
//! page reload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How the note counter moves after each colliding ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NoteMode {
    #[default]
    Same,
    Increase,
    Decrease,
}

impl NoteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteMode::Same => "same",
            NoteMode::Increase => "increase",
            NoteMode::Decrease => "decrease",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "same" => Some(NoteMode::Same),
            "increase" | "up" => Some(NoteMode::Increase),
            "decrease" | "down" => Some(NoteMode::Decrease),
            _ => None,
        }
    }

    /// Signed note change applied once per colliding ball
    pub fn step(&self) -> f32 {
        match self {
            NoteMode::Same => 0.0,
            NoteMode::Increase => crate::consts::NOTE_STEP,
            NoteMode::Decrease => -crate::consts::NOTE_STEP,
        }
    }
}

/// Rule toggles and parameters for a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    // === Collision reactions ===
    /// Radius +1 on collision
    pub grow: bool,
    /// Radius -1 on collision (no floor)
    pub shrink: bool,
    /// Reverse velocity after the repulsion kick
    pub small_space: bool,
    /// Random color on collision
    pub recolor: bool,
    /// Velocity x1.1 on collision
    pub speed_change: bool,

    // === Arena ===
    /// Spin the arena rings (cosmetic)
    pub rotate: bool,
    /// Number of concentric rings to draw
    #[serde(deserialize_with = "lenient_circle_layers")]
    pub circle_layers: u32,

    // === Parameters ===
    /// Speed the ball is kicked back with on a containment hit
    #[serde(deserialize_with = "lenient_repulsion_force")]
    pub repulsion_force: f32,
    /// Offspring spawned per collision
    #[serde(deserialize_with = "lenient_multiply_count")]
    pub multiply_count: u32,
    /// Note progression across collisions
    #[serde(deserialize_with = "lenient_note_mode")]
    pub note_mode: NoteMode,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            grow: false,
            shrink: false,
            small_space: false,
            recolor: false,
            speed_change: false,

            rotate: false,
            circle_layers: 1,

            repulsion_force: 5.0,
            multiply_count: 0,
            note_mode: NoteMode::Same,
        }
    }
}

impl RuleConfig {
    /// Repulsion force safe to feed into the physics (non-finite becomes 0)
    pub fn effective_repulsion(&self) -> f32 {
        if self.repulsion_force.is_finite() {
            self.repulsion_force
        } else {
            0.0
        }
    }

    /// Parse a (possibly partial) JSON object. Missing fields take defaults,
    /// and so do malformed ones, without disturbing their neighbours.
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Invalid rule config JSON: {}", e);
                None
            }
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "circle_asmr_rules";

    /// Environment variable naming a JSON config file
    #[cfg(not(target_arch = "wasm32"))]
    const CONFIG_ENV: &'static str = "CIRCLE_ASMR_CONFIG";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(config) = Self::from_json(&json) {
                    log::info!("Loaded rule config from LocalStorage");
                    return config;
                }
            }
        }

        log::info!("Using default rule config");
        Self::default()
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::debug!("Rule config saved");
            }
        }
    }

    /// Load config from the file named by `CIRCLE_ASMR_CONFIG`, else defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::CONFIG_ENV) else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|| {
                log::warn!("Falling back to default rule config");
                Self::default()
            }),
            Err(e) => {
                log::warn!("Could not read {} '{}': {}", Self::CONFIG_ENV, path, e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

// Stored configs are hand-editable, so each field degrades on its own

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_int_prefix(s).map(|v| v as f64),
        _ => None,
    }
}

fn count(value: &Value) -> Option<u32> {
    number(value).map(|v| v.clamp(0.0, u32::MAX as f64) as u32)
}

fn or_default<T: std::fmt::Debug>(field: &str, value: &Value, parsed: Option<T>, default: T) -> T {
    parsed.unwrap_or_else(|| {
        log::warn!("Malformed {} {} in rule config, using {:?}", field, value, default);
        default
    })
}

fn lenient_circle_layers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let default = RuleConfig::default().circle_layers;
    Ok(or_default("circle_layers", &value, count(&value), default))
}

fn lenient_multiply_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let default = RuleConfig::default().multiply_count;
    Ok(or_default("multiply_count", &value, count(&value), default))
}

fn lenient_repulsion_force<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = number(&value).map(|v| v as f32).filter(|v| v.is_finite());
    let default = RuleConfig::default().repulsion_force;
    Ok(or_default("repulsion_force", &value, parsed, default))
}

fn lenient_note_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NoteMode, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = value.as_str().and_then(NoteMode::from_str);
    Ok(or_default("note_mode", &value, parsed, NoteMode::default()))
}

/// Optional sign then leading decimal digits; `None` when there are no digits
fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }

    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Parse an integer from control text the way a browser `parseInt` would:
/// optional whitespace and sign, then leading decimal digits. Anything that
/// yields no digits becomes 0.
pub fn parse_int_lenient(text: &str) -> i64 {
    parse_int_prefix(text).unwrap_or_else(|| {
        if !text.trim().is_empty() {
            log::warn!("Unparseable numeric input '{}', using 0", text);
        }
        0
    })
}

/// Lenient parse clamped to a non-negative count
pub fn parse_count_lenient(text: &str) -> u32 {
    parse_int_lenient(text).clamp(0, u32::MAX as i64) as u32
}
