//! Renderer and mapping configuration.
//!
//! ```toml
//! [markers]
//! ordered = "{n}. "
//! bullet = "• "
//!
//! [decorations]
//! list_item_breaks = true
//! zero_width_break = "\u200B"
//! placeholder = "\u00A0"
//!
//! [mapping]
//! caret_affinity = "before"
//! stale_catalog = "clamp"
//! ```
//!
//! Every field is optional. Loading from disk (and environment substitution)
//! is the caller's business; this module only parses and validates.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Affinity;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub markers: MarkerConfig,
    pub decorations: DecorationConfig,
    pub mapping: MappingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    /// Ordered-list marker; `{n}` is replaced by the item number.
    pub ordered: String,
    pub bullet: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            ordered: "{n}. ".into(),
            bullet: "\u{2022} ".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecorationConfig {
    /// Emit a zero-width break before every list item but the first.
    pub list_item_breaks: bool,
    pub zero_width_break: char,
    pub placeholder: char,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            list_item_breaks: true,
            zero_width_break: '\u{200B}',
            placeholder: '\u{A0}',
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// Side of a decoration boundary a model caret lands on.
    pub caret_affinity: Affinity,
    pub stale_catalog: StalePolicy,
}

/// What a session does with a host event from an older buffer generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Programming error: panic.
    Panic,
    /// Warn, clamp the offsets into the current buffer and carry on.
    Clamp,
    /// Return `StaleCatalog` to the caller.
    Reject,
}

impl Default for StalePolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            StalePolicy::Panic
        } else {
            StalePolicy::Clamp
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.bullet.is_empty() {
            return Err(ConfigError::EmptyMarker("markers.bullet"));
        }
        if !self.markers.ordered.contains("{n}") {
            return Err(ConfigError::MissingNumber(self.markers.ordered.clone()));
        }
        single_unit("decorations.zero_width_break", self.decorations.zero_width_break)?;
        single_unit("decorations.placeholder", self.decorations.placeholder)?;
        Ok(())
    }

    /// Marker text for item number `n` of an ordered list.
    pub fn ordered_marker(&self, n: i64) -> String {
        self.markers.ordered.replace("{n}", &n.to_string())
    }
}

fn single_unit(field: &'static str, value: char) -> Result<(), ConfigError> {
    if value.len_utf16() == 1 {
        Ok(())
    } else {
        Err(ConfigError::NotSingleUnit { field, value })
    }
}
