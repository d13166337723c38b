//! UTF-16 text storage.
//!
//! Both offset spaces count UTF-16 code units, so model text nodes and host
//! buffers are held as raw code units instead of `String`s. Raw units can carry
//! unpaired surrogates (hosts hand over whatever their text view contains), so
//! validity is something you ask about rather than something the type promises.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Returns true for the first half of a surrogate pair.
pub fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

/// Returns true for the second half of a surrogate pair.
pub fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

fn is_invisible(ch: char) -> bool {
    ch.is_control() || matches!(ch, '\u{a0}' | '\u{200b}'..='\u{200f}' | '\u{feff}')
}

/// An owned run of UTF-16 code units.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Utf16Text {
    units: Vec<u16>,
}

impl Utf16Text {
    /// Create empty text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw code units. No validation happens here.
    pub fn from_units(units: impl Into<Vec<u16>>) -> Self {
        Self {
            units: units.into(),
        }
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn push_char(&mut self, ch: char) {
        let mut buf = [0u16; 2];
        self.units.extend_from_slice(ch.encode_utf16(&mut buf));
    }

    pub fn push_units(&mut self, units: &[u16]) {
        self.units.extend_from_slice(units);
    }

    /// Copy out a sub-range. Returns None if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<Utf16Text> {
        self.units.get(range).map(Utf16Text::from_units)
    }

    /// Remove every occurrence of `ch`. Only BMP characters can be removed
    /// this way; anything wider is left alone.
    pub fn without_char(&self, ch: char) -> Utf16Text {
        let mut buf = [0u16; 2];
        match ch.encode_utf16(&mut buf) {
            [unit] => {
                let unit = *unit;
                Utf16Text::from_units(
                    self.units
                        .iter()
                        .copied()
                        .filter(|u| *u != unit)
                        .collect::<Vec<_>>(),
                )
            }
            _ => self.clone(),
        }
    }

    /// Decode to a `String`, replacing unpaired surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }

    /// Lossy decode with invisible characters spelled out as `\u{..}`, for
    /// logs and snapshots.
    pub fn to_escaped_string(&self) -> String {
        let mut out = String::with_capacity(self.len());
        for ch in self.to_string_lossy().chars() {
            if is_invisible(ch) {
                out.extend(ch.escape_unicode());
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Index of the first code unit that is half of a broken surrogate pair.
    pub fn find_unpaired_surrogate(&self) -> Option<usize> {
        let units = &self.units;
        let mut i = 0;
        while i < units.len() {
            let unit = units[i];
            if is_high_surrogate(unit) {
                match units.get(i + 1) {
                    Some(next) if is_low_surrogate(*next) => {
                        i += 2;
                        continue;
                    }
                    _ => return Some(i),
                }
            }
            if is_low_surrogate(unit) {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Whether `offset` is a valid place to put a caret: within bounds and
    /// not between the two halves of a surrogate pair.
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        if offset == 0 || offset == self.len() {
            return true;
        }
        if offset > self.len() {
            return false;
        }
        !(is_high_surrogate(self.units[offset - 1]) && is_low_surrogate(self.units[offset]))
    }

    /// Every in-bounds offset that sits inside a surrogate pair.
    pub fn split_points(&self) -> Vec<usize> {
        (1..self.len())
            .filter(|&offset| !self.is_char_boundary(offset))
            .collect()
    }
}

impl From<&str> for Utf16Text {
    fn from(s: &str) -> Self {
        Self {
            units: s.encode_utf16().collect(),
        }
    }
}

impl From<String> for Utf16Text {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for Utf16Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for Utf16Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl Serialize for Utf16Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de> Deserialize<'de> for Utf16Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Utf16Text::from(s))
    }
}
