use crate::config::IconMap;

/// Normal/warning verdict for one metric against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Normal,
    Warning,
}

impl Level {
    pub fn suffix(&self) -> &'static str {
        match self {
            Level::Normal => "normal",
            Level::Warning => "warn",
        }
    }
}

/// `value >= threshold` is a warning; the boundary itself warns.
pub fn classify(value: f64, threshold: f64) -> Level {
    if value >= threshold {
        Level::Warning
    } else {
        Level::Normal
    }
}

/// `"{base}_{normal|warn}"`, the composite key into the icon table.
pub fn icon_key(base: &str, level: Level) -> String {
    format!("{base}_{}", level.suffix())
}

/// A resolved icon: the string to draw and the space it reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub text: String,
    pub advance: i32,
}

/// Maps semantic keys to glyphs. When the icon font did not load every lookup
/// resolves to nothing and reserves no width.
#[derive(Debug, Clone)]
pub struct IconSet {
    table: IconMap,
    available: bool,
    advance: i32,
    advance_large: i32,
}

impl IconSet {
    pub fn new(table: IconMap, available: bool, advance: i32, advance_large: i32) -> Self {
        Self {
            table,
            available,
            advance,
            advance_large,
        }
    }

    /// Text-only mode.
    pub fn unavailable() -> Self {
        Self::new(IconMap::default(), false, 0, 0)
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn glyph(&self, key: &str) -> Option<Glyph> {
        self.lookup(key, self.advance)
    }

    pub fn glyph_large(&self, key: &str) -> Option<Glyph> {
        self.lookup(key, self.advance_large)
    }

    pub fn glyph_for(&self, base: &str, level: Level) -> Option<Glyph> {
        self.glyph(&icon_key(base, level))
    }

    /// Width a glyph for `key` would take; zero when nothing is drawn.
    pub fn advance(&self, key: &str) -> i32 {
        self.glyph(key).map(|g| g.advance).unwrap_or(0)
    }

    fn lookup(&self, key: &str, advance: i32) -> Option<Glyph> {
        if !self.available {
            return None;
        }
        self.table.get(key).map(|text| Glyph {
            text: text.to_string(),
            advance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_value_is_a_warning() {
        assert_eq!(classify(70.0, 70.0), Level::Warning);
        assert_eq!(classify(69.999, 70.0), Level::Normal);
        assert_eq!(classify(75.0, 70.0), Level::Warning);
        assert_eq!(classify(0.0, 0.0), Level::Warning);
        assert_eq!(classify(-1.0, 0.0), Level::Normal);
    }

    #[test]
    fn composite_keys() {
        assert_eq!(icon_key("mem", Level::Normal), "mem_normal");
        assert_eq!(icon_key("load", Level::Warning), "load_warn");
    }

    #[test]
    fn resolves_through_configured_table() {
        let icons = IconSet::new(IconMap::default(), true, 16, 26);
        let glyph = icons.glyph_for("temp", Level::Warning).unwrap();
        assert_eq!(glyph.text, "\u{f06d}");
        assert_eq!(glyph.advance, 16);
        assert_eq!(icons.glyph_large("offline").unwrap().advance, 26);
        assert_eq!(icons.glyph("nope"), None);
        assert_eq!(icons.advance("nope"), 0);
    }

    #[test]
    fn unavailable_icons_reserve_no_width() {
        let icons = IconSet::new(IconMap::default(), false, 16, 26);
        for key in ["hostname", "lan", "wifi", "load_warn", "disk_normal", "offline"] {
            assert_eq!(icons.glyph(key), None);
            assert_eq!(icons.advance(key), 0);
        }
        assert!(icons.glyph_large("offline").is_none());
        assert!(!IconSet::unavailable().available());
    }
}
