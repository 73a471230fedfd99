use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::{Error, Result};

use super::{
    Config, DisplayConfig, FontConfig, IconMap, Section, Thresholds, TimingConfig,
    CONFIG_FILE_NAME, FONT_DIR_NAME,
};

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    Missing,
    Unparseable(String),
}

/// Merged configuration plus the notes the caller should log.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub origin: ConfigOrigin,
    /// Sections that were present but rejected, with the reason.
    pub fallbacks: Vec<(&'static str, String)>,
}

impl LoadedConfig {
    fn defaults(origin: ConfigOrigin) -> Self {
        Self {
            config: Config::default(),
            origin,
            fallbacks: Vec::new(),
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<LoadedConfig> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(parse(&raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Ok(LoadedConfig::defaults(ConfigOrigin::Missing))
        }
        Err(err) => Err(err.into()),
    }
}

pub fn parse(raw: &str) -> LoadedConfig {
    let user = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return LoadedConfig::defaults(ConfigOrigin::Unparseable(
                "top level must be a JSON object".into(),
            ))
        }
        Err(err) => return LoadedConfig::defaults(ConfigOrigin::Unparseable(err.to_string())),
    };

    let mut fallbacks = Vec::new();
    let config = Config {
        display: merge_section::<DisplayConfig>(&user, &mut fallbacks),
        timing: merge_section::<TimingConfig>(&user, &mut fallbacks),
        fonts: merge_section::<FontConfig>(&user, &mut fallbacks),
        thresholds: merge_section::<Thresholds>(&user, &mut fallbacks),
        icons: merge_section::<IconMap>(&user, &mut fallbacks),
    };

    LoadedConfig {
        config,
        origin: ConfigOrigin::File,
        fallbacks,
    }
}

fn merge_section<T: Section>(
    user: &Map<String, Value>,
    fallbacks: &mut Vec<(&'static str, String)>,
) -> T {
    let Some(overrides) = user.get(T::KEY) else {
        return T::default();
    };

    let merged = merge_value::<T>(overrides).and_then(|section| {
        section.validate()?;
        Ok(section)
    });
    match merged {
        Ok(section) => section,
        Err(err) => {
            fallbacks.push((T::KEY, err.to_string()));
            T::default()
        }
    }
}

/// Shallow merge: user keys win, default keys the user left out survive.
fn merge_value<T: Section>(overrides: &Value) -> Result<T> {
    let mut base = serde_json::to_value(T::default())?;
    match (&mut base, overrides) {
        (Value::Object(base_map), Value::Object(user_map)) => {
            for (key, value) in user_map {
                let key = T::ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key.as_str())
                    .map(|(_, canonical)| canonical.to_string())
                    .unwrap_or_else(|| key.clone());
                base_map.insert(key, value.clone());
            }
        }
        (_, other) => base = other.clone(),
    }
    Ok(serde_json::from_value(base)?)
}

pub fn default_config_path() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "pixelstat")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            Error::InvalidArgs("HOME not set; cannot locate config directory".into())
        })
}

/// Fonts live in a `Fonts/` directory next to the config file.
pub fn font_dir_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(FONT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::I2cAddress;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn loads_default_when_missing() {
        let dir = tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join("config.json")).unwrap();
        assert_eq!(loaded.origin, ConfigOrigin::Missing);
        assert_eq!(loaded.config, Config::default());
    }

    #[test]
    fn falls_back_to_defaults_on_bad_json() {
        let loaded = parse("{ \"display\": ");
        assert!(matches!(loaded.origin, ConfigOrigin::Unparseable(_)));
        assert_eq!(loaded.config, Config::default());

        let loaded = parse("[1, 2]");
        assert!(matches!(loaded.origin, ConfigOrigin::Unparseable(_)));
    }

    #[test]
    fn partial_section_keeps_default_keys() {
        let loaded = parse(r#"{"timing": {"rotation_interval": 5}, "display": {"i2c_address": "0x3D"}}"#);
        assert_eq!(loaded.origin, ConfigOrigin::File);
        assert!(loaded.fallbacks.is_empty());
        assert_eq!(loaded.config.timing.rotation_interval, 5);
        assert_eq!(loaded.config.timing.refresh_interval, 1.0);
        assert_eq!(loaded.config.display.i2c_address, I2cAddress(0x3d));
        assert_eq!(loaded.config.display.width, 128);
    }

    #[test]
    fn icon_overrides_merge_with_default_table() {
        let loaded = parse(r#"{"icons": {"wifi": "W"}}"#);
        assert_eq!(loaded.config.icons.get("wifi"), Some("W"));
        assert_eq!(loaded.config.icons.get("lan"), Some("\u{f6ff}"));
    }

    #[test]
    fn invalid_section_falls_back_alone() {
        let loaded = parse(
            r#"{"thresholds": {"temp_warn": "hot"}, "timing": {"refresh_interval": 2.5}}"#,
        );
        assert_eq!(loaded.config.thresholds, Thresholds::default());
        assert_eq!(loaded.config.timing.refresh_interval, 2.5);
        assert_eq!(loaded.fallbacks.len(), 1);
        assert_eq!(loaded.fallbacks[0].0, "thresholds");
    }

    #[test]
    fn section_failing_validation_falls_back() {
        let loaded = parse(r#"{"display": {"width": 100, "height": 50}}"#);
        assert_eq!(loaded.config.display, DisplayConfig::default());
        assert_eq!(loaded.fallbacks[0].0, "display");
        assert!(loaded.fallbacks[0].1.contains("100x50"));
    }

    #[test]
    fn unsleepable_refresh_falls_back_to_timing_defaults() {
        for raw in [
            r#"{"timing": {"refresh_interval": 1e20, "rotation_interval": 5}}"#,
            r#"{"timing": {"refresh_interval": 1e-300, "rotation_interval": 5}}"#,
        ] {
            let loaded = parse(raw);
            assert_eq!(loaded.config.timing, TimingConfig::default(), "{raw}");
            assert_eq!(loaded.fallbacks.len(), 1);
            assert_eq!(loaded.fallbacks[0].0, "timing");
            assert_eq!(loaded.config.timing.refresh_duration(), Duration::from_secs(1));
        }
    }

    #[test]
    fn bus_address_alias_is_accepted() {
        let loaded = parse(r#"{"display": {"bus_address": 61}}"#);
        assert!(loaded.fallbacks.is_empty(), "{:?}", loaded.fallbacks);
        assert_eq!(loaded.config.display.i2c_address, I2cAddress(0x3d));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"thresholds": {"load_warn": 1.5}}"#).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.config.thresholds.load_warn, 1.5);
        assert_eq!(loaded.config.thresholds.temp_warn, 70.0);
        assert_eq!(font_dir_for(&path), dir.path().join("Fonts"));
    }
}
