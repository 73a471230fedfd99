use crate::{Error, Result};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub mod loader;

pub use loader::{ConfigOrigin, LoadedConfig};

pub const DEFAULT_WIDTH: u32 = 128;
pub const DEFAULT_HEIGHT: u32 = 64;
pub const DEFAULT_I2C_ADDR: I2cAddress = I2cAddress(0x3c);
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";
pub const DEFAULT_RESET_PIN: u8 = 4;
pub const DEFAULT_REFRESH_SECS: f64 = 1.0;
pub const DEFAULT_ROTATION_TICKS: u32 = 3;
/// Shortest tick the loop will sleep for.
pub const MIN_REFRESH: Duration = Duration::from_millis(1);
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const FONT_DIR_NAME: &str = "Fonts";
/// Font name that selects the embedded bitmap fonts instead of a TTF file.
pub const BUILTIN_FONT: &str = "builtin";

/// Panel geometries the SSD1306 driver can address.
pub const SUPPORTED_GEOMETRIES: [(u32, u32); 5] =
    [(128, 64), (128, 32), (96, 16), (72, 40), (64, 48)];

/// 7-bit bus address of the panel, written as hex (`"0x3C"`) or decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cAddress(pub u8);

impl FromStr for I2cAddress {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_i2c_addr(s)
    }
}

impl Serialize for I2cAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#04x}", self.0))
    }
}

impl<'de> Deserialize<'de> for I2cAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) if n <= 0x7f => Ok(I2cAddress(n as u8)),
            Raw::Number(n) => Err(serde::de::Error::custom(format!(
                "address {n} does not fit in 7 bits"
            ))),
            Raw::Text(s) => parse_i2c_addr(&s).map_err(serde::de::Error::custom),
        }
    }
}

fn parse_i2c_addr(raw: &str) -> std::result::Result<I2cAddress, String> {
    let trimmed = raw.trim();
    let value = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<u8>().ok(),
    };
    match value {
        Some(addr) if addr <= 0x7f => Ok(I2cAddress(addr)),
        _ => Err(format!(
            "expected a hex/decimal 7-bit address (e.g., 0x3C), got '{raw}'"
        )),
    }
}

/// One top-level key of the config file. Sections merge and fall back independently.
pub trait Section: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;
    /// Alternate key spellings, renamed before merging: `(alias, canonical)`.
    const ALIASES: &'static [(&'static str, &'static str)] = &[];

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub i2c_address: I2cAddress,
    pub rotation: u8,
    pub i2c_bus: String,
    pub reset_pin: Option<u8>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            i2c_address: DEFAULT_I2C_ADDR,
            rotation: 0,
            i2c_bus: DEFAULT_I2C_BUS.to_string(),
            reset_pin: Some(DEFAULT_RESET_PIN),
        }
    }
}

impl DisplayConfig {
    /// `rotation = 2` asks the device layer for a 180° flip.
    pub fn flipped(&self) -> bool {
        self.rotation == 2
    }
}

impl Section for DisplayConfig {
    const KEY: &'static str = "display";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("bus_address", "i2c_address")];

    fn validate(&self) -> Result<()> {
        if !SUPPORTED_GEOMETRIES.contains(&(self.width, self.height)) {
            return Err(Error::InvalidArgs(format!(
                "display geometry {}x{} is not supported by the SSD1306 driver",
                self.width, self.height
            )));
        }
        if self.rotation != 0 && self.rotation != 2 {
            return Err(Error::InvalidArgs(format!(
                "display rotation must be 0 or 2, got {}",
                self.rotation
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Seconds between ticks.
    pub refresh_interval: f64,
    /// Ticks each network fact stays on screen.
    pub rotation_interval: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_SECS,
            rotation_interval: DEFAULT_ROTATION_TICKS,
        }
    }
}

impl TimingConfig {
    /// Out-of-range intervals (only reachable by skipping `validate`) use the default.
    pub fn refresh_duration(&self) -> Duration {
        match Duration::try_from_secs_f64(self.refresh_interval) {
            Ok(refresh) if refresh >= MIN_REFRESH => refresh,
            _ => Duration::from_secs_f64(DEFAULT_REFRESH_SECS),
        }
    }
}

impl Section for TimingConfig {
    const KEY: &'static str = "timing";

    fn validate(&self) -> Result<()> {
        match Duration::try_from_secs_f64(self.refresh_interval) {
            Ok(refresh) if refresh >= MIN_REFRESH => Ok(()),
            _ => Err(Error::InvalidArgs(format!(
                "refresh_interval must be between {} and {} seconds, got {}",
                MIN_REFRESH.as_secs_f64(),
                Duration::MAX.as_secs_f64(),
                self.refresh_interval
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    pub text_font: String,
    pub text_size: u32,
    pub text_size_large: u32,
    pub icon_font: String,
    pub icon_size: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            text_font: "PixelOperator.ttf".to_string(),
            text_size: 16,
            text_size_large: 24,
            icon_font: "la-solid-900.ttf".to_string(),
            icon_size: 14,
        }
    }
}

impl FontConfig {
    /// Relative names resolve inside the font directory; absolute paths pass through.
    pub fn resolve(font_dir: &Path, name: &str) -> PathBuf {
        font_dir.join(name)
    }

    /// Horizontal space reserved for one icon on a status line.
    pub fn icon_advance(&self) -> i32 {
        self.icon_size as i32 + 2
    }

    /// Horizontal space reserved for the large icon on the offline screen.
    pub fn icon_advance_large(&self) -> i32 {
        self.text_size_large as i32 + 2
    }
}

impl Section for FontConfig {
    const KEY: &'static str = "fonts";

    fn validate(&self) -> Result<()> {
        if self.text_size == 0 || self.text_size_large == 0 || self.icon_size == 0 {
            return Err(Error::InvalidArgs("font sizes must be greater than zero".into()));
        }
        if self.text_font.trim().is_empty() {
            return Err(Error::InvalidArgs("text_font must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub load_warn: f64,
    pub temp_warn: f64,
    pub mem_warn: f64,
    pub disk_warn: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            load_warn: 2.0,
            temp_warn: 70.0,
            mem_warn: 80.0,
            disk_warn: 80.0,
        }
    }
}

impl Section for Thresholds {
    const KEY: &'static str = "thresholds";
}

/// Semantic icon key -> glyph string in the icon font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconMap(pub BTreeMap<String, String>);

impl Default for IconMap {
    fn default() -> Self {
        let pairs = [
            ("hostname", "\u{f108}"),
            ("wifi", "\u{f1eb}"),
            ("lan", "\u{f6ff}"),
            ("offline", "\u{f011}"),
            ("load_normal", "\u{f0e7}"),
            ("load_warn", "\u{f06d}"),
            ("temp_normal", "\u{f2c9}"),
            ("temp_warn", "\u{f06d}"),
            ("mem_normal", "\u{f0ae}"),
            ("mem_warn", "\u{f071}"),
            ("disk_normal", "\u{f0a0}"),
            ("disk_warn", "\u{f071}"),
        ];
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl IconMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl Section for IconMap {
    const KEY: &'static str = "icons";
}

/// Immutable settings, loaded once before the render loop starts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub fonts: FontConfig,
    pub thresholds: Thresholds,
    pub icons: IconMap,
}

impl Config {
    pub fn load(path: &Path) -> Result<LoadedConfig> {
        loader::load_from_path(path)
    }

    /// `$XDG_CONFIG_HOME/pixelstat/config.json` (or the platform equivalent).
    pub fn default_path() -> Result<PathBuf> {
        loader::default_config_path()
    }
}
