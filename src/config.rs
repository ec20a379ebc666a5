use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use eframe::egui;
use log::{error, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::synth::Waveform;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    #[error("ignoring `{key}`: {reason}")]
    Field { key: String, reason: String },

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to create config directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write config file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't determine the config directory")]
    NoConfigDir,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClockFont {
    #[default]
    Proportional,
    Monospace,
}

impl From<ClockFont> for egui::FontFamily {
    fn from(font: ClockFont) -> Self {
        match font {
            ClockFont::Proportional => Self::Proportional,
            ClockFont::Monospace => Self::Monospace,
        }
    }
}

/// A `#RRGGBB` color
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Self = Self([0xff; 3]);
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| format!("expected a color like #RRGGBB, got {value:?}"))?;
        let mut rgb = [0; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| format!("bad color {value:?}: {e}"))?;
        }
        Ok(Self(rgb))
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl From<Rgb> for egui::Color32 {
    fn from(rgb: Rgb) -> Self {
        let [r, g, b] = rgb.0;
        Self::from_rgb(r, g, b)
    }
}

/// How the overlay looks and where it sits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    pub size: [u32; 2],
    pub font: ClockFont,
    pub text_size: f32,
    pub opacity: f32,
    pub color: Rgb,
    pub position: [i32; 2],
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            size: [250, 100],
            font: ClockFont::Proportional,
            text_size: 36.0,
            opacity: 0.8,
            color: Rgb::WHITE,
            position: [100, 100],
        }
    }
}

impl ClockConfig {
    pub const OPACITY_RANGE: std::ops::RangeInclusive<f32> = 0.1..=1.0;

    /// # Errors
    /// if the window has no area, the text size isn't positive or the opacity is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.contains(&0) {
            return Err(invalid("clock.size", "width and height must be positive"));
        }
        if !(self.text_size.is_finite() && self.text_size > 0.0) {
            return Err(invalid("clock.text_size", "must be positive"));
        }
        if !Self::OPACITY_RANGE.contains(&self.opacity) {
            return Err(invalid("clock.opacity", "must be between 0.1 and 1.0"));
        }
        Ok(())
    }
}

/// When chimes fire and how long they last
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlarmConfig {
    pub enabled: bool,
    #[serde(rename = "interval")]
    pub interval_secs: u32,
    #[serde(rename = "duration")]
    pub duration_secs: f64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 30,
            duration_secs: 3.0,
        }
    }
}

impl AlarmConfig {
    /// bounds offered by the settings window
    pub const INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 5..=3600;
    pub const DURATION_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }

    /// # Errors
    /// if the interval or the duration is outside the range the settings window offers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Self::INTERVAL_RANGE.contains(&self.interval_secs) {
            return Err(invalid(
                "alarm.interval",
                format!(
                    "must be between {} and {} seconds, got {}",
                    Self::INTERVAL_RANGE.start(),
                    Self::INTERVAL_RANGE.end(),
                    self.interval_secs
                ),
            ));
        }
        if !Self::DURATION_RANGE.contains(&self.duration_secs) {
            return Err(invalid(
                "alarm.duration",
                format!(
                    "must be between {} and {} seconds, got {}",
                    Self::DURATION_RANGE.start(),
                    Self::DURATION_RANGE.end(),
                    self.duration_secs
                ),
            ));
        }
        Ok(())
    }
}

/// What a chime sounds like
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SoundConfig {
    pub waveform: Waveform,
    pub frequency_min: f64,
    pub frequency_max: f64,
    /// pick a random waveform from `waveforms` and a random steady frequency for every chime
    pub variety: bool,
    /// the waveforms variety mode picks from
    pub waveforms: Vec<Waveform>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency_min: 400.0,
            frequency_max: 800.0,
            variety: false,
            waveforms: Waveform::ALL.to_vec(),
        }
    }
}

impl SoundConfig {
    pub const MIN_FREQUENCY_RANGE: std::ops::RangeInclusive<f64> = 200.0..=1000.0;
    pub const MAX_FREQUENCY_RANGE: std::ops::RangeInclusive<f64> = 400.0..=2000.0;

    /// # Errors
    /// if either frequency isn't a positive number, the range is inverted or no
    /// waveform is left for variety mode
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waveforms.is_empty() {
            return Err(invalid("sound.waveforms", "pick at least one waveform"));
        }
        for (field, hz) in [
            ("sound.frequency_min", self.frequency_min),
            ("sound.frequency_max", self.frequency_max),
        ] {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(invalid(field, "must be a positive number of hertz"));
            }
        }
        if self.frequency_max < self.frequency_min {
            return Err(invalid(
                "sound.frequency_max",
                format!(
                    "{} Hz is below the minimum of {} Hz",
                    self.frequency_max, self.frequency_min
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub drag_to_move: bool,
    pub clock: ClockConfig,
    pub alarm: AlarmConfig,
    pub sound: SoundConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drag_to_move: true,
            clock: ClockConfig::default(),
            alarm: AlarmConfig::default(),
            sound: SoundConfig::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the config at `path`, never failing.
    ///
    /// A missing file is created with the defaults. Anything in an existing
    /// file that can't be used is replaced by its default and logged.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let (config, problems) = Self::parse(&text);
                for problem in &problems {
                    warn!("{}: {problem}", path.display());
                }
                info!("loaded config from {}", path.display());
                config
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                match config.save(path) {
                    Ok(()) => info!("created default config at {}", path.display()),
                    Err(e) => error!("{e}"),
                }
                config
            }
            Err(source) => {
                let e = ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                };
                warn!("{e}, using defaults");
                Self::default()
            }
        }
    }

    /// Parses config text, keeping every field that is usable and defaulting the rest.
    ///
    /// Returns the config along with one error per field that was dropped.
    #[must_use]
    pub fn parse(text: &str) -> (Self, Vec<ConfigError>) {
        let mut problems = Vec::new();
        let table = match text.parse::<toml::Table>() {
            Ok(table) => table,
            Err(e) => {
                problems.push(ConfigError::Parse(e));
                return (Self::default(), problems);
            }
        };
        let defaults = Self::default();

        let drag_to_move = match table.get("drag_to_move") {
            None => defaults.drag_to_move,
            Some(toml::Value::Boolean(drag)) => *drag,
            Some(other) => {
                problems.push(ConfigError::Field {
                    key: "drag_to_move".to_string(),
                    reason: format!("expected a boolean, found {}", other.type_str()),
                });
                defaults.drag_to_move
            }
        };
        let mut config = Self {
            drag_to_move,
            clock: recover_section("clock", table.get("clock"), defaults.clock, &mut problems),
            alarm: recover_section("alarm", table.get("alarm"), defaults.alarm, &mut problems),
            sound: recover_section("sound", table.get("sound"), defaults.sound, &mut problems),
        };
        config.repair(&mut problems);
        (config, problems)
    }

    /// replace values that parsed but break an invariant with their defaults
    fn repair(&mut self, problems: &mut Vec<ConfigError>) {
        let defaults = Self::default();

        if let Err(e) = self.clock.validate() {
            problems.push(e);
            if self.clock.size.contains(&0) {
                self.clock.size = defaults.clock.size;
            }
            if !(self.clock.text_size.is_finite() && self.clock.text_size > 0.0) {
                self.clock.text_size = defaults.clock.text_size;
            }
            if !ClockConfig::OPACITY_RANGE.contains(&self.clock.opacity) {
                self.clock.opacity = defaults.clock.opacity;
            }
        }

        if let Err(e) = self.alarm.validate() {
            problems.push(e);
            if !AlarmConfig::INTERVAL_RANGE.contains(&self.alarm.interval_secs) {
                self.alarm.interval_secs = defaults.alarm.interval_secs;
            }
            if !AlarmConfig::DURATION_RANGE.contains(&self.alarm.duration_secs) {
                self.alarm.duration_secs = defaults.alarm.duration_secs;
            }
        }

        if self.sound.waveforms.is_empty() {
            problems.push(invalid("sound.waveforms", "no waveform picked, using sine"));
            self.sound.waveforms = vec![Waveform::Sine];
        }
        if let Err(e) = self.sound.validate() {
            problems.push(e);
            self.sound.frequency_min = defaults.sound.frequency_min;
            self.sound.frequency_max = defaults.sound.frequency_max;
        }
    }

    /// # Errors
    /// the first invariant any section breaks
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.validate()?;
        self.alarm.validate()?;
        self.sound.validate()
    }

    /// # Errors
    /// if the config can't be represented as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// # Errors
    /// if the config can't be serialized, or its directory or file can't be written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_toml()?;
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// if the platform has no config directory for the current user
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "chime_clock")
            .ok_or(ConfigError::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }
}

/// Builds a section from the defaults, taking each key from `raw` only if the
/// section still deserializes with it.
fn recover_section<T>(
    name: &str,
    raw: Option<&toml::Value>,
    fallback: T,
    problems: &mut Vec<ConfigError>,
) -> T
where
    T: Serialize + DeserializeOwned,
{
    let Some(raw) = raw else {
        return fallback;
    };
    let Some(raw) = raw.as_table() else {
        problems.push(ConfigError::Field {
            key: name.to_string(),
            reason: format!("expected a table, found {}", raw.type_str()),
        });
        return fallback;
    };
    let mut merged = match toml::Value::try_from(&fallback) {
        Ok(toml::Value::Table(table)) => table,
        Ok(_) => return fallback,
        Err(e) => {
            problems.push(ConfigError::Serialize(e));
            return fallback;
        }
    };

    for (key, value) in raw {
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value.clone());
        match toml::Value::Table(candidate.clone()).try_into::<T>() {
            Ok(_) => merged = candidate,
            Err(e) => problems.push(ConfigError::Field {
                key: format!("{name}.{key}"),
                reason: e.message().to_string(),
            }),
        }
    }
    toml::Value::Table(merged).try_into().unwrap_or(fallback)
}
