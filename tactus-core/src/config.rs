use std::path::{Path, PathBuf};

use serde::Deserialize;

use tactus_engine::DEFAULT_VELOCITY;
use tactus_types::{
    ArpDirection, ArpeggioConfig, ChordShape, ControlSnapshot, Subdivision, MAX_NOTE,
};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

const DEFAULT_TELEMETRY_WINDOW: u32 = 512;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    chord: Option<String>,
    range: Option<u8>,
    subdivision: Option<String>,
    gate: Option<f32>,
    cycle: Option<u8>,
    skip: Option<f32>,
    direction: Option<String>,
    bpm: Option<f32>,
    time_signature: Option<[u8; 2]>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    seed: Option<u64>,
    velocity: Option<u8>,
    telemetry_window: Option<u32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Parse(e) => write!(f, "TOML error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        let base = embedded();
        Config {
            defaults: base.defaults,
            runtime: base.runtime,
        }
    }
}

impl Config {
    /// Embedded defaults overlaid with the user's config file, if any.
    /// A broken user file is logged and skipped.
    pub fn load() -> Self {
        let Some(path) = user_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Parse(e)) => {
                log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
            Err(ConfigError::Io(e)) => {
                log::warn!(target: "config", "could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Embedded defaults overlaid with the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Embedded defaults overlaid with `contents`.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let user: ConfigFile = toml::from_str(contents)?;
        let mut base = embedded();
        merge_defaults(&mut base.defaults, user.defaults);
        merge_runtime(&mut base.runtime, user.runtime);
        log::debug!(target: "config", "configuration loaded");
        Ok(Config {
            defaults: base.defaults,
            runtime: base.runtime,
        })
    }

    /// Initial arpeggio settings. Unknown names fall back to the built-in
    /// defaults, except the chord: an unknown chord means no chord at all.
    pub fn arpeggio(&self) -> ArpeggioConfig {
        let fallback = ArpeggioConfig::default();
        let controls = ControlSnapshot {
            chord: match self.defaults.chord.as_deref() {
                Some(name) => parse_chord(name).map_or(-1.0, |c| c.index() as f32),
                None => fallback.chord.map_or(-1.0, |c| c.index() as f32),
            },
            range: self.defaults.range.unwrap_or(fallback.range) as f32,
            subdivision: self
                .defaults
                .subdivision
                .as_deref()
                .and_then(parse_subdivision)
                .unwrap_or(fallback.subdivision)
                .index() as f32,
            gate: self.defaults.gate.unwrap_or(fallback.gate),
            cycle: self.defaults.cycle.unwrap_or(fallback.cycle) as f32,
            skip: self.defaults.skip.unwrap_or(fallback.skip),
            direction: self
                .defaults
                .direction
                .as_deref()
                .and_then(parse_direction)
                .unwrap_or(fallback.direction)
                .index() as f32,
        };
        // Clamp through the same path the host's values take.
        ArpeggioConfig::from_controls(&controls, &fallback)
    }

    /// Control values to publish before the host sends any.
    pub fn controls(&self) -> ControlSnapshot {
        ControlSnapshot::from(&self.arpeggio())
    }

    pub fn bpm(&self) -> f32 {
        self.defaults
            .bpm
            .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
            .unwrap_or(120.0)
    }

    /// (beats per bar, beat unit); zero entries fall back to 4/4.
    pub fn time_signature(&self) -> (u32, u32) {
        match self.defaults.time_signature {
            Some([beats, unit]) if beats > 0 && unit > 0 => (beats as u32, unit as u32),
            _ => (4, 4),
        }
    }

    /// Fixed random seed, if configured.
    pub fn seed(&self) -> Option<u64> {
        self.runtime.seed
    }

    /// Velocity of generated note-ons (clamped to 1..=127).
    pub fn velocity(&self) -> u8 {
        self.runtime
            .velocity
            .unwrap_or(DEFAULT_VELOCITY)
            .clamp(1, MAX_NOTE)
    }

    /// Blocks between telemetry summaries (at least 1).
    pub fn telemetry_window(&self) -> u32 {
        self.runtime
            .telemetry_window
            .unwrap_or(DEFAULT_TELEMETRY_WINDOW)
            .max(1)
    }
}

fn embedded() -> ConfigFile {
    toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
        log::error!(target: "config", "embedded config.toml is invalid: {}", e);
        ConfigFile::default()
    })
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tactus").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.chord.is_some() {
        base.chord = user.chord;
    }
    if user.range.is_some() {
        base.range = user.range;
    }
    if user.subdivision.is_some() {
        base.subdivision = user.subdivision;
    }
    if user.gate.is_some() {
        base.gate = user.gate;
    }
    if user.cycle.is_some() {
        base.cycle = user.cycle;
    }
    if user.skip.is_some() {
        base.skip = user.skip;
    }
    if user.direction.is_some() {
        base.direction = user.direction;
    }
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.time_signature.is_some() {
        base.time_signature = user.time_signature;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.seed.is_some() {
        base.seed = user.seed;
    }
    if user.velocity.is_some() {
        base.velocity = user.velocity;
    }
    if user.telemetry_window.is_some() {
        base.telemetry_window = user.telemetry_window;
    }
}

fn parse_chord(s: &str) -> Option<ChordShape> {
    match s.to_lowercase().as_str() {
        "octave" => Some(ChordShape::Octave),
        "major" => Some(ChordShape::Major),
        "minor" => Some(ChordShape::Minor),
        _ => None,
    }
}

fn parse_subdivision(s: &str) -> Option<Subdivision> {
    match s {
        "1/1" | "1" => Some(Subdivision::Whole),
        "1/2" => Some(Subdivision::Half),
        "1/4" => Some(Subdivision::Quarter),
        "1/8" => Some(Subdivision::Eighth),
        "1/16" => Some(Subdivision::Sixteenth),
        "1/32" => Some(Subdivision::ThirtySecond),
        _ => None,
    }
}

fn parse_direction(s: &str) -> Option<ArpDirection> {
    match s.to_lowercase().as_str() {
        "up" => Some(ArpDirection::Up),
        "down" => Some(ArpDirection::Down),
        "up-down" | "updown" | "up/down" => Some(ArpDirection::UpDown),
        _ => None,
    }
}
