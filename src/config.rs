//! liftlog configuration.
//!
//! The data directory is resolved through a chain:
//!
//! 1. `LIFTLOG_HOME` env var
//! 2. `~/.liftlog`
//!
//! Configuration is read from `config.toml` in that directory. A missing
//! file means defaults; an invalid one is an error naming the path.
//!
//! ```toml
//! [progression]
//! upper-increment = 2.5
//! lower-increment = 5.0
//! deload-factor = 0.9
//! history-days = 90
//!
//! [adaptive]
//! lookback-days = 14
//!
//! [split]
//! rotation = ["push", "pull", "legs", "upper", "lower", "legs"]
//! targets = { push = 1, pull = 1, legs = 2, upper = 1, lower = 1 }
//! ```

use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::model::WorkoutType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory; set LIFTLOG_HOME")]
    NoHome,

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config at {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub progression: ProgressionConfig,
    pub adaptive: AdaptiveConfig,
    pub split: SplitConfig,
}

/// Weight progression rules for plan suggestions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProgressionConfig {
    /// Pounds added to upper-body lifts after a successful session.
    pub upper_increment: f64,

    /// Pounds added to lower-body lifts after a successful session.
    pub lower_increment: f64,

    /// Multiplier applied after two short sessions in a row.
    pub deload_factor: f64,

    /// How far back exercise history is read. 0 means all time.
    pub history_days: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            upper_increment: 2.5,
            lower_increment: 5.0,
            deload_factor: 0.9,
            history_days: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AdaptiveConfig {
    /// Window for ranking bonus exercises by how recently they were trained.
    pub lookback_days: u32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self { lookback_days: 14 }
    }
}

/// Weekly split: the order types come up in, and how many of each per week.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SplitConfig {
    pub rotation: Vec<WorkoutType>,
    #[serde(deserialize_with = "targets_by_name")]
    pub targets: BTreeMap<WorkoutType, u32>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        use WorkoutType::*;
        Self {
            rotation: vec![Push, Pull, Legs, Upper, Lower, Legs],
            targets: BTreeMap::from([(Push, 1), (Pull, 1), (Legs, 2), (Upper, 1), (Lower, 1)]),
        }
    }
}

/// Table keys arrive as strings; map them onto workout types.
fn targets_by_name<'de, D>(deserializer: D) -> Result<BTreeMap<WorkoutType, u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, u32>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(k, v)| Ok((k.parse().map_err(serde::de::Error::custom)?, v)))
        .collect()
}

impl Config {
    /// The data directory: `$LIFTLOG_HOME`, else `~/.liftlog`.
    pub fn home() -> Result<PathBuf, ConfigError> {
        if let Ok(dir) = env::var("LIFTLOG_HOME")
            && !dir.is_empty()
        {
            return Ok(PathBuf::from(dir));
        }
        dirs::home_dir()
            .map(|h| h.join(".liftlog"))
            .ok_or(ConfigError::NoHome)
    }

    /// Loads `config.toml` from `home`, falling back to defaults if absent.
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join("config.toml");
        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config
            .validate()
            .map_err(|message| ConfigError::Invalid { path, message })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let p = &self.progression;
        if !(p.upper_increment > 0.0 && p.lower_increment > 0.0) {
            return Err("progression increments must be positive".into());
        }
        if !(p.deload_factor > 0.0 && p.deload_factor <= 1.0) {
            return Err(format!(
                "deload-factor must be in (0, 1], got {}",
                p.deload_factor
            ));
        }
        if self.split.rotation.is_empty() {
            return Err("split rotation must not be empty".into());
        }
        Ok(())
    }
}
