//! User configuration.
//!
//! Read from `<config_dir>/daystrip/config.toml` with `DAYSTRIP_*`
//! environment variables layered on top. Every key is optional.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DAYS_TO_SHOW, DEFAULT_MAX_EVENTS_PER_DAY, DEFAULT_UPDATE_INTERVAL};
use crate::error::{DayStripError, DayStripResult};
use crate::protocol::SourceConfig;
use crate::window::WindowSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayStripConfig {
    pub days_to_show: u32,
    /// Days from today to the first displayed day.
    pub start_day_offset: i64,
    /// IANA zone name; the system zone is used when unset.
    pub timezone: Option<String>,
    /// Refetch cadence, e.g. "10m" or "1h 30m".
    pub update_interval: String,
    pub max_events_per_day: usize,
    /// Calendars mapped to `false` are hidden. Labels match case-insensitively.
    pub calendar_visibility: BTreeMap<String, bool>,
    pub ical_sources: Vec<SourceConfig>,
    /// JSON files holding pre-parsed agenda records.
    pub agenda_files: Vec<PathBuf>,
    /// JSON files holding calendar-module records.
    pub calendar_module_files: Vec<PathBuf>,
}

impl Default for DayStripConfig {
    fn default() -> Self {
        DayStripConfig {
            days_to_show: DEFAULT_DAYS_TO_SHOW,
            start_day_offset: 0,
            timezone: None,
            update_interval: DEFAULT_UPDATE_INTERVAL.to_string(),
            max_events_per_day: DEFAULT_MAX_EVENTS_PER_DAY,
            calendar_visibility: BTreeMap::new(),
            ical_sources: Vec::new(),
            agenda_files: Vec::new(),
            calendar_module_files: Vec::new(),
        }
    }
}

impl DayStripConfig {
    pub fn config_path() -> DayStripResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DayStripError::Config("Could not determine config directory".into()))?
            .join("daystrip");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> DayStripResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> DayStripResult<Self> {
        Self::builder(path)
            .add_source(Environment::with_prefix("DAYSTRIP").try_parsing(true))
            .build()
            .map_err(|e| DayStripError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DayStripError::Config(e.to_string()))
    }

    fn builder(path: &Path) -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from(path.to_path_buf()).required(false))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DayStripResult<()> {
        let contents = format!(
            "\
# daystrip configuration

# Number of days in the strip, and where it starts relative to today:
# days_to_show = {DEFAULT_DAYS_TO_SHOW}
# start_day_offset = 0

# Zone used for day boundaries (defaults to the system zone):
# timezone = \"America/New_York\"

# How often feeds are refetched by `daystrip watch`:
# update_interval = \"{DEFAULT_UPDATE_INTERVAL}\"

# max_events_per_day = {DEFAULT_MAX_EVENTS_PER_DAY}

# Hide calendars by label:
# [calendar_visibility]
# Work = false

# ICS feeds:
# [[ical_sources]]
# url = \"https://example.com/family.ics\"
# name = \"Family\"
# color = \"#ff8800\"

# Pre-parsed event lists (JSON arrays of records):
# agenda_files = [\"~/agenda.json\"]
# calendar_module_files = []
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Calendar labels explicitly switched off.
    pub fn hidden_calendars(&self) -> HashSet<String> {
        self.calendar_visibility
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn update_interval(&self) -> DayStripResult<Duration> {
        humantime::parse_duration(&self.update_interval).map_err(|e| {
            DayStripError::Config(format!(
                "Invalid update_interval '{}': {}",
                self.update_interval, e
            ))
        })
    }

    /// The configured zone, or `fallback` when none is set.
    pub fn timezone(&self, fallback: Tz) -> DayStripResult<Tz> {
        match self.timezone.as_deref() {
            Some(name) => name
                .parse()
                .map_err(|_| DayStripError::InvalidTimezone(name.to_string())),
            None => Ok(fallback),
        }
    }

    pub fn window_settings(&self, timezone: Tz) -> WindowSettings {
        WindowSettings {
            start_day_offset: self.start_day_offset,
            days_to_show: self.days_to_show,
            timezone,
        }
    }

    pub fn agenda_paths(&self) -> Vec<PathBuf> {
        expand_paths(&self.agenda_files)
    }

    pub fn calendar_module_paths(&self) -> Vec<PathBuf> {
        expand_paths(&self.calendar_module_files)
    }
}

fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
        .collect()
}
