use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::model::team::TeamAliasTable;
use crate::model::window::DateRange;
use crate::naver::DEFAULT_BASE_URL;
use crate::reconcile::ReconcileSettings;

pub const CONFIG_PATH_VAR: &str = "KBO_SYNC_CONFIG";

/// `test` computes and logs the report without writing the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Test,
    #[default]
    Production,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Mode::Test),
            "production" => Ok(Mode::Production),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub schedule_path: PathBuf,
    pub sport_id: String,
    /// Any day of the month to sync. Today in `timezone` when unset.
    pub window_anchor: Option<NaiveDate>,
    pub timezone: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub mode: Mode,
    /// Extra or replacement entries for the built-in KBO alias table.
    pub aliases: HashMap<String, String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schedule_path: PathBuf::from("js/schedule.json"),
            sport_id: "kbaseball".to_string(),
            window_anchor: None,
            timezone: "Asia/Seoul".to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            mode: Mode::Production,
            aliases: HashMap::new(),
        }
    }
}

impl SyncConfig {
    /// Defaults, then the JSON file named by the first argument or
    /// `KBO_SYNC_CONFIG`, then individual environment variables.
    pub fn load(args: &[String]) -> Result<Self, ConfigError> {
        let file = args
            .first()
            .cloned()
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok())
            .filter(|p| !p.trim().is_empty());

        let config = match file {
            Some(path) => {
                info!(path = %path, "Reading config file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.with_env_overrides(|name| std::env::var(name).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SCHEDULE_PATH`, `SPORT_ID`, `WINDOW_ANCHOR`, `SYNC_MODE` and
    /// `NAVER_API_BASE_URL` as resolved by `lookup`. Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("SCHEDULE_PATH") {
            self.schedule_path = PathBuf::from(path);
        }
        if let Some(sport) = get("SPORT_ID") {
            self.sport_id = sport;
        }
        if let Some(anchor) = get("WINDOW_ANCHOR") {
            let date = NaiveDate::parse_from_str(anchor.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidDate(anchor.clone()))?;
            self.window_anchor = Some(date);
        }
        if let Some(mode) = get("SYNC_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(url) = get("NAVER_API_BASE_URL") {
            self.api_base_url = url;
        }
        Ok(self)
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// The month window to request, anchored on `window_anchor` or on the
    /// league-local date of `now`.
    pub fn window(&self, now: DateTime<Utc>) -> Result<DateRange, ConfigError> {
        let anchor = match self.window_anchor {
            Some(date) => date,
            None => now.with_timezone(&self.timezone()?).date_naive(),
        };
        Ok(DateRange::month_of(anchor))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn alias_table(&self) -> TeamAliasTable {
        TeamAliasTable::kbo().with_overrides(&self.aliases)
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            sport_id: self.sport_id.clone(),
            aliases: self.alias_table(),
            mode: self.mode,
        }
    }
}
