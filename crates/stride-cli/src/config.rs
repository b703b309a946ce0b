use crate::timezone::detect_system_timezone;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stride_core::settings::{NotificationSettings, SessionSettings};
use stride_core::stats::TeamRoster;

const DEFAULT_CONFIG_FILE: &str = "stride.toml";

/// Everything the CLI can be configured with.
///
/// Sources, later ones winning: built-in defaults, the TOML file, then
/// `STRIDE_*` environment variables (`__` separates nested keys, e.g.
/// `STRIDE_NOTIFICATIONS__ENABLED=false`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StrideConfig {
    pub user_id: String,
    pub team_id: Option<String>,
    pub timezone: String,
    pub database_path: String,
    pub remote_timeout_secs: u64,
    pub history_window_days: u32,
    pub notifications: NotificationSettings,
    /// Member id to display name.
    pub team_roster: BTreeMap<String, String>,
}

impl Default for StrideConfig {
    fn default() -> Self {
        let session = SessionSettings::default();
        Self {
            user_id: session.user_id,
            team_id: session.team_id,
            timezone: detect_system_timezone(),
            database_path: "stride.db".to_string(),
            remote_timeout_secs: session.remote_timeout_secs,
            history_window_days: session.history_window_days,
            notifications: session.notifications,
            team_roster: BTreeMap::new(),
        }
    }
}

impl StrideConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("STRIDE_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::figment(&path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(StrideConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("STRIDE_").ignore(&["log", "config"]).split("__"))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            user_id: self.user_id.clone(),
            team_id: self.team_id.clone(),
            timezone: self.timezone.clone(),
            remote_timeout_secs: self.remote_timeout_secs,
            history_window_days: self.history_window_days,
            notifications: self.notifications.clone(),
        }
    }

    pub fn roster(&self) -> TeamRoster {
        self.team_roster
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }
}
