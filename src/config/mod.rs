// src/config/mod.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "REMINDER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/reminder.toml";

fn default_membership_url() -> String {
    "https://dragoncon.org/about/membership-info/".to_string()
}
fn default_section_heading() -> String {
    "Dragon Con 5-Day Membership Rates".to_string()
}
fn default_time_zone() -> String {
    "America/New_York".to_string()
}
fn default_first_run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap_or_default()
}
fn default_interval_days() -> u32 {
    90
}
fn default_run_hour() -> u32 {
    9
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; ReminderBot/1.0)".to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

/// Service settings. Credentials are not part of this file; the notifier reads them from env.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReminderConfig {
    #[serde(default = "default_membership_url")]
    pub membership_url: String,
    #[serde(default = "default_section_heading")]
    pub section_heading: String,
    /// IANA zone name; "today" is evaluated here.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_first_run_date")]
    pub first_run_date: NaiveDate,
    #[serde(default = "default_interval_days")]
    pub interval_days: u32,
    /// Local hour (0-23) at which a scheduled check fires.
    #[serde(default = "default_run_hour")]
    pub run_hour: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            membership_url: default_membership_url(),
            section_heading: default_section_heading(),
            time_zone: default_time_zone(),
            first_run_date: default_first_run_date(),
            interval_days: default_interval_days(),
            run_hour: default_run_hour(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl ReminderConfig {
    /// Load from an explicit path. TOML unless the extension says JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: Self = if ext == "json" {
            serde_json::from_str(&content).context("parsing json config")?
        } else {
            toml::from_str(&content).context("parsing toml config")?
        };
        cfg.validated()
    }

    /// Resolution order:
    /// 1) $REMINDER_CONFIG_PATH (must exist)
    /// 2) config/reminder.toml
    /// 3) built-in defaults
    ///
    /// Env overrides (MEMBERSHIP_URL, SECTION_HEADING, REMINDER_TZ, BIND_ADDR) apply last.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from(&fallback)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides().validated()
    }

    fn with_env_overrides(mut self) -> Self {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(v) = read("MEMBERSHIP_URL") {
            self.membership_url = v;
        }
        if let Some(v) = read("SECTION_HEADING") {
            self.section_heading = v;
        }
        if let Some(v) = read("REMINDER_TZ") {
            self.time_zone = v;
        }
        if let Some(v) = read("BIND_ADDR") {
            self.bind_addr = v;
        }
        self
    }

    fn validated(self) -> Result<Self> {
        self.zone()?;
        if self.interval_days == 0 {
            bail!("interval_days must be at least 1");
        }
        if self.run_hour > 23 {
            bail!("run_hour must be within 0..=23, got {}", self.run_hour);
        }
        if self.section_heading.trim().is_empty() {
            bail!("section_heading must not be empty");
        }
        Ok(self)
    }

    pub fn zone(&self) -> Result<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| anyhow!("unknown time zone {:?}: {e}", self.time_zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn defaults_are_valid() {
        let cfg = ReminderConfig::default().validated().unwrap();
        assert_eq!(cfg.zone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(cfg.interval_days, 90);
        assert_eq!(cfg.first_run_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: ReminderConfig = toml::from_str(
            r#"
interval_days = 30
first_run_date = "2026-01-15"
"#,
        )
        .unwrap();
        assert_eq!(cfg.interval_days, 30);
        assert_eq!(cfg.first_run_date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(cfg.section_heading, "Dragon Con 5-Day Membership Rates");
    }

    #[test]
    fn rejects_bad_values() {
        let bad_zone = ReminderConfig {
            time_zone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(bad_zone.validated().is_err());

        let zero = ReminderConfig {
            interval_days: 0,
            ..Default::default()
        };
        assert!(zero.validated().is_err());

        let blank = ReminderConfig {
            section_heading: "  ".into(),
            ..Default::default()
        };
        assert!(blank.validated().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_then_fallback_then_overrides() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var("REMINDER_TZ");

        // nothing on disk → defaults
        assert_eq!(ReminderConfig::load_default().unwrap(), ReminderConfig::default());

        // fallback file
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join(DEFAULT_CONFIG_PATH), "interval_days = 7\n").unwrap();
        assert_eq!(ReminderConfig::load_default().unwrap().interval_days, 7);

        // env path wins, json accepted
        let p_json = tmp.path().join("reminder.json");
        fs::write(&p_json, r#"{"interval_days": 14}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_json.display().to_string());
        assert_eq!(ReminderConfig::load_default().unwrap().interval_days, 14);

        // env override on top
        env::set_var("REMINDER_TZ", "Europe/Prague");
        assert_eq!(ReminderConfig::load_default().unwrap().time_zone, "Europe/Prague");

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(ReminderConfig::load_default().is_err());

        env::remove_var("REMINDER_TZ");
        env::remove_var(ENV_CONFIG_PATH);
        env::set_current_dir(&old).unwrap();
    }
}
