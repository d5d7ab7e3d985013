use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use tend_core::error::CoreError;
use tend_core::models::{FrequencyChangePolicy, SchedulerConfig};
use tend_core::timezone::parse_timezone;
use tend_core::windows::{validate_days, MAX_CALENDAR_DAYS};

#[derive(Deserialize, Debug)]
pub struct Config {
    /// SQLite file holding every user's items and schedules
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// User whose items the CLI acts on
    #[serde(default = "default_user")]
    pub user: String,
    /// IANA timezone whose local midnight delimits "today"
    #[serde(default = "detect_system_timezone")]
    pub timezone: String,
    /// Hide upcoming tasks due later than this many days from today
    #[serde(default)]
    pub upcoming_horizon_days: Option<i64>,
    /// Days shown by `tend calendar` without `--days`
    #[serde(default = "default_calendar_days")]
    pub calendar_days: i64,
    #[serde(default)]
    pub frequency_change: FrequencyChangePolicy,
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("tend.toml"))
            .merge(Env::prefixed("TEND_"))
            .extract()
    }

    /// The subset of settings the scheduling engine needs, validated
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, CoreError> {
        if let Some(days) = self.upcoming_horizon_days {
            validate_days(days).map_err(|_| {
                CoreError::Validation(format!(
                    "upcoming_horizon_days must be between 0 and {}",
                    MAX_CALENDAR_DAYS
                ))
            })?;
        }

        Ok(SchedulerConfig {
            timezone: parse_timezone(&self.timezone)?,
            upcoming_horizon_days: self.upcoming_horizon_days,
            frequency_change: self.frequency_change,
        })
    }
}

fn default_database_path() -> String {
    "tend.db".to_string()
}

fn default_user() -> String {
    std::env::var("USER")
        .ok()
        .filter(|user| !user.trim().is_empty())
        .unwrap_or_else(|| "default".to_string())
}

fn default_calendar_days() -> i64 {
    30
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && parse_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if parse_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("TEND_USER", "alice");
            jail.set_env("TEND_TIMEZONE", "Europe/Berlin");
            jail.set_env("TEND_FREQUENCY_CHANGE", "rederive_upcoming");

            let config = Config::new()?;
            assert_eq!(config.database_path, "tend.db");
            assert_eq!(config.user, "alice");
            assert_eq!(config.calendar_days, 30);
            assert_eq!(config.upcoming_horizon_days, None);

            let scheduler = config.scheduler_config().unwrap();
            assert_eq!(scheduler.timezone, chrono_tz::Europe::Berlin);
            assert_eq!(scheduler.frequency_change, FrequencyChangePolicy::RederiveUpcoming);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tend.toml",
                r#"
                database_path = "data/care.db"
                timezone = "Asia/Tokyo"
                upcoming_horizon_days = 14
                calendar_days = 7
                "#,
            )?;

            let config = Config::new()?;
            assert_eq!(config.database_path, "data/care.db");
            assert_eq!(config.upcoming_horizon_days, Some(14));
            assert_eq!(config.calendar_days, 7);
            assert_eq!(config.frequency_change, FrequencyChangePolicy::Frozen);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TEND_TIMEZONE", "Mars/Olympus_Mons");
            let config = Config::new()?;
            assert!(matches!(
                config.scheduler_config(),
                Err(CoreError::InvalidTimezone(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_horizon_must_stay_in_range() {
        Jail::expect_with(|jail| {
            jail.set_env("TEND_TIMEZONE", "UTC");

            jail.set_env("TEND_UPCOMING_HORIZON_DAYS", "-1");
            let config = Config::new()?;
            assert!(matches!(config.scheduler_config(), Err(CoreError::Validation(_))));

            jail.set_env("TEND_UPCOMING_HORIZON_DAYS", (MAX_CALENDAR_DAYS + 1).to_string());
            let config = Config::new()?;
            assert!(matches!(config.scheduler_config(), Err(CoreError::Validation(_))));

            jail.set_env("TEND_UPCOMING_HORIZON_DAYS", "90");
            let config = Config::new()?;
            assert_eq!(config.scheduler_config().unwrap().upcoming_horizon_days, Some(90));
            Ok(())
        });
    }
}
