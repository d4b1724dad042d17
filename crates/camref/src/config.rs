//! Settings persisted across sessions.
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use camref_axxon::Resolution;
use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "camref";
const CONFIG_FILE_NAME: &str = "config.json";

/// A password that is not revealed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn dangerous_reveal(&self) -> &str {
        &self.0
    }

    /// A copy that is safe to print.
    pub fn masked(&self) -> Self {
        match self.0.is_empty() {
            true => Self(String::new()),
            false => Self("***".to_string()),
        }
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub export: ExportConfig,
    pub project: ProjectConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Password,
    pub use_https: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8000,
            username: "root".to_string(),
            password: Password::default(),
            use_https: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub include_archive: bool,
    /// `"{width}x{height}"` or `"Original"`.
    pub resolution: String,
    pub default_archive_hours_ago: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_archive: true,
            resolution: "1920x1080".to_string(),
            default_archive_hours_ago: 24,
        }
    }
}

impl ExportConfig {
    pub fn resolution(&self) -> anyhow::Result<Option<Resolution>> {
        Resolution::parse_optional(&self.resolution)
            .context("Invalid resolution in the configuration")
    }

    pub fn default_archive_time(&self, now: NaiveDateTime) -> NaiveDateTime {
        now - Duration::hours(i64::from(self.default_archive_hours_ago))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub location: String,
    pub technician: String,
    pub company: String,
    pub logo_path: String,
}

impl Config {
    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not infer a configuration directory")?
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Read the configuration, falling back to defaults if the file is missing or unreadable.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{path:?} not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(anyhow!(e)).with_context(|| format!("Failed to read {path:?}")),
        };
        match serde_json::from_str(&text) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Could not parse {path:?}, using defaults: {e}");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create the configuration directory")?;
        }
        let text =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, text).with_context(|| format!("Failed to write {path:?}"))
    }

    /// A copy that is safe to print.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.connection.password = self.connection.password.masked();
        masked
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.connection.port, 8000);
        assert_eq!(config.connection.username, "root");
        assert_eq!(config.export.resolution, "1920x1080");
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"connection": {"host": "10.0.0.2"}, "project": {"name": "Depot"}}"#)
            .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.connection.host, "10.0.0.2");
        assert_eq!(config.connection.port, 8000);
        assert!(config.export.include_archive);
        assert_eq!(config.project.name, "Depot");
    }

    #[test]
    fn saved_file_has_the_persisted_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.connection.password = Password::new("secret".to_string());
        config.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["connection"]["password"], "secret");
        assert_eq!(value["connection"]["use_https"], false);
        assert_eq!(value["export"]["default_archive_hours_ago"], 24);
        assert_eq!(value["project"]["logo_path"], "");
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn password_is_masked() {
        let mut config = Config::default();
        config.connection.password = Password::new("secret".to_string());
        assert_eq!(format!("{:?}", config.connection.password), "***");
        assert_eq!(
            config.masked().connection.password.dangerous_reveal(),
            "***"
        );
    }

    #[test]
    fn default_archive_time_is_hours_before_now() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert_eq!(ExportConfig::default().default_archive_time(now), expected);
    }

    #[test]
    fn original_resolution_means_no_resize() {
        let export = ExportConfig {
            resolution: "Original".to_string(),
            ..ExportConfig::default()
        };
        assert_eq!(export.resolution().unwrap(), None);
    }
}
