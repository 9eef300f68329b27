use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Contents of the config file. Every key may instead come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub hio_instance: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub period_hours: Option<u64>,
    pub git_url: Option<String>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

/// Validated settings for the extractor process
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub hio_instance: String,
    pub export_dir: PathBuf,
    pub period: Duration,
    pub git_url: String,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub request_timeout: Duration,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_request_timeout() -> Duration {
    hio_core::session::DEFAULT_REQUEST_TIMEOUT
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'HIO_INSTANCE' not set")]
    MissingInstance,

    #[error("'EXPORT_DIR' not set")]
    MissingExportDir,

    #[error("'EXPORT_DIR' {0} doesn't exist")]
    ExportDirNotFound(PathBuf),

    #[error("'PERIOD' not set or invalid")]
    InvalidPeriod,

    #[error("'GIT_URL' not set")]
    MissingGitUrl,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::MissingInstance => 1,
            ConfigError::MissingExportDir => 2,
            ConfigError::ExportDirNotFound(_) => 3,
            ConfigError::InvalidPeriod => 4,
            ConfigError::MissingGitUrl => 5,
            ConfigError::Read { .. } | ConfigError::Parse { .. } => 6,
        }
    }
}

impl ConfigFile {
    /// Read the config file. The default path may be absent; an explicitly
    /// requested one may not.
    pub fn read(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ExtractorConfig {
    /// Load the config file and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = ConfigFile::read(path)?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge `file` with the variables returned by `env` and validate the result.
    ///
    /// Blank values count as missing.
    pub fn resolve(
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_blank = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        let string = |key: &str, fallback: Option<String>| env(key).or(fallback).and_then(non_blank);

        let hio_instance =
            string("HIO_INSTANCE", file.hio_instance).ok_or(ConfigError::MissingInstance)?;

        let export_dir = string(
            "EXPORT_DIR",
            file.export_dir.map(|dir| dir.to_string_lossy().into_owned()),
        )
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingExportDir)?;
        if !export_dir.exists() {
            return Err(ConfigError::ExportDirNotFound(export_dir));
        }

        let period_secs = match env("PERIOD") {
            Some(value) => value.trim().parse::<u64>().ok(),
            None => file.period_hours,
        }
        .filter(|hours| *hours > 0)
        .and_then(|hours| hours.checked_mul(60 * 60))
        .ok_or(ConfigError::InvalidPeriod)?;

        let git_url = string("GIT_URL", file.git_url).ok_or(ConfigError::MissingGitUrl)?;

        Ok(Self {
            hio_instance,
            export_dir,
            period: Duration::from_secs(period_secs),
            git_url,
            log_level: string("LOG_LEVEL", file.log_level).unwrap_or_else(default_log_level),
            log_dir: string(
                "LOG_DIR",
                file.log_dir.map(|dir| dir.to_string_lossy().into_owned()),
            )
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir),
            request_timeout: file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(default_request_timeout),
        })
    }

    pub fn session_settings(&self) -> hio_core::SessionSettings {
        let mut settings = hio_core::SessionSettings::new(self.hio_instance.as_str());
        settings.request_timeout = self.request_timeout;
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn complete_file(export_dir: &Path) -> ConfigFile {
        ConfigFile {
            hio_instance: Some("https://hio.example.edu".to_string()),
            export_dir: Some(export_dir.to_path_buf()),
            period_hours: Some(6),
            git_url: Some("git@example.edu:timetable.git".to_string()),
            ..ConfigFile::default()
        }
    }

    #[test]
    fn test_file_values_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig::resolve(complete_file(dir.path()), env_of(&[])).unwrap();

        assert_eq!(config.hio_instance, "https://hio.example.edu");
        assert_eq!(config.period, Duration::from_secs(6 * 3600));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.request_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig::resolve(
            complete_file(dir.path()),
            env_of(&[("PERIOD", "12"), ("HIO_INSTANCE", "https://other.example.edu"), ("LOG_LEVEL", "debug")]),
        )
        .unwrap();

        assert_eq!(config.period, Duration::from_secs(12 * 3600));
        assert_eq!(config.hio_instance, "https://other.example.edu");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let code = |file: ConfigFile, env: &[(&str, &str)]| {
            ExtractorConfig::resolve(file, env_of(env)).unwrap_err().exit_code()
        };

        assert_eq!(code(ConfigFile::default(), &[]), 1);
        assert_eq!(code(ConfigFile::default(), &[("HIO_INSTANCE", "  ")]), 1);
        assert_eq!(
            code(ConfigFile::default(), &[("HIO_INSTANCE", "https://hio.example.edu")]),
            2
        );
        assert_eq!(
            code(complete_file(&dir.path().join("missing")), &[]),
            3
        );
        assert_eq!(code(complete_file(dir.path()), &[("PERIOD", "soon")]), 4);
        assert_eq!(code(complete_file(dir.path()), &[("PERIOD", "0")]), 4);
        assert_eq!(
            code(complete_file(dir.path()), &[("PERIOD", "18446744073709551615")]),
            4
        );
        assert_eq!(code(complete_file(dir.path()), &[("GIT_URL", "")]), 5);
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "hio_instance = \"https://hio.example.edu\"\nperiod_hours = 24\nlog_level = \"warn\"\n",
        )
        .unwrap();

        let file = ConfigFile::read(Some(&path)).unwrap();
        assert_eq!(file.period_hours, Some(24));
        assert_eq!(file.log_level.as_deref(), Some("warn"));
        assert_eq!(file.git_url, None);

        std::fs::write(&path, "period_hours = \"daily\"").unwrap();
        assert_eq!(ConfigFile::read(Some(&path)).unwrap_err().exit_code(), 6);
        assert_eq!(
            ConfigFile::read(Some(&dir.path().join("nope.toml")))
                .unwrap_err()
                .exit_code(),
            6
        );
    }
}
