use crate::error::{EtlError, Result};
use crate::extract::FilePattern;
use crate::load::NullPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SONG_DATA: &str = "data/song_data";
pub const DEFAULT_LOG_DATA: &str = "data/log_data";
pub const DEFAULT_DATABASE: &str = "sparkifydb.sqlite";

/// Settings for one ETL run
#[derive(Debug, Clone)]
pub struct EtlConfig {
    /// Root of the song-metadata tree
    pub song_data: PathBuf,
    /// Root of the user-activity log tree
    pub log_data: PathBuf,
    /// Destination SQLite database file
    pub database: PathBuf,
    pub file_pattern: FilePattern,
    pub null_policy: NullPolicy,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            song_data: PathBuf::from(DEFAULT_SONG_DATA),
            log_data: PathBuf::from(DEFAULT_LOG_DATA),
            database: PathBuf::from(DEFAULT_DATABASE),
            file_pattern: FilePattern::default(),
            null_policy: NullPolicy::default(),
        }
    }
}

impl EtlConfig {
    /// Layer an optional TOML file over settings coming from the command
    /// line. Values present in the file win.
    pub fn resolve(cli: EtlConfig, file: Option<FileConfig>) -> Result<Self> {
        let Some(file) = file else {
            return Ok(cli);
        };

        let file_pattern = match file.file_pattern {
            Some(pattern) => FilePattern::new(&pattern)?,
            None => cli.file_pattern,
        };

        Ok(EtlConfig {
            song_data: file.song_data.unwrap_or(cli.song_data),
            log_data: file.log_data.unwrap_or(cli.log_data),
            database: file.database.unwrap_or(cli.database),
            file_pattern,
            null_policy: file.null_policy.unwrap_or(cli.null_policy),
        })
    }
}

/// Shape of the optional TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub song_data: Option<PathBuf>,
    pub log_data: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub file_pattern: Option<String>,
    pub null_policy: Option<NullPolicy>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| EtlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content)
            .map_err(|e| EtlError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EtlError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_values_override_cli() {
        let file = FileConfig::parse(
            r#"
            database = "/tmp/other.sqlite"
            null_policy = "sentinel"
            file_pattern = "\\.ndjson$"
            "#,
        )
        .unwrap();

        let config = EtlConfig::resolve(EtlConfig::default(), Some(file)).unwrap();

        assert_eq!(config.database, PathBuf::from("/tmp/other.sqlite"));
        assert_eq!(config.null_policy, NullPolicy::Sentinel);
        assert_eq!(config.file_pattern.as_str(), r"\.ndjson$");
        assert_eq!(config.song_data, PathBuf::from(DEFAULT_SONG_DATA));
    }

    #[test]
    fn test_no_file_keeps_cli() {
        let cli = EtlConfig {
            log_data: PathBuf::from("logs"),
            ..Default::default()
        };
        let config = EtlConfig::resolve(cli, None).unwrap();
        assert_eq!(config.log_data, PathBuf::from("logs"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = FileConfig::parse("dbname = \"sparkifydb\"").unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[test]
    fn test_bad_pattern_in_file() {
        let file = FileConfig::parse("file_pattern = \"(\"").unwrap();
        let err = EtlConfig::resolve(EtlConfig::default(), Some(file)).unwrap_err();
        assert!(matches!(err, EtlError::Pattern(_)));
    }
}
