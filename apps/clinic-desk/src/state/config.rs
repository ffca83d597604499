//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CLINIC_*`)
//! 2. Config file (`--config`, or `config.toml` in the platform config dir)
//! 3. Defaults (this file)
//!
//! ```toml
//! # ~/.config/clinic-desk/config.toml
//! clinic_name = "Bright Eyes Optical Clinic"
//! database_path = "/srv/clinic/clinic.db"
//! currency_code = "PHP"
//! currency_symbol = "₱"
//! tax_rate_bps = 1200
//! log = "info,clinic=debug"
//! ```
//!
//! Read-only after startup.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use clinic_core::validation::validate_tax_rate_bps;
use clinic_core::{Money, TaxRate, INVOICE_TAX_RATE_BPS};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Database file name inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "clinic.db";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shown on invoices and the dashboard header
    pub clinic_name: String,

    /// SQLite file
    pub database_path: PathBuf,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Invoice tax rate in basis points, 1200 = 12%
    pub tax_rate_bps: u32,

    /// Log filter when `RUST_LOG` is unset
    pub log: Option<String>,
}

/// Config file contents; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    clinic_name: Option<String>,
    database_path: Option<PathBuf>,
    currency_code: Option<String>,
    currency_symbol: Option<String>,
    tax_rate_bps: Option<u32>,
    log: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config file {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

impl Default for AppConfig {
    /// ## Default Values
    /// - Clinic: "Clinic Desk"
    /// - Database: `clinic.db` in the platform data dir
    /// - Currency: PHP (₱)
    /// - Tax: 12%
    fn default() -> Self {
        AppConfig {
            clinic_name: "Clinic Desk".to_string(),
            database_path: default_database_path(),
            currency_code: "PHP".to_string(),
            currency_symbol: "₱".to_string(),
            tax_rate_bps: INVOICE_TAX_RATE_BPS,
            log: None,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        match path {
            Some(path) => config.apply_file(path)?,
            None => {
                if let Some(path) = default_config_path().filter(|p| p.exists()) {
                    config.apply_file(&path)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(v) = file.clinic_name {
            self.clinic_name = v;
        }
        if let Some(v) = file.database_path {
            self.database_path = v;
        }
        if let Some(v) = file.currency_code {
            self.currency_code = v;
        }
        if let Some(v) = file.currency_symbol {
            self.currency_symbol = v;
        }
        if let Some(v) = file.tax_rate_bps {
            validate_tax_rate_bps(v)
                .map_err(|_| ConfigError::InvalidValue("tax_rate_bps".to_string()))?;
            self.tax_rate_bps = v;
        }
        if file.log.is_some() {
            self.log = file.log;
        }

        tracing::debug!(?path, "Config file applied");
        Ok(())
    }

    /// ## Environment Variables
    /// - `CLINIC_DB_PATH`: database file
    /// - `CLINIC_NAME`: clinic name
    /// - `CLINIC_TAX_RATE`: tax rate as a percentage (e.g. "12")
    /// - `CLINIC_LOG`: log filter
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("CLINIC_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }

        if let Some(name) = lookup("CLINIC_NAME") {
            self.clinic_name = name;
        }

        if let Some(rate) = lookup("CLINIC_TAX_RATE") {
            let pct: f64 = rate
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CLINIC_TAX_RATE".to_string()))?;
            let bps = TaxRate::from_percentage(pct).bps();
            if pct < 0.0 || validate_tax_rate_bps(bps).is_err() {
                return Err(ConfigError::InvalidValue("CLINIC_TAX_RATE".to_string()));
            }
            self.tax_rate_bps = bps;
        }

        if let Some(filter) = lookup("CLINIC_LOG") {
            self.log = Some(filter);
        }

        Ok(())
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Formats an amount in the configured currency.
    ///
    /// ```rust,ignore
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(123456)), "₱1,234.56");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "clinic", "clinic-desk")
}

/// `config.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// `clinic.db` in the platform data directory, or the working directory
/// when no home directory is available.
///
/// - **Linux**: `~/.local/share/clinic-desk/clinic.db`
/// - **macOS**: `~/Library/Application Support/com.clinic.clinic-desk/clinic.db`
/// - **Windows**: `%APPDATA%\clinic\clinic-desk\data\clinic.db`
pub fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.currency_code, "PHP");
        assert_eq!(config.tax_rate().bps(), 1200);
        assert!(config.database_path.ends_with("clinic.db"));
    }

    #[test]
    fn test_format_currency() {
        let config = AppConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(123_456)), "₱1,234.56");
        assert_eq!(config.format_currency(Money::from_cents(-550)), "-₱5.50");
    }

    #[test]
    fn test_file_then_env_priority() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "clinic_name = \"Bright Eyes\"\ndatabase_path = \"/tmp/from-file.db\"\ntax_rate_bps = 500"
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.apply_file(file.path()).unwrap();
        assert_eq!(config.clinic_name, "Bright Eyes");
        assert_eq!(config.tax_rate_bps, 500);

        config
            .apply_env(env(&[("CLINIC_DB_PATH", "/tmp/from-env.db"), ("CLINIC_TAX_RATE", "12")]))
            .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/from-env.db"));
        assert_eq!(config.tax_rate_bps, 1200);
        assert_eq!(config.clinic_name, "Bright Eyes");
    }

    #[test]
    fn test_invalid_env_tax_rate() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("CLINIC_TAX_RATE", "twelve")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = config.apply_env(env(&[("CLINIC_TAX_RATE", "150")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "clinic_nmae = \"typo\"").unwrap();

        let err = AppConfig::default().apply_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
