//! Settings document for the shop: company identity, the default credit
//! limit, backup behavior and interface preferences. Persisted as pretty
//! JSON next to the database so the shopkeeper can edit it by hand.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// Display identity of the shop, printed on reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default = "default_company_name")]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            phone: String::new(),
        }
    }
}

/// Cosmetic preferences consumed only by the presentation layer. The core
/// never reads these; they are carried so one settings file serves both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceSettings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            font_size: default_font_size(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

/// User settings for the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub company: CompanyInfo,

    /// Limit applied when registering a customer without an explicit one.
    #[serde(default = "default_credit_limit")]
    pub default_credit_limit_cents: Cents,

    /// Where timestamped database copies are written.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Copy the database on process start when set.
    #[serde(default = "default_auto_backup")]
    pub auto_backup: bool,

    #[serde(default)]
    pub interface: InterfaceSettings,
}

fn default_company_name() -> String {
    "My Shop".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_font_size() -> u32 {
    10
}

fn default_window_width() -> u32 {
    1200
}

fn default_window_height() -> u32 {
    700
}

fn default_credit_limit() -> Cents {
    50000 // 500.00
}

fn default_backup_dir() -> String {
    "backups".to_string()
}

fn default_auto_backup() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company: CompanyInfo::default(),
            default_credit_limit_cents: default_credit_limit(),
            backup_dir: default_backup_dir(),
            auto_backup: default_auto_backup(),
            interface: InterfaceSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk. A missing file yields the defaults and
    /// writes them out so the shopkeeper has something to edit; a broken
    /// file is an error rather than a silent fallback.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            let settings: Settings = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
            Ok(settings)
        } else {
            let settings = Settings::default();
            settings.save(path)?;
            Ok(settings)
        }
    }

    /// Save settings to disk as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_credit_limit_cents, 50000);
        assert_eq!(settings.backup_dir, "backups");
        assert!(settings.auto_backup);
        assert_eq!(settings.interface.theme, "light");
    }

    #[test]
    fn test_missing_file_creates_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fiado.json");

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings.default_credit_limit_cents, 50000);
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fiado.json");

        let mut settings = Settings::default();
        settings.default_credit_limit_cents = 30000;
        settings.auto_backup = false;
        settings.save(&path).unwrap();

        let loaded = Settings::load_or_create(&path).unwrap();
        assert_eq!(loaded.default_credit_limit_cents, 30000);
        assert!(!loaded.auto_backup);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fiado.json");
        std::fs::write(&path, r#"{"default_credit_limit_cents": 20000}"#).unwrap();

        let loaded = Settings::load_or_create(&path).unwrap();
        assert_eq!(loaded.default_credit_limit_cents, 20000);
        assert_eq!(loaded.backup_dir, "backups");
        assert!(loaded.auto_backup);
    }
}
