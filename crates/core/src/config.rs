//! Flat YAML settings file for a delivery run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EkosError, Result};

/// Settings for one scheduled export, loaded from a YAML file.
///
/// The required keys identify the WebDriver binary, the download directory,
/// the Ekos account, and the spreadsheet credentials. The remaining keys
/// default to the values the weekly delivery run uses.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub driver_path: PathBuf,
    pub profile_dir_path: PathBuf,
    pub ekos_user: String,
    pub ekos_pw: String,
    pub spreadsheet_id: String,
    pub cred_path: PathBuf,
    pub token_path: PathBuf,

    #[serde(default = "default_report_name")]
    pub report_name: String,
    #[serde(default = "default_data_range")]
    pub data_range: String,
    #[serde(default = "default_info_range")]
    pub info_range: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_browser")]
    pub browser: String,
}

fn default_report_name() -> String {
    "Distro - This Week".to_string()
}

fn default_data_range() -> String {
    "data!A:P".to_string()
}

fn default_info_range() -> String {
    "info!B1".to_string()
}

fn default_browser() -> String {
    "firefox".to_string()
}

impl Settings {
    /// Reads settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| EkosError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
            .map_err(|e| EkosError::Config(format!("{}: {e}", path.display())))
    }

    fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yml::Error> {
        serde_yml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
driver_path: /usr/local/bin/geckodriver
profile_dir_path: /srv/deliveries/downloads
ekos_user: ops@example.com
ekos_pw: secret
spreadsheet_id: 1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms
cred_path: /srv/deliveries/credentials.json
token_path: /srv/deliveries/token.json
report_name: Distribution - Friday
data_range: data!A:T
info_range: info!C2
headless: true
browser: firefox
";

    #[test]
    fn parses_full_settings() {
        let settings = Settings::from_yaml(FULL).unwrap();
        assert_eq!(settings.ekos_user, "ops@example.com");
        assert_eq!(settings.report_name, "Distribution - Friday");
        assert_eq!(settings.data_range, "data!A:T");
        assert!(settings.headless);
    }

    #[test]
    fn optional_keys_default_to_delivery_run_values() {
        let minimal = "\
driver_path: /usr/local/bin/geckodriver
profile_dir_path: /srv/deliveries/downloads
ekos_user: ops@example.com
ekos_pw: secret
spreadsheet_id: abc123
cred_path: /srv/deliveries/credentials.json
token_path: /srv/deliveries/token.json
";
        let settings = Settings::from_yaml(minimal).unwrap();
        assert_eq!(settings.report_name, "Distro - This Week");
        assert_eq!(settings.data_range, "data!A:P");
        assert_eq!(settings.info_range, "info!B1");
        assert_eq!(settings.browser, "firefox");
        assert!(!settings.headless);
    }

    #[test]
    fn missing_required_key_is_a_config_error() {
        let broken = "\
driver_path: /usr/local/bin/geckodriver
ekos_user: ops@example.com
";
        assert!(Settings::from_yaml(broken).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/deliveries.yaml")).unwrap_err();
        assert!(matches!(err, EkosError::Config(_)));
    }
}
