// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

pub const SETTINGS_FILE: &str = "dashboard.toml";

const DEFAULT_SPREADSHEET_ID: &str = "1A105rcZ0ktlaWVGf0Z-ImoUNYwOZJqgOoFgp7Vuagcw";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    Simulated,
    ServiceAccount,
}

impl WriteMode {
    fn parse(raw: &str) -> Option<WriteMode> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simulated" => Some(WriteMode::Simulated),
            "service_account" | "service-account" => Some(WriteMode::ServiceAccount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub spreadsheet_id: String,
    pub api_key: String,
    pub api_base: String,
    pub tabs: Vec<String>,
    pub default_tab: String,
    pub write_mode: WriteMode,
    pub credentials_path: PathBuf,
    pub local_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let tabs: Vec<String> = (17..=30).map(|day| format!("{day:02}/05/68")).collect();
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.into(),
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.into(),
            default_tab: tabs[0].clone(),
            tabs,
            write_mode: WriteMode::Simulated,
            credentials_path: PathBuf::from("credentials.json"),
            local_dir: None,
        }
    }
}

/// Every key is optional; missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    spreadsheet_id: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    tabs: Option<Vec<String>>,
    default_tab: Option<String>,
    write_mode: Option<WriteMode>,
    credentials_path: Option<PathBuf>,
    local_dir: Option<PathBuf>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.normalize();
    info!(
        tabs = settings.tabs.len(),
        write_mode = ?settings.write_mode,
        local = settings.local_dir.is_some(),
        "settings loaded"
    );
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return,
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => settings.merge(file_cfg),
        Err(err) => warn!(path = %path.display(), error = %err, "ignoring malformed settings file"),
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DASHBOARD_SPREADSHEET_ID") {
        settings.spreadsheet_id = v;
    }
    if let Some(v) = var("DASHBOARD_API_KEY") {
        settings.api_key = v;
    }
    if let Some(v) = var("DASHBOARD_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = var("DASHBOARD_DEFAULT_TAB") {
        settings.default_tab = v;
    }
    if let Some(v) = var("DASHBOARD_WRITE_MODE") {
        match WriteMode::parse(&v) {
            Some(mode) => settings.write_mode = mode,
            None => warn!(value = %v, "unknown DASHBOARD_WRITE_MODE"),
        }
    }
    if let Some(v) = var("DASHBOARD_CREDENTIALS") {
        settings.credentials_path = PathBuf::from(v);
    }
    if let Some(v) = var("DASHBOARD_LOCAL_DIR") {
        settings.local_dir = if v.trim().is_empty() { None } else { Some(PathBuf::from(v)) };
    }
}

impl Settings {
    fn merge(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.spreadsheet_id {
            self.spreadsheet_id = v;
        }
        if let Some(v) = file_cfg.api_key {
            self.api_key = v;
        }
        if let Some(v) = file_cfg.api_base {
            self.api_base = v;
        }
        if let Some(v) = file_cfg.tabs {
            self.tabs = v;
        }
        if let Some(v) = file_cfg.default_tab {
            self.default_tab = v;
        }
        if let Some(v) = file_cfg.write_mode {
            self.write_mode = v;
        }
        if let Some(v) = file_cfg.credentials_path {
            self.credentials_path = v;
        }
        if file_cfg.local_dir.is_some() {
            self.local_dir = file_cfg.local_dir;
        }
    }

    fn normalize(&mut self) {
        self.tabs.retain(|t| !t.trim().is_empty());
        if self.tabs.is_empty() {
            warn!("no tabs configured, using defaults");
            self.tabs = Settings::default().tabs;
        }
        if !self.tabs.contains(&self.default_tab) {
            self.default_tab = self.tabs[0].clone();
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_file(contents: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("order_dashboard_settings_{suffix}.toml"));
        fs::write(&path, contents).expect("write settings");
        path
    }

    #[test]
    fn defaults_cover_the_may_tabs() {
        let settings = Settings::default();
        assert_eq!(settings.tabs.len(), 14);
        assert_eq!(settings.tabs.first().map(String::as_str), Some("17/05/68"));
        assert_eq!(settings.tabs.last().map(String::as_str), Some("30/05/68"));
        assert_eq!(settings.default_tab, "17/05/68");
        assert_eq!(settings.write_mode, WriteMode::Simulated);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = temp_file(
            r#"
api_key = "file-key"
tabs = ["01/06/68", "02/06/68"]
default_tab = "02/06/68"
write_mode = "service_account"
"#,
        );
        let mut settings = Settings::default();
        apply_file(&mut settings, &path);
        settings.normalize();
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.api_key, "file-key");
        assert_eq!(settings.tabs, vec!["01/06/68", "02/06/68"]);
        assert_eq!(settings.default_tab, "02/06/68");
        assert_eq!(settings.write_mode, WriteMode::ServiceAccount);
        assert_eq!(settings.spreadsheet_id, DEFAULT_SPREADSHEET_ID);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let path = temp_file("tabs = 17");
        let mut settings = Settings::default();
        apply_file(&mut settings, &path);
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn env_overrides_file_and_trims_base() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DASHBOARD_API_KEY", "env-key"),
            ("DASHBOARD_API_BASE", "http://127.0.0.1:9000/"),
            ("DASHBOARD_WRITE_MODE", "service-account"),
            ("DASHBOARD_LOCAL_DIR", "/srv/exports"),
        ]);
        let mut settings = Settings::default();
        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));
        settings.normalize();

        assert_eq!(settings.api_key, "env-key");
        assert_eq!(settings.api_base, "http://127.0.0.1:9000");
        assert_eq!(settings.write_mode, WriteMode::ServiceAccount);
        assert_eq!(settings.local_dir, Some(PathBuf::from("/srv/exports")));
    }

    #[test]
    fn unknown_default_tab_falls_back_to_first() {
        let mut settings = Settings::default();
        settings.default_tab = "31/12/99".into();
        settings.normalize();
        assert_eq!(settings.default_tab, "17/05/68");
    }

    #[test]
    fn unknown_write_mode_keeps_previous() {
        let mut settings = Settings::default();
        apply_env(&mut settings, |key| {
            (key == "DASHBOARD_WRITE_MODE").then(|| "oauth".to_string())
        });
        assert_eq!(settings.write_mode, WriteMode::Simulated);
    }
}
