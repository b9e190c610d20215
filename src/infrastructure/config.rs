use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config/panelscope";
const ENV_PREFIX: &str = "PANELSCOPE";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardSettings {
    pub path: PathBuf,
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Defaults, then the config file, then `PANELSCOPE__SECTION__KEY` variables.
///
/// Without an explicit `path` the default file is optional.
pub fn load_app_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings = config::Config::builder()
        .set_default("backend.url", "http://localhost:3002")?
        .set_default("backend.timeout_secs", 10)?
        .set_default("dashboard.path", "dashboard-config.json")?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_app_config(Some(&missing)).is_err());

        let config = load_app_config(None).unwrap();
        assert!(config.backend.timeout_secs > 0);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[backend]\nurl = \"http://metrics.internal:9000\"\n\n[dashboard]\npath = \"/tmp/dash.json\""
        )
        .unwrap();

        let config = load_app_config(Some(file.path())).unwrap();
        assert_eq!(config.backend.url, "http://metrics.internal:9000");
        assert_eq!(config.backend.timeout(), Duration::from_secs(10));
        assert_eq!(config.dashboard.path, PathBuf::from("/tmp/dash.json"));
    }
}
