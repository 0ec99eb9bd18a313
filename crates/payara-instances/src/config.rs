use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub storage: Option<StorageCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageCfg {
    /// Directory holding `servers.json` (absolute, or `~/`-relative).
    pub dir: Option<String>,
}

impl UserConfig {
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage
            .as_ref()
            .and_then(|s| s.dir.as_deref())
            .map(expand_home)
    }
}

pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: UserConfig =
        toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_user_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn parses_logging_and_storage_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[logging]
level = "debug"
json = true

[storage]
dir = "/srv/payara/state"
"#,
        )
        .unwrap();

        let cfg = load_user_config(dir.path()).unwrap().unwrap();
        let logging = cfg.logging.as_ref().unwrap();
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.json, Some(true));
        assert_eq!(logging.to_file, None);
        assert_eq!(cfg.storage_dir(), Some(PathBuf::from("/srv/payara/state")));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[logging\nlevel=").unwrap();
        assert!(load_user_config(dir.path()).is_err());
    }

    #[test]
    fn non_home_paths_are_unchanged() {
        assert_eq!(expand_home("/abs/dir"), PathBuf::from("/abs/dir"));
        assert_eq!(expand_home("rel/dir"), PathBuf::from("rel/dir"));
    }
}
