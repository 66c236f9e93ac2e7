use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{ConfigError, Result},
    schema::BridgeConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["tgcord.toml", "tgcord.json"];

/// Load config from the given path (TOML or JSON by extension).
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./tgcord.{toml,json}` (project-local)
/// 2. `~/.config/tgcord/tgcord.{toml,json}` (user-global)
///
/// Returns `BridgeConfig::default()` if no config file is found.
#[must_use]
pub fn discover_and_load() -> BridgeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BridgeConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/tgcord/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "tgcord") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn parse_config(raw: &str, path: &Path) -> Result<BridgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|source| ConfigError::Toml {
            path: path.to_owned(),
            source,
        }),
        "json" => serde_json::from_str(raw).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat {
            extension: ext.to_owned(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml() {
        let cfg = parse_config("[telegram]\nchat_id = -7\n", Path::new("tgcord.toml")).unwrap();
        assert_eq!(cfg.telegram.chat_id, -7);
    }

    #[test]
    fn parses_json() {
        let cfg = parse_config(r#"{"telegram": {"chat_id": -7}}"#, Path::new("tgcord.json")).unwrap();
        assert_eq!(cfg.telegram.chat_id, -7);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = parse_config("", Path::new("tgcord.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { extension } if extension == "ini"));
    }
}
