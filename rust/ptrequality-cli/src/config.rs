//! Locating and merging `ptrequality.toml`.
//!
//! An explicit `--config` path wins. Otherwise the current directory and its
//! ancestors are searched, then `~/.config/ptrequality/ptrequality.toml`.
//! Command-line flags override whatever the file says.

use ptrequality::{Config, ConfigError};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FILE_NAME: &str = "ptrequality.toml";

/// Options given on the command line, applied over the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub check_is: Option<bool>,
}

/// Effective configuration and the file it came from, if any.
pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let (mut config, path) = match explicit {
        Some(p) => (Config::load(p)?, Some(p.to_path_buf())),
        None => match find(std::env::current_dir().ok().as_deref()) {
            Some(p) => (Config::load(&p)?, Some(p)),
            None => (Config::default(), None),
        },
    };
    if let Some(check_is) = overrides.check_is {
        config.check_is = check_is;
    }
    debug!(?config, file = ?path, "effective configuration");
    Ok((config, path))
}

/// First `ptrequality.toml` in `start` or one of its ancestors, then the
/// global one.
fn find(start: Option<&Path>) -> Option<PathBuf> {
    let mut dir = start.map(Path::to_path_buf);
    while let Some(d) = dir {
        let candidate = d.join(FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent().map(Path::to_path_buf);
    }
    let global = dirs::home_dir()?.join(".config").join("ptrequality").join(FILE_NAME);
    global.is_file().then_some(global)
}

/// Template written by `--write-config`.
pub fn default_template() -> &'static str {
    r#"# ptrequality configuration

# Consider Is and Unwrap methods that may intercept errors.Is comparisons.
check-is = true
"#
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_template_parses() {
        let cfg = Config::from_toml_str(default_template()).expect("template must be valid toml");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn explicit_file_and_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "check-is = false\n").unwrap();

        let (cfg, from) = resolve(Some(&path), Overrides::default()).unwrap();
        assert!(!cfg.check_is);
        assert_eq!(from.as_deref(), Some(path.as_path()));

        let (cfg, _) = resolve(Some(&path), Overrides { check_is: Some(true) }).unwrap();
        assert!(cfg.check_is);
    }

    #[test]
    fn search_walks_up_from_nested_directories() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "check-is = false\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find(Some(&nested)), Some(dir.path().join(FILE_NAME)));
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "[broken").unwrap();
        assert!(matches!(resolve(Some(&path), Overrides::default()), Err(ConfigError::Toml(_))));
        let missing = dir.path().join("missing.toml");
        assert!(matches!(resolve(Some(&missing), Overrides::default()), Err(ConfigError::Io { .. })));
    }
}
