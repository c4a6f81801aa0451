use anyhow::Context;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

fn ensure_dir(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Pick the config directory from `INTELLIGENCE_HOME`, `XDG_CONFIG_HOME` or `HOME`, in that order.
fn resolve_config_dir(var: impl Fn(&str) -> Option<OsString>) -> anyhow::Result<PathBuf> {
    if let Some(base) = var("INTELLIGENCE_HOME").map(PathBuf::from) {
        return Ok(base.join("config"));
    }

    if let Some(xdg) = var("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Ok(xdg.join("intelligence"));
    }

    // On Unix, HOME is standard. (Windows support can be expanded later.)
    let home = var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".config").join("intelligence"))
}

pub fn config_dir() -> anyhow::Result<PathBuf> {
    ensure_dir(&resolve_config_dir(|k| env::var_os(k))?)
}

pub fn settings_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("settings.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(set: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<OsString> + 'a {
        move |k| set.iter().find(|(name, _)| *name == k).map(|(_, v)| OsString::from(v))
    }

    #[test]
    fn test_intelligence_home_wins() {
        let env = [
            ("INTELLIGENCE_HOME", "/opt/intel"),
            ("XDG_CONFIG_HOME", "/xdg"),
            ("HOME", "/home/u"),
        ];
        let dir = resolve_config_dir(vars(&env)).unwrap();
        assert_eq!(dir, PathBuf::from("/opt/intel/config"));
    }

    #[test]
    fn test_xdg_before_home() {
        let env = [("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")];
        let dir = resolve_config_dir(vars(&env)).unwrap();
        assert_eq!(dir, PathBuf::from("/xdg/intelligence"));
    }

    #[test]
    fn test_home_fallback() {
        let env = [("HOME", "/home/u")];
        let dir = resolve_config_dir(vars(&env)).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.config/intelligence"));
    }

    #[test]
    fn test_no_home_is_an_error() {
        assert!(resolve_config_dir(vars(&[])).is_err());
    }
}
