//! Configuration management for gitbrowse.
//!
//! User preferences ([`settings::Config`]) and key bindings
//! ([`keymap::Keymap`]) are TOML files in the directory returned by
//! [`config_dir`].

use std::path::{Path, PathBuf};

pub mod keymap;
pub mod settings;

/// File name of the main settings file.
pub const CONFIG_FILE: &str = "config.toml";
/// File name of the key binding overrides.
pub const KEYMAP_FILE: &str = "keymap.toml";
/// File name of the persisted repository list.
pub const REPOSITORIES_FILE: &str = "repositories.toml";

/// Directory holding gitbrowse's configuration files.
///
/// A `config/` directory in the working directory takes precedence (handy
/// during development); otherwise `$HOME/.config/gitbrowse`.
pub fn config_dir() -> PathBuf {
    let local = Path::new("config");
    if local.is_dir() {
        return local.to_path_buf();
    }
    home_config_dir(std::env::var_os("HOME").map(PathBuf::from))
}

fn home_config_dir(home: Option<PathBuf>) -> PathBuf {
    home.unwrap_or_else(|| PathBuf::from("/"))
        .join(".config")
        .join("gitbrowse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_config_dir_under_dot_config() {
        assert_eq!(
            home_config_dir(Some(PathBuf::from("/home/me"))),
            Path::new("/home/me/.config/gitbrowse")
        );
    }

    #[test]
    fn home_config_dir_without_home_uses_root() {
        assert_eq!(home_config_dir(None), Path::new("/.config/gitbrowse"));
    }
}
