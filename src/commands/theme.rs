//! Theme preference command
//!
//! Shows, sets, or toggles the persisted `theme` value.

use crate::config::Config;
use crate::error::{KanavaError, Result};
use crate::store::Theme;
use colored::Colorize;

/// Handle the theme command
///
/// With no value, prints the current theme. `light` and `dark` set it
/// directly; `toggle` flips it.
pub fn handle_theme(config: &Config, value: Option<String>) -> Result<()> {
    let store = super::open_store(config)?;

    let Some(value) = value else {
        let data = store.load()?;
        println!("{}", data.theme);
        return Ok(());
    };

    let current = store.load()?.theme;
    let new_theme = match value.to_lowercase().as_str() {
        "toggle" => current.toggled(),
        other => Theme::parse_str(other).map_err(KanavaError::Config)?,
    };

    store.update(|data| data.theme = new_theme)?;
    println!("{}", format!("Theme set to {}", new_theme).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    fn config_with_store(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.store.path = Some(
            dir.path()
                .join("store.json")
                .to_string_lossy()
                .to_string(),
        );
        config
    }

    #[test]
    fn test_handle_theme_set_and_show() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let config = config_with_store(&dir);

        handle_theme(&config, Some("dark".to_string())).expect("set failed");

        let store = JsonStore::new_with_path(config.store.path.as_ref().unwrap()).unwrap();
        assert_eq!(store.load().unwrap().theme, Theme::Dark);

        // Showing the current theme must not change it.
        handle_theme(&config, None).expect("show failed");
        assert_eq!(store.load().unwrap().theme, Theme::Dark);
    }

    #[test]
    fn test_handle_theme_toggle() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let config = config_with_store(&dir);

        handle_theme(&config, Some("toggle".to_string())).expect("toggle failed");

        let store = JsonStore::new_with_path(config.store.path.as_ref().unwrap()).unwrap();
        assert_eq!(store.load().unwrap().theme, Theme::Dark);
    }

    #[test]
    fn test_handle_theme_rejects_unknown_value() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let config = config_with_store(&dir);
        assert!(handle_theme(&config, Some("sepia".to_string())).is_err());
    }
}
