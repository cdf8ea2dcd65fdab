use crate::error::HistoryError;
use crate::keys::THEME_KEY;
use ctc_store::{write_json, Store};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(HistoryError::UnknownTheme(s.to_string())),
        }
    }
}

/// Reads either the JSON string this crate writes or the bare `dark`/`light` the
/// browser app left behind. Anything else reads as light.
pub fn load_theme<S: Store + ?Sized>(store: &S) -> Theme {
    let Some(raw) = store.get(THEME_KEY) else {
        return Theme::default();
    };
    serde_json::from_str::<Theme>(&raw)
        .or_else(|_| raw.parse())
        .unwrap_or_else(|_| {
            log::debug!("Unrecognized theme {raw:?}; using light");
            Theme::default()
        })
}

pub fn save_theme<S: Store + ?Sized>(store: &mut S, theme: Theme) -> crate::Result<()> {
    write_json(store, THEME_KEY, &theme)?;
    Ok(())
}

pub fn toggle_theme<S: Store + ?Sized>(store: &mut S) -> crate::Result<Theme> {
    let next = load_theme(store).toggled();
    save_theme(store, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctc_store::MemoryStore;

    #[test]
    fn defaults_to_light() {
        let mut store = MemoryStore::new();
        assert_eq!(load_theme(&store), Theme::Light);
        store.set(THEME_KEY, "\"sepia\"").unwrap();
        assert_eq!(load_theme(&store), Theme::Light);
    }

    #[test]
    fn accepts_bare_browser_value() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(load_theme(&store), Theme::Dark);
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(load_theme(&store), Theme::Light);
        assert_eq!(toggle_theme(&mut store).unwrap(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("\"dark\""));
    }

    #[test]
    fn toggle_round_trips_through_store() {
        let mut store = MemoryStore::new();
        assert_eq!(toggle_theme(&mut store).unwrap(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("\"dark\""));
        assert_eq!(toggle_theme(&mut store).unwrap(), Theme::Light);
    }
}
