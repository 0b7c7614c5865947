use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the sweeper does to the tab it selects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Discard the tab: it stays in the strip but its content is unloaded.
    #[default]
    Suspend,
    /// Remove the tab entirely.
    Close,
}

impl ActionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionMode::Suspend => "suspend",
            ActionMode::Close => "close",
        }
    }
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "suspend" => Ok(ActionMode::Suspend),
            "close" => Ok(ActionMode::Close),
            other => Err(SettingsError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Tab limit must be a positive integer.")]
    TabLimit,
    #[error("Inactivity timer must be a positive integer.")]
    InactivityTimer,
    #[error("unknown action type `{0}` (expected suspend or close)")]
    UnknownAction(String),
}

/// Configuration consumed by a sweep. Loaded once per sweep and passed by value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub tab_limit: u32,
    pub inactivity_minutes: u32,
    pub whitelist: Vec<String>,
    pub enabled: bool,
    pub action: ActionMode,
}

impl Settings {
    pub const DEFAULT_TAB_LIMIT: u32 = 15;
    pub const DEFAULT_INACTIVITY_MINUTES: u32 = 60;

    /// Inactivity threshold in milliseconds.
    pub fn inactivity_ms(&self) -> i64 {
        i64::from(self.inactivity_minutes) * 60 * 1000
    }

    /// True when `host` contains any whitelist entry as a substring.
    pub fn is_whitelisted(&self, host: &str) -> bool {
        self.whitelist
            .iter()
            .any(|domain| !domain.is_empty() && host.contains(domain.as_str()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tab_limit: Self::DEFAULT_TAB_LIMIT,
            inactivity_minutes: Self::DEFAULT_INACTIVITY_MINUTES,
            whitelist: default_whitelist(),
            enabled: true,
            action: ActionMode::Suspend,
        }
    }
}

pub fn default_whitelist() -> Vec<String> {
    [
        "youtube.com",
        "docs.google.com",
        "mail.google.com",
        "drive.google.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Split free-form whitelist text on newlines and commas, trimming blanks.
pub fn parse_whitelist(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Unvalidated settings as entered in the viewer.
#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    pub tab_limit: String,
    pub inactivity_minutes: String,
    pub whitelist: String,
    pub enabled: bool,
    pub action: String,
}

impl SettingsForm {
    /// Prefill a form from stored settings (whitelist joined one per line).
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tab_limit: settings.tab_limit.to_string(),
            inactivity_minutes: settings.inactivity_minutes.to_string(),
            whitelist: settings.whitelist.join("\n"),
            enabled: settings.enabled,
            action: settings.action.to_string(),
        }
    }

    pub fn validate(&self) -> Result<Settings, SettingsError> {
        let tab_limit = parse_positive(&self.tab_limit).ok_or(SettingsError::TabLimit)?;
        let inactivity_minutes =
            parse_positive(&self.inactivity_minutes).ok_or(SettingsError::InactivityTimer)?;
        let action = self.action.parse()?;
        Ok(Settings {
            tab_limit,
            inactivity_minutes,
            whitelist: parse_whitelist(&self.whitelist),
            enabled: self.enabled,
            action,
        })
    }
}

fn parse_positive(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(limit: &str, minutes: &str) -> SettingsForm {
        SettingsForm {
            tab_limit: limit.into(),
            inactivity_minutes: minutes.into(),
            whitelist: String::new(),
            enabled: true,
            action: "close".into(),
        }
    }

    #[test]
    fn defaults_match_install_values() {
        let s = Settings::default();
        assert_eq!(s.tab_limit, 15);
        assert_eq!(s.inactivity_minutes, 60);
        assert_eq!(s.whitelist.len(), 4);
        assert!(s.enabled);
        assert_eq!(s.action, ActionMode::Suspend);
        assert_eq!(s.inactivity_ms(), 3_600_000);
    }

    #[test]
    fn whitelist_splits_on_newlines_and_commas() {
        let list = parse_whitelist("youtube.com, github.com\n\n  news.ycombinator.com ,");
        assert_eq!(list, vec!["youtube.com", "github.com", "news.ycombinator.com"]);
        assert!(parse_whitelist(" \n , ").is_empty());
    }

    #[test]
    fn whitelist_match_covers_subdomains() {
        let s = Settings {
            whitelist: vec!["youtube.com".into()],
            ..Settings::default()
        };
        assert!(s.is_whitelisted("music.youtube.com"));
        assert!(s.is_whitelisted("www.youtube.com"));
        assert!(!s.is_whitelisted("vimeo.com"));
    }

    #[test]
    fn empty_whitelist_entry_matches_nothing() {
        let s = Settings {
            whitelist: vec![String::new()],
            ..Settings::default()
        };
        assert!(!s.is_whitelisted("example.com"));
    }

    #[test]
    fn validate_accepts_positive_integers() {
        let mut f = form(" 20 ", "5");
        f.whitelist = "a.com\nb.com".into();
        let s = f.validate().unwrap();
        assert_eq!(s.tab_limit, 20);
        assert_eq!(s.inactivity_minutes, 5);
        assert_eq!(s.whitelist, vec!["a.com", "b.com"]);
        assert_eq!(s.action, ActionMode::Close);
    }

    #[test]
    fn validate_rejects_zero_negative_and_garbage() {
        assert_eq!(form("0", "5").validate(), Err(SettingsError::TabLimit));
        assert_eq!(form("-3", "5").validate(), Err(SettingsError::TabLimit));
        assert_eq!(form("ten", "5").validate(), Err(SettingsError::TabLimit));
        assert_eq!(
            form("10", "0").validate(),
            Err(SettingsError::InactivityTimer)
        );
        assert_eq!(
            form("10", "").validate(),
            Err(SettingsError::InactivityTimer)
        );
    }

    #[test]
    fn validate_rejects_unknown_action() {
        let mut f = form("10", "5");
        f.action = "hibernate".into();
        assert_eq!(
            f.validate(),
            Err(SettingsError::UnknownAction("hibernate".into()))
        );
    }

    #[test]
    fn form_roundtrips_stored_settings() {
        let s = Settings::default();
        let back = SettingsForm::from_settings(&s).validate().unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn action_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ActionMode::Close).unwrap(),
            serde_json::json!("close")
        );
        assert_eq!("suspend".parse::<ActionMode>().unwrap(), ActionMode::Suspend);
    }
}
