// Settings are read once at startup. Keys come from the process environment,
// optionally seeded from a `.env` file in the working directory.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration key {0}")]
    Missing(&'static str),
}

/// Header names of the credential spreadsheet. The export is localized,
/// so each header can be overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub record_number: String,
    pub group: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            record_number: "Stamnummer".into(),
            group: "Administratieve groep".into(),
            first_name: "Voornaam".into(),
            last_name: "Achternaam".into(),
            username: "LeerID Gebruikersnaam".into(),
            password: "LeerID Wachtwoord".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub roster_url: String,
    pub roster_api_key: String,
    pub messaging_url: String,
    pub messaging_api_key: String,
    pub sender_id: String,
    /// When set, every message goes to this recipient instead of the student.
    pub dry_run_recipient: Option<String>,
    pub body_template: PathBuf,
    pub subject_template: PathBuf,
    pub log_dir: PathBuf,
    pub columns: ColumnNames,
}

impl Settings {
    /// Load `.env` (if present) and build the settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let dry_run = lookup("DRYRUN")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let dry_run_recipient = if dry_run {
            Some(required("SS_MESSAGE_RECEIVER_ID")?)
        } else {
            None
        };

        let defaults = ColumnNames::default();
        let columns = ColumnNames {
            record_number: or_default("LEERID_COLUMN_RECORD_NUMBER", &defaults.record_number),
            group: or_default("LEERID_COLUMN_GROUP", &defaults.group),
            first_name: or_default("LEERID_COLUMN_FIRST_NAME", &defaults.first_name),
            last_name: or_default("LEERID_COLUMN_LAST_NAME", &defaults.last_name),
            username: or_default("LEERID_COLUMN_USERNAME", &defaults.username),
            password: or_default("LEERID_COLUMN_PASSWORD", &defaults.password),
        };

        Ok(Settings {
            roster_url: required("SDH_API_URL")?,
            roster_api_key: required("SDH_API_KEY")?,
            messaging_url: required("SS_API_URL")?,
            messaging_api_key: required("SS_API_KEY")?,
            sender_id: required("SS_MESSAGE_SENDER_ID")?,
            dry_run_recipient,
            body_template: or_default("LEERID_BODY_TEMPLATE", "message-body.html").into(),
            subject_template: or_default("LEERID_SUBJECT_TEMPLATE", "message-subject.txt").into(),
            log_dir: or_default("LEERID_LOG_DIR", "log").into(),
            columns,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run_recipient.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SDH_API_URL", "https://sdh.example/api/students"),
            ("SDH_API_KEY", "sdh-key"),
            ("SS_API_URL", "https://school.example/Webservices/V3?wsdl"),
            ("SS_API_KEY", "ss-key"),
            ("SS_MESSAGE_SENDER_ID", "admin"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let settings = load(&base()).unwrap();
        assert!(!settings.is_dry_run());
        assert_eq!(settings.body_template, PathBuf::from("message-body.html"));
        assert_eq!(settings.subject_template, PathBuf::from("message-subject.txt"));
        assert_eq!(settings.columns, ColumnNames::default());
    }

    #[test]
    fn missing_required_key_is_reported() {
        let mut vars = base();
        vars.remove("SS_API_KEY");
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("SS_API_KEY"));
    }

    #[test]
    fn dry_run_needs_a_receiver() {
        let mut vars = base();
        vars.insert("DRYRUN", "TRUE");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("SS_MESSAGE_RECEIVER_ID")
        );

        vars.insert("SS_MESSAGE_RECEIVER_ID", "tester");
        let settings = load(&vars).unwrap();
        assert_eq!(settings.dry_run_recipient.as_deref(), Some("tester"));
    }

    #[test]
    fn column_headers_can_be_overridden() {
        let mut vars = base();
        vars.insert("LEERID_COLUMN_GROUP", "Group");
        let settings = load(&vars).unwrap();
        assert_eq!(settings.columns.group, "Group");
        assert_eq!(settings.columns.record_number, "Stamnummer");
    }
}
