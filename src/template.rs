// Credential message template: a plain-text subject and an HTML body with
// %%FIRSTNAME%%, %%USERNAME%% and %%PASSWORD%% placeholders.

use std::fs;
use std::path::Path;

use crate::error::{LeerIdError, Result};

pub const FIRST_NAME_TOKEN: &str = "%%FIRSTNAME%%";
pub const USERNAME_TOKEN: &str = "%%USERNAME%%";
pub const PASSWORD_TOKEN: &str = "%%PASSWORD%%";

/// Subject line and HTML body of the credential message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    body: String,
}

impl MessageTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        MessageTemplate {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn load(subject_path: &Path, body_path: &Path) -> Result<Self> {
        Ok(Self::new(read(subject_path)?, read(body_path)?))
    }

    pub fn render_body(&self, first_name: &str, username: &str, password: &str) -> String {
        self.body
            .replace(FIRST_NAME_TOKEN, first_name)
            .replace(USERNAME_TOKEN, username)
            .replace(PASSWORD_TOKEN, password)
    }
}

fn read(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(LeerIdError::MissingFile(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}
