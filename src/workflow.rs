// The two operations behind the menu. Each one fetches its own roster
// first, so roster data is never older than the operation reading it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, instrument};

use crate::class_list::{self, ClassGroups, ClassList, SENT_TIMESTAMP_FORMAT};
use crate::config::Settings;
use crate::error::{LeerIdError, Result};
use crate::messaging::{MessageSender, OutgoingMessage};
use crate::roster::{Roster, RosterSource};
use crate::spreadsheet::{self, CredentialRow};
use crate::template::MessageTemplate;

/// Called once per message that has been handed to the messaging service.
pub trait SendObserver {
    fn eligible(&mut self, _count: usize) {}
    fn sent(&mut self, _delivery: &Delivery) {}
}

/// No-op observer.
impl SendObserver for () {}

/// What happened to one student during a send run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub last_name: String,
    pub first_name: String,
    pub username: String,
    pub recipient: String,
    pub ack: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReport {
    pub deliveries: Vec<Delivery>,
}

/// Generates a new class list for `institution` in `out_dir` and returns
/// its path. Nothing is written unless the whole list could be computed.
#[instrument(level = "info", skip_all, fields(input = %spreadsheet.display(), institution = institution))]
pub fn build_class_list(
    roster_source: &dyn RosterSource,
    settings: &Settings,
    spreadsheet: &Path,
    institution: u32,
    out_dir: &Path,
) -> Result<PathBuf> {
    let roster = roster_source.fetch_roster()?;
    let rows = spreadsheet::read_credentials(spreadsheet, &settings.columns)?;
    let groups = ClassGroups::collect(&rows, &roster, institution);

    let path = out_dir.join(class_list::file_name(institution, now()));
    fs::write(&path, groups.render_file())?;
    info!(
        groups = groups.len(),
        output = %path.display(),
        "Klassenlijst is ready, LeerID invoer {}, instellingsnummer {}",
        spreadsheet.display(),
        institution
    );
    Ok(path)
}

/// Sends the credentials of every student whose group is selected in the
/// class list, then marks those groups as sent. The class list is only
/// rewritten when every message went out.
#[instrument(level = "info", skip_all, fields(input = %spreadsheet.display(), list = %class_list_path.display()))]
pub fn send_credentials(
    roster_source: &dyn RosterSource,
    sender: &dyn MessageSender,
    settings: &Settings,
    spreadsheet: &Path,
    class_list_path: &Path,
    observer: &mut dyn SendObserver,
) -> Result<SendReport> {
    let roster = roster_source.fetch_roster()?;
    if !class_list_path.exists() {
        return Err(LeerIdError::MissingFile(class_list_path.to_path_buf()));
    }
    let sent_at = now().format(SENT_TIMESTAMP_FORMAT).to_string();
    let list = ClassList::parse(&fs::read_to_string(class_list_path)?);
    let groups = list.selected_groups();

    let template = MessageTemplate::load(&settings.subject_template, &settings.body_template)?;
    let rows = spreadsheet::read_credentials(spreadsheet, &settings.columns)?;
    let eligible: Vec<&CredentialRow> = rows.iter().filter(|r| groups.contains(&r.group)).collect();
    observer.eligible(eligible.len());

    let mut deliveries = Vec::with_capacity(eligible.len());
    for row in eligible {
        let recipient = recipient_for(row, &roster, settings)?;
        let message = OutgoingMessage {
            recipient: recipient.clone(),
            subject: template.subject.clone(),
            body: template.render_body(&row.first_name, &row.username, &row.password),
        };
        let ack = sender.send_msg(&message)?;
        info!(
            ack = %ack,
            "SendMsg, to {}/{} {}, from {}, username {}, password {}",
            recipient,
            row.last_name,
            row.first_name,
            settings.sender_id,
            row.username,
            row.password
        );
        let delivery = Delivery {
            last_name: row.last_name.clone(),
            first_name: row.first_name.clone(),
            username: row.username.clone(),
            recipient,
            ack,
        };
        observer.sent(&delivery);
        deliveries.push(delivery);
    }
    info!(messages = deliveries.len(), "SendMsg Done");

    fs::write(class_list_path, list.to_sent_text(&sent_at))?;
    Ok(SendReport { deliveries })
}

fn recipient_for(row: &CredentialRow, roster: &Roster, settings: &Settings) -> Result<String> {
    if let Some(recipient) = &settings.dry_run_recipient {
        return Ok(recipient.clone());
    }
    let record = row
        .record_number
        .ok_or(LeerIdError::MissingRecordNumber(row.row))?;
    roster
        .get(record)
        .map(|entry| entry.student_number.to_string())
        .ok_or(LeerIdError::RecordNotInRoster(record))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
