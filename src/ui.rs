// UI layer: the numbered menu and the prompts of each operation. The
// operations themselves live in `workflow`; this module only gathers input,
// shows progress and decides whether the loop goes on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use crate::api::RosterClient;
use crate::config::Settings;
use crate::error::LeerIdError;
use crate::messaging::SoapMessenger;
use crate::roster::{Roster, RosterSource};
use crate::workflow::{self, Delivery, SendObserver};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Menu entries in display order; `Stop` is always last.
pub const MENU: [&str; 4] = [
    "Info",
    "Maak klassenlijst aan",
    "Verzend LeerID gegevens naar de leerlingen",
    "Stop",
];

/// Everything an operation needs, created once at startup.
pub struct Session {
    pub settings: Settings,
    pub roster: RosterClient,
}

/// Main interactive loop. Runs until the operator chooses `Stop` or an
/// operation fails.
pub fn main_menu(session: &Session) -> Result<()> {
    loop {
        for (i, item) in MENU.iter().enumerate() {
            println!("{}> {}", i + 1, item);
        }
        let choice = read_choice(MENU.len())?;
        let ok = match choice {
            1 => show_info(),
            2 => handle_class_list(session)?,
            3 => handle_send(session)?,
            _ => break,
        };
        if !ok {
            break;
        }
    }
    Ok(())
}

fn read_choice(count: usize) -> Result<usize> {
    let input: String = Input::new()
        .with_prompt(format!("Maak uw keuze (1-{count})"))
        .validate_with(move |input: &String| -> std::result::Result<(), String> {
            match input.trim().parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => Ok(()),
                _ => Err(format!("Geef een getal tussen 1 en {count}")),
            }
        })
        .interact_text()?;
    Ok(input.trim().parse()?)
}

fn show_info() -> bool {
    println!(
        "
        Versie: {VERSION}
        Zorg dat je een excel hebt met de LeerID gegevens.
        Vanuit die excel kan je een klassenlijst genereren (zie menu).
        Pas die klassenlijst aan en selecteer de klassen waar je de LeerID gegevens naartoe wilt sturen.
        Zorg dat je een html-bestand hebt (message-body.html) met de inhoud van het bericht dat je wilt sturen.
        Zorg dat je een tekst-bestand hebt (message-subject.txt) met het onderwerp van het bericht dat je wilt sturen.
        Verzend de LeerID gegevens naar de geselecteerde klassen (zie menu).
    "
    );
    true
}

fn handle_class_list(session: &Session) -> Result<bool> {
    println!("-> Maak een klassenlijst aan");
    let spreadsheet = prompt_path("--> LeerID invoer bestand")?;
    let institution: u32 = Input::new()
        .with_prompt("--> Instellingsnummer")
        .interact_text()?;

    let source = SpinnerSource(&session.roster);
    match workflow::build_class_list(
        &source,
        &session.settings,
        &spreadsheet,
        institution,
        Path::new("."),
    ) {
        Ok(path) => {
            println!("-> Klassenlijst is klaar: {}\n", path.display());
            Ok(true)
        }
        Err(e) => Ok(report_failure("Could not create klassenlijst", &e)),
    }
}

fn handle_send(session: &Session) -> Result<bool> {
    println!("-> Start met verzenden");
    let spreadsheet = prompt_path("-> Leerid invoer bestand")?;
    let class_list = prompt_path("-> Klassenlijst")?;

    let settings = &session.settings;
    if let Some(recipient) = &settings.dry_run_recipient {
        println!("-> TEST: alle berichten gaan naar {recipient}");
    }
    let messenger = match SoapMessenger::new(
        &settings.messaging_url,
        settings.messaging_api_key.as_str(),
        settings.sender_id.as_str(),
    ) {
        Ok(m) => m,
        Err(e) => return Ok(report_failure("Could not send credentials", &e)),
    };

    let source = SpinnerSource(&session.roster);
    let mut progress = SendProgress::default();
    let result = workflow::send_credentials(
        &source,
        &messenger,
        settings,
        &spreadsheet,
        &class_list,
        &mut progress,
    );
    progress.finish();
    match result {
        Ok(report) => {
            println!(
                "-> LeerID gegevens zijn verzonden ({} berichten)",
                report.deliveries.len()
            );
            Ok(true)
        }
        Err(e) => Ok(report_failure("Could not send credentials", &e)),
    }
}

fn prompt_path(prompt: &str) -> Result<PathBuf> {
    let path: String = Input::new().with_prompt(prompt).interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

fn report_failure(context: &str, e: &LeerIdError) -> bool {
    println!("{e}");
    error!("{context}, {e}");
    false
}

/// Shows a spinner while the roster is being fetched.
struct SpinnerSource<'a>(&'a RosterClient);

impl RosterSource for SpinnerSource<'_> {
    fn fetch_roster(&self) -> crate::error::Result<Roster> {
        println!("-> Lees gegevens van school-data-hub");
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("SDH...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        let result = self.0.fetch_roster();
        spinner.finish_and_clear();
        match &result {
            Ok(_) => println!("--> SDH: gegevens zijn ok"),
            Err(e) => println!("--> SDH: foutmelding: {e}"),
        }
        result
    }
}

/// Progress bar over the messages of one send run.
#[derive(Default)]
struct SendProgress {
    bar: Option<ProgressBar>,
}

impl SendProgress {
    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl SendObserver for SendProgress {
    fn eligible(&mut self, count: usize) {
        let bar = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len}") {
            bar.set_style(style);
        }
        self.bar = Some(bar);
    }

    fn sent(&mut self, delivery: &Delivery) {
        let line = format!(
            "--> {} {} krijgt login {}, verzonden naar {} (antwoord: {})",
            delivery.last_name,
            delivery.first_name,
            delivery.username,
            delivery.recipient,
            delivery.ack
        );
        match &self.bar {
            Some(bar) => {
                bar.println(line);
                bar.inc(1);
            }
            None => println!("{line}"),
        }
    }
}
