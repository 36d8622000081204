// Entrypoint for the CLI application.
// - Keeps `main` small: read settings, start logging, build the roster
//   client and hand everything to the menu loop.

use leerid_cli::api::RosterClient;
use leerid_cli::config::Settings;
use leerid_cli::logging;
use leerid_cli::ui::{main_menu, Session, VERSION};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    logging::init(&settings.log_dir)?;
    info!(version = VERSION, dry_run = settings.is_dry_run(), "START leerid");

    let roster = RosterClient::new(settings.roster_url.as_str(), settings.roster_api_key.as_str())?;
    let session = Session { settings, roster };

    // Blocks until the operator stops or an operation fails.
    main_menu(&session)?;
    Ok(())
}
