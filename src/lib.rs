// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive menu.
//
// Module responsibilities:
// - `config`: settings read from the environment / `.env`.
// - `api`: blocking HTTP client for the school-data-hub roster.
// - `roster`: roster model and payload decoding.
// - `spreadsheet`: the LeerID credential export (Excel).
// - `class_list`: grouping, rendering and parsing of the class list file.
// - `template`, `messaging`: message rendering and the SOAP sendMsg client.
// - `workflow`: the two operations (build class list, send credentials).
// - `ui`: menu loop and prompts. `logging`: rotating log file.
pub mod api;
pub mod class_list;
pub mod config;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod roster;
pub mod spreadsheet;
pub mod template;
pub mod ui;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use error::{LeerIdError, Result};
