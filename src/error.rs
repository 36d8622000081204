// Error taxonomy shared by every operation: roster, spreadsheet, class
// list I/O and messaging failures.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, LeerIdError>;

/// Everything that can make one of the menu operations fail.
#[derive(Debug, Error)]
pub enum LeerIdError {
    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file the operation needs does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Transport failure talking to the roster or messaging service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The roster service answered with a falsy status.
    #[error("roster service refused the request: {0}")]
    RosterRejected(String),

    /// The roster payload did not have the expected shape.
    #[error("invalid roster payload: {0}")]
    InvalidRosterPayload(String),

    /// Errors bubbled up from the spreadsheet reader.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The workbook has no worksheet to read from.
    #[error("spreadsheet {} has no worksheets", .0.display())]
    EmptyWorkbook(PathBuf),

    /// A required header is absent from the first row.
    #[error("spreadsheet is missing column '{0}'")]
    MissingColumn(String),

    /// A student selected for sending is unknown to the roster.
    #[error("record number {0} is not present in the roster")]
    RecordNotInRoster(u64),

    /// A spreadsheet row selected for sending has no record number.
    #[error("row {0} has no record number")]
    MissingRecordNumber(usize),

    /// The messaging service returned a fault or an unexpected status.
    #[error("messaging service fault: {0}")]
    SoapFault(String),

    /// The messaging response could not be read.
    #[error("invalid messaging response: {0}")]
    Messaging(#[from] quick_xml::Error),
}
