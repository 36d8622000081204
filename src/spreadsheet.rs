// Reader for the LeerID credential export: the first worksheet of an
// Excel workbook, one student per row below a header row.

use std::path::Path;

use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::config::ColumnNames;
use crate::error::{LeerIdError, Result};

/// One student line of the credential export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    /// 1-based spreadsheet row, header included.
    pub row: usize,
    pub record_number: Option<u64>,
    pub group: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
}

struct ColumnIndex {
    record_number: usize,
    group: usize,
    first_name: usize,
    last_name: usize,
    username: usize,
    password: usize,
}

/// Reads the first worksheet of the workbook at `path`. The header row is
/// matched against `columns`; every required header must be present.
/// A record-number cell that is not an integer yields `record_number: None`.
pub fn read_credentials(path: &Path, columns: &ColumnNames) -> Result<Vec<CredentialRow>> {
    if !path.exists() {
        return Err(LeerIdError::MissingFile(path.to_path_buf()));
    }
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LeerIdError::EmptyWorkbook(path.to_path_buf()))??;
    rows_from_range(&range, columns)
}

fn rows_from_range(range: &Range<DataType>, columns: &ColumnNames) -> Result<Vec<CredentialRow>> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)).trim().to_string())
            .collect(),
        None => Vec::new(),
    };
    let index = ColumnIndex::resolve(&headers, columns)?;

    let mut credentials = Vec::new();
    for (offset, row) in rows.enumerate() {
        let line = offset + 2;
        if row.iter().all(|cell| matches!(cell, DataType::Empty)) {
            continue;
        }
        let text = |col: usize| cell_to_string(row.get(col)).trim().to_string();

        // Footers and note rows carry no record number; they never match the roster.
        let record_number = text(index.record_number).parse::<u64>().ok();

        credentials.push(CredentialRow {
            row: line,
            record_number,
            group: text(index.group),
            first_name: text(index.first_name),
            last_name: text(index.last_name),
            username: text(index.username),
            password: text(index.password),
        });
    }
    Ok(credentials)
}

impl ColumnIndex {
    fn resolve(headers: &[String], columns: &ColumnNames) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LeerIdError::MissingColumn(name.to_string()))
        };
        Ok(ColumnIndex {
            record_number: find(&columns.record_number)?,
            group: find(&columns.group)?,
            first_name: find(&columns.first_name)?,
            last_name: find(&columns.last_name)?,
            username: find(&columns.username)?,
            password: find(&columns.password)?,
        })
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
