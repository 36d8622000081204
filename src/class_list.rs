// The class list: the text file an operator edits to choose which
// administrative groups receive their credentials.
//
// Every line starting with `#` is ignored. A line without the
// marker that names a group between parentheses is selected. After sending,
// a selected line is rewritten as `##<line> - <timestamp>` so it can never
// be selected again by accident.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::roster::Roster;
use crate::spreadsheet::CredentialRow;

pub const COMMENT_MARKER: char = '#';

/// Timestamp in generated file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
/// Timestamp appended to lines that have been sent.
pub const SENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

const HEADER: &[&str] = &[
    "# is commentaar, deze lijn wordt niet ingelezen.",
    "# Om klassen te selecteren, verwijder de # aan het begin",
    "# Na het verzenden wordt de lijn aangepast, bvb:",
    "##1A (1e lj A) - 2023-04-01",
    "",
    "###### START LIJST ######",
    "",
];

/// Class codes per administrative group, restricted to one institution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassGroups {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl ClassGroups {
    /// Groups the class code of every row that is known to the roster and
    /// belongs to `institution`. Everything else is skipped.
    pub fn collect(rows: &[CredentialRow], roster: &Roster, institution: u32) -> Self {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in rows {
            let Some(entry) = row.record_number.and_then(|nr| roster.get(nr)) else {
                continue;
            };
            if entry.institution_number != institution {
                continue;
            }
            groups
                .entry(row.group.clone())
                .or_default()
                .insert(entry.class_code.clone());
        }
        ClassGroups { groups }
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    /// `1A, 1B (group)` per group, sorted.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .groups
            .iter()
            .map(|(group, codes)| {
                let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
                format!("{} ({})", codes.join(", "), group)
            })
            .collect();
        lines.sort();
        lines
    }

    /// Contents of a freshly generated class list: the instruction header
    /// followed by every group line, commented out.
    pub fn render_file(&self) -> String {
        let mut out = String::new();
        for line in HEADER {
            out.push_str(line);
            out.push('\n');
        }
        for line in self.render_lines() {
            out.push(COMMENT_MARKER);
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

pub fn file_name(institution: u32, now: NaiveDateTime) -> String {
    format!(
        "klassenlijst-{}-{}.txt",
        institution,
        now.format(FILE_TIMESTAMP_FORMAT)
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineState {
    /// Commented out, blank, or without a group. Kept as is.
    Pending,
    /// Chosen by the operator for sending.
    Selected { group: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassListLine {
    pub text: String,
    pub state: LineState,
}

impl ClassListLine {
    pub fn parse(text: &str) -> Self {
        let state = match extract_group(text) {
            Some(group) if !text.trim().starts_with(COMMENT_MARKER) => LineState::Selected {
                group: group.to_string(),
            },
            _ => LineState::Pending,
        };
        ClassListLine {
            text: text.to_string(),
            state,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match &self.state {
            LineState::Selected { group } => Some(group),
            LineState::Pending => None,
        }
    }

    /// Text to write back after a send run.
    pub fn serialize(&self, sent_at: &str) -> String {
        match self.state {
            LineState::Selected { .. } => format!("##{} - {}", self.text, sent_at),
            LineState::Pending => self.text.clone(),
        }
    }
}

/// Text between the first `(` and the last `)`.
fn extract_group(text: &str) -> Option<&str> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    (close > open).then(|| &text[open + 1..close])
}

/// A parsed class list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassList {
    lines: Vec<ClassListLine>,
}

impl ClassList {
    pub fn parse(contents: &str) -> Self {
        ClassList {
            lines: contents.lines().map(ClassListLine::parse).collect(),
        }
    }

    pub fn selected_groups(&self) -> BTreeSet<String> {
        self.lines
            .iter()
            .filter_map(|line| line.group().map(str::to_string))
            .collect()
    }

    /// Contents with every selected line marked as sent at `sent_at`.
    pub fn to_sent_text(&self, sent_at: &str) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.serialize(sent_at));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterEntry;
    use chrono::NaiveDate;

    fn row(record: u64, group: &str) -> CredentialRow {
        CredentialRow {
            row: 2,
            record_number: Some(record),
            group: group.into(),
            first_name: "F".into(),
            last_name: "L".into(),
            username: "u".into(),
            password: "p".into(),
        }
    }

    fn entry(institution: u32, class_code: &str) -> RosterEntry {
        RosterEntry {
            institution_number: institution,
            student_number: 1,
            class_code: class_code.into(),
        }
    }

    #[test]
    fn codes_are_deduplicated_and_sorted_per_group() {
        let roster = Roster::from_entries([
            (1, entry(100, "1B")),
            (2, entry(100, "1A")),
            (3, entry(100, "1B")),
            (4, entry(100, "2A")),
        ]);
        let rows = vec![row(1, "G1"), row(2, "G1"), row(3, "G1"), row(4, "A-groep")];

        let groups = ClassGroups::collect(&rows, &roster, 100);
        assert_eq!(groups.render_lines(), vec!["1A, 1B (G1)", "2A (A-groep)"]);
    }

    #[test]
    fn other_institutions_never_contribute() {
        let roster = Roster::from_entries([(1, entry(100, "1A")), (2, entry(200, "6Z"))]);
        let rows = vec![row(1, "G1"), row(2, "G1"), row(99, "G1")];

        let groups = ClassGroups::collect(&rows, &roster, 100);
        assert_eq!(groups.render_lines(), vec!["1A (G1)"]);
    }

    #[test]
    fn generated_file_comments_out_every_group() {
        let roster = Roster::from_entries([(1, entry(100, "1A"))]);
        let text = ClassGroups::collect(&[row(1, "G1")], &roster, 100).render_file();

        assert!(text.starts_with("# is commentaar"));
        assert!(text.ends_with("###### START LIJST ######\n\n#1A (G1)\n"));
        assert!(ClassList::parse(&text).selected_groups().is_empty());
    }

    #[test]
    fn selection_and_sent_marking() {
        let list = ClassList::parse("#1A, 1B (G1)\n1A, 1B (G1)\n  2A (G (2))\nno group\n\n##3A (G3) - 2023-04-01\n");
        assert_eq!(
            list.selected_groups().into_iter().collect::<Vec<_>>(),
            vec!["G (2)".to_string(), "G1".to_string()]
        );

        let text = list.to_sent_text("2024-09-01-10:00:00");
        assert_eq!(
            text,
            "#1A, 1B (G1)\n##1A, 1B (G1) - 2024-09-01-10:00:00\n##  2A (G (2)) - 2024-09-01-10:00:00\nno group\n\n##3A (G3) - 2023-04-01\n"
        );
        assert!(ClassList::parse(&text).selected_groups().is_empty());
    }

    #[test]
    fn file_name_carries_institution_and_timestamp() {
        let now = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(8, 5, 3)
            .unwrap();
        assert_eq!(file_name(30569, now), "klassenlijst-30569-2024-09-01-08-05-03.txt");
    }
}
