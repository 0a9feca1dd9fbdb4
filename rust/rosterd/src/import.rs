use crate::catalog::sort_names;
use crate::domain::{merge_key, Activity, Grade, Student, SubClass, Weekday};
use crate::error::{RosterError, RosterResult};
use crate::store::RosterState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Candidate row produced by either parser and edited before commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRow {
    pub id: String,
    pub first: String,
    pub last: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_class: Option<SubClass>,
    #[serde(default)]
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,
}

impl StagedRow {
    fn named(id: String, first: String, last: String) -> Self {
        Self {
            id,
            first,
            last,
            grade: None,
            sub_class: None,
            activity: String::new(),
            day: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub first: String,
    pub last: String,
}

/// Splits one free-text token into first/last.
///
/// "Last, First" when the token holds a comma with text on both sides;
/// otherwise the final whitespace-separated word is the last name and the
/// rest is the first name. A single word becomes a first name.
pub fn parse_name(raw: &str) -> Option<ParsedName> {
    let t = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if t.is_empty() {
        return None;
    }
    if let Some((l, f)) = t.split_once(',') {
        let (l, f) = (l.trim(), f.trim());
        if !l.is_empty() && !f.is_empty() {
            return Some(ParsedName {
                first: f.to_string(),
                last: l.to_string(),
            });
        }
    }
    let parts = t.split(' ').collect::<Vec<_>>();
    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => Some(ParsedName {
            first: rest.join(" "),
            last: last.to_string(),
        }),
        _ => Some(ParsedName {
            first: t,
            last: String::new(),
        }),
    }
}

/// Free-text tokens: split on newline, comma, semicolon or tab, trimmed,
/// empties dropped.
pub fn tokenize_free_text(text: &str) -> Vec<String> {
    text.split(|c: char| c == '\n' || c == ',' || c == ';' || c == '\t')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

pub fn parse_free_text(text: &str) -> RosterResult<Vec<StagedRow>> {
    if text.trim().is_empty() {
        return Err(RosterError::EmptyImport(
            "paste the class list (one per line or comma-separated)".into(),
        ));
    }
    let tokens = tokenize_free_text(text);
    if tokens.is_empty() {
        return Err(RosterError::EmptyImport("no names detected".into()));
    }
    Ok(tokens
        .iter()
        .enumerate()
        .map(|(i, tok)| {
            let p = parse_name(tok).unwrap_or_else(|| ParsedName {
                first: tok.clone(),
                last: String::new(),
            });
            StagedRow::named(format!("TMP-{}", i + 1), p.first, p.last)
        })
        .collect())
}

fn clean_cell(s: &str) -> String {
    let t = s.trim();
    let t = t.strip_prefix('"').unwrap_or(t);
    let t = t.strip_suffix('"').unwrap_or(t);
    t.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HeaderIndex {
    last: Option<usize>,
    first: Option<usize>,
    grade: Option<usize>,
    sub: Option<usize>,
}

impl HeaderIndex {
    fn detect(line: &str) -> Self {
        let cells = line
            .split(',')
            .map(|c| clean_cell(c).to_lowercase())
            .collect::<Vec<_>>();
        Self {
            last: cells.iter().position(|h| h.contains("last")),
            first: cells.iter().position(|h| h.contains("first")),
            grade: cells
                .iter()
                .position(|h| h.starts_with("grade") || h == "class"),
            sub: cells.iter().position(|h| h.contains("sub")),
        }
    }

    fn is_header(&self) -> bool {
        self.last.is_some() || self.first.is_some() || self.grade.is_some() || self.sub.is_some()
    }
}

/// Parses `Last Name, First Name, Grade, Subclass` text. The header row is
/// optional; missing header columns fall back to that fixed order.
pub fn parse_tabular(text: &str) -> RosterResult<Vec<StagedRow>> {
    let lines = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>();
    let Some(first_line) = lines.first() else {
        return Err(RosterError::EmptyImport("empty CSV".into()));
    };

    let header = HeaderIndex::detect(first_line);
    let data = if header.is_header() { &lines[1..] } else { &lines[..] };
    let col_last = header.last.unwrap_or(0);
    let col_first = header.first.unwrap_or(1);
    let col_grade = header.grade.unwrap_or(2);
    let col_sub = header.sub.unwrap_or(3);

    let mut rows = Vec::new();
    for (i, line) in data.iter().enumerate() {
        let cells = line.split(',').map(clean_cell).collect::<Vec<_>>();
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
        let last = cell(col_last);
        let first = cell(col_first);
        if first.is_empty() && last.is_empty() {
            continue;
        }
        let mut row = StagedRow::named(format!("CSV-{}", i + 1), first, last);
        row.grade = Grade::parse_token(&cell(col_grade));
        row.sub_class = SubClass::parse_token(&cell(col_sub));
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(RosterError::EmptyImport("no valid rows found in CSV".into()));
    }
    Ok(rows)
}

/// Field-level edit of one staged row. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPatch {
    pub first: Option<String>,
    pub last: Option<String>,
    pub grade: Option<Option<Grade>>,
    pub sub_class: Option<Option<SubClass>>,
    pub activity: Option<String>,
    pub day: Option<Option<Weekday>>,
}

/// Rows waiting for confirmation before they are merged into the roster.
#[derive(Debug, Clone, Default)]
pub struct StagedImport {
    rows: Vec<StagedRow>,
}

impl StagedImport {
    pub fn rows(&self) -> &[StagedRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn replace(&mut self, rows: Vec<StagedRow>) {
        self.rows = rows;
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn update_row(&mut self, id: &str, patch: RowPatch) -> RosterResult<&StagedRow> {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == id) else {
            return Err(RosterError::NotFound(format!("staged row {id}")));
        };
        if let Some(v) = patch.first {
            row.first = v;
        }
        if let Some(v) = patch.last {
            row.last = v;
        }
        if let Some(v) = patch.grade {
            row.grade = v;
        }
        if let Some(v) = patch.sub_class {
            row.sub_class = v;
        }
        if let Some(v) = patch.activity {
            row.activity = v;
        }
        if let Some(v) = patch.day {
            row.day = v;
        }
        Ok(row)
    }

    /// Returns whether a row was removed.
    pub fn delete_row(&mut self, id: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        self.rows.len() != before
    }
}

/// Grade/subclass applied to staged rows that carry none of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportDefaults {
    pub grade: Option<Grade>,
    pub sub_class: Option<SubClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub activities_added: Vec<String>,
}

pub fn fresh_student_id() -> String {
    format!("IMP-{}", Uuid::new_v4())
}

/// Merges staged rows into a copy of `state` using the composite merge key.
///
/// Rows that cannot resolve a grade and subclass, or carry no name, are
/// skipped. An activity is appended to a matched student only if no
/// afterschool entry has the same name and exactly the same day.
pub fn merge_rows(
    state: &RosterState,
    rows: &[StagedRow],
    defaults: ImportDefaults,
    mut new_id: impl FnMut() -> String,
) -> RosterResult<(RosterState, CommitSummary)> {
    if rows.is_empty() {
        return Err(RosterError::EmptyImport(
            "nothing to import; preview a class list or upload a CSV first".into(),
        ));
    }

    let mut next = state.clone();
    let mut summary = CommitSummary::default();
    let by_key: HashMap<String, usize> = next
        .students
        .iter()
        .enumerate()
        .map(|(i, s)| (merge_key(s.grade, s.sub_class, &s.first, &s.last), i))
        .collect();

    for row in rows {
        let (Some(grade), Some(sub_class)) = (
            row.grade.or(defaults.grade),
            row.sub_class.or(defaults.sub_class),
        ) else {
            summary.skipped += 1;
            continue;
        };
        let first = row.first.trim();
        let last = row.last.trim();
        if first.is_empty() && last.is_empty() {
            summary.skipped += 1;
            continue;
        }
        let activity_name = row.activity.trim();
        let activity =
            (!activity_name.is_empty()).then(|| Activity::afterschool(activity_name, row.day));

        let key = merge_key(grade, sub_class, first, last);
        if let Some(&idx) = by_key.get(&key) {
            let student = &mut next.students[idx];
            student.grade = grade;
            student.sub_class = sub_class;
            if let Some(act) = activity {
                let has = student
                    .afterschool()
                    .any(|a| a.name == act.name && a.day == act.day);
                if !has {
                    student.activities.push(act);
                }
            }
            summary.updated += 1;
            continue;
        }

        let mut id = new_id();
        while next.students.iter().any(|s| s.id == id) {
            id = new_id();
        }
        next.students.push(Student {
            id,
            first: first.to_string(),
            last: last.to_string(),
            grade,
            sub_class,
            activities: activity.into_iter().collect(),
        });
        summary.created += 1;
    }

    let mut names = next.activities.clone();
    for row in rows {
        let name = row.activity.trim();
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
        summary.activities_added.push(name.to_string());
    }
    if !summary.activities_added.is_empty() {
        sort_names(&mut names);
        next.activities = names;
    }

    Ok((next, summary))
}
