use crate::query::RosterRow;

pub const IMPORT_TEMPLATE_FILE: &str = "lila_import_template.csv";
pub const ACTIVITIES_TEMPLATE_FILE: &str = "lila_activities_template.csv";

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Flattened filter results, one line per (student, activity).
pub fn rows_csv(rows: &[RosterRow]) -> String {
    let mut out = String::from("Student ID,First Name,Last Name,Grade,Subclass,Activity,Day\n");
    for r in rows {
        let line = [
            csv_quote(&r.student_id),
            csv_quote(&r.first),
            csv_quote(&r.last),
            r.grade.to_string(),
            r.sub_class.to_string(),
            csv_quote(&r.activity),
            r.day.map(|d| d.to_string()).unwrap_or_default(),
        ]
        .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn import_template_csv() -> String {
    ["Last Name,First Name,Grade,Subclass", "Doe,John,1,A"].join("\n")
}

/// Documents the activity columns; not read back by the importer.
pub fn activities_template_csv() -> String {
    [
        "Activity Name,When,Day,Color",
        "Chess Club,afterschool,Monday,#6366F1",
        "Soccer Club,afterschool,Wednesday,#22C55E",
        "Reading Buddies,in-class,,#F59E0B",
        "Math Lab,lunch,,#EF4444",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Grade, SubClass, Weekday};

    #[test]
    fn rows_csv_quotes_names_with_commas() {
        let rows = vec![RosterRow {
            student_id: "S9".into(),
            first: "Jo, Jr".into(),
            last: "O\"Neil".into(),
            full_name: "Jo, Jr O\"Neil".into(),
            grade: Grade::K,
            sub_class: SubClass::B,
            activity: "Chess".into(),
            day: Some(Weekday::Tuesday),
            color: None,
        }];
        let csv = rows_csv(&rows);
        let line = csv.lines().nth(1).expect("data line");
        assert_eq!(line, "S9,\"Jo, Jr\",\"O\"\"Neil\",K,B,Chess,Tuesday");
    }

    #[test]
    fn import_template_round_trips_through_parser() {
        let rows = crate::import::parse_tabular(&import_template_csv()).expect("parse template");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].last, "Doe");
        assert_eq!(rows[0].grade, Some(Grade::G1));
    }
}
