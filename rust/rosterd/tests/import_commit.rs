use rosterd::domain::{Activity, ActivityWhen, Grade, SubClass, Weekday};
use rosterd::import::{self, merge_rows, ImportDefaults, StagedRow};
use rosterd::store::RosterState;

fn counter_ids() -> impl FnMut() -> String {
    let mut n = 0;
    move || {
        n += 1;
        format!("IMP-{n}")
    }
}

fn row(first: &str, last: &str, activity: &str, day: Option<Weekday>) -> StagedRow {
    StagedRow {
        id: "TMP-1".into(),
        first: first.into(),
        last: last.into(),
        grade: None,
        sub_class: None,
        activity: activity.into(),
        day,
    }
}

fn grade1_a() -> ImportDefaults {
    ImportDefaults {
        grade: Some(Grade::G1),
        sub_class: Some(SubClass::A),
    }
}

#[test]
fn jane_doe_lands_in_empty_roster_with_activity() {
    let empty = RosterState::default();
    let rows = vec![row("Jane", "Doe", "Chess Club", Some(Weekday::Monday))];

    let (next, summary) = merge_rows(&empty, &rows, grade1_a(), counter_ids()).expect("commit");

    assert_eq!(summary.created, 1);
    assert_eq!(summary.activities_added, vec!["Chess Club".to_string()]);
    assert_eq!(next.students.len(), 1);
    let jane = &next.students[0];
    assert_eq!((jane.first.as_str(), jane.last.as_str()), ("Jane", "Doe"));
    assert_eq!((jane.grade, jane.sub_class), (Grade::G1, SubClass::A));
    assert_eq!(
        jane.activities,
        vec![Activity {
            name: "Chess Club".into(),
            when: ActivityWhen::Afterschool,
            day: Some(Weekday::Monday),
        }]
    );
    assert!(next.catalog().contains(&"Chess Club".to_string()));
}

#[test]
fn committing_same_row_twice_yields_one_student() {
    let rows = vec![row("Jane", "Doe", "Chess Club", Some(Weekday::Monday))];
    let mut ids = counter_ids();

    let (once, _) = merge_rows(&RosterState::default(), &rows, grade1_a(), &mut ids).expect("first");
    let (twice, summary) = merge_rows(&once, &rows, grade1_a(), &mut ids).expect("second");

    assert_eq!(twice.students.len(), 1);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);
    assert_eq!(twice.students[0].activities.len(), 1);
    assert!(summary.activities_added.is_empty());
}

#[test]
fn commit_day_match_is_exact() {
    let rows = vec![row("Jane", "Doe", "Chess Club", Some(Weekday::Monday))];
    let (base, _) = merge_rows(&RosterState::default(), &rows, grade1_a(), counter_ids()).expect("seed");

    let dayless = vec![row("jane", "DOE", "Chess Club", None)];
    let (next, summary) = merge_rows(&base, &dayless, grade1_a(), counter_ids()).expect("merge");

    assert_eq!(summary.updated, 1);
    let days: Vec<Option<Weekday>> = next.students[0].activities.iter().map(|a| a.day).collect();
    assert_eq!(days, vec![Some(Weekday::Monday), None]);
}

#[test]
fn unresolvable_rows_are_skipped_but_activity_still_catalogued() {
    let rows = vec![
        row("Jane", "Doe", "Robotics", None),
        StagedRow {
            grade: Some(Grade::K),
            sub_class: Some(SubClass::C),
            ..row("Al", "Ng", "", None)
        },
    ];
    let defaults = ImportDefaults {
        grade: Some(Grade::G3),
        sub_class: None,
    };

    let (next, summary) = merge_rows(&RosterState::default(), &rows, defaults, counter_ids()).expect("commit");

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(next.students[0].first, "Al");
    assert_eq!(next.activities, vec!["Robotics".to_string()]);
}

#[test]
fn empty_staged_list_is_rejected_without_change() {
    let state = RosterState::seed();
    let e = merge_rows(&state, &[], grade1_a(), counter_ids()).unwrap_err();
    assert_eq!(e.code(), "empty_import");
}

#[test]
fn csv_preview_feeds_commit_with_row_grades() {
    let csv = "Last Name,First Name,Grade,Subclass\nNguyen,Ava,K,a\nLee,Sam,3rd,B\nPark,Jo,Gr 2,C\n";
    let rows = import::parse_tabular(csv).expect("parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].grade, Some(Grade::G3));
    assert_eq!(rows[2].grade, None);

    let (next, summary) =
        merge_rows(&RosterState::seed(), &rows, ImportDefaults::default(), counter_ids()).expect("commit");

    // Ava Nguyen K/A already exists in the seed roster; Jo has no usable grade.
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(next.students.len(), 4);
    let sam = next.students.last().expect("sam");
    assert_eq!((sam.first.as_str(), sam.grade, sam.sub_class), ("Sam", Grade::G3, SubClass::B));
}

#[test]
fn identical_rows_in_one_batch_are_separate_students() {
    let rows = vec![
        row("Jane", "Doe", "Chess", None),
        row("Jane", "Doe", "Art", None),
    ];

    let (once, summary) =
        merge_rows(&RosterState::default(), &rows, grade1_a(), counter_ids()).expect("commit");

    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    let acts: Vec<Vec<&str>> = once
        .students
        .iter()
        .map(|s| s.activities.iter().map(|a| a.name.as_str()).collect())
        .collect();
    assert_eq!(acts, vec![vec!["Chess"], vec!["Art"]]);
    assert_ne!(once.students[0].id, once.students[1].id);

    let single = vec![row("Jane", "Doe", "Chess", None)];
    let (base, _) = merge_rows(&RosterState::default(), &single, grade1_a(), counter_ids()).expect("first");
    let (again, summary) = merge_rows(&base, &single, grade1_a(), counter_ids()).expect("second");
    assert_eq!(again.students.len(), 1);
    assert_eq!(summary.updated, 1);
}
