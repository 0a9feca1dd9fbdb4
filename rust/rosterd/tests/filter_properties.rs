use rosterd::domain::{seed_students, Activity, Grade, Student, SubClass, Weekday};
use rosterd::query::{
    compare_students, filter_roster, flatten, sort_filtered, FilterCriteria, SortKey,
};
use std::collections::BTreeMap;

fn student(id: &str, first: &str, last: &str, grade: Grade, sub: SubClass, acts: &[(&str, Option<Weekday>)]) -> Student {
    Student {
        id: id.into(),
        first: first.into(),
        last: last.into(),
        grade,
        sub_class: sub,
        activities: acts
            .iter()
            .map(|(n, d)| Activity::afterschool(*n, *d))
            .collect(),
    }
}

fn mixed_roster() -> Vec<Student> {
    let mut out = seed_students();
    out.push(student("S010", "zoe", "Adams", Grade::K, SubClass::D, &[("Chess", Some(Weekday::Tuesday))]));
    out.push(student("S011", "Zoe", "Adams", Grade::K, SubClass::A, &[("Chess", None)]));
    out.push(student("S012", "Eli", "Brown", Grade::G5, SubClass::B, &[("Chess", Some(Weekday::Monday)), ("Art", Some(Weekday::Monday))]));
    out.push(student("S013", "Nia", "Cole", Grade::G3, SubClass::C, &[]));
    out
}

#[test]
fn grade_k_only_returns_k_students_sorted_by_name() {
    let roster = seed_students();
    let criteria = FilterCriteria {
        grades: vec![Grade::K],
        ..FilterCriteria::default()
    };
    let out = filter_roster(&roster, &criteria);
    let ids: Vec<&str> = out.iter().map(|f| f.student.id.as_str()).collect();
    assert_eq!(ids, vec!["S001"]);
}

#[test]
fn every_result_satisfies_the_criteria() {
    let roster = mixed_roster();
    let criteria = FilterCriteria {
        grades: vec![Grade::K, Grade::G5],
        sub_classes: vec![SubClass::A, SubClass::B, SubClass::D],
        activity_name: Some("Chess".into()),
        day: Some(Weekday::Monday),
        ..FilterCriteria::default()
    };
    let out = filter_roster(&roster, &criteria);
    assert!(!out.is_empty());
    for f in &out {
        assert!(criteria.grades.contains(&f.student.grade));
        assert!(criteria.sub_classes.contains(&f.student.sub_class));
        assert!(!f.activities.is_empty());
        for a in &f.activities {
            assert_eq!(a.name, "Chess");
            assert_eq!(a.day, Some(Weekday::Monday));
        }
    }
    // Dayless Chess does not satisfy a Monday filter.
    assert!(out.iter().all(|f| f.student.id != "S011"));
}

#[test]
fn text_query_matches_name_or_id_case_insensitively() {
    let roster = mixed_roster();
    let by_name = FilterCriteria {
        text_query: "  ADAMS ".into(),
        ..FilterCriteria::default()
    };
    assert_eq!(filter_roster(&roster, &by_name).len(), 2);

    let by_id = FilterCriteria {
        text_query: "s012".into(),
        ..FilterCriteria::default()
    };
    let out = filter_roster(&roster, &by_id);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].activities.len(), 2);
}

#[test]
fn students_without_afterschool_activities_never_match() {
    let roster = mixed_roster();
    let out = filter_roster(&roster, &FilterCriteria::default());
    assert!(out.iter().all(|f| f.student.id != "S013"));
}

#[test]
fn sorting_is_total_and_idempotent() {
    let roster = mixed_roster();
    for key in [SortKey::Name, SortKey::Grade, SortKey::SubClass] {
        let criteria = FilterCriteria {
            sort_by: key,
            ..FilterCriteria::default()
        };
        let mut out = filter_roster(&roster, &criteria);
        let before: Vec<String> = out.iter().map(|f| f.student.id.clone()).collect();
        sort_filtered(&mut out, key);
        let after: Vec<String> = out.iter().map(|f| f.student.id.clone()).collect();
        assert_eq!(before, after, "re-sort changed order for {:?}", key);
        for pair in out.windows(2) {
            assert!(compare_students(pair[0].student, pair[1].student, key).is_le());
        }
    }
}

#[test]
fn name_sort_breaks_case_ties_deterministically() {
    let roster = mixed_roster();
    let out = filter_roster(&roster, &FilterCriteria::default());
    let names: Vec<String> = out.iter().map(|f| f.student.full_name()).collect();
    let first_two: Vec<&str> = names.iter().take(2).map(|s| s.as_str()).collect();
    assert_eq!(first_two, vec!["Ava Nguyen", "Ben Ortiz"]);
    let zoes: Vec<&str> = out
        .iter()
        .filter(|f| f.student.last == "Adams")
        .map(|f| f.student.id.as_str())
        .collect();
    // Lowercase wins once the letters tie.
    assert_eq!(zoes, vec!["S010", "S011"]);
}

#[test]
fn accented_names_sort_beside_their_base_letter() {
    let mut roster = mixed_roster();
    roster.push(student("S020", "Élodie", "Martin", Grade::G2, SubClass::A, &[("Chess", None)]));
    let out = filter_roster(&roster, &FilterCriteria::default());
    let names: Vec<String> = out.iter().map(|f| f.student.full_name()).collect();
    let eli = names.iter().position(|n| n == "Eli Brown").expect("eli");
    let elodie = names.iter().position(|n| n == "Élodie Martin").expect("elodie");
    let zoe = names.iter().position(|n| n == "zoe Adams").expect("zoe");
    assert_eq!(elodie, eli + 1);
    assert!(elodie < zoe);
}

#[test]
fn flatten_emits_one_row_per_activity_with_colors() {
    let roster = mixed_roster();
    let criteria = FilterCriteria {
        text_query: "Eli".into(),
        ..FilterCriteria::default()
    };
    let out = filter_roster(&roster, &criteria);
    let mut colors = BTreeMap::new();
    colors.insert("Art".to_string(), "#EF4444".to_string());
    let rows = flatten(&out, &colors);
    let acts: Vec<&str> = rows.iter().map(|r| r.activity.as_str()).collect();
    assert_eq!(acts, vec!["Chess", "Art"]);
    assert_eq!(rows[0].color, None);
    assert_eq!(rows[1].color.as_deref(), Some("#EF4444"));
    assert_eq!(rows[1].full_name, "Eli Brown");
}
