use rosterd::domain::{Activity, ActivityWhen, Grade, Student, SubClass, Weekday};
use rosterd::snapshot;
use rosterd::store::RosterState;
use serde_json::json;

fn varied_state() -> RosterState {
    let mut state = RosterState::seed();
    state.students.push(Student {
        id: "IMP-7".into(),
        first: "".into(),
        last: "Okafor".into(),
        grade: Grade::G5,
        sub_class: SubClass::D,
        activities: vec![
            Activity {
                name: "Breakfast Club".into(),
                when: ActivityWhen::BeforeSchool,
                day: None,
            },
            Activity::afterschool("Chess Club", Some(Weekday::Tuesday)),
            Activity::afterschool("Chess Club", None),
        ],
    });
    state.activities.push("Zumba".into());
    state
        .activity_colors
        .insert("Chess Club".into(), "#6366F1".into());
    state
}

#[test]
fn serialize_then_deserialize_is_identity() {
    let state = varied_state();
    let doc = snapshot::serialize(&state).expect("serialize");
    let back = snapshot::deserialize(&doc).expect("deserialize");
    assert_eq!(back.into_state(&RosterState::default()), state);

    let text = snapshot::serialize_pretty(&state).expect("pretty");
    let back = snapshot::deserialize_str(&text).expect("deserialize text");
    assert_eq!(back.into_state(&RosterState::default()), state);
}

#[test]
fn wire_shape_uses_labels() {
    let doc = snapshot::serialize(&varied_state()).expect("serialize");
    let ava = &doc["students"][0];
    assert_eq!(ava["grade"], json!("K"));
    assert_eq!(ava["subClass"], json!("A"));
    assert_eq!(ava["activities"][0]["when"], json!("afterschool"));
    assert_eq!(ava["activities"][0]["day"], json!("Monday"));
    assert!(ava["activities"][1].get("day").is_none());

    let last = &doc["students"][3];
    assert_eq!(last["grade"], json!(5));
    assert_eq!(last["activities"][0]["when"], json!("before-school"));
    assert_eq!(doc["activityColors"]["Chess Club"], json!("#6366F1"));
}

#[test]
fn documents_from_older_exports_load() {
    let doc = json!({
        "students": [
            { "id": "S9", "first": "Kim", "last": "Ro", "grade": "K", "subClass": "B",
              "activities": [{ "name": "Art", "when": "lunch" }] }
        ],
        "activities": ["Art"]
    });
    let snap = snapshot::deserialize(&doc).expect("deserialize");
    assert_eq!(snap.students[0].grade, Grade::K);
    assert!(snap.activity_colors.is_none());
}
