use crate::domain::Student;
use crate::error::{RosterError, RosterResult};
use crate::store::RosterState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Portable document holding the full roster state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub students: Vec<Student>,
    pub activities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_colors: Option<BTreeMap<String, String>>,
}

impl AppSnapshot {
    pub fn from_state(state: &RosterState) -> Self {
        Self {
            students: state.students.clone(),
            activities: state.activities.clone(),
            activity_colors: Some(state.activity_colors.clone()),
        }
    }

    /// Builds the state to install. A snapshot without colors keeps the
    /// colors currently in use.
    pub fn into_state(self, current: &RosterState) -> RosterState {
        RosterState {
            students: self.students,
            activities: self.activities,
            activity_colors: self
                .activity_colors
                .unwrap_or_else(|| current.activity_colors.clone()),
        }
    }
}

pub fn serialize(state: &RosterState) -> RosterResult<Value> {
    serde_json::to_value(AppSnapshot::from_state(state))
        .map_err(|e| RosterError::InvalidSnapshot(e.to_string()))
}

pub fn serialize_pretty(state: &RosterState) -> RosterResult<String> {
    serde_json::to_string_pretty(&AppSnapshot::from_state(state))
        .map_err(|e| RosterError::InvalidSnapshot(e.to_string()))
}

/// Accepts a document only when `students` and `activities` are lists and
/// every entry decodes into the closed domain types. Repeated afterschool
/// (name, day) entries on a student collapse to the first.
pub fn deserialize(doc: &Value) -> RosterResult<AppSnapshot> {
    let Some(obj) = doc.as_object() else {
        return Err(RosterError::InvalidSnapshot("document must be an object".into()));
    };
    if !obj.get("students").map_or(false, Value::is_array) {
        return Err(RosterError::InvalidSnapshot("students must be a list".into()));
    }
    if !obj.get("activities").map_or(false, Value::is_array) {
        return Err(RosterError::InvalidSnapshot("activities must be a list".into()));
    }
    match obj.get("activityColors") {
        None | Some(Value::Null) | Some(Value::Object(_)) => {}
        Some(_) => {
            return Err(RosterError::InvalidSnapshot(
                "activityColors must be an object".into(),
            ))
        }
    }
    let mut snap: AppSnapshot = serde_json::from_value(doc.clone())
        .map_err(|e| RosterError::InvalidSnapshot(e.to_string()))?;
    if obj.get("activityColors").map_or(false, Value::is_null) {
        snap.activity_colors = None;
    }
    for student in &mut snap.students {
        student.dedup_afterschool();
    }
    Ok(snap)
}

pub fn deserialize_str(text: &str) -> RosterResult<AppSnapshot> {
    let doc: Value = serde_json::from_str(text).map_err(|e| {
        RosterError::InvalidSnapshot(format!("make sure it is a valid snapshot JSON ({e})"))
    })?;
    deserialize(&doc)
}

/// `lila_afterschool_snapshot_YYYY-MM-DD-HH-MM-SS.json`
pub fn default_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "lila_afterschool_snapshot_{}.json",
        now.format("%Y-%m-%d-%H-%M-%S")
    )
}
