use crate::domain::{Activity, Grade, Student, SubClass, Weekday};
use crate::error::{RosterError, RosterResult};
use crate::import::RowPatch;
use crate::query::{FilterCriteria, ListingCriteria, SortKey};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

fn bad(msg: impl Into<String>) -> RosterError {
    RosterError::BadParams(msg.into())
}

pub fn get_required_str(params: &Value, key: &str) -> RosterResult<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad(format!("missing {}", key)))
}

pub fn get_opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_bool(params: &Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn is_blank(v: &Value) -> bool {
    v.is_null() || v.as_str().map_or(false, |s| s.trim().is_empty())
}

fn grade_value(v: &Value, key: &str) -> RosterResult<Option<Grade>> {
    if is_blank(v) {
        return Ok(None);
    }
    Grade::from_json(v)
        .map(Some)
        .ok_or_else(|| bad(format!("{} must be one of: K, 1, 2, 3, 4, 5", key)))
}

fn sub_class_value(v: &Value, key: &str) -> RosterResult<Option<SubClass>> {
    if is_blank(v) {
        return Ok(None);
    }
    v.as_str()
        .and_then(SubClass::parse_token)
        .map(Some)
        .ok_or_else(|| bad(format!("{} must be one of: A, B, C, D", key)))
}

fn day_value(v: &Value, key: &str) -> RosterResult<Option<Weekday>> {
    if is_blank(v) {
        return Ok(None);
    }
    v.as_str()
        .and_then(Weekday::parse_token)
        .map(Some)
        .ok_or_else(|| bad(format!("{} must be a weekday (Monday..Friday)", key)))
}

pub fn parse_opt_grade(params: &Value, key: &str) -> RosterResult<Option<Grade>> {
    params.get(key).map_or(Ok(None), |v| grade_value(v, key))
}

pub fn parse_opt_sub_class(params: &Value, key: &str) -> RosterResult<Option<SubClass>> {
    params.get(key).map_or(Ok(None), |v| sub_class_value(v, key))
}

pub fn parse_opt_day(params: &Value, key: &str) -> RosterResult<Option<Weekday>> {
    params.get(key).map_or(Ok(None), |v| day_value(v, key))
}

/// Direct-entry student. The id is generated when absent.
pub fn student_from_params(v: &Value) -> RosterResult<Student> {
    if !v.is_object() {
        return Err(bad("student must be an object"));
    }
    let id = get_opt_str(v, "id").unwrap_or_else(|| format!("S-{}", Uuid::new_v4()));
    let grade = parse_opt_grade(v, "grade")?.ok_or_else(|| bad("missing grade"))?;
    let sub_class = parse_opt_sub_class(v, "subClass")?.ok_or_else(|| bad("missing subClass"))?;
    let activities = match v.get("activities") {
        None | Some(Value::Null) => Vec::new(),
        Some(a) => serde_json::from_value::<Vec<Activity>>(a.clone())
            .map_err(|e| bad(format!("invalid activities: {e}")))?,
    };
    Ok(Student {
        id,
        first: get_opt_str(v, "first").unwrap_or_default(),
        last: get_opt_str(v, "last").unwrap_or_default(),
        grade,
        sub_class,
        activities,
    })
}

fn parse_list<T>(
    params: &Value,
    key: &str,
    all: &[T],
    item: impl Fn(&Value, &str) -> RosterResult<Option<T>>,
) -> RosterResult<Vec<T>>
where
    T: Copy + PartialEq,
{
    match params.get(key) {
        None | Some(Value::Null) => Ok(all.to_vec()),
        Some(Value::Array(items)) => {
            let mut out = Vec::new();
            for v in items {
                if let Some(x) = item(v, key)? {
                    if !out.contains(&x) {
                        out.push(x);
                    }
                }
            }
            Ok(out)
        }
        Some(_) => Err(bad(format!("{} must be a list", key))),
    }
}

pub fn filter_criteria(params: &Value, default_sort: SortKey) -> RosterResult<FilterCriteria> {
    let sort_by = match get_opt_str(params, "sortBy") {
        None => default_sort,
        Some(s) => SortKey::parse(&s)
            .ok_or_else(|| bad("sortBy must be one of: name, grade, subClass"))?,
    };
    Ok(FilterCriteria {
        text_query: get_opt_str(params, "query").unwrap_or_default(),
        grades: parse_list(params, "grades", &Grade::ALL, grade_value)?,
        sub_classes: parse_list(params, "subClasses", &SubClass::ALL, sub_class_value)?,
        activity_name: get_opt_str(params, "activityName"),
        day: parse_opt_day(params, "day")?,
        sort_by,
    })
}

pub fn listing_criteria(params: &Value) -> RosterResult<ListingCriteria> {
    Ok(ListingCriteria {
        search: get_opt_str(params, "search").unwrap_or_default(),
        grade: parse_opt_grade(params, "grade")?,
        sub_class: parse_opt_sub_class(params, "subClass")?,
    })
}

pub fn row_patch(patch: &Value) -> RosterResult<RowPatch> {
    let Some(obj) = patch.as_object() else {
        return Err(bad("patch must be an object"));
    };
    let mut out = RowPatch::default();
    for (k, v) in obj {
        match k.as_str() {
            "first" | "last" | "activity" => {
                let s = v
                    .as_str()
                    .ok_or_else(|| bad(format!("{} must be string", k)))?
                    .to_string();
                match k.as_str() {
                    "first" => out.first = Some(s),
                    "last" => out.last = Some(s),
                    _ => out.activity = Some(s),
                }
            }
            "grade" => out.grade = Some(grade_value(v, k)?),
            "subClass" => out.sub_class = Some(sub_class_value(v, k)?),
            "day" => out.day = Some(day_value(v, k)?),
            _ => return Err(bad(format!("unknown row field: {}", k))),
        }
    }
    Ok(out)
}

/// Writes `text` to `out_path`, creating parent directories first.
pub fn write_text_file(out_path: &Path, text: &str) -> RosterResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RosterError::Io(format!("failed to create {}: {e}", parent.to_string_lossy()))
        })?;
    }
    std::fs::write(out_path, text)
        .map_err(|e| RosterError::Io(format!("failed to write {}: {e}", out_path.to_string_lossy())))
}
