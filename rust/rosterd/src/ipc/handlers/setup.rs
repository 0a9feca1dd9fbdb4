use crate::db;
use crate::domain::{Grade, SubClass};
use crate::import::ImportDefaults;
use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::types::{AppState, Request};
use crate::query::SortKey;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
pub enum SetupSection {
    Import,
    Filter,
    Security,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "import" => Some(Self::Import),
            "filter" => Some(Self::Filter),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Import => "setup.import",
            Self::Filter => "setup.filter",
            Self::Security => "setup.security",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Import => json!({
            "defaultGrade": null,
            "defaultSubClass": null
        }),
        SetupSection::Filter => json!({
            "defaultSortBy": "name"
        }),
        SetupSection::Security => json!({
            "confirmDeletes": true
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Import => match k.as_str() {
                "defaultGrade" => {
                    if v.is_null() {
                        obj.insert(k.clone(), Value::Null);
                    } else {
                        let g = Grade::from_json(v)
                            .ok_or_else(|| "defaultGrade must be one of: K, 1, 2, 3, 4, 5".to_string())?;
                        obj.insert(k.clone(), json!(g));
                    }
                }
                "defaultSubClass" => {
                    if v.is_null() {
                        obj.insert(k.clone(), Value::Null);
                    } else {
                        let c = v
                            .as_str()
                            .and_then(SubClass::parse_token)
                            .ok_or_else(|| "defaultSubClass must be one of: A, B, C, D".to_string())?;
                        obj.insert(k.clone(), json!(c));
                    }
                }
                _ => return Err(format!("unknown import field: {}", k)),
            },
            SetupSection::Filter => match k.as_str() {
                "defaultSortBy" => {
                    let key = v
                        .as_str()
                        .and_then(SortKey::parse)
                        .ok_or_else(|| "defaultSortBy must be one of: name, grade, subClass".to_string())?;
                    obj.insert(k.clone(), Value::String(key.as_str().to_string()));
                }
                _ => return Err(format!("unknown filter field: {}", k)),
            },
            SetupSection::Security => match k.as_str() {
                "confirmDeletes" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                _ => return Err(format!("unknown security field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Best-effort apply: malformed historical values fall back to defaults.
            let _ = merge_section_patch(section, &mut current, saved_obj);
        }
    }
    Ok(current)
}

fn section_or_default(conn: &rusqlite::Connection, section: SetupSection) -> Value {
    load_section(conn, section).unwrap_or_else(|e| {
        tracing::warn!(section = section.key(), error = %e, "setup section unreadable");
        default_section(section)
    })
}

pub fn import_defaults(conn: &rusqlite::Connection) -> ImportDefaults {
    let v = section_or_default(conn, SetupSection::Import);
    ImportDefaults {
        grade: v.get("defaultGrade").and_then(Grade::from_json),
        sub_class: v
            .get("defaultSubClass")
            .and_then(|s| s.as_str())
            .and_then(SubClass::parse_token),
    }
}

pub fn default_sort(conn: &rusqlite::Connection) -> SortKey {
    section_or_default(conn, SetupSection::Filter)
        .get("defaultSortBy")
        .and_then(|v| v.as_str())
        .and_then(SortKey::parse)
        .unwrap_or_default()
}

pub fn confirm_deletes(conn: &rusqlite::Connection) -> bool {
    section_or_default(conn, SetupSection::Security)
        .get("confirmDeletes")
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_workspace(&req.id);
    };
    let conn = store.port().conn();
    let import = match load_section(conn, SetupSection::Import) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let filter = match load_section(conn, SetupSection::Filter) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let security = match load_section(conn, SetupSection::Security) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "import": import,
            "filter": filter,
            "security": security
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_workspace(&req.id);
    };
    let conn = store.port().conn();
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true, "section": section_raw, "values": current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
