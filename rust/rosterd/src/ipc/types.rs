use std::path::PathBuf;

use serde::Deserialize;

use crate::db::SqliteKv;
use crate::import::StagedImport;
use crate::store::RosterStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<RosterStore<SqliteKv>>,
    pub staged: StagedImport,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            store: None,
            staged: StagedImport::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
