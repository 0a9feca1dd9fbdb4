use crate::catalog::{self, collate};
use crate::domain::{seed_students, Activity, Student, Weekday};
use crate::error::{RosterError, RosterResult};
use std::collections::{BTreeMap, HashMap};

/// Full roster state: students, the explicit activity list and the optional
/// name -> color token mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RosterState {
    pub students: Vec<Student>,
    pub activities: Vec<String>,
    pub activity_colors: BTreeMap<String, String>,
}

impl RosterState {
    pub fn seed() -> Self {
        let students = seed_students();
        let activities = seed_activities(&students);
        Self {
            students,
            activities,
            activity_colors: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> Vec<String> {
        catalog::catalog(&self.activities, &self.students)
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }
}

/// Afterschool names of the seed students in first-seen order.
fn seed_activities(students: &[Student]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for a in students.iter().flat_map(|s| s.afterschool()) {
        if !out.contains(&a.name) {
            out.push(a.name.clone());
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistKey {
    Students,
    Activities,
    ActivityColors,
}

impl PersistKey {
    pub const ALL: [PersistKey; 3] = [
        PersistKey::Students,
        PersistKey::Activities,
        PersistKey::ActivityColors,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Activities => "activities",
            Self::ActivityColors => "activityColors",
        }
    }
}

/// Opaque key-value store the roster is written to after every mutation.
pub trait RosterPersistence {
    fn load(&self, key: PersistKey) -> anyhow::Result<Option<String>>;
    fn save(&mut self, key: PersistKey, value: &str) -> anyhow::Result<()>;
}

/// Process-local persistence, used by tests and when no workspace is open.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: HashMap<&'static str, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: PersistKey) -> Option<&str> {
        self.entries.get(key.as_str()).map(|s| s.as_str())
    }

    pub fn insert(&mut self, key: PersistKey, value: impl Into<String>) {
        self.entries.insert(key.as_str(), value.into());
    }
}

impl RosterPersistence for MemoryKv {
    fn load(&self, key: PersistKey) -> anyhow::Result<Option<String>> {
        Ok(self.get(key).map(|s| s.to_string()))
    }

    fn save(&mut self, key: PersistKey, value: &str) -> anyhow::Result<()> {
        self.insert(key, value);
        Ok(())
    }
}

/// Reads the three persisted keys. Each one falls back to seed data on its
/// own when absent or unparseable.
pub fn load_state<P: RosterPersistence>(port: &P) -> RosterState {
    let seed = RosterState::seed();
    let students = load_key(port, PersistKey::Students).unwrap_or(seed.students);
    let activities = load_key(port, PersistKey::Activities).unwrap_or(seed.activities);
    let activity_colors =
        load_key(port, PersistKey::ActivityColors).unwrap_or(seed.activity_colors);
    RosterState {
        students,
        activities,
        activity_colors,
    }
}

fn load_key<P, T>(port: &P, key: PersistKey) -> Option<T>
where
    P: RosterPersistence,
    T: serde::de::DeserializeOwned,
{
    let raw = match port.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key = key.as_str(), error = %e, "persisted roster key unreadable");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key = key.as_str(), error = %e, "persisted roster key unparseable, using seed");
            None
        }
    }
}

/// Authoritative in-memory roster. Every mutator writes the full state
/// through the persistence port before returning the new state.
pub struct RosterStore<P: RosterPersistence> {
    state: RosterState,
    port: P,
}

impl<P: RosterPersistence> RosterStore<P> {
    pub fn open(port: P) -> Self {
        let state = load_state(&port);
        Self { state, port }
    }

    pub fn with_state(state: RosterState, port: P) -> Self {
        Self { state, port }
    }

    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn catalog(&self) -> Vec<String> {
        self.state.catalog()
    }

    pub fn add_or_update_student(&mut self, mut student: Student) -> RosterResult<&RosterState> {
        student.id = student.id.trim().to_string();
        student.first = student.first.trim().to_string();
        student.last = student.last.trim().to_string();
        if student.id.is_empty() {
            return Err(RosterError::BadParams("student id must not be empty".into()));
        }
        if student.first.is_empty() && student.last.is_empty() {
            return Err(RosterError::BadParams(
                "student needs a first or last name".into(),
            ));
        }
        student.dedup_afterschool();

        match self.state.students.iter_mut().find(|s| s.id == student.id) {
            Some(existing) => *existing = student,
            None => self.state.students.push(student),
        }
        self.persist();
        Ok(&self.state)
    }

    /// Removing an unknown id is a no-op.
    pub fn delete_student(&mut self, id: &str) -> &RosterState {
        self.state.students.retain(|s| s.id != id);
        self.persist();
        &self.state
    }

    /// Drops every student. The explicit activity list and colors stay.
    pub fn clear_all(&mut self) -> &RosterState {
        self.state.students.clear();
        self.persist();
        &self.state
    }

    /// Appends an afterschool activity unless one with the same name already
    /// matches the day. An absent `day` matches any existing day.
    pub fn assign_activity(
        &mut self,
        student_id: &str,
        name: &str,
        day: Option<Weekday>,
    ) -> RosterResult<&RosterState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::NoSelection("select an activity first".into()));
        }
        let Some(student) = self.state.students.iter_mut().find(|s| s.id == student_id) else {
            return Err(RosterError::NotFound(format!("student {student_id}")));
        };
        let exists = student
            .afterschool()
            .any(|a| a.name == name && (day.is_none() || a.day == day));
        if !exists {
            student.activities.push(Activity::afterschool(name, day));
        }
        self.persist();
        Ok(&self.state)
    }

    /// Removes matching afterschool activities; without `day` every day of
    /// that activity goes.
    pub fn remove_activity(
        &mut self,
        student_id: &str,
        name: &str,
        day: Option<Weekday>,
    ) -> RosterResult<&RosterState> {
        let Some(student) = self.state.students.iter_mut().find(|s| s.id == student_id) else {
            return Err(RosterError::NotFound(format!("student {student_id}")));
        };
        student.activities.retain(|a| {
            !(a.is_afterschool() && a.name == name && (day.is_none() || a.day == day))
        });
        self.persist();
        Ok(&self.state)
    }

    pub fn add_activity_to_catalog(
        &mut self,
        name: &str,
        color: Option<&str>,
    ) -> RosterResult<&RosterState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::BadParams("activity name must not be empty".into()));
        }
        if !self.state.activities.iter().any(|a| a == name) {
            self.state.activities.push(name.to_string());
            self.state.activities.sort_by(|a, b| collate(a, b));
        }
        if let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) {
            self.state
                .activity_colors
                .insert(name.to_string(), color.to_string());
        }
        self.persist();
        Ok(&self.state)
    }

    /// Drops the name from the explicit list and its color. Students that
    /// already carry the activity keep it.
    pub fn remove_activity_from_catalog(&mut self, name: &str) -> &RosterState {
        self.state.activities.retain(|a| a != name);
        self.state.activity_colors.remove(name);
        self.persist();
        &self.state
    }

    pub fn set_activity_color(&mut self, name: &str, color: &str) -> RosterResult<&RosterState> {
        let name = name.trim();
        let color = color.trim();
        if name.is_empty() || color.is_empty() {
            return Err(RosterError::BadParams(
                "activity name and color must not be empty".into(),
            ));
        }
        self.state
            .activity_colors
            .insert(name.to_string(), color.to_string());
        self.persist();
        Ok(&self.state)
    }

    /// Swaps in a whole new state (snapshot restore, import commit).
    pub fn replace_state(&mut self, state: RosterState) -> &RosterState {
        self.state = state;
        self.persist();
        &self.state
    }

    fn persist(&mut self) {
        for key in PersistKey::ALL {
            let encoded = match key {
                PersistKey::Students => serde_json::to_string(&self.state.students),
                PersistKey::Activities => serde_json::to_string(&self.state.activities),
                PersistKey::ActivityColors => serde_json::to_string(&self.state.activity_colors),
            };
            let result = encoded
                .map_err(anyhow::Error::from)
                .and_then(|raw| self.port.save(key, &raw));
            if let Err(e) = result {
                tracing::warn!(key = key.as_str(), error = %e, "failed to persist roster key");
            }
        }
    }
}
