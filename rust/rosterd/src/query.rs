use crate::catalog::collate;
use crate::domain::{Activity, Grade, Student, SubClass, Weekday};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Grade,
    SubClass,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "grade" => Some(Self::Grade),
            "subClass" | "subclass" => Some(Self::SubClass),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Grade => "grade",
            Self::SubClass => "subClass",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub text_query: String,
    pub grades: Vec<Grade>,
    pub sub_classes: Vec<SubClass>,
    pub activity_name: Option<String>,
    pub day: Option<Weekday>,
    pub sort_by: SortKey,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            text_query: String::new(),
            grades: Grade::ALL.to_vec(),
            sub_classes: SubClass::ALL.to_vec(),
            activity_name: None,
            day: None,
            sort_by: SortKey::Name,
        }
    }
}

/// A student together with the afterschool activities that passed the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredStudent<'a> {
    pub student: &'a Student,
    pub activities: Vec<&'a Activity>,
}

/// One display/export row per (student, activity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub student_id: String,
    pub first: String,
    pub last: String,
    pub full_name: String,
    pub grade: Grade,
    pub sub_class: SubClass,
    pub activity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn matches_text(student: &Student, q: &str) -> bool {
    student.full_name().to_lowercase().contains(q) || student.id.to_lowercase().contains(q)
}

/// Filters the roster down to students with at least one afterschool
/// activity matching the criteria, sorted by the requested key.
pub fn filter_roster<'a>(students: &'a [Student], criteria: &FilterCriteria) -> Vec<FilteredStudent<'a>> {
    let q = criteria.text_query.trim().to_lowercase();
    let mut out = students
        .iter()
        .filter(|s| criteria.grades.contains(&s.grade))
        .filter(|s| criteria.sub_classes.contains(&s.sub_class))
        .filter(|s| q.is_empty() || matches_text(s, &q))
        .map(|s| FilteredStudent {
            student: s,
            activities: s
                .afterschool()
                .filter(|a| {
                    criteria
                        .activity_name
                        .as_deref()
                        .map_or(true, |n| a.name == n)
                })
                .filter(|a| criteria.day.map_or(true, |d| a.day == Some(d)))
                .collect(),
        })
        .filter(|f| !f.activities.is_empty())
        .collect::<Vec<_>>();
    sort_filtered(&mut out, criteria.sort_by);
    out
}

pub fn compare_students(a: &Student, b: &Student, key: SortKey) -> Ordering {
    let by_name = || collate(&a.full_name(), &b.full_name());
    match key {
        SortKey::Name => by_name(),
        SortKey::Grade => a
            .grade
            .cmp(&b.grade)
            .then_with(|| a.sub_class.cmp(&b.sub_class))
            .then_with(by_name),
        SortKey::SubClass => a.sub_class.cmp(&b.sub_class).then_with(by_name),
    }
}

pub fn sort_filtered(rows: &mut [FilteredStudent<'_>], key: SortKey) {
    rows.sort_by(|a, b| compare_students(a.student, b.student, key));
}

/// Flattens to one row per (student, activity), keeping student order and
/// each student's activity insertion order.
pub fn flatten(filtered: &[FilteredStudent<'_>], colors: &BTreeMap<String, String>) -> Vec<RosterRow> {
    filtered
        .iter()
        .flat_map(|f| {
            f.activities.iter().map(move |a| RosterRow {
                student_id: f.student.id.clone(),
                first: f.student.first.clone(),
                last: f.student.last.clone(),
                full_name: f.student.full_name(),
                grade: f.student.grade,
                sub_class: f.student.sub_class,
                activity: a.name.clone(),
                day: a.day,
                color: colors.get(&a.name).cloned(),
            })
        })
        .collect()
}

/// Management listing: every student (with or without activities) that
/// matches the optional grade/subclass and search text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingCriteria {
    pub search: String,
    pub grade: Option<Grade>,
    pub sub_class: Option<SubClass>,
}

pub fn roster_listing<'a>(students: &'a [Student], criteria: &ListingCriteria) -> Vec<&'a Student> {
    let q = criteria.search.trim().to_lowercase();
    let mut out = students
        .iter()
        .filter(|s| criteria.grade.map_or(true, |g| s.grade == g))
        .filter(|s| criteria.sub_class.map_or(true, |c| s.sub_class == c))
        .filter(|s| q.is_empty() || matches_text(s, &q))
        .collect::<Vec<_>>();
    out.sort_by(|a, b| compare_students(a, b, SortKey::Grade));
    out
}
