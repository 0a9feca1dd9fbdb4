use crate::domain::Student;
use std::cmp::Ordering;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Base letters only: decomposed, accents dropped, lowercased.
fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn accent_key(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

fn case_key(s: &str) -> Vec<bool> {
    s.nfd().map(char::is_uppercase).collect()
}

/// Locale-style string ordering: base letters first, then unaccented before
/// accented, then lowercase before uppercase. The raw string breaks any
/// remaining tie so the order stays total.
pub fn collate(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| accent_key(a).cmp(&accent_key(b)))
        .then_with(|| case_key(a).cmp(&case_key(b)))
        .then_with(|| a.cmp(b))
}

/// Sorts and dedups a list of names with [`collate`].
pub fn sort_names(names: &mut Vec<String>) {
    names.sort_by(|a, b| collate(a, b));
    names.dedup();
}

/// Activity names available for selection: the explicit list plus every
/// afterschool activity name any student carries, sorted and deduplicated.
/// Always computed from its inputs, never stored.
pub fn catalog(activities: &[String], students: &[Student]) -> Vec<String> {
    let mut seen = HashSet::<&str>::new();
    let mut out = Vec::new();
    let in_use = students
        .iter()
        .flat_map(|s| s.afterschool())
        .map(|a| a.name.as_str());
    for name in activities.iter().map(|s| s.as_str()).chain(in_use) {
        if seen.insert(name) {
            out.push(name.to_string());
        }
    }
    out.sort_by(|a, b| collate(a, b));
    out
}
