use serde::{Deserialize, Serialize};
use std::fmt;

/// School grade, ordered K < 1 < 2 < 3 < 4 < 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "GradeRepr", into = "GradeRepr")]
pub enum Grade {
    K,
    G1,
    G2,
    G3,
    G4,
    G5,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GradeRepr {
    Num(i64),
    Text(String),
}

impl Grade {
    pub const ALL: [Grade; 6] = [
        Grade::K,
        Grade::G1,
        Grade::G2,
        Grade::G3,
        Grade::G4,
        Grade::G5,
    ];

    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Self::G1),
            2 => Some(Self::G2),
            3 => Some(Self::G3),
            4 => Some(Self::G4),
            5 => Some(Self::G5),
            _ => None,
        }
    }

    /// Normalizes an incoming grade token: "K" in any case, otherwise the
    /// leading integer ("3", "3rd", "2nd grade") when it falls in 1..=5.
    pub fn parse_token(raw: &str) -> Option<Self> {
        let t = raw.trim();
        if t.eq_ignore_ascii_case("k") {
            return Some(Self::K);
        }
        let t = t.strip_prefix('+').unwrap_or(t);
        let end = t
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(t.len());
        t[..end].parse::<i64>().ok().and_then(Self::from_number)
    }

    /// Accepts the JSON forms a grade can arrive in: `"K"`, `1`..`5`, or the
    /// same digits as a string.
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::Number(n) => n.as_i64().and_then(Self::from_number),
            serde_json::Value::String(s) => Self::parse_token(s),
            _ => None,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::K => "K",
            Self::G1 => "1",
            Self::G2 => "2",
            Self::G3 => "3",
            Self::G4 => "4",
            Self::G5 => "5",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl TryFrom<GradeRepr> for Grade {
    type Error = String;

    fn try_from(v: GradeRepr) -> Result<Self, Self::Error> {
        match v {
            GradeRepr::Num(n) => Self::from_number(n).ok_or_else(|| format!("invalid grade: {n}")),
            GradeRepr::Text(s) => {
                if s == "K" {
                    Ok(Self::K)
                } else {
                    Err(format!("invalid grade: {s:?}"))
                }
            }
        }
    }
}

impl From<Grade> for GradeRepr {
    fn from(g: Grade) -> Self {
        match g {
            Grade::K => GradeRepr::Text("K".to_string()),
            Grade::G1 => GradeRepr::Num(1),
            Grade::G2 => GradeRepr::Num(2),
            Grade::G3 => GradeRepr::Num(3),
            Grade::G4 => GradeRepr::Num(4),
            Grade::G5 => GradeRepr::Num(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubClass {
    A,
    B,
    C,
    D,
}

impl SubClass {
    pub const ALL: [SubClass; 4] = [SubClass::A, SubClass::B, SubClass::C, SubClass::D];

    /// Uppercases the token and accepts only A, B, C or D.
    pub fn parse_token(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for SubClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn parse_token(raw: &str) -> Option<Self> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_label().eq_ignore_ascii_case(t))
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityWhen {
    #[serde(rename = "afterschool")]
    Afterschool,
    #[serde(rename = "in-class")]
    InClass,
    #[serde(rename = "lunch")]
    Lunch,
    #[serde(rename = "before-school")]
    BeforeSchool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub when: ActivityWhen,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,
}

impl Activity {
    pub fn afterschool(name: impl Into<String>, day: Option<Weekday>) -> Self {
        Self {
            name: name.into(),
            when: ActivityWhen::Afterschool,
            day,
        }
    }

    pub fn is_afterschool(&self) -> bool {
        self.when == ActivityWhen::Afterschool
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first: String,
    pub last: String,
    pub grade: Grade,
    pub sub_class: SubClass,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Student {
    pub fn full_name(&self) -> String {
        full_name(&self.first, &self.last)
    }

    pub fn afterschool(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|a| a.is_afterschool())
    }

    /// Keeps the first of any afterschool activities sharing (name, day).
    pub fn dedup_afterschool(&mut self) {
        let mut seen: Vec<(String, Option<Weekday>)> = Vec::new();
        self.activities.retain(|a| {
            if !a.is_afterschool() {
                return true;
            }
            let k = (a.name.clone(), a.day);
            if seen.contains(&k) {
                false
            } else {
                seen.push(k);
                true
            }
        });
    }
}

pub fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

/// Key used to recognise the same student across import batches:
/// `grade|subClass|lower(first)|lower(last)`.
pub fn merge_key(grade: Grade, sub_class: SubClass, first: &str, last: &str) -> String {
    format!(
        "{}|{}|{}|{}",
        grade,
        sub_class,
        first.to_lowercase(),
        last.to_lowercase()
    )
}

pub fn seed_students() -> Vec<Student> {
    vec![
        Student {
            id: "S001".into(),
            first: "Ava".into(),
            last: "Nguyen".into(),
            grade: Grade::K,
            sub_class: SubClass::A,
            activities: vec![
                Activity::afterschool("Lego Builders", Some(Weekday::Monday)),
                Activity {
                    name: "Reading Buddies".into(),
                    when: ActivityWhen::InClass,
                    day: None,
                },
            ],
        },
        Student {
            id: "S002".into(),
            first: "Ben".into(),
            last: "Ortiz".into(),
            grade: Grade::G1,
            sub_class: SubClass::B,
            activities: vec![
                Activity::afterschool("Soccer Club", Some(Weekday::Wednesday)),
                Activity {
                    name: "Math Lab".into(),
                    when: ActivityWhen::Lunch,
                    day: None,
                },
            ],
        },
        Student {
            id: "S003".into(),
            first: "Chloe".into(),
            last: "Singh".into(),
            grade: Grade::G2,
            sub_class: SubClass::C,
            activities: vec![
                Activity::afterschool("Drama Crew", Some(Weekday::Thursday)),
                Activity::afterschool("Choir", Some(Weekday::Friday)),
            ],
        },
    ]
}
