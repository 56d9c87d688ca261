//! Core data model types for examprint.
//!
//! Announcements, questions and assignments mirror the flat records the data
//! store exposes. Fields that validation has to inspect are optional at the
//! type level so that incomplete records still load and can be reported.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Day number within the testing period.
pub type Day = i32;

/// A written exam sign-up: one student at one seat in one sitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrittenAnnouncement {
    /// Placement id. Doubles as the idempotency key for assignments.
    pub id: Option<i64>,
    pub day: Option<Day>,
    pub seat_no: Option<i32>,
    /// Explicit session key as stored.
    pub session_key: Option<String>,
    pub exam_code: Option<String>,
    pub exam_name: Option<String>,
    pub curriculum_language: Option<String>,
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub student_surname: Option<String>,
    /// Exam date as stored. ISO `YYYY-MM-DD` is expected but not enforced.
    pub exam_date: Option<String>,
    pub day_name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub room: Option<String>,
    pub room_type: Option<String>,
    pub building: Option<String>,
    pub program_name: Option<String>,
    pub education_type: Option<String>,
    pub has_disability: Option<bool>,
}

impl WrittenAnnouncement {
    /// The question pool this sitting draws from.
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(
            self.exam_code.clone().unwrap_or_default(),
            self.curriculum_language.clone().unwrap_or_default(),
        )
    }

    /// The explicit session key, or one derived from the physical sitting.
    pub fn session_key(&self) -> SessionKey {
        match non_blank(&self.session_key) {
            Some(key) => SessionKey::from(key),
            None => SessionKey::derive(
                &self.pool_key(),
                non_blank(&self.room).unwrap_or("?"),
                &self.time_slot(),
                self.day,
            ),
        }
    }

    /// `HH:MM-HH:MM`, with `?` standing in for a missing bound.
    pub fn time_slot(&self) -> String {
        format!(
            "{}-{}",
            format_time(self.start_time),
            format_time(self.end_time)
        )
    }
}

fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// An oral exam sign-up. Oral sittings have no seat and no question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OralAnnouncement {
    pub id: Option<i64>,
    pub day: Option<Day>,
    pub exam_code: Option<String>,
    pub exam_name: Option<String>,
    pub building: Option<String>,
    pub room: Option<String>,
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub student_surname: Option<String>,
    pub curriculum_year: Option<i32>,
    pub curriculum_language: Option<String>,
    pub program_name: Option<String>,
    pub education_type: Option<String>,
    pub has_disability: Option<bool>,
}

/// Either kind of sign-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Announcement {
    Written(WrittenAnnouncement),
    Oral(OralAnnouncement),
}

impl Announcement {
    pub fn id(&self) -> Option<i64> {
        match self {
            Announcement::Written(w) => w.id,
            Announcement::Oral(o) => o.id,
        }
    }

    pub fn day(&self) -> Option<Day> {
        match self {
            Announcement::Written(w) => w.day,
            Announcement::Oral(o) => o.day,
        }
    }

    pub fn exam_code(&self) -> Option<&str> {
        match self {
            Announcement::Written(w) => w.exam_code.as_deref(),
            Announcement::Oral(o) => o.exam_code.as_deref(),
        }
    }

    pub fn room(&self) -> Option<&str> {
        match self {
            Announcement::Written(w) => w.room.as_deref(),
            Announcement::Oral(o) => o.room.as_deref(),
        }
    }

    pub fn student_id(&self) -> Option<i64> {
        match self {
            Announcement::Written(w) => w.student_id,
            Announcement::Oral(o) => o.student_id,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Announcement::Written(_))
    }
}

impl From<WrittenAnnouncement> for Announcement {
    fn from(w: WrittenAnnouncement) -> Self {
        Announcement::Written(w)
    }
}

impl From<OralAnnouncement> for Announcement {
    fn from(o: OralAnnouncement) -> Self {
        Announcement::Oral(o)
    }
}

/// Room categories a written sitting may take place in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Aud,
    Drawing,
    Pclab,
}

impl RoomType {
    pub const ALL: [RoomType; 3] = [RoomType::Aud, RoomType::Drawing, RoomType::Pclab];
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Aud => write!(f, "aud"),
            RoomType::Drawing => write!(f, "drawing"),
            RoomType::Pclab => write!(f, "pclab"),
        }
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aud" => Ok(RoomType::Aud),
            "drawing" => Ok(RoomType::Drawing),
            "pclab" => Ok(RoomType::Pclab),
            other => Err(format!("unknown room type: {other}")),
        }
    }
}

/// One row of the question bank.
///
/// `id` is not unique: several rows sharing an id are several images of the
/// same logical question. `row_id` is unique per row when the store has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub row_id: Option<i64>,
    pub exam_code: String,
    pub language: String,
    /// Raw image reference, e.g. `exam-1\images_1.jpg`.
    #[serde(default)]
    pub image_path: Option<String>,
}

impl Question {
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(self.exam_code.clone(), self.language.clone())
    }

    /// File name part of the image reference (after the last backslash).
    pub fn file_name(&self) -> Option<&str> {
        let path = non_blank(&self.image_path)?;
        match path.rfind('\\') {
            Some(idx) if idx + 1 < path.len() => Some(&path[idx + 1..]),
            _ => Some(path),
        }
    }
}

/// Identifies a question pool: exam code plus language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    pub exam_code: String,
    pub language: String,
}

impl PoolKey {
    pub fn new(exam_code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            exam_code: exam_code.into(),
            language: language.into(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exam_code, self.language)
    }
}

/// Identifies one physical sitting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Key for a sitting without an explicit session key.
    pub fn derive(pool: &PoolKey, room: &str, time_slot: &str, day: Option<Day>) -> Self {
        let day = day.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
        SessionKey(format!("{pool}|{room}|{time_slot}|day-{day}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        SessionKey(s.to_string())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A question bound to one written sitting.
///
/// A placement has at most one assignment. Once persisted it stays until the
/// assignment set is explicitly cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub placement_id: i64,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub room_code: Option<String>,
    pub exam_code: String,
    pub curriculum_language: String,
    pub question_id: String,
    pub session_key: String,
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(self.exam_code.clone(), self.curriculum_language.clone())
    }
}

/// Everything a run reads from the store, loaded once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub written: Vec<WrittenAnnouncement>,
    #[serde(default)]
    pub oral: Vec<OralAnnouncement>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// `Some(trimmed)` unless the value is absent or blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
