//! Print documents for one day: exam papers and signature forms.
//!
//! Nothing here renders anything. The structures are handed to a
//! [`DocumentRenderer`](crate::traits::DocumentRenderer).

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::grouping::{nulls_last, seat_order, DayBucket, QuestionPools};
use crate::model::{non_blank, Assignment, Day, OralAnnouncement, WrittenAnnouncement};

/// Titles printed on papers and forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperLabels {
    pub written_exam_name: String,
    pub oral_exam_name: String,
}

impl Default for PaperLabels {
    fn default() -> Self {
        Self {
            written_exam_name: "Written exam".to_string(),
            oral_exam_name: "Oral exam".to_string(),
        }
    }
}

/// One student's exam paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamPaper {
    pub placement_id: Option<i64>,
    pub student_id: Option<i64>,
    pub exam_code: String,
    pub language: String,
    pub exam_name: String,
    pub course_name: Option<String>,
    pub building: Option<String>,
    pub room: Option<String>,
    pub seat_no: Option<i32>,
    pub exam_date: Option<NaiveDate>,
    pub day_name: Option<String>,
    pub time_slot: String,
    /// `program / education type`.
    pub curriculum_info: String,
    /// Room type; drawing rooms print on A3.
    pub exam_type: Option<String>,
    pub question_id: Option<String>,
    /// Question id, or a `room-seat date slot` fallback when unassigned.
    pub label: String,
    /// Image file names of every row behind the assigned question.
    pub image_files: Vec<String>,
    /// `day-N/<slot>/<room>/exam_papers`.
    pub folder: String,
}

impl ExamPaper {
    /// `EXAM-lang[Exam name]`.
    pub fn header(&self) -> String {
        format!("{}-{}[{}]", self.exam_code, self.language, self.exam_name)
    }

    pub fn is_a4(&self) -> bool {
        self.exam_type.as_deref() != Some("drawing")
    }

    pub fn is_assigned(&self) -> bool {
        self.question_id.is_some()
    }
}

/// One line on a signature form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatEntry {
    pub seat_no: Option<i32>,
    pub student_id: String,
    pub student_name: Option<String>,
    pub student_surname: Option<String>,
    pub group_code: Option<String>,
}

impl SeatEntry {
    /// `id surname name`.
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}",
            self.student_id,
            self.student_surname.as_deref().unwrap_or(""),
            self.student_name.as_deref().unwrap_or("")
        )
    }
}

/// Attendance sheet for one room and sitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureForm {
    pub exam_name: String,
    pub building: Option<String>,
    pub room: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub day_name: Option<String>,
    /// Empty for oral forms.
    pub time_slot: String,
    pub oral: bool,
    pub students: Vec<SeatEntry>,
    pub folder: String,
}

impl SignatureForm {
    /// `building-room`, either part may be absent.
    pub fn room_label(&self) -> String {
        [self.building.as_deref(), self.room.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Everything to print for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayDocuments {
    pub day: Day,
    pub papers: Vec<ExamPaper>,
    pub forms: Vec<SignatureForm>,
}

/// Calendar date and weekday name of a day number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayDate {
    pub date: Option<NaiveDate>,
    pub day_name: Option<String>,
}

/// Date of each day, taken from the first written sign-up seen for it.
pub fn day_calendar<'a>(
    written: impl IntoIterator<Item = &'a WrittenAnnouncement>,
) -> BTreeMap<Day, DayDate> {
    let mut calendar = BTreeMap::new();
    for w in written {
        if let Some(day) = w.day {
            calendar.entry(day).or_insert_with(|| DayDate {
                date: parse_exam_date(&w.exam_date),
                day_name: w.day_name.clone(),
            });
        }
    }
    calendar
}

/// Parse an ISO date, logging and dropping anything else.
pub fn parse_exam_date(raw: &Option<String>) -> Option<NaiveDate> {
    let raw = non_blank(raw)?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!("failed to parse exam date '{raw}': {e}");
            None
        }
    }
}

/// Build papers and forms for one day.
pub fn prepare_day(
    bucket: &DayBucket<'_>,
    assignments: &HashMap<i64, &Assignment>,
    pools: &QuestionPools<'_>,
    calendar: &BTreeMap<Day, DayDate>,
    labels: &PaperLabels,
) -> DayDocuments {
    let papers: Vec<ExamPaper> = bucket
        .written
        .iter()
        .map(|w| {
            let assignment = w.id.and_then(|id| assignments.get(&id)).copied();
            exam_paper(bucket.day, w, assignment, pools, labels)
        })
        .collect();

    let mut forms = written_forms(bucket.day, &bucket.written, labels);
    forms.extend(oral_forms(bucket.day, &bucket.oral, calendar, labels));

    DayDocuments {
        day: bucket.day,
        papers,
        forms,
    }
}

fn exam_paper(
    day: Day,
    w: &WrittenAnnouncement,
    assignment: Option<&Assignment>,
    pools: &QuestionPools<'_>,
    labels: &PaperLabels,
) -> ExamPaper {
    let time_slot = w.time_slot();
    let question_id = assignment.map(|a| a.question_id.clone());
    let image_files = assignment
        .map(|a| {
            pools
                .rows(&a.pool_key(), &a.question_id)
                .iter()
                .filter_map(|q| q.file_name())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let label = question_id.clone().unwrap_or_else(|| {
        format!(
            "{}-{} {} {}",
            w.room.as_deref().unwrap_or(""),
            w.seat_no.map(|s| s.to_string()).unwrap_or_default(),
            w.exam_date.as_deref().unwrap_or(""),
            time_slot
        )
    });

    ExamPaper {
        placement_id: w.id,
        student_id: w.student_id,
        exam_code: w.exam_code.clone().unwrap_or_default(),
        language: w.curriculum_language.clone().unwrap_or_default(),
        exam_name: labels.written_exam_name.clone(),
        course_name: w.exam_name.clone(),
        building: w.building.clone(),
        room: w.room.clone(),
        seat_no: w.seat_no,
        exam_date: parse_exam_date(&w.exam_date),
        day_name: w.day_name.clone(),
        curriculum_info: format!(
            "{} / {}",
            w.program_name.as_deref().unwrap_or(""),
            w.education_type.as_deref().unwrap_or("")
        ),
        exam_type: w.room_type.clone(),
        question_id,
        label,
        image_files,
        folder: format!("{}/exam_papers", sitting_folder(day, w)),
        time_slot,
    }
}

/// `day-N/<slot>/<room>` with the slot made path-safe.
fn sitting_folder(day: Day, w: &WrittenAnnouncement) -> String {
    format!(
        "day-{day}/{}/{}",
        w.time_slot().replace(':', ""),
        room_segment(non_blank(&w.room))
    )
}

/// A room name usable as a single path component.
fn room_segment(room: Option<&str>) -> String {
    let segment: String = room
        .unwrap_or("")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    if segment.trim_matches('.').trim().is_empty() {
        "unknown-room".to_string()
    } else {
        segment
    }
}

/// One form per sitting folder, in first-seen order, students by seat.
fn written_forms(
    day: Day,
    written: &[&WrittenAnnouncement],
    labels: &PaperLabels,
) -> Vec<SignatureForm> {
    let mut order: Vec<String> = Vec::new();
    let mut sittings: HashMap<String, Vec<&WrittenAnnouncement>> = HashMap::new();
    for &w in written {
        let folder = sitting_folder(day, w);
        sittings
            .entry(folder.clone())
            .or_insert_with(|| {
                order.push(folder);
                Vec::new()
            })
            .push(w);
    }

    let mut forms = Vec::new();
    for folder in order {
        let Some(mut members) = sittings.remove(&folder) else {
            continue;
        };
        members.sort_by(|a, b| seat_order(a, b));
        let first = members[0];
        forms.push(SignatureForm {
            exam_name: labels.written_exam_name.clone(),
            building: first.building.clone(),
            room: first.room.clone(),
            exam_date: parse_exam_date(&first.exam_date),
            day_name: first.day_name.clone(),
            time_slot: first.time_slot(),
            oral: false,
            students: members
                .iter()
                .map(|w| SeatEntry {
                    seat_no: w.seat_no,
                    student_id: w.student_id.map(|id| id.to_string()).unwrap_or_default(),
                    student_name: w.student_name.clone(),
                    student_surname: w.student_surname.clone(),
                    group_code: w.program_name.clone(),
                })
                .collect(),
            folder: format!("{folder}/signature_forms"),
        });
    }
    forms
}

/// One form per room, in first-seen order, students by surname.
fn oral_forms(
    day: Day,
    oral: &[&OralAnnouncement],
    calendar: &BTreeMap<Day, DayDate>,
    labels: &PaperLabels,
) -> Vec<SignatureForm> {
    let mut rooms: Vec<(Option<&str>, Vec<&OralAnnouncement>)> = Vec::new();
    for &o in oral {
        let room = non_blank(&o.room);
        match rooms.iter_mut().find(|(r, _)| *r == room) {
            Some((_, members)) => members.push(o),
            None => rooms.push((room, vec![o])),
        }
    }

    let date = calendar.get(&day);
    rooms
        .into_iter()
        .map(|(room, mut members)| {
            members.sort_by(|a, b| {
                nulls_last(
                    non_blank(&a.student_surname),
                    non_blank(&b.student_surname),
                )
            });
            let first = members[0];
            SignatureForm {
                exam_name: labels.oral_exam_name.clone(),
                building: first.building.clone(),
                room: first.room.clone(),
                exam_date: date.and_then(|d| d.date),
                day_name: date
                    .and_then(|d| d.day_name.clone())
                    .or_else(|| Some(format!("Day {day}"))),
                time_slot: String::new(),
                oral: true,
                students: members
                    .iter()
                    .map(|o| SeatEntry {
                        seat_no: None,
                        student_id: o.student_id.map(|id| id.to_string()).unwrap_or_default(),
                        student_name: o.student_name.clone(),
                        student_surname: o.student_surname.clone(),
                        group_code: None,
                    })
                    .collect(),
                folder: format!("day-{day}/oral/{}/signature_forms", room_segment(room)),
            }
        })
        .collect()
}
