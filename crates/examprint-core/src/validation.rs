//! Completeness and availability checks.
//!
//! Every check is exhaustive: all records and all sessions are inspected and
//! every problem is reported, never just the first one. Warnings never make a
//! result invalid.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grouping::{group_sessions, DayBucket, PoolGroup, QuestionPools, Session};
use crate::missing::MissingQuestions;
use crate::model::{non_blank, OralAnnouncement, Question, RoomType, WrittenAnnouncement};
use crate::traits::{FileProbe, FileStatus};

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// What an issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// A required field is missing.
    Data,
    /// A room type outside the known set.
    RoomType,
    /// A session has zero or exactly one distinct question.
    Questions,
    MissingQuestionsSummary,
    MissingQuestionsDetail,
    /// A question image is missing, unreadable or empty.
    ImageFile,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Data => "DATA",
            Category::RoomType => "ROOM_TYPE",
            Category::Questions => "QUESTIONS",
            Category::MissingQuestionsSummary => "MISSING_QUESTIONS_SUMMARY",
            Category::MissingQuestionsDetail => "MISSING_QUESTIONS_DETAIL",
            Category::ImageFile => "IMAGE_FILE",
        };
        f.write_str(label)
    }
}

/// One diagnostic with its key/value context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    #[serde(default)]
    pub context: Vec<(String, String)>,
}

impl Issue {
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Attach one context pair.
    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.context.push((key.to_string(), value.to_string()));
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Context rendered as `key=value, key=value`.
    pub fn context_line(&self) -> String {
        self.context
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;
        if !self.context.is_empty() {
            write!(f, " ({})", self.context_line())?;
        }
        Ok(())
    }
}

/// Accumulated errors and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Append another result's issues after this one's.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn combine(results: impl IntoIterator<Item = ValidationResult>) -> Self {
        let mut combined = Self::new();
        for result in results {
            combined.merge(result);
        }
        combined
    }

    pub fn errors(&self) -> &[Issue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// True iff there are no errors.
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// Errors grouped by category, categories in first-seen order.
    pub fn errors_by_category(&self) -> Vec<(Category, Vec<&Issue>)> {
        let mut grouped: Vec<(Category, Vec<&Issue>)> = Vec::new();
        for issue in &self.errors {
            match grouped.iter_mut().find(|(c, _)| *c == issue.category) {
                Some((_, issues)) => issues.push(issue),
                None => grouped.push((issue.category, vec![issue])),
            }
        }
        grouped
    }
}

/// Check written sign-ups for required fields and a known room type.
pub fn validate_written<'a>(
    records: impl IntoIterator<Item = &'a WrittenAnnouncement>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen = 0usize;
    let mut ids = HashSet::new();
    for record in records {
        check_written(record, &mut result);
        if let Some(id) = record.id {
            if !ids.insert(id) {
                result.push(duplicate_id_issue(record));
            }
        }
        seen += 1;
    }
    if seen == 0 {
        result.push(Issue::warning(
            Category::Data,
            "No written exam announcements found",
        ));
    }
    result
}

/// A written sign-up reusing a placement id that an earlier sign-up holds.
pub fn duplicate_id_issue(record: &WrittenAnnouncement) -> Issue {
    Issue::error(
        Category::Data,
        format!("Duplicate id: {}", record_id(record.id)),
    )
    .with("id", record_id(record.id))
    .with("student_id", record_id(record.student_id))
}

fn check_written(record: &WrittenAnnouncement, result: &mut ValidationResult) {
    let id = record_id(record.id);
    let missing = |field: &str| Issue::error(Category::Data, format!("Missing {field}")).with("id", &id);

    if record.id.is_none() {
        result.push(missing("id"));
    }
    if record.student_id.is_none() {
        result.push(missing("student_id"));
    }
    if non_blank(&record.exam_code).is_none() {
        result.push(missing("exam_code"));
    }
    if non_blank(&record.room).is_none() {
        result.push(missing("room"));
    }
    if non_blank(&record.session_key).is_none() {
        result.push(missing("session_key"));
    }
    match non_blank(&record.room_type) {
        None => result.push(missing("room_type")),
        Some(room_type) if room_type.parse::<RoomType>().is_err() => {
            let allowed = RoomType::ALL
                .iter()
                .map(RoomType::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            result.push(
                Issue::error(
                    Category::RoomType,
                    format!("Invalid room_type: {room_type}. Must be one of: {allowed}"),
                )
                .with("id", &id),
            );
        }
        Some(_) => {}
    }
    if non_blank(&record.exam_date).is_none() {
        result.push(missing("exam_date"));
    }
}

/// Check oral sign-ups for required fields and a positive day.
pub fn validate_oral<'a>(
    records: impl IntoIterator<Item = &'a OralAnnouncement>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for record in records {
        let id = record_id(record.id);
        let missing =
            |field: &str| Issue::error(Category::Data, format!("Missing {field}")).with("id", &id);

        if record.id.is_none() {
            result.push(missing("id"));
        }
        if record.student_id.is_none() {
            result.push(missing("student_id"));
        }
        if non_blank(&record.exam_code).is_none() {
            result.push(missing("exam_code"));
        }
        if non_blank(&record.room).is_none() {
            result.push(missing("room"));
        }
        if !record.day.is_some_and(|d| d > 0) {
            result.push(Issue::error(Category::Data, "Missing or invalid day").with("id", &id));
        }
    }
    result
}

fn record_id(id: Option<i64>) -> String {
    id.map(|i| i.to_string())
        .unwrap_or_else(|| "null".to_string())
}

/// The availability issue for one session given its distinct question count.
///
/// Zero is an error, exactly one is a warning, two or more is fine.
pub fn session_availability_issue(session: &Session<'_>, available: usize) -> Option<Issue> {
    let issue = match available {
        0 => Issue::error(Category::Questions, "No questions available for session"),
        1 => Issue::warning(
            Category::Questions,
            "Only 1 question available - all students will get same question",
        ),
        _ => return None,
    };
    Some(with_session_context(issue, session))
}

pub(crate) fn with_session_context(issue: Issue, session: &Session<'_>) -> Issue {
    let day = session
        .day()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "null".to_string());
    issue
        .with("day", day)
        .with("session", &session.key)
        .with("course", &session.pool.exam_code)
        .with("language", &session.pool.language)
        .with("students", session.len())
}

/// Check that every session can draw at least one question.
///
/// Sessions with nothing to draw are also registered in the returned
/// aggregate, and summarized at the end of the result.
pub fn validate_question_availability(
    groups: &[PoolGroup<'_>],
    pools: &QuestionPools<'_>,
) -> (ValidationResult, MissingQuestions) {
    let mut result = ValidationResult::new();
    let mut missing = MissingQuestions::new();

    for group in groups {
        let available = pools.distinct_count(&group.pool);
        for session in &group.sessions {
            if let Some(issue) = session_availability_issue(session, available) {
                result.push(issue);
            }
            if available == 0 {
                missing.register(&group.pool, 0, &session.key, session.len(), session.day());
            }
        }
    }

    result.extend(missing.to_issues());
    (result, missing)
}

/// Check the image file behind every question, each distinct file once.
pub fn validate_image_files<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    probe: &dyn FileProbe,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut checked: HashSet<&str> = HashSet::new();

    for question in questions {
        let Some(file) = question.file_name() else {
            result.push(
                Issue::error(Category::ImageFile, "Question has null or empty image path")
                    .with("question_id", &question.id),
            );
            continue;
        };
        if !checked.insert(file) {
            continue;
        }

        let path = probe.locate(file);
        match probe.probe(file) {
            FileStatus::Readable => {}
            FileStatus::Missing => result.push(
                Issue::error(Category::ImageFile, format!("Image file not found: {file}"))
                    .with("path", path),
            ),
            FileStatus::Unreadable => result.push(
                Issue::error(Category::ImageFile, format!("Image file not readable: {file}"))
                    .with("path", path),
            ),
            FileStatus::Empty => result.push(
                Issue::warning(Category::ImageFile, format!("Image file is empty: {file}"))
                    .with("path", path),
            ),
        }
    }

    result
}

/// Records plus question availability for one day.
pub fn validate_bucket(
    bucket: &DayBucket<'_>,
    pools: &QuestionPools<'_>,
) -> (ValidationResult, MissingQuestions) {
    let groups = group_sessions(bucket.written.iter().copied());
    let (availability, missing) = validate_question_availability(&groups, pools);
    let combined = ValidationResult::combine([
        validate_written(bucket.written.iter().copied()),
        validate_oral(bucket.oral.iter().copied()),
        availability,
    ]);
    (combined, missing)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::grouping::group_by_day;
    use crate::model::PoolKey;

    fn complete(id: i64) -> WrittenAnnouncement {
        WrittenAnnouncement {
            id: Some(id),
            day: Some(1),
            seat_no: Some(id as i32),
            session_key: Some("S1".into()),
            exam_code: Some("MATH101".into()),
            curriculum_language: Some("en".into()),
            student_id: Some(1000 + id),
            exam_date: Some("2025-01-10".into()),
            room: Some("A101".into()),
            room_type: Some("aud".into()),
            ..Default::default()
        }
    }

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            row_id: None,
            exam_code: "MATH101".into(),
            language: "en".into(),
            image_path: Some(format!("{id}.png")),
        }
    }

    struct FakeProbe(HashMap<String, FileStatus>);

    impl FileProbe for FakeProbe {
        fn probe(&self, file_name: &str) -> FileStatus {
            self.0
                .get(file_name)
                .copied()
                .unwrap_or(FileStatus::Readable)
        }

        fn locate(&self, file_name: &str) -> String {
            format!("/images/{file_name}")
        }
    }

    #[test]
    fn complete_record_has_no_issues() {
        let records = vec![complete(1)];
        let result = validate_written(&records);
        assert!(result.is_valid());
        assert!(!result.has_warnings());
    }

    #[test]
    fn every_broken_record_is_reported() {
        let mut records: Vec<WrittenAnnouncement> = (1..=10).map(complete).collect();
        records[0].id = None;
        records[1].student_id = None;
        records[2].exam_code = None;
        records[3].room = Some("".into());
        records[4].session_key = None;
        records[5].room_type = None;
        records[6].room_type = Some("garage".into());
        records[7].exam_date = None;
        records[8].exam_code = Some("   ".into());
        records[9].room = None;

        let result = validate_written(&records);
        assert_eq!(result.error_count(), 10);
        assert_eq!(
            result
                .errors()
                .iter()
                .filter(|e| e.category == Category::RoomType)
                .count(),
            1
        );
        assert!(result
            .errors()
            .iter()
            .all(|e| matches!(e.category, Category::Data | Category::RoomType)));
        assert_eq!(result.errors()[0].context_value("id"), Some("null"));
        assert_eq!(result.errors()[1].context_value("id"), Some("2"));
    }

    #[test]
    fn duplicated_id_is_a_data_error() {
        let mut records: Vec<WrittenAnnouncement> = (1..=3).map(complete).collect();
        let mut again = complete(3);
        again.student_id = Some(2003);
        records.push(again);

        let result = validate_written(&records);
        assert_eq!(result.error_count(), 1);
        let issue = &result.errors()[0];
        assert_eq!(issue.category, Category::Data);
        assert_eq!(issue.message, "Duplicate id: 3");
        assert_eq!(issue.context_value("student_id"), Some("2003"));
    }

    #[test]
    fn room_type_message_lists_allowed_values() {
        let mut record = complete(1);
        record.room_type = Some("garage".into());
        let result = validate_written([&record]);
        assert_eq!(
            result.errors()[0].message,
            "Invalid room_type: garage. Must be one of: aud, drawing, pclab"
        );
    }

    #[test]
    fn empty_written_list_only_warns() {
        let result = validate_written(std::iter::empty());
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn oral_requires_positive_day() {
        let records = vec![
            OralAnnouncement {
                id: Some(1),
                student_id: Some(5),
                exam_code: Some("HIST".into()),
                room: Some("B1".into()),
                day: Some(0),
                ..Default::default()
            },
            OralAnnouncement {
                id: Some(2),
                student_id: Some(6),
                exam_code: Some("HIST".into()),
                room: Some("B1".into()),
                day: Some(2),
                ..Default::default()
            },
        ];
        let result = validate_oral(&records);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors()[0].message, "Missing or invalid day");
        assert!(validate_oral(std::iter::empty()).is_valid());
    }

    #[test]
    fn availability_error_warning_and_ok() {
        let mut other = complete(3);
        other.exam_code = Some("PHYS200".into());
        other.session_key = Some("S2".into());
        let mut single = complete(4);
        single.exam_code = Some("CHEM".into());
        single.session_key = Some("S3".into());
        let records = vec![complete(1), complete(2), other, single];

        let mut questions = vec![question("q1"), question("q2")];
        questions.push(Question {
            exam_code: "CHEM".into(),
            ..question("c1")
        });

        let pools = QuestionPools::build(&questions);
        let groups = group_sessions(&records);
        let (result, missing) = validate_question_availability(&groups, &pools);

        let questions_errors: Vec<&Issue> = result
            .errors()
            .iter()
            .filter(|e| e.category == Category::Questions)
            .collect();
        assert_eq!(questions_errors.len(), 1);
        assert_eq!(questions_errors[0].context_value("course"), Some("PHYS200"));
        assert_eq!(questions_errors[0].context_value("students"), Some("1"));
        assert_eq!(questions_errors[0].context_value("day"), Some("1"));

        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.warnings()[0].context_value("course"), Some("CHEM"));

        assert_eq!(missing.len(), 1);
        assert!(missing.get(&PoolKey::new("PHYS200", "en")).is_some());
        assert!(result
            .errors()
            .iter()
            .any(|e| e.category == Category::MissingQuestionsSummary));
        assert!(result
            .errors()
            .iter()
            .any(|e| e.category == Category::MissingQuestionsDetail));
    }

    #[test]
    fn duplicate_rows_count_once() {
        let records = vec![complete(1)];
        let questions = vec![question("q1"), question("q1")];
        let pools = QuestionPools::build(&questions);
        let groups = group_sessions(&records);
        let (result, missing) = validate_question_availability(&groups, &pools);
        assert_eq!(result.warning_count(), 1);
        assert!(result.is_valid());
        assert!(missing.is_empty());
    }

    #[test]
    fn image_files_checked_once_each() {
        let mut statuses = HashMap::new();
        statuses.insert("gone.png".to_string(), FileStatus::Missing);
        statuses.insert("locked.png".to_string(), FileStatus::Unreadable);
        statuses.insert("blank.png".to_string(), FileStatus::Empty);
        let probe = FakeProbe(statuses);

        let mut questions = vec![
            question("gone"),
            question("gone"),
            question("locked"),
            question("blank"),
            question("fine"),
        ];
        questions.push(Question {
            image_path: None,
            ..question("nothing")
        });

        let result = validate_image_files(&questions, &probe);
        assert_eq!(result.error_count(), 3);
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.errors()[0].message, "Image file not found: gone.png");
        assert_eq!(
            result.errors()[0].context_value("path"),
            Some("/images/gone.png")
        );
        assert_eq!(result.errors()[2].context_value("question_id"), Some("nothing"));
    }

    #[test]
    fn bucket_validation_combines_all_checks() {
        let mut broken = complete(2);
        broken.room_type = None;
        let written = vec![complete(1), broken];
        let oral = vec![OralAnnouncement {
            day: Some(1),
            ..Default::default()
        }];
        let questions: Vec<Question> = Vec::new();
        let days = group_by_day(&written, &oral, &questions);
        let pools = QuestionPools::build(&questions);

        let (result, missing) = validate_bucket(&days[&1], &pools);
        assert!(!result.is_valid());
        assert_eq!(missing.len(), 1);
        let categories: Vec<Category> = result
            .errors_by_category()
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        assert_eq!(
            categories,
            vec![
                Category::Data,
                Category::Questions,
                Category::MissingQuestionsSummary,
                Category::MissingQuestionsDetail,
            ]
        );
    }

    #[test]
    fn issue_display_includes_context() {
        let issue = Issue::error(Category::Data, "Missing room").with("id", 5);
        assert_eq!(issue.to_string(), "[ERROR] DATA: Missing room (id=5)");
        let warning = Issue::warning(Category::ImageFile, "Image file is empty: a.png");
        assert_eq!(
            warning.to_string(),
            "[WARNING] IMAGE_FILE: Image file is empty: a.png"
        );
    }
}
