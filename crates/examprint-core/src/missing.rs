//! Aggregation of sessions that could not be served by their question pool.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{Day, PoolKey, SessionKey};
use crate::validation::{Category, Issue};

/// Minimum pool size recommended to operators. Not tied to the reserve rule.
pub const MIN_RECOMMENDED_QUESTIONS: usize = 3;

/// One session that went without questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionShortfall {
    pub session_key: SessionKey,
    pub students: usize,
    pub day: Option<Day>,
}

/// Everything known about one under-stocked pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingQuestionInfo {
    pub exam_code: String,
    pub language: String,
    pub available_questions: usize,
    pub sessions: Vec<SessionShortfall>,
    pub total_students: usize,
    pub sessions_affected: usize,
    pub days: BTreeSet<Day>,
}

impl MissingQuestionInfo {
    fn new(pool: &PoolKey, available: usize) -> Self {
        Self {
            exam_code: pool.exam_code.clone(),
            language: pool.language.clone(),
            available_questions: available,
            sessions: Vec::new(),
            total_students: 0,
            sessions_affected: 0,
            days: BTreeSet::new(),
        }
    }

    fn add(&mut self, shortfall: SessionShortfall) {
        self.total_students += shortfall.students;
        self.sessions_affected += 1;
        if let Some(day) = shortfall.day {
            self.days.insert(day);
        }
        self.sessions.push(shortfall);
    }

    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(self.exam_code.clone(), self.language.clone())
    }

    /// `1,2,3`, or `unknown` when no session had a day.
    pub fn days_label(&self) -> String {
        if self.days.is_empty() {
            return "unknown".to_string();
        }
        self.days
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn recommendation(&self) -> String {
        format!(
            "Add at least {MIN_RECOMMENDED_QUESTIONS} questions to database for {} ({})",
            self.exam_code, self.language
        )
    }
}

/// Under-stocked pools keyed by exam code and language, across all days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingQuestions {
    pools: BTreeMap<PoolKey, MissingQuestionInfo>,
}

impl MissingQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one session that could not be served.
    pub fn register(
        &mut self,
        pool: &PoolKey,
        available: usize,
        session_key: &SessionKey,
        students: usize,
        day: Option<Day>,
    ) {
        let info = self
            .pools
            .entry(pool.clone())
            .or_insert_with(|| MissingQuestionInfo::new(pool, available));
        info.available_questions = available;
        info.add(SessionShortfall {
            session_key: session_key.clone(),
            students,
            day,
        });
    }

    /// Fold another aggregate into this one.
    pub fn merge(&mut self, other: MissingQuestions) {
        for (pool, info) in other.pools {
            match self.pools.get_mut(&pool) {
                Some(existing) => {
                    existing.available_questions = info.available_questions;
                    for session in info.sessions {
                        existing.add(session);
                    }
                }
                None => {
                    self.pools.insert(pool, info);
                }
            }
        }
    }

    pub fn get(&self, pool: &PoolKey) -> Option<&MissingQuestionInfo> {
        self.pools.get(pool)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MissingQuestionInfo> {
        self.pools.values()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn total_students(&self) -> usize {
        self.iter().map(|i| i.total_students).sum()
    }

    pub fn into_vec(self) -> Vec<MissingQuestionInfo> {
        self.pools.into_values().collect()
    }

    /// One summary error plus one detail error per pool; nothing when empty.
    pub fn to_issues(&self) -> Vec<Issue> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut issues = vec![Issue::error(
            Category::MissingQuestionsSummary,
            format!(
                "Missing questions for {} course-language combinations",
                self.len()
            ),
        )];
        for info in self.iter() {
            issues.push(
                Issue::error(
                    Category::MissingQuestionsDetail,
                    format!("Course: {}, Language: {}", info.exam_code, info.language),
                )
                .with("days", info.days_label())
                .with("sessions", info.sessions_affected)
                .with("total_students", info.total_students),
            );
        }
        issues
    }
}
