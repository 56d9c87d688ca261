//! Session grouping.
//!
//! Splits a snapshot into per-day buckets and a day's written sign-ups into
//! sessions. Everything here is pure: nothing is dropped, and the same input
//! order always produces the same groups.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    Announcement, Day, OralAnnouncement, PoolKey, Question, SessionKey, Snapshot,
    WrittenAnnouncement,
};

/// Sign-ups of one day. The question snapshot is shared by every day.
#[derive(Debug, Clone)]
pub struct DayBucket<'a> {
    pub day: Day,
    pub written: Vec<&'a WrittenAnnouncement>,
    pub oral: Vec<&'a OralAnnouncement>,
    pub questions: &'a [Question],
}

/// Bucket sign-ups by day, ascending.
///
/// Records without a day land in no bucket; see [`undated`].
pub fn group_by_day<'a>(
    written: impl IntoIterator<Item = &'a WrittenAnnouncement>,
    oral: impl IntoIterator<Item = &'a OralAnnouncement>,
    questions: &'a [Question],
) -> BTreeMap<Day, DayBucket<'a>> {
    let mut days: BTreeMap<Day, DayBucket<'a>> = BTreeMap::new();
    let bucket = |day: Day| DayBucket {
        day,
        written: Vec::new(),
        oral: Vec::new(),
        questions,
    };

    for w in written {
        if let Some(day) = w.day {
            days.entry(day).or_insert_with(|| bucket(day)).written.push(w);
        }
    }
    for o in oral {
        if let Some(day) = o.day {
            days.entry(day).or_insert_with(|| bucket(day)).oral.push(o);
        }
    }

    days
}

/// Sign-ups that cannot be placed on any day.
pub fn undated(snapshot: &Snapshot) -> Vec<Announcement> {
    let written = snapshot
        .written
        .iter()
        .filter(|w| w.day.is_none())
        .cloned()
        .map(Announcement::from);
    let oral = snapshot
        .oral
        .iter()
        .filter(|o| o.day.is_none())
        .cloned()
        .map(Announcement::from);
    written.chain(oral).collect()
}

/// Students sitting the same exam, language, room and time slot.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    pub key: SessionKey,
    pub pool: PoolKey,
    /// Ordered by seat, seatless members last.
    pub members: Vec<&'a WrittenAnnouncement>,
}

impl Session<'_> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Day of the sitting, taken from its first member.
    pub fn day(&self) -> Option<Day> {
        self.members.first().and_then(|m| m.day)
    }
}

/// All sessions drawing from one question pool.
#[derive(Debug, Clone)]
pub struct PoolGroup<'a> {
    pub pool: PoolKey,
    pub sessions: Vec<Session<'a>>,
}

impl PoolGroup<'_> {
    pub fn student_count(&self) -> usize {
        self.sessions.iter().map(Session::len).sum()
    }
}

/// Group written sign-ups by pool, then by session, in first-seen order.
pub fn group_sessions<'a>(
    written: impl IntoIterator<Item = &'a WrittenAnnouncement>,
) -> Vec<PoolGroup<'a>> {
    let mut groups: Vec<PoolGroup<'a>> = Vec::new();
    let mut pool_index: HashMap<PoolKey, usize> = HashMap::new();
    let mut session_index: HashMap<(usize, SessionKey), usize> = HashMap::new();

    for w in written {
        let pool = w.pool_key();
        let g = *pool_index.entry(pool.clone()).or_insert_with(|| {
            groups.push(PoolGroup {
                pool: pool.clone(),
                sessions: Vec::new(),
            });
            groups.len() - 1
        });

        let key = w.session_key();
        let sessions = &mut groups[g].sessions;
        let s = *session_index.entry((g, key.clone())).or_insert_with(|| {
            sessions.push(Session {
                key,
                pool,
                members: Vec::new(),
            });
            sessions.len() - 1
        });
        sessions[s].members.push(w);
    }

    for session in groups.iter_mut().flat_map(|g| g.sessions.iter_mut()) {
        session.members.sort_by(|a, b| seat_order(a, b));
    }

    groups
}

/// Seat ascending; sign-ups without a seat sort after every seated one.
pub fn seat_order(a: &WrittenAnnouncement, b: &WrittenAnnouncement) -> Ordering {
    nulls_last(a.seat_no, b.seat_no)
}

pub(crate) fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct question ids per pool, in the order the rows were stored.
#[derive(Debug, Clone, Default)]
pub struct QuestionPools<'a> {
    pools: HashMap<PoolKey, PoolQuestions<'a>>,
}

#[derive(Debug, Clone, Default)]
struct PoolQuestions<'a> {
    ids: Vec<&'a str>,
    rows: HashMap<&'a str, Vec<&'a Question>>,
}

impl<'a> QuestionPools<'a> {
    pub fn build(questions: &'a [Question]) -> Self {
        let mut pools: HashMap<PoolKey, PoolQuestions<'a>> = HashMap::new();
        for q in questions {
            let pool = pools.entry(q.pool_key()).or_default();
            let rows = pool.rows.entry(q.id.as_str()).or_default();
            if rows.is_empty() {
                pool.ids.push(q.id.as_str());
            }
            rows.push(q);
        }
        Self { pools }
    }

    /// Distinct ids of a pool; empty for an unknown pool.
    pub fn distinct_ids(&self, pool: &PoolKey) -> &[&'a str] {
        self.pools
            .get(pool)
            .map(|p| p.ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn distinct_count(&self, pool: &PoolKey) -> usize {
        self.distinct_ids(pool).len()
    }

    /// Every stored row behind one logical question.
    pub fn rows(&self, pool: &PoolKey, question_id: &str) -> &[&'a Question] {
        self.pools
            .get(pool)
            .and_then(|p| p.rows.get(question_id))
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }
}
