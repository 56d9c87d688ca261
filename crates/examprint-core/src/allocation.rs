//! Reserve calculation and round-robin allocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::grouping::Session;
use crate::model::{Assignment, WrittenAnnouncement};

/// Pools smaller than this hand out every question they have.
pub const RESERVE_THRESHOLD: usize = 3;

/// How many questions to hold back from a large enough pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservePolicy {
    pub reserve: usize,
}

impl Default for ReservePolicy {
    fn default() -> Self {
        Self { reserve: 1 }
    }
}

impl ReservePolicy {
    pub fn new(reserve: usize) -> Self {
        Self { reserve }
    }

    /// Number of distinct questions that may be handed out from a pool of `total`.
    pub fn usable_count(&self, total: usize) -> Result<usize, PoolError> {
        if total == 0 {
            return Err(PoolError::NoQuestions);
        }
        if total < RESERVE_THRESHOLD {
            return Ok(total);
        }
        match total.checked_sub(self.reserve) {
            Some(usable) if usable >= 1 => Ok(usable),
            _ => Err(PoolError::ReserveExceedsPool {
                total,
                reserve: self.reserve,
            }),
        }
    }

    /// The usable prefix of a pool's distinct ids.
    pub fn plan_pool<S: AsRef<str>>(&self, distinct_ids: &[S]) -> Result<UsablePool, PoolError> {
        let usable = self.usable_count(distinct_ids.len())?;
        Ok(UsablePool {
            ids: distinct_ids[..usable]
                .iter()
                .map(|id| id.as_ref().to_string())
                .collect(),
            total: distinct_ids.len(),
        })
    }
}

/// The questions actually in circulation for one pool. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsablePool {
    ids: Vec<String>,
    total: usize,
}

impl UsablePool {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Distinct questions the pool held before the reserve was applied.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn withheld(&self) -> usize {
        self.total - self.ids.len()
    }
}

/// Pair every item with `pool[i % pool.len()]`.
pub fn round_robin<'a, 'p, T>(items: &'a [T], pool: &'p UsablePool) -> Vec<(&'a T, &'p str)> {
    items
        .iter()
        .zip(pool.ids.iter().cycle())
        .map(|(item, id)| (item, id.as_str()))
        .collect()
}

/// Outcome of allocating one session.
#[derive(Debug, Clone, Default)]
pub struct SessionAllocation<'a> {
    pub assignments: Vec<Assignment>,
    /// Members without a placement id. They keep their seat position in the
    /// cycle but nothing can be bound to them.
    pub unbound: Vec<&'a WrittenAnnouncement>,
}

/// Bind each seated member of `session` to a question from `pool`.
pub fn allocate_session<'a>(
    session: &Session<'a>,
    pool: &UsablePool,
    assigned_at: DateTime<Utc>,
) -> SessionAllocation<'a> {
    let mut allocation = SessionAllocation::default();
    for (&member, question_id) in round_robin(&session.members, pool) {
        let Some(placement_id) = member.id else {
            allocation.unbound.push(member);
            continue;
        };
        allocation.assignments.push(Assignment {
            placement_id,
            student_id: member.student_id,
            room_code: member.room.clone(),
            exam_code: session.pool.exam_code.clone(),
            curriculum_language: session.pool.language.clone(),
            question_id: question_id.to_string(),
            session_key: session.key.to_string(),
            assigned_at,
        });
    }
    allocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_sessions;
    use crate::model::PoolKey;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Q{i}")).collect()
    }

    #[test]
    fn reserve_threshold_table() {
        let one = ReservePolicy::default();
        assert_eq!(one.usable_count(0), Err(PoolError::NoQuestions));
        assert_eq!(one.usable_count(1), Ok(1));
        assert_eq!(one.usable_count(2), Ok(2));
        assert_eq!(one.usable_count(3), Ok(2));
        assert_eq!(one.usable_count(5), Ok(4));

        let five = ReservePolicy::new(5);
        assert_eq!(five.usable_count(2), Ok(2));
        assert_eq!(
            five.usable_count(4),
            Err(PoolError::ReserveExceedsPool {
                total: 4,
                reserve: 5
            })
        );
        assert_eq!(
            ReservePolicy::new(3).usable_count(3),
            Err(PoolError::ReserveExceedsPool {
                total: 3,
                reserve: 3
            })
        );
        assert_eq!(ReservePolicy::new(0).usable_count(4), Ok(4));
    }

    #[test]
    fn plan_takes_prefix_in_pool_order() {
        let pool = ReservePolicy::default().plan_pool(&["b", "a", "c", "d"]).unwrap();
        assert_eq!(pool.ids(), &["b", "a", "c"]);
        assert_eq!(pool.total(), 4);
        assert_eq!(pool.withheld(), 1);
        assert!(ReservePolicy::default().plan_pool::<&str>(&[]).is_err());
    }

    #[test]
    fn round_robin_cycles_by_position() {
        let pool = ReservePolicy::new(0).plan_pool(&ids(3)).unwrap();
        let students = ["s1", "s2", "s3", "s4", "s5"];
        let handed: Vec<&str> = round_robin(&students, &pool)
            .into_iter()
            .map(|(_, q)| q)
            .collect();
        assert_eq!(handed, vec!["Q1", "Q2", "Q3", "Q1", "Q2"]);
    }

    #[test]
    fn adjacent_seats_differ_with_two_or_more() {
        let pool = ReservePolicy::default().plan_pool(&ids(2)).unwrap();
        let students: Vec<usize> = (0..7).collect();
        let handed = round_robin(&students, &pool);
        assert!(handed.windows(2).all(|w| w[0].1 != w[1].1));
    }

    #[test]
    fn allocation_binds_by_seat_order() {
        let records: Vec<WrittenAnnouncement> = [(1, Some(3)), (2, None), (3, Some(1)), (4, Some(2))]
            .into_iter()
            .map(|(id, seat)| WrittenAnnouncement {
                id: Some(id),
                seat_no: seat,
                day: Some(1),
                student_id: Some(100 + id),
                session_key: Some("S1".into()),
                exam_code: Some("MATH101".into()),
                curriculum_language: Some("en".into()),
                room: Some("A101".into()),
                ..Default::default()
            })
            .collect();
        let groups = group_sessions(&records);
        let pool = ReservePolicy::default().plan_pool(&ids(4)).unwrap();
        let at = Utc::now();

        let allocation = allocate_session(&groups[0].sessions[0], &pool, at);
        let bound: Vec<(i64, &str)> = allocation
            .assignments
            .iter()
            .map(|a| (a.placement_id, a.question_id.as_str()))
            .collect();
        assert_eq!(bound, vec![(3, "Q1"), (4, "Q2"), (1, "Q3"), (2, "Q1")]);
        assert!(allocation.unbound.is_empty());

        let first = &allocation.assignments[0];
        assert_eq!(first.pool_key(), PoolKey::new("MATH101", "en"));
        assert_eq!(first.session_key, "S1");
        assert_eq!(first.room_code.as_deref(), Some("A101"));
        assert_eq!(first.student_id, Some(103));
        assert_eq!(first.assigned_at, at);
    }

    #[test]
    fn members_without_id_keep_their_slot() {
        let records: Vec<WrittenAnnouncement> = [(Some(1), 1), (None, 2), (Some(3), 3)]
            .into_iter()
            .map(|(id, seat)| WrittenAnnouncement {
                id,
                seat_no: Some(seat),
                session_key: Some("S1".into()),
                exam_code: Some("MATH101".into()),
                curriculum_language: Some("en".into()),
                ..Default::default()
            })
            .collect();
        let groups = group_sessions(&records);
        let pool = ReservePolicy::new(0).plan_pool(&ids(3)).unwrap();

        let allocation = allocate_session(&groups[0].sessions[0], &pool, Utc::now());
        assert_eq!(allocation.unbound.len(), 1);
        assert_eq!(allocation.unbound[0].seat_no, Some(2));
        let handed: Vec<&str> = allocation
            .assignments
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        assert_eq!(handed, vec!["Q1", "Q3"]);
    }
}
