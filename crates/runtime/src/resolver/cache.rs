//! Bounded plan cache keyed by a digest of the planning text.
//!
//! Synthesis is byte-deterministic, so equal text means an equal task and
//! the digest is a sufficient key.

use std::collections::{HashMap, VecDeque};

use planner::TaskText;
use sha2::{Digest, Sha256};

use super::PlanOutcome;

/// SHA-256 over domain and problem text, hex encoded.
pub fn task_key(task: &TaskText) -> String {
    let mut hasher = Sha256::new();
    hasher.update(task.domain.as_bytes());
    hasher.update([0u8]);
    hasher.update(task.problem.as_bytes());
    hex::encode(hasher.finalize())
}

/// Least-recently-used map from task key to outcome.
#[derive(Debug)]
pub struct PlanCache {
    capacity: usize,
    entries: HashMap<String, PlanOutcome>,
    order: VecDeque<String>,
}

impl PlanCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &str) -> Option<PlanOutcome> {
        let outcome = self.entries.get(key)?.clone();
        self.touch(key);
        Some(outcome)
    }

    /// Stores a definitive outcome. Timeouts are never cached.
    pub fn insert(&mut self, key: String, outcome: PlanOutcome) {
        if self.capacity == 0 || matches!(outcome, PlanOutcome::Timeout) {
            return;
        }
        if self.entries.insert(key.clone(), outcome).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key)
            && let Some(k) = self.order.remove(pos)
        {
            self.order.push_back(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use planner::Plan;

    use super::*;

    fn text(problem: &str) -> TaskText {
        TaskText {
            domain: "(define (domain d))".into(),
            problem: problem.into(),
        }
    }

    #[test]
    fn key_depends_on_both_texts() {
        let a = task_key(&text("(p1)"));
        assert_eq!(a, task_key(&text("(p1)")));
        assert_ne!(a, task_key(&text("(p2)")));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn evicts_the_least_recently_used_entry() {
        let mut cache = PlanCache::new(2);
        cache.insert("a".into(), PlanOutcome::Unsolvable);
        cache.insert("b".into(), PlanOutcome::Found(Plan::default()));
        assert!(cache.get("a").is_some());

        cache.insert("c".into(), PlanOutcome::Unsolvable);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn timeouts_are_not_cached() {
        let mut cache = PlanCache::new(4);
        cache.insert("a".into(), PlanOutcome::Timeout);
        assert!(cache.is_empty());
    }
}
