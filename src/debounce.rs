use std::collections::{BTreeMap, BTreeSet};
use crate::Id;

/// Tracks how many consecutive polls each identifier has been observed off.
/// An id only becomes "ready" after its streak exceeds the confirmation
/// threshold; one poll back on and the streak is gone entirely.
pub struct DebounceSet {
    counts: BTreeMap<Id, u32>,
    threshold: u32,
}

impl DebounceSet {
    pub fn new(threshold: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            threshold,
        }
    }
    /// Feed one poll's worth of currently-off ids. Returns the ids whose
    /// streak now exceeds the threshold, ascending. Ready ids stay tracked
    /// (and keep being returned while still off) until remove() is called.
    pub fn update(&mut self, mut currently_off: BTreeSet<Id>) -> Vec<Id> {
        let mut ready = Vec::new();
        let mut next = BTreeMap::new();
        for (id, count) in &self.counts {
            if currently_off.remove(id) {
                let count = count + 1;
                if count > self.threshold {
                    ready.push(id.clone());
                }
                next.insert(id.clone(), count);
            }
            // not off this poll: dropped, streak starts over next time
        }
        for id in currently_off {
            next.insert(id, 1);
        }
        self.counts = next;
        ready
    }
    /// Acknowledge that a ready id was acted on. No-op if untracked.
    pub fn remove(&mut self, id: &str) {
        self.counts.remove(id);
    }
    pub fn contents(&self) -> Vec<(Id, u32)> {
        self.counts
            .iter()
            .map(|(id, n)| (id.clone(), *n))
            .collect()
    }
}

#[cfg(test)]
mod checks {
    use super::*;

    fn off(ids: &[&str]) -> BTreeSet<Id> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn check_promotion_after_threshold() {
        let mut d = DebounceSet::new(5);
        for _ in 0..5 {
            assert_eq!(d.update(off(&["sw1"])), Vec::<Id>::new());
        }
        // sixth consecutive off observation crosses the strict threshold
        assert_eq!(d.update(off(&["sw1"])), vec!["sw1".to_string()]);
    }

    #[test]
    fn check_keeps_reporting_until_removed() {
        let mut d = DebounceSet::new(2);
        for _ in 0..3 {
            d.update(off(&["sw1"]));
        }
        assert_eq!(d.update(off(&["sw1"])), vec!["sw1".to_string()]);
        assert_eq!(d.update(off(&["sw1"])), vec!["sw1".to_string()]);
    }

    #[test]
    fn check_streak_resets_on_reappearance() {
        let mut d = DebounceSet::new(2);
        d.update(off(&["sw1"]));
        d.update(off(&["sw1"]));
        // back on for one poll: forgotten outright
        assert_eq!(d.update(off(&[])), Vec::<Id>::new());
        assert_eq!(d.contents(), vec![]);
        // needs a full fresh run of threshold + 1 offs again
        assert_eq!(d.update(off(&["sw1"])), Vec::<Id>::new());
        assert_eq!(d.update(off(&["sw1"])), Vec::<Id>::new());
        assert_eq!(d.update(off(&["sw1"])), vec!["sw1".to_string()]);
    }

    #[test]
    fn check_oscillating_id_never_promotes() {
        let mut d = DebounceSet::new(1);
        for _ in 0..10 {
            assert_eq!(d.update(off(&["sw1"])), Vec::<Id>::new());
            assert_eq!(d.update(off(&[])), Vec::<Id>::new());
        }
    }

    #[test]
    fn check_remove_restarts_streak() {
        let mut d = DebounceSet::new(1);
        d.update(off(&["sw1"]));
        assert_eq!(d.update(off(&["sw1"])), vec!["sw1".to_string()]);
        d.remove("sw1");
        assert_eq!(d.contents(), vec![]);
        // still off next poll: counts from 1 again
        assert_eq!(d.update(off(&["sw1"])), Vec::<Id>::new());
        assert_eq!(d.contents(), vec![("sw1".to_string(), 1)]);
    }

    #[test]
    fn check_remove_untracked_is_noop() {
        let mut d = DebounceSet::new(1);
        d.remove("nope");
        assert_eq!(d.contents(), vec![]);
    }

    #[test]
    fn check_ready_list_is_sorted() {
        let mut d = DebounceSet::new(0);
        d.update(off(&["zeta", "alpha", "mid"]));
        let ready = d.update(off(&["zeta", "alpha", "mid"]));
        assert_eq!(ready, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn check_independent_streaks() {
        let mut d = DebounceSet::new(2);
        d.update(off(&["sw1"]));
        d.update(off(&["sw1"]));
        d.update(off(&["sw1", "sw2"]));
        // sw1 is four polls in, sw2 only two
        assert_eq!(d.update(off(&["sw1", "sw2"])), vec!["sw1".to_string()]);
        assert_eq!(
            d.contents(),
            vec![("sw1".to_string(), 4), ("sw2".to_string(), 2)]
        );
    }
}
