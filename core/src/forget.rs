//! Forget-rate bookkeeping for online inference: periodically erasing old
//! lexicon entries so the model can track a non-stationary stream instead
//! of accumulating every type/token forever.
//!
//! Grounded on the `forget_rate`/`type_memory`/`token_memory` fields
//! described alongside `Estimators.cc`'s online-mode bookkeeping: a
//! uniform policy erases whichever label is least-recently-touched once
//! memory exceeds its budget; a proportional policy erases in proportion
//! to each label's token count, biasing toward forgetting high-frequency
//! "burned in" words more aggressively than rare ones.

use crate::config::ForgetMethod;
use crate::rng::Rng;
use ahash::AHashMap;

/// Tracks label "age" (last-touched iteration) so a uniform forget policy
/// can evict the stalest entries first.
#[derive(Debug, Clone, Default)]
pub struct ForgetPolicy {
    last_touched: AHashMap<Vec<char>, u64>,
    clock: u64,
}

impl ForgetPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, label: &[char]) {
        self.clock += 1;
        self.last_touched.insert(label.to_vec(), self.clock);
    }

    pub fn remove(&mut self, label: &[char]) {
        self.last_touched.remove(label);
    }

    /// Labels whose memory has fully expired, i.e. their last touch was
    /// more than `token_memory` ticks ago. Empty when `token_memory == 0`
    /// (memory disabled, per Open Question: no forgetting is applied).
    pub fn expired(&self, token_memory: u64) -> Vec<Vec<char>> {
        if token_memory == 0 {
            return Vec::new();
        }
        self.last_touched
            .iter()
            .filter(|(_, &t)| self.clock.saturating_sub(t) > token_memory)
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Pick one label to evict under `method`, given each label's current
    /// token count, for a `forget_rate`-driven forget step. Returns `None`
    /// when there is nothing to forget.
    pub fn pick_to_forget(
        &self,
        method: ForgetMethod,
        counts: &AHashMap<Vec<char>, u64>,
        rng: &mut Rng,
    ) -> Option<Vec<char>> {
        if counts.is_empty() {
            return None;
        }
        match method {
            ForgetMethod::U => self
                .last_touched
                .iter()
                .filter(|(label, _)| counts.contains_key(*label))
                .min_by_key(|(_, &t)| t)
                .map(|(label, _)| label.clone()),
            ForgetMethod::P => {
                let total: u64 = counts.values().sum();
                if total == 0 {
                    return None;
                }
                let mut r = rng.uniform(total as f64);
                let mut labels: Vec<_> = counts.iter().collect();
                labels.sort_by(|a, b| a.0.cmp(b.0));
                for (label, &count) in labels {
                    r -= count as f64;
                    if r <= 0.0 {
                        return Some(label.clone());
                    }
                }
                counts.keys().next().cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn zero_token_memory_never_expires() {
        let mut p = ForgetPolicy::new();
        p.touch(&key("cat"));
        assert!(p.expired(0).is_empty());
    }

    #[test]
    fn stale_label_expires_after_memory_window() {
        let mut p = ForgetPolicy::new();
        p.touch(&key("cat"));
        for _ in 0..10 {
            p.touch(&key("dog"));
        }
        let expired = p.expired(5);
        assert!(expired.contains(&key("cat")));
        assert!(!expired.contains(&key("dog")));
    }

    #[test]
    fn uniform_picks_least_recently_touched() {
        let mut p = ForgetPolicy::new();
        p.touch(&key("cat"));
        p.touch(&key("dog"));
        let mut counts = AHashMap::new();
        counts.insert(key("cat"), 3u64);
        counts.insert(key("dog"), 1u64);
        let mut rng = Rng::from_seed(1);
        let picked = p.pick_to_forget(ForgetMethod::U, &counts, &mut rng);
        assert_eq!(picked, Some(key("cat")));
    }

    #[test]
    fn proportional_only_picks_present_labels() {
        let mut p = ForgetPolicy::new();
        p.touch(&key("cat"));
        let mut counts = AHashMap::new();
        counts.insert(key("cat"), 5u64);
        let mut rng = Rng::from_seed(2);
        let picked = p.pick_to_forget(ForgetMethod::P, &counts, &mut rng);
        assert_eq!(picked, Some(key("cat")));
    }
}
