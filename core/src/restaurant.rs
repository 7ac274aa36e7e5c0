//! The Pitman-Yor restaurant: tables, customer counts, seat/unseat.
//!
//! Ported from the arithmetic in `chinese_restaurant.cpp` (`insert_old`,
//! `insert_new`, `erase`) rather than re-derived: each operation walks
//! `table_size_counts` in ascending occupancy order, subtracting the
//! per-bin weight from the draw `r` until the bin that brackets `r` is
//! found.

use ahash::AHashMap;
use statrs::function::gamma::ln_gamma;
use std::collections::BTreeMap;

/// A single Pitman-Yor restaurant.
///
/// Invariants (checked by `sanity_check`): `m <= n`; every entry `(k, c)` in
/// `table_size_counts` has `k > 0, c > 0`; `sum(c) == m`; `sum(k*c) == n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restaurant {
    n: u64,
    m: u64,
    /// occupancy `k` -> number of tables with exactly `k` customers.
    table_size_counts: BTreeMap<u64, u64>,
}

impl Restaurant {
    pub fn new() -> Self {
        Self {
            n: 0,
            m: 0,
            table_size_counts: BTreeMap::new(),
        }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn table_size_counts(&self) -> &BTreeMap<u64, u64> {
        &self.table_size_counts
    }

    /// Seat a customer at a brand new table.
    pub fn seat_new_table(&mut self) {
        self.n += 1;
        self.m += 1;
        *self.table_size_counts.entry(1).or_insert(0) += 1;
    }

    /// Seat a customer at an existing table, `r` drawn uniformly in
    /// `[0, sum_k c_k*(k-a))`.
    pub fn seat_existing_table(&mut self, mut r: f64, a: f64) {
        let keys: Vec<u64> = self.table_size_counts.keys().copied().collect();
        for k in keys {
            let c = *self.table_size_counts.get(&k).unwrap();
            let weight = (c as f64) * (k as f64 - a);
            r -= weight;
            if r <= 0.0 {
                self.move_one(k, k + 1);
                self.n += 1;
                return;
            }
        }
        debug_assert!(r <= 1e-6, "seat_existing_table: r not bracketed by any bin");
        // Numerical edge case: fall into the largest-occupancy bin.
        if let Some((&k, _)) = self.table_size_counts.iter().next_back() {
            self.move_one(k, k + 1);
            self.n += 1;
        } else {
            self.seat_new_table();
        }
    }

    fn move_one(&mut self, from: u64, to: u64) {
        if let Some(c) = self.table_size_counts.get_mut(&from) {
            *c -= 1;
            if *c == 0 {
                self.table_size_counts.remove(&from);
            }
        }
        *self.table_size_counts.entry(to).or_insert(0) += 1;
    }

    /// Unseat a customer, `r` drawn uniformly in `[0, sum_k k*c_k)`. Returns
    /// the new size of the table the customer left, so the caller can decide
    /// whether to recursively unseat from the base distribution (size `0`
    /// means the table vanished).
    pub fn unseat(&mut self, mut r: f64) -> u64 {
        self.n -= 1;
        let keys: Vec<u64> = self.table_size_counts.keys().copied().collect();
        for k in keys {
            let c = *self.table_size_counts.get(&k).unwrap();
            let weight = (k as f64) * (c as f64);
            r -= weight;
            if r <= 0.0 {
                self.move_one_decrement(k);
                let new_size = k - 1;
                if new_size == 0 {
                    self.m -= 1;
                } else {
                    *self.table_size_counts.entry(new_size).or_insert(0) += 1;
                }
                return new_size;
            }
        }
        debug_assert!(r <= 1e-6, "unseat: r not bracketed by any bin");
        if let Some((&k, _)) = self.table_size_counts.iter().next_back() {
            self.move_one_decrement(k);
            let new_size = k - 1;
            if new_size == 0 {
                self.m -= 1;
            } else {
                *self.table_size_counts.entry(new_size).or_insert(0) += 1;
            }
            new_size
        } else {
            0
        }
    }

    fn move_one_decrement(&mut self, k: u64) {
        if let Some(c) = self.table_size_counts.get_mut(&k) {
            *c -= 1;
            if *c == 0 {
                self.table_size_counts.remove(&k);
            }
        }
    }

    /// `sum_tables (lgamma(size - a) - lgamma(1 - a))`.
    pub fn log_prob_tables(&self, a: f64) -> f64 {
        let lgamma_1_minus_a = ln_gamma(1.0 - a);
        self.table_size_counts
            .iter()
            .map(|(&k, &c)| (c as f64) * (ln_gamma(k as f64 - a) - lgamma_1_minus_a))
            .sum()
    }

    pub fn sanity_check(&self) -> Result<(), String> {
        if self.m > self.n {
            return Err(format!("m ({}) > n ({})", self.m, self.n));
        }
        let mut mm = 0u64;
        let mut nn = 0u64;
        for (&k, &c) in &self.table_size_counts {
            if k == 0 || c == 0 {
                return Err(format!("zero entry (k={k}, c={c}) in table_size_counts"));
            }
            mm += c;
            nn += k * c;
        }
        if mm != self.m {
            return Err(format!("sum(c) ({mm}) != m ({})", self.m));
        }
        if nn != self.n {
            return Err(format!("sum(k*c) ({nn}) != n ({})", self.n));
        }
        Ok(())
    }
}

/// Label-keyed collection of restaurants, the shape both the unigram
/// lexicon (label = word) and the AG grammar (label = RHS/parent) need.
pub type RestaurantMap<K> = AHashMap<K, Restaurant>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_new_and_existing_preserve_invariants() {
        let mut r = Restaurant::new();
        for _ in 0..5 {
            r.seat_new_table();
        }
        r.sanity_check().unwrap();
        assert_eq!(r.n(), 5);
        assert_eq!(r.m(), 5);

        // All tables have size 1 here, so any r in [0, 5*(1-0)) seats at an
        // existing table under a=0.
        r.seat_existing_table(2.0, 0.0);
        r.sanity_check().unwrap();
        assert_eq!(r.n(), 6);
        assert_eq!(r.m(), 5);
    }

    #[test]
    fn unseat_identity_after_equal_inserts_and_removals() {
        let mut r = Restaurant::new();
        r.seat_new_table();
        r.seat_new_table();
        r.seat_existing_table(0.5, 0.0);
        let before = r.clone();

        // unseat the customer we just added back off the same table.
        let new_size = r.unseat(1.5);
        assert_eq!(new_size, 1);
        // reseat at the table it just left (size 1 -> existing table draw r=0)
        r.seat_existing_table(0.0, 0.0);
        assert_eq!(r, before);
    }

    #[test]
    fn sanity_check_rejects_broken_invariant() {
        let mut r = Restaurant::new();
        r.seat_new_table();
        r.table_size_counts.insert(1, 0);
        assert!(r.sanity_check().is_err());
    }

    #[test]
    fn log_prob_tables_matches_direct_sum() {
        let mut r = Restaurant::new();
        r.seat_new_table();
        r.seat_existing_table(0.0, 0.5);
        r.seat_new_table();
        let a = 0.5;
        let expected: f64 = r
            .table_size_counts()
            .iter()
            .map(|(&k, &c)| (c as f64) * (ln_gamma(k as f64 - a) - ln_gamma(1.0 - a)))
            .sum();
        assert!((r.log_prob_tables(a) - expected).abs() < 1e-12);
    }
}
