//! `PYAdaptor<B>`: a label -> `Restaurant` map over a base distribution `B`.
//!
//! The adaptor owns its own `Rng` (Concurrency & Resource Model: "PRNG state
//! is owned by the sampler; multiple concurrent samplers must each hold
//! their own"), so `seat`/`unseat` draw internally rather than taking an
//! RNG parameter at every call site — mirroring how each restaurant-owning
//! component in the source system is its own independent sampler.
//!
//! Labels are character sequences (`Vec<char>`), which serves both the
//! character-level base adaptors (`LearnedChar`, label = one char) and,
//! via `crate::lexicon`, word-level adaptors (label = a word's characters).

use crate::base::BaseDistribution;
use crate::restaurant::Restaurant;
use crate::rng::Rng;
use ahash::AHashMap;
use statrs::function::gamma::ln_gamma;

#[derive(Debug, Clone)]
pub struct PYAdaptor<B: BaseDistribution> {
    pub base: B,
    pub a: f64,
    pub b: f64,
    m: u64,
    n: u64,
    restaurants: AHashMap<Vec<char>, Restaurant>,
    rng: Rng,
}

impl<B: BaseDistribution> PYAdaptor<B> {
    pub fn new(base: B, a: f64, b: f64) -> Self {
        Self {
            base,
            a,
            b,
            m: 0,
            n: 0,
            restaurants: AHashMap::new(),
            rng: Rng::from_seed(0x5eed),
        }
    }

    pub fn with_seed(base: B, a: f64, b: f64, seed: u64) -> Self {
        let mut s = Self::new(base, a, b);
        s.rng = Rng::from_seed(seed);
        s
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn n_label(&self, v: &[char]) -> u64 {
        self.restaurants.get(v).map(|r| r.n()).unwrap_or(0)
    }

    pub fn m_label(&self, v: &[char]) -> u64 {
        self.restaurants.get(v).map(|r| r.m()).unwrap_or(0)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Vec<char>> {
        self.restaurants.keys()
    }

    /// `P(v) = max(0, n_v - m_v*a)/(n+b) + (m*a+b)/(n+b) * P_base(v)`.
    pub fn predictive(&self, v: &[char]) -> f64 {
        let n_v = self.n_label(v) as f64;
        let m_v = self.m_label(v) as f64;
        let w_old = (n_v - m_v * self.a).max(0.0);
        let w_new = (self.m as f64 * self.a + self.b) * self.base.prob(v);
        (w_old + w_new) / (self.n as f64 + self.b)
    }

    /// Decompose the predictive mass into "reuse an existing table" vs
    /// "start a new table" weights, before normalizing by `n + b`. Exposed
    /// for samplers that need the table-level choice itself (e.g. an
    /// adaptor grammar's top-down sampler deciding whether to recurse into
    /// the base distribution) rather than just the combined predictive
    /// probability `seat`/`predictive` return.
    pub fn reuse_weight(&self, v: &[char]) -> (f64, f64) {
        let n_v = self.n_label(v) as f64;
        let m_v = self.m_label(v) as f64;
        let w_old = (n_v - m_v * self.a).max(0.0);
        let w_new = (self.m as f64 * self.a + self.b) * self.base.prob(v);
        (w_old, w_new)
    }

    /// Seat a customer under label `v`, returning the predictive probability
    /// of `v` *before* this seating (per the spec: "return ... as the
    /// predictive probability under the pre-update state").
    pub fn seat(&mut self, v: &[char]) -> f64 {
        let n_v = self.n_label(v) as f64;
        let m_v = self.m_label(v) as f64;
        let w_old = (n_v - m_v * self.a).max(0.0);
        let w_new = (self.m as f64 * self.a + self.b) * self.base.prob(v);
        let total = w_old + w_new;
        let pred = total / (self.n as f64 + self.b);

        let r = self.rng.uniform(total);
        if r < w_old && self.restaurants.contains_key(v) {
            let restaurant = self.restaurants.get_mut(v).unwrap();
            restaurant.seat_existing_table(r, self.a);
        } else {
            let restaurant = self.restaurants.entry(v.to_vec()).or_insert_with(Restaurant::new);
            restaurant.seat_new_table();
            self.m += 1;
            self.base.insert(v);
        }
        self.n += 1;
        pred
    }

    /// Unseat a customer under label `v`; erases the label entry if its
    /// restaurant becomes empty.
    pub fn unseat(&mut self, v: &[char]) {
        let n_v = self.n_label(v);
        debug_assert!(n_v > 0, "unseat called on label with no customers");
        let r = self.rng.uniform(n_v as f64);
        let new_size = {
            let restaurant = self.restaurants.get_mut(v).expect("unseat: unknown label");
            restaurant.unseat(r)
        };
        if new_size == 0 {
            self.m -= 1;
            self.base.erase(v);
        }
        if self.restaurants.get(v).map(|r| r.is_empty()).unwrap_or(false) {
            self.restaurants.remove(v);
        }
        self.n -= 1;
    }

    /// Forget-rate primitive: erase an entire type (all its customers and
    /// tables) regardless of the normal one-customer-at-a-time unseat path.
    pub fn erase_type(&mut self, v: &[char]) {
        if let Some(restaurant) = self.restaurants.remove(v) {
            self.n -= restaurant.n();
            self.m -= restaurant.m();
            self.base.erase(v);
        }
    }

    /// Forget-rate primitive: erase a single token (one customer) of `v`,
    /// equivalent to `unseat` but named for the forget-policy call sites.
    pub fn erase_token(&mut self, v: &[char]) {
        self.unseat(v);
    }

    /// `sum_tables(lgamma(k-a) - lgamma(1-a)) + (a>0 ? m*ln(a) + lgamma(m+b/a) - lgamma(b/a) : m*ln(b)) - (lgamma(n+b) - lgamma(b))`.
    pub fn log_prob(&self) -> f64 {
        let tables_term: f64 = self
            .restaurants
            .values()
            .map(|r| r.log_prob_tables(self.a))
            .sum();

        let concentration_term = if self.a > 0.0 {
            (self.m as f64) * self.a.ln() + ln_gamma(self.m as f64 + self.b / self.a)
                - ln_gamma(self.b / self.a)
        } else {
            (self.m as f64) * self.b.ln()
        };

        tables_term + concentration_term - (ln_gamma(self.n as f64 + self.b) - ln_gamma(self.b))
    }

    pub fn sanity_check(&self) -> Result<(), String> {
        let mut total = 0u64;
        for (v, r) in &self.restaurants {
            r.sanity_check().map_err(|e| format!("label {v:?}: {e}"))?;
            if r.is_empty() {
                return Err(format!("label {v:?} has an empty restaurant"));
            }
            total += r.n();
        }
        if total != self.n {
            return Err(format!("sum(n_label) ({total}) != n ({})", self.n));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::GeometricChar;

    fn key(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn predictive_is_finite_and_in_unit_interval() {
        let base = GeometricChar::new(0.3, 4);
        let mut ad = PYAdaptor::new(base, 0.0, 1.0);
        for _ in 0..20 {
            ad.seat(&key("cat"));
            ad.seat(&key("dog"));
        }
        let p = ad.predictive(&key("cat"));
        assert!(p.is_finite());
        assert!(p > 0.0 && p <= 1.0);
    }

    #[test]
    fn seat_unseat_identity() {
        let base = GeometricChar::new(0.3, 4);
        let mut ad = PYAdaptor::new(base, 0.3, 1.0);
        for _ in 0..10 {
            ad.seat(&key("cat"));
        }
        for _ in 0..7 {
            ad.seat(&key("dog"));
        }
        let n_before = ad.n();
        let m_before = ad.m();
        let n_cat_before = ad.n_label(&key("cat"));

        ad.unseat(&key("cat"));
        ad.seat(&key("cat"));

        assert_eq!(ad.n(), n_before);
        // m may differ transiently only if the unseated customer happened
        // to be the table-clearing one and the reseat created a new table;
        // for n=10 tables are near-certainly shared, so check via sanity.
        ad.sanity_check().unwrap();
        assert_eq!(ad.n_label(&key("cat")), n_cat_before);
        let _ = m_before;
    }

    #[test]
    fn unseat_removes_empty_label() {
        let base = GeometricChar::new(0.3, 4);
        let mut ad = PYAdaptor::new(base, 0.0, 1.0);
        ad.seat(&key("x"));
        assert!(ad.labels().any(|l| l == &key("x")));
        ad.unseat(&key("x"));
        assert!(!ad.labels().any(|l| l == &key("x")));
        ad.sanity_check().unwrap();
    }

    #[test]
    fn log_prob_is_finite() {
        let base = GeometricChar::new(0.3, 4);
        let mut ad = PYAdaptor::new(base, 0.2, 1.0);
        for _ in 0..30 {
            ad.seat(&key("a"));
            ad.seat(&key("b"));
            ad.seat(&key("c"));
        }
        assert!(ad.log_prob().is_finite());
    }
}
