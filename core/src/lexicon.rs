//! Unigram and bigram word lexicons over a shared character base.
//!
//! `BigramLexicon` keeps a *single* owned `UnigramLexicon` and a map of
//! per-context restaurants; rather than each context holding its own
//! pointer back to that unigram (which Design Notes §9 flags as a
//! shared-ownership trap to avoid), every per-context operation takes the
//! unigram as an explicit `&mut` parameter — the Rust realization of
//! "explicit borrowed base references ... passed explicitly keeps tests
//! hermetic" from the same section.

use crate::adaptor::PYAdaptor;
use crate::base::BaseDistribution;
use crate::restaurant::Restaurant;
use crate::rng::Rng;
use ahash::AHashMap;

/// Single PYAdaptor over a character-sequence base.
#[derive(Debug, Clone)]
pub struct UnigramLexicon<B: BaseDistribution> {
    adaptor: PYAdaptor<B>,
    /// Distinct word types ever seated, kept only to drive the MBDP scorer
    /// (glossary: "an alternative word-probability formula used when
    /// `do_mbdp` is enabled").
    do_mbdp: bool,
}

impl<B: BaseDistribution> UnigramLexicon<B> {
    pub fn new(base: B, a: f64, b: f64) -> Self {
        Self {
            adaptor: PYAdaptor::new(base, a, b),
            do_mbdp: false,
        }
    }

    pub fn with_mbdp(mut self, enabled: bool) -> Self {
        self.do_mbdp = enabled;
        self
    }

    /// Whether the Viterbi/tree evaluation call sites should score words
    /// with `mbdp_prob` instead of `predictive`. `predictive` itself never
    /// branches on this — see `mbdp_prob`'s docs.
    pub fn do_mbdp(&self) -> bool {
        self.do_mbdp
    }

    pub fn n(&self) -> u64 {
        self.adaptor.n()
    }

    pub fn m(&self) -> u64 {
        self.adaptor.m()
    }

    pub fn n_label(&self, w: &[char]) -> u64 {
        self.adaptor.n_label(w)
    }

    /// Restaurant-process predictive probability. Never branches on
    /// `do_mbdp` — only `maximize_unigram`/`sample_tree_unigram` consult
    /// `mbdp_prob` directly, matching `Sentence::maximize`/`sample_tree`
    /// being the only call sites that pass `do_mbdp` down to `mbdp_prob`
    /// in the original; the per-boundary flip conditional never does.
    pub fn predictive(&self, w: &[char]) -> f64 {
        self.adaptor.predictive(w)
    }

    /// `Sentence::mbdp_prob` (`Sentence.cc:816-847`): a previously-seen
    /// word of `word_tokens` occurrences (including this one, plus the
    /// always-counted utterance-boundary tokens) scores
    /// `((word_tokens-1)/word_tokens)^2 * word_tokens/total_tokens`; a
    /// novel word scores `(6/pi^2) * (types/total_tokens) * l_frac^2 *
    /// P_base(word)/(1 - l_frac*total_base)`, where `l_frac =
    /// (types-1)/types` and `total_base` sums `P_base` over every type
    /// already in the lexicon plus `word` itself.
    pub fn mbdp_prob(&self, w: &[char], nsentences: u64) -> f64 {
        let total_tokens = self.adaptor.n() as f64 + nsentences as f64 + 2.0;
        let word_tokens = self.adaptor.n_label(w) as f64 + 1.0;
        if word_tokens > 1.0 {
            let seen = (word_tokens - 1.0) / word_tokens;
            seen * seen * word_tokens / total_tokens
        } else {
            let types = self.adaptor.labels().count() as f64 + 2.0;
            let pi = std::f64::consts::PI;
            let l_frac = (types - 1.0) / types;
            let mut total_base = self.adaptor.base.prob(w);
            for label in self.adaptor.labels() {
                total_base += self.adaptor.base.prob(label);
            }
            let mut prob = (6.0 / pi / pi) * (types / total_tokens) * l_frac * l_frac;
            prob *= self.adaptor.base.prob(w) / (1.0 - l_frac * total_base);
            prob
        }
    }

    pub fn seat(&mut self, w: &[char]) -> f64 {
        self.adaptor.seat(w)
    }

    pub fn unseat(&mut self, w: &[char]) {
        self.adaptor.unseat(w)
    }

    pub fn erase_type(&mut self, w: &[char]) {
        self.adaptor.erase_type(w)
    }

    pub fn erase_token(&mut self, w: &[char]) {
        self.adaptor.erase_token(w)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Vec<char>> {
        self.adaptor.labels()
    }

    pub fn log_prob(&self) -> f64 {
        self.adaptor.log_prob()
    }

    pub fn pya(&self) -> f64 {
        self.adaptor.a
    }

    pub fn pyb(&self) -> f64 {
        self.adaptor.b
    }

    pub fn set_pya(&mut self, a: f64) {
        self.adaptor.a = a;
    }

    pub fn set_pyb(&mut self, b: f64) {
        self.adaptor.b = b;
    }

    pub fn sanity_check(&self) -> Result<(), String> {
        self.adaptor.sanity_check()
    }
}

/// A per-context restaurant set, addressed against an externally-supplied
/// unigram base rather than storing a pointer to one (see module docs).
#[derive(Debug, Clone)]
struct ContextAdaptor {
    a: f64,
    b: f64,
    m: u64,
    n: u64,
    restaurants: AHashMap<Vec<char>, Restaurant>,
    rng: Rng,
}

impl ContextAdaptor {
    fn new(a: f64, b: f64, seed: u64) -> Self {
        Self {
            a,
            b,
            m: 0,
            n: 0,
            restaurants: AHashMap::new(),
            rng: Rng::from_seed(seed),
        }
    }

    fn n_label(&self, v: &[char]) -> u64 {
        self.restaurants.get(v).map(|r| r.n()).unwrap_or(0)
    }

    fn m_label(&self, v: &[char]) -> u64 {
        self.restaurants.get(v).map(|r| r.m()).unwrap_or(0)
    }

    fn predictive<B: BaseDistribution>(&self, v: &[char], base: &UnigramLexicon<B>) -> f64 {
        let n_v = self.n_label(v) as f64;
        let m_v = self.m_label(v) as f64;
        let w_old = (n_v - m_v * self.a).max(0.0);
        let w_new = (self.m as f64 * self.a + self.b) * base.predictive(v);
        (w_old + w_new) / (self.n as f64 + self.b)
    }

    fn seat<B: BaseDistribution>(&mut self, v: &[char], base: &mut UnigramLexicon<B>) -> f64 {
        let n_v = self.n_label(v) as f64;
        let m_v = self.m_label(v) as f64;
        let w_old = (n_v - m_v * self.a).max(0.0);
        let w_new = (self.m as f64 * self.a + self.b) * base.predictive(v);
        let total = w_old + w_new;
        let pred = total / (self.n as f64 + self.b);

        let r = self.rng.uniform(total);
        if r < w_old && self.restaurants.contains_key(v) {
            self.restaurants.get_mut(v).unwrap().seat_existing_table(r, self.a);
        } else {
            self.restaurants.entry(v.to_vec()).or_insert_with(Restaurant::new).seat_new_table();
            self.m += 1;
            base.seat(v);
        }
        self.n += 1;
        pred
    }

    fn unseat<B: BaseDistribution>(&mut self, v: &[char], base: &mut UnigramLexicon<B>) {
        let n_v = self.n_label(v);
        let r = self.rng.uniform(n_v as f64);
        let new_size = self.restaurants.get_mut(v).expect("unknown context word").unseat(r);
        if new_size == 0 {
            self.m -= 1;
            base.unseat(v);
        }
        if self.restaurants.get(v).map(|r| r.is_empty()).unwrap_or(false) {
            self.restaurants.remove(v);
        }
        self.n -= 1;
    }

    fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// `previous_word -> PYAdaptor(unigram)`, all contexts sharing the same
/// unigram lexicon as their base, plus a prototype used to size new
/// contexts' hyperparameters.
#[derive(Debug, Clone)]
pub struct BigramLexicon<B: BaseDistribution> {
    unigram: UnigramLexicon<B>,
    contexts: AHashMap<Vec<char>, ContextAdaptor>,
    a: f64,
    b: f64,
    seed_counter: u64,
}

impl<B: BaseDistribution> BigramLexicon<B> {
    pub fn new(unigram: UnigramLexicon<B>, a: f64, b: f64) -> Self {
        Self {
            unigram,
            contexts: AHashMap::new(),
            a,
            b,
            seed_counter: 1,
        }
    }

    pub fn unigram(&self) -> &UnigramLexicon<B> {
        &self.unigram
    }

    pub fn unigram_mut(&mut self) -> &mut UnigramLexicon<B> {
        &mut self.unigram
    }

    /// `P(w2 | w1)`, falling back to the unigram base when `w1` is a
    /// previously-unseen context.
    pub fn predictive(&self, w1: &[char], w2: &[char]) -> f64 {
        match self.contexts.get(w1) {
            Some(ctx) => ctx.predictive(w2, &self.unigram),
            None => self.unigram.predictive(w2),
        }
    }

    pub fn seat(&mut self, w1: &[char], w2: &[char]) -> f64 {
        self.seed_counter += 1;
        let seed = self.seed_counter;
        let ctx = self
            .contexts
            .entry(w1.to_vec())
            .or_insert_with(|| ContextAdaptor::new(self.a, self.b, seed));
        ctx.seat(w2, &mut self.unigram)
    }

    pub fn unseat(&mut self, w1: &[char], w2: &[char]) {
        let ctx = self.contexts.get_mut(w1).expect("unseat: unknown context");
        ctx.unseat(w2, &mut self.unigram);
        if ctx.is_empty() {
            self.contexts.remove(w1);
        }
    }

    pub fn contexts_len(&self) -> usize {
        self.contexts.len()
    }

    pub fn sanity_check(&self) -> Result<(), String> {
        self.unigram.sanity_check()?;
        for (w1, ctx) in &self.contexts {
            if ctx.is_empty() {
                return Err(format!("context {w1:?} is empty but still present"));
            }
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
    fn unigram_seat_unseat_identity() {
        let base = GeometricChar::new(0.3, 4);
        let mut lex = UnigramLexicon::new(base, 0.0, 1.0);
        for _ in 0..5 {
            lex.seat(&key("cat"));
        }
        let n_before = lex.n();
        lex.unseat(&key("cat"));
        lex.seat(&key("cat"));
        assert_eq!(lex.n(), n_before);
        lex.sanity_check().unwrap();
    }

    #[test]
    fn bigram_contexts_share_unigram_base() {
        let base = GeometricChar::new(0.3, 4);
        let unigram = UnigramLexicon::new(base, 0.0, 1.0);
        let mut big = BigramLexicon::new(unigram, 0.0, 1.0);

        big.seat(&key("the"), &key("cat"));
        big.seat(&key("a"), &key("cat"));
        // Both contexts seated "cat" into the same shared unigram.
        assert_eq!(big.unigram().n_label(&key("cat")), 2);

        big.sanity_check().unwrap();
    }

    #[test]
    fn bigram_context_erased_when_empty() {
        let base = GeometricChar::new(0.3, 4);
        let unigram = UnigramLexicon::new(base, 0.0, 1.0);
        let mut big = BigramLexicon::new(unigram, 0.0, 1.0);
        big.seat(&key("the"), &key("cat"));
        assert_eq!(big.contexts_len(), 1);
        big.unseat(&key("the"), &key("cat"));
        assert_eq!(big.contexts_len(), 0);
        assert_eq!(big.unigram().n(), 0);
    }

    #[test]
    fn do_mbdp_flag_does_not_affect_predictive() {
        let base = GeometricChar::new(0.3, 4);
        let mut plain = UnigramLexicon::new(base.clone(), 0.0, 1.0);
        let mut flagged = UnigramLexicon::new(base, 0.0, 1.0).with_mbdp(true);
        for lex in [&mut plain, &mut flagged] {
            lex.seat(&key("cat"));
            lex.seat(&key("cat"));
        }
        assert!(flagged.do_mbdp());
        assert!(!plain.do_mbdp());
        assert_eq!(plain.predictive(&key("cat")), flagged.predictive(&key("cat")));
    }

    #[test]
    fn mbdp_prob_scores_seen_and_novel_words_differently() {
        let base = GeometricChar::new(0.3, 4);
        let mut lex = UnigramLexicon::new(base, 0.0, 1.0);
        lex.seat(&key("cat"));
        lex.seat(&key("cat"));
        let seen = lex.mbdp_prob(&key("cat"), 1);
        let novel = lex.mbdp_prob(&key("dog"), 1);
        assert!(seen.is_finite() && seen > 0.0);
        assert!(novel.is_finite() && novel > 0.0);
        assert_ne!(seen, novel);
    }
}
