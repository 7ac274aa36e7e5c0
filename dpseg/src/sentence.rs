//! A single utterance's boundary vector plus the lexicon (un)seating and
//! flip-sampling logic that operates on it.
//!
//! Ported from `Sentence.cc`'s `prob_boundary`/`surrounding_boundaries`
//! arithmetic. The source pads each sentence with a synthetic character at
//! both ends so a "previous word" always exists even at sentence start;
//! this port has no such padding, so the empty character sequence `&[]`
//! plays that role directly wherever a bigram context would otherwise run
//! off the left edge — the same end-of-utterance convention `base.rs`
//! already uses for `GeometricChar::prob(&[])`.

use wordseg_core::boundary::BoundaryVector;
use wordseg_core::rng::Rng;
use wordseg_core::{BaseDistribution, BigramLexicon, UnigramLexicon};

/// An utterance undergoing segmentation: its characters plus the boundary
/// vector the samplers toggle.
#[derive(Debug, Clone)]
pub struct Sentence {
    chars: Vec<char>,
    boundaries: BoundaryVector,
}

impl Sentence {
    pub fn new(chars: Vec<char>, gold_boundaries: Vec<usize>, init_with_gold: bool) -> Self {
        let n = chars.len();
        let boundaries = BoundaryVector::new(n, gold_boundaries, init_with_gold);
        Self { chars, boundaries }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn boundaries(&self) -> &BoundaryVector {
        &self.boundaries
    }

    /// Direct boundary mutation for the DP-based samplers (Viterbi, tree),
    /// which compute a whole segmentation at once rather than flipping one
    /// boundary at a time.
    pub(crate) fn set_boundary(&mut self, i: usize, value: bool) {
        self.boundaries.set(i, value);
    }

    fn word_at(&self, left: usize, right: usize) -> &[char] {
        &self.chars[left..right]
    }

    /// The boundary positions that bound words, i.e. `0`, every currently
    /// set boundary, and `n`, in order.
    fn word_boundary_positions(&self) -> Vec<usize> {
        let n = self.boundaries.n();
        let mut positions = vec![0];
        for &i in self.boundaries.possible_boundaries() {
            if self.boundaries.get(i) {
                positions.push(i);
            }
        }
        positions.push(n);
        positions
    }

    pub fn insert_words_unigram<B: BaseDistribution>(&self, lex: &mut UnigramLexicon<B>) {
        let positions = self.word_boundary_positions();
        for w in positions.windows(2) {
            lex.seat(self.word_at(w[0], w[1]));
        }
    }

    pub fn erase_words_unigram<B: BaseDistribution>(&self, lex: &mut UnigramLexicon<B>) {
        let positions = self.word_boundary_positions();
        for w in positions.windows(2) {
            lex.unseat(self.word_at(w[0], w[1]));
        }
    }

    pub fn insert_words_bigram<B: BaseDistribution>(&self, lex: &mut BigramLexicon<B>) {
        let positions = self.word_boundary_positions();
        let mut prev: Vec<char> = Vec::new();
        for w in positions.windows(2) {
            let word = self.word_at(w[0], w[1]);
            lex.seat(&prev, word);
            prev = word.to_vec();
        }
    }

    pub fn erase_words_bigram<B: BaseDistribution>(&self, lex: &mut BigramLexicon<B>) {
        let positions = self.word_boundary_positions();
        let mut prev: Vec<char> = Vec::new();
        for w in positions.windows(2) {
            let word = self.word_at(w[0], w[1]);
            lex.unseat(&prev, word);
            prev = word.to_vec();
        }
    }

    /// The two boundaries preceding `i` and the two following it, walking
    /// the current `boundaries` bit vector outward from `i`.
    fn surrounding_boundaries(&self, i: usize) -> (usize, usize, usize, usize) {
        let n = self.boundaries.n();
        assert!(i > 0 && i < n, "surrounding_boundaries: i out of range");
        let mut i1 = i - 1;
        while !self.boundaries.get(i1) {
            i1 -= 1;
        }
        let i0 = if i1 == 0 {
            0
        } else {
            let mut k = i1 - 1;
            while !self.boundaries.get(k) {
                k -= 1;
            }
            k
        };
        let mut i2 = i + 1;
        while !self.boundaries.get(i2) {
            i2 += 1;
        }
        let i3 = if i2 == n {
            n
        } else {
            let mut k = i2 + 1;
            while k < n && !self.boundaries.get(k) {
                k += 1;
            }
            k
        };
        (i0, i1, i2, i3)
    }

    /// `P(boundary at i)` under the unigram model, per `prob_boundary(i1,
    /// i, i2, Unigrams, temp)`: `p_continue` down-weights splitting a word
    /// in two by the corpus-wide rate at which words end a sentence.
    fn prob_boundary_unigram<B: BaseDistribution>(
        &self,
        i1: usize,
        i: usize,
        i2: usize,
        lex: &UnigramLexicon<B>,
        nsentences: u64,
        aeos: f64,
        temperature: f64,
    ) -> f64 {
        let ntokens = lex.n() as f64;
        let p_continue = (ntokens - nsentences as f64 + 1.0 + aeos / 2.0) / (ntokens + 1.0 + aeos);
        let mut p_boundary = lex.predictive(self.word_at(i1, i)) * lex.predictive(self.word_at(i, i2)) * p_continue;
        let mut p_noboundary = lex.predictive(self.word_at(i1, i2));
        if temperature != 1.0 {
            p_boundary = p_boundary.powf(1.0 / temperature);
            p_noboundary = p_noboundary.powf(1.0 / temperature);
        }
        p_boundary / (p_boundary + p_noboundary)
    }

    fn p_bigram<B: BaseDistribution>(&self, i0: usize, i1: usize, i2: usize, lex: &BigramLexicon<B>) -> f64 {
        let context: Vec<char> = self.word_at(i0, i1).to_vec();
        lex.predictive(&context, self.word_at(i1, i2))
    }

    /// `prob_boundary(i0, i1, i, i2, i3, Bigrams, temp)`.
    fn prob_boundary_bigram<B: BaseDistribution>(
        &self,
        i0: usize,
        i1: usize,
        i: usize,
        i2: usize,
        i3: usize,
        lex: &BigramLexicon<B>,
        temperature: f64,
    ) -> f64 {
        let mut p_boundary =
            self.p_bigram(i0, i1, i, lex) * self.p_bigram(i1, i, i2, lex) * self.p_bigram(i, i2, i3, lex);
        let mut p_noboundary = self.p_bigram(i0, i1, i2, lex) * self.p_bigram(i1, i2, i3, lex);
        if temperature != 1.0 {
            p_boundary = p_boundary.powf(1.0 / temperature);
            p_noboundary = p_noboundary.powf(1.0 / temperature);
        }
        p_boundary / (p_boundary + p_noboundary)
    }

    /// Gibbs-resample every possible boundary once, under the unigram
    /// model. Assumes this sentence's words have already been erased from
    /// `lex` (batch-mode convention). Returns the number of boundaries that
    /// changed value.
    pub fn sample_by_flips_unigram<B: BaseDistribution>(
        &mut self,
        lex: &mut UnigramLexicon<B>,
        nsentences: u64,
        aeos: f64,
        temperature: f64,
        rng: &mut Rng,
    ) -> u32 {
        let mut nchanged = 0;
        let positions: Vec<usize> = self.boundaries.possible_boundaries().to_vec();
        for i in positions {
            if self.sample_one_flip_unigram(lex, nsentences, aeos, temperature, i, rng) {
                nchanged += 1;
            }
        }
        nchanged
    }

    /// Resample a single boundary position `i`, under the unigram model.
    /// The single-boundary counterpart `sample_by_flips_unigram` sweeps the
    /// whole sentence with; factored out so the decayed-MCMC sampler
    /// (`Sentence::sample_one_flip` in `Sentence.cc`) can resample just the
    /// one boundary its corpus-wide selection picked. Returns whether the
    /// boundary's value changed.
    pub fn sample_one_flip_unigram<B: BaseDistribution>(
        &mut self,
        lex: &mut UnigramLexicon<B>,
        nsentences: u64,
        aeos: f64,
        temperature: f64,
        i: usize,
        rng: &mut Rng,
    ) -> bool {
        let (_, i1, i2, _) = self.surrounding_boundaries(i);
        if self.boundaries.get(i) {
            lex.unseat(self.word_at(i1, i));
            lex.unseat(self.word_at(i, i2));
        } else {
            lex.unseat(self.word_at(i1, i2));
        }

        let pb = self.prob_boundary_unigram(i1, i, i2, lex, nsentences, aeos, temperature);
        let new_boundary = pb > rng.uniform01();
        if new_boundary {
            lex.seat(self.word_at(i1, i));
            lex.seat(self.word_at(i, i2));
        } else {
            lex.seat(self.word_at(i1, i2));
        }
        let changed = new_boundary != self.boundaries.get(i);
        self.boundaries.set(i, new_boundary);
        changed
    }

    /// Bigram analogue of `sample_by_flips_unigram`.
    pub fn sample_by_flips_bigram<B: BaseDistribution>(
        &mut self,
        lex: &mut BigramLexicon<B>,
        temperature: f64,
        rng: &mut Rng,
    ) -> u32 {
        let mut nchanged = 0;
        let positions: Vec<usize> = self.boundaries.possible_boundaries().to_vec();
        for i in positions {
            let (i0, i1, i2, i3) = self.surrounding_boundaries(i);
            if self.boundaries.get(i) {
                self.erase_triple(i0, i1, i, lex);
                self.erase_triple(i1, i, i2, lex);
                self.erase_triple(i, i2, i3, lex);
            } else {
                self.erase_triple(i0, i1, i2, lex);
                self.erase_triple(i1, i2, i3, lex);
            }

            let pb = self.prob_boundary_bigram(i0, i1, i, i2, i3, lex, temperature);
            let new_boundary = pb > rng.uniform01();
            if new_boundary {
                self.insert_triple(i0, i1, i, lex);
                self.insert_triple(i1, i, i2, lex);
                self.insert_triple(i, i2, i3, lex);
            } else {
                self.insert_triple(i0, i1, i2, lex);
                self.insert_triple(i1, i2, i3, lex);
            }
            if new_boundary != self.boundaries.get(i) {
                nchanged += 1;
            }
            self.boundaries.set(i, new_boundary);
        }
        nchanged
    }

    fn insert_triple<B: BaseDistribution>(&self, i0: usize, i1: usize, i2: usize, lex: &mut BigramLexicon<B>) {
        let context = self.word_at(i0, i1).to_vec();
        lex.seat(&context, self.word_at(i1, i2));
    }

    fn erase_triple<B: BaseDistribution>(&self, i0: usize, i1: usize, i2: usize, lex: &mut BigramLexicon<B>) {
        let context = self.word_at(i0, i1).to_vec();
        lex.unseat(&context, self.word_at(i1, i2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordseg_core::base::GeometricChar;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn surrounding_boundaries_finds_nearest_set_bits() {
        let mut s = Sentence::new(chars("thecatsat"), vec![], false);
        s.boundaries.set(3, true);
        s.boundaries.set(6, true);
        let (i0, i1, i2, i3) = s.surrounding_boundaries(4);
        assert_eq!((i0, i1, i2, i3), (0, 3, 6, 9));
    }

    #[test]
    fn flip_sampling_preserves_lexicon_consistency() {
        let base = GeometricChar::new(0.2, 26);
        let mut lex = UnigramLexicon::new(base, 0.0, 1.0);
        let mut s = Sentence::new(chars("thecat"), vec![3], true);
        s.insert_words_unigram(&mut lex);
        lex.sanity_check().unwrap();

        s.erase_words_unigram(&mut lex);
        let mut rng = Rng::from_seed(1);
        s.sample_by_flips_unigram(&mut lex, 1, 2.0, 1.0, &mut rng);
        lex.sanity_check().unwrap();
    }

    #[test]
    fn bigram_flip_sampling_preserves_lexicon_consistency() {
        let base = GeometricChar::new(0.2, 26);
        let unigram = UnigramLexicon::new(base, 0.0, 1.0);
        let mut lex = BigramLexicon::new(unigram, 0.0, 1.0);
        let mut s = Sentence::new(chars("thecat"), vec![3], true);
        s.insert_words_bigram(&mut lex);
        lex.sanity_check().unwrap();

        s.erase_words_bigram(&mut lex);
        let mut rng = Rng::from_seed(2);
        s.sample_by_flips_bigram(&mut lex, 1.0, &mut rng);
        lex.sanity_check().unwrap();
    }
}
