//! Viterbi (MAP) segmentation: the best-scoring boundary vector under the
//! unigram lexicon, found by dynamic programming rather than sampling.
//!
//! Ported from `Sentence::maximize(Unigrams&, ...)`: a DP over the
//! possible-boundary positions, `best[j] = max over i < j of
//! P(word_at(i,j)) * p_continue * best[i]`, backtracked to recover the
//! argmax segmentation. Assumes this sentence's own words have already
//! been erased from `lex` (the batch-mode convention every sampler here
//! follows).

use crate::sentence::Sentence;
use wordseg_core::{BaseDistribution, UnigramLexicon};

impl Sentence {
    /// Replace this sentence's boundaries with the Viterbi-optimal
    /// unigram segmentation and return the achieved log-probability.
    pub fn maximize_unigram<B: BaseDistribution>(
        &mut self,
        lex: &UnigramLexicon<B>,
        nsentences: u64,
        aeos: f64,
        temperature: f64,
    ) -> f64 {
        let n = self.chars().len();
        let ntokens = lex.n() as f64;
        let n_branch = ntokens - nsentences as f64;
        let p_continue = ((n_branch + aeos / 2.0) / (ntokens + aeos)).powf(1.0 / temperature);

        // positions 0..=n are candidate cut points.
        let mut best = vec![0.0f64; n + 1];
        let mut back = vec![0usize; n + 1];
        best[0] = 1.0;
        for j in 1..=n {
            for i in 0..j {
                let word = &self.chars()[i..j];
                let p_word = if lex.do_mbdp() {
                    lex.mbdp_prob(word, nsentences)
                } else {
                    lex.predictive(word)
                }
                .powf(1.0 / temperature);
                let score = p_word * p_continue * best[i];
                if score > best[j] {
                    best[j] = score;
                    back[j] = i;
                }
            }
        }

        let mut cuts = Vec::new();
        let mut j = n;
        while j > 0 {
            let i = back[j];
            if i > 0 {
                cuts.push(i);
            }
            j = i;
        }
        cuts.sort_unstable();
        let positions: Vec<usize> = self.boundaries().possible_boundaries().to_vec();
        for i in positions {
            let want = cuts.contains(&i);
            if want != self.boundaries().get(i) {
                self.set_boundary(i, want);
            }
        }
        best[n].ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::Sentence;
    use wordseg_core::base::GeometricChar;

    #[test]
    fn maximize_produces_finite_log_prob() {
        let base = GeometricChar::new(0.3, 26);
        let mut lex = UnigramLexicon::new(base, 0.0, 1.0);
        for w in ["the", "cat", "sat"] {
            lex.seat(&w.chars().collect::<Vec<_>>());
        }
        let mut s = Sentence::new("thecatsat".chars().collect(), vec![], false);
        let lp = s.maximize_unigram(&lex, 1, 2.0, 1.0);
        assert!(lp.is_finite());
        s.boundaries().sanity_check().unwrap();
    }
}
