//! Segmentation scoring: token/boundary/lexicon precision-recall-F, plus
//! the supplemented two-alternative-forced-choice item scorer.
//!
//! Grounded on the `Scoring`/`TestSet` accumulation pattern described in
//! the original `wordseg` evaluation tooling: boundary accuracy counts
//! interior boundary positions, token accuracy counts whole word spans,
//! and lexicon accuracy counts distinct word types.

use crate::boundary::BoundaryVector;
use ahash::AHashSet;
use std::collections::HashSet;

/// Precision/recall/F1 accumulator, shared by all three scoring axes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrfCounts {
    pub true_positive: u64,
    pub hypothesis_total: u64,
    pub gold_total: u64,
}

impl PrfCounts {
    pub fn precision(&self) -> f64 {
        if self.hypothesis_total == 0 {
            0.0
        } else {
            self.true_positive as f64 / self.hypothesis_total as f64
        }
    }

    pub fn recall(&self) -> f64 {
        if self.gold_total == 0 {
            0.0
        } else {
            self.true_positive as f64 / self.gold_total as f64
        }
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    fn merge(&mut self, other: PrfCounts) {
        self.true_positive += other.true_positive;
        self.hypothesis_total += other.hypothesis_total;
        self.gold_total += other.gold_total;
    }
}

/// Running totals over a corpus, broken down by axis.
#[derive(Debug, Clone, Default)]
pub struct Scoring {
    pub boundary: PrfCounts,
    pub token: PrfCounts,
    lexicon_hyp: AHashSet<Vec<char>>,
    lexicon_gold: AHashSet<Vec<char>>,
    lexicon_both: AHashSet<Vec<char>>,
}

impl Scoring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one sentence's hypothesis boundaries against its gold
    /// boundaries. `chars` is the sentence's text, used to build lexicon
    /// word types.
    pub fn score_sentence(&mut self, chars: &[char], hypothesis: &BoundaryVector, gold_truth: &[usize]) {
        let hyp_interior: HashSet<usize> = hypothesis
            .possible_boundaries()
            .iter()
            .copied()
            .filter(|&i| hypothesis.get(i))
            .collect();
        let gold_interior: HashSet<usize> = gold_truth.iter().copied().collect();

        self.boundary.merge(PrfCounts {
            true_positive: hyp_interior.intersection(&gold_interior).count() as u64,
            hypothesis_total: hyp_interior.len() as u64,
            gold_total: gold_interior.len() as u64,
        });

        let hyp_spans: HashSet<(usize, usize)> = hypothesis.word_spans().into_iter().collect();
        let gold_spans: HashSet<(usize, usize)> = spans_from_truth(chars.len(), gold_truth).into_iter().collect();

        self.token.merge(PrfCounts {
            true_positive: hyp_spans.intersection(&gold_spans).count() as u64,
            hypothesis_total: hyp_spans.len() as u64,
            gold_total: gold_spans.len() as u64,
        });

        for &(s, e) in &hyp_spans {
            self.lexicon_hyp.insert(chars[s..e].to_vec());
        }
        for &(s, e) in &gold_spans {
            self.lexicon_gold.insert(chars[s..e].to_vec());
        }
    }

    pub fn lexicon_prf(&self) -> PrfCounts {
        let both = self.lexicon_hyp.intersection(&self.lexicon_gold).count() as u64;
        PrfCounts {
            true_positive: both,
            hypothesis_total: self.lexicon_hyp.len() as u64,
            gold_total: self.lexicon_gold.len() as u64,
        }
    }
}

fn spans_from_truth(n: usize, truth: &[usize]) -> Vec<(usize, usize)> {
    let mut bounds: Vec<usize> = vec![0, n];
    bounds.extend(truth.iter().copied());
    bounds.sort_unstable();
    bounds.dedup();
    bounds.windows(2).map(|w| (w[0], w[1])).collect()
}

/// One two-alternative-forced-choice item: a left-context word, and a pair
/// of candidate continuations, one of which is gold.
#[derive(Debug, Clone)]
pub struct TwoAfcItem {
    pub context: Vec<char>,
    pub correct: Vec<char>,
    pub foil: Vec<char>,
}

/// Accuracy over a batch of 2-AFC items, given a scoring function that
/// returns a higher value for the preferred continuation.
pub fn score_two_afc<F>(items: &[TwoAfcItem], mut preference: F) -> f64
where
    F: FnMut(&[char], &[char]) -> f64,
{
    if items.is_empty() {
        return 0.0;
    }
    let correct = items
        .iter()
        .filter(|item| preference(&item.context, &item.correct) >= preference(&item.context, &item.foil))
        .count();
    correct as f64 / items.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn perfect_match_scores_one() {
        let text = chars("thecat");
        let mut b = BoundaryVector::new(text.len(), vec![3], false);
        b.set(3, true);
        let mut scoring = Scoring::new();
        scoring.score_sentence(&text, &b, &[3]);
        assert_eq!(scoring.boundary.f1(), 1.0);
        assert_eq!(scoring.token.f1(), 1.0);
    }

    #[test]
    fn mismatch_lowers_token_f1() {
        let text = chars("thecat");
        let b = BoundaryVector::new(text.len(), vec![3], false); // no boundary inserted
        let mut scoring = Scoring::new();
        scoring.score_sentence(&text, &b, &[3]);
        assert!(scoring.token.f1() < 1.0);
    }

    #[test]
    fn two_afc_prefers_higher_scoring_continuation() {
        let items = vec![TwoAfcItem {
            context: chars("the"),
            correct: chars("cat"),
            foil: chars("xyzzy"),
        }];
        let acc = score_two_afc(&items, |_, w| if w == chars("cat") { 1.0 } else { 0.1 });
        assert_eq!(acc, 1.0);
    }
}
