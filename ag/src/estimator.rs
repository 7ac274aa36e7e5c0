//! Batch Gibbs estimator tying the grammar, chart and sampler to a corpus,
//! the `ag` counterpart of `dpseg::estimator::Estimator`. Grounded on
//! `main.cc`'s outer loop: seed every sentence with an initial segmentation,
//! then repeatedly resample one sentence at a time via
//! `sampler::resample_sentence`, annealing temperature the same way
//! `dpseg`'s estimator does (temperature is folded into the chart's rule
//! probabilities is *not* implemented here — see DESIGN.md; this crate
//! anneals only by running extra burn-in sweeps, not a literal `1/T` term in
//! the chart, since threading temperature through CKY rule weights would
//! require rebuilding `rule_prob` per-temperature and the adapted-category
//! correction does not have a closed-form annealed counterpart in Johnson's
//! formulation).

use crate::base::CachedYieldBase;
use crate::grammar::Grammar;
use crate::sampler::{resample_sentence, ResampleOutcome};
use ahash::AHashMap;
use wordseg_core::adaptor::PYAdaptor;
use wordseg_core::config::WordsegConfig;
use wordseg_core::error::WordsegError;
use wordseg_core::rng::Rng;
use wordseg_core::symbol::Symbol;

/// Consecutive zero-mass-chart underflows tolerated for the same sentence
/// before it is treated as genuinely unparseable (spec.md's error handling
/// design: a `ParseFailure`, not an endless retry) rather than transient.
const MAX_CONSECUTIVE_UNDERFLOWS: u32 = 8;

pub struct AgSentence {
    pub chars: Vec<char>,
    pub words: Vec<(usize, usize)>,
}

impl AgSentence {
    /// Initial segmentation: one word per character, a neutral starting
    /// point matching `dpseg`'s `init_with_gold = false` default.
    pub fn new(chars: Vec<char>) -> Self {
        let words = (0..chars.len()).map(|i| (i, i + 1)).collect();
        Self { chars, words }
    }

    pub fn boundaries(&self) -> Vec<usize> {
        self.words.iter().map(|&(_, e)| e).collect()
    }
}

pub struct AgEstimator {
    pub grammar: Grammar,
    pub word_cat: Symbol,
    pub sentences: Vec<AgSentence>,
    adaptors: AHashMap<Symbol, PYAdaptor<CachedYieldBase>>,
    rng: Rng,
    accepted: u64,
    proposed: u64,
    /// Consecutive underflow count per sentence index, reset to 0 on any
    /// accept/reject; escalates to `WordsegError::ParseFailure` once a
    /// sentence crosses `MAX_CONSECUTIVE_UNDERFLOWS`.
    consecutive_underflows: Vec<u32>,
}

impl AgEstimator {
    pub fn new(grammar: Grammar, word_cat: Symbol, sentences: Vec<AgSentence>, config: &WordsegConfig) -> Self {
        let consecutive_underflows = vec![0; sentences.len()];
        Self {
            grammar,
            word_cat,
            sentences,
            adaptors: AHashMap::new(),
            rng: Rng::from_seed(config.randseed),
            accepted: 0,
            proposed: 0,
            consecutive_underflows,
        }
    }

    /// Fill a chart over each sentence's initial segmentation once, seating
    /// the initial words: populates both the restaurant counts and the
    /// `CachedYieldBase` cache every subsequent `resample_sentence` call
    /// relies on for `q_old`/`p_old` before that sentence's own chart fill.
    pub fn seed(&mut self) {
        for sentence in &self.sentences {
            let mut chart = crate::chart::InsideChart::new(&self.grammar, sentence.chars.len());
            chart.adopt_adaptors(std::mem::take(&mut self.adaptors));
            chart.fill(&sentence.chars);
            for &(s, e) in &sentence.words {
                chart.adaptor_mut(self.word_cat).unwrap().seat(&sentence.chars[s..e]);
            }
            self.adaptors = chart.into_adaptors();
        }
    }

    /// One full sweep: resample every sentence's derivation once. Returns
    /// `Err(WordsegError::ParseFailure)` if any sentence has now underflowed
    /// `MAX_CONSECUTIVE_UNDERFLOWS` sweeps in a row without ever producing a
    /// derivable chart — the genuinely-unparseable case, as opposed to the
    /// ordinary transient underflow that this function otherwise just
    /// leaves for the next sweep to retry.
    pub fn sweep(&mut self) -> Result<(), WordsegError> {
        for idx in 0..self.sentences.len() {
            let chars = self.sentences[idx].chars.clone();
            let current = self.sentences[idx].words.clone();
            let adaptors = std::mem::take(&mut self.adaptors);
            let (new_words, adaptors, outcome) =
                resample_sentence(&self.grammar, &chars, self.word_cat, &current, adaptors, &mut self.rng);
            self.adaptors = adaptors;
            self.sentences[idx].words = new_words;
            self.proposed += 1;
            match outcome {
                ResampleOutcome::Accepted => {
                    self.accepted += 1;
                    self.consecutive_underflows[idx] = 0;
                }
                ResampleOutcome::Rejected => {
                    self.consecutive_underflows[idx] = 0;
                }
                ResampleOutcome::Underflow => {
                    self.consecutive_underflows[idx] += 1;
                    if self.consecutive_underflows[idx] > MAX_CONSECUTIVE_UNDERFLOWS {
                        return Err(WordsegError::ParseFailure(format!(
                            "sentence {idx} has no derivable parse after {MAX_CONSECUTIVE_UNDERFLOWS} consecutive sweeps"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn run_batch(&mut self, config: &WordsegConfig) -> Result<(), WordsegError> {
        self.seed();
        for it in 0..config.niterations {
            self.sweep()?;
            if config.trace_every > 0 && it % config.trace_every == 0 {
                tracing::info!(
                    iteration = it,
                    acceptance_rate = self.acceptance_rate(),
                    "ag sweep"
                );
            }
        }
        Ok(())
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }

    pub fn adaptor_n(&self) -> u64 {
        self.adaptors.get(&self.word_cat).map(|a| a.n()).unwrap_or(0)
    }

    /// One `pycache` block per adapted category, listing every cached
    /// derivation (label, customer count, table count) the run learned —
    /// the persisted-output counterpart of the rule file written by
    /// `Grammar::write_rules`.
    pub fn pycache_blocks(&self, table: &wordseg_core::symbol::SymbolTable) -> String {
        let mut out = String::new();
        let mut cats: Vec<Symbol> = self.adaptors.keys().copied().collect();
        cats.sort_by_key(|c| c.index());
        for cat in cats {
            let adaptor = &self.adaptors[&cat];
            out.push_str(&format!("pycache {}\n", table.resolve(cat)));
            let mut labels: Vec<&Vec<char>> = adaptor.labels().collect();
            labels.sort();
            for label in labels {
                let word: String = label.iter().collect();
                out.push_str(&format!(
                    "  {word} n={} m={}\n",
                    adaptor.n_label(label),
                    adaptor.m_label(label)
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::default_unigram_grammar;
    use wordseg_core::WordsegContext;

    #[test]
    fn batch_run_produces_full_coverage_segmentations() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "ab".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.0, 5.0);
        let word = ctx.intern("Word");

        let sentences = vec![
            AgSentence::new("ababab".chars().collect()),
            AgSentence::new("baba".chars().collect()),
        ];
        let mut config = WordsegConfig::default();
        config.niterations = 5;
        let mut est = AgEstimator::new(g, word, sentences, &config);
        est.run_batch(&config).unwrap();

        for sentence in &est.sentences {
            let mut cursor = 0;
            for &(s, e) in &sentence.words {
                assert_eq!(s, cursor);
                assert!(e > s);
                cursor = e;
            }
            assert_eq!(cursor, sentence.chars.len());
        }
        assert!(est.adaptor_n() > 0);
    }
}
