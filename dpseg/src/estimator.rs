//! Top-level batch/online estimator: owns the corpus of `Sentence`s and a
//! unigram or bigram lexicon, and drives the configured sampler
//! (flip/tree/Viterbi/decayed) for `niterations` sweeps, with annealing,
//! periodic hyperparameter resampling, periodic evaluation, and the
//! forget-rate bookkeeping for online mode.
//!
//! Grounded on the `estimator::base`/`PYEstimator` split in the source
//! system: one pass per iteration over every sentence, each sentence
//! fully un-seated then resampled then reseated (the batch-mode
//! convention every sampler above assumes).

use crate::decayed::DecayedSelector;
use crate::sentence::Sentence;
use wordseg_core::annealing::temperature_at;
use wordseg_core::base::GeometricCharNonEmpty;
use wordseg_core::config::{Estimator as EstimatorKind, Mode, Ngram, WordsegConfig};
use wordseg_core::forget::ForgetPolicy;
use wordseg_core::hyperparameters::{resample_pya, resample_pyb};
use wordseg_core::rng::Rng;
use wordseg_core::scoring::Scoring;
use wordseg_core::{BigramLexicon, UnigramLexicon};
use ahash::AHashMap;

/// Either lexicon shape; `Estimator` dispatches on this once per run rather
/// than threading a type parameter through the whole corpus loop.
pub enum Model {
    Unigram(UnigramLexicon<GeometricCharNonEmpty>),
    Bigram(BigramLexicon<GeometricCharNonEmpty>),
}

impl Model {
    fn new(ngram: Ngram, alphabet_size: u32, p_nl: f64, pya: f64, pyb: f64, do_mbdp: bool) -> Self {
        let base = GeometricCharNonEmpty::new(p_nl, alphabet_size.max(1));
        let unigram = UnigramLexicon::new(base, pya, pyb).with_mbdp(do_mbdp);
        match ngram {
            Ngram::Unigram => Model::Unigram(unigram),
            Ngram::Bigram => Model::Bigram(BigramLexicon::new(unigram, pya, pyb)),
        }
    }
}

pub struct Estimator {
    sentences: Vec<Sentence>,
    model: Model,
    config: WordsegConfig,
    rng: Rng,
    forget: ForgetPolicy,
    nsentences_seen: u64,
    decayed_selector: DecayedSelector,
}

impl Estimator {
    pub fn new(sentences: Vec<Sentence>, config: WordsegConfig) -> Self {
        let alphabet_size = sentences
            .iter()
            .flat_map(|s| s.chars().iter())
            .collect::<std::collections::HashSet<_>>()
            .len() as u32;
        let model = Model::new(
            config.ngram,
            alphabet_size,
            config.p_nl,
            config.pya,
            config.pyb,
            config.do_mbdp,
        );
        let decayed_selector = DecayedSelector::new(config.decay_rate);
        Self {
            sentences,
            model,
            rng: Rng::from_seed(config.randseed),
            forget: ForgetPolicy::new(),
            nsentences_seen: 0,
            decayed_selector,
            config,
        }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Seed the lexicon with every sentence's initial segmentation
    /// (necessary before the first resampling sweep, mirroring the
    /// reference's constructor-time `insert_words` pass).
    pub fn seed_lexicon(&mut self) {
        for s in &self.sentences {
            match &mut self.model {
                Model::Unigram(lex) => s.insert_words_unigram(lex),
                Model::Bigram(lex) => s.insert_words_bigram(lex),
            }
        }
        self.nsentences_seen = self.sentences.len() as u64;
    }

    /// Run `niterations` Gibbs sweeps (or DP passes, for Viterbi/tree)
    /// over the whole corpus, in batch mode: every sentence is always
    /// present in the lexicon except while it is itself being resampled.
    pub fn run_batch(&mut self) {
        assert_eq!(self.config.mode, Mode::Batch, "run_batch requires Mode::Batch");
        for iteration in 0..self.config.niterations {
            let temperature = temperature_at(
                iteration,
                self.config.niterations,
                self.config.zits,
                self.config.ztemp,
                self.config.anneal_iterations,
                self.config.anneal_a,
                self.config.anneal_b,
                self.config.temp_start,
                self.config.temp_stop,
            );
            self.sweep_once(temperature);
            self.maybe_resample_hyperparameters();
            if self.config.trace_every > 0 && iteration % self.config.trace_every == 0 {
                tracing::info!(iteration, temperature, "sweep complete");
            }
        }
    }

    /// One online-mode increment: seat the next unseen utterance, run a
    /// resampling pass over the sentences seen so far, and optionally
    /// forget old lexicon entries past their memory window.
    pub fn run_online_step(&mut self, next: Sentence) {
        assert_eq!(self.config.mode, Mode::Online, "run_online_step requires Mode::Online");
        let idx = self.sentences.len();
        let num_boundaries = next.boundaries().possible_boundaries().len();
        match &mut self.model {
            Model::Unigram(lex) => next.insert_words_unigram(lex),
            Model::Bigram(lex) => next.insert_words_bigram(lex),
        }
        self.sentences.push(next);
        self.nsentences_seen += 1;

        if self.config.estimator == EstimatorKind::Decayed && matches!(self.model, Model::Unigram(_)) {
            self.decayed_selector.add_sentence(num_boundaries);
            self.decayed_resample_unigram(1.0);
        } else {
            self.resample_one(idx, 1.0);
        }
        self.apply_forgetting();
    }

    fn sweep_once(&mut self, temperature: f64) {
        let n = self.sentences.len();
        for i in 0..n {
            self.resample_one(i, temperature);
        }
    }

    fn resample_one(&mut self, idx: usize, temperature: f64) {
        let nsentences = self.nsentences_seen;
        let aeos = self.config.aeos;
        match &mut self.model {
            Model::Unigram(lex) => {
                self.sentences[idx].erase_words_unigram(lex);
                match self.config.estimator {
                    EstimatorKind::Flip => {
                        self.sentences[idx].sample_by_flips_unigram(lex, nsentences, aeos, temperature, &mut self.rng);
                    }
                    EstimatorKind::Tree => {
                        self.sentences[idx].sample_tree_unigram(lex, nsentences, aeos, temperature, &mut self.rng);
                    }
                    EstimatorKind::Viterbi => {
                        self.sentences[idx].maximize_unigram(lex, nsentences, aeos, temperature);
                    }
                    EstimatorKind::Decayed => {
                        unreachable!(
                            "unigram decayed sampling bypasses resample_one, see run_online_step"
                        )
                    }
                }
                self.sentences[idx].insert_words_unigram(lex);
            }
            Model::Bigram(lex) => {
                self.sentences[idx].erase_words_bigram(lex);
                match self.config.estimator {
                    EstimatorKind::Flip | EstimatorKind::Decayed => {
                        self.sentences[idx].sample_by_flips_bigram(lex, temperature, &mut self.rng);
                    }
                    EstimatorKind::Tree => {
                        self.sentences[idx].sample_tree_bigram(lex, temperature, &mut self.rng);
                    }
                    EstimatorKind::Viterbi => {
                        // No exact bigram Viterbi DP is implemented (see
                        // tree_sampler.rs); fall back to the per-boundary
                        // conditional, which already approximates the MAP
                        // segmentation reasonably well at low temperature.
                        self.sentences[idx].sample_by_flips_bigram(lex, temperature, &mut self.rng);
                    }
                }
                self.sentences[idx].insert_words_bigram(lex);
            }
        }
    }

    /// Resample `samples_per_utt` decayed-MCMC-selected boundaries,
    /// corpus-wide. Grounded on `OnlineUnigramDecayedMCMC::estimate_sentence`
    /// (`Estimators.cc:478-915`): the selector may pick any boundary across
    /// the whole history, not just the sentence just inserted, and only
    /// that one boundary's surrounding word(s) are unseated and resampled —
    /// never a full-sentence sweep.
    fn decayed_resample_unigram(&mut self, temperature: f64) {
        let nsentences = self.nsentences_seen;
        let aeos = self.config.aeos;
        for _ in 0..self.config.samples_per_utt.max(1) {
            let Some(bref) = self.decayed_selector.select(&mut self.rng) else {
                break;
            };
            let position = match self.sentences[bref.sentence]
                .boundaries()
                .possible_boundaries()
                .get(bref.position)
            {
                Some(&p) => p,
                None => continue,
            };
            match &mut self.model {
                Model::Unigram(lex) => {
                    self.sentences[bref.sentence].sample_one_flip_unigram(
                        lex,
                        nsentences,
                        aeos,
                        temperature,
                        position,
                        &mut self.rng,
                    );
                }
                Model::Bigram(_) => {}
            }
        }
    }

    fn maybe_resample_hyperparameters(&mut self) {
        if self.config.pya_beta_a <= 0.0 || self.config.pya <= 0.0 {
            return;
        }
        match &mut self.model {
            Model::Unigram(lex) => {
                let snapshot = lex.clone();
                let beta_a = self.config.pya_beta_a;
                let beta_b = self.config.pya_beta_b;
                let new_a = resample_pya(lex.pya(), beta_a, beta_b, &mut self.rng, |a| {
                    let mut l = snapshot.clone();
                    l.set_pya(a);
                    l.log_prob()
                });
                lex.set_pya(new_a);

                let snapshot = lex.clone();
                let shape = self.config.pyb_gamma_s;
                let scale = self.config.pyb_gamma_c;
                let new_b = resample_pyb(lex.pyb(), shape, scale, &mut self.rng, |b| {
                    let mut l = snapshot.clone();
                    l.set_pyb(b);
                    l.log_prob()
                });
                lex.set_pyb(new_b);
            }
            Model::Bigram(lex) => {
                let unigram = lex.unigram_mut();
                let snapshot = unigram.clone();
                let beta_a = self.config.pya_beta_a;
                let beta_b = self.config.pya_beta_b;
                let new_a = resample_pya(unigram.pya(), beta_a, beta_b, &mut self.rng, |a| {
                    let mut l = snapshot.clone();
                    l.set_pya(a);
                    l.log_prob()
                });
                unigram.set_pya(new_a);
            }
        }
    }

    /// With probability `forget_rate`, evict one lexicon entry chosen by
    /// `forget_method`, biased toward type-memory or token-memory erasure
    /// per the config toggles. A no-op when `forget_rate == 0.0`, which is
    /// the common (fully-retentive) case.
    fn apply_forgetting(&mut self) {
        if self.config.forget_rate <= 0.0 || (!self.config.type_memory && !self.config.token_memory) {
            return;
        }
        if self.rng.uniform01() >= self.config.forget_rate {
            return;
        }
        match &mut self.model {
            Model::Unigram(lex) => {
                let counts: AHashMap<Vec<char>, u64> = lex.labels().map(|l| (l.clone(), lex.n_label(l))).collect();
                if let Some(label) = self.forget.pick_to_forget(self.config.forget_method, &counts, &mut self.rng) {
                    if self.config.type_memory {
                        lex.erase_type(&label);
                    } else {
                        lex.erase_token(&label);
                    }
                    self.forget.remove(&label);
                }
            }
            Model::Bigram(lex) => {
                let unigram = lex.unigram_mut();
                let counts: AHashMap<Vec<char>, u64> =
                    unigram.labels().map(|l| (l.clone(), unigram.n_label(l))).collect();
                if let Some(label) = self.forget.pick_to_forget(self.config.forget_method, &counts, &mut self.rng) {
                    if self.config.type_memory {
                        unigram.erase_type(&label);
                    } else {
                        unigram.erase_token(&label);
                    }
                    self.forget.remove(&label);
                }
            }
        }
    }

    /// Score already-segmented hypothesis sentences (e.g. the output of
    /// `maximize_unigram` on a held-out split) against their gold interior
    /// boundaries.
    pub fn evaluate(&self, hypotheses: &[Sentence], gold: &[Vec<usize>]) -> Scoring {
        let mut scoring = Scoring::new();
        for (s, truth) in hypotheses.iter().zip(gold) {
            scoring.score_sentence(s.chars(), s.boundaries(), truth);
        }
        scoring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(s: &str, boundaries: Vec<usize>) -> Sentence {
        Sentence::new(s.chars().collect(), boundaries, true)
    }

    #[test]
    fn batch_unigram_flip_runs_without_panicking() {
        let mut cfg = WordsegConfig::default();
        cfg.niterations = 3;
        let sentences = vec![
            utterance("thecat", vec![3]),
            utterance("satonthemat", vec![3, 5, 8]),
        ];
        let mut est = Estimator::new(sentences, cfg);
        est.seed_lexicon();
        est.run_batch();
        assert_eq!(est.sentences().len(), 2);
    }

    #[test]
    fn batch_unigram_viterbi_runs_without_panicking() {
        let mut cfg = WordsegConfig::default();
        cfg.niterations = 2;
        cfg.estimator = EstimatorKind::Viterbi;
        let sentences = vec![utterance("thecat", vec![3])];
        let mut est = Estimator::new(sentences, cfg);
        est.seed_lexicon();
        est.run_batch();
    }

    #[test]
    fn bigram_flip_runs_without_panicking() {
        let mut cfg = WordsegConfig::default();
        cfg.niterations = 2;
        cfg.ngram = Ngram::Bigram;
        let sentences = vec![utterance("thecat", vec![3]), utterance("thedog", vec![3])];
        let mut est = Estimator::new(sentences, cfg);
        est.seed_lexicon();
        est.run_batch();
    }

    #[test]
    fn online_mode_accepts_incremental_sentences() {
        let mut cfg = WordsegConfig::default();
        cfg.mode = Mode::Online;
        cfg.estimator = EstimatorKind::Decayed;
        let mut est = Estimator::new(Vec::new(), cfg);
        est.run_online_step(utterance("thecat", vec![3]));
        est.run_online_step(utterance("thedog", vec![3]));
        assert_eq!(est.sentences().len(), 2);
    }
}
