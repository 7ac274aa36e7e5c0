//! Top-down derivation sampling from a filled `InsideChart`, plus the
//! Metropolis-Hastings correction a single Gibbs sweep needs.
//!
//! Grounded on `gibbs.cpp`'s resample-a-sentence loop: the CKY chart is
//! filled treating every adapted category's restaurant state as frozen for
//! the whole sentence (so it never sees its own within-sentence reseatings),
//! which makes the chart's derivation probability only an *approximate*
//! proposal `q`. `gibbs.cpp` corrects this with a Metropolis-Hastings
//! accept/reject comparing the proposal against the true sequential-seating
//! joint `p`; this module does the same, computed via `PYAdaptor::seat`'s
//! pre-update return value (already exactly the quantity `p` needs).

use crate::chart::InsideChart;
use crate::grammar::{Grammar, RhsSymbol};
use crate::tree::Derivation;
use ahash::AHashMap;
use wordseg_core::rng::Rng;
use wordseg_core::symbol::Symbol;

/// Outcome of one `resample_sentence` call, distinguishing the ordinary
/// Metropolis-Hastings accept/reject from the zero-mass-chart case so the
/// caller can tell transient numeric underflow (retry next sweep) apart
/// from an ordinary rejection (per spec.md's error handling design, a
/// sentence stuck underflowing across many sweeps is the genuinely
/// unparseable case and must become fatal, not retried forever).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleOutcome {
    Accepted,
    Rejected,
    Underflow,
}

/// Sample a full derivation top-down from `(0, n, grammar.start)`, using the
/// frozen chart entries to weight each nondeterministic choice. Returns the
/// tree and the product of every weighting choice made (`q`, the chart's
/// approximate proposal probability for this specific derivation).
pub fn sample_derivation(
    chart: &InsideChart,
    grammar: &Grammar,
    chars: &[char],
    rng: &mut Rng,
) -> (Derivation, f64) {
    let start = grammar.start.expect("grammar has no start symbol");
    let mut q = 1.0;
    let tree = sample_cat(chart, grammar, chars, 0, chars.len(), start, rng, &mut q);
    (tree, q)
}

fn sample_cat(
    chart: &InsideChart,
    grammar: &Grammar,
    chars: &[char],
    i: usize,
    j: usize,
    cat: Symbol,
    rng: &mut Rng,
    q: &mut f64,
) -> Derivation {
    if grammar.is_adapted(cat) {
        let yield_str = &chars[i..j];
        let adaptor = chart.adaptor(cat).expect("adaptor seeded by chart.fill");
        let (w_old, w_new) = adaptor.reuse_weight(yield_str);
        let total = w_old + w_new;
        let draw = rng.uniform(total.max(1e-300));
        if draw < w_old || w_new <= 0.0 {
            *q *= if total > 0.0 { w_old / total } else { 1.0 };
            return Derivation::Node {
                category: cat,
                span: (i, j),
                reused: true,
                children: Vec::new(),
            };
        }
        *q *= w_new / total;
        let child = sample_internal(chart, grammar, chars, i, j, cat, rng, q);
        return Derivation::Node {
            category: cat,
            span: (i, j),
            reused: false,
            children: vec![child],
        };
    }
    sample_internal(chart, grammar, chars, i, j, cat, rng, q)
}

/// Sample among `cat`'s rule alternatives at span `(i, j)`, weighted by
/// their contribution to the cell's pre-adaptation `base` sum (for an
/// adapted category that drew "new") or `value` (for a plain category,
/// where `value == base`).
fn sample_internal(
    chart: &InsideChart,
    grammar: &Grammar,
    chars: &[char],
    i: usize,
    j: usize,
    cat: Symbol,
    rng: &mut Rng,
    q: &mut f64,
) -> Derivation {
    if j - i == 1 {
        for rule in grammar.rules_for(cat) {
            if let [RhsSymbol::Term(c)] = rule.rhs.as_slice() {
                if *c == chars[i] {
                    return Derivation::Node {
                        category: cat,
                        span: (i, j),
                        reused: false,
                        children: vec![Derivation::Terminal(*c)],
                    };
                }
            }
        }
    }

    enum Choice {
        Binary(Symbol, Symbol, usize),
        Unary(Symbol),
    }
    let mut candidates: Vec<(f64, Choice)> = Vec::new();
    for rule in grammar.rules_for(cat) {
        let p_rule = grammar.rule_prob(rule);
        match rule.rhs.as_slice() {
            [RhsSymbol::Nonterm(b), RhsSymbol::Nonterm(c)] => {
                for k in (i + 1)..j {
                    if let (Some(l), Some(r)) = (chart.entry(i, k, *b), chart.entry(k, j, *c)) {
                        let w = p_rule * l.value * r.value;
                        if w > 0.0 {
                            candidates.push((w, Choice::Binary(*b, *c, k)));
                        }
                    }
                }
            }
            [RhsSymbol::Nonterm(child)] => {
                if let Some(e) = chart.entry(i, j, *child) {
                    let w = p_rule * e.value;
                    if w > 0.0 {
                        candidates.push((w, Choice::Unary(*child)));
                    }
                }
            }
            _ => {}
        }
    }

    let total: f64 = candidates.iter().map(|(w, _)| w).sum();
    if total <= 0.0 || candidates.is_empty() {
        // No derivable alternative (can happen only for a malformed
        // grammar/chart mismatch); fall back to an empty node rather than
        // panicking mid-sample.
        return Derivation::Node {
            category: cat,
            span: (i, j),
            reused: false,
            children: Vec::new(),
        };
    }
    let mut draw = rng.uniform(total);
    let mut chosen = &candidates[candidates.len() - 1].1;
    for (w, choice) in &candidates {
        draw -= w;
        if draw <= 0.0 {
            chosen = choice;
            break;
        }
    }
    match chosen {
        Choice::Unary(child) => {
            *q *= 1.0; // the child's own sampling records its own weighting
            let child_tree = sample_cat(chart, grammar, chars, i, j, *child, rng, q);
            Derivation::Node {
                category: cat,
                span: (i, j),
                reused: false,
                children: vec![child_tree],
            }
        }
        Choice::Binary(b, c, k) => {
            let left = sample_cat(chart, grammar, chars, i, *k, *b, rng, q);
            let right = sample_cat(chart, grammar, chars, *k, j, *c, rng, q);
            Derivation::Node {
                category: cat,
                span: (i, j),
                reused: false,
                children: vec![left, right],
            }
        }
    }
}

/// Resample one sentence's derivation under a single adapted category
/// (`word_cat`), the Gibbs-with-Metropolis-Hastings step from `gibbs.cpp`:
/// unseat the current segmentation's words, propose a fresh derivation from
/// a chart filled on the "minus this sentence" state, and accept/reject it
/// against the true sequential-seating joint of both segmentations. Returns
/// the accepted word boundaries (character offsets) and whether the
/// proposal was accepted.
pub fn resample_sentence(
    grammar: &Grammar,
    chars: &[char],
    word_cat: Symbol,
    current_words: &[(usize, usize)],
    adaptors: AHashMap<Symbol, wordseg_core::adaptor::PYAdaptor<crate::base::CachedYieldBase>>,
    rng: &mut Rng,
) -> (
    Vec<(usize, usize)>,
    AHashMap<Symbol, wordseg_core::adaptor::PYAdaptor<crate::base::CachedYieldBase>>,
    ResampleOutcome,
) {
    let mut chart = InsideChart::new(grammar, chars.len());
    chart.adopt_adaptors(adaptors);
    chart.ensure_adaptor(word_cat);

    // Unseat the current segmentation to reach the "minus this sentence"
    // state, recording q_old as the product of frozen-state predictives.
    let mut q_old = 1.0;
    for &(s, e) in current_words {
        let adaptor = chart.adaptor(word_cat).unwrap();
        let p = adaptor.predictive(&chars[s..e]);
        q_old *= p.max(1e-300);
        chart.adaptor_mut(word_cat).unwrap().unseat(&chars[s..e]);
    }

    // p_old: reseat the old words sequentially to get the true joint, then
    // unseat them again to restore the minus-state before proposing.
    let mut p_old = 1.0;
    for &(s, e) in current_words {
        let pred = chart.adaptor_mut(word_cat).unwrap().seat(&chars[s..e]);
        p_old *= pred.max(1e-300);
    }
    for &(s, e) in current_words {
        chart.adaptor_mut(word_cat).unwrap().unseat(&chars[s..e]);
    }

    chart.fill(chars);
    let start = grammar.start.expect("grammar has no start symbol");
    if chart.entry(0, chars.len(), start).map(|e| e.value).unwrap_or(0.0) <= 0.0 {
        // Numeric underflow: the proposal chart has no derivable parse for
        // this sentence under the current adaptor state (can happen with
        // very small PY concentrations driving cell masses to zero). Skip
        // this sentence for this sweep rather than sample from an empty
        // chart; it is retried on the next sweep once counts have shifted.
        tracing::warn!(n = chars.len(), "numeric underflow filling CKY chart, skipping sentence this sweep");
        for &(s, e) in current_words {
            chart.adaptor_mut(word_cat).unwrap().seat(&chars[s..e]);
        }
        return (current_words.to_vec(), chart.into_adaptors(), ResampleOutcome::Underflow);
    }
    let (tree, q_new) = sample_derivation(&chart, grammar, chars, rng);
    let mut new_words = Vec::new();
    tree.spans_of(word_cat, &mut new_words);
    new_words.sort_unstable();

    let mut p_new = 1.0;
    for &(s, e) in &new_words {
        let pred = chart.adaptor_mut(word_cat).unwrap().seat(&chars[s..e]);
        p_new *= pred.max(1e-300);
    }

    let accept_ratio = if p_old <= 0.0 || q_new <= 0.0 {
        1.0
    } else {
        (p_new * q_old) / (p_old * q_new)
    };
    let accept = accept_ratio >= 1.0 || rng.uniform01() < accept_ratio;

    if accept {
        (new_words, chart.into_adaptors(), ResampleOutcome::Accepted)
    } else {
        // Reject: undo the proposal's seating, reseat the old words.
        for &(s, e) in &new_words {
            chart.adaptor_mut(word_cat).unwrap().unseat(&chars[s..e]);
        }
        for &(s, e) in current_words {
            chart.adaptor_mut(word_cat).unwrap().seat(&chars[s..e]);
        }
        (current_words.to_vec(), chart.into_adaptors(), ResampleOutcome::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::default_unigram_grammar;
    use wordseg_core::WordsegContext;

    #[test]
    fn sampled_derivation_spans_cover_the_whole_sentence() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "ab".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.0, 10.0);
        let word = ctx.intern("Word");
        let sentence: Vec<char> = "abba".chars().collect();

        let mut chart = InsideChart::new(&g, sentence.len());
        chart.fill(&sentence);
        let mut rng = Rng::from_seed(11);
        let (tree, q) = sample_derivation(&chart, &g, &sentence, &mut rng);
        assert!(q > 0.0 && q.is_finite());

        let mut spans = Vec::new();
        tree.spans_of(word, &mut spans);
        spans.sort_unstable();
        let mut cursor = 0;
        for (s, e) in &spans {
            assert_eq!(*s, cursor);
            assert!(e > s);
            cursor = *e;
        }
        assert_eq!(cursor, sentence.len());
    }

    #[test]
    fn resample_sentence_returns_a_full_cover() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "ab".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.0, 10.0);
        let word = ctx.intern("Word");
        let sentence: Vec<char> = "abab".chars().collect();

        let mut chart = InsideChart::new(&g, sentence.len());
        chart.fill(&sentence);
        let mut rng = Rng::from_seed(5);
        let (tree, _q) = sample_derivation(&chart, &g, &sentence, &mut rng);
        let mut words = Vec::new();
        tree.spans_of(word, &mut words);
        words.sort_unstable();
        let adaptors = chart.into_adaptors();

        let (new_words, _adaptors, _outcome) =
            resample_sentence(&g, &sentence, word, &words, adaptors, &mut rng);
        let mut cursor = 0;
        for (s, e) in &new_words {
            assert_eq!(*s, cursor);
            cursor = *e;
        }
        assert_eq!(cursor, sentence.len());
    }
}
