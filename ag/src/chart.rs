//! CKY inside chart with Pitman-Yor correction at adapted nonterminals.
//!
//! Grounded on `pycky.cpp`'s inside-probability fill, restricted to the
//! binary/unary normal form `Grammar` supports. One combined chart suffices
//! (rather than a separate "base" and "corrected" chart): a cell's stored
//! value is what every *other* rule sees when it refers to that category at
//! that span, and for an adapted category that value already has the
//! Pitman-Yor correction folded in — exactly as an adaptor grammar composes,
//! since the base distribution of an adapted nonterminal is itself built
//! from the (possibly also adapted) probabilities of its children. The
//! pre-correction sum is kept alongside as `base` so the top-down sampler
//! can recurse into a category's internal rule alternatives when a sample
//! draws a *new* table rather than reusing a cached yield.
//!
//! The Earley predictive-prefix filter (`earley.h`/`trie.hpp` in the source)
//! is deliberately not ported: it only prunes chart cells that provably
//! cannot lead to a full parse, a performance optimization with no effect on
//! the probabilities computed, and it is out of scope here (see DESIGN.md).

use crate::base::CachedYieldBase;
use crate::grammar::{Grammar, RhsSymbol};
use ahash::AHashMap;
use wordseg_core::adaptor::PYAdaptor;
use wordseg_core::symbol::Symbol;

#[derive(Debug, Clone, Copy)]
pub struct CellEntry {
    /// What parent rules see when they reference this category at this span.
    pub value: f64,
    /// Pre-adaptation sum over this category's rule alternatives.
    pub base: f64,
}

pub struct InsideChart<'g> {
    grammar: &'g Grammar,
    n: usize,
    /// `cells[i * n + j]`, for `j > i`, holds the span `[i, j)`'s entries.
    cells: Vec<AHashMap<Symbol, CellEntry>>,
    adaptors: AHashMap<Symbol, PYAdaptor<CachedYieldBase>>,
}

impl<'g> InsideChart<'g> {
    pub fn new(grammar: &'g Grammar, n: usize) -> Self {
        Self {
            grammar,
            n,
            cells: vec![AHashMap::new(); n * n],
            adaptors: AHashMap::new(),
        }
    }

    fn cell_index(&self, i: usize, j: usize) -> usize {
        i * self.n + j
    }

    pub fn entry(&self, i: usize, j: usize, cat: Symbol) -> Option<CellEntry> {
        self.cells[self.cell_index(i, j)].get(&cat).copied()
    }

    /// Seed one adaptor per adapted category from a shared `(a, b)` pair
    /// taken from the grammar, so successive `fill` calls accumulate state
    /// across sentences (the adaptor, not the chart, persists restaurant
    /// counts between sentences).
    pub fn adaptor(&self, cat: Symbol) -> Option<&PYAdaptor<CachedYieldBase>> {
        self.adaptors.get(&cat)
    }

    pub fn adaptor_mut(&mut self, cat: Symbol) -> Option<&mut PYAdaptor<CachedYieldBase>> {
        self.adaptors.get_mut(&cat)
    }

    pub fn adopt_adaptors(&mut self, adaptors: AHashMap<Symbol, PYAdaptor<CachedYieldBase>>) {
        self.adaptors = adaptors;
    }

    pub fn into_adaptors(self) -> AHashMap<Symbol, PYAdaptor<CachedYieldBase>> {
        self.adaptors
    }

    pub(crate) fn ensure_adaptor(&mut self, cat: Symbol) {
        if !self.adaptors.contains_key(&cat) {
            let (a, b) = self.grammar.adapted.get(&cat).copied().unwrap_or((0.0, 1.0));
            self.adaptors
                .insert(cat, PYAdaptor::new(CachedYieldBase::new(), a, b));
        }
    }

    /// Fill the chart bottom-up for `chars`. Adapted-category cache state
    /// (restaurant counts) carries over from whatever adaptors were adopted
    /// via `adopt_adaptors`.
    pub fn fill(&mut self, chars: &[char]) {
        assert_eq!(chars.len(), self.n);
        for cat in self.grammar.categories().collect::<Vec<_>>() {
            if self.grammar.is_adapted(cat) {
                self.ensure_adaptor(cat);
            }
        }

        for length in 1..=self.n {
            for i in 0..=(self.n - length) {
                let j = i + length;
                let mut raw: AHashMap<Symbol, f64> = AHashMap::new();

                if length == 1 {
                    for cat in self.grammar.categories().collect::<Vec<_>>() {
                        for rule in self.grammar.rules_for(cat) {
                            if let [RhsSymbol::Term(c)] = rule.rhs.as_slice() {
                                if *c == chars[i] {
                                    *raw.entry(cat).or_insert(0.0) += self.grammar.rule_prob(rule);
                                }
                            }
                        }
                    }
                } else {
                    for cat in self.grammar.categories().collect::<Vec<_>>() {
                        for rule in self.grammar.rules_for(cat) {
                            if let [RhsSymbol::Nonterm(b), RhsSymbol::Nonterm(c)] = rule.rhs.as_slice() {
                                let p_rule = self.grammar.rule_prob(rule);
                                for k in (i + 1)..j {
                                    let left = self.entry(i, k, *b);
                                    let right = self.entry(k, j, *c);
                                    if let (Some(l), Some(r)) = (left, right) {
                                        *raw.entry(cat).or_insert(0.0) += p_rule * l.value * r.value;
                                    }
                                }
                            }
                        }
                    }
                }

                // Unary closure in dependency order: every unary rule's
                // child category is finalized (pushed into `finals`) before
                // its parent is processed, per `Grammar::unary_order`.
                let mut finals: AHashMap<Symbol, CellEntry> = AHashMap::new();
                for &cat in self.grammar.unary_order() {
                    let mut total = raw.get(&cat).copied().unwrap_or(0.0);
                    for rule in self.grammar.rules_for(cat) {
                        if let [RhsSymbol::Nonterm(child)] = rule.rhs.as_slice() {
                            let child_value = finals
                                .get(child)
                                .map(|e| e.value)
                                .or_else(|| raw.get(child).copied())
                                .unwrap_or(0.0);
                            total += self.grammar.rule_prob(rule) * child_value;
                        }
                    }
                    if total <= 0.0 {
                        continue;
                    }
                    let value = if self.grammar.is_adapted(cat) {
                        let yield_str = &chars[i..j];
                        let adaptor = self.adaptors.get(&cat).expect("adaptor seeded above");
                        adaptor.base.set(yield_str, total);
                        adaptor.predictive(yield_str)
                    } else {
                        total
                    };
                    finals.insert(cat, CellEntry { value, base: total });
                }

                let idx = self.cell_index(i, j);
                self.cells[idx] = finals;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::default_unigram_grammar;
    use wordseg_core::WordsegContext;

    #[test]
    fn whole_sentence_has_nonzero_mass() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "ab".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.0, 10.0);
        let sentence = "aab".chars().collect::<Vec<_>>();
        let mut chart = InsideChart::new(&g, sentence.len());
        chart.fill(&sentence);
        let start = g.start.unwrap();
        let top = chart.entry(0, sentence.len(), start).unwrap();
        assert!(top.value > 0.0 && top.value.is_finite());
    }

    #[test]
    fn repeated_fill_reuses_adaptor_state_across_sentences() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "ab".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.0, 10.0);
        let word = ctx.intern("Word");

        let s1 = "ab".chars().collect::<Vec<_>>();
        let mut chart1 = InsideChart::new(&g, s1.len());
        chart1.fill(&s1);
        if let Some(adaptor) = chart1.adaptor_mut(word) {
            adaptor.seat(&s1);
        }
        let adaptors = chart1.into_adaptors();

        let s2 = "ab".chars().collect::<Vec<_>>();
        let mut chart2 = InsideChart::new(&g, s2.len());
        chart2.adopt_adaptors(adaptors);
        chart2.fill(&s2);
        let entry = chart2.entry(0, 2, word).unwrap();
        assert!(entry.value > 0.0);
    }
}
