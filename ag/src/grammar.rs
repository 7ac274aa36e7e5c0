//! PCFG backbone for an adaptor grammar: plain weighted rewrite rules plus a
//! small set of nonterminals flagged as *adapted*, each with its own
//! Pitman-Yor `(a, b)` pair. Grounded on the rule-file convention read from
//! `pycfg_type.hh`/`pycfg.cpp` (`weight LHS --> RHS...`), simplified to
//! binary/unary/terminal rules (Chomsky-normal-form-like) rather than the
//! original's arbitrary-arity rewrite, which this crate's CKY chart does not
//! need: every grammar used for word segmentation factors into binary and
//! unary steps already (`Words --> Word Words`, `Word --> Chars`, ...).

use ahash::AHashMap;
use wordseg_core::{WordsegContext, WordsegError};
use wordseg_core::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhsSymbol {
    Nonterm(Symbol),
    Term(char),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: Symbol,
    pub rhs: Vec<RhsSymbol>,
    /// Dirichlet pseudo-count ("theta" in the source rule-file format).
    pub weight: f64,
}

impl Rule {
    pub fn is_terminal(&self) -> bool {
        matches!(self.rhs.as_slice(), [RhsSymbol::Term(_)])
    }
    pub fn is_unary_nonterm(&self) -> bool {
        matches!(self.rhs.as_slice(), [RhsSymbol::Nonterm(_)])
    }
    pub fn is_binary(&self) -> bool {
        matches!(
            self.rhs.as_slice(),
            [RhsSymbol::Nonterm(_), RhsSymbol::Nonterm(_)]
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub start: Option<Symbol>,
    rules_by_lhs: AHashMap<Symbol, Vec<Rule>>,
    lhs_weight_total: AHashMap<Symbol, f64>,
    /// Adapted nonterminals and their `(a, b)` Pitman-Yor parameters.
    pub adapted: AHashMap<Symbol, (f64, f64)>,
    /// Topological order over the unary-rule dependency graph (child before
    /// parent); categories with no incoming/outgoing unary edges are
    /// appended in arbitrary encounter order. Computed once at load time
    /// since the grammars this crate runs (segmentation grammars) have no
    /// unary cycles; a cycle silently falls back to encounter order, which
    /// would under-propagate mass through the cycle rather than loop
    /// forever — acceptable for the grammars this crate ships with.
    unary_order: Vec<Symbol>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        *self.lhs_weight_total.entry(rule.lhs).or_insert(0.0) += rule.weight;
        self.rules_by_lhs.entry(rule.lhs).or_default().push(rule);
    }

    pub fn set_adapted(&mut self, cat: Symbol, a: f64, b: f64) {
        self.adapted.insert(cat, (a, b));
    }

    pub fn is_adapted(&self, cat: Symbol) -> bool {
        self.adapted.contains_key(&cat)
    }

    pub fn rules_for(&self, lhs: Symbol) -> &[Rule] {
        self.rules_by_lhs.get(&lhs).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Normalized `P(rule | rule.lhs)` under the current Dirichlet weights.
    pub fn rule_prob(&self, rule: &Rule) -> f64 {
        let total = self.lhs_weight_total.get(&rule.lhs).copied().unwrap_or(1.0);
        rule.weight / total
    }

    pub fn categories(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.rules_by_lhs.keys().copied()
    }

    /// Recompute `unary_order` from the current rule set's unary edges
    /// (`lhs --> single nonterminal`). Must be called after all rules are
    /// added and before the grammar is used to fill a chart.
    pub fn finalize(&mut self) {
        let mut order = Vec::new();
        let mut visited: AHashMap<Symbol, bool> = AHashMap::new();
        let cats: Vec<Symbol> = self.rules_by_lhs.keys().copied().collect();

        fn visit(
            cat: Symbol,
            rules_by_lhs: &AHashMap<Symbol, Vec<Rule>>,
            visited: &mut AHashMap<Symbol, bool>,
            order: &mut Vec<Symbol>,
        ) {
            match visited.get(&cat) {
                Some(true) => return,
                Some(false) => return, // cycle guard: already on the stack
                None => {}
            }
            visited.insert(cat, false);
            if let Some(rules) = rules_by_lhs.get(&cat) {
                for r in rules {
                    if let [RhsSymbol::Nonterm(child)] = r.rhs.as_slice() {
                        visit(*child, rules_by_lhs, visited, order);
                    }
                }
            }
            visited.insert(cat, true);
            order.push(cat);
        }

        for cat in cats {
            visit(cat, &self.rules_by_lhs, &mut visited, &mut order);
        }
        self.unary_order = order;
    }

    pub fn unary_order(&self) -> &[Symbol] {
        &self.unary_order
    }

    /// Parse the rule-file format:
    /// ```text
    /// # comment
    /// start Sentence
    /// adapt Word 0.2 10.0
    /// 1 Sentence --> Words
    /// 3 Words --> Word Words
    /// 1 Words --> Word
    /// 1 Word --> Chars
    /// 1 Chars --> Char Chars
    /// 1 Chars --> Char
    /// 1 Char --> _
    /// ```
    /// `Char --> _` is the convention for "any alphabet character": the
    /// caller expands it into one terminal rule per character via
    /// `expand_char_terminal`, since the alphabet is corpus-dependent.
    pub fn parse(text: &str, ctx: &mut WordsegContext) -> Result<Self, WordsegError> {
        let mut g = Grammar::new();
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("start ") {
                g.start = Some(ctx.intern(rest.trim()));
                continue;
            }
            if let Some(rest) = line.strip_prefix("adapt ") {
                let fields: Vec<&str> = rest.split_whitespace().collect();
                if fields.len() != 3 {
                    return Err(WordsegError::MalformedInput(format!(
                        "line {}: expected 'adapt CAT A B', got {line:?}",
                        lineno + 1
                    )));
                }
                let cat = ctx.intern(fields[0]);
                let a: f64 = fields[1].parse().map_err(|_| {
                    WordsegError::MalformedInput(format!("line {}: bad a value", lineno + 1))
                })?;
                let b: f64 = fields[2].parse().map_err(|_| {
                    WordsegError::MalformedInput(format!("line {}: bad b value", lineno + 1))
                })?;
                g.set_adapted(cat, a, b);
                continue;
            }
            let arrow = line.find("-->").ok_or_else(|| {
                WordsegError::MalformedInput(format!("line {}: missing '-->': {line:?}", lineno + 1))
            })?;
            let (head, tail) = line.split_at(arrow);
            let tail = &tail[3..];
            let mut head_fields = head.split_whitespace();
            let weight: f64 = head_fields
                .next()
                .ok_or_else(|| WordsegError::MalformedInput(format!("line {}: missing weight", lineno + 1)))?
                .parse()
                .map_err(|_| WordsegError::MalformedInput(format!("line {}: bad weight", lineno + 1)))?;
            let lhs_name = head_fields.next().ok_or_else(|| {
                WordsegError::MalformedInput(format!("line {}: missing lhs", lineno + 1))
            })?;
            let lhs = ctx.intern(lhs_name);

            let rhs_fields: Vec<&str> = tail.split_whitespace().collect();
            if rhs_fields.is_empty() {
                return Err(WordsegError::MalformedInput(format!(
                    "line {}: empty rhs",
                    lineno + 1
                )));
            }
            let rhs: Vec<RhsSymbol> = if rhs_fields == ["_"] {
                vec![RhsSymbol::Term('\0')] // placeholder, expanded by expand_char_terminal
            } else {
                rhs_fields
                    .iter()
                    .map(|f| RhsSymbol::Nonterm(ctx.intern(f)))
                    .collect()
            };
            if rhs.len() > 2 {
                return Err(WordsegError::MalformedInput(format!(
                    "line {}: rules must be unary or binary, got {} symbols",
                    lineno + 1,
                    rhs.len()
                )));
            }
            g.add_rule(Rule { lhs, rhs, weight });
        }
        g.finalize();
        Ok(g)
    }

    /// Expand every `Char --> _` placeholder rule into one terminal rule per
    /// character of `alphabet`, splitting the placeholder's weight evenly.
    pub fn expand_char_terminal(&mut self, alphabet: &[char]) {
        let mut expanded = AHashMap::new();
        for (lhs, rules) in self.rules_by_lhs.iter() {
            let mut out = Vec::new();
            for r in rules {
                if matches!(r.rhs.as_slice(), [RhsSymbol::Term('\0')]) {
                    let share = r.weight / alphabet.len().max(1) as f64;
                    for &c in alphabet {
                        out.push(Rule {
                            lhs: *lhs,
                            rhs: vec![RhsSymbol::Term(c)],
                            weight: share,
                        });
                    }
                } else {
                    out.push(r.clone());
                }
            }
            expanded.insert(*lhs, out);
        }
        self.rules_by_lhs = expanded;
        self.lhs_weight_total.clear();
        for rules in self.rules_by_lhs.values() {
            for r in rules {
                *self.lhs_weight_total.entry(r.lhs).or_insert(0.0) += r.weight;
            }
        }
    }

    /// Serialize back to the rule-file format read by [`Grammar::parse`],
    /// resolving symbols against `table`. Ordering is by category index,
    /// then declaration order within that category.
    pub fn write_rules(&self, table: &wordseg_core::symbol::SymbolTable) -> String {
        let mut out = String::new();
        if let Some(start) = self.start {
            out.push_str("start ");
            out.push_str(table.resolve(start));
            out.push('\n');
        }
        for (&cat, &(a, b)) in &self.adapted {
            out.push_str(&format!("adapt {} {a} {b}\n", table.resolve(cat)));
        }
        let mut cats: Vec<Symbol> = self.rules_by_lhs.keys().copied().collect();
        cats.sort_by_key(|c| c.index());
        for cat in cats {
            for rule in self.rules_for(cat) {
                out.push_str(&format!("{} {} -->", rule.weight, table.resolve(rule.lhs)));
                for sym in &rule.rhs {
                    match sym {
                        RhsSymbol::Nonterm(s) => {
                            out.push(' ');
                            out.push_str(table.resolve(*s));
                        }
                        RhsSymbol::Term(c) => {
                            out.push(' ');
                            out.push(*c);
                        }
                    }
                }
                out.push('\n');
            }
        }
        out
    }
}

/// The canonical unigram word-segmentation grammar used when no rule file is
/// supplied: `Sentence --> Words`, `Words --> Word Words | Word`,
/// `Word --> Chars` (adapted), `Chars --> Char Chars | Char`, one terminal
/// rule per alphabet character. Mirrors the `unigram-words.lt` style grammar
/// shipped alongside `wordseg/algos/ag`.
pub fn default_unigram_grammar(ctx: &mut WordsegContext, alphabet: &[char], a: f64, b: f64) -> Grammar {
    let sentence = ctx.intern("Sentence");
    let words = ctx.intern("Words");
    let word = ctx.intern("Word");
    let chars = ctx.intern("Chars");
    let char_cat = ctx.intern("Char");

    let mut g = Grammar::new();
    g.start = Some(sentence);
    g.add_rule(Rule {
        lhs: sentence,
        rhs: vec![RhsSymbol::Nonterm(words)],
        weight: 1.0,
    });
    g.add_rule(Rule {
        lhs: words,
        rhs: vec![RhsSymbol::Nonterm(word), RhsSymbol::Nonterm(words)],
        weight: 1.0,
    });
    g.add_rule(Rule {
        lhs: words,
        rhs: vec![RhsSymbol::Nonterm(word)],
        weight: 1.0,
    });
    g.add_rule(Rule {
        lhs: word,
        rhs: vec![RhsSymbol::Nonterm(chars)],
        weight: 1.0,
    });
    g.add_rule(Rule {
        lhs: chars,
        rhs: vec![RhsSymbol::Nonterm(char_cat), RhsSymbol::Nonterm(chars)],
        weight: 1.0,
    });
    g.add_rule(Rule {
        lhs: chars,
        rhs: vec![RhsSymbol::Nonterm(char_cat)],
        weight: 1.0,
    });
    let share = 1.0 / alphabet.len().max(1) as f64;
    for &c in alphabet {
        g.add_rule(Rule {
            lhs: char_cat,
            rhs: vec![RhsSymbol::Term(c)],
            weight: share,
        });
    }
    g.set_adapted(word, a, b);
    g.finalize();
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grammar_has_word_adapted() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "abc".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.0, 10.0);
        let word = ctx.intern("Word");
        assert!(g.is_adapted(word));
        assert!(!g.unary_order().is_empty());
    }

    #[test]
    fn parse_rejects_missing_arrow() {
        let mut ctx = WordsegContext::new();
        assert!(Grammar::parse("1 Foo Bar\n", &mut ctx).is_err());
    }

    #[test]
    fn parse_reads_adapt_and_start_directives() {
        let mut ctx = WordsegContext::new();
        let text = "start Sentence\nadapt Word 0.1 5.0\n1 Sentence --> Word\n1 Word --> _\n";
        let mut g = Grammar::parse(text, &mut ctx).unwrap();
        g.expand_char_terminal(&['a', 'b']);
        let word = ctx.intern("Word");
        assert_eq!(g.adapted.get(&word), Some(&(0.1, 5.0)));
        assert_eq!(g.rules_for(word).len(), 2);
    }

    #[test]
    fn write_rules_round_trips_through_parse() {
        let mut ctx = WordsegContext::new();
        let alphabet: Vec<char> = "ab".chars().collect();
        let g = default_unigram_grammar(&mut ctx, &alphabet, 0.1, 5.0);
        let text = g.write_rules(&ctx.symbols);

        let mut ctx2 = WordsegContext::new();
        let g2 = Grammar::parse(&text, &mut ctx2).unwrap();
        let word2 = ctx2.intern("Word");
        assert_eq!(g2.adapted.get(&word2), Some(&(0.1, 5.0)));
        assert!(!g2.rules_for(word2).is_empty());
    }
}
