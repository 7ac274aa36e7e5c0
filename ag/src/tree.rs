//! Derivation trees: the adaptor grammar analogue of `dpseg`'s
//! `BoundaryVector`. Grounded loosely on `catcount_tree.cpp`'s tree
//! structure, scoped down to what word segmentation needs from a
//! derivation: which spans were realized by the designated word category,
//! plus enough internal structure (span, category, children) to inspect or
//! print a parse. Fragment/subtree counting for syntactic adaptor grammars
//! (the rest of what `catcount_tree.cpp` does) is out of scope — this crate
//! only ever adapts a single flat category per span, never tree fragments.

use wordseg_core::symbol::Symbol;

#[derive(Debug, Clone)]
pub enum Derivation {
    Terminal(char),
    Node {
        category: Symbol,
        span: (usize, usize),
        /// `true` if this node's category is adapted and this particular
        /// draw reused an existing cached table (no further internal
        /// structure was sampled; the whole-span yield was the output).
        reused: bool,
        children: Vec<Derivation>,
    },
}

impl Derivation {
    pub fn span(&self) -> Option<(usize, usize)> {
        match self {
            Derivation::Terminal(_) => None,
            Derivation::Node { span, .. } => Some(*span),
        }
    }

    /// Collect every span whose node's category is `target`, in left-to-right
    /// order. For the default unigram grammar, calling this with `Word`
    /// yields exactly the segmentation.
    pub fn spans_of(&self, target: Symbol, out: &mut Vec<(usize, usize)>) {
        match self {
            Derivation::Terminal(_) => {}
            Derivation::Node { category, span, children, .. } => {
                if *category == target {
                    out.push(*span);
                }
                for child in children {
                    child.spans_of(target, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordseg_core::symbol::SymbolTable;

    #[test]
    fn spans_of_collects_matching_nodes_in_order() {
        let mut table = SymbolTable::new();
        let leaf_cat = table.intern("Leaf");
        let word_cat = table.intern("Word");
        let tree = Derivation::Node {
            category: word_cat,
            span: (0, 5),
            reused: false,
            children: vec![
                Derivation::Node {
                    category: word_cat,
                    span: (0, 2),
                    reused: true,
                    children: vec![],
                },
                Derivation::Node {
                    category: leaf_cat,
                    span: (2, 5),
                    reused: false,
                    children: vec![Derivation::Terminal('x')],
                },
            ],
        };
        let mut out = Vec::new();
        tree.spans_of(word_cat, &mut out);
        assert_eq!(out, vec![(0, 5), (0, 2)]);
    }
}
