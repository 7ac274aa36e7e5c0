//! Adaptor grammar word segmentation: a CKY inside chart over a small PCFG
//! with Pitman-Yor correction at designated nonterminals, a top-down
//! derivation sampler, and the Metropolis-Hastings acceptance step the
//! chart's approximation needs. The `dpseg` crate's sibling inference
//! engine: where `dpseg` samples boundaries directly over an explicit
//! `BoundaryVector`, `ag` samples whole parse trees and reads the
//! segmentation off the spans of one adapted category.

pub mod base;
pub mod chart;
pub mod estimator;
pub mod grammar;
pub mod sampler;
pub mod tree;

pub use estimator::{AgEstimator, AgSentence};
pub use grammar::{default_unigram_grammar, Grammar, Rule, RhsSymbol};
pub use tree::Derivation;
