//! DPSEG: hierarchical Pitman-Yor unigram/bigram word segmentation over
//! explicit boundary vectors, with flip, tree, Viterbi, and decayed-MCMC
//! samplers and a batch/online estimator tying them to a corpus.

pub mod decayed;
pub mod estimator;
pub mod sentence;
pub mod tree_sampler;
pub mod viterbi;

pub use decayed::{BoundaryRef, DecayedSelector};
pub use estimator::{Estimator, Model};
pub use sentence::Sentence;
