//! Shared Pitman-Yor inference machinery used by both the `wordseg-ag`
//! adaptor-grammar engine and the `wordseg-dpseg` sentence-boundary
//! sampler: restaurants, adaptors, character-base distributions, word
//! lexicons, the slice sampler and hyperparameter resampling, annealing
//! schedules, corpus I/O and scoring, plus the run configuration and
//! error types shared by both engines' command-line tools.

pub mod adaptor;
pub mod annealing;
pub mod base;
pub mod boundary;
pub mod charbuf;
pub mod config;
pub mod context;
pub mod corpus;
pub mod error;
pub mod forget;
pub mod hyperparameters;
pub mod lexicon;
pub mod restaurant;
pub mod rng;
pub mod scoring;
pub mod slice_sampler;
pub mod symbol;

pub use adaptor::PYAdaptor;
pub use base::{BaseDistribution, GeometricChar, GeometricCharNonEmpty, LearnedChar};
pub use boundary::BoundaryVector;
pub use config::WordsegConfig;
pub use context::WordsegContext;
pub use error::WordsegError;
pub use lexicon::{BigramLexicon, UnigramLexicon};
pub use restaurant::Restaurant;
pub use rng::Rng;
