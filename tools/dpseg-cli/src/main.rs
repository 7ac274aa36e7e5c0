//! Batch/online DPSEG word segmentation over a corpus file.
//!
//! Usage:
//!   dpseg-cli --input corpus.txt --config run.toml --output segmented.txt

use clap::Parser;
use std::path::PathBuf;
use wordseg_core::config::{Mode, WordsegConfig};
use wordseg_core::corpus::{parse_corpus, split_train_eval, write_segmented};
use wordseg_dpseg::{Estimator, Sentence};

#[derive(Parser, Debug)]
#[command(name = "dpseg-cli")]
#[command(about = "Hierarchical Pitman-Yor unigram/bigram word segmentation")]
struct Args {
    /// One-sentence-per-line corpus, optionally gold-segmented.
    #[arg(short, long)]
    input: PathBuf,

    /// TOML run configuration; defaults are used for any field it omits.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the final segmentation.
    #[arg(short, long, default_value = "segmented.txt")]
    output: PathBuf,

    /// Override `niterations` from the config file.
    #[arg(long)]
    niterations: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => WordsegConfig::load_toml(path)?,
        None => WordsegConfig::default(),
    };
    if let Some(n) = args.niterations {
        config.niterations = n;
    }
    config.validate()?;

    let text = std::fs::read_to_string(&args.input)?;
    let utterances = parse_corpus(&text, config.field_separator);
    tracing::info!(count = utterances.len(), "loaded corpus");

    let (train, eval) = split_train_eval(&utterances, config.train_frac)?;
    let sentences: Vec<Sentence> = train
        .iter()
        .map(|u| Sentence::new(u.chars.clone(), u.gold_boundaries.clone(), false))
        .collect();

    let mut estimator = Estimator::new(sentences, config.clone());
    estimator.seed_lexicon();

    match config.mode {
        Mode::Batch => estimator.run_batch(),
        Mode::Online => {
            for u in &eval {
                estimator.run_online_step(Sentence::new(u.chars.clone(), u.gold_boundaries.clone(), false));
            }
        }
    }

    let mut out = String::new();
    for s in estimator.sentences() {
        let spans = s.boundaries().word_spans();
        let cuts: Vec<usize> = spans.iter().skip(1).map(|&(start, _)| start).collect();
        out.push_str(&write_segmented(s.chars(), &cuts, config.field_separator));
        out.push('\n');
    }
    std::fs::write(&args.output, out)?;
    tracing::info!(path = %args.output.display(), "wrote segmentation");

    // Unsupervised word segmentation has no separate "test" labels to
    // decode against; the usual evaluation is against the training
    // sentences' own gold boundaries, scoring the inferred segmentation
    // directly.
    let gold: Vec<Vec<usize>> = train.iter().map(|u| u.gold_boundaries.clone()).collect();
    if gold.iter().any(|g| !g.is_empty()) {
        let scoring = estimator.evaluate(estimator.sentences(), &gold);
        tracing::info!(
            token_f1 = scoring.token.f1(),
            boundary_f1 = scoring.boundary.f1(),
            "training-set evaluation"
        );
    }
    let _ = eval;

    Ok(())
}
