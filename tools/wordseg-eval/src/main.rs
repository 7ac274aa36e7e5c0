//! Score a hypothesis segmentation file against a gold-segmented file,
//! independent of which engine (`dpseg-cli` or `ag-cli`) produced the
//! hypothesis — both just emit whitespace-segmented text.
//!
//! Usage:
//!   wordseg-eval --hypothesis segmented.txt --gold corpus.txt

use clap::Parser;
use std::path::PathBuf;
use wordseg_core::boundary::BoundaryVector;
use wordseg_core::corpus::parse_corpus;
use wordseg_core::scoring::Scoring;

#[derive(Parser, Debug)]
#[command(name = "wordseg-eval")]
#[command(about = "Boundary/token/lexicon precision-recall-F scoring for word segmentation output")]
struct Args {
    #[arg(long)]
    hypothesis: PathBuf,

    #[arg(long)]
    gold: PathBuf,

    #[arg(long, default_value_t = ' ')]
    field_separator: char,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let hyp_text = std::fs::read_to_string(&args.hypothesis)?;
    let gold_text = std::fs::read_to_string(&args.gold)?;

    let hyp = parse_corpus(&hyp_text, args.field_separator);
    let gold = parse_corpus(&gold_text, args.field_separator);

    anyhow::ensure!(
        hyp.len() == gold.len(),
        "hypothesis has {} lines, gold has {} lines",
        hyp.len(),
        gold.len()
    );

    let mut scoring = Scoring::new();
    for (h, g) in hyp.iter().zip(&gold) {
        anyhow::ensure!(
            h.chars == g.chars,
            "hypothesis and gold disagree on characters for a line: {:?} vs {:?}",
            h.chars.iter().collect::<String>(),
            g.chars.iter().collect::<String>()
        );
        let hyp_boundaries = BoundaryVector::new(h.chars.len(), h.gold_boundaries.clone(), true);
        scoring.score_sentence(&h.chars, &hyp_boundaries, &g.gold_boundaries);
    }

    println!("boundary: P={:.4} R={:.4} F={:.4}", scoring.boundary.precision(), scoring.boundary.recall(), scoring.boundary.f1());
    println!("token:    P={:.4} R={:.4} F={:.4}", scoring.token.precision(), scoring.token.recall(), scoring.token.f1());
    let lex = scoring.lexicon_prf();
    println!("lexicon:  P={:.4} R={:.4} F={:.4}", lex.precision(), lex.recall(), lex.f1());

    Ok(())
}
