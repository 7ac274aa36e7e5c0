//! Batch adaptor grammar word segmentation over a corpus file.
//!
//! Usage:
//!   ag-cli --input corpus.txt --output segmented.txt
//!   ag-cli --input corpus.txt --grammar unigram.grammar --word-category Word

use clap::Parser;
use std::path::PathBuf;
use wordseg_ag::{default_unigram_grammar, AgEstimator, AgSentence, Grammar};
use wordseg_core::config::WordsegConfig;
use wordseg_core::corpus::parse_corpus;
use wordseg_core::WordsegContext;

#[derive(Parser, Debug)]
#[command(name = "ag-cli")]
#[command(about = "Adaptor grammar word segmentation via CKY + Metropolis-Hastings Gibbs sampling")]
struct Args {
    /// One-sentence-per-line corpus, optionally gold-segmented.
    #[arg(short, long)]
    input: PathBuf,

    /// TOML run configuration; defaults are used for any field it omits.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rule file in the `adapt CAT a b` / `weight LHS --> RHS...` format. If
    /// omitted, the built-in `Sentence/Words/Word/Chars/Char` unigram
    /// grammar is used.
    #[arg(short, long)]
    grammar: Option<PathBuf>,

    /// Which adapted nonterminal's spans constitute the segmentation.
    #[arg(long, default_value = "Word")]
    word_category: String,

    /// Pitman-Yor discount/concentration for the built-in grammar's `Word`
    /// category; ignored when `--grammar` is given.
    #[arg(long, default_value_t = 0.0)]
    pya: f64,
    #[arg(long, default_value_t = 10.0)]
    pyb: f64,

    #[arg(short, long, default_value = "segmented.txt")]
    output: PathBuf,

    /// Also write the learned grammar (rule file plus one `pycache` block
    /// per adapted category) to this path.
    #[arg(long)]
    save_grammar: Option<PathBuf>,

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

    let text = std::fs::read_to_string(&args.input)?;
    let utterances = parse_corpus(&text, config.field_separator);
    tracing::info!(count = utterances.len(), "loaded corpus");

    let mut ctx = WordsegContext::new();
    let grammar = match &args.grammar {
        Some(path) => {
            let rule_text = std::fs::read_to_string(path)?;
            let mut g = Grammar::parse(&rule_text, &mut ctx)?;
            let alphabet: Vec<char> = utterances
                .iter()
                .flat_map(|u| u.chars.iter().copied())
                .collect::<std::collections::HashSet<_>>()
                .into_iter()
                .collect();
            g.expand_char_terminal(&alphabet);
            g
        }
        None => {
            let alphabet: Vec<char> = utterances
                .iter()
                .flat_map(|u| u.chars.iter().copied())
                .collect::<std::collections::HashSet<_>>()
                .into_iter()
                .collect();
            default_unigram_grammar(&mut ctx, &alphabet, args.pya, args.pyb)
        }
    };
    let word_cat = ctx.intern(&args.word_category);

    let sentences: Vec<AgSentence> = utterances.iter().map(|u| AgSentence::new(u.chars.clone())).collect();
    let mut estimator = AgEstimator::new(grammar, word_cat, sentences, &config);
    estimator.run_batch(&config)?;
    tracing::info!(acceptance_rate = estimator.acceptance_rate(), "ag run complete");

    let mut out = String::new();
    for sentence in &estimator.sentences {
        let mut pieces = Vec::with_capacity(sentence.words.len());
        for &(s, e) in &sentence.words {
            pieces.push(sentence.chars[s..e].iter().collect::<String>());
        }
        out.push_str(&pieces.join(&config.field_separator.to_string()));
        out.push('\n');
    }
    std::fs::write(&args.output, out)?;
    tracing::info!(path = %args.output.display(), "wrote segmentation");

    if let Some(path) = &args.save_grammar {
        let mut grammar_out = estimator.grammar.write_rules(&ctx.symbols);
        grammar_out.push_str(&estimator.pycache_blocks(&ctx.symbols));
        std::fs::write(path, grammar_out)?;
        tracing::info!(path = %path.display(), "wrote learned grammar");
    }

    Ok(())
}
