//! Corpus loading: the whitespace-segmented training format (one
//! space-separated utterance per line, `field_separator` configurable),
//! the `Training:`/`Test:` experiment format that also carries two-AFC
//! items, and the train/held-out split driven by `train_frac`.
//!
//! Grounded on `Data.cc`'s line-oriented parser: lines are either plain
//! training utterances, or (in "eval" files) tagged blocks introduced by a
//! `Training:` or `Test:` header.

use crate::error::WordsegError;
use crate::scoring::TwoAfcItem;

/// One line of input: its characters with inter-word spaces stripped, plus
/// the gold interior boundary offsets recovered from the original
/// whitespace positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub chars: Vec<char>,
    pub gold_boundaries: Vec<usize>,
}

impl Utterance {
    /// Parse one line on `field_separator`, collapsing consecutive
    /// separators and stripping ends, recording a gold boundary at each
    /// surviving separator's character offset.
    pub fn from_line(line: &str, field_separator: char) -> Self {
        let mut chars = Vec::new();
        let mut gold_boundaries = Vec::new();
        for word in line.split(field_separator).filter(|w| !w.is_empty()) {
            if !chars.is_empty() {
                gold_boundaries.push(chars.len());
            }
            chars.extend(word.chars());
        }
        Self {
            chars,
            gold_boundaries,
        }
    }
}

/// Parse a whole corpus (one utterance per non-empty line).
pub fn parse_corpus(text: &str, field_separator: char) -> Vec<Utterance> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| Utterance::from_line(l, field_separator))
        .collect()
}

/// Split a corpus deterministically into a training prefix and a held-out
/// suffix, sized by `train_frac` (`1.0` keeps everything for training).
pub fn split_train_eval(utterances: &[Utterance], train_frac: f64) -> Result<(Vec<Utterance>, Vec<Utterance>), WordsegError> {
    if !(0.0..=1.0).contains(&train_frac) {
        return Err(WordsegError::ConfigConflict(format!(
            "train_frac must be in [0,1], got {train_frac}"
        )));
    }
    let split_at = ((utterances.len() as f64) * train_frac).round() as usize;
    let split_at = split_at.min(utterances.len());
    Ok((utterances[..split_at].to_vec(), utterances[split_at..].to_vec()))
}

/// An experiment file's two blocks, parsed from `Training:`/`Test:`
/// headers. Lines under `Test:` are `context<sep>correct<sep>foil` triples
/// used to build `TwoAfcItem`s.
#[derive(Debug, Clone, Default)]
pub struct ExperimentFile {
    pub training: Vec<Utterance>,
    pub test_items: Vec<TwoAfcItem>,
}

pub fn parse_experiment_file(text: &str, field_separator: char) -> Result<ExperimentFile, WordsegError> {
    let mut file = ExperimentFile::default();
    let mut in_test = false;
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("Training:") {
            in_test = false;
            continue;
        }
        if line.eq_ignore_ascii_case("Test:") {
            in_test = true;
            continue;
        }
        if in_test {
            let fields: Vec<&str> = line.split(field_separator).filter(|f| !f.is_empty()).collect();
            if fields.len() != 3 {
                return Err(WordsegError::ParseFailure(format!(
                    "Test: line must have 3 fields (context, correct, foil), got {}: {line:?}",
                    fields.len()
                )));
            }
            file.test_items.push(TwoAfcItem {
                context: fields[0].chars().collect(),
                correct: fields[1].chars().collect(),
                foil: fields[2].chars().collect(),
            });
        } else {
            file.training.push(Utterance::from_line(line, field_separator));
        }
    }
    Ok(file)
}

/// Render a hypothesis segmentation back to whitespace-separated text, the
/// inverse of `Utterance::from_line`.
pub fn write_segmented(chars: &[char], boundaries: &[usize], field_separator: char) -> String {
    let mut out = String::new();
    let mut cuts: Vec<usize> = boundaries.to_vec();
    cuts.sort_unstable();
    let mut start = 0;
    for &cut in &cuts {
        out.extend(&chars[start..cut]);
        out.push(field_separator);
        start = cut;
    }
    out.extend(&chars[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_utterance() {
        let u = Utterance::from_line("the cat sat", ' ');
        assert_eq!(u.chars, "thecatsat".chars().collect::<Vec<_>>());
        assert_eq!(u.gold_boundaries, vec![3, 6]);
    }

    #[test]
    fn collapses_repeated_separators() {
        let u = Utterance::from_line("the   cat", ' ');
        assert_eq!(u.gold_boundaries, vec![3]);
    }

    #[test]
    fn split_respects_train_frac() {
        let corpus = parse_corpus("a b\nc d\ne f\ng h", ' ');
        let (train, eval) = split_train_eval(&corpus, 0.5).unwrap();
        assert_eq!(train.len(), 2);
        assert_eq!(eval.len(), 2);
    }

    #[test]
    fn split_rejects_out_of_range_frac() {
        let corpus = parse_corpus("a b", ' ');
        assert!(split_train_eval(&corpus, 1.5).is_err());
    }

    #[test]
    fn experiment_file_separates_training_and_test() {
        let text = "Training:\nthe cat\nTest:\nthe cat dog\n";
        let file = parse_experiment_file(text, ' ').unwrap();
        assert_eq!(file.training.len(), 1);
        assert_eq!(file.test_items.len(), 1);
        assert_eq!(file.test_items[0].correct, vec!['c', 'a', 't']);
    }

    #[test]
    fn write_segmented_round_trips_boundaries() {
        let chars: Vec<char> = "thecat".chars().collect();
        let s = write_segmented(&chars, &[3], ' ');
        assert_eq!(s, "the cat");
    }
}
