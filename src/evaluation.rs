use std::{fmt::Display, io::Write, iter::zip};

use crate::{
    error::Result,
    hmm::{
        model::Hmm,
        tagger::{DecodeOpt, Tagger},
    },
    quark::{Quark, StringTable},
    Dataset,
};

/// Counts and scores of one tag.
#[derive(Debug, Default, Clone)]
struct LabelMeasure {
    /// Tokens where gold and predicted tag are both this tag.
    num_correct: usize,
    /// Gold occurrences.
    num_observation: usize,
    /// Predicted occurrences.
    num_prediction: usize,
    precision: f64,
    recall: f64,
    fmeasure: f64,
}

impl LabelMeasure {
    /// Fills precision, recall and F1 from the counts. Returns `false` for a
    /// tag that never occurs in the gold data.
    fn score(&mut self) -> bool {
        self.precision = 0.0;
        self.recall = 0.0;
        self.fmeasure = 0.0;
        if self.num_observation == 0 {
            return false;
        }
        if self.num_prediction > 0 {
            self.precision = self.num_correct as f64 / self.num_prediction as f64;
        }
        self.recall = self.num_correct as f64 / self.num_observation as f64;
        let sum = self.precision + self.recall;
        if sum > 0.0 {
            self.fmeasure = 2.0 * self.precision * self.recall / sum;
        }
        true
    }
}

/// Tagging performance accumulated over a dataset.
#[derive(Debug, Default, Clone)]
pub struct Evaluation {
    /// Per-tag measures, indexed by tag id.
    tbl: Vec<LabelMeasure>,
    /// Tag names for the report.
    labels: Quark,

    /// Tokens and correctly tagged tokens.
    item_total_correct: usize,
    item_total_num: usize,

    /// Sentences and sentences tagged without a single error.
    inst_total_correct: usize,
    inst_total_num: usize,

    macro_precision: f64,
    macro_recall: f64,
    macro_fmeasure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl Evaluation {
    pub fn new(labels: Quark) -> Self {
        Self { labels, ..Default::default() }
    }

    fn measure(&mut self, label: usize) -> Option<&mut LabelMeasure> {
        // untagged references have no row
        if label == crate::UNTAGGED {
            return None;
        }
        if self.tbl.len() <= label {
            self.tbl.resize(label + 1, LabelMeasure::default());
        }
        self.tbl.get_mut(label)
    }

    /// Adds one sequence of gold tags and the predicted tags.
    pub fn accumulate(&mut self, reference: &[usize], prediction: &[usize]) {
        let mut matched = 0;
        self.inst_total_num += 1;
        for (&r, &p) in zip(reference, prediction) {
            if let Some(m) = self.measure(r) {
                m.num_observation += 1;
            }
            if let Some(m) = self.measure(p) {
                m.num_prediction += 1;
            }
            if r == p {
                if let Some(m) = self.measure(r) {
                    m.num_correct += 1;
                }
                matched += 1;
            }
            self.item_total_num += 1;
        }
        self.item_total_correct += matched;
        // a sentence counts as correct only when every token matched
        self.inst_total_correct += usize::from(matched == prediction.len());
    }

    /// Fraction of items tagged correctly, `None` when nothing was scored.
    pub fn item_accuracy(&self) -> Option<f64> {
        (self.item_total_num > 0).then(|| self.item_total_correct as f64 / self.item_total_num as f64)
    }

    /// Fraction of sequences tagged entirely correctly.
    pub fn inst_accuracy(&self) -> Option<f64> {
        (self.inst_total_num > 0).then(|| self.inst_total_correct as f64 / self.inst_total_num as f64)
    }

    pub fn item_total_correct(&self) -> usize {
        self.item_total_correct
    }

    pub fn item_total_num(&self) -> usize {
        self.item_total_num
    }

    /// Computes label-wise and macro-averaged precision, recall and F1.
    ///
    /// Tags absent from the gold data are left out of the averages.
    pub fn evaluate(&mut self) -> Estimation {
        let mut sums = (0.0, 0.0, 0.0);
        let mut scored = 0;
        for m in self.tbl.iter_mut().filter_map(|m| m.score().then_some(m)) {
            sums.0 += m.precision;
            sums.1 += m.recall;
            sums.2 += m.fmeasure;
            scored += 1;
        }
        let n = scored.max(1) as f64;
        self.macro_precision = sums.0 / n;
        self.macro_recall = sums.1 / n;
        self.macro_fmeasure = sums.2 / n;
        Estimation {
            precision: self.macro_precision,
            recall: self.macro_recall,
            fmeasure: self.macro_fmeasure,
        }
    }
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}"))
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        for (id, m) in self.tbl.iter().enumerate() {
            let label = self.labels.to_str(id).unwrap_or("N/A");
            write!(f, "\t{label}: ({}, {}, {}) ", m.num_correct, m.num_prediction, m.num_observation)?;
            if m.num_observation == 0 {
                writeln!(f, "(******, ******, ******)")?;
            } else {
                writeln!(f, "({:.4}, {:.4}, {:.4})", m.precision, m.recall, m.fmeasure)?;
            }
        }
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({:.4}, {:.4}, {:.4})",
            self.macro_precision, self.macro_recall, self.macro_fmeasure
        )?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {}",
            self.item_total_correct,
            self.item_total_num,
            ratio(self.item_accuracy())
        )?;
        write!(
            f,
            "Sequence accuracy: {}/{} => {}",
            self.inst_total_correct,
            self.inst_total_num,
            ratio(self.inst_accuracy())
        )
    }
}

/// Decodes every sentence of a dataset and scores it against the gold tags.
pub struct Evaluator<'a> {
    model: &'a Hmm,
    opt: DecodeOpt,
}

impl<'a> Evaluator<'a> {
    pub fn new(model: &'a Hmm, opt: DecodeOpt) -> Self {
        Self { model, opt }
    }

    /// Runs the evaluation, writing the diagnostics selected by the decode
    /// options to `out`.
    pub fn evaluate<W: Write>(&self, ds: &Dataset, out: &mut W) -> Result<Evaluation> {
        let mut tagger = self.model.tagger(self.opt);
        let mut evaluation = Evaluation::new(ds.tags().clone());
        let mut prediction = Vec::new();
        for seq in ds.seqs() {
            tagger.set_seq(&seq.items)?;
            tagger.viterbi(&mut prediction);
            evaluation.accumulate(&seq.labels, &prediction);

            if self.opt.contains(DecodeOpt::TRELLIS) {
                write!(out, "{}", tagger.trellis())?;
            }
            if let Some(p) = tagger.cumulative_probability() {
                writeln!(out, "Cumulative observation probability: {:.4}", p)?;
            }
            if self.opt.contains(DecodeOpt::PREDICTIONS) {
                for (&word, &tag) in zip(&seq.items, &prediction) {
                    writeln!(
                        out,
                        "{}\t{}",
                        ds.words().to_str(word).unwrap_or("N/A"),
                        ds.tags().to_str(tag).unwrap_or("N/A")
                    )?;
                }
                writeln!(out)?;
            }
        }
        evaluation.evaluate();
        log::info!(
            "evaluated {} sentences, item accuracy: {}",
            evaluation.inst_total_num,
            ratio(evaluation.item_accuracy())
        );
        Ok(evaluation)
    }
}

/// Decodes `ds` with `model` and returns the tagging performance.
pub fn evaluate(model: &Hmm, ds: &Dataset) -> Result<Evaluation> {
    Evaluator::new(model, DecodeOpt::empty()).evaluate(ds, &mut std::io::sink())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate() {
        let mut e = Evaluation::new(Quark::new(&["A".to_string(), "B".to_string()]));
        e.accumulate(&[0, 1, 0], &[0, 0, 0]);
        e.accumulate(&[1, 1], &[1, 1]);
        assert_eq!(e.item_total_correct(), 4);
        assert_eq!(e.item_total_num(), 5);
        assert_eq!(e.item_accuracy(), Some(0.8));
        assert_eq!(e.inst_accuracy(), Some(0.5));
        let est = e.evaluate();
        // A: 2 correct / 3 predicted / 2 observed, B: 2 / 2 / 3
        assert!((est.precision - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-12);
        assert!((est.recall - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert!((est.fmeasure - 0.8).abs() < 1e-12);
    }

    #[test]
    fn empty_is_undefined() {
        let mut e = Evaluation::default();
        assert_eq!(e.item_accuracy(), None);
        assert_eq!(e.inst_accuracy(), None);
        let est = e.evaluate();
        assert_eq!(est.precision, 0.0);
        assert!(e.to_string().ends_with("Item accuracy: 0/0 => N/A\nSequence accuracy: 0/0 => N/A"));
    }

    #[test]
    fn untagged_references_never_match() {
        let mut e = Evaluation::default();
        e.accumulate(&[crate::UNTAGGED, 0], &[0, 0]);
        assert_eq!(e.item_accuracy(), Some(0.5));
        e.evaluate();
        assert_eq!(e.tbl.len(), 1);
        assert_eq!(e.tbl[0].num_prediction, 2);
    }

    #[test]
    fn diagnostics() {
        let train = Dataset::try_from("the\tNOUN\ndog\tNOUN\nruns\tVERB\n").unwrap();
        let hmm = Hmm::train(&train).unwrap();
        let mut out = Vec::new();
        let opt = DecodeOpt::PREDICTIONS | DecodeOpt::CUMULATIVE;
        let e = Evaluator::new(&hmm, opt).evaluate(&train, &mut out).unwrap();
        assert_eq!(e.item_accuracy(), Some(1.0));
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Cumulative observation probability: "));
        assert!(text.ends_with("the\tNOUN\ndog\tNOUN\nruns\tVERB\n\n"));

        let mut out = Vec::new();
        Evaluator::new(&hmm, DecodeOpt::empty()).evaluate(&train, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
