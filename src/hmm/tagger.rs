use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{model::Hmm, trellis::Trellis};

bitflags! {
    /// Optional work and diagnostics of a decode call.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DecodeOpt: u8 {
        /// Run the forward recursion to report the observation probability.
        const CUMULATIVE = 0x01;
        /// Report the full trellis of every sequence.
        const TRELLIS = 0x02;
        /// Report the predicted tag of every token.
        const PREDICTIONS = 0x04;
    }
}

pub trait Tagger {
    /// Decodes `observations`, keeping the trellis for inspection.
    fn set_seq(&mut self, observations: &[usize]) -> Result<()>;
    /// Number of items of the current sequence.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Copies the best path of the current sequence to `labels` and returns
    /// its final (rescaled) score.
    fn viterbi(&mut self, labels: &mut Vec<usize>) -> f64;
    /// Log of the total path score, when the forward recursion is enabled.
    fn lognorm(&self) -> Option<f64>;

    fn tag(&mut self, observations: &[usize]) -> Result<Vec<usize>> {
        self.set_seq(observations)?;
        let mut labels = Vec::with_capacity(observations.len());
        self.viterbi(&mut labels);
        Ok(labels)
    }
}

/// Viterbi decoder over a borrowed [`Hmm`].
///
/// The trellis is owned by the tagger and reused from one sequence to the
/// next, so tag many sequences with one tagger rather than one per call.
#[derive(Debug)]
pub struct HmmTagger<'a> {
    model: &'a Hmm,
    ctx: Trellis,
    opt: DecodeOpt,
    labels: Vec<usize>,
    score: f64,
}

impl<'a> HmmTagger<'a> {
    pub fn new(model: &'a Hmm, opt: DecodeOpt) -> Self {
        Self {
            model,
            ctx: Trellis::new(opt.contains(DecodeOpt::CUMULATIVE), model.num_states(), 0),
            opt,
            labels: Vec::new(),
            score: 0.0,
        }
    }

    pub fn opt(&self) -> DecodeOpt {
        self.opt
    }

    pub fn model(&self) -> &Hmm {
        self.model
    }

    /// Trellis of the last decoded sequence.
    pub fn trellis(&self) -> &Trellis {
        &self.ctx
    }

    /// Best path of the last decoded sequence.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn cumulative_probability(&self) -> Option<f64> {
        self.ctx.cumulative_probability()
    }
}

impl<'a> Tagger for HmmTagger<'a> {
    fn set_seq(&mut self, observations: &[usize]) -> Result<()> {
        if observations.is_empty() {
            return Err(Error::EmptySequence);
        }
        self.labels.clear();
        self.labels.resize(observations.len(), 0);
        self.score = self.ctx.viterbi(self.model, observations, &mut self.labels);
        log::debug!("decoded {} items, score: {}", observations.len(), self.score);
        Ok(())
    }

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn viterbi(&mut self, labels: &mut Vec<usize>) -> f64 {
        labels.clear();
        labels.extend_from_slice(&self.labels);
        self.score
    }

    fn lognorm(&self) -> Option<f64> {
        self.ctx.lognorm()
    }
}
