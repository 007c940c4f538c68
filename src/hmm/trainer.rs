use std::time::Instant;

use crate::{
    error::{Error, Result},
    Dataset, Sequence,
};

use super::model::Hmm;

/// Every trained row sums to this value instead of 1.
pub const SCALE_FACTOR: f64 = 4096.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOpt {
    pub scale_factor: f64,
}

impl Default for TrainOpt {
    fn default() -> Self {
        Self { scale_factor: SCALE_FACTOR }
    }
}

/// Maximum-likelihood estimation of HMM parameters by counting.
#[derive(Debug, Default, Clone)]
pub struct Trainer {
    opt: TrainOpt,
}

/// Scales `row` so that it sums to `scale`. All-zero rows stay zero.
fn normalize(row: &mut [f64], scale: f64) {
    let total = row.iter().sum::<f64>() / scale;
    if total == 0.0 {
        return;
    }
    for v in row.iter_mut() {
        *v /= total;
    }
}

impl Trainer {
    pub fn new(opt: TrainOpt) -> Self {
        Self { opt }
    }

    pub fn opt(&self) -> &TrainOpt {
        &self.opt
    }

    /// Estimates start, transition and emission tables from `ds`.
    ///
    /// The model has one state per tag and one observation per word of the
    /// dataset vocabularies.
    #[allow(non_snake_case)]
    pub fn train(&self, ds: &Dataset) -> Result<Hmm> {
        let (L, E) = match (ds.num_labels(), ds.num_words()) {
            (Some(l), Some(e)) => (l, e),
            _ => return Err(Error::EmptyVocabulary),
        };
        if let Some(sentence) = ds.seqs().iter().position(|seq| !seq.is_tagged()) {
            return Err(Error::Untagged { sentence });
        }
        let in_range = |seq: &Sequence| {
            seq.items.len() == seq.labels.len() && seq.iter().all(|(word, tag)| word < E && tag < L)
        };
        if let Some(sentence) = ds.seqs().iter().position(|seq| !in_range(seq)) {
            return Err(Error::OutOfRange { sentence });
        }
        let scale = self.opt.scale_factor;
        log::info!(
            "train (L: {L}, E: {E}, N: {}, items: {}, scale: {scale})",
            ds.len(),
            ds.total_items()
        );
        let mut hmm = Hmm::zeroes(L, E);

        let begin = Instant::now();
        for seq in ds.seqs() {
            hmm.start[seq.labels[0]] += 1.0;
        }
        normalize(&mut hmm.start, scale);
        log::info!("start probabilities, time cost: {:?}", begin.elapsed());

        let begin = Instant::now();
        for seq in ds.seqs() {
            for pair in seq.labels.windows(2) {
                hmm.trans[L * pair[0] + pair[1]] += 1.0;
            }
        }
        for row in hmm.trans.chunks_mut(L) {
            normalize(row, scale);
        }
        log::info!("transition probabilities, time cost: {:?}", begin.elapsed());

        let begin = Instant::now();
        for seq in ds.seqs() {
            for (word, tag) in seq.iter() {
                hmm.emiss[E * tag + word] += 1.0;
            }
        }
        for row in hmm.emiss.chunks_mut(E) {
            normalize(row, scale);
        }
        log::info!("emission probabilities, time cost: {:?}", begin.elapsed());

        Ok(hmm)
    }
}
