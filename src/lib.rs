//! First-order hidden Markov model tagger.
//!
//! Train a model from a `word<TAB>tag` corpus, then decode new sentences
//! with the Viterbi algorithm:
//!
//! ```
//! use hmmtag::{evaluate, Dataset, Hmm};
//!
//! let train = Dataset::try_from("the\tNOUN\ndog\tNOUN\nruns\tVERB\n").unwrap();
//! let hmm = Hmm::train(&train).unwrap();
//! assert_eq!(hmm.decode(&[0, 1, 2]).unwrap(), vec![0, 0, 1]);
//! assert_eq!(evaluate(&hmm, &train).unwrap().item_accuracy(), Some(1.0));
//! ```
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod hmm;
pub mod quark;

pub use dataset::{Dataset, Sequence, UNTAGGED};
pub use error::{Error, Result};
pub use evaluation::{evaluate, Estimation, Evaluation, Evaluator};
pub use hmm::{
    model::{Hmm, Model},
    tagger::{DecodeOpt, HmmTagger, Tagger},
    trainer::{TrainOpt, Trainer, SCALE_FACTOR},
    trellis::Trellis,
};
pub use quark::{Quark, StringTable, TextVectorizer};
