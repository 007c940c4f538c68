use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    quark::{Quark, StringTable},
    Dataset,
};

use super::{
    tagger::{DecodeOpt, HmmTagger, Tagger},
    trainer::Trainer,
};

/// Parameters of a first-order HMM.
///
/// Tables are stored row-major in flat vectors:
/// - `start` is a `[S]` vector,
/// - `trans` is a `[S][S]` matrix whose element `[i][j]` scores the move
///   from state #i to state #j,
/// - `emiss` is a `[S][E]` matrix whose element `[s][w]` scores emitting
///   observation #w from state #s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHmm")]
pub struct Hmm {
    num_states: usize,
    num_obs: usize,
    pub(crate) start: Vec<f64>,
    pub(crate) trans: Vec<f64>,
    pub(crate) emiss: Vec<f64>,
}

/// Tables as stored on disk, before the shape checks.
#[derive(Deserialize)]
struct RawHmm {
    num_states: usize,
    num_obs: usize,
    start: Vec<f64>,
    trans: Vec<f64>,
    emiss: Vec<f64>,
}

impl TryFrom<RawHmm> for Hmm {
    type Error = Error;

    fn try_from(raw: RawHmm) -> Result<Self> {
        let (states, obs) = (raw.num_states, raw.num_obs);
        if states == 0 {
            return Err(Error::Shape("no states".into()));
        }
        let expected = [
            ("start", raw.start.len(), states),
            ("trans", raw.trans.len(), states * states),
            ("emiss", raw.emiss.len(), states * obs),
        ];
        for (name, len, want) in expected {
            if len != want {
                return Err(Error::Shape(format!("{name} has {len} entries, expected {want}")));
            }
        }
        Ok(Self {
            num_states: states,
            num_obs: obs,
            start: raw.start,
            trans: raw.trans,
            emiss: raw.emiss,
        })
    }
}

impl Hmm {
    pub fn zeroes(num_states: usize, num_obs: usize) -> Self {
        Self {
            num_states,
            num_obs,
            start: vec![0.0; num_states],
            trans: vec![0.0; num_states * num_states],
            emiss: vec![0.0; num_states * num_obs],
        }
    }

    /// Builds a model from explicit nested tables.
    pub fn from_tables(start: Vec<f64>, trans: Vec<Vec<f64>>, emiss: Vec<Vec<f64>>) -> Result<Self> {
        let num_states = start.len();
        if num_states == 0 {
            return Err(Error::Shape("no states".into()));
        }
        if trans.len() != num_states || emiss.len() != num_states {
            return Err(Error::Shape(format!(
                "{} states but {} transition rows and {} emission rows",
                num_states,
                trans.len(),
                emiss.len()
            )));
        }
        let num_obs = emiss[0].len();
        if let Some(i) = trans.iter().position(|row| row.len() != num_states) {
            return Err(Error::Shape(format!("transition row {i} has {} columns", trans[i].len())));
        }
        if let Some(i) = emiss.iter().position(|row| row.len() != num_obs) {
            return Err(Error::Shape(format!("emission row {i} has {} columns", emiss[i].len())));
        }
        Ok(Self {
            num_states,
            num_obs,
            start,
            trans: trans.concat(),
            emiss: emiss.concat(),
        })
    }

    /// Estimates a model from `ds` with the default training options.
    pub fn train(ds: &Dataset) -> Result<Self> {
        Trainer::default().train(ds)
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    #[inline]
    pub fn num_obs(&self) -> usize {
        self.num_obs
    }

    #[inline]
    pub fn start(&self) -> &[f64] {
        &self.start
    }

    #[inline]
    pub fn trans_row(&self, i: usize) -> &[f64] {
        &self.trans[self.num_states * i..self.num_states * (i + 1)]
    }

    #[inline]
    pub fn emiss_row(&self, s: usize) -> &[f64] {
        &self.emiss[self.num_obs * s..self.num_obs * (s + 1)]
    }

    #[inline]
    pub fn trans(&self, i: usize, j: usize) -> f64 {
        self.trans[self.num_states * i + j]
    }

    /// Emission score of `obs` from state `s`.
    ///
    /// Observations outside the trained vocabulary score 1.0, so they leave
    /// the path scores untouched.
    #[inline]
    pub fn emission(&self, s: usize, obs: usize) -> f64 {
        if obs < self.num_obs {
            self.emiss[self.num_obs * s + obs]
        } else {
            1.0
        }
    }

    pub fn tagger(&self, opt: DecodeOpt) -> HmmTagger<'_> {
        HmmTagger::new(self, opt)
    }

    /// Most probable state sequence for `observations`.
    pub fn decode(&self, observations: &[usize]) -> Result<Vec<usize>> {
        self.tagger(DecodeOpt::empty()).tag(observations)
    }
}

/// A trained HMM bundled with the vocabularies it was trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub hmm: Hmm,
    pub words: Quark,
    pub tags: Quark,
}

impl Model {
    pub fn train(ds: &Dataset) -> Result<Self> {
        Self::train_with(&Trainer::default(), ds)
    }

    pub fn train_with(trainer: &Trainer, ds: &Dataset) -> Result<Self> {
        Ok(Self {
            hmm: trainer.train(ds)?,
            words: ds.words().clone(),
            tags: ds.tags().clone(),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model: Model = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        log::info!(
            "loaded model from {} ({} states, {} observations)",
            path.display(),
            model.hmm.num_states(),
            model.hmm.num_obs()
        );
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut w, self)?;
        w.flush()?;
        log::info!("write model to {}", path.display());
        Ok(())
    }

    pub fn tagger(&self, opt: DecodeOpt) -> HmmTagger<'_> {
        self.hmm.tagger(opt)
    }

    /// Empty dataset indexing with copies of the model vocabularies.
    pub fn dataset(&self) -> Dataset {
        Dataset::with_vocab(self.words.clone(), self.tags.clone())
    }

    /// Writes the model parameters in a plain-text format.
    pub fn dump<W: Write>(&self, w: &mut W) -> Result<()> {
        let hmm = &self.hmm;
        let tag = |i: usize| self.tags.to_str(i).unwrap_or("N/A");
        writeln!(w, "FILEHEADER = {{")?;
        writeln!(w, "  num_states: {}", hmm.num_states())?;
        writeln!(w, "  num_obs: {}", hmm.num_obs())?;
        writeln!(w, "}}")?;
        writeln!(w)?;
        writeln!(w, "START = {{")?;
        for (i, p) in hmm.start().iter().enumerate() {
            writeln!(w, "  {}: {:.6}", tag(i), p)?;
        }
        writeln!(w, "}}")?;
        writeln!(w)?;
        writeln!(w, "TRANSITIONS = {{")?;
        for i in 0..hmm.num_states() {
            for (j, p) in hmm.trans_row(i).iter().enumerate() {
                if *p != 0.0 {
                    writeln!(w, "  ({}) {} --> {}: {:.6}", i, tag(i), tag(j), p)?;
                }
            }
        }
        writeln!(w, "}}")?;
        writeln!(w)?;
        writeln!(w, "EMISSIONS = {{")?;
        for s in 0..hmm.num_states() {
            for (o, p) in hmm.emiss_row(s).iter().enumerate() {
                if *p != 0.0 {
                    let word = self.words.to_str(o).unwrap_or("N/A");
                    writeln!(w, "  ({}) {} --> {}: {:.6}", s, tag(s), word, p)?;
                }
            }
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}
