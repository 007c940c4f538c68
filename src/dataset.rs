use std::{
    convert::TryFrom,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    error::{Error, Result},
    quark::{Quark, StringTable, TextVectorizer},
};

/// Tag id given to tokens read without a tag column.
pub const UNTAGGED: usize = usize::MAX;

/// One sentence: word ids and their tag ids, in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sequence {
    pub items: Vec<usize>,
    pub labels: Vec<usize>,
}

impl Sequence {
    pub fn push(&mut self, item: usize, label: usize) {
        self.items.push(item);
        self.labels.push(label);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_tagged(&self) -> bool {
        !self.labels.contains(&UNTAGGED)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.items.iter().copied().zip(self.labels.iter().copied())
    }
}

impl FromIterator<(usize, usize)> for Sequence {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut seq = Sequence::default();
        for (item, label) in iter {
            seq.push(item, label);
        }
        seq
    }
}

/// A tagged corpus together with the vocabularies used to index it.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    seqs: Vec<Sequence>,
    words: Quark,
    tags: Quark,
}

impl Dataset {
    /// Empty dataset that keeps indexing with copies of `other`'s vocabularies.
    pub fn extending(other: &Dataset) -> Self {
        Self::with_vocab(other.words.clone(), other.tags.clone())
    }

    pub fn with_vocab(words: Quark, tags: Quark) -> Self {
        Self { seqs: Vec::new(), words, tags }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut ds = Dataset::default();
        ds.read_file(File::open(path)?)?;
        Ok(ds)
    }

    /// Reads `path` resolving tokens through copies of `other`'s vocabularies,
    /// so ids seen in training keep their values.
    pub fn from_path_extending<P: AsRef<Path>>(other: &Dataset, path: P) -> Result<Self> {
        let mut ds = Dataset::extending(other);
        ds.read_file(File::open(path)?)?;
        Ok(ds)
    }

    pub fn read_file(&mut self, file: File) -> Result<()> {
        self.read(BufReader::new(file))
    }

    /// Appends the sentences of a `word<TAB>tag` corpus.
    ///
    /// Blank or whitespace-only lines end a sentence. A missing tag column gives [`UNTAGGED`].
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let mut seq = Sequence::default();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                self.push(std::mem::take(&mut seq));
                continue;
            }
            let mut fields = line.split('\t');
            let word = fields.next().unwrap_or_default();
            let tag = fields.next();
            let rest = fields.count();
            if rest > 0 {
                return Err(Error::InvalidLine { line: n + 1, fields: rest + 2 });
            }
            let label = match tag {
                Some(tag) => self.tags.find_or_insert(tag),
                None => UNTAGGED,
            };
            seq.push(self.words.find_or_insert(word), label);
        }
        self.push(seq);
        log::debug!(
            "read {} sentences ({} words, {} tags)",
            self.seqs.len(),
            self.words.len(),
            self.tags.len()
        );
        Ok(())
    }

    /// Appends `seq` unless it is empty.
    pub fn push(&mut self, seq: Sequence) {
        if !seq.is_empty() {
            self.seqs.push(seq);
        }
    }

    pub fn seqs(&self) -> &[Sequence] {
        &self.seqs
    }

    pub fn words(&self) -> &Quark {
        &self.words
    }

    pub fn tags(&self) -> &Quark {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn num_labels(&self) -> Option<usize> {
        self.tags.count()
    }

    pub fn num_words(&self) -> Option<usize> {
        self.words.count()
    }

    pub fn max_length(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn total_items(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).sum()
    }
}

impl TryFrom<File> for Dataset {
    type Error = Error;

    fn try_from(value: File) -> Result<Self> {
        let mut ds = Dataset::default();
        ds.read_file(value)?;
        Ok(ds)
    }
}

impl TryFrom<&str> for Dataset {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        let mut ds = Dataset::default();
        ds.read(value.as_bytes())?;
        Ok(ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_sentences() {
        let ds = Dataset::try_from("the\tDET\ndog\tNOUN\n\n\nruns\tVERB\n\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.seqs()[0].items, vec![0, 1]);
        assert_eq!(ds.seqs()[0].labels, vec![0, 1]);
        assert_eq!(ds.seqs()[1].items, vec![2]);
        assert_eq!(ds.seqs()[1].labels, vec![2]);
        assert_eq!(ds.total_items(), 3);
        assert_eq!(ds.max_length(), 2);
        assert_eq!(ds.num_labels(), Some(3));
    }

    #[test]
    fn keeps_trailing_sentence() {
        let ds = Dataset::try_from("a\tX\n\nb\tY").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.seqs()[1].items, vec![1]);
    }

    #[test]
    fn untagged_tokens() {
        let ds = Dataset::try_from("a\nb\tX\n").unwrap();
        let seq = &ds.seqs()[0];
        assert_eq!(seq.labels, vec![UNTAGGED, 0]);
        assert!(!seq.is_tagged());
        assert_eq!(ds.num_labels(), Some(1));
    }

    #[test]
    fn rejects_extra_fields() {
        let err = Dataset::try_from("a\tX\nb\tY\tZ\n").unwrap_err();
        match err {
            Error::InvalidLine { line, fields } => {
                assert_eq!(line, 2);
                assert_eq!(fields, 3);
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn extending_keeps_training_ids() {
        let train = Dataset::try_from("the\tDET\ndog\tNOUN\n").unwrap();
        let mut test = Dataset::extending(&train);
        test.read("cat\tNOUN\nthe\tDET\n".as_bytes()).unwrap();
        assert_eq!(test.seqs()[0].items, vec![2, 0]);
        assert_eq!(test.seqs()[0].labels, vec![1, 0]);
        assert_eq!(train.words().count(), Some(2));
        assert_eq!(test.words().count(), Some(3));
        assert_eq!(test.words().to_str(2), Some("cat"));
    }

    #[test]
    fn whitespace_line_ends_sentence() {
        let ds = Dataset::try_from("a\tX\n  \t \nb\tY\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.words().len(), 2);
        assert_eq!(ds.words().to_id("  "), None);
    }

    #[test]
    fn empty_input() {
        let ds = Dataset::try_from("\n\n").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.num_words(), None);
        assert_eq!(ds.max_length(), 0);
    }
}
