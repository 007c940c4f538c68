use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Decoding needs at least one observation.
    #[error("empty observation sequence")]
    EmptySequence,
    /// A corpus line with neither one nor two tab-separated fields.
    #[error("invalid line {line}: expected 1 or 2 fields, got {fields}")]
    InvalidLine { line: usize, fields: usize },
    #[error("no words or tags registered, cannot size the model")]
    EmptyVocabulary,
    #[error("sentence {sentence} contains untagged tokens")]
    Untagged { sentence: usize },
    /// A word or tag id outside the vocabulary the model is sized from, or
    /// a sentence with a different number of words and tags.
    #[error("sentence {sentence} does not fit the vocabulary")]
    OutOfRange { sentence: usize },
    #[error("inconsistent model tables: {0}")]
    Shape(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
