use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub trait StringTable {
    fn to_str(&self, id: usize) -> Option<&str>;
    fn to_id(&self, s: &str) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait TextVectorizer {
    fn find_or_insert(&mut self, key: &str) -> usize;
}

/// Append-only string interner. Ids are dense and follow first-seen order.
///
/// `Clone` is a deep copy: a test corpus extends its own copy of the
/// training vocabulary and the training ids stay where they were.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Quark {
    strings: Vec<String>,
    ids: HashMap<String, usize>,
}

impl From<Vec<String>> for Quark {
    fn from(strings: Vec<String>) -> Self {
        let ids = strings.iter().enumerate().map(|(id, s)| (s.clone(), id)).collect();
        Self { strings, ids }
    }
}

impl From<Quark> for Vec<String> {
    fn from(value: Quark) -> Self {
        value.strings
    }
}

impl StringTable for Quark {
    fn to_str(&self, id: usize) -> Option<&str> {
        self.strings.get(id).map(String::as_str)
    }

    fn to_id(&self, s: &str) -> Option<usize> {
        self.ids.get(s).copied()
    }

    fn len(&self) -> usize {
        self.strings.len()
    }
}

impl TextVectorizer for Quark {
    fn find_or_insert(&mut self, key: &str) -> usize {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = self.strings.len();
        self.ids.insert(key.to_owned(), id);
        self.strings.push(key.to_owned());
        id
    }
}

impl Quark {
    pub fn new(v: &[String]) -> Self {
        Self::from(v.to_vec())
    }

    /// Returns the id of `key`, registering it first if it is new.
    #[inline]
    pub fn resolve(&mut self, key: &str) -> usize {
        self.find_or_insert(key)
    }

    /// Number of registered strings, `None` while nothing is registered.
    pub fn count(&self) -> Option<usize> {
        match self.strings.len() {
            0 => None,
            n => Some(n),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.strings.iter().map(String::as_str).enumerate()
    }
}
