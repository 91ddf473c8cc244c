//! [In-memory implementation](Dataset) of [RDF datasets](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
//!
//! Usage example:
//! ```
//! use yardf::*;
//!
//! let mut dataset = Dataset::new();
//!
//! // insertion
//! let ex = NamedNode::new("http://example.com")?;
//! let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), ex.clone())?;
//! dataset.add(&quad);
//!
//! // simple filter
//! let ex = Term::from(ex);
//! let results: Vec<_> = dataset.match_pattern(Some(&ex), None, None, None).iter().collect();
//! assert_eq!(vec![quad], results);
//!
//! // Print
//! assert_eq!(
//!     dataset.to_string(),
//!     "<http://example.com> <http://example.com> <http://example.com> <http://example.com> .\n"
//! );
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::canonicalization::{CanonicalizationError, Canonicalizer};
use crate::index::{Iter, QuadIndex};
use crate::{Quad, Term, TermParseError, TermSerializer};
use std::borrow::Borrow;
use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;
#[cfg(feature = "async-tokio")]
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// An in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
///
/// Quads are stored in a [`QuadIndex`] so that any pattern can be matched without full scan.
///
/// Usage example:
/// ```
/// use yardf::*;
///
/// let ex = NamedNode::new("http://example.com")?;
/// let mut dataset = Dataset::new();
/// dataset.add(&Quad::new_default_graph(ex.clone(), ex.clone(), ex.clone())?);
/// dataset.add(&Quad::new(ex.clone(), ex.clone(), ex.clone(), ex.clone())?);
///
/// let ex = Term::from(ex);
/// assert_eq!(dataset.match_pattern(None, None, None, Some(&ex)).len(), 1);
/// assert_eq!(dataset.match_pattern(Some(&ex), None, None, None).len(), 2);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    index: QuadIndex,
}

impl Dataset {
    /// Creates a new dataset
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quad to the dataset. Returns `false` if it was already there.
    #[inline]
    pub fn add(&mut self, quad: &Quad) -> bool {
        self.index.add(quad)
    }

    /// Removes a quad from the dataset. Returns `false` if it was not there.
    #[inline]
    pub fn delete(&mut self, quad: &Quad) -> bool {
        self.index.delete(quad)
    }

    /// Checks if the dataset contains the given quad.
    #[inline]
    pub fn has(&self, quad: &Quad) -> bool {
        self.index.has(quad)
    }

    /// Returns a new dataset with the quads matching the pattern, `None` being a wildcard.
    ///
    /// If a bound term is not in the dataset the result is empty.
    pub fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph_name: Option<&Term>,
    ) -> Self {
        Self {
            index: self
                .index
                .match_pattern(subject, predicate, object, graph_name),
        }
    }

    /// Returns the number of quads in this dataset.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Checks if this dataset contains a quad.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns all the quads contained by the dataset.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        self.index.iter()
    }

    /// Adds all the given quads.
    pub fn add_all<Q: Borrow<Quad>>(&mut self, quads: impl IntoIterator<Item = Q>) -> &mut Self {
        for quad in quads {
            self.add(quad.borrow());
        }
        self
    }

    /// Removes all the quads matching the pattern, `None` being a wildcard.
    pub fn delete_matches(
        &mut self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph_name: Option<&Term>,
    ) -> &mut Self {
        let matches = self.match_pattern(subject, predicate, object, graph_name);
        for quad in &matches {
            self.delete(&quad);
        }
        self
    }

    /// Removes all the quads.
    #[inline]
    pub fn clear(&mut self) {
        self.index.clear()
    }

    /// Returns a new dataset with the quads of both datasets.
    pub fn union(&self, other: &Self) -> Self {
        let mut union = self.clone();
        union.add_all(other);
        union
    }

    /// Returns a new dataset with the quads of this dataset that are not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        self.filter(|quad| !other.has(quad))
    }

    /// Returns a new dataset with the quads that are in both datasets.
    pub fn intersection(&self, other: &Self) -> Self {
        self.filter(|quad| other.has(quad))
    }

    /// Returns a new dataset with the quads for which `f` returns `true`.
    pub fn filter(&self, mut f: impl FnMut(&Quad) -> bool) -> Self {
        self.iter().filter(|quad| f(quad)).collect()
    }

    /// Checks if `f` returns `true` for at least one quad.
    pub fn any(&self, mut f: impl FnMut(&Quad) -> bool) -> bool {
        self.iter().any(|quad| f(&quad))
    }

    /// Checks if `f` returns `true` for all the quads.
    pub fn all(&self, mut f: impl FnMut(&Quad) -> bool) -> bool {
        self.iter().all(|quad| f(&quad))
    }

    pub fn for_each(&self, mut f: impl FnMut(&Quad)) {
        for quad in self {
            f(&quad);
        }
    }

    pub fn fold<B>(&self, init: B, mut f: impl FnMut(B, &Quad) -> B) -> B {
        self.iter().fold(init, |acc, quad| f(acc, &quad))
    }

    /// Checks if all the quads of `other` are in this dataset.
    pub fn contains(&self, other: &Self) -> bool {
        other.len() <= self.len() && other.all(|quad| self.has(quad))
    }

    /// Checks if the two datasets are equal up to a renaming of their blank nodes.
    ///
    /// ```
    /// use yardf::*;
    ///
    /// let ex = NamedNode::new("http://example.com")?;
    /// let mut first = Dataset::new();
    /// first.add(&Quad::new_default_graph(BlankNode::new("a")?, ex.clone(), ex.clone())?);
    /// let mut second = Dataset::new();
    /// second.add(&Quad::new_default_graph(BlankNode::new("b")?, ex.clone(), ex)?);
    ///
    /// assert_ne!(first, second);
    /// assert!(first.is_isomorphic(&second)?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn is_isomorphic(&self, other: &Self) -> Result<bool, CanonicalizationError> {
        if self.len() != other.len() {
            return Ok(false);
        }
        Ok(self.to_canonical_string()? == other.to_canonical_string()?)
    }

    /// Returns a copy of this dataset with blank nodes relabeled using the default [`Canonicalizer`].
    pub fn canonicalize(&self) -> Result<Self, CanonicalizationError> {
        Canonicalizer::new().canonicalize(self)
    }

    /// Returns the canonical N-Quads serialization of this dataset: one line per quad, sorted.
    pub fn to_canonical_string(&self) -> Result<String, CanonicalizationError> {
        Ok(self.canonicalize()?.to_string())
    }

    /// Adds the quads of an N-Quads-like document, one quad per line.
    ///
    /// An empty line or an invalid quad stops the import with an error.
    /// The quads read before the error stay in the dataset.
    /// Returns the number of quads that were not already in the dataset.
    ///
    /// ```
    /// use yardf::*;
    ///
    /// let mut dataset = Dataset::new();
    /// let file = b"<http://example.com/s> <http://example.com/p> \"o\" .\n_:b <http://example.com/p> ?o <http://example.com/g> .\n";
    /// assert_eq!(dataset.import_from_reader(file.as_slice())?, 2);
    /// assert_eq!(dataset.len(), 2);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn import_from_reader(&mut self, reader: impl BufRead) -> Result<usize, ImportError> {
        let mut added = 0;
        for (i, line) in reader.lines().enumerate() {
            if self.import_line(&line?, i + 1)? {
                added += 1;
            }
        }
        debug!("Imported {added} new quads");
        Ok(added)
    }

    /// Asynchronous version of [`import_from_reader`](Self::import_from_reader) for a Tokio [`AsyncBufRead`].
    ///
    /// Dropping the returned future stops the import, the quads already read stay in the dataset.
    ///
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use yardf::*;
    ///
    /// let mut dataset = Dataset::new();
    /// let file = b"<http://example.com/s> <http://example.com/p> \"o\" .\n";
    /// assert_eq!(dataset.import_from_tokio_async_reader(file.as_slice()).await?, 1);
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "async-tokio")]
    pub async fn import_from_tokio_async_reader(
        &mut self,
        reader: impl AsyncBufRead + Unpin,
    ) -> Result<usize, ImportError> {
        let mut lines = reader.lines();
        let mut added = 0;
        let mut line_number = 0;
        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if self.import_line(&line, line_number)? {
                added += 1;
            }
        }
        debug!("Imported {added} new quads");
        Ok(added)
    }

    fn import_line(&mut self, line: &str, line_number: usize) -> Result<bool, ImportError> {
        if line.trim().is_empty() {
            return Err(ImportError::EmptyChunk { line: line_number });
        }
        let quad = Quad::from_str(line).map_err(|error| ImportError::Parse {
            line: line_number,
            error,
        })?;
        Ok(self.add(&quad))
    }

    #[inline]
    pub fn index(&self) -> &QuadIndex {
        &self.index
    }

    #[inline]
    pub fn into_index(self) -> QuadIndex {
        self.index
    }
}

impl From<QuadIndex> for Dataset {
    #[inline]
    fn from(index: QuadIndex) -> Self {
        Self { index }
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.all(|quad| other.has(quad))
    }
}

impl Eq for Dataset {}

impl<'a> IntoIterator for &'a Dataset {
    type Item = Quad;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut dataset = Self::new();
        dataset.extend(iter);
        dataset
    }
}

impl<'a> FromIterator<&'a Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = &'a Quad>>(iter: I) -> Self {
        let mut dataset = Self::new();
        dataset.extend(iter);
        dataset
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

impl<'a> Extend<&'a Quad> for Dataset {
    fn extend<I: IntoIterator<Item = &'a Quad>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

impl fmt::Display for Dataset {
    /// Writes one N-Quads line per quad, sorted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TermSerializer::new().sorted_lines(self))
    }
}

impl FromStr for Dataset {
    type Err = ImportError;

    /// Parses a dataset from its N-Quads serialization, one quad per line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut dataset = Self::new();
        dataset.import_from_reader(s.as_bytes())?;
        Ok(dataset)
    }
}

/// An error raised during a dataset import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// I/O error while reading the source.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The source provided an empty line.
    #[error("Import received an empty chunk at line {line}")]
    EmptyChunk { line: usize },
    /// The source provided a line that is not a valid quad.
    #[error("Invalid quad at line {line}: {error}")]
    Parse {
        line: usize,
        #[source]
        error: TermParseError,
    },
}

impl ImportError {
    /// The 1-based number of the line that caused the error if the error is not an I/O error.
    #[inline]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Io(_) => None,
            Self::EmptyChunk { line } | Self::Parse { line, .. } => Some(*line),
        }
    }
}

impl From<ImportError> for io::Error {
    #[inline]
    fn from(error: ImportError) -> Self {
        match error {
            ImportError::Io(error) => error,
            error => Self::new(io::ErrorKind::InvalidData, error),
        }
    }
}
