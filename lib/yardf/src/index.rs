//! Multi-path index of quads over interned terms.
//!
//! Each graph has its own [`GraphPartition`] storing every triple three times,
//! keyed subject → predicate → objects, predicate → object → subjects and object → subject → predicates.
//! A pattern is answered by descending the tree rooted at its bound terms without scanning anything else.

use crate::interning::{TermId, TermInterner};
use crate::{Quad, Term};
use std::collections::{BTreeMap, BTreeSet, btree_map, btree_set};
use tracing::trace;

type Tree = BTreeMap<TermId, BTreeMap<TermId, BTreeSet<TermId>>>;

fn tree_insert(tree: &mut Tree, first: TermId, second: TermId, third: TermId) -> bool {
    tree.entry(first)
        .or_default()
        .entry(second)
        .or_default()
        .insert(third)
}

/// Removes the entry and prunes the maps left empty, bottom-up.
fn tree_remove(tree: &mut Tree, first: TermId, second: TermId, third: TermId) -> bool {
    let Some(seconds) = tree.get_mut(&first) else {
        return false;
    };
    let Some(thirds) = seconds.get_mut(&second) else {
        return false;
    };
    if !thirds.remove(&third) {
        return false;
    }
    if thirds.is_empty() {
        seconds.remove(&second);
        if seconds.is_empty() {
            tree.remove(&first);
        }
    }
    true
}

fn tree_leaves(tree: &Tree, first: TermId, second: TermId) -> impl Iterator<Item = TermId> + '_ {
    tree.get(&first)
        .and_then(|seconds| seconds.get(&second))
        .into_iter()
        .flatten()
        .copied()
}

fn tree_pairs(tree: &Tree, first: TermId) -> impl Iterator<Item = (TermId, TermId)> + '_ {
    tree.get(&first).into_iter().flat_map(|seconds| {
        seconds
            .iter()
            .flat_map(|(second, thirds)| thirds.iter().map(move |third| (*second, *third)))
    })
}

/// The triples of a single graph, stored in three rotated trees.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GraphPartition {
    subjects: Tree,
    predicates: Tree,
    objects: Tree,
}

impl GraphPartition {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the triple to the three trees. Returns `false` if it was already there.
    pub fn insert(&mut self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        if !tree_insert(&mut self.subjects, subject, predicate, object) {
            return false;
        }
        tree_insert(&mut self.predicates, predicate, object, subject);
        tree_insert(&mut self.objects, object, subject, predicate);
        true
    }

    /// Removes the triple from the three trees. Returns `false` if it was not there.
    pub fn remove(&mut self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        if !tree_remove(&mut self.subjects, subject, predicate, object) {
            return false;
        }
        tree_remove(&mut self.predicates, predicate, object, subject);
        tree_remove(&mut self.objects, object, subject, predicate);
        true
    }

    pub fn contains(&self, subject: TermId, predicate: TermId, object: TermId) -> bool {
        self.subjects
            .get(&subject)
            .and_then(|predicates| predicates.get(&predicate))
            .is_some_and(|objects| objects.contains(&object))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Number of triples, counted on the subject tree leaves.
    pub fn len(&self) -> usize {
        self.subjects
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }

    /// Iterates over the `(subject, predicate, object)` triples by increasing ids.
    #[inline]
    pub fn iter(&self) -> Triples<'_> {
        Triples::new(&self.subjects)
    }

    /// Calls `f` with each `(subject, predicate, object)` triple matching the pattern.
    ///
    /// The tree used is the one rooted at the bound terms:
    /// subject and subject-predicate patterns use the subject tree,
    /// predicate and predicate-object patterns the predicate tree,
    /// object and subject-object patterns the object tree.
    pub fn for_each_match(
        &self,
        subject: Option<TermId>,
        predicate: Option<TermId>,
        object: Option<TermId>,
        mut f: impl FnMut(TermId, TermId, TermId),
    ) {
        match (subject, predicate, object) {
            (Some(s), Some(p), Some(o)) => {
                if self.contains(s, p, o) {
                    f(s, p, o)
                }
            }
            (Some(s), Some(p), None) => {
                for o in tree_leaves(&self.subjects, s, p) {
                    f(s, p, o)
                }
            }
            (Some(s), None, None) => {
                for (p, o) in tree_pairs(&self.subjects, s) {
                    f(s, p, o)
                }
            }
            (None, Some(p), Some(o)) => {
                for s in tree_leaves(&self.predicates, p, o) {
                    f(s, p, o)
                }
            }
            (None, Some(p), None) => {
                for (o, s) in tree_pairs(&self.predicates, p) {
                    f(s, p, o)
                }
            }
            (Some(s), None, Some(o)) => {
                for p in tree_leaves(&self.objects, o, s) {
                    f(s, p, o)
                }
            }
            (None, None, Some(o)) => {
                for (s, p) in tree_pairs(&self.objects, o) {
                    f(s, p, o)
                }
            }
            (None, None, None) => {
                for (s, p, o) in self.iter() {
                    f(s, p, o)
                }
            }
        }
    }
}

/// Iterator over the triples of a [`GraphPartition`].
#[must_use]
pub struct Triples<'a> {
    firsts: btree_map::Iter<'a, TermId, BTreeMap<TermId, BTreeSet<TermId>>>,
    seconds: Option<(TermId, btree_map::Iter<'a, TermId, BTreeSet<TermId>>)>,
    thirds: Option<(TermId, TermId, btree_set::Iter<'a, TermId>)>,
}

impl<'a> Triples<'a> {
    fn new(tree: &'a Tree) -> Self {
        Self {
            firsts: tree.iter(),
            seconds: None,
            thirds: None,
        }
    }
}

impl Iterator for Triples<'_> {
    type Item = (TermId, TermId, TermId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((first, second, thirds)) = &mut self.thirds {
                if let Some(third) = thirds.next() {
                    return Some((*first, *second, *third));
                }
                self.thirds = None;
            }
            if let Some((first, seconds)) = &mut self.seconds {
                if let Some((second, thirds)) = seconds.next() {
                    self.thirds = Some((*first, *second, thirds.iter()));
                    continue;
                }
                self.seconds = None;
            }
            let (first, seconds) = self.firsts.next()?;
            self.seconds = Some((*first, seconds.iter()));
        }
    }
}

/// The [`GraphPartition`]s of a dataset, keyed by graph name id.
///
/// Empty partitions are never kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GraphIndex {
    partitions: BTreeMap<TermId, GraphPartition>,
}

impl GraphIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the quad, creating the graph partition if needed. Returns `false` if it was already there.
    pub fn insert(
        &mut self,
        graph_name: TermId,
        subject: TermId,
        predicate: TermId,
        object: TermId,
    ) -> bool {
        self.partitions
            .entry(graph_name)
            .or_default()
            .insert(subject, predicate, object)
    }

    /// Removes the quad and drops the graph partition if it becomes empty.
    pub fn remove(
        &mut self,
        graph_name: TermId,
        subject: TermId,
        predicate: TermId,
        object: TermId,
    ) -> bool {
        let Some(partition) = self.partitions.get_mut(&graph_name) else {
            return false;
        };
        if !partition.remove(subject, predicate, object) {
            return false;
        }
        if partition.is_empty() {
            trace!("Dropping the empty partition of graph {graph_name}");
            self.partitions.remove(&graph_name);
        }
        true
    }

    pub fn contains(
        &self,
        graph_name: TermId,
        subject: TermId,
        predicate: TermId,
        object: TermId,
    ) -> bool {
        self.partitions
            .get(&graph_name)
            .is_some_and(|partition| partition.contains(subject, predicate, object))
    }

    #[inline]
    pub fn partition(&self, graph_name: TermId) -> Option<&GraphPartition> {
        self.partitions.get(&graph_name)
    }

    /// Iterates over the partitions by increasing graph name id.
    #[inline]
    pub fn iter(&self) -> btree_map::Iter<'_, TermId, GraphPartition> {
        self.partitions.iter()
    }

    /// Iterates over the `(graph name, subject, predicate, object)` quads.
    pub fn quads(&self) -> impl Iterator<Item = (TermId, TermId, TermId, TermId)> + '_ {
        self.partitions.iter().flat_map(|(g, partition)| {
            partition.iter().map(move |(s, p, o)| (*g, s, p, o))
        })
    }

    /// Number of graphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.partitions.clear();
    }
}

impl Extend<(TermId, TermId, TermId, TermId)> for GraphIndex {
    fn extend<I: IntoIterator<Item = (TermId, TermId, TermId, TermId)>>(&mut self, iter: I) {
        for (g, s, p, o) in iter {
            self.insert(g, s, p, o);
        }
    }
}

/// An index of quads supporting pattern matching with any combination of bound terms.
///
/// ```
/// use yardf::*;
///
/// let ex = NamedNode::new("http://example.com")?;
/// let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), ex.clone())?;
///
/// let mut index = QuadIndex::new();
/// assert!(index.add(&quad));
/// assert!(!index.add(&quad));
/// assert!(index.has(&quad));
///
/// let ex = Term::from(ex);
/// let results = index.match_pattern(Some(&ex), None, None, None);
/// assert_eq!(results.iter().collect::<Vec<_>>(), [quad]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct QuadIndex {
    interner: TermInterner,
    graphs: GraphIndex,
    len: usize,
}

impl QuadIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from an interner and the graph partitions using its ids.
    ///
    /// Both parts must be given or none of them.
    /// The reference counts of the interner are recomputed from the partitions
    /// and the terms that are not used by any quad are dropped.
    pub fn from_parts(
        interner: Option<TermInterner>,
        graphs: Option<GraphIndex>,
    ) -> Result<Self, IndexError> {
        let (mut interner, graphs) = match (interner, graphs) {
            (None, None) => return Ok(Self::new()),
            (Some(interner), Some(graphs)) => (interner, graphs),
            (Some(_), None) | (None, Some(_)) => return Err(IndexError::MismatchedParts),
        };
        interner.reset_references();
        for (g, s, p, o) in graphs.quads() {
            for id in [s, p, o, g] {
                if !interner.contains_id(id) {
                    return Err(IndexError::UnknownTermId(id));
                }
                interner.retain(id);
            }
        }
        interner.purge_unreferenced();
        let len = graphs.iter().map(|(_, partition)| partition.len()).sum();
        Ok(Self {
            interner,
            graphs,
            len,
        })
    }

    /// Adds a quad. Returns `false` if it was already in the index.
    pub fn add(&mut self, quad: &Quad) -> bool {
        // A quad already in the index only has known terms, so interning them adds nothing
        let [s, p, o, g] = quad.terms().map(|term| self.interner.intern(term));
        if !self.graphs.insert(g, s, p, o) {
            return false;
        }
        for id in [s, p, o, g] {
            self.interner.retain(id);
        }
        self.len += 1;
        true
    }

    /// Removes a quad. Returns `false` if it was not in the index.
    ///
    /// The terms that are not used anymore are removed from the interner.
    pub fn delete(&mut self, quad: &Quad) -> bool {
        let Some([s, p, o, g]) = self.lookup_ids(quad) else {
            return false;
        };
        if !self.graphs.remove(g, s, p, o) {
            return false;
        }
        for id in [s, p, o, g] {
            self.interner.release(id);
        }
        self.len -= 1;
        true
    }

    pub fn has(&self, quad: &Quad) -> bool {
        self.lookup_ids(quad)
            .is_some_and(|[s, p, o, g]| self.graphs.contains(g, s, p, o))
    }

    /// Returns a new index with the quads matching the pattern.
    ///
    /// `None` is a wildcard.
    /// If a bound term is not in the index the result is empty.
    /// The result owns its own interner restricted to the terms it uses.
    pub fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph_name: Option<&Term>,
    ) -> Self {
        let lookup = |term: Option<&Term>| match term {
            Some(term) => self.interner.lookup_id(term).map(Some),
            None => Some(None),
        };
        let (Some(s), Some(p), Some(o), Some(g)) = (
            lookup(subject),
            lookup(predicate),
            lookup(object),
            lookup(graph_name),
        ) else {
            return Self::new();
        };
        let mut graphs = GraphIndex::new();
        let mut len = 0;
        if let Some(g) = g {
            let Some(partition) = self.graphs.partition(g) else {
                return Self::new();
            };
            partition.for_each_match(s, p, o, |s, p, o| {
                len += usize::from(graphs.insert(g, s, p, o));
            });
        } else {
            for (g, partition) in self.graphs.iter() {
                partition.for_each_match(s, p, o, |s, p, o| {
                    len += usize::from(graphs.insert(*g, s, p, o));
                });
            }
        }
        let ids = graphs
            .quads()
            .flat_map(|(g, s, p, o)| [g, s, p, o])
            .collect::<BTreeSet<_>>();
        let mut interner = self.interner.subset_by_id(ids);
        for (g, s, p, o) in graphs.quads() {
            for id in [s, p, o, g] {
                interner.retain(id);
            }
        }
        Self {
            interner,
            graphs,
            len,
        }
    }

    /// Number of quads.
    ///
    /// The count is kept up to date by every mutation.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Number of graphs with at least one quad.
    #[inline]
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn clear(&mut self) {
        self.interner.clear();
        self.graphs.clear();
        self.len = 0;
    }

    /// Iterates over the quads, graph by graph, by increasing term ids.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            interner: &self.interner,
            graphs: self.graphs.iter(),
            current: None,
        }
    }

    #[inline]
    pub fn interner(&self) -> &TermInterner {
        &self.interner
    }

    #[inline]
    pub fn graphs(&self) -> &GraphIndex {
        &self.graphs
    }

    #[inline]
    pub fn into_parts(self) -> (TermInterner, GraphIndex) {
        (self.interner, self.graphs)
    }

    fn lookup_ids(&self, quad: &Quad) -> Option<[TermId; 4]> {
        let [s, p, o, g] = quad.terms();
        Some([
            self.interner.lookup_id(s)?,
            self.interner.lookup_id(p)?,
            self.interner.lookup_id(o)?,
            self.interner.lookup_id(g)?,
        ])
    }
}

impl<'a> IntoIterator for &'a QuadIndex {
    type Item = Quad;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`QuadIndex::iter`].
#[must_use]
pub struct Iter<'a> {
    interner: &'a TermInterner,
    graphs: btree_map::Iter<'a, TermId, GraphPartition>,
    current: Option<(TermId, Triples<'a>)>,
}

impl Iterator for Iter<'_> {
    type Item = Quad;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((g, triples)) = &mut self.current {
                if let Some((s, p, o)) = triples.next() {
                    return Some(Quad::new_unchecked(
                        self.interner.resolve(s).clone(),
                        self.interner.resolve(p).clone(),
                        self.interner.resolve(o).clone(),
                        self.interner.resolve(*g).clone(),
                    ));
                }
                self.current = None;
            }
            let (g, partition) = self.graphs.next()?;
            self.current = Some((*g, partition.iter()));
        }
    }
}

/// An error raised when building a [`QuadIndex`] from invalid parts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndexError {
    #[error("Must provide both terms and graphs or neither")]
    MismatchedParts,
    #[error("The term id {0} is used by a graph partition but is not in the interner")]
    UnknownTermId(TermId),
}
