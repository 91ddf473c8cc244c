//! Interning of RDF terms into dense integer identifiers

use crate::Term;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::num::NonZeroU64;

/// The identifier of a [`Term`] inside of a [`TermInterner`].
///
/// Identifiers are dense positive integers. They are stable while the term is referenced
/// and never given to another term while the term is live.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub struct TermId(NonZeroU64);

impl TermId {
    #[inline]
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU64::MIN.saturating_add(index as u64))
    }

    #[inline]
    fn index(self) -> Option<usize> {
        usize::try_from(self.get() - 1).ok()
    }
}

impl fmt::Display for TermId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    term: Term,
    references: usize,
}

/// A bijection between [`Term`]s and [`TermId`]s.
///
/// Terms are compared by kind and content, so two equal literals built separately share the same id.
///
/// Each identifier carries a reference count.
/// [`intern`](Self::intern) registers a term without referencing it,
/// [`retain`](Self::retain) and [`release`](Self::release) maintain the count
/// and the term is removed as soon as it reaches zero on release.
/// ```
/// use yardf::*;
///
/// let mut interner = TermInterner::new();
/// let term = Term::from(NamedNode::new("http://example.com")?);
/// let id = interner.intern(&term);
/// assert_eq!(interner.lookup_id(&term), Some(id));
/// assert_eq!(interner.term_by_id(id), Some(&term));
///
/// interner.retain(id);
/// interner.release(id);
/// assert_eq!(interner.lookup_id(&term), None);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct TermInterner {
    slots: Vec<Option<Slot>>,
    ids: HashMap<Term, TermId>,
    free_ids: Vec<TermId>,
}

impl TermInterner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the term, creating it if it does not exist yet.
    pub fn intern(&mut self, term: &Term) -> TermId {
        if let Some(id) = self.ids.get(term) {
            return *id;
        }
        let slot = Slot {
            term: term.clone(),
            references: 0,
        };
        let id = if let Some(id) = self.free_ids.pop() {
            if let Some(free) = id.index().and_then(|i| self.slots.get_mut(i)) {
                *free = Some(slot);
            }
            id
        } else {
            self.slots.push(Some(slot));
            TermId::from_index(self.slots.len() - 1)
        };
        self.ids.insert(term.clone(), id);
        id
    }

    /// Returns the id of the term if it exists, without creating it.
    #[inline]
    pub fn lookup_id(&self, term: &Term) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    #[inline]
    pub fn term_by_id(&self, id: TermId) -> Option<&Term> {
        self.slot(id).map(|slot| &slot.term)
    }

    /// Returns the term of an id that is known to be live.
    ///
    /// Panics if it is not: index structures only store live ids.
    #[inline]
    pub(crate) fn resolve(&self, id: TermId) -> &Term {
        match self.term_by_id(id) {
            Some(term) => term,
            None => unreachable!("the term id {id} is not registered in the interner"),
        }
    }

    #[inline]
    pub fn contains_id(&self, id: TermId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of quad slots referencing the id.
    #[inline]
    pub fn reference_count(&self, id: TermId) -> usize {
        self.slot(id).map_or(0, |slot| slot.references)
    }

    /// Adds a reference to the id. Does nothing if the id is unknown.
    pub fn retain(&mut self, id: TermId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.references += 1;
        }
    }

    /// Removes a reference to the id and removes the term when no reference is left.
    ///
    /// Returns `true` if the term has been removed.
    pub fn release(&mut self, id: TermId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        slot.references = slot.references.saturating_sub(1);
        if slot.references > 0 {
            return false;
        }
        let Some(Slot { term, .. }) = id
            .index()
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::take)
        else {
            return false;
        };
        self.ids.remove(&term);
        self.free_ids.push(id);
        true
    }

    /// Builds a new interner containing exactly the given ids, with the same identifiers.
    ///
    /// Unknown ids are ignored and reference counts start at zero.
    pub fn subset_by_id(&self, ids: impl IntoIterator<Item = TermId>) -> Self {
        let mut subset = Self::new();
        for id in ids {
            let (Some(index), Some(term)) = (id.index(), self.term_by_id(id)) else {
                continue;
            };
            if subset.slots.len() <= index {
                subset.slots.resize(index + 1, None);
            }
            if let Entry::Vacant(entry) = subset.ids.entry(term.clone()) {
                entry.insert(id);
                subset.slots[index] = Some(Slot {
                    term: term.clone(),
                    references: 0,
                });
            }
        }
        subset.free_ids = subset
            .slots
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| TermId::from_index(index))
            .collect();
        subset
    }

    /// Sets all reference counts to zero.
    pub(crate) fn reset_references(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.references = 0;
        }
    }

    /// Removes the terms that are not referenced anymore.
    pub(crate) fn purge_unreferenced(&mut self) {
        let unreferenced = self
            .iter_slots()
            .filter(|(_, slot)| slot.references == 0)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        for id in unreferenced {
            self.release(id);
        }
    }

    /// Number of live terms.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over the live terms by increasing id.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Term)> {
        self.iter_slots().map(|(id, slot)| (id, &slot.term))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.ids.clear();
        self.free_ids.clear();
    }

    fn iter_slots(&self) -> impl Iterator<Item = (TermId, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((TermId::from_index(index), slot.as_ref()?)))
    }

    #[inline]
    fn slot(&self, id: TermId) -> Option<&Slot> {
        self.slots.get(id.index()?)?.as_ref()
    }

    #[inline]
    fn slot_mut(&mut self, id: TermId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index()?)?.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlankNode, Literal, NamedNode, Variable};

    #[test]
    fn ids_are_dense_and_positive() {
        let mut interner = TermInterner::new();
        let a = interner.intern(&NamedNode::new_unchecked("http://example.com/a").into());
        let b = interner.intern(&NamedNode::new_unchecked("http://example.com/b").into());
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(
            interner.intern(&NamedNode::new_unchecked("http://example.com/a").into()),
            a
        );
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn kinds_do_not_collide() {
        let mut interner = TermInterner::new();
        let ids = [
            interner.intern(&BlankNode::new_unchecked("x").into()),
            interner.intern(&Variable::new_unchecked("x").into()),
            interner.intern(&Literal::new_simple_literal("x").into()),
            interner.intern(&Literal::new_language_tagged_literal_unchecked("x", "en").into()),
            interner.intern(
                &Literal::new_typed_literal("x", NamedNode::new_unchecked("http://example.com/t"))
                    .into(),
            ),
        ];
        assert_eq!(interner.len(), ids.len());
        assert_eq!(
            interner.lookup_id(&Literal::new_language_tagged_literal_unchecked("x", "en").into()),
            Some(ids[3])
        );
    }

    #[test]
    fn release_reclaims_both_directions() {
        let mut interner = TermInterner::new();
        let term = Term::from(NamedNode::new_unchecked("http://example.com/a"));
        let id = interner.intern(&term);
        interner.retain(id);
        interner.retain(id);
        assert!(!interner.release(id));
        assert_eq!(interner.reference_count(id), 1);
        assert!(interner.release(id));
        assert!(!interner.contains_id(id));
        assert_eq!(interner.lookup_id(&term), None);
        assert!(interner.is_empty());

        // Released ids are reused
        let other = interner.intern(&NamedNode::new_unchecked("http://example.com/b").into());
        assert_eq!(other, id);
    }

    #[test]
    fn subset_keeps_ids() {
        let mut interner = TermInterner::new();
        let ids = (0..5)
            .map(|i| {
                interner.intern(&NamedNode::new_unchecked(format!("http://example.com/{i}")).into())
            })
            .collect::<Vec<_>>();
        let subset = interner.subset_by_id([ids[1], ids[3]]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.term_by_id(ids[3]), interner.term_by_id(ids[3]));
        assert!(!subset.contains_id(ids[0]));
        assert!(!subset.contains_id(ids[4]));
        assert_eq!(subset.reference_count(ids[1]), 0);
    }

    #[test]
    fn unknown_ids() {
        let mut interner = TermInterner::new();
        let id = TermId::new(42).unwrap();
        assert_eq!(interner.term_by_id(id), None);
        assert!(!interner.release(id));
        assert!(TermId::new(0).is_none());
    }
}
