//! Persistent collections with structural sharing.
//!
//! Thin wrappers around the `im` crate. The matcher snapshots its state
//! before every alternative; with these types a snapshot is a clone, which
//! is O(1), and restoring is an assignment.

use std::fmt;
use std::iter::FromIterator;

/// Persistent vector with structural sharing.
///
/// Cloning is O(1). Modifications return a new vector sharing structure
/// with the original.
#[derive(Clone)]
pub struct PVec<T>(im::Vector<T>)
where
    T: Clone;

// Hand-written so that element types need not implement `Default`
impl<T: Clone> Default for PVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> PVec<T> {
    /// Creates an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self(im::Vector::new())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the vector is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets an element by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    /// Returns a new vector with the element appended.
    #[must_use]
    pub fn push_back(&self, value: T) -> Self {
        let mut new = self.0.clone();
        new.push_back(value);
        Self(new)
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.0.back()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for PVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Clone> FromIterator<T> for PVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(im::Vector::from_iter(iter))
    }
}

impl<T: Clone> IntoIterator for PVec<T> {
    type Item = T;
    type IntoIter = im::vector::ConsumingIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Persistent ordered set with structural sharing.
///
/// Iteration order is the element order, so two sets holding the same
/// elements always iterate identically.
#[derive(Clone)]
pub struct PSet<T>(im::OrdSet<T>)
where
    T: Clone + Ord;

impl<T: Clone + Ord> Default for PSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Ord> PSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(im::OrdSet::new())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the set contains the value.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    /// Returns a new set with the value inserted.
    #[must_use]
    pub fn insert(&self, value: T) -> Self {
        let mut new = self.0.clone();
        new.insert(value);
        Self(new)
    }

    /// Returns an iterator over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Clone + Ord + fmt::Debug> fmt::Debug for PSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Clone + Ord> PartialEq for PSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Clone + Ord> Eq for PSet<T> {}

impl<T: Clone + Ord> FromIterator<T> for PSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(im::OrdSet::from_iter(iter))
    }
}
