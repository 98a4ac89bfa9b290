//! # Ordered Set
//!
//! Insertion-ordered, membership-checked set used for `|`-delimited
//! attribute values such as `android:configChanges`.

use indexmap::IndexSet;

/// An insertion-order-preserving set of flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSet {
    items: IndexSet<String>,
}

impl OrderedSet {
    /// Splits `value` on `separator`, dropping empty segments and repeats.
    pub fn parse(value: &str, separator: char) -> Self {
        let mut set = Self::default();
        for segment in value.split(separator) {
            set.insert(segment.trim());
        }
        set
    }

    /// Appends `item` unless it is empty or already present.
    /// Returns `true` when the set grew.
    pub fn insert(&mut self, item: &str) -> bool {
        if item.is_empty() {
            return false;
        }
        self.items.insert(item.to_string())
    }

    /// Appends each catalog entry in catalog order, skipping present ones.
    /// Returns the number of entries added.
    pub fn union_in_order<'a, I>(&mut self, catalog: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        catalog.into_iter().filter(|item| self.insert(item)).count()
    }

    /// Membership check.
    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Joins the entries with `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.iter().collect::<Vec<_>>().join(separator)
    }
}
