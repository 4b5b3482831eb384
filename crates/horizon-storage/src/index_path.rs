//! Item locations within a sectioned storage.

use std::fmt;

/// The location of an item: an item index inside a section index.
///
/// Index paths order by section first and item second, which is the order in
/// which a view lays items out.
///
/// # Index Validity
///
/// An index path is a plain pair of numbers. It is not tied to any storage and
/// may point past the end of a storage after that storage has been mutated.
/// Every lookup in this crate checks bounds and returns `None` for stale paths.
///
/// # Example
///
/// ```
/// use horizon_storage::IndexPath;
///
/// let path = IndexPath::new(2, 1);
/// assert_eq!(path.item, 2);
/// assert_eq!(path.section, 1);
/// assert_eq!(path.to_string(), "[1, 2]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexPath {
    /// The section index.
    pub section: usize,
    /// The item index within the section.
    pub item: usize,
}

impl IndexPath {
    /// Creates an index path for `item` in `section`.
    #[inline]
    pub const fn new(item: usize, section: usize) -> Self {
        Self { section, item }
    }

    /// Returns the path of the same item position in another section.
    #[inline]
    pub const fn with_section(self, section: usize) -> Self {
        Self { section, ..self }
    }

    /// Returns the path of another item position in the same section.
    #[inline]
    pub const fn with_item(self, item: usize) -> Self {
        Self { item, ..self }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

impl From<(usize, usize)> for IndexPath {
    /// Converts an `(item, section)` pair.
    fn from((item, section): (usize, usize)) -> Self {
        Self::new(item, section)
    }
}

/// Sorts index paths by section, then item.
pub fn sorted_index_paths(mut paths: Vec<IndexPath>, ascending: bool) -> Vec<IndexPath> {
    if ascending {
        paths.sort();
    } else {
        paths.sort_by(|a, b| b.cmp(a));
    }
    paths
}
