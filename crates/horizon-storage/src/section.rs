//! Sections: ordered groups of items with keyed supplementary models.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::item::AnyItem;

/// A global counter for generating section identities.
static SECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A stable identity for a section.
///
/// The identity survives moves and clones, which lets observers keep track of
/// a section whose index changes over time. A section handed to a storage as
/// a new section is given a fresh identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u64);

impl SectionId {
    fn next() -> Self {
        Self(SECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identity value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Implemented by owners that can report where a section currently sits.
pub trait SectionLocationIdentifying: Send + Sync {
    /// Returns the current index of the section with the given identity.
    fn section_index(&self, id: SectionId) -> Option<usize>;
}

/// Supplementary models keyed by index, for one supplementary kind.
pub type SupplementaryMap = HashMap<usize, AnyItem>;

/// An ordered container of items plus keyed supplementary models.
///
/// A section does not know its own index. It holds a weak, lookup-only
/// reference to its owner, which it can ask via
/// [`current_section_index`](Self::current_section_index).
#[derive(Clone, Default)]
pub struct SectionModel {
    id: SectionId,
    items: Vec<AnyItem>,
    supplementaries: HashMap<String, SupplementaryMap>,
    owner: Option<Weak<dyn SectionLocationIdentifying>>,
}

impl Default for SectionId {
    fn default() -> Self {
        Self::next()
    }
}

impl SectionModel {
    /// Creates an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a section holding `items`.
    pub fn with_items<T: Any + Send + Sync>(items: impl IntoIterator<Item = T>) -> Self {
        let mut section = Self::new();
        section.set_items(items);
        section
    }

    /// The section's identity.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Returns the item at `index`, or `None` when out of bounds.
    pub fn item(&self, index: usize) -> Option<&AnyItem> {
        self.items.get(index)
    }

    /// All items, in order.
    pub fn items(&self) -> &[AnyItem] {
        &self.items
    }

    /// Number of items in the section.
    pub fn number_of_items(&self) -> usize {
        self.items.len()
    }

    /// Replaces the section's content.
    pub fn set_items<T: Any + Send + Sync>(&mut self, items: impl IntoIterator<Item = T>) {
        self.items = items.into_iter().map(AnyItem::new).collect();
    }

    /// Every item that is a `T`, in order.
    pub fn items_of_type<T: Any + Clone>(&self) -> Vec<T> {
        self.items.iter().filter_map(AnyItem::downcast::<T>).collect()
    }

    /// Returns the supplementary model of `kind` at `index`.
    pub fn supplementary_model(&self, kind: &str, index: usize) -> Option<&AnyItem> {
        self.supplementaries.get(kind)?.get(&index)
    }

    /// Sets or clears the supplementary model of `kind` at `index`.
    pub fn set_supplementary_model(&mut self, model: Option<AnyItem>, kind: &str, index: usize) {
        match model {
            Some(model) => {
                self.supplementaries
                    .entry(kind.to_owned())
                    .or_default()
                    .insert(index, model);
            }
            None => {
                if let Some(models) = self.supplementaries.get_mut(kind) {
                    models.remove(&index);
                    if models.is_empty() {
                        self.supplementaries.remove(kind);
                    }
                }
            }
        }
    }

    /// Replaces every supplementary model of `kind`. An empty map clears it.
    pub fn set_supplementaries(&mut self, kind: &str, models: SupplementaryMap) {
        if models.is_empty() {
            self.supplementaries.remove(kind);
        } else {
            self.supplementaries.insert(kind.to_owned(), models);
        }
    }

    /// Asks the owner where this section currently sits.
    ///
    /// Returns `None` if the section is detached or its owner is gone.
    pub fn current_section_index(&self) -> Option<usize> {
        self.owner.as_ref()?.upgrade()?.section_index(self.id)
    }

    /// Attaches the section to an owner for index lookups.
    pub fn set_owner(&mut self, owner: Weak<dyn SectionLocationIdentifying>) {
        self.owner = Some(owner);
    }

    /// Attaches the section to an owner held by `Arc`.
    pub fn set_owner_arc<O: SectionLocationIdentifying + 'static>(&mut self, owner: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(owner);
        self.owner = Some(weak);
    }

    pub(crate) fn renew_id(&mut self) {
        self.id = SectionId::next();
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<AnyItem> {
        &mut self.items
    }
}

impl std::fmt::Debug for SectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionModel")
            .field("id", &self.id)
            .field("items", &self.items.len())
            .field("supplementary_kinds", &self.supplementaries.keys().collect::<Vec<_>>())
            .finish()
    }
}

static_assertions::assert_impl_all!(SectionModel: Send, Sync, Clone);
