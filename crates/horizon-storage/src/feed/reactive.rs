//! Storage over live, observable result collections.
//!
//! Each section of a [`ReactiveStorage`] is backed by one
//! [`ObservableResults`] collection. The storage subscribes to every
//! writable collection and turns its [`CollectionChange`] notifications into
//! storage updates for that section.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use horizon_storage_core::logging::targets;
use horizon_storage_core::{ConnectionId, Signal};
use parking_lot::{Mutex, RwLock};

use crate::config::SupplementaryKinds;
use crate::dispatcher::UpdateDispatcher;
use crate::index_path::IndexPath;
use crate::item::AnyItem;
use crate::section::{SectionId, SectionLocationIdentifying, SectionModel, SupplementaryMap};
use crate::traits::{
    HeaderFooterSettable, HeaderFooterStorage, Storage, StorageUpdating, SupplementaryStorage,
};
use crate::update::ChangeType;

/// A change notification from an observable collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    /// The collection finished loading its initial content.
    Initial,
    /// The collection changed. Deletions refer to old indexes; insertions
    /// and modifications to new ones.
    Update {
        deletions: Vec<usize>,
        insertions: Vec<usize>,
        modifications: Vec<usize>,
    },
    /// The collection could not deliver changes.
    Error(String),
}

/// Keeps a change subscription alive.
///
/// Dropping the token, or calling [`invalidate`](Self::invalidate), ends the
/// subscription.
#[must_use = "dropping the token ends the subscription"]
pub struct NotificationToken {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl NotificationToken {
    /// Creates a token that runs `stop` when invalidated.
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Creates a token that disconnects `id` from `signal`.
    pub fn for_signal<Args: 'static>(signal: &Arc<Signal<Args>>, id: ConnectionId) -> Self {
        let signal = Arc::downgrade(signal);
        Self::new(move || {
            if let Some(signal) = signal.upgrade() {
                signal.disconnect(id);
            }
        })
    }

    /// Ends the subscription now.
    pub fn invalidate(mut self) {
        self.stop_now();
    }

    fn stop_now(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for NotificationToken {
    fn drop(&mut self) {
        self.stop_now();
    }
}

impl fmt::Debug for NotificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationToken")
            .field("active", &self.stop.is_some())
            .finish()
    }
}

/// A live collection that can back one section.
pub trait ObservableResults: Send + Sync {
    /// Number of items.
    fn count(&self) -> usize;

    /// The item at `index`.
    fn item(&self, index: usize) -> Option<AnyItem>;

    /// Read-only collections never change and are not observed.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Subscribes `callback` to change notifications.
    fn observe(&self, callback: Box<dyn Fn(&CollectionChange) + Send + Sync>) -> NotificationToken;
}

/// A simple in-memory [`ObservableResults`] that notifies on every edit.
pub struct ObservableCollection<T> {
    items: RwLock<Vec<T>>,
    changed: Arc<Signal<CollectionChange>>,
}

impl<T: Clone + Send + Sync + 'static> ObservableCollection<T> {
    /// Creates a collection holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            changed: Arc::new(Signal::new()),
        }
    }

    /// A snapshot of the items.
    pub fn items(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Appends `item`.
    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.write();
            items.push(item);
            items.len() - 1
        };
        self.notify(Vec::new(), vec![index], Vec::new());
    }

    /// Inserts `item` at `index`, clamped to the end.
    pub fn insert(&self, index: usize, item: T) {
        let index = {
            let mut items = self.items.write();
            let index = index.min(items.len());
            items.insert(index, item);
            index
        };
        self.notify(Vec::new(), vec![index], Vec::new());
    }

    /// Removes the item at `index`.
    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.items.write();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.notify(vec![index], Vec::new(), Vec::new());
        }
        removed
    }

    /// Replaces the item at `index`.
    pub fn set(&self, index: usize, item: T) -> bool {
        let replaced = match self.items.write().get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        };
        if replaced {
            self.notify(Vec::new(), Vec::new(), vec![index]);
        }
        replaced
    }

    /// Sends [`CollectionChange::Initial`] to observers.
    pub fn notify_initial(&self) {
        self.changed.emit(CollectionChange::Initial);
    }

    /// Sends [`CollectionChange::Error`] to observers.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.changed.emit(CollectionChange::Error(message.into()));
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.changed.connection_count()
    }

    fn notify(&self, deletions: Vec<usize>, insertions: Vec<usize>, modifications: Vec<usize>) {
        self.changed.emit(CollectionChange::Update {
            deletions,
            insertions,
            modifications,
        });
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableResults for ObservableCollection<T> {
    fn count(&self) -> usize {
        self.items.read().len()
    }

    fn item(&self, index: usize) -> Option<AnyItem> {
        self.items.read().get(index).cloned().map(AnyItem::new)
    }

    fn observe(&self, callback: Box<dyn Fn(&CollectionChange) + Send + Sync>) -> NotificationToken {
        let id = self.changed.connect(callback);
        NotificationToken::for_signal(&self.changed, id)
    }
}

impl<T> fmt::Debug for ObservableCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCollection")
            .field("count", &self.items.read().len())
            .field("changed", &self.changed)
            .finish()
    }
}

/// One section of a [`ReactiveStorage`].
#[derive(Clone)]
pub struct ReactiveSection {
    results: Arc<dyn ObservableResults>,
    model: SectionModel,
}

impl ReactiveSection {
    /// The collection backing this section.
    pub fn results(&self) -> &Arc<dyn ObservableResults> {
        &self.results
    }

    /// Stable identity of this section.
    pub fn id(&self) -> SectionId {
        self.model.id()
    }

    /// Number of items in the backing collection.
    pub fn number_of_items(&self) -> usize {
        self.results.count()
    }

    /// The section's index in its storage, if it is still part of one.
    pub fn current_section_index(&self) -> Option<usize> {
        self.model.current_section_index()
    }

    /// A supplementary model of this section.
    pub fn supplementary_model(&self, kind: &str, index: usize) -> Option<&AnyItem> {
        self.model.supplementary_model(kind, index)
    }
}

impl fmt::Debug for ReactiveSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveSection")
            .field("id", &self.id())
            .field("count", &self.results.count())
            .finish()
    }
}

struct ReactiveInner {
    sections: RwLock<Vec<ReactiveSection>>,
    tokens: Mutex<HashMap<SectionId, NotificationToken>>,
    dispatcher: UpdateDispatcher,
}

impl SectionLocationIdentifying for ReactiveInner {
    fn section_index(&self, id: SectionId) -> Option<usize> {
        self.sections
            .read_recursive()
            .iter()
            .position(|section| section.id() == id)
    }
}

impl ReactiveInner {
    fn handle_change(&self, change: &CollectionChange, section_id: SectionId) {
        match change {
            CollectionChange::Initial => self.dispatcher.storage_needs_reloading(),
            CollectionChange::Error(message) => {
                tracing::error!(target: targets::FEED, ?section_id, error = %message, "collection notification failed");
            }
            CollectionChange::Update {
                deletions,
                insertions,
                modifications,
            } => {
                let Some(section) = self.section_index(section_id) else {
                    tracing::debug!(target: targets::FEED, ?section_id, "change for a section that is gone");
                    return;
                };
                self.dispatcher.start_update();
                self.dispatcher.with_current_update(|update| {
                    let changes = [
                        (ChangeType::Delete, deletions),
                        (ChangeType::Insert, insertions),
                        (ChangeType::Update, modifications),
                    ];
                    for (change, items) in changes {
                        for item in items {
                            update.record_object_change(change, vec![IndexPath::new(*item, section)]);
                        }
                    }
                });
                self.dispatcher.finish_update();
            }
        }
    }
}

/// A storage whose sections are live observable collections.
///
/// ```
/// use std::sync::Arc;
/// use horizon_storage::{IndexPath, ObservableCollection, ReactiveStorage, Storage};
///
/// let storage = ReactiveStorage::new();
/// let fruit = Arc::new(ObservableCollection::new(vec!["apple", "pear"]));
/// storage.add_section(fruit.clone());
///
/// fruit.push("plum");
/// assert_eq!(storage.number_of_items(0), 3);
/// assert_eq!(storage.typed_item::<&str>(IndexPath::new(2, 0)), Some("plum"));
/// ```
pub struct ReactiveStorage {
    inner: Arc<ReactiveInner>,
}

impl Default for ReactiveStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveStorage {
    /// Creates a storage with no sections.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ReactiveInner {
                sections: RwLock::new(Vec::new()),
                tokens: Mutex::new(HashMap::new()),
                dispatcher: UpdateDispatcher::new(),
            }),
        }
    }

    /// A snapshot of the sections.
    pub fn sections(&self) -> Vec<ReactiveSection> {
        self.inner.sections.read().clone()
    }

    /// The section at `index`.
    pub fn section(&self, index: usize) -> Option<ReactiveSection> {
        self.inner.sections.read().get(index).cloned()
    }

    /// Appends a section backed by `results`.
    pub fn add_section<R: ObservableResults + 'static>(&self, results: Arc<R>) {
        let index = self.inner.sections.read().len();
        self.set_section(results, index);
    }

    /// Installs a section backed by `results` at `index` and asks the
    /// delegate to reload.
    ///
    /// `index` may be at most the current number of sections. A section
    /// already at `index` is replaced and its subscription ended.
    pub fn set_section<R: ObservableResults + 'static>(&self, results: Arc<R>, index: usize) {
        let results: Arc<dyn ObservableResults> = results;
        let mut model = SectionModel::new();
        let owner: Weak<ReactiveInner> = Arc::downgrade(&self.inner);
        model.set_owner(owner);
        let section = ReactiveSection {
            results: results.clone(),
            model,
        };
        let section_id = section.id();

        let replaced = {
            let mut sections = self.inner.sections.write();
            if index > sections.len() {
                tracing::debug!(target: targets::FEED, index, count = sections.len(), "section index past end");
                return;
            }
            if index == sections.len() {
                sections.push(section);
                None
            } else {
                Some(std::mem::replace(&mut sections[index], section).id())
            }
        };
        if let Some(old_id) = replaced {
            self.inner.tokens.lock().remove(&old_id);
        }

        if !results.is_read_only() {
            let inner = Arc::downgrade(&self.inner);
            let token = results.observe(Box::new(move |change| {
                if let Some(inner) = inner.upgrade() {
                    inner.handle_change(change, section_id);
                }
            }));
            self.inner.tokens.lock().insert(section_id, token);
        }
        self.inner.dispatcher.storage_needs_reloading();
    }

    /// Deletes the sections at `indexes`, ending their subscriptions.
    ///
    /// Out-of-range indexes are ignored.
    pub fn delete_sections(&self, indexes: impl IntoIterator<Item = usize>) {
        let mut indexes: Vec<usize> = indexes.into_iter().collect();
        indexes.sort_unstable();
        indexes.dedup();

        let removed: Vec<(usize, SectionId)> = {
            let mut sections = self.inner.sections.write();
            let count = sections.len();
            indexes
                .into_iter()
                .filter(|index| *index < count)
                .rev()
                .map(|index| (index, sections.remove(index).id()))
                .collect()
        };
        {
            let mut tokens = self.inner.tokens.lock();
            for (_, id) in &removed {
                tokens.remove(id);
            }
        }

        self.inner.dispatcher.start_update();
        self.inner.dispatcher.with_current_update(|update| {
            for (index, _) in removed.iter().rev() {
                update.record_section_change(ChangeType::Delete, vec![*index]);
            }
        });
        self.inner.dispatcher.finish_update();
    }

    /// Translates `change` of the section identified by `section_id`.
    ///
    /// Subscriptions call this automatically; it is public so that a caller
    /// marshaling notifications onto its own thread can forward them.
    pub fn handle_change(&self, change: &CollectionChange, section_id: SectionId) {
        self.inner.handle_change(change, section_id);
    }

    /// Sets the header model of `section` and asks the delegate to reload.
    pub fn set_section_header_model<T: std::any::Any + Send + Sync>(&self, model: Option<T>, section: usize) {
        match self.supplementary_kinds().header {
            Some(kind) => self.set_supplementary_model(model.map(AnyItem::new), &kind, section),
            None => tracing::warn!(target: targets::FEED, "header kind is not set, ignoring section header model"),
        }
    }

    /// Sets the footer model of `section` and asks the delegate to reload.
    pub fn set_section_footer_model<T: std::any::Any + Send + Sync>(&self, model: Option<T>, section: usize) {
        match self.supplementary_kinds().footer {
            Some(kind) => self.set_supplementary_model(model.map(AnyItem::new), &kind, section),
            None => tracing::warn!(target: targets::FEED, "footer kind is not set, ignoring section footer model"),
        }
    }

    fn set_supplementary_model(&self, model: Option<AnyItem>, kind: &str, section: usize) {
        let updated = match self.inner.sections.write().get_mut(section) {
            Some(target) => {
                target.model.set_supplementary_model(model, kind, 0);
                true
            }
            None => false,
        };
        if updated {
            self.inner.dispatcher.storage_needs_reloading();
        }
    }
}

impl Storage for ReactiveStorage {
    fn number_of_sections(&self) -> usize {
        self.inner.sections.read().len()
    }

    fn number_of_items(&self, section: usize) -> usize {
        self.inner
            .sections
            .read()
            .get(section)
            .map_or(0, ReactiveSection::number_of_items)
    }

    fn item(&self, index_path: IndexPath) -> Option<AnyItem> {
        self.inner
            .sections
            .read()
            .get(index_path.section)?
            .results
            .item(index_path.item)
    }

    fn set_delegate_weak(&self, delegate: Weak<dyn StorageUpdating>) {
        self.inner.dispatcher.set_delegate(delegate);
    }

    fn clear_delegate(&self) {
        self.inner.dispatcher.take_delegate();
    }
}

impl SupplementaryStorage for ReactiveStorage {
    fn supplementary_model(&self, kind: &str, index_path: IndexPath) -> Option<AnyItem> {
        self.inner
            .sections
            .read()
            .get(index_path.section)?
            .supplementary_model(kind, index_path.item)
            .cloned()
    }
}

impl HeaderFooterStorage for ReactiveStorage {
    fn supplementary_kinds(&self) -> SupplementaryKinds {
        self.inner.dispatcher.supplementary_kinds()
    }

    fn set_supplementary_kinds(&self, kinds: SupplementaryKinds) {
        self.inner.dispatcher.set_supplementary_kinds(kinds);
    }
}

impl HeaderFooterSettable for ReactiveStorage {
    fn set_supplementaries(&self, models: Vec<SupplementaryMap>, kind: &str) {
        {
            let mut sections = self.inner.sections.write();
            if models.len() > sections.len() {
                tracing::warn!(
                    target: targets::FEED,
                    models = models.len(),
                    sections = sections.len(),
                    "more supplementary sections than sections, extra models are ignored"
                );
            }
            if models.is_empty() {
                for section in sections.iter_mut() {
                    section.model.set_supplementaries(kind, SupplementaryMap::new());
                }
            } else {
                for (section, section_models) in sections.iter_mut().zip(models) {
                    section.model.set_supplementaries(kind, section_models);
                }
            }
        }
        self.inner.dispatcher.storage_needs_reloading();
    }
}

impl fmt::Debug for ReactiveStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveStorage")
            .field("sections", &self.inner.sections.read().len())
            .field("subscriptions", &self.inner.tokens.lock().len())
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}

static_assertions::assert_impl_all!(ReactiveStorage: Send, Sync);
static_assertions::assert_impl_all!(ObservableCollection<String>: Send, Sync);
