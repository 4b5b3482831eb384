//! Replayable section edits and the workspace mutations run against.
//!
//! A memory storage mutation never touches the live sections directly when
//! datasource updates are deferred. It runs against a staged copy through a
//! [`Workspace`], which records changes and logs every physical edit as a
//! [`SectionEdit`]. The log is replayed on the live sections when the
//! delivered update is applied. Because the staged copy and the live
//! sections start out identical, replaying the log reproduces the staged
//! result exactly.

use std::any::Any;
use std::sync::Weak;

use horizon_storage_core::logging::targets;

use crate::index_path::IndexPath;
use crate::item::AnyItem;
use crate::section::{SectionLocationIdentifying, SectionModel};
use crate::update::{ChangeType, StorageUpdate};

use super::anomaly::MemoryStorageAnomaly;

/// Owner handle given to sections so they can look up their index.
pub(crate) type SectionOwner = Weak<dyn SectionLocationIdentifying>;

/// One physical change to a list of sections.
#[derive(Debug, Clone)]
pub(crate) enum SectionEdit {
    /// Creates sections from `start` on, keeping any that already exist.
    AppendSections { start: usize, sections: Vec<SectionModel> },
    InsertSection { index: usize, section: SectionModel },
    AppendItems { section: usize, items: Vec<AnyItem> },
    InsertItem { index_path: IndexPath, item: AnyItem },
    ReplaceItem { index_path: IndexPath, item: AnyItem },
    RemoveItem(IndexPath),
    ClearSection(usize),
    DeleteSection(usize),
    MoveSection { from: usize, to: usize },
    MoveItem { from: IndexPath, to: IndexPath },
}

impl SectionEdit {
    /// Applies the edit. Out-of-range edits are skipped and reported as `false`.
    pub(crate) fn apply(&self, sections: &mut Vec<SectionModel>, owner: &SectionOwner) -> bool {
        match self {
            SectionEdit::AppendSections { start, sections: added } => {
                if *start > sections.len() {
                    return false;
                }
                let existing = sections.len() - start;
                sections.extend(added.iter().skip(existing).cloned().map(|mut section| {
                    section.set_owner(owner.clone());
                    section
                }));
                true
            }
            SectionEdit::InsertSection { index, section } => {
                if *index > sections.len() {
                    return false;
                }
                let mut section = section.clone();
                section.set_owner(owner.clone());
                sections.insert(*index, section);
                true
            }
            SectionEdit::AppendItems { section, items } => match sections.get_mut(*section) {
                Some(section) => {
                    section.items_mut().extend(items.iter().cloned());
                    true
                }
                None => false,
            },
            SectionEdit::InsertItem { index_path, item } => {
                match sections.get_mut(index_path.section) {
                    Some(section) if index_path.item <= section.number_of_items() => {
                        section.items_mut().insert(index_path.item, item.clone());
                        true
                    }
                    _ => false,
                }
            }
            SectionEdit::ReplaceItem { index_path, item } => {
                match sections
                    .get_mut(index_path.section)
                    .and_then(|section| section.items_mut().get_mut(index_path.item))
                {
                    Some(slot) => {
                        *slot = item.clone();
                        true
                    }
                    None => false,
                }
            }
            SectionEdit::RemoveItem(index_path) => match sections.get_mut(index_path.section) {
                Some(section) if index_path.item < section.number_of_items() => {
                    section.items_mut().remove(index_path.item);
                    true
                }
                _ => false,
            },
            SectionEdit::ClearSection(index) => match sections.get_mut(*index) {
                Some(section) => {
                    section.items_mut().clear();
                    true
                }
                None => false,
            },
            SectionEdit::DeleteSection(index) => {
                if *index >= sections.len() {
                    return false;
                }
                sections.remove(*index);
                true
            }
            SectionEdit::MoveSection { from, to } => {
                if *from >= sections.len() || *to >= sections.len() {
                    return false;
                }
                let section = sections.remove(*from);
                sections.insert(*to, section);
                true
            }
            SectionEdit::MoveItem { from, to } => move_item(sections, *from, *to),
        }
    }
}

/// Moves one item, checking both ends before touching anything.
pub(crate) fn move_item(sections: &mut [SectionModel], from: IndexPath, to: IndexPath) -> bool {
    let source_count = match sections.get(from.section) {
        Some(section) if from.item < section.number_of_items() => section.number_of_items(),
        _ => return false,
    };
    let destination_count = match sections.get(to.section) {
        Some(_) if to.section == from.section => source_count - 1,
        Some(section) => section.number_of_items(),
        None => return false,
    };
    if to.item > destination_count {
        return false;
    }
    let item = sections[from.section].items_mut().remove(from.item);
    sections[to.section].items_mut().insert(to.item, item);
    true
}

/// Replays `edits` on `sections`, logging any that no longer fit.
pub(crate) fn replay(edits: &[SectionEdit], sections: &mut Vec<SectionModel>, owner: &SectionOwner) {
    for edit in edits {
        if !edit.apply(sections, owner) {
            tracing::warn!(target: targets::MEMORY, ?edit, "skipping deferred edit that no longer fits");
        }
    }
}

/// Finds the first item equal to `value`, scanning sections then items.
pub(crate) fn find_item<T: PartialEq + Any>(sections: &[SectionModel], value: &T) -> Option<IndexPath> {
    sections.iter().enumerate().find_map(|(section_index, section)| {
        section
            .items()
            .iter()
            .position(|item| item.downcast_ref::<T>() == Some(value))
            .map(|item_index| IndexPath::new(item_index, section_index))
    })
}

/// The state a single storage operation runs against.
pub(crate) struct Workspace<'a> {
    sections: &'a mut Vec<SectionModel>,
    owner: SectionOwner,
    update: StorageUpdate,
    edits: Option<Vec<SectionEdit>>,
    anomalies: Vec<MemoryStorageAnomaly>,
}

/// What an operation left behind once its workspace is closed.
pub(crate) struct WorkspaceOutcome {
    pub(crate) update: StorageUpdate,
    pub(crate) edits: Option<Vec<SectionEdit>>,
    pub(crate) anomalies: Vec<MemoryStorageAnomaly>,
}

impl<'a> Workspace<'a> {
    /// Opens a workspace. With `log_edits`, every edit is kept for replay.
    pub(crate) fn new(sections: &'a mut Vec<SectionModel>, owner: SectionOwner, log_edits: bool) -> Self {
        Self {
            sections,
            owner,
            update: StorageUpdate::new(),
            edits: log_edits.then(Vec::new),
            anomalies: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> WorkspaceOutcome {
        WorkspaceOutcome {
            update: self.update,
            edits: self.edits,
            anomalies: self.anomalies,
        }
    }

    pub(crate) fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    pub(crate) fn number_of_items(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, SectionModel::number_of_items)
    }

    pub(crate) fn item(&self, index_path: IndexPath) -> Option<&AnyItem> {
        self.sections.get(index_path.section)?.item(index_path.item)
    }

    pub(crate) fn find<T: PartialEq + Any>(&self, value: &T) -> Option<IndexPath> {
        find_item(self.sections, value)
    }

    pub(crate) fn record(&mut self) -> &mut StorageUpdate {
        &mut self.update
    }

    pub(crate) fn report(&mut self, anomaly: MemoryStorageAnomaly) {
        self.anomalies.push(anomaly);
    }

    /// Creates empty sections up to and including `section`, recording each.
    pub(crate) fn ensure_section(&mut self, section: usize) {
        let existing = self.sections.len();
        if section < existing {
            return;
        }
        let created: Vec<SectionModel> = (existing..=section)
            .map(|_| {
                let mut model = SectionModel::new();
                model.set_owner(self.owner.clone());
                model
            })
            .collect();
        for index in existing..=section {
            self.update.record_section_change(ChangeType::Insert, vec![index]);
        }
        self.apply(SectionEdit::AppendSections {
            start: existing,
            sections: created,
        });
    }

    /// Applies an edit and logs it for replay.
    pub(crate) fn apply(&mut self, edit: SectionEdit) -> bool {
        let applied = edit.apply(self.sections, &self.owner);
        if applied {
            if let Some(edits) = self.edits.as_mut() {
                edits.push(edit);
            }
        }
        applied
    }
}
