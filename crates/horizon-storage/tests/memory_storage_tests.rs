//! Tests for MemoryStorage transactions, deferred updates and anomalies.

mod common;

use horizon_storage::{
    AnyItem, ChangeType, HeaderFooterSettable, HeaderFooterStorage, IndexPath, MemoryStorage,
    MemoryStorageAnomaly, MemoryStorageError, PerfSpan, SectionModel, Storage, StorageConfig, StorageUpdate,
    SupplementaryKinds, SupplementaryMap, SupplementaryStorage,
};

use common::{StorageUpdatesObserver, capture_anomalies, init_tracing, int_sections, observed_storage};

fn path(item: usize, section: usize) -> IndexPath {
    IndexPath::new(item, section)
}

fn inserted_sections(indexes: &[usize]) -> Vec<(ChangeType, Vec<usize>)> {
    indexes.iter().map(|index| (ChangeType::Insert, vec![*index])).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_add_items_into_new_sections() {
    init_tracing();
    let (storage, observer) = observed_storage();

    storage.add_items([2, 4, 6], 0);
    let mut expected = StorageUpdate::new();
    expected.section_changes = inserted_sections(&[0]);
    expected.object_changes = vec![
        (ChangeType::Insert, vec![path(0, 0)]),
        (ChangeType::Insert, vec![path(1, 0)]),
        (ChangeType::Insert, vec![path(2, 0)]),
    ];
    assert_eq!(observer.take_last_update(), Some(expected));

    storage.add_item(5, 1);
    let mut expected = StorageUpdate::new();
    expected.section_changes = inserted_sections(&[1]);
    expected.object_changes = vec![(ChangeType::Insert, vec![path(0, 1)])];
    assert_eq!(observer.take_last_update(), Some(expected));

    assert_eq!(storage.typed_item::<i32>(path(2, 0)), Some(6));
    assert_eq!(storage.typed_item::<i32>(path(0, 1)), Some(5));
}

#[test]
fn test_add_items_vivifies_every_missing_section() {
    let (storage, observer) = observed_storage();
    storage.add_item(1, 0);
    storage.add_item(7, 3);

    let update = observer.take_last_update().unwrap();
    assert_eq!(update.section_changes, inserted_sections(&[1, 2, 3]));
    assert_eq!(update.object_changes, vec![(ChangeType::Insert, vec![path(0, 3)])]);
    assert_eq!(int_sections(&storage), vec![vec![1], vec![], vec![], vec![7]]);
}

#[test]
fn test_reload_item_records_update() {
    let (storage, observer) = observed_storage();
    storage.add_items([2, 4, 6], 0);
    observer.take_last_update();

    storage.reload_item(&4);
    let update = observer.take_last_update().unwrap();
    assert!(update.section_changes.is_empty());
    assert_eq!(update.object_changes, vec![(ChangeType::Update, vec![path(1, 0)])]);
    assert_eq!(
        update.updated_objects.get(&path(1, 0)).and_then(AnyItem::downcast::<i32>),
        Some(4)
    );
}

#[test]
fn test_reload_missing_item_delivers_nothing() {
    let (storage, observer) = observed_storage();
    storage.add_items([2, 4, 6], 0);
    let delivered = observer.update_count();

    storage.reload_item(&5);
    storage.reload_item(&"4");
    assert_eq!(observer.update_count(), delivered);
}

#[test]
fn test_move_item_between_sections() {
    let (storage, observer) = observed_storage();
    storage.set_items_for_all_sections(vec![vec![1], vec![2, 3], vec![4, 5, 6]]);

    storage.move_item(path(0, 0), path(1, 1));

    assert_eq!(storage.typed_item::<i32>(path(1, 1)), Some(1));
    let update = observer.take_last_update().unwrap();
    assert_eq!(update.object_changes, vec![(ChangeType::Move, vec![path(0, 0), path(1, 1)])]);
    assert_eq!(int_sections(&storage), vec![vec![], vec![2, 1, 3], vec![4, 5, 6]]);
}

#[test]
fn test_insert_items_count_mismatch_leaves_storage_untouched() {
    let (storage, observer) = observed_storage();
    let anomalies = capture_anomalies(storage.anomaly_handler());

    let result = storage.insert_items(vec![1], &[path(0, 0), path(1, 0)]);

    assert_eq!(result, Err(MemoryStorageError::items_count_mismatch()));
    assert_eq!(storage.number_of_sections(), 0);
    assert_eq!(observer.update_count(), 0);
    assert_eq!(
        *anomalies.lock(),
        vec![MemoryStorageAnomaly::BatchInsertionItemCountMismatch {
            items_count: 1,
            index_paths_count: 2,
        }]
    );
}

// ============================================================================
// Insertion
// ============================================================================

#[test]
fn test_insert_item_past_end_fails() {
    let (storage, observer) = observed_storage();
    let anomalies = capture_anomalies(storage.anomaly_handler());
    storage.add_items([1, 2], 0);
    let delivered = observer.update_count();

    let result = storage.insert_item(3, path(5, 0));

    assert_eq!(result, Err(MemoryStorageError::index_path_too_big(path(5, 0))));
    assert_eq!(observer.update_count(), delivered);
    assert_eq!(int_sections(&storage), vec![vec![1, 2]]);
    assert_eq!(
        *anomalies.lock(),
        vec![MemoryStorageAnomaly::InsertionIndexPathTooBig {
            index_path: path(5, 0),
            count_of_elements_in_section: 2,
        }]
    );

    assert!(storage.insert_item(4, path(1, 3)).is_err());
    assert_eq!(storage.number_of_sections(), 1);
}

#[test]
fn test_insert_item_into_missing_section() {
    let (storage, observer) = observed_storage();

    storage.insert_item("first", path(0, 1)).unwrap();

    let update = observer.take_last_update().unwrap();
    assert_eq!(update.section_changes, inserted_sections(&[0, 1]));
    assert_eq!(update.object_changes, vec![(ChangeType::Insert, vec![path(0, 1)])]);
    assert_eq!(storage.typed_item::<&str>(path(0, 1)), Some("first"));
}

#[test]
fn test_insert_items_skips_out_of_range_pairs() {
    let (storage, observer) = observed_storage();

    storage
        .insert_items(vec![1, 2, 3], &[path(0, 0), path(1, 0), path(5, 0)])
        .unwrap();

    let update = observer.take_last_update().unwrap();
    assert_eq!(update.section_changes, inserted_sections(&[0]));
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Insert, vec![path(0, 0)]),
            (ChangeType::Insert, vec![path(1, 0)]),
        ]
    );
    assert_eq!(int_sections(&storage), vec![vec![1, 2]]);
}

#[test]
fn test_insert_section_records_its_items() {
    let (storage, observer) = observed_storage();
    storage.add_item(1, 0);

    storage.insert_section(SectionModel::with_items([8, 9]), 0);

    let update = observer.take_last_update().unwrap();
    assert_eq!(update.section_changes, inserted_sections(&[0]));
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Insert, vec![path(0, 0)]),
            (ChangeType::Insert, vec![path(1, 0)]),
        ]
    );
    assert_eq!(int_sections(&storage), vec![vec![8, 9], vec![1]]);

    storage.insert_section(SectionModel::new(), 7);
    assert_eq!(storage.number_of_sections(), 2);
}

// ============================================================================
// Replacement and removal
// ============================================================================

#[test]
fn test_replace_item_attaches_new_value() {
    let (storage, observer) = observed_storage();
    storage.add_items([2, 4, 6], 0);

    storage.replace_item(&4, 40).unwrap();

    let update = observer.take_last_update().unwrap();
    assert_eq!(update.object_changes, vec![(ChangeType::Update, vec![path(1, 0)])]);
    assert_eq!(
        update.updated_objects.get(&path(1, 0)).and_then(AnyItem::downcast::<i32>),
        Some(40)
    );
    assert_eq!(int_sections(&storage), vec![vec![2, 40, 6]]);
}

#[test]
fn test_replace_and_remove_missing_item_fail() {
    let (storage, observer) = observed_storage();
    let anomalies = capture_anomalies(storage.anomaly_handler());
    storage.add_items([1], 0);
    let delivered = observer.update_count();

    assert_eq!(storage.replace_item(&3, 4), Err(MemoryStorageError::item_not_found("3")));
    assert_eq!(storage.remove_item(&3), Err(MemoryStorageError::item_not_found("3")));

    assert_eq!(observer.update_count(), delivered);
    assert_eq!(
        *anomalies.lock(),
        vec![
            MemoryStorageAnomaly::ReplaceItemFailedItemNotFound {
                item_description: "3".into(),
            },
            MemoryStorageAnomaly::RemoveItemFailedItemNotFound {
                item_description: "3".into(),
            },
        ]
    );
}

#[test]
fn test_remove_items_at_removes_highest_first() {
    let (storage, observer) = observed_storage();
    storage.add_items([1, 2, 3], 0);

    storage.remove_items_at(&[path(0, 0), path(1, 0)]);

    assert_eq!(int_sections(&storage), vec![vec![3]]);
    let update = observer.take_last_update().unwrap();
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Delete, vec![path(1, 0)]),
            (ChangeType::Delete, vec![path(0, 0)]),
        ]
    );
}

#[test]
fn test_remove_items_at_tolerates_invalid_and_duplicate_paths() {
    let (storage, _) = observed_storage();
    storage.add_items([1, 2, 3], 0);

    storage.remove_items_at(&[path(2, 0), path(2, 0), path(9, 0), path(0, 4)]);

    assert_eq!(int_sections(&storage), vec![vec![1, 2]]);
}

#[test]
fn test_remove_items_by_value() {
    let (storage, observer) = observed_storage();
    storage.add_items([1, 2, 3], 0);
    storage.add_items([3], 1);

    storage.remove_items(&[2, 9, 3]);

    let update = observer.take_last_update().unwrap();
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Delete, vec![path(1, 0)]),
            (ChangeType::Delete, vec![path(2, 0)]),
        ]
    );
    assert_eq!(int_sections(&storage), vec![vec![1], vec![3]]);
}

#[test]
fn test_remove_items_from_section() {
    let (storage, observer) = observed_storage();
    storage.add_items([1, 2], 0);

    storage.remove_items_from_section(0);
    storage.remove_items_from_section(4);

    let update = observer.take_last_update().unwrap();
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Delete, vec![path(0, 0)]),
            (ChangeType::Delete, vec![path(1, 0)]),
        ]
    );
    assert_eq!(int_sections(&storage), vec![Vec::<i32>::new()]);
}

#[test]
fn test_delete_sections_ignores_invalid_indexes() {
    let (storage, observer) = observed_storage();
    storage.set_items_for_all_sections(vec![vec![1], vec![2], vec![3]]);

    storage.delete_sections([2, 0, 10]);

    let update = observer.take_last_update().unwrap();
    assert_eq!(
        update.section_changes,
        vec![(ChangeType::Delete, vec![0]), (ChangeType::Delete, vec![2])]
    );
    assert_eq!(int_sections(&storage), vec![vec![2]]);
}

// ============================================================================
// Moves
// ============================================================================

#[test]
fn test_move_section_vivifies_and_records_pair() {
    let (storage, observer) = observed_storage();
    storage.add_item(1, 0);

    storage.move_section(0, 2);

    let update = observer.take_last_update().unwrap();
    assert_eq!(
        update.section_changes,
        vec![
            (ChangeType::Insert, vec![1]),
            (ChangeType::Insert, vec![2]),
            (ChangeType::Move, vec![0, 2]),
        ]
    );
    assert_eq!(int_sections(&storage), vec![vec![], vec![], vec![1]]);
}

#[test]
fn test_move_item_failures_are_anomalies() {
    let (storage, observer) = observed_storage();
    let anomalies = capture_anomalies(storage.anomaly_handler());
    storage.add_item(1, 0);
    let delivered = observer.update_count();

    storage.move_item(path(5, 0), path(0, 0));
    storage.move_item(path(0, 0), path(1, 0));

    assert_eq!(observer.update_count(), delivered);
    assert_eq!(int_sections(&storage), vec![vec![1]]);
    assert_eq!(
        *anomalies.lock(),
        vec![
            MemoryStorageAnomaly::MoveItemFailedItemNotFound { index_path: path(5, 0) },
            MemoryStorageAnomaly::MoveItemFailedIndexPathTooBig {
                index_path: path(1, 0),
                count_of_elements_in_section: 0,
            },
        ]
    );
}

#[test]
fn test_move_item_to_end_of_same_section() {
    let (storage, _) = observed_storage();
    storage.add_items([1, 2, 3], 0);

    storage.move_item(path(0, 0), path(2, 0));

    assert_eq!(int_sections(&storage), vec![vec![2, 3, 1]]);
}

#[test]
fn test_move_item_without_animation() {
    let (storage, observer) = observed_storage();
    let anomalies = capture_anomalies(storage.anomaly_handler());
    storage.add_items([1, 2, 3], 0);
    let delivered = observer.update_count();

    storage.move_item_without_animation(path(0, 0), path(2, 0));
    storage.move_item_without_animation(path(5, 0), path(0, 1));

    assert_eq!(int_sections(&storage), vec![vec![2, 3, 1]]);
    assert_eq!(observer.update_count(), delivered);
    assert!(!observer.did_reload());
    assert_eq!(
        *anomalies.lock(),
        vec![MemoryStorageAnomaly::MoveItemFailedInvalidIndexPaths {
            source_index_path: path(5, 0),
            destination_index_path: path(0, 1),
            source_elements_in_section: 3,
            destination_elements_in_section: 0,
        }]
    );
}

// ============================================================================
// Batching and deferral
// ============================================================================

#[test]
fn test_perform_updates_delivers_once() {
    init_tracing();
    let (storage, observer) = observed_storage();

    let _timing = PerfSpan::new("batch");
    storage.perform_updates(|| {
        storage.add_items([1, 2], 0);
        storage.perform_updates(|| storage.add_item(3, 1));
        storage.remove_item(&1).unwrap();
    });

    assert_eq!(observer.update_count(), 1);
    let update = observer.take_last_update().unwrap();
    assert_eq!(update.section_changes, inserted_sections(&[0, 1]));
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Insert, vec![path(0, 0)]),
            (ChangeType::Insert, vec![path(1, 0)]),
            (ChangeType::Insert, vec![path(0, 1)]),
            (ChangeType::Delete, vec![path(0, 0)]),
        ]
    );
    assert_eq!(int_sections(&storage), vec![vec![2], vec![3]]);
}

#[test]
fn test_manual_transaction() {
    let (storage, observer) = observed_storage();

    storage.start_update();
    storage.add_item(1, 0);
    assert_eq!(observer.update_count(), 1);
    storage.finish_update();
    assert_eq!(observer.update_count(), 1);
}

#[test]
fn test_deferred_storage_changes_on_apply_only() {
    let storage = MemoryStorage::new();
    let observer = StorageUpdatesObserver::holding();
    storage.set_delegate(&observer);
    storage.set_items([2, 3, 4, 6], 0);

    storage.perform_updates(|| {
        storage.insert_item(5, path(3, 0)).unwrap();
        storage.remove_item(&2).unwrap();
    });

    assert_eq!(int_sections(&storage), vec![vec![2, 3, 4, 6]]);
    let update = observer.take_last_update().unwrap();
    assert_eq!(
        update.object_changes,
        vec![
            (ChangeType::Insert, vec![path(3, 0)]),
            (ChangeType::Delete, vec![path(0, 0)]),
        ]
    );
    let mut update = update;
    update.apply_deferred_datasource_updates();
    assert_eq!(int_sections(&storage), vec![vec![3, 4, 5, 6]]);
}

fn run_mixed_operations(storage: &MemoryStorage) {
    storage.perform_updates(|| {
        storage.add_items([1, 2, 3], 0);
        storage.add_items([4, 5], 2);
        storage.insert_item(9, path(0, 1)).unwrap();
        storage.move_item(path(0, 0), path(1, 1));
        storage.remove_item(&2).unwrap();
        storage.replace_item(&5, 50).unwrap();
        storage.move_section(2, 0);
        storage.delete_sections([1]);
        storage.insert_section(SectionModel::with_items([7]), 1);
        storage.remove_items_at(&[path(0, 0)]);
        storage.reload_item(&7);
    });
}

#[test]
fn test_deferred_and_immediate_modes_agree() {
    let deferred = MemoryStorage::new();
    let deferred_observer = StorageUpdatesObserver::holding();
    deferred.set_delegate(&deferred_observer);

    let immediate = MemoryStorage::with_config(StorageConfig::new().with_defers_datasource_updates(false));
    let immediate_observer = StorageUpdatesObserver::holding();
    immediate.set_delegate(&immediate_observer);

    run_mixed_operations(&deferred);
    run_mixed_operations(&immediate);

    assert_eq!(deferred.number_of_sections(), 0);
    deferred_observer.apply_all();

    assert_eq!(int_sections(&deferred), int_sections(&immediate));
    assert_eq!(int_sections(&deferred), vec![vec![50], vec![7], vec![9, 1]]);
    assert_eq!(
        deferred_observer.take_last_update(),
        immediate_observer.take_last_update()
    );
}

#[test]
fn test_update_without_animations_skips_delegate() {
    let (storage, observer) = observed_storage();

    storage.update_without_animations(|| {
        storage.add_items([1, 2], 0);
        storage.remove_item(&1).unwrap();
    });

    assert_eq!(observer.update_count(), 0);
    assert_eq!(int_sections(&storage), vec![vec![2]]);

    storage.add_item(3, 0);
    assert_eq!(observer.update_count(), 1);
}

#[test]
fn test_held_updates_each_describe_their_own_step() {
    let storage = MemoryStorage::new();
    let observer = StorageUpdatesObserver::holding();
    storage.set_delegate(&observer);

    storage.add_item(1, 0);
    storage.add_item(2, 1);
    storage.add_item(3, 1);
    storage.insert_item(0, path(0, 0)).unwrap();
    assert_eq!(storage.number_of_sections(), 0);

    let updates = observer.updates.lock();
    let records: Vec<_> = updates
        .iter()
        .map(|update| (update.section_changes.clone(), update.object_changes.clone()))
        .collect();
    drop(updates);
    assert_eq!(
        records,
        vec![
            (inserted_sections(&[0]), vec![(ChangeType::Insert, vec![path(0, 0)])]),
            (inserted_sections(&[1]), vec![(ChangeType::Insert, vec![path(0, 1)])]),
            (Vec::new(), vec![(ChangeType::Insert, vec![path(1, 1)])]),
            (Vec::new(), vec![(ChangeType::Insert, vec![path(0, 0)])]),
        ]
    );

    observer.apply_all();
    assert_eq!(int_sections(&storage), vec![vec![0, 1], vec![2, 3]]);
}

#[test]
fn test_second_held_update_reuses_created_section() {
    let storage = MemoryStorage::new();
    let observer = StorageUpdatesObserver::holding();
    storage.set_delegate(&observer);

    storage.add_item(1, 0);
    storage.add_item(2, 0);

    let mut second = observer.take_last_update().unwrap();
    assert!(second.section_changes.is_empty());
    assert_eq!(second.object_changes, vec![(ChangeType::Insert, vec![path(1, 0)])]);

    observer.apply_all();
    second.apply_deferred_datasource_updates();
    assert_eq!(int_sections(&storage), vec![vec![1, 2]]);
}

// ============================================================================
// Reload-class mutations
// ============================================================================

#[test]
fn test_set_items_requests_reload() {
    let (storage, observer) = observed_storage();

    storage.set_items([1, 2], 1);

    assert!(observer.did_reload());
    assert_eq!(observer.update_count(), 0);
    assert_eq!(int_sections(&storage), vec![vec![], vec![1, 2]]);
}

#[test]
fn test_set_items_for_all_sections_keeps_later_sections() {
    let (storage, _) = observed_storage();
    storage.set_items_for_all_sections(vec![vec![1], vec![2], vec![3]]);

    storage.set_items_for_all_sections(vec![vec![10]]);

    assert_eq!(int_sections(&storage), vec![vec![10], vec![2], vec![3]]);
}

#[test]
fn test_remove_all_items_keeps_sections() {
    let (storage, observer) = observed_storage();
    storage.set_items_for_all_sections(vec![vec![1], vec![2]]);

    storage.remove_all_items();

    assert_eq!(storage.number_of_sections(), 2);
    assert_eq!(storage.total_number_of_items(), 0);
    assert_eq!(*observer.reload_count.lock(), 2);
}

#[test]
fn test_header_and_footer_models() {
    let storage = MemoryStorage::with_config(
        StorageConfig::new().with_supplementary_kinds(SupplementaryKinds::list()),
    );
    let observer = StorageUpdatesObserver::applying();
    storage.set_delegate(&observer);

    storage.set_section_header_model(Some("H"), 2);
    storage.set_section_footer_model(Some("F"), 0);
    assert_eq!(storage.number_of_sections(), 3);
    assert_eq!(storage.header_model(2).and_then(|m| m.downcast::<&str>()), Some("H"));
    assert_eq!(storage.footer_model(0).and_then(|m| m.downcast::<&str>()), Some("F"));

    storage.set_section_header_models(vec!["a", "b"]);
    assert_eq!(storage.header_model(0).and_then(|m| m.downcast::<&str>()), Some("a"));
    assert_eq!(storage.header_model(2).and_then(|m| m.downcast::<&str>()), Some("H"));

    storage.set_supplementaries(Vec::new(), horizon_storage::LIST_SECTION_HEADER_KIND);
    assert!(storage.header_model(2).is_none());
    assert_eq!(storage.footer_model(0).and_then(|m| m.downcast::<&str>()), Some("F"));
    assert_eq!(*observer.reload_count.lock(), 4);
}

#[test]
fn test_header_model_without_kind_is_ignored() {
    let (storage, observer) = observed_storage();

    storage.set_section_header_model(Some("H"), 0);

    assert_eq!(storage.number_of_sections(), 0);
    assert!(!observer.did_reload());

    storage.configure_for_grid_usage();
    storage.set_section_header_model(Some("H"), 0);
    assert_eq!(
        storage
            .supplementary_model(horizon_storage::GRID_SECTION_HEADER_KIND, path(0, 0))
            .and_then(|m| m.downcast::<&str>()),
        Some("H")
    );
}

#[test]
fn test_set_supplementaries_vivifies_sections() {
    let (storage, _) = observed_storage();
    let models = vec![
        SupplementaryMap::from([(0, AnyItem::new(1))]),
        SupplementaryMap::from([(1, AnyItem::new(2))]),
    ];

    storage.set_supplementaries(models, "Badge");

    assert_eq!(storage.number_of_sections(), 2);
    assert_eq!(
        storage.supplementary_model("Badge", path(1, 1)).and_then(|m| m.downcast::<i32>()),
        Some(2)
    );
    assert!(storage.supplementary_model("Badge", path(0, 1)).is_none());
}

// ============================================================================
// Lookups and anomalies
// ============================================================================

#[test]
fn test_lookups() {
    let (storage, _) = observed_storage();
    storage.set_items_for_all_sections(vec![vec![1, 2], vec![3]]);

    assert_eq!(storage.index_path(&3), Some(path(0, 1)));
    assert_eq!(storage.index_paths(&[3, 8, 1]), vec![path(0, 1), path(0, 0)]);
    assert_eq!(storage.items_of_type::<i32>(0), vec![1, 2]);
    assert_eq!(storage.items(1).map(|items| items.len()), Some(1));
    assert!(storage.items(5).is_none());
    assert!(storage.item(path(2, 0)).is_none());
    assert!(storage.item(path(0, 2)).is_none());
    assert_eq!(storage.number_of_items(7), 0);
    assert_eq!(storage.total_number_of_items(), 3);
}

#[test]
fn test_silenced_anomalies_are_not_delivered() {
    let (storage, _) = observed_storage();
    let anomalies = capture_anomalies(storage.anomaly_handler());
    storage
        .anomaly_handler()
        .silence_anomalies(|anomaly| matches!(anomaly, MemoryStorageAnomaly::MoveItemFailedItemNotFound { .. }));

    storage.move_item(path(0, 0), path(0, 0));
    let _ = storage.remove_item(&1);

    assert_eq!(
        *anomalies.lock(),
        vec![MemoryStorageAnomaly::RemoveItemFailedItemNotFound {
            item_description: "1".into(),
        }]
    );
}

#[test]
fn test_section_knows_its_index_after_deletion() {
    let (storage, _) = observed_storage();
    storage.set_items_for_all_sections(vec![vec![1], vec![2], vec![3]]);
    let last = storage.section(2).unwrap();

    storage.delete_sections([0]);

    assert_eq!(last.current_section_index(), Some(1));
    let detached = SectionModel::new();
    assert_eq!(detached.current_section_index(), None);
}

#[test]
fn test_inserted_section_snapshot_gets_its_own_index() {
    let (storage, _) = observed_storage();
    storage.add_item(1, 0);
    storage.add_item(2, 1);

    let snapshot = storage.section(0).unwrap();
    storage.insert_section(snapshot, 2);
    storage.set_section(storage.section(1).unwrap(), 3);

    let indexes: Vec<_> = storage
        .sections()
        .iter()
        .map(SectionModel::current_section_index)
        .collect();
    assert_eq!(indexes, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(int_sections(&storage), vec![vec![1], vec![2], vec![1], vec![2]]);
}
