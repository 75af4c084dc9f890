use migrus::migration::MigrationContext;
use migrus::migrator::Migrator;
use migrus::store::memory::InMemoryVersionStore;
use migrus::store::{VersionRecord, VersionStore};
use migrus_int_test::test_util::{event_log, recorded_events, tracked_registry};

// Setup only one time throughout the project.
// It will take effect during test, project wide
#[ctor::ctor]
fn init() {
    colog::init();
}

// ==================== Rollback Tests ====================

#[test]
fn test_rollback_one_step_reverts_latest() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second"), (3, "Third")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(1, "First"),
        VersionRecord::new(2, "Second"),
        VersionRecord::new(3, "Third"),
    ]));
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    assert_eq!(migrator.rollback(&registry, Some(1)).unwrap(), 1);
    assert_eq!(recorded_events(&log), vec!["down:Third"]);
    assert_eq!(store.fetch_all().unwrap().len(), 2);
}

#[test]
fn test_rollback_everything_descending() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second"), (3, "Third")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(1, "First"),
        VersionRecord::new(2, "Second"),
        VersionRecord::new(3, "Third"),
    ]));
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    assert_eq!(migrator.rollback(&registry, None).unwrap(), 3);
    assert_eq!(
        recorded_events(&log),
        vec!["down:Third", "down:Second", "down:First"]
    );
    assert!(store.fetch_all().unwrap().is_empty());
}

#[test]
fn test_rollback_then_migrate_round_trip() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::new());
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    migrator.migrate_all(&registry).unwrap();
    migrator.rollback(&registry, None).unwrap();
    migrator.migrate_all(&registry).unwrap();

    assert_eq!(
        recorded_events(&log),
        vec![
            "up:First",
            "up:Second",
            "down:Second",
            "down:First",
            "up:First",
            "up:Second"
        ]
    );
    assert_eq!(store.fetch_all().unwrap().len(), 2);
}

#[test]
fn test_rollback_skips_orphans_without_consuming_steps() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    // 99 was applied by a migration that no longer exists
    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(1, "First"),
        VersionRecord::new(2, "Second"),
        VersionRecord::new(99, "Vanished"),
    ]));
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    assert_eq!(migrator.rollback(&registry, Some(1)).unwrap(), 1);
    assert_eq!(recorded_events(&log), vec!["down:Second"]);

    let remaining: Vec<u64> = store
        .fetch_all()
        .unwrap()
        .into_iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(remaining, vec![1, 99]);
}

#[test]
fn test_down_specific_version() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(1, "First"),
        VersionRecord::new(2, "Second"),
    ]));
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    migrator.down_version(&registry, 1).unwrap();
    assert_eq!(recorded_events(&log), vec!["down:First"]);
    assert_eq!(
        store.fetch_all().unwrap(),
        vec![VersionRecord::new(2, "Second")]
    );

    // unknown version succeeds without running anything
    migrator.down_version(&registry, 404).unwrap();
    assert_eq!(recorded_events(&log), vec!["down:First"]);
}

// ==================== Redo Tests ====================

#[test]
fn test_redo_runs_down_then_up() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(1, "First"),
        VersionRecord::new(2, "Second"),
    ]));
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    migrator.redo(&registry, 1).unwrap();
    assert_eq!(recorded_events(&log), vec!["down:First", "up:First"]);
    assert_eq!(store.fetch_all().unwrap().len(), 2);
}

#[test]
fn test_redo_unknown_or_unapplied_is_noop() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(1, "First"),
    ]));
    let migrator = Migrator::new(store, MigrationContext::new());

    // not registered
    migrator.redo(&registry, 404).unwrap();
    // registered but not applied
    migrator.redo(&registry, 2).unwrap();
    assert!(recorded_events(&log).is_empty());
}
