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

// ==================== Forward Migration Tests ====================

#[test]
fn test_migrate_runs_only_pending_in_order() {
    // three registered migrations, the middle one already applied
    let log = event_log();
    let registry = tracked_registry(
        &log,
        &[
            (20141104210000, "TestOne"),
            (20141104220000, "TestTwo"),
            (20141104230000, "TestThree"),
        ],
    )
    .unwrap();

    let store = VersionStore::new(InMemoryVersionStore::with_applied(vec![
        VersionRecord::new(20141104220000, "TestTwo"),
    ]));
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    let count = migrator.migrate_all(&registry).unwrap();
    assert_eq!(count, 2);
    assert_eq!(recorded_events(&log), vec!["up:TestOne", "up:TestThree"]);

    let versions: Vec<u64> = store
        .fetch_all()
        .unwrap()
        .into_iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(
        versions,
        vec![20141104210000, 20141104220000, 20141104230000]
    );
}

#[test]
fn test_migrate_twice_is_idempotent() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::new());
    let migrator = Migrator::new(store, MigrationContext::new());

    assert_eq!(migrator.migrate_all(&registry).unwrap(), 2);
    assert_eq!(migrator.migrate_all(&registry).unwrap(), 0);
    assert_eq!(recorded_events(&log), vec!["up:First", "up:Second"]);
}

#[test]
fn test_migrate_empty_registry() {
    let log = event_log();
    let registry = tracked_registry(&log, &[]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::new());
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    assert_eq!(migrator.migrate_all(&registry).unwrap(), 0);
    // bootstrap still ran
    assert!(store.has_schema().unwrap());
}

#[test]
fn test_up_specific_version() {
    let log = event_log();
    let registry = tracked_registry(&log, &[(1, "First"), (2, "Second")]).unwrap();
    let store = VersionStore::new(InMemoryVersionStore::new());
    let migrator = Migrator::new(store.clone(), MigrationContext::new());

    migrator.up_version(&registry, 2).unwrap();
    assert_eq!(recorded_events(&log), vec!["up:Second"]);
    assert_eq!(
        store.fetch_all().unwrap(),
        vec![VersionRecord::new(2, "Second")]
    );

    // unknown version succeeds without running anything
    migrator.up_version(&registry, 404).unwrap();
    assert_eq!(recorded_events(&log), vec!["up:Second"]);
}

#[test]
fn test_hooks_see_the_configured_connection() {
    use migrus::migration::Migration;
    use migrus::registry::{GroupScope, Registry, StaticSourceSet};

    let sources = StaticSourceSet::new().with_source("1_ReadSetting", |v, n| {
        Ok(Migration::new(
            v,
            n,
            |ctx| {
                let dsn = ctx.connection::<String>()?;
                assert_eq!(dsn.as_str(), "dsn://integration");
                Ok(())
            },
            |_| Ok(()),
        ))
    });
    let registry = Registry::discover(&sources, &GroupScope::ungrouped()).unwrap();

    let context = MigrationContext::new().with_connection(String::from("dsn://integration"));
    let migrator = Migrator::new(VersionStore::new(InMemoryVersionStore::new()), context);

    assert_eq!(migrator.migrate_all(&registry).unwrap(), 1);
}
