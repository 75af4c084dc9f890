use migrus::errors::MigrusResult;
use migrus::migration::Migration;
use migrus::registry::{GroupScope, Registry, StaticSourceSet};
use std::env;
use std::sync::{Arc, Mutex};

/// Shared record of hook executions, in the order they happened.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded_events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Builds a migration whose hooks push `up:<name>` / `down:<name>` onto the
/// shared log.
pub fn tracked_migration(version: u64, name: &str, log: &EventLog) -> Migration {
    let up_log = log.clone();
    let up_name = name.to_string();
    let down_log = log.clone();
    let down_name = name.to_string();
    Migration::new(
        version,
        name,
        move |_| {
            up_log.lock().unwrap().push(format!("up:{}", up_name));
            Ok(())
        },
        move |_| {
            down_log.lock().unwrap().push(format!("down:{}", down_name));
            Ok(())
        },
    )
}

/// Builds a source set of tracked migrations from `(version, identifier
/// remainder)` pairs.
pub fn tracked_source_set(log: &EventLog, specs: &[(u64, &str)]) -> StaticSourceSet {
    let mut sources = StaticSourceSet::new();
    for (version, name) in specs {
        let log = log.clone();
        sources = sources.with_source(&format!("{}_{}", version, name), move |v, n| {
            Ok(tracked_migration(v, n, &log))
        });
    }
    sources
}

/// Discovers a tracked registry under an ungrouped scope.
pub fn tracked_registry(log: &EventLog, specs: &[(u64, &str)]) -> MigrusResult<Registry> {
    Registry::discover(&tracked_source_set(log, specs), &GroupScope::ungrouped())
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir
        .join(format!("migrus-it-{}", id))
        .to_string_lossy()
        .to_string()
}
