use crate::errors::{ErrorKind, MigrusError, MigrusResult};
use crate::migration::Migration;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

// <version>_<segments>; segments are alphanumeric, underscore separated
static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)_([A-Za-z][A-Za-z0-9]*(?:_[A-Za-z0-9]+)*)$")
        .expect("identifier pattern must compile")
});

/// Constructs the executable unit for a parsed source descriptor.
///
/// The factory receives the version and canonical name the registry parsed
/// from the source identifier and returns the migration to register under
/// them. A factory that cannot resolve a unit for the given name fails with
/// [`ErrorKind::UnresolvableMigration`].
pub type MigrationFactory = Arc<dyn Fn(u64, &str) -> MigrusResult<Migration> + Send + Sync>;

/// A discovery descriptor: a filename-like identifier encoding version,
/// optional group tag, and name, plus the factory that builds the unit.
#[derive(Clone)]
pub struct MigrationSource {
    pub identifier: String,
    pub factory: MigrationFactory,
}

impl MigrationSource {
    pub fn new(
        identifier: &str,
        factory: impl Fn(u64, &str) -> MigrusResult<Migration> + Send + Sync + 'static,
    ) -> Self {
        MigrationSource {
            identifier: identifier.to_string(),
            factory: Arc::new(factory),
        }
    }
}

impl std::fmt::Debug for MigrationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationSource")
            .field("identifier", &self.identifier)
            .finish()
    }
}

/// The group scope a discovery pass runs under.
///
/// A middle identifier segment is treated as a group tag only when it names
/// a known group; everything else is part of the migration name. Sources
/// tagged for another group are excluded, untagged sources always match.
#[derive(Debug, Clone, Default)]
pub struct GroupScope {
    active: Option<String>,
    known: BTreeSet<String>,
}

impl GroupScope {
    /// Scope for a single-adapter deployment: no tags are recognized.
    pub fn ungrouped() -> Self {
        GroupScope::default()
    }

    /// Scope for a grouped deployment with one active group.
    pub fn grouped(active: &str, known: impl IntoIterator<Item = String>) -> Self {
        let mut known: BTreeSet<String> = known.into_iter().collect();
        known.insert(active.to_string());
        GroupScope {
            active: Some(active.to_string()),
            known,
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn is_known_tag(&self, segment: &str) -> bool {
        self.known.contains(segment)
    }
}

/// Identifier fields recovered from one source descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentifier {
    pub version: u64,
    pub group: Option<String>,
    pub name: String,
}

/// Parses `<version>[_<group>]_<name>` under the given group scope.
pub fn parse_identifier(identifier: &str, scope: &GroupScope) -> MigrusResult<ParsedIdentifier> {
    let captures = IDENTIFIER_PATTERN.captures(identifier).ok_or_else(|| {
        MigrusError::new(
            &format!(
                "\"{}\" is not a valid migration identifier, expected <version>[_<group>]_<name>",
                identifier
            ),
            ErrorKind::InvalidMigrationIdentifier,
        )
    })?;

    let version: u64 = captures[1].parse().map_err(|err| {
        MigrusError::new_with_cause(
            &format!("\"{}\" has an unparsable version", identifier),
            ErrorKind::InvalidMigrationIdentifier,
            MigrusError::from(err),
        )
    })?;

    let remainder = &captures[2];
    let (group, raw_name) = match remainder.split_once('_') {
        Some((first, rest)) if scope.is_known_tag(first) => (Some(first.to_string()), rest),
        _ => (None, remainder),
    };

    Ok(ParsedIdentifier {
        version,
        group,
        name: canonical_name(raw_name),
    })
}

/// Converts a raw migration name to its canonical identifier form,
/// e.g. `create_table_user` to `CreateTableUser`.
pub fn canonical_name(raw: &str) -> String {
    raw.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Strategy for enumerating migration source descriptors.
///
/// Decouples how a migration is found (directory scan, static list) from
/// how it is executed; the registry consumes any implementation the same
/// way.
pub trait MigrationSourceSet {
    fn sources(&self) -> MigrusResult<Vec<MigrationSource>>;
}

/// Source enumeration from a static, in-code list of descriptors.
#[derive(Default)]
pub struct StaticSourceSet {
    sources: Vec<MigrationSource>,
}

impl StaticSourceSet {
    pub fn new() -> Self {
        StaticSourceSet::default()
    }

    pub fn with_source(
        mut self,
        identifier: &str,
        factory: impl Fn(u64, &str) -> MigrusResult<Migration> + Send + Sync + 'static,
    ) -> Self {
        self.sources.push(MigrationSource::new(identifier, factory));
        self
    }
}

impl MigrationSourceSet for StaticSourceSet {
    fn sources(&self) -> MigrusResult<Vec<MigrationSource>> {
        Ok(self.sources.clone())
    }
}

/// Source enumeration from a directory listing.
///
/// Every regular file's stem is taken as a source identifier; the executable
/// unit is resolved by looking the canonical name up among the registered
/// factories. A parsed stem with no registered factory fails discovery with
/// [`ErrorKind::UnresolvableMigration`].
pub struct DirectorySourceSet {
    directory: PathBuf,
    factories: Arc<HashMap<String, MigrationFactory>>,
}

impl DirectorySourceSet {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectorySourceSet {
            directory: directory.into(),
            factories: Arc::new(HashMap::new()),
        }
    }

    /// Registers the factory that resolves the given canonical name.
    pub fn with_factory(
        mut self,
        name: &str,
        factory: impl Fn(u64, &str) -> MigrusResult<Migration> + Send + Sync + 'static,
    ) -> Self {
        let factories = Arc::make_mut(&mut self.factories);
        factories.insert(name.to_string(), Arc::new(factory));
        self
    }
}

impl MigrationSourceSet for DirectorySourceSet {
    fn sources(&self) -> MigrusResult<Vec<MigrationSource>> {
        let mut sources = Vec::new();

        let mut entries: Vec<PathBuf> = std::fs::read_dir(&self.directory)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        for path in entries {
            let stem = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if !stem.starts_with('.') => stem.to_string(),
                _ => continue,
            };

            let factories = Arc::clone(&self.factories);
            let display = path.display().to_string();
            sources.push(MigrationSource::new(&stem, move |version, name| {
                let factory = factories.get(name).ok_or_else(|| {
                    MigrusError::new(
                        &format!(
                            "No migration registered under \"{}\" for file \"{}\"",
                            name, display
                        ),
                        ErrorKind::UnresolvableMigration,
                    )
                })?;
                factory(version, name)
            }));
        }

        Ok(sources)
    }
}

/// The validated, ordered collection of discovered migrations for one run.
///
/// # Purpose
/// Maps version to migration, strictly ascending, with versions and
/// canonical names unique. Built once per run by [`Registry::discover`] and
/// immutable afterward; its ascending order is the canonical forward
/// direction for `migrate` and is reversed for `rollback`.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<u64, Migration>,
}

impl Registry {
    /// Discovers, validates, and orders migrations from a source set.
    ///
    /// Validation runs eagerly over the whole set before anything executes:
    /// a single malformed entry fails the run before any migration runs.
    /// Sources tagged for another group are skipped. No store access
    /// happens here.
    ///
    /// # Errors
    /// * [`ErrorKind::InvalidMigrationIdentifier`] - malformed identifier
    /// * [`ErrorKind::DuplicateVersion`] - two sources share a version
    /// * [`ErrorKind::DuplicateName`] - two sources normalize to one name
    /// * [`ErrorKind::UnresolvableMigration`] - no unit for a parsed source
    /// * [`ErrorKind::WrongMigrationType`] - unit disagrees with its source
    pub fn discover(
        source_set: &dyn MigrationSourceSet,
        scope: &GroupScope,
    ) -> MigrusResult<Registry> {
        let sources = source_set.sources()?;

        let mut entries: BTreeMap<u64, Migration> = BTreeMap::new();
        let mut version_origins: HashMap<u64, String> = HashMap::new();
        let mut name_origins: HashMap<String, String> = HashMap::new();

        for source in &sources {
            let parsed = parse_identifier(&source.identifier, scope)?;

            if let Some(tag) = &parsed.group {
                if scope.active() != Some(tag.as_str()) {
                    log::debug!(
                        "skipping \"{}\": tagged for group \"{}\"",
                        source.identifier,
                        tag
                    );
                    continue;
                }
            }

            if let Some(origin) = version_origins.get(&parsed.version) {
                return Err(MigrusError::new(
                    &format!(
                        "Duplicate migration, \"{}\" has the same version as \"{}\"",
                        source.identifier, origin
                    ),
                    ErrorKind::DuplicateVersion,
                ));
            }

            if let Some(origin) = name_origins.get(&parsed.name) {
                return Err(MigrusError::new(
                    &format!(
                        "Migration \"{}\" has the same name as \"{}\"",
                        source.identifier, origin
                    ),
                    ErrorKind::DuplicateName,
                ));
            }

            let migration = (source.factory)(parsed.version, &parsed.name)?;

            if migration.version() != parsed.version || migration.name() != parsed.name {
                return Err(MigrusError::new(
                    &format!(
                        "The unit resolved for \"{}\" reports {} {}, expected {} {}",
                        source.identifier,
                        migration.version(),
                        migration.name(),
                        parsed.version,
                        parsed.name
                    ),
                    ErrorKind::WrongMigrationType,
                ));
            }

            version_origins.insert(parsed.version, source.identifier.clone());
            name_origins.insert(parsed.name.clone(), source.identifier.clone());
            entries.insert(parsed.version, migration);
        }

        log::debug!("discovered {} migrations", entries.len());
        Ok(Registry { entries })
    }

    pub fn get(&self, version: u64) -> Option<&Migration> {
        self.entries.get(&version)
    }

    pub fn contains(&self, version: u64) -> bool {
        self.entries.contains_key(&version)
    }

    /// All registered versions, ascending.
    pub fn versions(&self) -> Vec<u64> {
        self.entries.keys().copied().collect()
    }

    /// Iterates migrations ascending by version.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
