use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for migrus operations.
///
/// Each kind describes a specific category of failure, enabling precise
/// error handling. Discovery kinds are raised before any migration executes;
/// execution kinds abort the current operation only.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Discovery errors - raised eagerly over the whole source set
    /// A source identifier does not match `<version>[_<group>]_<name>`
    InvalidMigrationIdentifier,
    /// Two sources share the same version
    DuplicateVersion,
    /// Two sources normalize to the same canonical name
    DuplicateName,
    /// No executable unit could be resolved for a parsed source
    UnresolvableMigration,
    /// The resolved unit does not agree with its source descriptor
    WrongMigrationType,

    // Bootstrap errors
    /// The version store could not create its bookkeeping structure
    SchemaInitializationFailed,

    // Execution errors
    /// A migration's own up/down logic failed
    HookExecutionFailed,
    /// The version store failed to fetch or record state
    StoreOperationFailed,

    // IO errors - raised by file-backed stores and source scans
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for a file operation
    PermissionDenied,

    // Validation errors
    /// Generic validation error
    ValidationError,
    /// A value could not be parsed into the expected type
    InvalidDataType,

    // Generic/internal errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidMigrationIdentifier => write!(f, "Invalid migration identifier"),
            ErrorKind::DuplicateVersion => write!(f, "Duplicate version"),
            ErrorKind::DuplicateName => write!(f, "Duplicate name"),
            ErrorKind::UnresolvableMigration => write!(f, "Unresolvable migration"),
            ErrorKind::WrongMigrationType => write!(f, "Wrong migration type"),
            ErrorKind::SchemaInitializationFailed => write!(f, "Schema initialization failed"),
            ErrorKind::HookExecutionFailed => write!(f, "Hook execution failed"),
            ErrorKind::StoreOperationFailed => write!(f, "Store operation failed"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom migrus error type.
///
/// `MigrusError` encapsulates the error message, kind, and optional cause.
/// It supports error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use migrus::errors::{MigrusError, ErrorKind, MigrusResult};
///
/// fn example() -> MigrusResult<()> {
///     Err(MigrusError::new("version 42 not found", ErrorKind::ValidationError))
/// }
/// ```
#[derive(Clone)]
pub struct MigrusError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MigrusError>>,
    backtrace: Arc<Backtrace>,
}

impl MigrusError {
    /// Creates a new `MigrusError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MigrusError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `MigrusError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MigrusError) -> Self {
        MigrusError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&MigrusError> {
        self.cause.as_deref()
    }
}

impl Display for MigrusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MigrusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for MigrusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migrus operations.
///
/// `MigrusResult<T>` is shorthand for `Result<T, MigrusError>`.
/// All fallible migrus operations return this type.
pub type MigrusResult<T> = Result<T, MigrusError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for MigrusError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        MigrusError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::num::ParseIntError> for MigrusError {
    fn from(err: std::num::ParseIntError) -> Self {
        MigrusError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<String> for MigrusError {
    fn from(msg: String) -> Self {
        MigrusError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for MigrusError {
    fn from(msg: &str) -> Self {
        MigrusError::new(msg, ErrorKind::InternalError)
    }
}
