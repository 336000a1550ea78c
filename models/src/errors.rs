use std::fmt;
use std::io;
pub use thiserror::Error;
use bincode::error::{DecodeError, EncodeError};
use serde_json::Error as SerdeJsonError;
use serde::{Serialize, Deserialize};

#[derive(Debug, Serialize, Deserialize, Error, Clone)]
pub enum ClinicError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Reference data error: {0}")]
    ReferenceDataError(String),
    #[error("Validation error: {0}")]
    Validation(ValidationError),
    #[error("{0}")]
    ValidationFailed(ValidationReport),
    #[error("An internal error occurred: {0}")]
    InternalError(String),
}

// Implement From for io::Error
impl From<io::Error> for ClinicError {
    fn from(err: io::Error) -> Self {
        ClinicError::Io(format!("IO error: {}", err))
    }
}

// Implement From for sled::Error
impl From<sled::Error> for ClinicError {
    fn from(err: sled::Error) -> Self {
        ClinicError::StorageError(format!("Sled error: {}", err))
    }
}

// Implement From for serde_json::Error
impl From<SerdeJsonError> for ClinicError {
    fn from(err: SerdeJsonError) -> Self {
        ClinicError::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<EncodeError> for ClinicError {
    fn from(err: EncodeError) -> Self {
        ClinicError::SerializationError(format!("Bincode encode error: {}", err))
    }
}

impl From<DecodeError> for ClinicError {
    fn from(err: DecodeError) -> Self {
        ClinicError::DeserializationError(format!("Bincode decode error: {}", err))
    }
}

impl From<ValidationError> for ClinicError {
    fn from(err: ValidationError) -> Self {
        ClinicError::Validation(err)
    }
}

impl From<ValidationReport> for ClinicError {
    fn from(report: ValidationReport) -> Self {
        ClinicError::ValidationFailed(report)
    }
}

#[derive(Debug, Serialize, Deserialize, Error, PartialEq, Clone)]
pub enum ValidationError {
    #[error("user key '{0}' is invalid")]
    InvalidKey(String),
    #[error("email '{0}' is not an accepted address")]
    InvalidEmail(String),
    #[error("field '{0}' does not match the expected format: {1}")]
    InvalidFieldFormat(String, String),
    #[error("field '{0}' exceeds the maximum length of {1} characters")]
    TooLong(String, usize),
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),
    #[error("birth date cannot be in the future")]
    BirthDateInFuture,
    #[error("patient must be at least {0} years old")]
    PatientTooYoung(u32),
    #[error("password does not meet the required format: {0}")]
    InvalidPassword(String),
    #[error("password hashing failed")]
    PasswordHashingFailed,
    #[error("password verification failed")]
    PasswordVerificationFailed,
    #[error("password confirmation does not match")]
    PasswordConfirmationMismatch,
    #[error("sex '{0}' is not recognized")]
    InvalidSex(String),
    #[error("role '{0}' is not recognized")]
    InvalidRole(String),
    #[error("role '{0}' is not allowed for area '{1}'")]
    RoleAreaMismatch(String, String),
    #[error("key prefix '{0}' does not correspond to area '{1}'")]
    KeyAreaMismatch(String, String),
    #[error("pregnancy can only be recorded for female patients")]
    PregnancyNotApplicable,
}

/// A single field failure inside a [`ValidationReport`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct FieldError {
    pub field: String,
    pub error: ValidationError,
}

/// Collects every field failure found while checking one record, so callers
/// see all problems in a single pass instead of one at a time.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        ValidationReport { errors: Vec::new() }
    }

    pub fn push(&mut self, field: &str, error: ValidationError) {
        self.errors.push(FieldError { field: field.to_string(), error });
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Consumes the report, turning a non-empty one into an error.
    pub fn into_result(self) -> Result<(), ClinicError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ClinicError::ValidationFailed(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.error))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "Validation failed: {}", joined)
    }
}

/// A type alias for a `Result` that returns a `ClinicError` on failure.
pub type ClinicResult<T> = Result<T, ClinicError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
