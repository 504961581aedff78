use ulid::Ulid;

use crate::model::ValidationError;
use crate::persistence::PersistError;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    /// The requested interval overlaps this existing booking on the same room.
    Conflict(Ulid),
    Invalid(ValidationError),
    Persistence(PersistError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::Conflict(id) => write!(f, "schedule conflict with booking: {id}"),
            EngineError::Invalid(e) => write!(f, "invalid input: {e}"),
            EngineError::Persistence(e) => write!(f, "persistence error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Invalid(e) => Some(e),
            EngineError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(error: ValidationError) -> Self {
        EngineError::Invalid(error)
    }
}

impl From<PersistError> for EngineError {
    fn from(error: PersistError) -> Self {
        EngineError::Persistence(error)
    }
}
