use thiserror::Error;

/// Errors that can arise while applying a player action or touching the store.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unrecognized action identifier or malformed arguments.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A precondition of the action does not hold; nothing was mutated.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Unknown player, target or quest id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The persistence layer is unavailable or refused the write.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, catalog files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

impl GameError {
    /// True for every error that originates in the persistence layer. Such an
    /// action is considered not applied; retrying is up to the caller.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            GameError::StoreFailure(_)
                | GameError::Sled(_)
                | GameError::Bincode(_)
                | GameError::Io(_)
                | GameError::SchemaMismatch { .. }
        )
    }

    pub fn precondition(reason: impl Into<String>) -> Self {
        GameError::PreconditionFailed(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_classified() {
        assert!(GameError::StoreFailure("down".into()).is_store_failure());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(GameError::from(io).is_store_failure());
        assert!(!GameError::NotFound("player: 7".into()).is_store_failure());
        assert!(!GameError::precondition("no path").is_store_failure());
    }

    #[test]
    fn messages_carry_reason() {
        let err = GameError::precondition("choose a path first");
        assert_eq!(err.to_string(), "precondition failed: choose a path first");
    }
}
